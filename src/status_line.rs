//! Builds and draws the text the slideshow shows on the terminal.
//!
//! Each frame is a small block of lines: the application state message while loading or
//! on failure, and the current item with its position and play state while the
//! slideshow runs. Drawing clears the screen first; in raw mode lines need an explicit
//! carriage return.

use super::media_deck::MediaElement;
use super::model::{AppState, MediaKind};
use super::playback::{PlaybackController, PlaybackStatus};
use crossterm::cursor::MoveTo;
use crossterm::style::Print;
use crossterm::terminal::{Clear, ClearType};
use crossterm::QueueableCommand;
use log::trace;
use std::io::{self, Write};

const LOADING_MESSAGE: &str = "Loading your slideshow...";
const NO_PLAYABLE_MEDIA_MESSAGE: &str =
    "No playable media found in this Lightbox for slideshow, or all items are hidden/processing.";
const KEY_HINT: &str = "Right: next | Left: previous | Space: play/pause | q: quit";

/// Message lines for a state that has no current item.
pub fn state_lines(state: &AppState) -> Vec<String> {
    match state {
        AppState::Loading => vec![LOADING_MESSAGE.to_string()],
        AppState::Slideshow => Vec::new(),
        AppState::NoPlayableMedia => vec![NO_PLAYABLE_MEDIA_MESSAGE.to_string()],
        AppState::LoginRequired(message) => vec![
            format!("Error: {}", message),
            "Please log in to the Lightbox web app and set [api] auth_token.".to_string(),
        ],
        AppState::Error(message) => vec![format!("Error: {}", message)],
    }
}

/// Lines describing the item on screen.
pub fn item_lines(status: &PlaybackStatus, title: Option<&str>) -> Vec<String> {
    let mut lines = Vec::new();
    if let Some(title) = title.filter(|t| !t.trim().is_empty()) {
        lines.push(format!("Slideshow: {}", title));
    }

    let play_state = if status.playing { "Playing" } else { "Paused" };
    lines.push(format!("{} / {} - {} [{}]", status.index + 1, status.total, status.item.label, play_state));

    if status.item.kind == MediaKind::Other {
        lines.push(format!("Unable to display this media type: {}", status.item.mimetype));
        if let Some(url) = &status.item.download_url {
            lines.push(format!("Download File: {}", url));
        }
    } else {
        lines.push(status.item.display_url.clone());
    }

    if status.autoplay_blocked {
        lines.push(format!("Playback of this {} did not start; use Left/Right to move on.", status.item.kind));
    }
    lines.push(KEY_HINT.to_string());
    lines
}

/// The frame for a running session.
pub fn frame_for<E: MediaElement>(controller: &PlaybackController<E>, title: Option<&str>) -> Vec<String> {
    match controller.status() {
        Some(status) => item_lines(&status, title),
        None => state_lines(&AppState::NoPlayableMedia),
    }
}

/// Draws frames onto a terminal-like writer.
pub struct StatusLine<W: Write> {
    out: W,
}

impl<W: Write> StatusLine<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    /// Clears the screen and prints `lines` from the top-left corner.
    pub fn draw(&mut self, lines: &[String]) -> io::Result<()> {
        trace!("Drawing status frame: {:?}", lines);
        self.out.queue(Clear(ClearType::All))?.queue(MoveTo(0, 0))?;
        for line in lines {
            self.out.queue(Print(line))?.queue(Print("\r\n"))?;
        }
        self.out.flush()
    }

    #[cfg(test)]
    pub fn into_inner(self) -> W {
        self.out
    }
}
