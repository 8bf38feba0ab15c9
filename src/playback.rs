//! The playback controller: a state machine over the playlist.
//!
//! Every change of index or play state goes through a single transition (`enter`) that
//! first disarms whatever advance mechanism is armed and stops the outgoing element, then
//! binds the new item and arms exactly one mechanism for it:
//!
//! - images start their element and arm a one-shot timer of the configured display duration;
//! - video and audio start their element and wait for its end-of-media signal;
//! - anything else shows a placeholder and arms nothing.
//!
//! Timers and end-of-media signals come back in as [`Trigger`]s. A trigger is only honoured
//! when it matches the mechanism that is currently armed, so a late timer or a stale
//! `ended` from a previous item can never advance the slideshow twice.

use super::media_deck::{MediaCue, MediaDeck, MediaElement};
use super::model::{MediaDescriptor, MediaKind};
use super::playlist::Playlist;
use log::{debug, info, trace, warn};
use std::time::Duration;

/// Where the controller is.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PlayerState {
    /// No items, not started yet, or torn down.
    Idle,
    Showing { index: usize, kind: MediaKind, playing: bool },
}

/// The advance mechanism armed for the current item. At most one exists at any time.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Advance {
    None,
    /// Advance once `after` has elapsed. `seq` identifies this particular arming.
    Timer { seq: u64, after: Duration },
    /// Advance when the element playing `entry` reports its end.
    MediaEnd { kind: MediaKind, entry: u64 },
}

/// Events that may advance the slideshow.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Trigger {
    TimerElapsed { seq: u64 },
    MediaEnded { entry: u64 },
}

/// Snapshot of the current item for rendering.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PlaybackStatus {
    pub index: usize,
    pub total: usize,
    pub item: MediaDescriptor,
    pub playing: bool,
    /// The element refused to start; the item stays until the user navigates.
    pub autoplay_blocked: bool,
}

pub struct PlaybackController<E: MediaElement> {
    playlist: Playlist,
    deck: MediaDeck<E>,
    image_duration: Duration,
    state: PlayerState,
    armed: Advance,
    entry: u64,
    arm_seq: u64,
    autoplay_blocked: bool,
}

impl<E: MediaElement> PlaybackController<E> {
    pub fn new(playlist: Playlist, deck: MediaDeck<E>, image_duration: Duration) -> Self {
        Self {
            playlist,
            deck,
            image_duration,
            state: PlayerState::Idle,
            armed: Advance::None,
            entry: 0,
            arm_seq: 0,
            autoplay_blocked: false,
        }
    }

    #[cfg(test)]
    pub fn state(&self) -> PlayerState {
        self.state
    }

    pub fn armed(&self) -> Advance {
        self.armed
    }

    #[cfg(test)]
    pub fn deck(&self) -> &MediaDeck<E> {
        &self.deck
    }

    pub fn current_index(&self) -> Option<usize> {
        match self.state {
            PlayerState::Showing { index, .. } => Some(index),
            PlayerState::Idle => None,
        }
    }

    #[cfg(test)]
    pub fn is_playing(&self) -> bool {
        matches!(self.state, PlayerState::Showing { playing: true, .. })
    }

    /// Shows the first item, playing. Returns `false` when there is nothing to show.
    pub fn start(&mut self) -> bool {
        if self.playlist.is_empty() {
            info!("No playable media; controller stays idle.");
            return false;
        }
        self.enter(0, true, true);
        true
    }

    /// User "Next": moves forward and resumes playing.
    pub fn next(&mut self) {
        if let Some(index) = self.current_index().and_then(|i| self.playlist.next_index(i)) {
            debug!("Transport: next -> {}", index);
            self.enter(index, true, true);
        }
    }

    /// User "Previous": moves back and resumes playing.
    pub fn previous(&mut self) {
        if let Some(index) = self.current_index().and_then(|i| self.playlist.previous_index(i)) {
            debug!("Transport: previous -> {}", index);
            self.enter(index, true, true);
        }
    }

    /// Flips the play flag and re-evaluates the current item.
    pub fn toggle_play(&mut self) {
        if let PlayerState::Showing { index, playing, .. } = self.state {
            debug!("Transport: toggle play ({} -> {})", playing, !playing);
            self.enter(index, !playing, false);
        }
    }

    /// Feeds a timer or end-of-media event. Returns `true` if it advanced the slideshow.
    pub fn handle(&mut self, trigger: Trigger) -> bool {
        let matches_armed = match (trigger, self.armed) {
            (Trigger::TimerElapsed { seq }, Advance::Timer { seq: armed, .. }) => seq == armed,
            (Trigger::MediaEnded { entry }, Advance::MediaEnd { entry: armed, .. }) => entry == armed,
            _ => false,
        };
        if !matches_armed {
            trace!("Ignoring stale trigger {:?} (armed: {:?})", trigger, self.armed);
            return false;
        }
        self.advance();
        true
    }

    /// Automatic advance: next item, play flag unchanged.
    pub fn advance(&mut self) {
        if let PlayerState::Showing { index, playing, .. } = self.state {
            if let Some(next) = self.playlist.next_index(index) {
                debug!("Auto-advance {} -> {}", index, next);
                self.enter(next, playing, true);
            }
        }
    }

    /// Disarms everything and stops every element. Safe to call more than once.
    pub fn teardown(&mut self) {
        if self.state != PlayerState::Idle {
            info!("Tearing down slideshow playback.");
        }
        self.disarm();
        self.deck.halt_all();
        self.state = PlayerState::Idle;
    }

    pub fn status(&self) -> Option<PlaybackStatus> {
        let PlayerState::Showing { index, playing, .. } = self.state else {
            return None;
        };
        let item = self.playlist.get(index)?.clone();
        Some(PlaybackStatus {
            index,
            total: self.playlist.len(),
            item,
            playing,
            autoplay_blocked: self.autoplay_blocked,
        })
    }

    fn disarm(&mut self) {
        if self.armed != Advance::None {
            trace!("Disarming {:?}", self.armed);
        }
        self.armed = Advance::None;
    }

    /// The one transition. Cleanup of the outgoing state completes before setup begins.
    fn enter(&mut self, index: usize, playing: bool, new_entry: bool) {
        let Some(item) = self.playlist.get(index) else {
            warn!("Refusing to enter out-of-range index {}", index);
            return;
        };
        let kind = item.kind;
        let url = item.display_url.clone();

        self.disarm();
        if new_entry {
            if let PlayerState::Showing { kind: outgoing, .. } = self.state {
                self.deck.stop_and_reset(outgoing);
            }
            self.entry += 1;
            self.autoplay_blocked = false;
            if let Some(element) = self.deck.element_mut(kind) {
                element.load(MediaCue { url, entry: self.entry });
            }
            info!("Showing item {} / {} ({}, entry {})", index + 1, self.playlist.len(), kind, self.entry);
        }
        self.state = PlayerState::Showing { index, kind, playing };

        if !playing {
            if let Some(element) = self.deck.element_mut(kind) {
                element.pause();
            }
            return;
        }

        match kind {
            MediaKind::Image => {
                if let Some(element) = self.deck.element_mut(kind) {
                    if let Err(e) = element.play() {
                        warn!("Image viewer did not start; the timer still runs: {}", e);
                    }
                }
                self.arm_seq += 1;
                self.armed = Advance::Timer { seq: self.arm_seq, after: self.image_duration };
                trace!("Armed image timer #{} for {:?}", self.arm_seq, self.image_duration);
            }
            kind if kind.has_natural_end() => {
                let entry = self.entry;
                if let Some(element) = self.deck.element_mut(kind) {
                    match element.play() {
                        Ok(()) => {
                            self.autoplay_blocked = false;
                            self.armed = Advance::MediaEnd { kind, entry };
                            trace!("Armed end-of-media listener for {} entry {}", kind, entry);
                        }
                        Err(e) => {
                            warn!("{} autoplay prevented; waiting for the user: {}", kind, e);
                            self.autoplay_blocked = true;
                        }
                    }
                }
            }
            _ => {
                debug!("Item {} is not previewable; nothing armed.", index);
            }
        }
    }
}

impl<E: MediaElement> Drop for PlaybackController<E> {
    fn drop(&mut self) {
        self.teardown();
    }
}
