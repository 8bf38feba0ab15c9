//! Playback elements and the deck that owns them.
//!
//! One element exists per media family (image, video, audio). The deck is held by the
//! playback controller alone; nothing else starts, pauses or rewinds an element.

use super::errors::PlaybackError;
use super::model::MediaKind;

/// The source an element is bound to, tagged with the playlist entry it belongs to.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MediaCue {
    pub url: String,
    /// Incremented by the controller every time the current item changes.
    pub entry: u64,
}

/// Notifications elements send back to the session loop.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MediaSignal {
    /// Playback of the source loaded with `entry` reached its end.
    Ended { kind: MediaKind, entry: u64 },
}

/// A native playback surface (the host's equivalent of an `<img>`, `<video>` or `<audio>`).
pub trait MediaElement {
    /// Binds the element to a new source. Any previous source is discarded.
    fn load(&mut self, cue: MediaCue);
    /// Starts or resumes playback of the loaded source.
    fn play(&mut self) -> Result<(), PlaybackError>;
    /// Suspends playback, keeping the current position.
    fn pause(&mut self);
    /// Moves the position back to the start of the source.
    fn rewind(&mut self);
    fn is_playing(&self) -> bool;
    fn cue(&self) -> Option<&MediaCue>;
}

/// Exclusively owns one element per media family.
pub struct MediaDeck<E: MediaElement> {
    image: E,
    video: E,
    audio: E,
}

impl<E: MediaElement> MediaDeck<E> {
    pub fn new(image: E, video: E, audio: E) -> Self {
        Self { image, video, audio }
    }

    /// The element presenting `kind`; `None` for kinds with no native surface.
    #[cfg(test)]
    pub fn element(&self, kind: MediaKind) -> Option<&E> {
        match kind {
            MediaKind::Image => Some(&self.image),
            MediaKind::Video => Some(&self.video),
            MediaKind::Audio => Some(&self.audio),
            MediaKind::Other => None,
        }
    }

    pub fn element_mut(&mut self, kind: MediaKind) -> Option<&mut E> {
        match kind {
            MediaKind::Image => Some(&mut self.image),
            MediaKind::Video => Some(&mut self.video),
            MediaKind::Audio => Some(&mut self.audio),
            MediaKind::Other => None,
        }
    }

    /// Pauses and rewinds the element for `kind`.
    pub fn stop_and_reset(&mut self, kind: MediaKind) {
        if let Some(element) = self.element_mut(kind) {
            element.pause();
            element.rewind();
        }
    }

    /// Pauses and rewinds every element.
    pub fn halt_all(&mut self) {
        for kind in [MediaKind::Image, MediaKind::Video, MediaKind::Audio] {
            self.stop_and_reset(kind);
        }
    }
}
