//! Defines the core data structures and enums used in the slideshow application.
//!
//! Raw records mirror the JSON the Lightbox backend returns and tolerate every optional
//! URL field its endpoints emit. `MediaDescriptor` is the resolved, playable form the
//! playback controller works with.

use serde::Deserialize;
use std::fmt;

/// Upstream processing status of a media record.
#[derive(Deserialize, Clone, Copy, Debug, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum ProcessingStatus {
    Queued,
    Processing,
    /// The backend treats a record without a status as completed.
    #[default]
    Completed,
    Failed,
    QueuedImport,
    FailedImport,
    CompletedImport,
    #[serde(other)]
    Unknown,
}

/// A media record as returned by either slideshow endpoint.
#[derive(Deserialize, Clone, Debug, Default)]
#[serde(default)]
pub struct MediaItem {
    pub id: String,
    pub original_filename: Option<String>,
    pub mimetype: Option<String>,
    pub processing_status: ProcessingStatus,
    /// Only the owner view reports this; shared slideshows never include hidden items.
    pub is_hidden: bool,
    /// `media` for regular uploads; archive imports use other values.
    pub item_type: Option<String>,
    pub web_url: Option<String>,
    pub download_url: Option<String>,
    pub public_display_url: Option<String>,
    pub public_download_url: Option<String>,
    pub web_path_segment: Option<String>,
    pub download_path_segment: Option<String>,
    pub filepath_segment: Option<String>,
}

/// The Lightbox (batch) a slideshow belongs to.
#[derive(Deserialize, Clone, Debug, Default)]
#[serde(default)]
pub struct Batch {
    pub id: String,
    pub name: String,
    /// Older backend variants nest the items inside the batch object.
    pub media_items: Option<Vec<MediaItem>>,
}

/// Body of `GET /api/v1/batches/{id}`.
#[derive(Deserialize, Clone, Debug, Default)]
#[serde(default)]
pub struct BatchDetailsResponse {
    pub success: bool,
    pub message: Option<String>,
    pub batch: Option<Batch>,
    pub media_items: Option<Vec<MediaItem>>,
}

/// Payload carried by the public slideshow endpoint.
#[derive(Deserialize, Clone, Debug, Default)]
#[serde(default)]
pub struct PublicSlideshowData {
    pub batch: Option<Batch>,
    pub media_data: Vec<MediaItem>,
}

/// Body of `GET /api/v1/public_slideshow/{token}`. Some deployments wrap the payload in `data`.
#[derive(Deserialize, Clone, Debug, Default)]
#[serde(default)]
pub struct PublicSlideshowResponse {
    pub success: bool,
    pub message: Option<String>,
    #[serde(flatten)]
    pub payload: PublicSlideshowData,
    pub data: Option<PublicSlideshowData>,
}

/// The broad media family derived from a MIME type.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MediaKind {
    Image,
    Video,
    Audio,
    Other,
}

impl MediaKind {
    pub fn from_mimetype(mimetype: &str) -> Self {
        let mimetype = mimetype.trim().to_ascii_lowercase();
        if mimetype.starts_with("image/") {
            MediaKind::Image
        } else if mimetype.starts_with("video/") {
            MediaKind::Video
        } else if mimetype.starts_with("audio/") {
            MediaKind::Audio
        } else {
            MediaKind::Other
        }
    }

    /// Video and audio report their own end of playback; images do not.
    pub fn has_natural_end(self) -> bool {
        matches!(self, MediaKind::Video | MediaKind::Audio)
    }
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MediaKind::Image => "image",
            MediaKind::Video => "video",
            MediaKind::Audio => "audio",
            MediaKind::Other => "other",
        };
        f.write_str(name)
    }
}

/// A playable item: what the controller shows and what the status line describes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MediaDescriptor {
    pub id: String,
    pub kind: MediaKind,
    pub display_url: String,
    pub download_url: Option<String>,
    /// Display name (the original filename).
    pub label: String,
    pub mimetype: String,
}

/// Which slideshow to fetch: a public share link or an owner's Lightbox.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SlideshowSource {
    Shared(String),
    Owned(String),
}

impl SlideshowSource {
    pub fn is_public(&self) -> bool {
        matches!(self, SlideshowSource::Shared(_))
    }
}

impl fmt::Display for SlideshowSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SlideshowSource::Shared(token) => write!(f, "share token '{}'", token),
            SlideshowSource::Owned(batch_id) => write!(f, "Lightbox '{}'", batch_id),
        }
    }
}

/// Represents the overall state of the slideshow application.
#[derive(Clone, Debug, PartialEq)]
pub enum AppState {
    /// Waiting for the playlist fetch to resolve.
    Loading,
    /// Actively playing a non-empty playlist.
    Slideshow,
    /// The fetch succeeded but nothing survived filtering.
    NoPlayableMedia,
    /// The owner view was refused; the user has to log in first.
    LoginRequired(String),
    /// The fetch failed. The String contains the message shown to the user.
    Error(String),
}
