//! Defines the custom error types used throughout the `lightbox_slideshow` application.
//!
//! Errors are grouped by concern: configuration loading, the REST API the playlist is
//! fetched from, and per-item media playback. `AppError` covers what can stop the binary.
//! Playback errors are logged where they occur and never turn into a list-level failure.

use thiserror::Error;

// --- ConfigError ---
/// Errors related to application configuration loading and parsing.
#[must_use = "a configuration error should be handled or propagated"]
#[derive(Debug, Error)]
pub enum ConfigError {
    /// An I/O error occurred while trying to read the configuration file.
    #[error("Configuration I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// An error occurred while parsing the configuration file content.
    #[error("Configuration parse error: {0}")]
    Parse(String),
    /// A required configuration key was missing from the file.
    #[error("Missing configuration key: '{0}'")]
    MissingKey(String),
    /// A key was present but its value could not be used.
    #[error("Invalid value for configuration key '{key}': {reason}")]
    InvalidValue { key: String, reason: String },
}

// --- ApiError ---
/// Errors related to fetching a slideshow from the Lightbox REST API.
#[must_use = "an API error should be handled or propagated"]
#[derive(Debug, Error)]
pub enum ApiError {
    /// An error occurred during an HTTP request made by `reqwest`.
    #[error("API request error: {0}")]
    Reqwest(#[from] reqwest::Error),
    /// An error occurred during JSON deserialization of a response body.
    #[error("API JSON deserialization error: {0}")]
    SerdeJson(#[from] serde_json::Error),
    /// An error occurred while building a request or media URL.
    #[error("API URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),
    /// The requested Lightbox or share link does not exist.
    #[error("Not found: {0}")]
    NotFound(String),
    /// The caller is not logged in or does not own the Lightbox.
    #[error("Access denied: {0}")]
    AccessDenied(String),
    /// An HTTP error occurred that was not covered by a more specific variant.
    #[error("API HTTP error {status}: {message}")]
    HttpError { status: reqwest::StatusCode, message: String },
    /// The backend answered but reported `success: false`.
    #[error("API rejected the request: {0}")]
    Rejected(String),
}

impl ApiError {
    /// The single line shown to the user when a slideshow cannot be loaded.
    pub fn user_message(&self) -> String {
        match self {
            ApiError::Reqwest(_) => "Network error or server unreachable.".to_string(),
            ApiError::SerdeJson(_) => "The server sent an unreadable response.".to_string(),
            ApiError::UrlParse(e) => format!("Invalid slideshow address: {}", e),
            ApiError::NotFound(msg)
            | ApiError::AccessDenied(msg)
            | ApiError::Rejected(msg)
            | ApiError::HttpError { message: msg, .. } => {
                if msg.trim().is_empty() {
                    "Failed to load slideshow data.".to_string()
                } else {
                    msg.clone()
                }
            }
        }
    }

    /// Whether the failure should send the user to the login flow instead of an error banner.
    pub fn requires_login(&self) -> bool {
        matches!(self, ApiError::AccessDenied(_))
    }
}

// --- PlaybackError ---
/// Errors raised by a media element when asked to start or suspend playback.
#[must_use = "a playback error should be handled or logged"]
#[derive(Debug, Error)]
pub enum PlaybackError {
    /// The host refused to start playback without a user gesture (or has no player).
    #[error("Autoplay rejected: {0}")]
    AutoplayRejected(String),
    /// The external player process could not be started.
    #[error("Failed to start player: {0}")]
    Spawn(#[from] std::io::Error),
    /// A suspend/resume signal could not be delivered to the player process.
    #[error("Failed to signal player: {0}")]
    Signal(String),
}

// --- AppError (Top-level error enum) ---
/// Failures that end the binary. Fetch and playback problems are shown on screen instead.
#[must_use = "an application error should be handled or propagated"]
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Application Configuration Error: {0}")]
    Config(#[from] ConfigError),
    #[error("Terminal Error: {0}")]
    Terminal(#[from] std::io::Error),
}
