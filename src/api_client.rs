//! Handles all interactions with the Lightbox REST API.
//!
//! The slideshow consumes a single read operation: fetch the media records of either a
//! publicly shared Lightbox (by share token) or an owned one (by batch id, with a bearer
//! token). Connection details come from `AppConfig`; there is no process-wide client state.

use super::config::{redacted, AppConfig};
use super::errors::ApiError;
use super::model::{BatchDetailsResponse, MediaItem, PublicSlideshowResponse, SlideshowSource};
use log::{debug, error, info, warn};
use reqwest::header::{ACCEPT, AUTHORIZATION};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::fmt;
use url::Url;

const API_PREFIX: &str = "api/v1";

/// What one fetch yields: the Lightbox name (when reported) and its raw records.
#[derive(Clone, Debug, Default)]
pub struct FetchedSlideshow {
    pub batch_name: Option<String>,
    pub items: Vec<MediaItem>,
}

/// Minimal shape of an error body; the backend always sends `message` on failure.
#[derive(Deserialize, Debug, Default)]
#[serde(default)]
struct ErrorBody {
    message: Option<String>,
}

/// Client for the slideshow endpoints of the Lightbox API.
#[derive(Clone)]
pub struct ApiClient {
    http: Client,
    base_url: Url,
    auth_token: Option<String>,
}

impl fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.base_url.as_str())
            .field("auth_token", &redacted(&self.auth_token))
            .finish_non_exhaustive()
    }
}

impl ApiClient {
    pub fn new(config: &AppConfig) -> Self {
        Self::with_client(Client::new(), config.api_base_url.clone(), config.auth_token.clone())
    }

    pub fn with_client(http: Client, base_url: Url, auth_token: Option<String>) -> Self {
        Self { http, base_url, auth_token }
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// URLs that may serve `source`, in the order they are tried.
    ///
    /// Shared slideshows have two routes: the one the web client calls and the one the
    /// Flask backend registers. The second is only tried when the first answers 404.
    pub fn endpoints_for(&self, source: &SlideshowSource) -> Result<Vec<Url>, ApiError> {
        let paths = match source {
            SlideshowSource::Shared(token) => vec![
                format!("{}/public_slideshow/{}", API_PREFIX, token),
                format!("{}/public/slideshow/{}", API_PREFIX, token),
            ],
            SlideshowSource::Owned(batch_id) => vec![format!("{}/batches/{}", API_PREFIX, batch_id)],
        };
        paths.iter().map(|path| self.base_url.join(path).map_err(ApiError::from)).collect()
    }

    /// Fetches the raw media records for a slideshow.
    #[must_use = "fetching a slideshow can fail; the Result must be handled"]
    pub async fn fetch_slideshow(&self, source: &SlideshowSource) -> Result<FetchedSlideshow, ApiError> {
        let mut last_error = None;
        for url in self.endpoints_for(source)? {
            match self.fetch_from(source, url).await {
                Err(ApiError::NotFound(message)) => {
                    debug!("Slideshow route answered 404 for {}: {}", source, message);
                    last_error = Some(ApiError::NotFound(message));
                }
                result => return result,
            }
        }
        Err(last_error.unwrap_or_else(|| ApiError::NotFound(format!("No route serves {}", source))))
    }

    async fn fetch_from(&self, source: &SlideshowSource, url: Url) -> Result<FetchedSlideshow, ApiError> {
        debug!("Fetching slideshow for {} from {}", source, url);

        let mut request = self.http.get(url.clone()).header(ACCEPT, "application/json");
        if !source.is_public() {
            if let Some(token) = &self.auth_token {
                request = request.header(AUTHORIZATION, format!("Bearer {}", token));
            } else {
                debug!("No auth token configured; requesting {} anonymously.", url);
            }
        }

        let response = request.send().await.map_err(|e| {
            error!("Request error fetching slideshow for {}: {:?}", source, e);
            ApiError::Reqwest(e)
        })?;
        let status = response.status();
        let body = response.bytes().await.map_err(|e| {
            error!("Error reading response body for {}: {:?}", source, e);
            ApiError::Reqwest(e)
        })?;

        let fetched = decode_response(source, status, &body)?;
        info!(
            "Fetched slideshow for {}: {} record(s), Lightbox name: {:?}",
            source,
            fetched.items.len(),
            fetched.batch_name
        );
        Ok(fetched)
    }
}

fn mentions_login(message: &str) -> bool {
    message.contains("Authentication required") || message.contains("No permission")
}

/// The backend reports a shared Lightbox with nothing playable as a 404 with this wording.
fn reports_no_playable_media(message: &str) -> bool {
    message.starts_with("No playable media")
}

/// Turns a status code and body into records or a classified error.
pub fn decode_response(source: &SlideshowSource, status: StatusCode, body: &[u8]) -> Result<FetchedSlideshow, ApiError> {
    if !status.is_success() {
        let message = serde_json::from_slice::<ErrorBody>(body)
            .ok()
            .and_then(|b| b.message)
            .unwrap_or_else(|| status.canonical_reason().unwrap_or("Request failed").to_string());
        if status == StatusCode::NOT_FOUND && reports_no_playable_media(&message) {
            info!("Slideshow for {} has no playable media: {}", source, message);
            return Ok(FetchedSlideshow::default());
        }
        warn!("Slideshow fetch for {} failed with status {}: {}", source, status, message);
        return Err(match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ApiError::AccessDenied(message),
            StatusCode::NOT_FOUND => ApiError::NotFound(message),
            _ if mentions_login(&message) => ApiError::AccessDenied(message),
            _ => ApiError::HttpError { status, message },
        });
    }

    let (success, message, fetched) = match source {
        SlideshowSource::Shared(_) => {
            let parsed: PublicSlideshowResponse = serde_json::from_slice(body)?;
            let payload = parsed.data.unwrap_or(parsed.payload);
            let fetched = FetchedSlideshow {
                batch_name: payload.batch.map(|b| b.name),
                items: payload.media_data,
            };
            (parsed.success, parsed.message, fetched)
        }
        SlideshowSource::Owned(_) => {
            let parsed: BatchDetailsResponse = serde_json::from_slice(body)?;
            let nested = parsed.batch.as_ref().and_then(|b| b.media_items.clone());
            let fetched = FetchedSlideshow {
                batch_name: parsed.batch.map(|b| b.name),
                items: parsed.media_items.or(nested).unwrap_or_default(),
            };
            (parsed.success, parsed.message, fetched)
        }
    };

    if !success {
        let message = message.unwrap_or_default();
        warn!("Backend rejected slideshow fetch for {}: {}", source, message);
        return Err(if mentions_login(&message) {
            ApiError::AccessDenied(message)
        } else {
            ApiError::Rejected(message)
        });
    }
    Ok(fetched)
}
