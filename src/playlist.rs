//! Builds the immutable, playable playlist from raw backend records.
//!
//! A record is playable when its processing completed, its MIME type is image, video or
//! audio, it is not hidden, it is regular media (not an import archive) and a display URL
//! can be resolved for it. Relative URLs are resolved against the API base URL.

use super::model::{MediaDescriptor, MediaItem, MediaKind, ProcessingStatus, SlideshowSource};
use log::{debug, info, trace};
use url::Url;

/// The ordered list of playable items of one slideshow session.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Playlist {
    items: Vec<MediaDescriptor>,
}

static NO_URL: Option<String> = None;

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

/// Resolves `raw` against `base`; absolute URLs pass through unchanged.
fn resolve(base: &Url, raw: &str) -> Option<String> {
    match base.join(raw) {
        Ok(url) => Some(url.to_string()),
        Err(e) => {
            debug!("Dropping unresolvable media URL '{}': {}", raw, e);
            None
        }
    }
}

/// Picks the URL the media should be displayed from, in the order each endpoint fills them in.
pub fn display_url_for(item: &MediaItem, source: &SlideshowSource, base: &Url) -> Option<String> {
    let candidates: [&Option<String>; 4] = if source.is_public() {
        [&item.public_display_url, &item.web_url, &item.filepath_segment, &item.web_path_segment]
    } else {
        [&item.web_url, &item.web_path_segment, &NO_URL, &NO_URL]
    };
    candidates.into_iter().find_map(non_empty).and_then(|raw| resolve(base, raw))
}

/// Picks the URL offered for downloading the original file.
pub fn download_url_for(item: &MediaItem, source: &SlideshowSource, base: &Url) -> Option<String> {
    let candidates: [&Option<String>; 2] = if source.is_public() {
        [&item.public_download_url, &item.download_url]
    } else {
        [&item.download_url, &item.download_path_segment]
    };
    candidates.into_iter().find_map(non_empty).and_then(|raw| resolve(base, raw))
}

fn is_regular_media(item: &MediaItem) -> bool {
    item.item_type.as_deref().map_or(true, |t| t.is_empty() || t == "media")
}

/// Converts one record into a descriptor, or `None` when it must not be shown.
pub fn playable_descriptor(item: &MediaItem, source: &SlideshowSource, base: &Url) -> Option<MediaDescriptor> {
    if item.processing_status != ProcessingStatus::Completed || item.is_hidden || !is_regular_media(item) {
        trace!("Skipping media '{}': status={:?} hidden={}", item.id, item.processing_status, item.is_hidden);
        return None;
    }
    let mimetype = item.mimetype.clone().unwrap_or_default();
    let kind = MediaKind::from_mimetype(&mimetype);
    if kind == MediaKind::Other {
        trace!("Skipping media '{}': unsupported mimetype '{}'", item.id, mimetype);
        return None;
    }
    let display_url = display_url_for(item, source, base)?;
    Some(MediaDescriptor {
        id: item.id.clone(),
        kind,
        display_url,
        download_url: download_url_for(item, source, base),
        label: item.original_filename.clone().unwrap_or_else(|| "unknown".to_string()),
        mimetype,
    })
}

impl Playlist {
    pub fn new(items: Vec<MediaDescriptor>) -> Self {
        Self { items }
    }

    /// Filters `records` down to the playable items, keeping their relative order.
    pub fn from_records(records: &[MediaItem], source: &SlideshowSource, base: &Url) -> Self {
        let items: Vec<MediaDescriptor> =
            records.iter().filter_map(|item| playable_descriptor(item, source, base)).collect();
        info!("Playlist for {}: {} playable of {} record(s)", source, items.len(), records.len());
        Self { items }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&MediaDescriptor> {
        self.items.get(index)
    }

    #[cfg(test)]
    pub fn items(&self) -> &[MediaDescriptor] {
        &self.items
    }

    /// The index after `index`, wrapping to the start. `None` for an empty playlist.
    pub fn next_index(&self, index: usize) -> Option<usize> {
        if self.items.is_empty() {
            None
        } else {
            Some((index + 1) % self.items.len())
        }
    }

    /// The index before `index`, wrapping to the end. `None` for an empty playlist.
    pub fn previous_index(&self, index: usize) -> Option<usize> {
        let len = self.items.len();
        if len == 0 {
            None
        } else {
            Some((index % len + len - 1) % len)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Url {
        Url::parse("http://localhost:5005/").unwrap()
    }

    fn record(id: &str, mimetype: &str, web_url: Option<&str>) -> MediaItem {
        MediaItem {
            id: id.to_string(),
            original_filename: Some(format!("{}.bin", id)),
            mimetype: Some(mimetype.to_string()),
            web_url: web_url.map(str::to_string),
            ..MediaItem::default()
        }
    }

    #[test]
    fn keeps_only_playable_items_in_order() {
        let owned = SlideshowSource::Owned("b".into());
        let mut hidden = record("hidden", "image/png", Some("/h.png"));
        hidden.is_hidden = true;
        let mut queued = record("queued", "video/mp4", Some("/q.mp4"));
        queued.processing_status = ProcessingStatus::Queued;
        let mut failed = record("failed", "audio/mpeg", Some("/f.mp3"));
        failed.processing_status = ProcessingStatus::Failed;
        let mut archive = record("archive", "image/png", Some("/z.png"));
        archive.item_type = Some("import_zip".into());

        let records = vec![
            record("a", "image/jpeg", Some("/static/a.jpg")),
            hidden,
            record("doc", "application/pdf", Some("/d.pdf")),
            queued,
            record("b", "video/mp4", Some("https://cdn.example/b.mp4")),
            record("no-url", "audio/mpeg", None),
            failed,
            archive,
            record("c", "audio/ogg", Some("static/uploads/c.ogg")),
        ];
        let playlist = Playlist::from_records(&records, &owned, &base());
        let ids: Vec<&str> = playlist.items().iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
        assert_eq!(playlist.items()[0].display_url, "http://localhost:5005/static/a.jpg");
        assert_eq!(playlist.items()[1].display_url, "https://cdn.example/b.mp4");
        assert_eq!(playlist.items()[2].display_url, "http://localhost:5005/static/uploads/c.ogg");
        assert_eq!(playlist.items()[2].kind, MediaKind::Audio);
    }

    #[test]
    fn public_source_prefers_public_display_url() {
        let shared = SlideshowSource::Shared("tok".into());
        let mut item = record("a", "image/jpeg", Some("/private/a.jpg"));
        item.public_display_url = Some("/public/a.jpg".into());
        item.public_download_url = Some("/public/a.jpg?download=1".into());
        let descriptor = playable_descriptor(&item, &shared, &base()).unwrap();
        assert_eq!(descriptor.display_url, "http://localhost:5005/public/a.jpg");
        assert_eq!(descriptor.download_url.as_deref(), Some("http://localhost:5005/public/a.jpg?download=1"));

        let segment_only = MediaItem {
            id: "s".into(),
            mimetype: Some("image/png".into()),
            filepath_segment: Some("static/uploads/s.png".into()),
            ..MediaItem::default()
        };
        let descriptor = playable_descriptor(&segment_only, &shared, &base()).unwrap();
        assert_eq!(descriptor.display_url, "http://localhost:5005/static/uploads/s.png");
        assert_eq!(descriptor.label, "unknown");
    }

    #[test]
    fn owner_source_ignores_public_urls_and_blank_values() {
        let owned = SlideshowSource::Owned("b".into());
        let mut item = record("a", "image/jpeg", Some("   "));
        item.public_display_url = Some("/public/a.jpg".into());
        item.filepath_segment = Some("static/uploads/a.jpg".into());
        assert!(display_url_for(&item, &owned, &base()).is_none());
        assert!(playable_descriptor(&item, &owned, &base()).is_none());

        item.web_path_segment = Some("static/uploads/a.jpg".into());
        item.download_path_segment = Some("api/v1/media/a/download".into());
        let descriptor = playable_descriptor(&item, &owned, &base()).unwrap();
        assert_eq!(descriptor.display_url, "http://localhost:5005/static/uploads/a.jpg");
        assert_eq!(descriptor.download_url.as_deref(), Some("http://localhost:5005/api/v1/media/a/download"));
    }

    #[test]
    fn navigation_wraps_in_both_directions() {
        let records: Vec<MediaItem> =
            (0..3).map(|i| record(&format!("m{}", i), "image/png", Some("/x.png"))).collect();
        let playlist = Playlist::from_records(&records, &SlideshowSource::Owned("b".into()), &base());
        assert_eq!(playlist.next_index(2), Some(0));
        assert_eq!(playlist.previous_index(0), Some(2));

        let mut index = 1;
        for _ in 0..playlist.len() {
            index = playlist.next_index(index).unwrap();
        }
        assert_eq!(index, 1);

        let empty = Playlist::default();
        assert!(empty.is_empty());
        assert_eq!(empty.next_index(0), None);
        assert_eq!(empty.previous_index(0), None);
    }
}
