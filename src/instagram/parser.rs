use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaType {
    Image,
    Video,
    CarouselAlbum,
    Other(String),
}

impl MediaType {
    pub fn from_wire(value: &str) -> Self {
        match value {
            "IMAGE" => MediaType::Image,
            "VIDEO" => MediaType::Video,
            "CAROUSEL_ALBUM" => MediaType::CarouselAlbum,
            other => MediaType::Other(other.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MediaChild {
    pub media_type: MediaType,
    pub url: String,
}

/// One media record, normalized for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MediaEntry {
    pub id: String,
    pub media_type: MediaType,
    /// `media_url`, falling back to `thumbnail_url` (videos) or the first child (carousels)
    pub url: String,
    pub thumbnail_url: Option<String>,
    pub permalink: String,
    pub caption: String,
    pub timestamp: DateTime<Utc>,
    pub children: Vec<MediaChild>,
}

impl MediaEntry {
    pub fn is_carousel(&self) -> bool {
        self.media_type == MediaType::CarouselAlbum
    }
}

/// One page of the media listing.
///
/// Items are kept as raw JSON so that a single malformed record is skipped
/// by [`parse_item`] instead of failing the whole page.
#[derive(Debug, Clone, Deserialize)]
pub struct MediaPage {
    pub data: Vec<Value>,
    #[serde(default)]
    pub paging: Option<Paging>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Paging {
    #[serde(default)]
    pub next: Option<String>,
}

impl MediaPage {
    /// Cursor URL for the following page; an empty string counts as absent.
    pub fn next_page(&self) -> Option<&str> {
        self.paging
            .as_ref()
            .and_then(|p| p.next.as_deref())
            .filter(|next| !next.is_empty())
    }
}

/// True when `raw` is a VIDEO record and videos are being ignored.
pub fn is_ignored_video(raw: &Value, ignore_video: bool) -> bool {
    ignore_video && raw.get("media_type").and_then(Value::as_str) == Some("VIDEO")
}

/// Maps one raw record to a [`MediaEntry`].
///
/// Returns `None` for ignored videos and for records missing an id, type,
/// permalink, parseable timestamp or any usable URL.
pub fn parse_item(raw: &Value, ignore_video: bool) -> Option<MediaEntry> {
    if is_ignored_video(raw, ignore_video) {
        return None;
    }

    let id = str_field(raw, "id")?;
    let media_type = MediaType::from_wire(str_field(raw, "media_type")?);
    let permalink = str_field(raw, "permalink")?;
    let timestamp = parse_timestamp(str_field(raw, "timestamp")?)?;
    let thumbnail_url = str_field(raw, "thumbnail_url").map(str::to_string);

    let children = if media_type == MediaType::CarouselAlbum {
        parse_children(raw, ignore_video)
    } else {
        Vec::new()
    };

    let url = str_field(raw, "media_url")
        .map(str::to_string)
        .or_else(|| thumbnail_url.clone())
        .or_else(|| children.first().map(|c| c.url.clone()))?;

    Some(MediaEntry {
        id: id.to_string(),
        media_type,
        url,
        thumbnail_url,
        permalink: permalink.to_string(),
        caption: str_field(raw, "caption").unwrap_or_default().to_string(),
        timestamp,
        children,
    })
}

fn parse_children(raw: &Value, ignore_video: bool) -> Vec<MediaChild> {
    let Some(items) = raw.pointer("/children/data").and_then(Value::as_array) else {
        return Vec::new();
    };

    items
        .iter()
        .filter(|child| !is_ignored_video(child, ignore_video))
        .filter_map(|child| {
            Some(MediaChild {
                media_type: MediaType::from_wire(str_field(child, "media_type")?),
                url: str_field(child, "media_url")?.to_string(),
            })
        })
        .collect()
}

/// Non-empty string field, or `None`.
fn str_field<'a>(raw: &'a Value, key: &str) -> Option<&'a str> {
    raw.get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.trim().is_empty())
}

/// Graph timestamps look like `2020-05-13T07:54:46+0000`; RFC 3339 is accepted too.
fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .or_else(|_| DateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%z"))
        .map(|dt| dt.with_timezone(&Utc))
        .ok()
}
