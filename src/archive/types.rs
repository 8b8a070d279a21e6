//! Wire types for the archive.org APIs.
//!
//! The metadata API plays loose with shapes: sizes arrive as strings,
//! list-ish fields arrive as a bare string when there is one value, and an
//! unknown identifier returns `{}` rather than an HTTP error. The serde
//! helpers in [`crate::util`] absorb all of that here so nothing downstream
//! has to care.

use std::collections::HashMap;

use serde::Deserialize;

use crate::util::{lenient_u64, one_or_many};

/// Raw `/metadata/{identifier}` response. `metadata` is absent for unknown
/// identifiers.
#[derive(Debug, Clone, Deserialize)]
pub struct ItemResponse {
    #[serde(default)]
    pub files: Vec<ItemFile>,
    #[serde(default, deserialize_with = "lenient_u64")]
    pub item_size: Option<u64>,
    #[serde(default, deserialize_with = "lenient_u64")]
    pub item_last_updated: Option<u64>,
    #[serde(default)]
    pub metadata: Option<ItemMetadata>,
}

/// A resolved item: [`ItemResponse`] with the metadata presence checked.
#[derive(Debug, Clone)]
pub struct Item {
    pub metadata: ItemMetadata,
    pub files: Vec<ItemFile>,
    pub item_size: Option<u64>,
    pub item_last_updated: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ItemFile {
    pub name: String,
    #[serde(default, deserialize_with = "lenient_u64")]
    pub size: Option<u64>,
    /// Seconds since the epoch, as the API serves it.
    #[serde(default, deserialize_with = "lenient_u64")]
    pub mtime: Option<u64>,
    #[serde(default)]
    pub format: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ItemMetadata {
    pub identifier: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "one_or_many")]
    pub description: Vec<String>,
    #[serde(default, deserialize_with = "one_or_many")]
    pub creator: Vec<String>,
    #[serde(default, deserialize_with = "one_or_many")]
    pub subject: Vec<String>,
    #[serde(default, deserialize_with = "one_or_many")]
    pub collection: Vec<String>,
    #[serde(default)]
    pub uploader: Option<String>,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub addeddate: Option<String>,
}

/// `advancedsearch.php` response envelope.
#[derive(Debug, Clone, Deserialize)]
pub struct SearchResponse {
    pub response: SearchBody,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SearchBody {
    #[serde(rename = "numFound")]
    pub num_found: u64,
    #[serde(default)]
    pub docs: Vec<SearchDoc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SearchDoc {
    pub identifier: String,
    #[serde(default)]
    pub title: Option<String>,
}

/// One Wayback CDX row, in the field order we request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotMatch {
    pub original: String,
    pub status_code: String,
    pub timestamp: String,
}

/// `/services/announcements` body.
#[derive(Debug, Clone, Deserialize)]
pub struct AnnouncementsResponse {
    #[serde(default)]
    pub announcements: Vec<Announcement>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Announcement {
    pub title: String,
    pub url: String,
}

/// `/services/mediacounts` body: mediatype label to item count.
#[derive(Debug, Clone, Deserialize)]
pub struct MediaCountsResponse {
    #[serde(default)]
    pub counts: HashMap<String, u64>,
}
