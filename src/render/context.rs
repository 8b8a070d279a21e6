//! Typed render contexts.
//!
//! Handlers map API responses into these view rows; templates only ever see
//! pre-formatted strings (sizes, dates, counts are humanized upstream).

use crate::mode::ClientMode;

/// What a template receives: the resolved mode plus page-shaped data.
#[derive(Debug, Clone)]
pub struct PageContext {
    pub mode: ClientMode,
    pub data: PageData,
}

/// Per-page context payloads.
#[derive(Debug, Clone)]
pub enum PageData {
    /// Static pages render from built-in copy and need no data.
    Empty,
    Home(HomePage),
    /// Generic notice page, also the 404 body.
    Message { message: String },
    /// Unknown item identifier.
    NotFound { identifier: String },
    Web(WebPage),
    Download(DownloadPage),
    Details(Box<DetailsPage>),
    Results(ResultsPage),
}

#[derive(Debug, Clone)]
pub struct HomePage {
    pub announcements: Vec<AnnouncementRow>,
    pub media_counts: Vec<MediaCountRow>,
    pub top_collections: Vec<CollectionRow>,
}

#[derive(Debug, Clone)]
pub struct AnnouncementRow {
    pub title: String,
    pub url: String,
}

#[derive(Debug, Clone)]
pub struct MediaCountRow {
    pub label: String,
    /// Humanized, e.g. `"38.1M"`.
    pub count: String,
}

#[derive(Debug, Clone)]
pub struct CollectionRow {
    pub identifier: String,
    pub title: String,
}

/// Wayback search page. `results` is `None` when no query was submitted,
/// which renders just the search form.
#[derive(Debug, Clone)]
pub struct WebPage {
    pub query: String,
    pub results: Option<Vec<SnapshotRow>>,
}

#[derive(Debug, Clone)]
pub struct SnapshotRow {
    pub original: String,
    /// `YYYY-MM-DD`, or the raw timestamp when it does not parse.
    pub date: String,
    pub timestamp: String,
    pub status_code: String,
}

#[derive(Debug, Clone)]
pub struct DownloadPage {
    pub identifier: String,
    pub files: Vec<FileRow>,
}

#[derive(Debug, Clone)]
pub struct FileRow {
    pub name: String,
    /// Humanized, `"-"` when the listing has no size.
    pub size: String,
    pub date: String,
}

#[derive(Debug, Clone)]
pub struct DetailsPage {
    pub identifier: String,
    pub title: String,
    pub pub_date: Option<String>,
    pub creators: Vec<String>,
    pub topics: Vec<String>,
    pub item_size: String,
    pub description: String,
    pub collections: Vec<CollectionRow>,
    pub uploader: Option<String>,
    pub upload_date: Option<String>,
}

/// Item search results page. `results` is `None` when no query was
/// submitted.
#[derive(Debug, Clone)]
pub struct ResultsPage {
    pub query: String,
    pub page: i64,
    pub num_found: u64,
    pub results: Option<Vec<SearchRow>>,
    /// Computed by the handler from the search page size.
    pub has_next: bool,
}

#[derive(Debug, Clone)]
pub struct SearchRow {
    pub identifier: String,
    pub title: String,
}
