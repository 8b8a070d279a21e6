//! Page handlers.
//!
//! Each handler maps archive API responses into typed page data and hands
//! it to the request's [`ModeRenderer`]. Upstream failures are logged with
//! the request path and surface to the client as a generic 502 notice;
//! diagnostic detail never leaves the server.

use std::collections::HashMap;

use axum::extract::{Path, Query, State};
use axum::http::{header, HeaderMap, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use serde::Deserialize;
use tracing::error;

use crate::archive::{self, ArchiveError, Item, SnapshotMatch, SnapshotQuery};
use crate::metrics;
use crate::render::context::{
    AnnouncementRow, CollectionRow, DetailsPage, DownloadPage, FileRow, HomePage, MediaCountRow,
    ResultsPage, SearchRow, SnapshotRow, WebPage,
};
use crate::render::{ModeRenderer, PageData};
use crate::util;

use super::AppState;

const UPSTREAM_NOTICE: &str = "The archive is not responding. Please try again later.";

/// `GET /` — announcements, humanized media counts, top collections.
pub async fn home(State(state): State<AppState>, uri: Uri, renderer: ModeRenderer) -> Response {
    let (announcements, media_counts, top_collections) = tokio::join!(
        state.archive.announcements(),
        state.archive.media_counts(),
        state.archive.top_collections(10),
    );

    let page = match (announcements, media_counts, top_collections) {
        (Ok(announcements), Ok(media_counts), Ok(top_collections)) => HomePage {
            announcements: announcements
                .into_iter()
                .map(|a| AnnouncementRow { title: a.title, url: a.url })
                .collect(),
            media_counts: media_count_rows(media_counts),
            top_collections: top_collections.into_iter().map(collection_row).collect(),
        },
        (Err(err), _, _) | (_, Err(err), _) | (_, _, Err(err)) => {
            return upstream_error(&uri, &renderer, err);
        }
    };
    renderer.page(StatusCode::OK, "index", PageData::Home(page))
}

/// Static copy pages; the template name is the route path itself.
pub async fn static_page(uri: Uri, renderer: ModeRenderer) -> Response {
    let name = uri.path().trim_start_matches('/');
    renderer.page(StatusCode::OK, name, PageData::Empty)
}

/// `GET /ua` — echoes the User-Agent and the mode it classified to.
pub async fn user_agent(headers: HeaderMap, renderer: ModeRenderer) -> Response {
    let agent = headers
        .get(header::USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("(no user-agent)");
    let body = format!("{agent}\nmode: {}\n", renderer.mode());
    ([(header::CONTENT_TYPE, "text/plain; charset=utf-8")], body).into_response()
}

#[derive(Debug, Deserialize)]
pub struct WebParams {
    query: Option<String>,
}

/// `GET /web?query=` — Wayback snapshot search. Without a query the page is
/// just the form; with one, the CDX query is capability-adjusted for the
/// request's mode before it goes out.
pub async fn web(
    State(state): State<AppState>,
    Query(params): Query<WebParams>,
    uri: Uri,
    renderer: ModeRenderer,
) -> Response {
    let query = params.query.unwrap_or_default();
    if query.is_empty() {
        return renderer.page(StatusCode::OK, "web", PageData::Web(WebPage { query, results: None }));
    }

    let snapshot_query = SnapshotQuery::new(query.as_str()).for_mode(renderer.mode());
    match state.archive.snapshot_matches(&snapshot_query).await {
        Ok(matches) => {
            let results = matches.into_iter().map(snapshot_row).collect();
            renderer.page(
                StatusCode::OK,
                "web",
                PageData::Web(WebPage { query, results: Some(results) }),
            )
        }
        Err(err) => upstream_error(&uri, &renderer, err),
    }
}

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    query: Option<String>,
    page: Option<String>,
}

/// `GET /search?query=&page=` — paginated item search.
pub async fn search(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
    uri: Uri,
    renderer: ModeRenderer,
) -> Response {
    let query = params.query.unwrap_or_default();
    let page = util::parse_page(params.page.as_deref());
    if query.is_empty() {
        let empty = ResultsPage { query, page, num_found: 0, results: None, has_next: false };
        return renderer.page(StatusCode::OK, "results", PageData::Results(empty));
    }

    match state.archive.search_items(&query, page).await {
        Ok(body) => {
            let has_next = archive::has_next_page(page, body.num_found);
            let results = body
                .docs
                .into_iter()
                .map(|doc| SearchRow {
                    identifier: doc.identifier,
                    title: doc.title.unwrap_or_else(|| "[Untitled]".to_string()),
                })
                .collect();
            let data = ResultsPage {
                query,
                page,
                num_found: body.num_found,
                results: Some(results),
                has_next,
            };
            renderer.page(StatusCode::OK, "results", PageData::Results(data))
        }
        Err(err) => upstream_error(&uri, &renderer, err),
    }
}

/// `GET /details/{identifier}` — item metadata page.
pub async fn details(
    State(state): State<AppState>,
    Path(identifier): Path<String>,
    uri: Uri,
    renderer: ModeRenderer,
) -> Response {
    match state.archive.get_item(&identifier).await {
        Ok(item) => {
            let page = details_page(&identifier, item);
            renderer.page(StatusCode::OK, "details", PageData::Details(Box::new(page)))
        }
        Err(err) if err.is_not_found() => not_found_item(&renderer, identifier),
        Err(err) => upstream_error(&uri, &renderer, err),
    }
}

/// `GET /download/{identifier}` — file listing with humanized sizes/dates.
pub async fn download(
    State(state): State<AppState>,
    Path(identifier): Path<String>,
    uri: Uri,
    renderer: ModeRenderer,
) -> Response {
    match state.archive.get_item(&identifier).await {
        Ok(item) => {
            let files = item.files.iter().map(|f| file_row(f, item.item_last_updated)).collect();
            let page = DownloadPage { identifier, files };
            renderer.page(StatusCode::OK, "download", PageData::Download(page))
        }
        Err(err) if err.is_not_found() => not_found_item(&renderer, identifier),
        Err(err) => upstream_error(&uri, &renderer, err),
    }
}

/// Fallback for unmatched paths.
pub async fn not_found(renderer: ModeRenderer) -> Response {
    renderer.page(
        StatusCode::NOT_FOUND,
        "message",
        PageData::Message { message: "Page not found".to_string() },
    )
}

// ---------------------------------------------------------------------------
// Response mapping
// ---------------------------------------------------------------------------

fn upstream_error(uri: &Uri, renderer: &ModeRenderer, err: ArchiveError) -> Response {
    metrics::global().upstream_errors.inc();
    error!(path = %uri, %err, "archive request failed");
    renderer.page(
        StatusCode::BAD_GATEWAY,
        "message",
        PageData::Message { message: UPSTREAM_NOTICE.to_string() },
    )
}

fn not_found_item(renderer: &ModeRenderer, identifier: String) -> Response {
    renderer.page(StatusCode::NOT_FOUND, "notfound", PageData::NotFound { identifier })
}

fn media_count_rows(counts: HashMap<String, u64>) -> Vec<MediaCountRow> {
    let mut rows: Vec<_> = counts.into_iter().collect();
    rows.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    rows.into_iter()
        .map(|(label, count)| MediaCountRow { label, count: util::format_count(count) })
        .collect()
}

fn collection_row(doc: archive::SearchDoc) -> CollectionRow {
    let title = doc.title.unwrap_or_else(|| doc.identifier.clone());
    CollectionRow { identifier: doc.identifier, title }
}

fn snapshot_row(snapshot: SnapshotMatch) -> SnapshotRow {
    let date = util::wayback_date(&snapshot.timestamp)
        .unwrap_or_else(|| snapshot.timestamp.clone());
    SnapshotRow {
        original: snapshot.original,
        date,
        timestamp: snapshot.timestamp,
        status_code: snapshot.status_code,
    }
}

fn file_row(file: &archive::ItemFile, item_last_updated: Option<u64>) -> FileRow {
    FileRow {
        name: file.name.clone(),
        size: file.size.map(util::format_size).unwrap_or_else(|| "-".to_string()),
        date: epoch_date(file.mtime.or(item_last_updated)).unwrap_or_else(|| "-".to_string()),
    }
}

fn details_page(identifier: &str, item: Item) -> DetailsPage {
    let metadata = item.metadata;
    let description = if metadata.description.is_empty() {
        "[No description]".to_string()
    } else {
        util::decode_entities(&metadata.description.join("\n"))
    };
    DetailsPage {
        identifier: identifier.to_string(),
        title: metadata.title.unwrap_or_else(|| identifier.to_string()),
        pub_date: metadata.date,
        creators: metadata.creator,
        topics: metadata.subject,
        item_size: item.item_size.map(util::format_size).unwrap_or_else(|| "-".to_string()),
        description,
        collections: metadata
            .collection
            .into_iter()
            .map(|c| CollectionRow { identifier: c.clone(), title: c })
            .collect(),
        uploader: metadata.uploader,
        upload_date: metadata.addeddate,
    }
}

/// `YYYY-MM-DD` for an epoch-seconds value.
fn epoch_date(seconds: Option<u64>) -> Option<String> {
    let seconds = i64::try_from(seconds?).ok()?;
    let datetime = chrono::DateTime::from_timestamp(seconds, 0)?;
    Some(datetime.format("%Y-%m-%d").to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archive::{ItemFile, ItemMetadata};

    #[test]
    fn test_media_count_rows_sorted_by_count_desc() {
        let counts = HashMap::from([
            ("texts".to_string(), 38_100_000),
            ("movies".to_string(), 2_430_000),
            ("audio".to_string(), 2_430_000),
        ]);
        let rows = media_count_rows(counts);
        assert_eq!(rows[0].label, "texts");
        assert_eq!(rows[0].count, "38.1M");
        // Ties break on the label so output is stable.
        assert_eq!(rows[1].label, "audio");
        assert_eq!(rows[2].label, "movies");
    }

    #[test]
    fn test_snapshot_row_falls_back_to_raw_timestamp() {
        let parsed = snapshot_row(SnapshotMatch {
            original: "http://example.com/".to_string(),
            status_code: "200".to_string(),
            timestamp: "19991123041522".to_string(),
        });
        assert_eq!(parsed.date, "1999-11-23");

        let unparsed = snapshot_row(SnapshotMatch {
            original: "http://example.com/".to_string(),
            status_code: "200".to_string(),
            timestamp: "bogus".to_string(),
        });
        assert_eq!(unparsed.date, "bogus");
    }

    #[test]
    fn test_file_row_dates_fall_back_to_item_mtime() {
        let dated = ItemFile {
            name: "apollo11.jpg".to_string(),
            size: Some(1_048_576),
            mtime: Some(1_086_069_900),
            format: None,
        };
        let row = file_row(&dated, None);
        assert_eq!(row.date, "2004-06-01");
        assert_eq!(row.size, "1.05M");

        let undated = ItemFile {
            name: "meta.xml".to_string(),
            size: None,
            mtime: None,
            format: None,
        };
        let row = file_row(&undated, Some(1_086_069_900));
        assert_eq!(row.date, "2004-06-01");
        assert_eq!(row.size, "-");

        let row = file_row(&undated, None);
        assert_eq!(row.date, "-");
    }

    #[test]
    fn test_details_page_defaults() {
        let item = Item {
            metadata: ItemMetadata {
                identifier: "apollo11".to_string(),
                title: None,
                description: vec!["Tom &amp; Jerry".to_string()],
                creator: vec![],
                subject: vec![],
                collection: vec!["nasa".to_string()],
                uploader: None,
                date: None,
                addeddate: None,
            },
            files: vec![],
            item_size: None,
            item_last_updated: None,
        };
        let page = details_page("apollo11", item);
        assert_eq!(page.title, "apollo11");
        assert_eq!(page.description, "Tom & Jerry");
        assert_eq!(page.item_size, "-");
        assert_eq!(page.collections[0].identifier, "nasa");
    }

    #[test]
    fn test_details_page_placeholder_description() {
        let item = Item {
            metadata: ItemMetadata {
                identifier: "apollo11".to_string(),
                title: Some("Apollo 11".to_string()),
                description: vec![],
                creator: vec![],
                subject: vec![],
                collection: vec![],
                uploader: None,
                date: None,
                addeddate: None,
            },
            files: vec![],
            item_size: Some(4_200_000_000),
            item_last_updated: None,
        };
        let page = details_page("apollo11", item);
        assert_eq!(page.description, "[No description]");
        assert_eq!(page.item_size, "4.2G");
    }
}
