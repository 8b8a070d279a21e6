//! archive.org API client: item metadata, full-text search, Wayback CDX,
//! and the small services endpoints the home page aggregates.
//!
//! Every base URL is configurable so tests (and mirrors) can point the
//! client at a local stub.

use std::collections::HashMap;
use std::time::Duration;

use axum::http::StatusCode;
use thiserror::Error;
use tracing::debug;

use crate::config::ArchiveConfig;

pub mod query;
pub mod types;

pub use query::SnapshotQuery;
pub use types::{
    Announcement, Item, ItemFile, ItemMetadata, SearchBody, SearchDoc, SnapshotMatch,
};

/// Rows requested per search page; pagination links assume the same size.
pub const SEARCH_PAGE_SIZE: u64 = 50;

/// Whether a further results page exists after `page`.
pub fn has_next_page(page: i64, num_found: u64) -> bool {
    page >= 1 && (page as u64).saturating_mul(SEARCH_PAGE_SIZE) < num_found
}

/// Collaborator API failures. All of these surface to users as a generic
/// message; the variants exist for logging and for the not-found split.
#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("invalid base URL \"{url}\": {reason}")]
    InvalidBaseUrl { url: String, reason: String },

    #[error("failed to build HTTP client: {source}")]
    ClientBuild {
        #[source]
        source: reqwest::Error,
    },

    #[error("{endpoint} request failed: {source}")]
    Request {
        endpoint: &'static str,
        #[source]
        source: reqwest::Error,
    },

    #[error("{endpoint} returned HTTP {status}")]
    Status {
        endpoint: &'static str,
        status: StatusCode,
    },

    #[error("could not decode {endpoint} response: {source}")]
    Decode {
        endpoint: &'static str,
        #[source]
        source: reqwest::Error,
    },

    #[error("item \"{identifier}\" not found")]
    ItemNotFound { identifier: String },
}

impl ArchiveError {
    /// The one case pages treat as a client-side 404 rather than a
    /// gateway failure.
    pub fn is_not_found(&self) -> bool {
        matches!(self, ArchiveError::ItemNotFound { .. })
    }
}

/// HTTP client over the archive.org API family.
#[derive(Debug, Clone)]
pub struct ArchiveClient {
    http: reqwest::Client,
    metadata_base: String,
    search_base: String,
    cdx_base: String,
    services_base: String,
}

impl ArchiveClient {
    pub fn new(config: &ArchiveConfig) -> Result<Self, ArchiveError> {
        let http = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .timeout(Duration::from_secs(30))
            .user_agent(concat!("microfiche/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|source| ArchiveError::ClientBuild { source })?;
        Ok(Self {
            http,
            metadata_base: normalize_base(&config.metadata_base)?,
            search_base: normalize_base(&config.search_base)?,
            cdx_base: normalize_base(&config.cdx_base)?,
            services_base: normalize_base(&config.services_base)?,
        })
    }

    /// Fetches item metadata. The metadata API answers `200 {}` for unknown
    /// identifiers, so absence is detected on the body, not the status.
    pub async fn get_item(&self, identifier: &str) -> Result<Item, ArchiveError> {
        const ENDPOINT: &str = "metadata";
        let url = format!("{}/metadata/{identifier}", self.metadata_base);
        debug!(%identifier, "fetching item metadata");
        let parsed: types::ItemResponse = self.get_json(ENDPOINT, &url, &[]).await?;
        let metadata = parsed.metadata.ok_or_else(|| ArchiveError::ItemNotFound {
            identifier: identifier.to_string(),
        })?;
        Ok(Item {
            metadata,
            files: parsed.files,
            item_size: parsed.item_size,
            item_last_updated: parsed.item_last_updated,
        })
    }

    /// Full-text search, one page of [`SEARCH_PAGE_SIZE`] rows.
    pub async fn search_items(&self, query: &str, page: i64) -> Result<SearchBody, ArchiveError> {
        const ENDPOINT: &str = "advancedsearch";
        let url = format!("{}/advancedsearch.php", self.search_base);
        let params = [
            ("q", query.to_string()),
            ("fl[]", "identifier".to_string()),
            ("fl[]", "title".to_string()),
            ("rows", SEARCH_PAGE_SIZE.to_string()),
            ("page", page.max(1).to_string()),
            ("output", "json".to_string()),
        ];
        let parsed: types::SearchResponse = self.get_json(ENDPOINT, &url, &params).await?;
        Ok(parsed.response)
    }

    /// The most-downloaded collections, for the home page.
    pub async fn top_collections(&self, limit: u32) -> Result<Vec<SearchDoc>, ArchiveError> {
        const ENDPOINT: &str = "advancedsearch";
        let url = format!("{}/advancedsearch.php", self.search_base);
        let params = [
            ("q", "mediatype:collection".to_string()),
            ("fl[]", "identifier".to_string()),
            ("fl[]", "title".to_string()),
            ("sort[]", "downloads desc".to_string()),
            ("rows", limit.to_string()),
            ("page", "1".to_string()),
            ("output", "json".to_string()),
        ];
        let parsed: types::SearchResponse = self.get_json(ENDPOINT, &url, &params).await?;
        Ok(parsed.response.docs)
    }

    /// Item counts by mediatype.
    pub async fn media_counts(&self) -> Result<HashMap<String, u64>, ArchiveError> {
        const ENDPOINT: &str = "mediacounts";
        let url = format!("{}/mediacounts", self.services_base);
        let parsed: types::MediaCountsResponse = self.get_json(ENDPOINT, &url, &[]).await?;
        Ok(parsed.counts)
    }

    /// Current site announcements.
    pub async fn announcements(&self) -> Result<Vec<Announcement>, ArchiveError> {
        const ENDPOINT: &str = "announcements";
        let url = format!("{}/announcements", self.services_base);
        let parsed: types::AnnouncementsResponse = self.get_json(ENDPOINT, &url, &[]).await?;
        Ok(parsed.announcements)
    }

    /// Runs a CDX snapshot query. The JSON output is an array of arrays
    /// with a leading header row; rows are mapped by header position.
    pub async fn snapshot_matches(
        &self,
        query: &SnapshotQuery,
    ) -> Result<Vec<SnapshotMatch>, ArchiveError> {
        const ENDPOINT: &str = "cdx";
        let url = format!("{}/cdx/search/cdx", self.cdx_base);
        let rows: Vec<Vec<String>> = self.get_json(ENDPOINT, &url, &query.to_params()).await?;
        let mut iter = rows.into_iter();
        let Some(header) = iter.next() else {
            return Ok(Vec::new());
        };
        let col = |name: &str| header.iter().position(|h| h == name);
        let (Some(original), Some(status), Some(timestamp)) =
            (col("original"), col("statuscode"), col("timestamp"))
        else {
            return Ok(Vec::new());
        };
        Ok(iter
            .filter_map(|row| {
                Some(SnapshotMatch {
                    original: row.get(original)?.clone(),
                    status_code: row.get(status)?.clone(),
                    timestamp: row.get(timestamp)?.clone(),
                })
            })
            .collect())
    }

    async fn get_json<T>(
        &self,
        endpoint: &'static str,
        url: &str,
        params: &[(&str, String)],
    ) -> Result<T, ArchiveError>
    where
        T: serde::de::DeserializeOwned,
    {
        let response = self
            .http
            .get(url)
            .query(params)
            .send()
            .await
            .map_err(|source| ArchiveError::Request { endpoint, source })?;
        let status = response.status();
        if !status.is_success() {
            return Err(ArchiveError::Status { endpoint, status });
        }
        response
            .json()
            .await
            .map_err(|source| ArchiveError::Decode { endpoint, source })
    }
}

pub(crate) fn normalize_base(url: &str) -> Result<String, ArchiveError> {
    let parsed = url::Url::parse(url).map_err(|e| ArchiveError::InvalidBaseUrl {
        url: url.to_string(),
        reason: e.to_string(),
    })?;
    let scheme = parsed.scheme();
    if scheme != "http" && scheme != "https" {
        return Err(ArchiveError::InvalidBaseUrl {
            url: url.to_string(),
            reason: format!("unsupported scheme \"{scheme}\""),
        });
    }
    Ok(url.trim_end_matches('/').to_string())
}
