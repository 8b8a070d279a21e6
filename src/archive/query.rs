//! Wayback CDX query construction.
//!
//! [`SnapshotQuery`] holds the base query a handler wants; `for_mode`
//! derives the capability-adjusted variant actually sent upstream. The base
//! query is never mutated, so per-request adjustment cannot leak into the
//! process-wide default.

use crate::mode::ClientMode;

/// Status filter appended for WAP classes.
const WAP_STATUS_FILTER: &str = "statuscode:200";
/// MIME filter for pages a WAP browser can actually display.
const WAP_MIME_FILTER: &str = r"mimetype:text/(vnd\.wap\.wml|html)";

/// A CDX snapshot query: target URL plus result-shaping parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotQuery {
    url: String,
    limit: u32,
    collapse: Option<String>,
    fields: Vec<String>,
    filters: Vec<String>,
}

impl SnapshotQuery {
    /// Defaults mirror the production frontend: up to 500 rows, collapsed
    /// to one snapshot per month, returning original URL, status and
    /// timestamp.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            limit: 500,
            collapse: Some("timestamp:6".to_string()),
            fields: vec![
                "original".to_string(),
                "statuscode".to_string(),
                "timestamp".to_string(),
            ],
            filters: Vec::new(),
        }
    }

    pub fn with_limit(mut self, limit: u32) -> Self {
        self.limit = limit;
        self
    }

    pub fn with_collapse(mut self, collapse: Option<&str>) -> Self {
        self.collapse = collapse.map(str::to_string);
        self
    }

    pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
        self.filters.push(filter.into());
        self
    }

    pub fn filters(&self) -> &[String] {
        &self.filters
    }

    /// Derives the query to send for a request in `mode`.
    ///
    /// WAP phones cannot render arbitrary snapshots, so `wap` and `wap2`
    /// get the base filters plus a status-200 constraint and a
    /// WAP-displayable MIME constraint. Every other mode gets an untouched
    /// copy of the base query.
    pub fn for_mode(&self, mode: ClientMode) -> SnapshotQuery {
        let mut adjusted = self.clone();
        if matches!(mode, ClientMode::Wap | ClientMode::Wap2) {
            adjusted.filters.push(WAP_STATUS_FILTER.to_string());
            adjusted.filters.push(WAP_MIME_FILTER.to_string());
        }
        adjusted
    }

    /// Flattens into CDX request parameters. Repeated `filter` keys are how
    /// the CDX API takes multiple filters.
    pub fn to_params(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("url", self.url.clone()),
            ("output", "json".to_string()),
            ("limit", self.limit.to_string()),
            ("fl", self.fields.join(",")),
        ];
        if let Some(collapse) = &self.collapse {
            params.push(("collapse", collapse.clone()));
        }
        for filter in &self.filters {
            params.push(("filter", filter.clone()));
        }
        params
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wap_modes_gain_status_and_mime_filters() {
        let base = SnapshotQuery::new("example.com");
        for mode in [ClientMode::Wap, ClientMode::Wap2] {
            let adjusted = base.for_mode(mode);
            assert_eq!(
                adjusted.filters(),
                &[WAP_STATUS_FILTER.to_string(), WAP_MIME_FILTER.to_string()],
                "mode {mode}"
            );
        }
    }

    #[test]
    fn test_other_modes_pass_through_unchanged() {
        let base = SnapshotQuery::new("example.com").with_filter("statuscode:200");
        for mode in [ClientMode::Text, ClientMode::Html4, ClientMode::Ppc] {
            assert_eq!(base.for_mode(mode), base, "mode {mode}");
        }
    }

    #[test]
    fn test_base_query_is_never_mutated() {
        let base = SnapshotQuery::new("example.com");
        let _ = base.for_mode(ClientMode::Wap);
        let _ = base.for_mode(ClientMode::Wap2);
        assert!(base.filters().is_empty());

        // Derivation starts from the base every time; filters do not pile up.
        let again = base.for_mode(ClientMode::Wap);
        assert_eq!(again.filters().len(), 2);
    }

    #[test]
    fn test_existing_filters_are_kept_ahead_of_wap_filters() {
        let base = SnapshotQuery::new("example.com").with_filter("!statuscode:500");
        let adjusted = base.for_mode(ClientMode::Wap2);
        assert_eq!(adjusted.filters()[0], "!statuscode:500");
        assert_eq!(adjusted.filters().len(), 3);
    }

    #[test]
    fn test_params_repeat_filter_key() {
        let query = SnapshotQuery::new("example.com").for_mode(ClientMode::Wap);
        let params = query.to_params();
        let filters: Vec<_> = params.iter().filter(|(k, _)| *k == "filter").collect();
        assert_eq!(filters.len(), 2);
        assert!(params.contains(&("url", "example.com".to_string())));
        assert!(params.contains(&("collapse", "timestamp:6".to_string())));
        assert!(params.contains(&("limit", "500".to_string())));
        assert!(params.contains(&("fl", "original,statuscode,timestamp".to_string())));
    }
}
