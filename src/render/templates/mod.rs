//! Built-in page templates, one module per render mode.
//!
//! Each mode registers the same page set under its own prefix; the markup
//! dialects differ (WML decks for `wap`, XHTML Mobile Profile for `wap2`,
//! bare HTML 2.0 for `text`, table-era HTML for `html4`, a narrow single
//! column for `ppc`).

use super::context::{
    DetailsPage, DownloadPage, HomePage, PageContext, ResultsPage, WebPage,
};
use super::registry::TemplateRegistry;
use super::{PageData, RenderError};

pub mod copy;
mod html4;
mod ppc;
mod text;
mod wap;
mod wap2;

pub fn register_all(registry: &mut TemplateRegistry) {
    text::register(registry);
    html4::register(registry);
    ppc::register(registry);
    wap::register(registry);
    wap2::register(registry);
}

// ---------------------------------------------------------------------------
// Context extraction, shared by every mode module
// ---------------------------------------------------------------------------

pub(crate) fn home_data(ctx: &PageContext) -> Result<&HomePage, RenderError> {
    match &ctx.data {
        PageData::Home(data) => Ok(data),
        _ => Err(RenderError::context_mismatch("index")),
    }
}

pub(crate) fn message_data(ctx: &PageContext) -> Result<&str, RenderError> {
    match &ctx.data {
        PageData::Message { message } => Ok(message),
        _ => Err(RenderError::context_mismatch("message")),
    }
}

pub(crate) fn notfound_data(ctx: &PageContext) -> Result<&str, RenderError> {
    match &ctx.data {
        PageData::NotFound { identifier } => Ok(identifier),
        _ => Err(RenderError::context_mismatch("notfound")),
    }
}

pub(crate) fn web_data(ctx: &PageContext) -> Result<&WebPage, RenderError> {
    match &ctx.data {
        PageData::Web(data) => Ok(data),
        _ => Err(RenderError::context_mismatch("web")),
    }
}

pub(crate) fn download_data(ctx: &PageContext) -> Result<&DownloadPage, RenderError> {
    match &ctx.data {
        PageData::Download(data) => Ok(data),
        _ => Err(RenderError::context_mismatch("download")),
    }
}

pub(crate) fn details_data(ctx: &PageContext) -> Result<&DetailsPage, RenderError> {
    match &ctx.data {
        PageData::Details(data) => Ok(data),
        _ => Err(RenderError::context_mismatch("details")),
    }
}

pub(crate) fn results_data(ctx: &PageContext) -> Result<&ResultsPage, RenderError> {
    match &ctx.data {
        PageData::Results(data) => Ok(data),
        _ => Err(RenderError::context_mismatch("results")),
    }
}

// ---------------------------------------------------------------------------
// Shared link helpers
// ---------------------------------------------------------------------------

pub(crate) fn search_url(query: &str, page: i64) -> String {
    let encoded: String = url::form_urlencoded::Serializer::new(String::new())
        .append_pair("query", query)
        .finish();
    format!("/search?{encoded}&page={page}")
}

pub(crate) fn snapshot_url(timestamp: &str, original: &str) -> String {
    format!("https://web.archive.org/web/{timestamp}/{original}")
}

pub(crate) fn file_url(identifier: &str, name: &str) -> String {
    format!("https://archive.org/download/{identifier}/{name}")
}

pub(crate) fn details_url(identifier: &str) -> String {
    format!("/details/{identifier}")
}

pub(crate) fn thumb_url(identifier: &str, size: u32, wbmp: bool) -> String {
    if wbmp {
        format!("/services/img/{identifier}?w={size}&h={size}&f=wbmp")
    } else {
        format!("/services/img/{identifier}?w={size}&h={size}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_url_percent_encodes_query() {
        assert_eq!(search_url("apollo program", 2), "/search?query=apollo+program&page=2");
        assert_eq!(search_url("a&b", 1), "/search?query=a%26b&page=1");
    }

    #[test]
    fn test_thumb_url_formats() {
        assert_eq!(thumb_url("it", 64, true), "/services/img/it?w=64&h=64&f=wbmp");
        assert_eq!(thumb_url("it", 160, false), "/services/img/it?w=160&h=160");
    }
}
