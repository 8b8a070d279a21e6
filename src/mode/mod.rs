//! Client capability classification.
//!
//! Legacy devices cannot be detected feature-by-feature; they are bucketed
//! into one of five render modes by inspecting request headers once, up
//! front. The resolved mode rides in request extensions and every page
//! render is routed by it.

use std::convert::Infallible;
use std::sync::LazyLock;

use axum::extract::{FromRequestParts, Request};
use axum::http::header::{ACCEPT, USER_AGENT};
use axum::http::request::Parts;
use axum::http::{HeaderMap, HeaderName, HeaderValue};
use axum::middleware::Next;
use axum::response::Response;
use regex::Regex;
use tracing::debug;

static X_WAP_PROFILE: HeaderName = HeaderName::from_static("x-wap-profile");

/// One render mode per capability class of legacy client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ClientMode {
    /// Text-mode browsers (Lynx, Links, w3m).
    Text,
    /// Desktop-era HTML 4 browsers. The safe default.
    #[default]
    Html4,
    /// PocketPC / PDA browsers on small fixed-size screens.
    Ppc,
    /// WAP 1.x phones speaking WML.
    Wap,
    /// WAP 2.0 phones speaking XHTML Mobile Profile.
    Wap2,
}

impl ClientMode {
    /// Every mode, in declaration order.
    pub const ALL: [ClientMode; 5] = [
        ClientMode::Text,
        ClientMode::Html4,
        ClientMode::Ppc,
        ClientMode::Wap,
        ClientMode::Wap2,
    ];

    /// The lowercase token used in template paths and the `?mode=` override.
    pub fn as_str(&self) -> &'static str {
        match self {
            ClientMode::Text => "text",
            ClientMode::Html4 => "html4",
            ClientMode::Ppc => "ppc",
            ClientMode::Wap => "wap",
            ClientMode::Wap2 => "wap2",
        }
    }

    /// Parses an override token. Exact match only; anything else is ignored
    /// by the caller.
    pub fn parse(value: &str) -> Option<ClientMode> {
        ClientMode::ALL.iter().copied().find(|m| m.as_str() == value)
    }

    /// Content type for pages rendered in this mode. WML gateways reject
    /// decks served as `text/html`.
    pub fn content_type(&self) -> &'static str {
        match self {
            ClientMode::Wap => "text/vnd.wap.wml; charset=utf-8",
            ClientMode::Wap2 => "application/xhtml+xml; charset=utf-8",
            _ => "text/html; charset=utf-8",
        }
    }
}

impl std::fmt::Display for ClientMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Classification rules
// ---------------------------------------------------------------------------

/// User-Agent rules, evaluated in order; first match wins. `wap` has no
/// pattern and is reachable through the explicit override only.
static UA_RULES: LazyLock<Vec<(Regex, ClientMode)>> = LazyLock::new(|| {
    vec![
        (Regex::new(r"^(?:Lynx|Links|w3m)").unwrap(), ClientMode::Text),
        (Regex::new(r"240x320").unwrap(), ClientMode::Ppc),
        (Regex::new(r"MSPIE|Windows CE").unwrap(), ClientMode::Html4),
    ]
});

/// Resolves the render mode for a request.
///
/// Precedence: a valid `override_token` wins outright; then the WAP2
/// handshake (`Accept` advertising XHTML MP together with a non-empty
/// `X-Wap-Profile`); then the User-Agent rule table; then `Html4`.
pub fn classify(headers: &HeaderMap, override_token: Option<&str>) -> ClientMode {
    if let Some(mode) = override_token.and_then(ClientMode::parse) {
        return mode;
    }

    let accepts_xhtml_mp = header_str(headers, &ACCEPT)
        .is_some_and(|accept| accept.contains("application/vnd.wap.xhtml+xml"));
    let has_wap_profile = header_str(headers, &X_WAP_PROFILE).is_some_and(|v| !v.is_empty());
    if accepts_xhtml_mp && has_wap_profile {
        return ClientMode::Wap2;
    }

    let user_agent = header_str(headers, &USER_AGENT).unwrap_or("");
    for (pattern, mode) in UA_RULES.iter() {
        if pattern.is_match(user_agent) {
            return *mode;
        }
    }
    ClientMode::Html4
}

fn header_str<'a>(headers: &'a HeaderMap, name: &HeaderName) -> Option<&'a str> {
    headers.get(name).and_then(|v| HeaderValue::to_str(v).ok())
}

/// Pulls `?mode=` out of a raw query string without touching other params.
pub fn override_from_query(query: Option<&str>) -> Option<String> {
    let query = query?;
    url::form_urlencoded::parse(query.as_bytes())
        .find(|(key, _)| key == "mode")
        .map(|(_, value)| value.into_owned())
}

/// Middleware that classifies each request exactly once and stamps the mode
/// into request extensions for extractors downstream.
pub async fn classify_request(mut req: Request, next: Next) -> Response {
    let override_token = override_from_query(req.uri().query());
    let mode = classify(req.headers(), override_token.as_deref());
    debug!(mode = mode.as_str(), path = req.uri().path(), "classified request");
    crate::metrics::global().mode_requests(mode).inc();
    req.extensions_mut().insert(mode);
    next.run(req).await
}

impl<S> FromRequestParts<S> for ClientMode
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(parts.extensions.get::<ClientMode>().copied().unwrap_or_default())
    }
}
