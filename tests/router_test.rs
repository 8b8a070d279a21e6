//! End-to-end tests through the full router against a stub archive.org on a
//! loopback listener: classification picks the markup dialect, upstream
//! queries are capability-adjusted, and upstream failures surface as a
//! generic notice.

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use axum::body::Body;
use axum::extract::{Path, Query, State};
use axum::http::{header, Request, StatusCode};
use axum::routing::get;
use axum::{Json, Router};
use serde_json::json;
use tower::util::ServiceExt;

use microfiche::config::Config;
use microfiche::server::{build_router, AppState};

/// Decoded query pairs from every CDX request the stub served.
type CdxLog = Arc<Mutex<Vec<Vec<(String, String)>>>>;

async fn spawn_upstream(app: Router) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

fn stub_archive(cdx_log: CdxLog) -> Router {
    Router::new()
        .route("/metadata/{identifier}", get(stub_metadata))
        .route("/advancedsearch.php", get(stub_search))
        .route("/cdx/search/cdx", get(stub_cdx))
        .route("/announcements", get(stub_announcements))
        .route("/mediacounts", get(stub_mediacounts))
        .with_state(cdx_log)
}

async fn stub_metadata(Path(identifier): Path<String>) -> Json<serde_json::Value> {
    if identifier != "apollo11" {
        // The real metadata API answers unknown identifiers with 200 {}.
        return Json(json!({}));
    }
    Json(json!({
        "files": [
            {"name": "apollo11.mpg", "size": "1048576", "mtime": "1086069900", "format": "MPEG2"}
        ],
        "item_size": "4505600",
        "item_last_updated": 1086069900,
        "metadata": {
            "identifier": "apollo11",
            "title": "Apollo 11 Onboard Film",
            "creator": "NASA",
            "subject": ["space", "moon"],
            "collection": "nasa",
            "description": "Footage from the Apollo 11 command module.",
            "uploader": "archivist@example.org",
            "date": "1969-07-20",
            "addeddate": "2004-06-01 12:00:00"
        }
    }))
}

async fn stub_search(Query(params): Query<Vec<(String, String)>>) -> Json<serde_json::Value> {
    let q = params
        .iter()
        .find(|(k, _)| k == "q")
        .map(|(_, v)| v.as_str())
        .unwrap_or("");
    if q.starts_with("mediatype:collection") {
        return Json(json!({
            "responseHeader": {"status": 0},
            "response": {
                "numFound": 1,
                "docs": [{"identifier": "prelinger", "title": "Prelinger Archives"}]
            }
        }));
    }
    Json(json!({
        "responseHeader": {"status": 0},
        "response": {
            "numFound": 51,
            "docs": [
                {"identifier": "apollo11", "title": "Apollo 11 footage"},
                {"identifier": "untitled-item"}
            ]
        }
    }))
}

async fn stub_cdx(
    State(log): State<CdxLog>,
    Query(params): Query<Vec<(String, String)>>,
) -> Json<serde_json::Value> {
    log.lock().unwrap().push(params);
    Json(json!([
        ["original", "statuscode", "timestamp"],
        ["http://example.com/", "200", "19991123041522"]
    ]))
}

async fn stub_announcements() -> Json<serde_json::Value> {
    Json(json!({
        "announcements": [
            {"title": "Grand reopening", "url": "https://blog.archive.org/reopening"}
        ]
    }))
}

async fn stub_mediacounts() -> Json<serde_json::Value> {
    Json(json!({"counts": {"texts": 38_000_000, "movies": 2_430_000}}))
}

/// App config with every archive base pointed at the stub listener.
fn test_config(upstream: SocketAddr) -> Config {
    let base = format!("http://{upstream}");
    let mut config = Config::default();
    config.archive.metadata_base = base.clone();
    config.archive.search_base = base.clone();
    config.archive.cdx_base = base.clone();
    config.archive.services_base = base.clone();
    config.archive.thumb_base = format!("{base}/img");
    config
}

fn app(config: &Config) -> Router {
    build_router(AppState::new(config).unwrap())
}

async fn stubbed_app() -> (Router, CdxLog) {
    let cdx_log: CdxLog = Arc::new(Mutex::new(Vec::new()));
    let addr = spawn_upstream(stub_archive(cdx_log.clone())).await;
    (app(&test_config(addr)), cdx_log)
}

fn get_request(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn get_request_with_headers(uri: &str, headers: &[(&str, &str)]) -> Request<Body> {
    let mut builder = Request::builder().uri(uri);
    for (name, value) in headers {
        builder = builder.header(*name, *value);
    }
    builder.body(Body::empty()).unwrap()
}

async fn body_string(response: axum::response::Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

fn content_type(response: &axum::response::Response) -> &str {
    response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
}

// ---------------------------------------------------------------------------
// Classification and dialect selection
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_links_browser_gets_html2_markup() {
    let app = app(&Config::default());
    let request = get_request_with_headers("/contact", &[("user-agent", "Links (2.3; Linux)")]);
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(content_type(&response), "text/html; charset=utf-8");
    assert!(body_string(response).await.contains("HTML 2.0"));
}

#[tokio::test]
async fn test_wap2_handshake_selects_xhtml_mp() {
    let app = app(&Config::default());
    let request = get_request_with_headers(
        "/about",
        &[
            ("user-agent", "SonyEricssonT610/R101"),
            ("accept", "application/vnd.wap.xhtml+xml, */*"),
            ("x-wap-profile", "http://wap.sonyericsson.com/UAprof/T610R101.xml"),
        ],
    );
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(content_type(&response), "application/xhtml+xml; charset=utf-8");
}

#[tokio::test]
async fn test_invalid_mode_override_is_ignored() {
    let app = app(&Config::default());
    let response = app.oneshot(get_request("/about?mode=wapx")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(content_type(&response), "text/html; charset=utf-8");
}

// ---------------------------------------------------------------------------
// Pages over the stub archive
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_home_aggregates_upstream_sections() {
    let (app, _) = stubbed_app().await;
    let response = app.oneshot(get_request("/?mode=text")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_string(response).await;
    assert!(body.contains("Grand reopening"));
    assert!(body.contains("Prelinger Archives"));
    assert!(body.contains("texts: 38M"));
    assert!(body.contains("movies: 2.43M"));
}

#[tokio::test]
async fn test_search_renders_results_with_pagination() {
    let (app, _) = stubbed_app().await;
    let response = app
        .oneshot(get_request("/search?query=apollo&mode=text"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_string(response).await;
    assert!(body.contains("Apollo 11 footage"));
    assert!(body.contains("/details/apollo11"));
    assert!(body.contains("51 results"));
    // numFound 51 with 50 rows per page leaves one more page.
    assert!(body.contains("Next page"));
    // A doc without a title still gets a link text.
    assert!(body.contains("[Untitled]"));
}

#[tokio::test]
async fn test_search_without_query_is_bare_form() {
    let (app, _) = stubbed_app().await;
    let response = app.oneshot(get_request("/search?mode=text")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_string(response).await;
    assert!(body.contains("Search the library"));
    assert!(!body.contains("results for"));
}

#[tokio::test]
async fn test_details_renders_item_metadata() {
    let (app, _) = stubbed_app().await;
    let response = app
        .oneshot(get_request("/details/apollo11?mode=text"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_string(response).await;
    assert!(body.contains("Apollo 11 Onboard Film"));
    assert!(body.contains("NASA"));
    assert!(body.contains("Footage from the Apollo 11 command module."));
    assert!(body.contains("4.51M"));
}

#[tokio::test]
async fn test_details_unknown_item_is_404() {
    let (app, _) = stubbed_app().await;
    let response = app
        .oneshot(get_request("/details/ghost-item?mode=text"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = body_string(response).await;
    assert!(body.contains("Item not found"));
    assert!(body.contains("ghost-item"));
}

#[tokio::test]
async fn test_download_lists_files_with_size_and_date() {
    let (app, _) = stubbed_app().await;
    let response = app
        .oneshot(get_request("/download/apollo11?mode=text"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_string(response).await;
    assert!(body.contains("apollo11.mpg"));
    assert!(body.contains("1.05M"));
    assert!(body.contains("2004-06-01"));
}

// ---------------------------------------------------------------------------
// Capability-adjusted CDX queries
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_wap_web_query_gains_capability_filters() {
    let (app, cdx_log) = stubbed_app().await;
    let response = app
        .oneshot(get_request("/web?query=example.com&mode=wap"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(content_type(&response), "text/vnd.wap.wml; charset=utf-8");
    let body = body_string(response).await;
    assert!(body.contains("1999-11-23"));

    let log = cdx_log.lock().unwrap();
    let params = log.last().unwrap();
    let filters: Vec<&str> = params
        .iter()
        .filter(|(k, _)| k == "filter")
        .map(|(_, v)| v.as_str())
        .collect();
    assert_eq!(
        filters,
        vec!["statuscode:200", r"mimetype:text/(vnd\.wap\.wml|html)"]
    );
}

#[tokio::test]
async fn test_html4_web_query_sends_no_filters() {
    let (app, cdx_log) = stubbed_app().await;
    let response = app
        .oneshot(get_request("/web?query=example.com"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let log = cdx_log.lock().unwrap();
    let params = log.last().unwrap();
    assert!(params.iter().all(|(k, _)| k != "filter"));
}

// ---------------------------------------------------------------------------
// Failure surfaces
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_upstream_failure_renders_generic_notice() {
    let broken = Router::new().route(
        "/advancedsearch.php",
        get(|| async { StatusCode::INTERNAL_SERVER_ERROR }),
    );
    let addr = spawn_upstream(broken).await;
    let app = app(&test_config(addr));

    let response = app
        .oneshot(get_request("/search?query=apollo&mode=text"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    let body = body_string(response).await;
    assert!(body.contains("The archive is not responding."));
    // Upstream detail stays in the server log.
    assert!(!body.contains("advancedsearch"));
    assert!(!body.contains("500"));
}

#[tokio::test]
async fn test_unknown_path_renders_mode_404() {
    let app = app(&Config::default());
    let request =
        get_request_with_headers("/no-such-page", &[("user-agent", "w3m/0.5.3 (Linux)")]);
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(content_type(&response), "text/html; charset=utf-8");
    let body = body_string(response).await;
    assert!(body.contains("Page not found"));
    assert!(body.contains("HTML 2.0"));
}
