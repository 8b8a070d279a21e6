//! End-to-end `/services/img` tests: a stub thumbnail upstream on a loopback
//! listener and shell scripts standing in for the converter binary, so the
//! whole fetch -> spawn -> stream path runs for real.

#![cfg(unix)]

use std::net::SocketAddr;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path as FsPath, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::{header, Request, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use bytes::Bytes;
use tempfile::TempDir;
use tower::util::ServiceExt;

use microfiche::config::Config;
use microfiche::server::{build_router, AppState};

type Hits = Arc<AtomicUsize>;

async fn stub_thumb(State(hits): State<Hits>, Path(identifier): Path<String>) -> Response {
    hits.fetch_add(1, Ordering::SeqCst);
    if identifier == "missing" {
        return StatusCode::NOT_FOUND.into_response();
    }
    Bytes::from_static(b"GIF87a fake image bytes").into_response()
}

async fn spawn_thumb_upstream(hits: Hits) -> SocketAddr {
    let app = Router::new()
        .route("/img/{identifier}", get(stub_thumb))
        .with_state(hits);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

/// Writes an executable stand-in for the converter binary.
fn write_converter(dir: &TempDir, body: &str) -> PathBuf {
    let path = dir.path().join("convert.sh");
    std::fs::write(&path, format!("#!/bin/sh\n{body}")).unwrap();
    let mut perms = std::fs::metadata(&path).unwrap().permissions();
    perms.set_mode(0o755);
    std::fs::set_permissions(&path, perms).unwrap();
    path
}

/// A converter that consumes stdin and echoes its argument list.
fn echo_args_converter(dir: &TempDir) -> PathBuf {
    write_converter(dir, "cat >/dev/null\nprintf 'converted(%s)' \"$*\"\n")
}

fn test_config(upstream: SocketAddr, program: &FsPath) -> Config {
    let mut config = Config::default();
    config.archive.thumb_base = format!("http://{upstream}/img");
    config.converter.program = program.display().to_string();
    config
}

async fn app_with_converter(program: &FsPath) -> (Router, Hits) {
    let hits: Hits = Arc::new(AtomicUsize::new(0));
    let addr = spawn_thumb_upstream(hits.clone()).await;
    let app = build_router(AppState::new(&test_config(addr, program)).unwrap());
    (app, hits)
}

fn get_request(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn content_type(response: &Response) -> &str {
    response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
}

async fn body_string(response: Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

// ---------------------------------------------------------------------------
// Happy paths
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_transcode_resizes_and_streams_gif() {
    let dir = TempDir::new().unwrap();
    let (app, hits) = app_with_converter(&echo_args_converter(&dir)).await;

    let response = app
        .oneshot(get_request("/services/img/apollo11?w=50&h=50"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(content_type(&response), "image/gif");
    assert_eq!(body_string(response).await, "converted(- -resize 50x50 GIF:-)");
    assert_eq!(hits.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_resize_requires_both_dimensions() {
    let dir = TempDir::new().unwrap();
    let (app, _) = app_with_converter(&echo_args_converter(&dir)).await;

    let response = app
        .oneshot(get_request("/services/img/apollo11?w=100"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_string(response).await, "converted(- GIF:-)");
}

#[tokio::test]
async fn test_unparseable_dimensions_mean_source_size() {
    let dir = TempDir::new().unwrap();
    let (app, _) = app_with_converter(&echo_args_converter(&dir)).await;

    let response = app
        .oneshot(get_request("/services/img/apollo11?w=abc&h=12.5"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_string(response).await, "converted(- GIF:-)");
}

#[tokio::test]
async fn test_wbmp_format_param() {
    let dir = TempDir::new().unwrap();
    let (app, _) = app_with_converter(&echo_args_converter(&dir)).await;

    let response = app
        .oneshot(get_request("/services/img/apollo11?w=32&h=32&f=wbmp"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(content_type(&response), "image/vnd.wap.wbmp");
    assert_eq!(body_string(response).await, "converted(- -resize 32x32 WBMP:-)");
}

// ---------------------------------------------------------------------------
// Rejections before any resource is touched
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_invalid_identifier_rejected_before_any_fetch() {
    let dir = TempDir::new().unwrap();
    let marker = dir.path().join("spawned");
    let script = write_converter(&dir, &format!("touch {}\ncat\n", marker.display()));
    let (app, hits) = app_with_converter(&script).await;

    let response = app
        .oneshot(get_request("/services/img/bad*id?w=10&h=10"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(hits.load(Ordering::SeqCst), 0);
    assert!(!marker.exists());
}

#[tokio::test]
async fn test_unknown_format_rejected_before_any_fetch() {
    let dir = TempDir::new().unwrap();
    let (app, hits) = app_with_converter(&echo_args_converter(&dir)).await;

    let response = app
        .oneshot(get_request("/services/img/apollo11?f=png"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(body_string(response).await.contains("png"));
    assert_eq!(hits.load(Ordering::SeqCst), 0);
}

// ---------------------------------------------------------------------------
// Upstream and converter failures
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_upstream_404_is_bad_gateway_and_spawns_nothing() {
    let dir = TempDir::new().unwrap();
    let marker = dir.path().join("spawned");
    let script = write_converter(&dir, &format!("touch {}\ncat\n", marker.display()));
    let (app, hits) = app_with_converter(&script).await;

    let response = app
        .oneshot(get_request("/services/img/missing?w=10&h=10"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    assert_eq!(body_string(response).await, "image conversion failed\n");
    assert_eq!(hits.load(Ordering::SeqCst), 1);
    assert!(!marker.exists(), "converter ran for a failed fetch");
}

#[tokio::test]
async fn test_missing_converter_binary_is_server_error() {
    let program = FsPath::new("/nonexistent/fiche-convert");
    let (app, hits) = app_with_converter(program).await;

    let response = app
        .oneshot(get_request("/services/img/apollo11?w=10&h=10"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body_string(response).await, "image conversion failed\n");
    assert_eq!(hits.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_converter_failure_after_output_aborts_stream() {
    let dir = TempDir::new().unwrap();
    let script = write_converter(&dir, "cat >/dev/null\nprintf 'GIF87a partial'\nexit 3\n");
    let (app, _) = app_with_converter(&script).await;

    let response = app
        .oneshot(get_request("/services/img/apollo11"))
        .await
        .unwrap();

    // The first converted bytes arrived, so the status was already committed.
    assert_eq!(response.status(), StatusCode::OK);
    let collected = axum::body::to_bytes(response.into_body(), usize::MAX).await;
    assert!(collected.is_err(), "body should abort, not end cleanly");
}

#[tokio::test]
async fn test_converter_timeout_kills_child_and_reports_error() {
    let dir = TempDir::new().unwrap();
    let script = write_converter(&dir, "sleep 30\n");
    let hits: Hits = Arc::new(AtomicUsize::new(0));
    let addr = spawn_thumb_upstream(hits.clone()).await;
    let mut config = test_config(addr, &script);
    config.converter.convert_timeout_secs = 1;
    let app = build_router(AppState::new(&config).unwrap());

    let response = app
        .oneshot(get_request("/services/img/apollo11?w=10&h=10"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body_string(response).await, "image conversion failed\n");
}
