//! HTTP surface.
//!
//! Route table, shared state, and the serve loop. Page handlers live in
//! [`pages`], the image transcoding endpoint in [`media`]. Every request
//! passes through the mode classification layer before routing.

use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::{FromRequestParts, State};
use axum::http::header;
use axum::http::request::Parts;
use axum::middleware;
use axum::response::{IntoResponse, Json};
use axum::routing::get;
use axum::Router;
use serde_json::json;
use thiserror::Error;
use tracing::{error, info};

use crate::archive::{ArchiveClient, ArchiveError};
use crate::config::Config;
use crate::imaging::TranscodePipeline;
use crate::metrics;
use crate::mode::{self, ClientMode};
use crate::render::{ModeRenderer, SharedEngine, TemplateRegistry};

pub mod media;
pub mod pages;

/// Server startup and runtime failures.
#[derive(Debug, Error)]
pub enum ServeError {
    #[error("invalid bind address \"{addr}\": {source}")]
    InvalidBindAddress {
        addr: String,
        #[source]
        source: std::net::AddrParseError,
    },

    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    #[error("server error: {source}")]
    Serve {
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Setup(#[from] ArchiveError),
}

/// Everything handlers share.
#[derive(Clone)]
pub struct AppState {
    pub engine: SharedEngine,
    pub archive: ArchiveClient,
    pub pipeline: Arc<TranscodePipeline>,
    /// Unix seconds at startup, for the `/health` uptime field.
    pub start_time: i64,
}

impl AppState {
    pub fn new(config: &Config) -> Result<Self, ArchiveError> {
        Ok(Self {
            engine: Arc::new(TemplateRegistry::with_default_pages()),
            archive: ArchiveClient::new(&config.archive)?,
            pipeline: Arc::new(TranscodePipeline::new(&config.archive, &config.converter)?),
            start_time: chrono::Utc::now().timestamp(),
        })
    }
}

/// Builds a [`ModeRenderer`] for the request from the mode stamped into
/// extensions by [`mode::classify_request`]. Falls back to the default mode
/// when the layer is absent.
impl FromRequestParts<AppState> for ModeRenderer {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let mode = parts.extensions.get::<ClientMode>().copied().unwrap_or_default();
        Ok(ModeRenderer::new(mode, state.engine.clone()))
    }
}

/// The full route table. Unmatched paths fall through to the mode-rendered
/// 404 page.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(pages::home))
        .route("/about", get(pages::static_page))
        .route("/contact", get(pages::static_page))
        .route("/projects", get(pages::static_page))
        .route("/people", get(pages::static_page))
        .route("/volunteer", get(pages::static_page))
        .route("/donate", get(pages::static_page))
        .route("/ua", get(pages::user_agent))
        .route("/web", get(pages::web))
        .route("/search", get(pages::search))
        .route("/details/{identifier}", get(pages::details))
        .route("/download/{identifier}", get(pages::download))
        .route("/services/img/{identifier}", get(media::transcode))
        .route("/health", get(health))
        .route("/metrics", get(metrics_exposition))
        .fallback(pages::not_found)
        .layer(middleware::from_fn(mode::classify_request))
        .with_state(state)
}

/// Liveness probe, also read by `fiche status`.
async fn health(State(state): State<AppState>) -> Json<serde_json::Value> {
    let uptime = chrono::Utc::now().timestamp().saturating_sub(state.start_time);
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "uptimeSeconds": uptime,
    }))
}

async fn metrics_exposition() -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4; charset=utf-8")],
        metrics::global().render(),
    )
}

/// Binds and serves until ctrl-c or SIGTERM.
pub async fn serve(config: Config) -> Result<(), ServeError> {
    let state = AppState::new(&config)?;
    let app = build_router(state);

    let raw_addr = format!("{}:{}", config.server.bind, config.server.port);
    let addr: SocketAddr = raw_addr
        .parse()
        .map_err(|source| ServeError::InvalidBindAddress { addr: raw_addr, source })?;

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|source| ServeError::Bind { addr, source })?;
    info!(address = %addr, "listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|source| ServeError::Serve { source })?;

    info!("server stopped");
    Ok(())
}

/// Resolves on ctrl-c or SIGTERM. A failed handler install is logged and
/// that trigger is disabled rather than taking the server down.
#[cfg(unix)]
async fn shutdown_signal() {
    use tokio::signal::unix::{signal, SignalKind};

    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            error!(%err, "failed to install ctrl-c handler");
            std::future::pending::<()>().await;
        }
    };

    match signal(SignalKind::terminate()) {
        Ok(mut sigterm) => {
            tokio::select! {
                _ = ctrl_c => info!("ctrl-c received, shutting down"),
                _ = sigterm.recv() => info!("SIGTERM received, shutting down"),
            }
        }
        Err(err) => {
            error!(%err, "failed to install SIGTERM handler, using ctrl-c only");
            ctrl_c.await;
            info!("ctrl-c received, shutting down");
        }
    }
}

#[cfg(not(unix))]
async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        error!(%err, "failed to install ctrl-c handler");
        std::future::pending::<()>().await;
    }
    info!("ctrl-c received, shutting down");
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::util::ServiceExt;

    fn test_router() -> Router {
        let state = AppState::new(&Config::default()).unwrap();
        build_router(state)
    }

    async fn body_string(response: axum::response::Response) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        String::from_utf8_lossy(&bytes).into_owned()
    }

    #[tokio::test]
    async fn test_health_reports_version() {
        let response = test_router()
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body: serde_json::Value = serde_json::from_str(&body_string(response).await).unwrap();
        assert_eq!(body["status"], "ok");
        assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
        assert!(body["uptimeSeconds"].is_i64());
    }

    #[tokio::test]
    async fn test_metrics_exposition_lists_mode_counters() {
        let response = test_router()
            .oneshot(Request::get("/metrics").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let content_type = response.headers().get(header::CONTENT_TYPE).unwrap();
        assert_eq!(content_type, "text/plain; version=0.0.4; charset=utf-8");

        let body = body_string(response).await;
        assert!(body.contains("microfiche_requests_total{mode=\"wap\"}"));
        assert!(body.contains("# TYPE microfiche_transcode_duration_ms histogram"));
    }

    #[tokio::test]
    async fn test_static_page_routed_by_user_agent() {
        let request = Request::get("/about")
            .header("user-agent", "Lynx/2.8.9rel.1")
            .body(Body::empty())
            .unwrap();
        let response = test_router().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get(header::CONTENT_TYPE).unwrap(),
            "text/html; charset=utf-8"
        );
        // The text variant keeps the HTML 2.0 doctype.
        assert!(body_string(response).await.contains("HTML 2.0"));
    }

    #[tokio::test]
    async fn test_mode_override_switches_markup_dialect() {
        let response = test_router()
            .oneshot(Request::get("/about?mode=wap").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get(header::CONTENT_TYPE).unwrap(),
            "text/vnd.wap.wml; charset=utf-8"
        );
        assert!(body_string(response).await.contains("<wml>"));
    }

    #[tokio::test]
    async fn test_unmatched_path_renders_404_page() {
        let response = test_router()
            .oneshot(Request::get("/no/such/page").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert!(body_string(response).await.contains("not found"));
    }

    #[tokio::test]
    async fn test_ua_endpoint_echoes_agent_and_mode() {
        let request = Request::get("/ua")
            .header("user-agent", "w3m/0.5.3")
            .body(Body::empty())
            .unwrap();
        let response = test_router().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_string(response).await;
        assert!(body.contains("w3m/0.5.3"));
        assert!(body.contains("text"));
    }
}
