//! Mode-routed template dispatch.
//!
//! Every page render goes through a [`ModeRenderer`], which rewrites the
//! requested template name to `"{mode}/{name}"` and injects the resolved
//! mode into the render context. There is no cross-mode fallback: if a
//! template does not exist for the active mode, the render fails.

use std::sync::Arc;

use axum::http::{header, StatusCode};
use axum::response::Response;
use thiserror::Error;
use tracing::error;

use crate::metrics;
use crate::mode::ClientMode;

pub mod context;
pub mod registry;
pub mod templates;

pub use context::{PageContext, PageData};
pub use registry::TemplateRegistry;

/// Template rendering failures.
#[derive(Debug, Error)]
pub enum RenderError {
    /// No template registered under the resolved `mode/name` key.
    #[error("template not found: {name}")]
    TemplateNotFound { name: String },

    /// The template was handed a context shape it cannot render.
    #[error("template {page} rendered with mismatched context")]
    ContextMismatch { page: &'static str },
}

impl RenderError {
    pub fn context_mismatch(page: &'static str) -> Self {
        RenderError::ContextMismatch { page }
    }
}

/// A named-template rendering capability. Names carry a path-like mode
/// prefix (`"wap/index"`).
pub trait TemplateEngine: Send + Sync {
    fn render(&self, name: &str, ctx: &PageContext) -> Result<String, RenderError>;
}

/// Shared handle to the process-wide engine.
pub type SharedEngine = Arc<dyn TemplateEngine>;

/// Per-request render dispatcher bound to the request's resolved mode.
///
/// Handlers name templates by page (`"index"`, `"message"`); the dispatcher
/// owns the mode prefixing and the mode-appropriate content type.
#[derive(Clone)]
pub struct ModeRenderer {
    mode: ClientMode,
    engine: SharedEngine,
}

impl ModeRenderer {
    pub fn new(mode: ClientMode, engine: SharedEngine) -> Self {
        Self { mode, engine }
    }

    /// The mode this request resolved to.
    pub fn mode(&self) -> ClientMode {
        self.mode
    }

    /// Renders `name` for the request's mode with the given status code.
    ///
    /// A missing template or a context mismatch is a server error, not a
    /// fallback: the failure is logged and a bare 500 goes out.
    pub fn page(&self, status: StatusCode, name: &str, data: PageData) -> Response {
        let full_name = format!("{}/{}", self.mode.as_str(), name);
        let ctx = PageContext { mode: self.mode, data };
        match self.engine.render(&full_name, &ctx) {
            Ok(body) => {
                metrics::global().pages_rendered.inc();
                Response::builder()
                    .status(status)
                    .header(header::CONTENT_TYPE, self.mode.content_type())
                    .body(body.into())
                    .unwrap_or_else(|_| internal_error())
            }
            Err(err) => {
                metrics::global().render_failures.inc();
                error!(template = %full_name, %err, "render failed");
                internal_error()
            }
        }
    }
}

fn internal_error() -> Response {
    let mut response = Response::new("internal server error".into());
    *response.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
    response
}
