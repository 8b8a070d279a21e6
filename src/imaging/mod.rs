//! Thumbnail transcoding for legacy clients.
//!
//! Old devices cannot decode modern image formats, so `/services/img`
//! fetches the upstream thumbnail and pipes it through an external
//! ImageMagick-style converter, streaming the converted bytes straight to
//! the client. Nothing is buffered beyond pipe capacity: upstream bytes
//! flow in as fast as the converter drains them, and converter output flows
//! out as fast as the client reads it.

use std::sync::LazyLock;

use async_trait::async_trait;
use axum::http::StatusCode;
use bytes::Bytes;
use futures_util::stream::BoxStream;
use regex::Regex;
use thiserror::Error;

pub mod convert;
pub mod pipeline;

pub use convert::MagickConverter;
pub use pipeline::TranscodePipeline;

/// Bytes in flight through the pipeline.
pub type ByteStream = BoxStream<'static, Result<Bytes, TranscodeError>>;

/// Identifier shape the thumbnail service accepts: 1 to 100 chars, leading
/// alphanumeric or underscore, then alphanumeric, dot, underscore, hyphen.
/// Rejects path separators and anything else that could escape the URL
/// path segment.
static IDENTIFIER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_][A-Za-z0-9._-]{0,99}$").unwrap());

/// Transcode failures, ordered roughly by pipeline stage.
#[derive(Debug, Error)]
pub enum TranscodeError {
    #[error("invalid identifier \"{identifier}\"")]
    InvalidIdentifier { identifier: String },

    #[error("unsupported output format \"{format}\"")]
    InvalidFormat { format: String },

    #[error("upstream image fetch failed: {source}")]
    UpstreamFetch {
        #[source]
        source: reqwest::Error,
    },

    #[error("upstream returned HTTP {status}")]
    UpstreamStatus { status: StatusCode },

    /// Body read failed after a successful response line.
    #[error("upstream body read failed: {detail}")]
    UpstreamRead { detail: String },

    #[error("could not start converter \"{program}\": {source}")]
    ConverterSpawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("converter exited with {status}")]
    ConverterExit { status: std::process::ExitStatus },

    #[error("converter did not finish within {secs}s and was killed")]
    ConverterTimeout { secs: u64 },

    #[error("converter I/O failed: {source}")]
    ConverterIo {
        #[source]
        source: std::io::Error,
    },
}

impl TranscodeError {
    /// Status for failures detected before any body bytes go out. Failures
    /// after that point abort the stream instead; there is no second status
    /// line to send.
    pub fn status_code(&self) -> StatusCode {
        match self {
            TranscodeError::InvalidIdentifier { .. } | TranscodeError::InvalidFormat { .. } => {
                StatusCode::BAD_REQUEST
            }
            TranscodeError::UpstreamFetch { .. }
            | TranscodeError::UpstreamStatus { .. }
            | TranscodeError::UpstreamRead { .. } => StatusCode::BAD_GATEWAY,
            TranscodeError::ConverterSpawn { .. }
            | TranscodeError::ConverterExit { .. }
            | TranscodeError::ConverterTimeout { .. }
            | TranscodeError::ConverterIo { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// The legacy output formats the converter is asked to produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Gif,
    Wbmp,
}

impl OutputFormat {
    /// Parses the `f` query parameter. Absent means GIF; anything outside
    /// the legacy set is rejected.
    pub fn parse(raw: Option<&str>) -> Result<Self, TranscodeError> {
        match raw {
            None => Ok(OutputFormat::Gif),
            Some(raw) if raw.eq_ignore_ascii_case("gif") => Ok(OutputFormat::Gif),
            Some(raw) if raw.eq_ignore_ascii_case("wbmp") => Ok(OutputFormat::Wbmp),
            Some(raw) => Err(TranscodeError::InvalidFormat { format: raw.to_string() }),
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            OutputFormat::Gif => "image/gif",
            OutputFormat::Wbmp => "image/vnd.wap.wbmp",
        }
    }

    /// The explicit `FORMAT:-` output argument, so conversion never depends
    /// on the converter guessing from a filename.
    pub fn convert_target(&self) -> &'static str {
        match self {
            OutputFormat::Gif => "GIF:-",
            OutputFormat::Wbmp => "WBMP:-",
        }
    }
}

/// Validated, immutable description of one transcode request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranscodeSpec {
    identifier: String,
    width: u32,
    height: u32,
    format: OutputFormat,
}

impl TranscodeSpec {
    /// Validates the identifier up front; nothing downstream runs for a bad
    /// one. `width`/`height` of zero mean "source size".
    pub fn new(
        identifier: &str,
        width: u32,
        height: u32,
        format: OutputFormat,
    ) -> Result<Self, TranscodeError> {
        if !IDENTIFIER_RE.is_match(identifier) {
            return Err(TranscodeError::InvalidIdentifier {
                identifier: identifier.to_string(),
            });
        }
        Ok(Self {
            identifier: identifier.to_string(),
            width,
            height,
            format,
        })
    }

    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    pub fn format(&self) -> OutputFormat {
        self.format
    }

    /// Resize geometry, present only when both dimensions are positive.
    /// A single dimension is not enough; the converter would otherwise
    /// invent the missing one.
    pub fn resize(&self) -> Option<(u32, u32)> {
        if self.width > 0 && self.height > 0 {
            Some((self.width, self.height))
        } else {
            None
        }
    }

    /// The converter invocation this request calls for.
    pub fn job(&self) -> ConvertJob {
        ConvertJob {
            resize: self.resize(),
            format: self.format,
        }
    }
}

/// Converter invocation parameters, independent of any request plumbing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConvertJob {
    pub resize: Option<(u32, u32)>,
    pub format: OutputFormat,
}

/// An external image conversion capability: bytes in, converted bytes out,
/// diagnostics on a side channel.
#[async_trait]
pub trait ImageConverter: Send + Sync {
    async fn convert(&self, input: ByteStream, job: ConvertJob) -> Result<ByteStream, TranscodeError>;
}
