//! The image transcoding endpoint.

use axum::body::Body;
use axum::extract::{Path, Query, State};
use axum::http::{header, Uri};
use axum::response::{IntoResponse, Response};
use bytes::Bytes;
use futures_util::{stream, StreamExt};
use serde::Deserialize;
use tracing::{debug, error};

use crate::imaging::{OutputFormat, TranscodeError, TranscodeSpec};
use crate::metrics::{self, Timer};

use super::AppState;

#[derive(Debug, Deserialize)]
pub struct TranscodeParams {
    w: Option<String>,
    h: Option<String>,
    f: Option<String>,
}

/// `GET /services/img/{identifier}?w=&h=&f=`
///
/// Validation failures answer 400 before anything is fetched or spawned;
/// upstream failures answer 502 before the converter starts; converter
/// failures after the first byte terminate the stream mid-body, since the
/// status line is already gone.
pub async fn transcode(
    State(state): State<AppState>,
    Path(identifier): Path<String>,
    Query(params): Query<TranscodeParams>,
    uri: Uri,
) -> Response {
    let width = dimension(params.w.as_deref());
    let height = dimension(params.h.as_deref());
    let format = match OutputFormat::parse(params.f.as_deref()) {
        Ok(format) => format,
        Err(err) => return client_error(&uri, err),
    };
    let spec = match TranscodeSpec::new(&identifier, width, height, format) {
        Ok(spec) => spec,
        Err(err) => return client_error(&uri, err),
    };

    metrics::global().transcodes_started.inc();
    let timer = Timer::start(&metrics::global().transcode_duration);

    match state.pipeline.run(&spec).await {
        Ok(output) => {
            timer.stop();
            let body = output
                .inspect(|chunk| {
                    if let Err(err) = chunk {
                        error!(%err, "transcode stream aborted");
                        metrics::global().transcodes_failed.inc();
                    }
                })
                .chain(
                    stream::once(async {
                        metrics::global().transcodes_completed.inc();
                        None::<Result<Bytes, TranscodeError>>
                    })
                    .filter_map(std::future::ready),
                );
            (
                [(header::CONTENT_TYPE, format.content_type())],
                Body::from_stream(body),
            )
                .into_response()
        }
        Err(err) => {
            metrics::global().transcodes_failed.inc();
            error!(path = %uri, %err, "transcode failed");
            (err.status_code(), "image conversion failed\n").into_response()
        }
    }
}

fn client_error(uri: &Uri, err: TranscodeError) -> Response {
    debug!(path = %uri, %err, "rejected transcode request");
    (err.status_code(), format!("{err}\n")).into_response()
}

/// `w`/`h` default to 0 (unconstrained) when absent or non-numeric.
fn dimension(raw: Option<&str>) -> u32 {
    raw.and_then(|v| v.trim().parse().ok()).unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dimension_defaults_to_zero() {
        assert_eq!(dimension(None), 0);
        assert_eq!(dimension(Some("")), 0);
        assert_eq!(dimension(Some("abc")), 0);
        assert_eq!(dimension(Some("-5")), 0);
        assert_eq!(dimension(Some("12.5")), 0);
        assert_eq!(dimension(Some("50")), 50);
        assert_eq!(dimension(Some(" 50 ")), 50);
    }
}
