//! Fetch-and-convert pipeline behind `/services/img`.
//!
//! Stages run strictly in order: validate (done by [`TranscodeSpec`]),
//! fetch, convert, stream. A failed fetch never spawns a converter, and the
//! response status is not committed until the converter has produced its
//! first byte, so early converter failures still get a real error status.

use std::sync::Arc;
use std::time::Duration;

use futures_util::{stream, StreamExt};
use tracing::debug;

use crate::archive::{normalize_base, ArchiveError};
use crate::config::{ArchiveConfig, ConverterConfig};

use super::{ByteStream, ImageConverter, MagickConverter, TranscodeError, TranscodeSpec};

pub struct TranscodePipeline {
    http: reqwest::Client,
    converter: Arc<dyn ImageConverter>,
    thumb_base: String,
}

impl TranscodePipeline {
    pub fn new(archive: &ArchiveConfig, converter: &ConverterConfig) -> Result<Self, ArchiveError> {
        Self::with_converter(archive, converter, Arc::new(MagickConverter::new(converter)))
    }

    /// Same pipeline with the converter swapped out, for tests.
    pub fn with_converter(
        archive: &ArchiveConfig,
        converter_config: &ConverterConfig,
        converter: Arc<dyn ImageConverter>,
    ) -> Result<Self, ArchiveError> {
        let http = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(converter_config.fetch_connect_timeout_secs))
            .timeout(Duration::from_secs(converter_config.fetch_timeout_secs))
            .user_agent(concat!("microfiche/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|source| ArchiveError::ClientBuild { source })?;
        Ok(Self {
            http,
            converter,
            thumb_base: normalize_base(&archive.thumb_base)?,
        })
    }

    /// Runs one transcode. On success the returned stream carries converted
    /// image bytes and at least one chunk has already arrived; failures
    /// after that point surface as a terminal stream error, which aborts
    /// the response body instead of ending it cleanly.
    pub async fn run(&self, spec: &TranscodeSpec) -> Result<ByteStream, TranscodeError> {
        let url = format!("{}/{}", self.thumb_base, spec.identifier());
        debug!(identifier = %spec.identifier(), "fetching upstream thumbnail");

        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|source| TranscodeError::UpstreamFetch { source })?;
        let status = response.status();
        if !status.is_success() {
            return Err(TranscodeError::UpstreamStatus { status });
        }

        let input: ByteStream = Box::pin(response.bytes_stream().map(|chunk| {
            chunk.map_err(|err| TranscodeError::UpstreamRead {
                detail: err.to_string(),
            })
        }));

        let output = self.converter.convert(input, spec.job()).await?;
        first_chunk_or_error(output).await
    }
}

/// Waits for the converter's first chunk before handing the stream back.
/// A converter that dies without producing anything fails here, while the
/// caller can still answer with an error status.
async fn first_chunk_or_error(mut output: ByteStream) -> Result<ByteStream, TranscodeError> {
    match output.next().await {
        Some(Ok(first)) => Ok(Box::pin(stream::iter([Ok(first)]).chain(output))),
        Some(Err(err)) => Err(err),
        None => Ok(Box::pin(stream::empty())),
    }
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;
    use futures_util::stream;

    use super::*;

    fn chunk(data: &str) -> Result<Bytes, TranscodeError> {
        Ok(Bytes::from(data.to_string()))
    }

    #[tokio::test]
    async fn test_first_chunk_passes_data_through_in_order() {
        let output: ByteStream = Box::pin(stream::iter(vec![chunk("GIF8"), chunk("9a")]));
        let mut rebuilt = first_chunk_or_error(output).await.unwrap();
        let mut collected = Vec::new();
        while let Some(item) = rebuilt.next().await {
            collected.extend_from_slice(&item.unwrap());
        }
        assert_eq!(collected, b"GIF89a");
    }

    #[tokio::test]
    async fn test_early_failure_surfaces_before_any_byte() {
        let output: ByteStream = Box::pin(stream::iter(vec![Err(TranscodeError::UpstreamRead {
            detail: "connection reset".to_string(),
        })]));
        let err = first_chunk_or_error(output).await.unwrap_err();
        assert!(matches!(err, TranscodeError::UpstreamRead { .. }));
    }

    #[tokio::test]
    async fn test_empty_output_is_not_an_error() {
        let output: ByteStream = Box::pin(stream::empty());
        let mut rebuilt = first_chunk_or_error(output).await.unwrap();
        assert!(rebuilt.next().await.is_none());
    }
}
