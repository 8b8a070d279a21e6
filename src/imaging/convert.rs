//! ImageMagick-style subprocess driver.
//!
//! One `convert` run per request: input is piped to stdin, converted bytes
//! are read from stdout, stderr is drained into the log. A reaper task owns
//! the child and enforces the wall-clock timeout; dropping the output stream
//! (client disconnect) signals the reaper to kill the child, which in turn
//! unblocks the feeder and releases the upstream fetch.

use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use futures_util::{stream, StreamExt};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::Command;
use tokio::sync::oneshot;
use tokio_util::io::ReaderStream;
use tracing::{debug, warn};

use crate::config::ConverterConfig;

use super::{ByteStream, ConvertJob, ImageConverter, TranscodeError};

/// Stdout read granularity. Pipe capacity bounds memory either way; this
/// just keeps per-chunk overhead low.
const READ_CAPACITY: usize = 64 * 1024;

pub struct MagickConverter {
    program: String,
    timeout: Duration,
}

impl MagickConverter {
    pub fn new(config: &ConverterConfig) -> Self {
        Self {
            program: config.program.clone(),
            timeout: Duration::from_secs(config.convert_timeout_secs),
        }
    }
}

/// Argument list for one conversion: read stdin, optionally resize, write
/// the requested format to stdout. The resize pair comes pre-validated;
/// it is present only when both dimensions are positive.
fn convert_args(job: &ConvertJob) -> Vec<String> {
    let mut args = vec!["-".to_string()];
    if let Some((w, h)) = job.resize {
        args.push("-resize".to_string());
        args.push(format!("{w}x{h}"));
    }
    args.push(job.format.convert_target().to_string());
    args
}

#[async_trait]
impl ImageConverter for MagickConverter {
    async fn convert(
        &self,
        input: ByteStream,
        job: ConvertJob,
    ) -> Result<ByteStream, TranscodeError> {
        let args = convert_args(&job);
        debug!(program = %self.program, ?args, "spawning converter");

        let mut child = Command::new(&self.program)
            .args(&args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| TranscodeError::ConverterSpawn {
                program: self.program.clone(),
                source,
            })?;

        let io_missing = |what: &str| TranscodeError::ConverterIo {
            source: std::io::Error::other(format!("converter {what} not piped")),
        };
        let mut stdin = child.stdin.take().ok_or_else(|| io_missing("stdin"))?;
        let stdout = child.stdout.take().ok_or_else(|| io_missing("stdout"))?;
        let stderr = child.stderr.take().ok_or_else(|| io_missing("stderr"))?;

        // Feeder: copy upstream chunks into the converter. A write error
        // means the child is gone; an upstream error means partial input.
        // Either way stdin is dropped, the converter sees EOF and decides
        // for itself whether what it got was a complete image.
        tokio::spawn(async move {
            let mut input = input;
            while let Some(chunk) = input.next().await {
                match chunk {
                    Ok(bytes) => {
                        if let Err(err) = stdin.write_all(&bytes).await {
                            debug!(%err, "converter stdin closed early");
                            return;
                        }
                    }
                    Err(err) => {
                        warn!(%err, "upstream stream failed mid-transfer");
                        return;
                    }
                }
            }
            if let Err(err) = stdin.shutdown().await {
                debug!(%err, "converter stdin shutdown failed");
            }
        });

        // Drain stderr so the child never blocks on a full pipe; its
        // diagnostics land in the log instead.
        tokio::spawn(async move {
            let mut lines = BufReader::new(stderr).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                warn!(line = %line, "converter stderr");
            }
        });

        let (kill_tx, kill_rx) = oneshot::channel::<()>();
        let (done_tx, done_rx) = oneshot::channel::<Result<(), TranscodeError>>();
        let timeout = self.timeout;

        // Reaper: owns the child. Exactly one of three things happens:
        // the child exits on its own, the wall clock runs out, or the
        // output stream is dropped and the kill channel closes.
        tokio::spawn(async move {
            let outcome = tokio::select! {
                status = child.wait() => match status {
                    Ok(status) if status.success() => Ok(()),
                    Ok(status) => Err(TranscodeError::ConverterExit { status }),
                    Err(source) => Err(TranscodeError::ConverterIo { source }),
                },
                _ = tokio::time::sleep(timeout) => {
                    let _ = child.start_kill();
                    let _ = child.wait().await;
                    Err(TranscodeError::ConverterTimeout { secs: timeout.as_secs() })
                }
                _ = kill_rx => {
                    let _ = child.start_kill();
                    let _ = child.wait().await;
                    debug!("converter killed, client went away");
                    return;
                }
            };
            match &outcome {
                Ok(()) => debug!("converter finished"),
                Err(err) => warn!(%err, "converter failed"),
            }
            let _ = done_tx.send(outcome);
        });

        let data = ReaderStream::with_capacity(stdout, READ_CAPACITY)
            .map(|chunk| chunk.map_err(|source| TranscodeError::ConverterIo { source }));

        // Runs after stdout EOF. Holding kill_tx here keeps the kill channel
        // open for the reaper until the stream is either finished or dropped;
        // a nonzero exit surfaces as a terminal stream error so the response
        // aborts instead of ending as if complete.
        let tail = stream::once(async move {
            let _kill_tx = kill_tx;
            match done_rx.await {
                Ok(Ok(())) => None,
                Ok(Err(err)) => Some(Err(err)),
                Err(_) => None,
            }
        })
        .filter_map(std::future::ready);

        Ok(Box::pin(data.chain(tail)))
    }
}
