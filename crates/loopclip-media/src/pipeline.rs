//! Streaming pipeline orchestrator.
//!
//! One pipeline per request: yt-dlp streams best-available audio to
//! its stdout, a driver task pipes that into ffmpeg, and ffmpeg's
//! encoded output is relayed chunk-by-chunk through a bounded channel
//! that the HTTP layer consumes as a byte stream. The bounded channel
//! plus the OS pipes give end-to-end backpressure: a slow client
//! stalls the transcoder, which stalls the extractor.
//!
//! Terminal transitions (completed, failed, canceled) happen at most
//! once and all run the same teardown: forcefully kill both children
//! and reap them. Dropping the pipeline (client disconnect) closes the
//! relay channel, which the driver observes as cancellation.

use std::pin::Pin;
use std::process::Stdio;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;

use bytes::{Bytes, BytesMut};
use futures_util::Stream;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::process::{Child, ChildStderr, ChildStdin, ChildStdout, Command};
use tokio::sync::{mpsc, watch};
use tracing::{debug, info, warn};

use loopclip_models::ClipRequest;

use crate::error::{MediaError, MediaResult};
use crate::metadata::EXTRACTOR_ARGS;
use crate::tools::ToolPaths;
use crate::transcode::TranscodeCommand;

/// Relay buffer capacity in chunks.
const RELAY_CAPACITY: usize = 16;

/// Read chunk size for transcoder output.
const READ_CHUNK: usize = 64 * 1024;

/// How long to wait for the transcoder's stderr after teardown.
const STDERR_GRACE: Duration = Duration::from_secs(2);

/// Pipeline lifecycle states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PipelineState {
    Spawning,
    Streaming,
    Completed,
    Failed,
    Canceled,
}

/// How the relay read loop ended.
enum ReadEnd {
    Eof,
    Canceled,
    ReadError(std::io::Error),
}

/// Terminal outcome of a pipeline run.
enum Terminal {
    Completed,
    Failed(MediaError),
    Canceled,
}

fn terminal_state(terminal: &Terminal) -> PipelineState {
    match terminal {
        Terminal::Completed => PipelineState::Completed,
        Terminal::Failed(_) => PipelineState::Failed,
        Terminal::Canceled => PipelineState::Canceled,
    }
}

/// Handle that forces pipeline teardown from outside the stream.
#[derive(Clone)]
pub struct PipelineCancel {
    tx: Arc<watch::Sender<bool>>,
}

impl PipelineCancel {
    /// Request forceful termination of both child processes.
    pub fn cancel(&self) {
        let _ = self.tx.send(true);
    }
}

/// A live clip pipeline: readable stream of encoded MP3 bytes.
///
/// Exclusively owns both child processes via its driver task; dropping
/// the pipeline tears them down.
pub struct AudioPipeline {
    rx: mpsc::Receiver<MediaResult<Bytes>>,
    cancel: PipelineCancel,
}

/// Owned stdio ends moved into the driver task.
struct PipelineIo {
    source_out: ChildStdout,
    transcoder_in: ChildStdin,
    transcoder_out: ChildStdout,
    transcoder_err: ChildStderr,
}

impl AudioPipeline {
    /// Spawn both engines and start the driver task.
    pub fn spawn(tools: &ToolPaths, request: &ClipRequest) -> MediaResult<Self> {
        debug!(
            video_id = request.video_id(),
            state = ?PipelineState::Spawning,
            start = request.start_secs(),
            end = request.end_secs(),
            optimize_loop = request.optimize_loop(),
            "Spawning clip pipeline"
        );

        let mut source = Command::new(&tools.ytdlp)
            .args(source_stream_args(request.source_url()))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()?;

        let source_out = match source.stdout.take() {
            Some(out) => out,
            None => {
                let _ = source.start_kill();
                return Err(MediaError::source_stream_unavailable(
                    "extraction process exposed no output stream",
                ));
            }
        };

        let transcode = TranscodeCommand::for_clip(request);
        let mut transcoder = match Command::new(&tools.ffmpeg)
            .args(transcode.build_args())
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
        {
            Ok(child) => child,
            Err(e) => {
                let _ = source.start_kill();
                return Err(e.into());
            }
        };

        let io = match take_io(source_out, &mut transcoder) {
            Ok(io) => io,
            Err(err) => {
                let _ = source.start_kill();
                let _ = transcoder.start_kill();
                return Err(err);
            }
        };

        let (tx, rx) = mpsc::channel(RELAY_CAPACITY);
        let (cancel_tx, cancel_rx) = watch::channel(false);
        let video_id = request.video_id().to_string();

        tokio::spawn(drive(source, transcoder, io, tx, cancel_rx, video_id));

        Ok(Self {
            rx,
            cancel: PipelineCancel {
                tx: Arc::new(cancel_tx),
            },
        })
    }

    /// Cancellation handle, usable independently of the stream.
    pub fn cancel_handle(&self) -> PipelineCancel {
        self.cancel.clone()
    }
}

impl Stream for AudioPipeline {
    type Item = MediaResult<Bytes>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.get_mut().rx.poll_recv(cx)
    }
}

fn take_io(source_out: ChildStdout, transcoder: &mut Child) -> MediaResult<PipelineIo> {
    let transcoder_in = transcoder
        .stdin
        .take()
        .ok_or_else(|| MediaError::internal("transcoder stdin not piped"))?;
    let transcoder_out = transcoder
        .stdout
        .take()
        .ok_or_else(|| MediaError::internal("transcoder stdout not piped"))?;
    let transcoder_err = transcoder
        .stderr
        .take()
        .ok_or_else(|| MediaError::internal("transcoder stderr not piped"))?;
    Ok(PipelineIo {
        source_out,
        transcoder_in,
        transcoder_out,
        transcoder_err,
    })
}

/// yt-dlp stream-mode arguments: best available audio to stdout.
pub fn source_stream_args(url: &str) -> Vec<String> {
    let mut args: Vec<String> = [
        "-f",
        "bestaudio/best",
        "--no-warnings",
        "--no-progress",
        "--no-playlist",
    ]
    .map(String::from)
    .to_vec();
    args.extend(EXTRACTOR_ARGS.map(String::from));
    args.push("-o".to_string());
    args.push("-".to_string());
    args.push(url.to_string());
    args
}

async fn drive(
    mut source: Child,
    mut transcoder: Child,
    io: PipelineIo,
    tx: mpsc::Sender<MediaResult<Bytes>>,
    mut cancel_rx: watch::Receiver<bool>,
    video_id: String,
) {
    debug!(video_id = %video_id, state = ?PipelineState::Streaming, "Pipeline streaming");

    let PipelineIo {
        mut source_out,
        mut transcoder_in,
        mut transcoder_out,
        mut transcoder_err,
    } = io;

    // Feed extracted audio into the transcoder. Closing stdin on copy
    // end lets ffmpeg flush its encoder; a transcoder exit surfaces
    // here as a write error that simply ends the copy.
    let feed = tokio::spawn(async move {
        let _ = tokio::io::copy(&mut source_out, &mut transcoder_in).await;
        let _ = transcoder_in.shutdown().await;
    });

    let stderr_task = tokio::spawn(async move {
        let mut buf = String::new();
        let _ = transcoder_err.read_to_string(&mut buf).await;
        buf
    });

    let mut chunk = BytesMut::with_capacity(READ_CHUNK);
    let end = loop {
        chunk.reserve(READ_CHUNK);
        tokio::select! {
            // Fires on an explicit cancel and when the handle side is
            // dropped entirely.
            _ = cancel_rx.changed() => break ReadEnd::Canceled,
            read = transcoder_out.read_buf(&mut chunk) => match read {
                Ok(0) => break ReadEnd::Eof,
                Ok(_) => {
                    if tx.send(Ok(chunk.split().freeze())).await.is_err() {
                        // Receiver dropped: client went away mid-stream.
                        break ReadEnd::Canceled;
                    }
                }
                Err(e) => break ReadEnd::ReadError(e),
            },
        }
    };

    // Resolve the exit status before teardown when the stream drained
    // naturally, so a clean EOF is not misread as a kill.
    let status = match &end {
        ReadEnd::Eof => Some(transcoder.wait().await),
        _ => None,
    };

    // Exactly-once teardown on the terminal transition.
    teardown(&mut source, &mut transcoder).await;
    feed.abort();

    let stderr = match tokio::time::timeout(STDERR_GRACE, stderr_task).await {
        Ok(Ok(s)) if !s.trim().is_empty() => Some(s.trim().to_string()),
        _ => None,
    };

    let terminal = match end {
        ReadEnd::Canceled => Terminal::Canceled,
        ReadEnd::ReadError(e) => Terminal::Failed(MediaError::Io(e)),
        ReadEnd::Eof => match status {
            Some(Ok(st)) if st.success() => Terminal::Completed,
            Some(Ok(st)) => Terminal::Failed(MediaError::transcode_failed(
                "transcoder exited with non-zero status",
                stderr.clone(),
                st.code(),
            )),
            Some(Err(e)) => Terminal::Failed(e.into()),
            None => Terminal::Failed(MediaError::internal("missing transcoder exit status")),
        },
    };

    let state = terminal_state(&terminal);
    match terminal {
        Terminal::Completed => info!(video_id = %video_id, state = ?state, "Pipeline completed"),
        Terminal::Canceled => {
            info!(video_id = %video_id, state = ?state, "Pipeline canceled, processes torn down")
        }
        Terminal::Failed(err) => {
            warn!(video_id = %video_id, state = ?state, error = %err, stderr = ?stderr, "Pipeline failed");
            // Surface the failure exactly once; ignored if the client
            // is already gone.
            let _ = tx.send(Err(err)).await;
        }
    }
}

/// Forcefully terminate and reap both children. Partial output is
/// worthless to the client, so there is no graceful path.
async fn teardown(source: &mut Child, transcoder: &mut Child) {
    let _ = source.start_kill();
    let _ = transcoder.start_kill();
    let _ = source.wait().await;
    let _ = transcoder.wait().await;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stream_args_request_piped_audio() {
        let args = source_stream_args("https://youtube.com/watch?v=dQw4w9WgXcQ");
        let joined = args.join(" ");
        assert!(joined.contains("-f bestaudio/best"));
        assert!(joined.contains("-o -"));
        assert!(joined.contains("youtube:player_client=android"));
        assert_eq!(args.last().map(String::as_str), Some("https://youtube.com/watch?v=dQw4w9WgXcQ"));
    }

    #[test]
    fn terminal_states_map_one_to_one() {
        assert_eq!(terminal_state(&Terminal::Completed), PipelineState::Completed);
        assert_eq!(terminal_state(&Terminal::Canceled), PipelineState::Canceled);
        assert_eq!(
            terminal_state(&Terminal::Failed(MediaError::internal("x"))),
            PipelineState::Failed
        );
    }

    #[tokio::test]
    async fn cancel_handle_closes_the_relay() {
        // Wire a driver-shaped channel pair directly: a canceled
        // pipeline must stop yielding without an error item.
        let (tx, rx) = mpsc::channel::<MediaResult<Bytes>>(4);
        let (cancel_tx, mut cancel_rx) = watch::channel(false);
        let cancel = PipelineCancel {
            tx: Arc::new(cancel_tx),
        };

        let driver = tokio::spawn(async move {
            tokio::select! {
                _ = cancel_rx.changed() => ReadEnd::Canceled,
                _ = tx.closed() => ReadEnd::Eof,
            }
        });

        cancel.cancel();
        assert!(matches!(driver.await.unwrap(), ReadEnd::Canceled));
        drop(rx);
    }
}
