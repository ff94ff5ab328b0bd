//! Error types for the external-process layer.

use thiserror::Error;

/// Result type for media operations.
pub type MediaResult<T> = Result<T, MediaError>;

/// Errors that can occur while resolving metadata or running the
/// extraction/transcoding pipeline.
#[derive(Debug, Error)]
pub enum MediaError {
    #[error("yt-dlp not found (set YTDLP_PATH or install it on PATH)")]
    YtDlpNotFound,

    #[error("ffmpeg not found (set FFMPEG_PATH or install it on PATH)")]
    FfmpegNotFound,

    #[error("source unavailable: {message}")]
    SourceUnavailable { message: String },

    #[error("requested range exceeds source duration: end {end_secs}s > duration {duration_secs}s")]
    TimeRangeExceedsSourceDuration { end_secs: f64, duration_secs: f64 },

    #[error("source stream unavailable: {message}")]
    SourceStreamUnavailable { message: String },

    #[error("transcoding failed: {message}")]
    TranscodeFailed {
        message: String,
        stderr: Option<String>,
        exit_code: Option<i32>,
    },

    #[error("operation cancelled")]
    Cancelled,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

impl MediaError {
    /// Create a source-unavailable error.
    pub fn source_unavailable(message: impl Into<String>) -> Self {
        Self::SourceUnavailable {
            message: message.into(),
        }
    }

    /// Create a source-stream-unavailable error.
    pub fn source_stream_unavailable(message: impl Into<String>) -> Self {
        Self::SourceStreamUnavailable {
            message: message.into(),
        }
    }

    /// Create a transcode failure error.
    pub fn transcode_failed(
        message: impl Into<String>,
        stderr: Option<String>,
        exit_code: Option<i32>,
    ) -> Self {
        Self::TranscodeFailed {
            message: message.into(),
            stderr,
            exit_code,
        }
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }
}
