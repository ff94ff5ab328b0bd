//! External engine binary resolution.
//!
//! Paths are resolved once at startup and passed into the orchestrator
//! rather than consulted as ambient state.

use std::path::PathBuf;

use tracing::info;

use crate::error::{MediaError, MediaResult};

#[cfg(windows)]
const DEFAULT_YTDLP: &str = "yt-dlp.exe";
#[cfg(not(windows))]
const DEFAULT_YTDLP: &str = "yt-dlp";

#[cfg(windows)]
const DEFAULT_FFMPEG: &str = "ffmpeg.exe";
#[cfg(not(windows))]
const DEFAULT_FFMPEG: &str = "ffmpeg";

/// Resolved locations of the two external engines.
#[derive(Debug, Clone)]
pub struct ToolPaths {
    pub ytdlp: PathBuf,
    pub ffmpeg: PathBuf,
}

impl ToolPaths {
    /// Resolve engine paths from `YTDLP_PATH` / `FFMPEG_PATH`, falling
    /// back to a PATH lookup of the platform binary name.
    pub fn from_env() -> MediaResult<Self> {
        let ytdlp = resolve("YTDLP_PATH", DEFAULT_YTDLP).ok_or(MediaError::YtDlpNotFound)?;
        let ffmpeg = resolve("FFMPEG_PATH", DEFAULT_FFMPEG).ok_or(MediaError::FfmpegNotFound)?;

        info!(ytdlp = %ytdlp.display(), ffmpeg = %ffmpeg.display(), "Resolved engine binaries");
        Ok(Self { ytdlp, ffmpeg })
    }

    /// Check the extraction engine still resolves (readiness probe).
    pub fn check_ytdlp(&self) -> MediaResult<()> {
        if !self.ytdlp.exists() && which::which(&self.ytdlp).is_err() {
            return Err(MediaError::YtDlpNotFound);
        }
        Ok(())
    }

    /// Check the transcoding engine still resolves (readiness probe).
    pub fn check_ffmpeg(&self) -> MediaResult<()> {
        if !self.ffmpeg.exists() && which::which(&self.ffmpeg).is_err() {
            return Err(MediaError::FfmpegNotFound);
        }
        Ok(())
    }
}

fn resolve(env_var: &str, default_name: &str) -> Option<PathBuf> {
    if let Ok(overridden) = std::env::var(env_var) {
        let path = PathBuf::from(overridden);
        if path.exists() {
            return Some(path);
        }
        // An explicit override that does not exist is a config error,
        // not something to silently paper over with a PATH lookup.
        return None;
    }
    which::which(default_name).ok()
}
