//! Source metadata resolution via yt-dlp.

use std::process::Stdio;
use std::time::Duration;

use serde::Deserialize;
use tokio::process::Command;
use tracing::{debug, warn};

use crate::error::{MediaError, MediaResult};
use crate::tools::ToolPaths;

/// Extraction reliability hint passed to every yt-dlp invocation.
/// The android player client dodges some of YouTube's web-client bot
/// checks; correctness does not depend on it.
pub(crate) const EXTRACTOR_ARGS: [&str; 2] = ["--extractor-args", "youtube:player_client=android"];

/// Metadata reported by the extraction engine.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceMetadata {
    /// Source title, if reported.
    pub title: Option<String>,
    /// Duration in seconds; `None` when unreported or zero.
    pub duration_secs: Option<f64>,
}

/// Timeout/retry policy for metadata resolution.
#[derive(Debug, Clone)]
pub struct MetadataOptions {
    pub timeout: Duration,
    /// Additional attempts after the first failure.
    pub retries: u32,
}

impl Default for MetadataOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            retries: 1,
        }
    }
}

const RETRY_BACKOFF: Duration = Duration::from_millis(500);

#[derive(Debug, Deserialize)]
struct YtDlpInfo {
    title: Option<String>,
    duration: Option<f64>,
}

/// Resolve title and duration for a source URL without downloading
/// any media. Retries transient failures per `options`.
pub async fn resolve_metadata(
    tools: &ToolPaths,
    options: &MetadataOptions,
    url: &str,
) -> MediaResult<SourceMetadata> {
    let mut attempt = 0;
    loop {
        match fetch_metadata(tools, options.timeout, url).await {
            Ok(metadata) => return Ok(metadata),
            Err(err) if attempt < options.retries => {
                warn!(url, attempt, %err, "Metadata fetch failed, retrying");
                attempt += 1;
                tokio::time::sleep(RETRY_BACKOFF).await;
            }
            Err(err) => return Err(err),
        }
    }
}

async fn fetch_metadata(
    tools: &ToolPaths,
    timeout: Duration,
    url: &str,
) -> MediaResult<SourceMetadata> {
    debug!(url, "Fetching source metadata");

    let output = Command::new(&tools.ytdlp)
        .args([
            "--dump-single-json",
            "--skip-download",
            "--no-warnings",
            "--no-progress",
            "--no-playlist",
        ])
        .args(EXTRACTOR_ARGS)
        .arg(url)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .output();

    let output = tokio::time::timeout(timeout, output)
        .await
        .map_err(|_| {
            MediaError::source_unavailable(format!(
                "metadata fetch timed out after {}s",
                timeout.as_secs()
            ))
        })?
        .map_err(MediaError::Io)?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        let last_line = stderr.lines().last().unwrap_or("unknown error");
        return Err(MediaError::source_unavailable(format!(
            "extraction engine failed: {last_line}"
        )));
    }

    parse_metadata(&output.stdout)
}

/// Parse yt-dlp's JSON info dump. Anything that is not a JSON object
/// with the expected shape counts as an unavailable source.
fn parse_metadata(stdout: &[u8]) -> MediaResult<SourceMetadata> {
    let info: YtDlpInfo = serde_json::from_slice(stdout)
        .map_err(|e| MediaError::source_unavailable(format!("unparsable metadata response: {e}")))?;

    Ok(SourceMetadata {
        title: info.title.filter(|t| !t.trim().is_empty()),
        duration_secs: info.duration.filter(|d| *d > 0.0),
    })
}

/// Re-validate a requested end offset against resolved duration.
/// Skipped when the source reports no usable duration.
pub fn check_range_against_duration(
    end_secs: f64,
    metadata: &SourceMetadata,
) -> MediaResult<()> {
    if let Some(duration) = metadata.duration_secs {
        if end_secs > duration {
            return Err(MediaError::TimeRangeExceedsSourceDuration {
                end_secs,
                duration_secs: duration,
            });
        }
    }
    Ok(())
}
