//! Clip request parsing and validation.

use serde::{Deserialize, Serialize};

use crate::source_url::{validate_source_url, SourceUrlError};

/// Minimum segment length when loop optimization is requested; the
/// crossfade needs headroom on both ends.
pub const MIN_LOOP_DURATION_SECS: f64 = 1.0;

/// Raw request body for `POST /api/download`.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DownloadRequest {
    pub url: String,
    pub start_time: f64,
    pub end_time: f64,
    #[serde(default)]
    pub optimize_loop: bool,
}

/// Validation failures for a [`DownloadRequest`].
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("invalid URL: {0}")]
    InvalidUrl(#[from] SourceUrlError),

    #[error("invalid time range: {0}")]
    InvalidTimeRange(String),

    #[error(
        "loop optimization requires a clip of at least {MIN_LOOP_DURATION_SECS} second(s)"
    )]
    LoopDurationTooShort,
}

/// A validated, immutable clip job description.
#[derive(Debug, Clone, PartialEq)]
pub struct ClipRequest {
    source_url: String,
    video_id: String,
    start_secs: f64,
    end_secs: f64,
    optimize_loop: bool,
}

impl ClipRequest {
    /// Validate a raw request into a `ClipRequest`.
    ///
    /// Time-range and loop checks run before URL validation so that a
    /// bad range is reported even for a dubious URL; everything here
    /// is pure and happens before any process is spawned.
    pub fn validate(raw: &DownloadRequest) -> Result<Self, ValidationError> {
        let start = raw.start_time;
        let end = raw.end_time;

        if !start.is_finite() || !end.is_finite() {
            return Err(ValidationError::InvalidTimeRange(
                "start and end times must be finite numbers".to_string(),
            ));
        }
        if start < 0.0 {
            return Err(ValidationError::InvalidTimeRange(format!(
                "start time must be non-negative (got {start})"
            )));
        }
        if end <= start {
            return Err(ValidationError::InvalidTimeRange(format!(
                "end time ({end}) must be greater than start time ({start})"
            )));
        }
        if raw.optimize_loop && end - start < MIN_LOOP_DURATION_SECS {
            return Err(ValidationError::LoopDurationTooShort);
        }

        let video_id = validate_source_url(&raw.url)?;

        Ok(Self {
            source_url: raw.url.trim().to_string(),
            video_id,
            start_secs: start,
            end_secs: end,
            optimize_loop: raw.optimize_loop,
        })
    }

    pub fn source_url(&self) -> &str {
        &self.source_url
    }

    pub fn video_id(&self) -> &str {
        &self.video_id
    }

    pub fn start_secs(&self) -> f64 {
        self.start_secs
    }

    pub fn end_secs(&self) -> f64 {
        self.end_secs
    }

    pub fn optimize_loop(&self) -> bool {
        self.optimize_loop
    }

    /// Segment length in seconds.
    pub fn duration(&self) -> f64 {
        self.end_secs - self.start_secs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(url: &str, start: f64, end: f64, optimize_loop: bool) -> DownloadRequest {
        DownloadRequest {
            url: url.to_string(),
            start_time: start,
            end_time: end,
            optimize_loop,
        }
    }

    const OK_URL: &str = "https://youtube.com/watch?v=dQw4w9WgXcQ";

    #[test]
    fn accepts_well_formed_requests() {
        let req = ClipRequest::validate(&raw(OK_URL, 10.0, 40.0, false)).unwrap();
        assert_eq!(req.video_id(), "dQw4w9WgXcQ");
        assert!((req.duration() - 30.0).abs() < f64::EPSILON);
        assert!(!req.optimize_loop());
    }

    #[test]
    fn rejects_bad_time_ranges() {
        assert!(matches!(
            ClipRequest::validate(&raw(OK_URL, -1.0, 10.0, false)),
            Err(ValidationError::InvalidTimeRange(_))
        ));
        assert!(matches!(
            ClipRequest::validate(&raw(OK_URL, 10.0, 10.0, false)),
            Err(ValidationError::InvalidTimeRange(_))
        ));
        assert!(matches!(
            ClipRequest::validate(&raw(OK_URL, 40.0, 10.0, false)),
            Err(ValidationError::InvalidTimeRange(_))
        ));
        assert!(matches!(
            ClipRequest::validate(&raw(OK_URL, f64::NAN, 10.0, false)),
            Err(ValidationError::InvalidTimeRange(_))
        ));
    }

    #[test]
    fn loop_needs_one_second_of_headroom() {
        assert_eq!(
            ClipRequest::validate(&raw(OK_URL, 5.0, 5.5, true)),
            Err(ValidationError::LoopDurationTooShort)
        );
        assert!(ClipRequest::validate(&raw(OK_URL, 5.0, 6.0, true)).is_ok());
    }

    #[test]
    fn range_checks_run_before_url_validation() {
        // A bad range on a bad URL still reports the range problem.
        assert!(matches!(
            ClipRequest::validate(&raw("definitely-not-a-url", 10.0, 5.0, false)),
            Err(ValidationError::InvalidTimeRange(_))
        ));
        assert_eq!(
            ClipRequest::validate(&raw("definitely-not-a-url", 5.0, 5.2, true)),
            Err(ValidationError::LoopDurationTooShort)
        );
    }

    #[test]
    fn rejects_unsupported_urls() {
        assert!(matches!(
            ClipRequest::validate(&raw("https://example.com/v?v=dQw4w9WgXcQ", 0.0, 10.0, false)),
            Err(ValidationError::InvalidUrl(_))
        ));
    }

    #[test]
    fn download_request_defaults_optimize_loop() {
        let parsed: DownloadRequest =
            serde_json::from_str(r#"{"url":"https://youtu.be/dQw4w9WgXcQ","startTime":1,"endTime":2}"#)
                .unwrap();
        assert!(!parsed.optimize_loop);
    }
}
