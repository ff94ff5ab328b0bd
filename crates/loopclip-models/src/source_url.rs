//! Source URL validation.
//!
//! URLs are untrusted input: only YouTube-family domains are accepted
//! and video ids are strictly validated (11 chars, alphanumeric plus
//! `-_`) before anything is handed to an external process.

use url::Url;

/// Errors that can occur while validating a source URL.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SourceUrlError {
    #[error("not a valid URL")]
    NotAUrl,
    #[error("host is not a supported video source")]
    UnsupportedHost,
    #[error("no video identifier found in URL")]
    VideoIdNotFound,
    #[error("video identifier has invalid format")]
    InvalidVideoId,
}

/// Hosts treated as the youtube.com family (require an explicit video id).
const YOUTUBE_HOSTS: &[&str] = &[
    "youtube.com",
    "www.youtube.com",
    "m.youtube.com",
    "music.youtube.com",
];

/// Validate a source URL and extract its video id.
///
/// - `youtu.be/<id>` carries the id in the path; no query needed.
/// - `youtube.com`-family hosts need a `v` query parameter or one of
///   the `/shorts/`, `/embed/`, `/v/`, `/live/` path forms.
pub fn validate_source_url(raw: &str) -> Result<String, SourceUrlError> {
    let url = Url::parse(raw.trim()).map_err(|_| SourceUrlError::NotAUrl)?;

    let host = url
        .host_str()
        .map(|h| h.to_ascii_lowercase())
        .ok_or(SourceUrlError::NotAUrl)?;

    if host == "youtu.be" {
        let id = url
            .path_segments()
            .and_then(|mut segments| segments.find(|s| !s.is_empty()))
            .map(str::to_string)
            .ok_or(SourceUrlError::VideoIdNotFound)?;
        return validate_video_id(id);
    }

    if !YOUTUBE_HOSTS.contains(&host.as_str()) {
        return Err(SourceUrlError::UnsupportedHost);
    }

    if let Some((_, id)) = url.query_pairs().find(|(k, _)| k == "v") {
        return validate_video_id(id.into_owned());
    }

    // Path-embedded ids: /shorts/<id>, /embed/<id>, /v/<id>, /live/<id>
    let mut segments = url.path_segments().ok_or(SourceUrlError::VideoIdNotFound)?;
    if let Some(first) = segments.next() {
        if matches!(first, "shorts" | "embed" | "v" | "live") {
            if let Some(id) = segments.next().filter(|s| !s.is_empty()) {
                return validate_video_id(id.to_string());
            }
        }
    }

    Err(SourceUrlError::VideoIdNotFound)
}

/// YouTube video ids are exactly 11 characters of `[A-Za-z0-9_-]`.
fn validate_video_id(id: String) -> Result<String, SourceUrlError> {
    if id.len() != 11 {
        return Err(SourceUrlError::InvalidVideoId);
    }
    if !id
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(SourceUrlError::InvalidVideoId);
    }
    Ok(id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_watch_urls() {
        assert_eq!(
            validate_source_url("https://youtube.com/watch?v=dQw4w9WgXcQ").unwrap(),
            "dQw4w9WgXcQ"
        );
        assert_eq!(
            validate_source_url("https://www.youtube.com/watch?v=dQw4w9WgXcQ&list=xyz").unwrap(),
            "dQw4w9WgXcQ"
        );
        assert_eq!(
            validate_source_url("https://music.youtube.com/watch?v=dQw4w9WgXcQ").unwrap(),
            "dQw4w9WgXcQ"
        );
    }

    #[test]
    fn accepts_short_urls_without_query() {
        assert_eq!(
            validate_source_url("https://youtu.be/dQw4w9WgXcQ").unwrap(),
            "dQw4w9WgXcQ"
        );
        assert_eq!(
            validate_source_url("https://youtu.be/dQw4w9WgXcQ?t=42").unwrap(),
            "dQw4w9WgXcQ"
        );
    }

    #[test]
    fn accepts_path_embedded_ids() {
        assert_eq!(
            validate_source_url("https://youtube.com/shorts/dQw4w9WgXcQ").unwrap(),
            "dQw4w9WgXcQ"
        );
        assert_eq!(
            validate_source_url("https://www.youtube.com/embed/dQw4w9WgXcQ").unwrap(),
            "dQw4w9WgXcQ"
        );
    }

    #[test]
    fn rejects_unsupported_hosts() {
        assert_eq!(
            validate_source_url("https://example.com/watch?v=dQw4w9WgXcQ"),
            Err(SourceUrlError::UnsupportedHost)
        );
        assert_eq!(
            validate_source_url("https://vimeo.com/12345"),
            Err(SourceUrlError::UnsupportedHost)
        );
    }

    #[test]
    fn rejects_missing_or_malformed_ids() {
        assert_eq!(
            validate_source_url("https://youtube.com/watch"),
            Err(SourceUrlError::VideoIdNotFound)
        );
        assert_eq!(
            validate_source_url("https://youtu.be/"),
            Err(SourceUrlError::VideoIdNotFound)
        );
        assert_eq!(
            validate_source_url("https://youtube.com/watch?v=short"),
            Err(SourceUrlError::InvalidVideoId)
        );
        assert_eq!(
            validate_source_url("https://youtube.com/watch?v=bad!chars!!"),
            Err(SourceUrlError::InvalidVideoId)
        );
        assert_eq!(validate_source_url("not a url"), Err(SourceUrlError::NotAUrl));
    }
}
