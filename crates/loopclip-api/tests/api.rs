//! Router-level API tests.
//!
//! Validation-path tests run against dummy engine paths (they must
//! fail before any spawn); streaming-path tests use stand-in engine
//! scripts.

use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use axum::Router;
use tower::ServiceExt;

use loopclip_api::{create_router, ApiConfig, AppState};
use loopclip_media::ToolPaths;

fn dummy_tools() -> ToolPaths {
    ToolPaths {
        ytdlp: "/nonexistent/yt-dlp".into(),
        ffmpeg: "/nonexistent/ffmpeg".into(),
    }
}

fn app_with(tools: ToolPaths) -> Router {
    let config = ApiConfig {
        metadata_retries: 0,
        ..ApiConfig::default()
    };
    create_router(AppState::new(config, tools))
}

fn post_download(body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/api/download")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn error_message(response: axum::response::Response) -> String {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    json["error"].as_str().unwrap_or_default().to_string()
}

const OK_URL: &str = "https://youtube.com/watch?v=dQw4w9WgXcQ";

#[tokio::test]
async fn malformed_body_is_400_not_500() {
    let response = app_with(dummy_tools())
        .oneshot(post_download("{not valid json"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(error_message(response).await.contains("body"));
}

#[tokio::test]
async fn end_not_after_start_is_400() {
    for (start, end) in [(10.0, 10.0), (40.0, 10.0)] {
        let body = format!(r#"{{"url":"{OK_URL}","startTime":{start},"endTime":{end}}}"#);
        let response = app_with(dummy_tools())
            .oneshot(post_download(&body))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(error_message(response).await.contains("time range"));
    }
}

#[tokio::test]
async fn negative_start_is_400() {
    let body = format!(r#"{{"url":"{OK_URL}","startTime":-5,"endTime":10}}"#);
    let response = app_with(dummy_tools())
        .oneshot(post_download(&body))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn short_loop_is_400_even_with_dubious_url() {
    let body = r#"{"url":"not even a url","startTime":5,"endTime":5.5,"optimizeLoop":true}"#;
    let response = app_with(dummy_tools())
        .oneshot(post_download(body))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(error_message(response).await.contains("loop"));
}

#[tokio::test]
async fn unsupported_host_is_400() {
    let body = r#"{"url":"https://example.com/watch?v=dQw4w9WgXcQ","startTime":0,"endTime":10}"#;
    let response = app_with(dummy_tools())
        .oneshot(post_download(body))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn youtube_watch_without_id_is_400() {
    let body = r#"{"url":"https://youtube.com/watch","startTime":0,"endTime":10}"#;
    let response = app_with(dummy_tools())
        .oneshot(post_download(body))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[cfg(unix)]
mod with_fake_engines {
    use super::*;

    use std::os::unix::fs::PermissionsExt;
    use std::path::{Path, PathBuf};

    fn write_script(dir: &Path, name: &str, contents: &str) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, contents).unwrap();
        let mut perms = std::fs::metadata(&path).unwrap().permissions();
        perms.set_mode(0o755);
        std::fs::set_permissions(&path, perms).unwrap();
        path
    }

    /// Stand-in yt-dlp: JSON metadata in dump mode, raw bytes otherwise.
    fn fake_tools(dir: &Path) -> ToolPaths {
        let ytdlp = write_script(
            dir,
            "fake-ytdlp",
            concat!(
                "#!/bin/sh\n",
                "for arg in \"$@\"; do\n",
                "  if [ \"$arg\" = \"--dump-single-json\" ]; then\n",
                "    printf '%s' '{\"title\":\"My <Test> Song\",\"duration\":300}'\n",
                "    exit 0\n",
                "  fi\n",
                "done\n",
                "printf 'RAWSOURCEAUDIO'\n",
            ),
        );
        let ffmpeg = write_script(
            dir,
            "fake-ffmpeg",
            "#!/bin/sh\ncat >/dev/null\nprintf 'FAKEMP3OUTPUT'\n",
        );
        ToolPaths { ytdlp, ffmpeg }
    }

    #[tokio::test]
    async fn metadata_failure_is_404() {
        let dir = tempfile::tempdir().unwrap();
        let ytdlp = write_script(dir.path(), "fake-ytdlp", "#!/bin/sh\nexit 1\n");
        let ffmpeg = write_script(dir.path(), "fake-ffmpeg", "#!/bin/sh\nexec cat\n");
        let body = format!(r#"{{"url":"{OK_URL}","startTime":0,"endTime":10}}"#);

        let response = app_with(ToolPaths { ytdlp, ffmpeg })
            .oneshot(post_download(&body))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn range_beyond_duration_is_400_with_both_values() {
        let dir = tempfile::tempdir().unwrap();
        let body = format!(r#"{{"url":"{OK_URL}","startTime":330,"endTime":335}}"#);

        let response = app_with(fake_tools(dir.path()))
            .oneshot(post_download(&body))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let message = error_message(response).await;
        assert!(message.contains("335"));
        assert!(message.contains("300"));
    }

    #[tokio::test]
    async fn successful_request_streams_mp3_with_attachment_headers() {
        let dir = tempfile::tempdir().unwrap();
        let body = format!(r#"{{"url":"{OK_URL}","startTime":10,"endTime":40}}"#);

        let response = app_with(fake_tools(dir.path()))
            .oneshot(post_download(&body))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get(header::CONTENT_TYPE).unwrap(),
            "audio/mpeg"
        );
        assert_eq!(
            response.headers().get(header::CONTENT_DISPOSITION).unwrap(),
            "attachment; filename=\"My_Test_Song_10-40.mp3\""
        );

        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&bytes[..], b"FAKEMP3OUTPUT");
    }

    #[tokio::test]
    async fn loop_request_is_marked_in_the_filename() {
        let dir = tempfile::tempdir().unwrap();
        let body =
            format!(r#"{{"url":"{OK_URL}","startTime":10,"endTime":40,"optimizeLoop":true}}"#);

        let response = app_with(fake_tools(dir.path()))
            .oneshot(post_download(&body))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get(header::CONTENT_DISPOSITION).unwrap(),
            "attachment; filename=\"My_Test_Song_10-40_loop.mp3\""
        );
    }

    #[tokio::test]
    async fn ready_reports_engine_status() {
        let dir = tempfile::tempdir().unwrap();

        let response = app_with(fake_tools(dir.path()))
            .oneshot(
                Request::builder()
                    .uri("/ready")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = app_with(dummy_tools())
            .oneshot(
                Request::builder()
                    .uri("/ready")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }
}

#[tokio::test]
async fn health_endpoint_reports_version() {
    let response = app_with(dummy_tools())
        .oneshot(
            Request::builder()
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(json["status"], "healthy");
    assert!(json["version"].is_string());
}
