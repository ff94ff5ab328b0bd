//! Clip download handler: validate, resolve metadata, stream.

use axum::body::Body;
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::header;
use axum::response::Response;
use axum::Json;
use tracing::info;

use loopclip_media::{check_range_against_duration, resolve_metadata, AudioPipeline};
use loopclip_models::{clip_filename, ClipRequest, DownloadRequest};

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// `POST /api/download`
///
/// Errors are JSON up to the moment the pipeline spawns; once the
/// streaming response starts, an upstream failure can only terminate
/// the transport (diagnostics go to the server log).
pub async fn download_clip(
    State(state): State<AppState>,
    payload: Result<Json<DownloadRequest>, JsonRejection>,
) -> ApiResult<Response> {
    let Json(raw) = payload
        .map_err(|e| ApiError::bad_request(format!("malformed request body: {e}")))?;

    // Pure validation, before any process is spawned.
    let request = ClipRequest::validate(&raw)?;

    // Metadata-only resolution, then re-validate the range against the
    // real duration.
    let metadata = resolve_metadata(
        &state.tools,
        &state.config.metadata_options(),
        request.source_url(),
    )
    .await?;
    check_range_against_duration(request.end_secs(), &metadata)?;

    let filename = clip_filename(
        metadata.title.as_deref(),
        request.start_secs(),
        request.end_secs(),
        request.optimize_loop(),
    );

    let pipeline = AudioPipeline::spawn(&state.tools, &request)?;

    info!(
        video_id = %request.video_id(),
        start = request.start_secs(),
        end = request.end_secs(),
        optimize_loop = request.optimize_loop(),
        filename = %filename,
        "Streaming clip"
    );

    // Chunks are relayed as they arrive; the client disconnecting
    // drops this body and tears the pipeline down.
    Response::builder()
        .header(header::CONTENT_TYPE, "audio/mpeg")
        .header(
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{filename}\""),
        )
        .body(Body::from_stream(pipeline))
        .map_err(|e| ApiError::internal(format!("failed to build response: {e}")))
}
