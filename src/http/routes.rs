use axum::{
    body::Body,
    extract::{Path, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use tokio_util::io::ReaderStream;

use crate::http::state::AppState;
use crate::media::library::VideoRecord;
use crate::stream::playlist;
use crate::stream::segments::SegmentError;

const PLAYLIST_CONTENT_TYPE: &str = "application/vnd.apple.mpegurl";
const SEGMENT_CONTENT_TYPE: &str = "video/mp2t";
/// Segments are immutable once produced; let clients and proxies keep them.
const SEGMENT_CACHE_CONTROL: &str = "public, max-age=3600";

/// Clone the record out under a short read guard so no lock is held across
/// the transcode await.
async fn lookup(state: &AppState, id: &str) -> Option<VideoRecord> {
    let library = state.library.read().await;
    library.get(id).cloned()
}

/// GET /files — the indexed library as JSON.
pub async fn list_files(State(state): State<AppState>) -> Json<Vec<VideoRecord>> {
    let library = state.library.read().await;
    Json(library.videos.clone())
}

/// GET /stream/{id}/playlist.m3u8
pub async fn playlist(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    let Some(video) = lookup(&state, &id).await else {
        return (StatusCode::NOT_FOUND, "video not found").into_response();
    };

    tracing::info!(
        "playlist: path={} duration={:.1}s segments={}",
        video.path.display(),
        video.duration,
        playlist::segment_count(video.duration)
    );

    (
        [(header::CONTENT_TYPE, PLAYLIST_CONTENT_TYPE)],
        playlist::render(&video),
    )
        .into_response()
}

/// GET /stream/{id}/segment_{n}.ts
pub async fn segment(
    State(state): State<AppState>,
    Path((id, segment_name)): Path<(String, String)>,
) -> Response {
    let Some(video) = lookup(&state, &id).await else {
        return (StatusCode::NOT_FOUND, "video not found").into_response();
    };
    let Some(index) = parse_segment_name(&segment_name) else {
        return (StatusCode::BAD_REQUEST, "invalid segment").into_response();
    };

    match state.segments.get(video, index).await {
        Ok(path) => serve_segment_file(&path).await,
        Err(SegmentError::NotFound) => {
            (StatusCode::NOT_FOUND, "segment not found").into_response()
        }
        Err(e) => {
            tracing::error!("segment {segment_name} of {id}: {e}");
            (StatusCode::INTERNAL_SERVER_ERROR, "ffmpeg error").into_response()
        }
    }
}

/// Extract the index from a `segment_{n}.ts` path component.
pub fn parse_segment_name(name: &str) -> Option<u32> {
    name.strip_prefix("segment_")?
        .strip_suffix(".ts")?
        .parse()
        .ok()
}

async fn serve_segment_file(path: &std::path::Path) -> Response {
    let file = match tokio::fs::File::open(path).await {
        Ok(f) => f,
        Err(e) => {
            tracing::error!("cannot open cached segment {}: {e}", path.display());
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    let mut headers = HeaderMap::new();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static(SEGMENT_CONTENT_TYPE),
    );
    headers.insert(
        header::CACHE_CONTROL,
        HeaderValue::from_static(SEGMENT_CACHE_CONTROL),
    );
    if let Ok(meta) = file.metadata().await {
        headers.insert(header::CONTENT_LENGTH, HeaderValue::from(meta.len()));
    }

    let body = Body::from_stream(ReaderStream::new(file));
    (StatusCode::OK, headers, body).into_response()
}
