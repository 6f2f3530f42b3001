use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use tokio::sync::RwLock;
use tower::ServiceExt;

use gazeparty::http::routes::parse_segment_name;
use gazeparty::http::{build_router, state::AppState};
use gazeparty::media::library::{VideoLibrary, VideoRecord};
use gazeparty::stream::segments::SegmentStore;
use gazeparty::stream::transcode::{EncodeError, Transcode};

const TEST_ID: &str = "0f0f0f0f0f0f0f0f0f0f0f0f0f0f0f0f0f0f0f0f0f0f0f0f0f0f0f0f0f0f0f0f";
const SEGMENT_PAYLOAD: &[u8] = b"fake mpegts payload";

/// Writes a fixed payload instead of running ffmpeg.
struct StubTranscoder;

#[async_trait]
impl Transcode for StubTranscoder {
    async fn transcode(
        &self,
        _input: &Path,
        output: &Path,
        _start_secs: u32,
        _duration_secs: u32,
    ) -> Result<(), EncodeError> {
        tokio::fs::write(output, SEGMENT_PAYLOAD)
            .await
            .map_err(EncodeError::Io)?;
        Ok(())
    }
}

fn fake_video(duration: f64) -> VideoRecord {
    VideoRecord {
        id: TEST_ID.to_string(),
        path: PathBuf::from("/video/fake.mp4"),
        name: "fake".to_string(),
        duration,
        width: 1920,
        height: 1080,
    }
}

fn make_app(videos: Vec<VideoRecord>, cache_root: &Path) -> axum::Router {
    let state = AppState {
        library: Arc::new(RwLock::new(VideoLibrary { videos })),
        segments: SegmentStore::new(cache_root.to_owned(), Arc::new(StubTranscoder)),
    };
    build_router(state, Path::new("static"))
}

async fn body_bytes(response: axum::response::Response) -> Vec<u8> {
    response
        .into_body()
        .collect()
        .await
        .unwrap()
        .to_bytes()
        .to_vec()
}

// ── GET /files ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn files_lists_library_as_json() {
    let cache = tempfile::tempdir().unwrap();
    let response = make_app(vec![fake_video(16.0)], cache.path())
        .oneshot(Request::builder().uri("/files").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let ct = response.headers()["content-type"].to_str().unwrap().to_owned();
    assert!(ct.starts_with("application/json"), "got: {ct}");

    let body = body_bytes(response).await;
    let parsed: Vec<serde_json::Value> = serde_json::from_slice(&body).unwrap();
    assert_eq!(parsed.len(), 1);
    assert_eq!(parsed[0]["id"], TEST_ID);
    assert_eq!(parsed[0]["duration"], 16.0);
}

#[tokio::test]
async fn files_empty_library_is_empty_array() {
    let cache = tempfile::tempdir().unwrap();
    let response = make_app(vec![], cache.path())
        .oneshot(Request::builder().uri("/files").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_bytes(response).await, b"[]");
}

// ── GET /stream/{id}/playlist.m3u8 ───────────────────────────────────────────

#[tokio::test]
async fn playlist_unknown_video_is_404() {
    let cache = tempfile::tempdir().unwrap();
    let response = make_app(vec![], cache.path())
        .oneshot(
            Request::builder()
                .uri("/stream/deadbeef/playlist.m3u8")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn playlist_renders_vod_manifest() {
    let cache = tempfile::tempdir().unwrap();
    let response = make_app(vec![fake_video(16.0)], cache.path())
        .oneshot(
            Request::builder()
                .uri(format!("/stream/{TEST_ID}/playlist.m3u8"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()["content-type"],
        "application/vnd.apple.mpegurl"
    );

    let text = String::from_utf8(body_bytes(response).await).unwrap();
    assert!(text.starts_with("#EXTM3U\n"));
    assert!(text.contains("segment_0.ts\n"));
    assert!(text.contains("segment_4.ts\n"));
    assert!(text.ends_with("#EXT-X-ENDLIST\n"));
}

// ── GET /stream/{id}/segment_{n}.ts ──────────────────────────────────────────

#[tokio::test]
async fn segment_unknown_video_is_404() {
    let cache = tempfile::tempdir().unwrap();
    let response = make_app(vec![], cache.path())
        .oneshot(
            Request::builder()
                .uri("/stream/deadbeef/segment_0.ts")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn segment_malformed_index_is_400() {
    let cache = tempfile::tempdir().unwrap();
    let app = make_app(vec![fake_video(16.0)], cache.path());

    for bad in ["segment_abc.ts", "segment_.ts", "anything.ts"] {
        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .uri(format!("/stream/{TEST_ID}/{bad}"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "for {bad}");
    }
}

#[tokio::test]
async fn segment_out_of_range_is_404() {
    let cache = tempfile::tempdir().unwrap();
    let response = make_app(vec![fake_video(16.0)], cache.path())
        .oneshot(
            Request::builder()
                .uri(format!("/stream/{TEST_ID}/segment_9.ts"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn segment_streams_transcoded_file_with_cache_headers() {
    let cache = tempfile::tempdir().unwrap();
    let response = make_app(vec![fake_video(16.0)], cache.path())
        .oneshot(
            Request::builder()
                .uri(format!("/stream/{TEST_ID}/segment_4.ts"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["content-type"], "video/mp2t");
    assert_eq!(
        response.headers()["cache-control"],
        "public, max-age=3600"
    );
    assert_eq!(body_bytes(response).await, SEGMENT_PAYLOAD);
}

// ── parse_segment_name ───────────────────────────────────────────────────────

#[test]
fn parses_valid_segment_names() {
    assert_eq!(parse_segment_name("segment_0.ts"), Some(0));
    assert_eq!(parse_segment_name("segment_42.ts"), Some(42));
}

#[test]
fn rejects_malformed_segment_names() {
    assert_eq!(parse_segment_name("segment_.ts"), None);
    assert_eq!(parse_segment_name("segment_x.ts"), None);
    assert_eq!(parse_segment_name("seg_1.ts"), None);
    assert_eq!(parse_segment_name("segment_1.mp4"), None);
    assert_eq!(parse_segment_name("segment_-1.ts"), None);
}
