use std::sync::Arc;
use tokio::sync::RwLock;

use crate::media::library::VideoLibrary;
use crate::stream::segments::SegmentStore;

/// Shared application state injected into route handlers via
/// axum::extract::State. The registry is written only by the indexer;
/// handlers take short-lived read guards and clone records out.
#[derive(Clone)]
pub struct AppState {
    pub library: Arc<RwLock<VideoLibrary>>,
    pub segments: SegmentStore,
}
