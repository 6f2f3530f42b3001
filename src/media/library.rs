use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// A single indexed video with all metadata probed at scan time.
/// Serialized verbatim into the on-disk manifest.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VideoRecord {
    /// Content digest of the file — stable across renames and moves.
    pub id: String,
    /// Current absolute path of the file.
    pub path: PathBuf,
    /// Display title from container metadata, else the file stem.
    pub name: String,
    /// Duration in seconds. Zero when probing failed.
    pub duration: f64,
    /// Pixel width. Zero when probing failed.
    pub width: u32,
    /// Pixel height. Zero when probing failed.
    pub height: u32,
}

/// In-memory video registry, keyed by content id.
/// Wrapped in Arc<tokio::sync::RwLock<..>> in main.rs; the indexer holds the
/// write guard for a whole pass, request handlers take short read guards.
#[derive(Debug, Default)]
pub struct VideoLibrary {
    /// All indexed videos, unique by id. Order follows the manifest.
    pub videos: Vec<VideoRecord>,
}

impl VideoLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: &str) -> Option<&VideoRecord> {
        self.videos.iter().find(|v| v.id == id)
    }

    pub fn len(&self) -> usize {
        self.videos.len()
    }

    pub fn is_empty(&self) -> bool {
        self.videos.is_empty()
    }
}
