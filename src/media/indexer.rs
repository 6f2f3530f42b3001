use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Instant;
use tokio::sync::RwLock;
use walkdir::WalkDir;

use crate::config::Config;
use crate::media::ident;
use crate::media::library::{VideoLibrary, VideoRecord};
use crate::media::probe;

/// Recognized video file extensions, matched case-insensitively.
pub const VIDEO_EXTENSIONS: &[&str] = &["mp4", "mkv", "avi", "mov", "wmv", "webm"];

/// Number of concurrent hash+probe workers per indexing pass.
const SCAN_WORKERS: usize = 4;

/// Fatal indexer failure. Non-critical errors (unreadable files, probe
/// failures) are logged and absorbed instead.
#[derive(Debug, thiserror::Error)]
pub enum IndexError {
    #[error("failed to create data directory: {0}")]
    DataDir(#[source] std::io::Error),
    #[error("failed to encode manifest: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("failed to write manifest: {0}")]
    Manifest(#[source] std::io::Error),
}

/// Counters from one reconciliation pass, for the startup summary line.
#[derive(Debug, Default)]
pub struct IndexOutcome {
    pub total: usize,
    pub added: usize,
    pub removed: usize,
    pub updated: usize,
}

pub fn is_video(path: &Path) -> bool {
    let Some(ext) = path.extension().and_then(|e| e.to_str()) else {
        return false;
    };
    let ext = ext.to_ascii_lowercase();
    VIDEO_EXTENSIONS.contains(&ext.as_str())
}

/// Scan the media root, reconcile against the persisted manifest, rewrite the
/// manifest, and swap the registry contents.
///
/// The registry's write guard is held for the entire pass: readers observe
/// either the previous library or the fully reconciled one, never a partial
/// state.
pub async fn load_and_sync(
    config: &Config,
    registry: &RwLock<VideoLibrary>,
) -> Result<IndexOutcome, IndexError> {
    let mut library = registry.write().await;
    let start = Instant::now();

    tokio::fs::create_dir_all(&config.data_dir)
        .await
        .map_err(IndexError::DataDir)?;

    let candidates = collect_candidates(&config.media_root);
    let scanned = scan_files(candidates).await;

    let previous = load_manifest(&config.manifest_path());
    let (result, outcome) = reconcile(previous, scanned);

    persist_manifest(&config.manifest_path(), &result)?;

    tracing::info!(
        "sync: {} videos (added={} removed={} updated={}) in {:.1}s",
        result.len(),
        outcome.added,
        outcome.removed,
        outcome.updated,
        start.elapsed().as_secs_f64()
    );

    library.videos = result;
    Ok(outcome)
}

/// Walk the media root and collect recognized video files. Walk errors are
/// logged and skipped — a broken entry must not abort the pass.
fn collect_candidates(media_root: &Path) -> Vec<PathBuf> {
    let mut candidates = Vec::new();
    for entry in WalkDir::new(media_root).follow_links(true) {
        match entry {
            Err(e) => {
                tracing::warn!("cannot access entry: {e}");
            }
            Ok(entry) if entry.file_type().is_file() && is_video(entry.path()) => {
                candidates.push(entry.into_path());
            }
            Ok(_) => {}
        }
    }
    candidates
}

/// Hash and probe the candidates with a fixed pool of worker tasks pulling
/// from a shared queue.
async fn scan_files(candidates: Vec<PathBuf>) -> Vec<VideoRecord> {
    let queue = Arc::new(Mutex::new(candidates.into_iter()));
    let mut workers = Vec::with_capacity(SCAN_WORKERS);

    for _ in 0..SCAN_WORKERS {
        let queue = Arc::clone(&queue);
        workers.push(tokio::spawn(async move {
            let mut records = Vec::new();
            loop {
                let next = {
                    let mut iter = queue.lock().expect("scan queue poisoned");
                    iter.next()
                };
                let Some(path) = next else { break };
                if let Some(record) = scan_one(path).await {
                    records.push(record);
                }
            }
            records
        }));
    }

    let mut scanned = Vec::new();
    for worker in workers {
        match worker.await {
            Ok(records) => scanned.extend(records),
            Err(e) => tracing::error!("scan worker failed: {e}"),
        }
    }
    scanned
}

/// Hash and probe a single file. A hash failure drops the file (it will
/// reappear on a later pass); probe failures keep it with zeroed metadata.
async fn scan_one(path: PathBuf) -> Option<VideoRecord> {
    tracing::debug!("hashing: {}", path.display());
    let hash_path = path.clone();
    let id = match tokio::task::spawn_blocking(move || ident::content_id(&hash_path)).await {
        Ok(Ok(id)) => id,
        Ok(Err(e)) => {
            tracing::warn!("error hashing {}: {e}", path.display());
            return None;
        }
        Err(e) => {
            tracing::error!("hash task for {} failed: {e}", path.display());
            return None;
        }
    };

    let duration = match probe::duration(&path).await {
        Ok(d) => d,
        Err(e) => {
            tracing::warn!("cannot probe duration of {}: {e}", path.display());
            0.0
        }
    };
    let (width, height) = match probe::resolution(&path).await {
        Ok(dims) => dims,
        Err(e) => {
            tracing::warn!("cannot probe resolution of {}: {e}", path.display());
            (0, 0)
        }
    };
    let name = probe::title(&path).await;

    Some(VideoRecord {
        id,
        path,
        name,
        duration,
        width,
        height,
    })
}

/// Merge the fresh scan over the previous manifest. The scan wins: records
/// keep their manifest position, absorb path/metadata changes, disappear when
/// their id is gone, and new ids are appended.
fn reconcile(
    previous: Vec<VideoRecord>,
    scanned: Vec<VideoRecord>,
) -> (Vec<VideoRecord>, IndexOutcome) {
    let mut fresh: HashMap<String, VideoRecord> =
        scanned.into_iter().map(|r| (r.id.clone(), r)).collect();

    let mut result = Vec::with_capacity(fresh.len());
    let mut outcome = IndexOutcome::default();

    for old in previous {
        match fresh.remove(&old.id) {
            Some(new) => {
                if new != old {
                    tracing::info!("updated: {}", new.path.display());
                    outcome.updated += 1;
                }
                result.push(new);
            }
            None => {
                tracing::info!("removed (file deleted): {}", old.path.display());
                outcome.removed += 1;
            }
        }
    }

    for record in fresh.into_values() {
        tracing::info!("new video: {}", record.path.display());
        outcome.added += 1;
        result.push(record);
    }

    outcome.total = result.len();
    (result, outcome)
}

/// Read the previous manifest. Missing or corrupt manifests start the pass
/// from an empty baseline rather than failing it.
fn load_manifest(path: &Path) -> Vec<VideoRecord> {
    let bytes = match std::fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) => {
            if e.kind() != std::io::ErrorKind::NotFound {
                tracing::warn!("cannot read manifest {}: {e}", path.display());
            }
            return Vec::new();
        }
    };
    match serde_json::from_slice::<Vec<VideoRecord>>(&bytes) {
        Ok(videos) => {
            tracing::info!("loaded {} videos from manifest", videos.len());
            videos
        }
        Err(e) => {
            tracing::warn!("cannot parse manifest {}: {e}", path.display());
            Vec::new()
        }
    }
}

/// Rewrite the manifest in full. No append or merge.
fn persist_manifest(path: &Path, videos: &[VideoRecord]) -> Result<(), IndexError> {
    let json = serde_json::to_vec_pretty(videos)?;
    std::fs::write(path, json).map_err(IndexError::Manifest)
}
