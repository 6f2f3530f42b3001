use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tokio::sync::Mutex as SegmentLock;

use crate::media::library::VideoRecord;
use crate::stream::playlist::{self, SEGMENT_DURATION};
use crate::stream::transcode::{EncodeError, Transcode};

/// Number of upcoming segments materialized in the background after every
/// segment request.
pub const PREFETCH_COUNT: u32 = 2;

#[derive(Debug, thiserror::Error)]
pub enum SegmentError {
    #[error("segment index out of range")]
    NotFound,
    #[error(transparent)]
    Encode(#[from] EncodeError),
    #[error("segment task aborted")]
    TaskFailed,
}

/// Canonical lock-table key for one (video, segment) pair.
pub fn segment_key(video_id: &str, index: u32) -> String {
    format!("{video_id}_{index}")
}

/// On-disk cache of transcoded segments with per-segment single-flight.
///
/// Cheap to clone; all clones share the lock table. A given (video, segment)
/// is transcoded at most once concurrently, while distinct segments proceed
/// in parallel.
#[derive(Clone)]
pub struct SegmentStore {
    inner: Arc<StoreInner>,
}

struct StoreInner {
    root: PathBuf,
    transcoder: Arc<dyn Transcode>,
    /// Lazily interned per-segment locks. The table mutex is held only for
    /// lookup/insert — never while a segment lock is being acquired. Entries
    /// live for the process lifetime, bounded by library size × segments.
    locks: Mutex<HashMap<String, Arc<SegmentLock<()>>>>,
}

impl SegmentStore {
    pub fn new(root: PathBuf, transcoder: Arc<dyn Transcode>) -> Self {
        Self {
            inner: Arc::new(StoreInner {
                root,
                transcoder,
                locks: Mutex::new(HashMap::new()),
            }),
        }
    }

    /// Canonical cache path for a segment.
    pub fn segment_path(&self, video_id: &str, index: u32) -> PathBuf {
        self.inner
            .root
            .join(video_id)
            .join(format!("segment_{index}.ts"))
    }

    fn lock_for(&self, key: &str) -> Arc<SegmentLock<()>> {
        let mut table = self.inner.locks.lock().expect("segment lock table poisoned");
        Arc::clone(table.entry(key.to_string()).or_default())
    }

    /// Return the cache path of a segment, transcoding it first on a miss.
    ///
    /// The work runs in a detached task: dropping the returned future (a
    /// client disconnect) never kills an ffmpeg already underway, so the
    /// finished segment still lands in the cache for the next request.
    /// Prefetch of the following segments is dispatched after hit and miss
    /// alike.
    pub async fn get(&self, video: VideoRecord, index: u32) -> Result<PathBuf, SegmentError> {
        if index >= playlist::segment_count(video.duration) {
            return Err(SegmentError::NotFound);
        }

        let store = self.clone();
        let task = tokio::spawn(async move {
            let result = store.materialize(&video, index).await;
            if result.is_ok() {
                store.dispatch_prefetch(video, index);
            }
            result
        });

        match task.await {
            Ok(result) => result,
            Err(e) => {
                tracing::error!("segment task for index {index} died: {e}");
                Err(SegmentError::TaskFailed)
            }
        }
    }

    /// Single-flight region: serialize on the per-segment lock, then either
    /// observe the cached file or produce it.
    async fn materialize(&self, video: &VideoRecord, index: u32) -> Result<PathBuf, SegmentError> {
        let lock = self.lock_for(&segment_key(&video.id, index));
        let _guard = lock.lock().await;

        let path = self.segment_path(&video.id, index);
        if tokio::fs::try_exists(&path).await.unwrap_or(false) {
            return Ok(path);
        }

        tracing::info!(
            "generating seg={index} start={}s for {}",
            index * SEGMENT_DURATION,
            video.path.display()
        );
        self.encode_into(video, index, &path).await?;
        Ok(path)
    }

    /// Transcode into a temporary name and rename into place, so a segment
    /// file is only ever observable complete. Callers must hold the
    /// per-segment lock.
    async fn encode_into(
        &self,
        video: &VideoRecord,
        index: u32,
        path: &std::path::Path,
    ) -> Result<(), EncodeError> {
        if let Some(dir) = path.parent() {
            tokio::fs::create_dir_all(dir).await?;
        }
        let tmp = path.with_extension("ts.tmp");
        let start = index * SEGMENT_DURATION;

        match self
            .inner
            .transcoder
            .transcode(&video.path, &tmp, start, SEGMENT_DURATION)
            .await
        {
            Ok(()) => {
                tokio::fs::rename(&tmp, path).await?;
                Ok(())
            }
            Err(e) => {
                let _ = tokio::fs::remove_file(&tmp).await;
                Err(e)
            }
        }
    }

    fn dispatch_prefetch(&self, video: VideoRecord, index: u32) {
        let store = self.clone();
        tokio::spawn(async move {
            store.prefetch(&video, index, PREFETCH_COUNT).await;
        });
    }

    /// Best-effort materialization of the `count` segments following
    /// `after`. A segment already in flight is skipped via try_lock; failures
    /// are logged and discarded.
    pub async fn prefetch(&self, video: &VideoRecord, after: u32, count: u32) {
        let total = playlist::segment_count(video.duration);

        for index in after + 1..=after.saturating_add(count) {
            if index >= total {
                break;
            }

            let lock = self.lock_for(&segment_key(&video.id, index));
            let Ok(_guard) = lock.try_lock() else {
                tracing::debug!("prefetch: seg={index} already in flight, skipping");
                continue;
            };

            let path = self.segment_path(&video.id, index);
            if tokio::fs::try_exists(&path).await.unwrap_or(false) {
                continue;
            }

            tracing::debug!("prefetch: generating seg={index}");
            if let Err(e) = self.encode_into(video, index, &path).await {
                tracing::warn!("prefetch of seg={index} failed: {e}");
            }
        }
    }
}
