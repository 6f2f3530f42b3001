use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};
use tokio::time::MissedTickBehavior;
use walkdir::WalkDir;

/// How often the cache root is swept.
pub const SWEEP_INTERVAL: Duration = Duration::from_secs(60);

/// Segments untouched for longer than this are evicted. Measured from mtime,
/// not access time — a segment under continuous playback may still be evicted
/// and will simply be re-encoded.
pub const MAX_SEGMENT_AGE: Duration = Duration::from_secs(8 * 60);

/// Periodic cache eviction loop. Runs for the process lifetime; spawned once
/// at startup.
pub async fn run(root: PathBuf, every: Duration, max_age: Duration) {
    tracing::info!(
        "janitor started: interval={}s max_age={}s",
        every.as_secs(),
        max_age.as_secs()
    );
    let mut ticker = tokio::time::interval(every);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    loop {
        ticker.tick().await;
        let removed = sweep(&root, max_age);
        if removed > 0 {
            tracing::info!("janitor: removed {removed} old segments");
        }
    }
}

/// One eviction pass: delete regular files older than `max_age`, then prune
/// emptied subdirectories (the root itself is preserved). Returns the number
/// of files removed.
///
/// No coordination with the segment store is needed: in-flight writes sit at
/// a temporary name until their atomic rename, and a completed file being
/// streamed stays readable through the handler's open descriptor.
pub fn sweep(root: &Path, max_age: Duration) -> usize {
    let now = SystemTime::now();
    let mut removed = 0;

    for entry in WalkDir::new(root).into_iter().filter_map(|e| e.ok()) {
        if !entry.file_type().is_file() {
            continue;
        }
        let Ok(metadata) = entry.metadata() else {
            continue;
        };
        let Ok(modified) = metadata.modified() else {
            continue;
        };
        let expired = matches!(now.duration_since(modified), Ok(age) if age > max_age);
        if expired && std::fs::remove_file(entry.path()).is_ok() {
            removed += 1;
        }
    }

    // remove_dir refuses non-empty directories, which is exactly the filter
    // wanted here; contents_first visits children before their parent.
    for entry in WalkDir::new(root)
        .min_depth(1)
        .contents_first(true)
        .into_iter()
        .filter_map(|e| e.ok())
    {
        if entry.file_type().is_dir() {
            let _ = std::fs::remove_dir(entry.path());
        }
    }

    removed
}
