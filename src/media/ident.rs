use sha2::{Digest, Sha256};
use std::fmt::Write as _;
use std::io::Read;
use std::path::Path;

/// Hash at most this many leading bytes of a file. Bounds the cost of an
/// indexing pass on multi-terabyte libraries while still changing whenever
/// the actual content changes.
pub const HASH_PREFIX_LIMIT: u64 = 200 * 1024 * 1024;

const CHUNK: usize = 64 * 1024;

/// Content identity of a video file: hex SHA-256 over the first
/// [`HASH_PREFIX_LIMIT`] bytes. The policy is fixed — changing it would
/// re-identify every file and orphan cached segments.
pub fn content_id(path: &Path) -> std::io::Result<String> {
    let mut file = std::fs::File::open(path)?;
    let mut hasher = Sha256::new();
    let mut buf = vec![0u8; CHUNK];
    let mut remaining = HASH_PREFIX_LIMIT;

    while remaining > 0 {
        let want = CHUNK.min(remaining as usize);
        let read = file.read(&mut buf[..want])?;
        if read == 0 {
            break;
        }
        hasher.update(&buf[..read]);
        remaining -= read as u64;
    }

    let digest = hasher.finalize();
    let mut id = String::with_capacity(digest.len() * 2);
    for byte in digest {
        let _ = write!(id, "{byte:02x}");
    }
    Ok(id)
}
