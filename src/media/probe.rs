use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;

/// Probing a media file failed. The indexer degrades the record to zero
/// duration/dimensions instead of dropping it.
#[derive(Debug, thiserror::Error)]
pub enum ProbeError {
    #[error("failed to launch ffprobe: {0}")]
    Spawn(#[source] std::io::Error),
    #[error("ffprobe exited with {0}")]
    Tool(std::process::ExitStatus),
    #[error("unexpected ffprobe output: {0:?}")]
    Parse(String),
}

async fn ffprobe(args: &[&str], path: &Path) -> Result<String, ProbeError> {
    let output = Command::new("ffprobe")
        .args(args)
        .arg(path)
        .stdin(Stdio::null())
        .output()
        .await
        .map_err(ProbeError::Spawn)?;
    if !output.status.success() {
        return Err(ProbeError::Tool(output.status));
    }
    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

/// Duration of the container in seconds.
pub async fn duration(path: &Path) -> Result<f64, ProbeError> {
    let raw = ffprobe(
        &[
            "-v",
            "error",
            "-show_entries",
            "format=duration",
            "-of",
            "default=noprint_wrappers=1:nokey=1",
        ],
        path,
    )
    .await?;
    parse_duration_output(&raw)
}

/// Pixel dimensions of the first video stream.
pub async fn resolution(path: &Path) -> Result<(u32, u32), ProbeError> {
    let raw = ffprobe(
        &[
            "-v",
            "error",
            "-select_streams",
            "v:0",
            "-show_entries",
            "stream=width,height",
            "-of",
            "csv=p=0",
        ],
        path,
    )
    .await?;
    parse_resolution_output(&raw)
}

/// Display title from the container's title tag, falling back to the file
/// stem. Never fails.
pub async fn title(path: &Path) -> String {
    let probed = ffprobe(
        &[
            "-v",
            "error",
            "-show_entries",
            "format_tags=title",
            "-of",
            "default=noprint_wrappers=1:nokey=1",
        ],
        path,
    )
    .await;
    match probed {
        Ok(raw) => {
            let title = raw.trim();
            if title.is_empty() {
                file_stem_name(path)
            } else {
                title.to_string()
            }
        }
        Err(_) => file_stem_name(path),
    }
}

/// File name without its extension, as a display-name fallback.
pub fn file_stem_name(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

pub fn parse_duration_output(raw: &str) -> Result<f64, ProbeError> {
    let trimmed = raw.trim();
    trimmed
        .parse::<f64>()
        .map_err(|_| ProbeError::Parse(trimmed.to_string()))
}

/// Parse a `width,height` pair. Some builds emit a trailing comma
/// ("1920,1080,"), which is tolerated. A pair with the wrong field count
/// degrades to (0, 0), matching how a stream without video dimensions probes.
pub fn parse_resolution_output(raw: &str) -> Result<(u32, u32), ProbeError> {
    let cleaned = raw.trim().trim_end_matches(',');
    let parts: Vec<&str> = cleaned.split(',').collect();
    if parts.len() != 2 {
        return Ok((0, 0));
    }
    let width = parts[0]
        .trim()
        .parse::<u32>()
        .map_err(|_| ProbeError::Parse(cleaned.to_string()))?;
    let height = parts[1]
        .trim()
        .parse::<u32>()
        .map_err(|_| ProbeError::Parse(cleaned.to_string()))?;
    Ok((width, height))
}
