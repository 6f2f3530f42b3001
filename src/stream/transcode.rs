use async_trait::async_trait;
use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;

/// Name of the environment variable that selects the Raspberry Pi hardware
/// encoder. Any value other than "1" keeps the software encoder.
pub const HW_ENCODER_ENV: &str = "GAZEPARTY_RPI";

const SW_VIDEO_ENCODER: &str = "libx264";
const HW_VIDEO_ENCODER: &str = "h264_v4l2m2m";
const HW_DEFAULT_BITRATE: &str = "3M";

/// How far before the requested offset the coarse input seek lands. The
/// precise output-side seek then decodes only this window instead of the
/// whole file.
const COARSE_SEEK_LEAD: u32 = 10;

#[derive(Debug, thiserror::Error)]
pub enum EncodeError {
    #[error("failed to launch ffmpeg: {0}")]
    Spawn(#[source] std::io::Error),
    #[error("ffmpeg exited with {status}: {stderr}")]
    Failed {
        status: std::process::ExitStatus,
        stderr: String,
    },
    #[error("failed to place segment file: {0}")]
    Io(#[from] std::io::Error),
}

/// Produces one self-contained MPEG-TS segment. The seam exists so tests can
/// substitute a spy and count invocations.
#[async_trait]
pub trait Transcode: Send + Sync {
    async fn transcode(
        &self,
        input: &Path,
        output: &Path,
        start_secs: u32,
        duration_secs: u32,
    ) -> Result<(), EncodeError>;
}

/// Encoder selection. Hardware encoding is rate-controlled by bitrate; the
/// CRF and preset flags only apply to x264.
#[derive(Debug, Clone)]
pub enum Encoder {
    Software { crf: u8 },
    Hardware { bitrate: String },
}

/// Spawns ffmpeg to cut and encode a single segment.
pub struct FfmpegTranscoder {
    encoder: Encoder,
}

impl FfmpegTranscoder {
    pub fn new(encoder: Encoder) -> Self {
        if let Encoder::Software { crf } = &encoder {
            if !(15..=30).contains(crf) {
                tracing::warn!("CRF={crf} is outside the recommended range 15-30");
            }
        }
        Self { encoder }
    }

    /// Software x264 with the given CRF, or the v4l2m2m hardware encoder at
    /// 3 Mb/s when `GAZEPARTY_RPI=1`.
    pub fn from_env(crf: u8) -> Self {
        let encoder = if std::env::var(HW_ENCODER_ENV).as_deref() == Ok("1") {
            Encoder::Hardware {
                bitrate: HW_DEFAULT_BITRATE.to_string(),
            }
        } else {
            Encoder::Software { crf }
        };
        Self::new(encoder)
    }
}

#[async_trait]
impl Transcode for FfmpegTranscoder {
    async fn transcode(
        &self,
        input: &Path,
        output: &Path,
        start_secs: u32,
        duration_secs: u32,
    ) -> Result<(), EncodeError> {
        // Coarse keyframe seek before the input, precise seek after it.
        let coarse = start_secs.saturating_sub(COARSE_SEEK_LEAD);
        let precise = start_secs - coarse;
        // Closed GOP spanning the whole segment so every segment starts on an
        // IDR frame and concatenates cleanly.
        let gop = (duration_secs * 24).to_string();

        let mut cmd = Command::new("ffmpeg");
        cmd.arg("-y")
            .args(["-hide_banner", "-loglevel", "error"])
            .args(["-ss", &coarse.to_string()])
            .arg("-i")
            .arg(input)
            .args(["-ss", &precise.to_string()])
            .args(["-t", &duration_secs.to_string()])
            .args(["-map", "0:v:0", "-map", "0:a:0?", "-sn", "-dn"]);

        match &self.encoder {
            Encoder::Software { crf } => {
                cmd.args(["-c:v", SW_VIDEO_ENCODER])
                    .args(["-preset", "ultrafast", "-tune", "zerolatency"])
                    .args(["-crf", &crf.to_string()]);
            }
            Encoder::Hardware { bitrate } => {
                cmd.args(["-c:v", HW_VIDEO_ENCODER]).args(["-b:v", bitrate]);
            }
        }

        cmd.args(["-profile:v", "main", "-level", "3.1", "-pix_fmt", "yuv420p"])
            .args(["-g", &gop, "-keyint_min", &gop, "-sc_threshold", "0"])
            .args(["-c:a", "aac", "-b:a", "128k", "-ac", "2", "-ar", "48000"])
            .args(["-af", "aresample=async=1:first_pts=0"])
            // Shift timestamps so segments join at their global PTS.
            .args(["-output_ts_offset", &start_secs.to_string()])
            .args(["-f", "mpegts", "-muxdelay", "0", "-muxpreload", "0"])
            .arg(output)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped());

        let result = cmd.output().await.map_err(EncodeError::Spawn)?;
        if !result.status.success() {
            return Err(EncodeError::Failed {
                status: result.status,
                stderr: String::from_utf8_lossy(&result.stderr).trim().to_string(),
            });
        }
        Ok(())
    }
}
