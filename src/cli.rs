use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "gazeparty",
    about = "On-demand HLS streaming server — point it at a video directory and play",
    long_about = None,
    version,
)]
pub struct Args {
    /// Directory containing the video library [default: /video]
    #[arg(value_name = "MEDIA_ROOT")]
    pub media_root: Option<PathBuf>,

    /// HTTP port to listen on [default: 8066]
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Directory holding the persisted video manifest [default: /data]
    #[arg(long, value_name = "DIR")]
    pub data_dir: Option<PathBuf>,

    /// Directory for cached MPEG-TS segments [default: /tmp/segments]
    #[arg(long, value_name = "DIR")]
    pub cache_dir: Option<PathBuf>,

    /// x264 CRF for software encoding, 15-30 recommended [default: 23]
    #[arg(long)]
    pub crf: Option<u8>,

    /// Directory with the static web player [default: ./static]
    #[arg(long, value_name = "DIR")]
    pub static_dir: Option<PathBuf>,

    /// Path to TOML config file (overrides default search: ./gazeparty.toml, ~/.config/gazeparty/config.toml)
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,
}
