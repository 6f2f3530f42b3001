use serde::Deserialize;
use std::path::{Path, PathBuf};

const DEFAULT_PORT: u16 = 8066;
const DEFAULT_MEDIA_ROOT: &str = "/video";
const DEFAULT_DATA_DIR: &str = "/data";
const DEFAULT_CACHE_DIR: &str = "/tmp/segments";
const DEFAULT_STATIC_DIR: &str = "static";
const DEFAULT_CRF: u8 = 23;

/// File name of the persisted library manifest inside the data directory.
pub const MANIFEST_FILE: &str = "videos.json";

#[derive(Deserialize, Default, Debug)]
pub struct FileConfig {
    pub port: Option<u16>,
    pub media_root: Option<PathBuf>,
    pub data_dir: Option<PathBuf>,
    pub cache_dir: Option<PathBuf>,
    pub crf: Option<u8>,
    pub static_dir: Option<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub media_root: PathBuf,
    pub data_dir: PathBuf,
    pub cache_dir: PathBuf,
    pub crf: u8,
    pub static_dir: PathBuf,
}

impl Config {
    /// Merge CLI args over file config over built-in defaults. CLI wins.
    pub fn resolve(file: Option<FileConfig>, args: &crate::cli::Args) -> Self {
        let file = file.unwrap_or_default();
        Config {
            port: args.port.or(file.port).unwrap_or(DEFAULT_PORT),
            media_root: args
                .media_root
                .clone()
                .or(file.media_root)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_MEDIA_ROOT)),
            data_dir: args
                .data_dir
                .clone()
                .or(file.data_dir)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR)),
            cache_dir: args
                .cache_dir
                .clone()
                .or(file.cache_dir)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_CACHE_DIR)),
            crf: args.crf.or(file.crf).unwrap_or(DEFAULT_CRF),
            static_dir: args
                .static_dir
                .clone()
                .or(file.static_dir)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_STATIC_DIR)),
        }
    }

    /// Full path of the persisted manifest.
    pub fn manifest_path(&self) -> PathBuf {
        self.data_dir.join(MANIFEST_FILE)
    }
}

pub fn find_config_file(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path.to_owned());
    }
    let cwd_config = PathBuf::from("gazeparty.toml");
    if cwd_config.exists() {
        return Some(cwd_config);
    }
    if let Some(config_dir) = dirs::config_dir() {
        let xdg_config = config_dir.join("gazeparty").join("config.toml");
        if xdg_config.exists() {
            return Some(xdg_config);
        }
    }
    None
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
}

pub fn load_config(path: &Path) -> Result<FileConfig, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let config: FileConfig = toml::from_str(&content)?;
    Ok(config)
}
