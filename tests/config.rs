use std::path::PathBuf;

use gazeparty::cli::Args;
use gazeparty::config::{Config, FileConfig};

fn make_args(port: Option<u16>, media_root: Option<PathBuf>) -> Args {
    Args {
        media_root,
        port,
        data_dir: None,
        cache_dir: None,
        crf: None,
        static_dir: None,
        config: None,
    }
}

#[test]
fn defaults_when_nothing_set() {
    let args = make_args(None, None);
    let config = Config::resolve(None, &args);
    assert_eq!(config.port, 8066);
    assert_eq!(config.media_root, PathBuf::from("/video"));
    assert_eq!(config.data_dir, PathBuf::from("/data"));
    assert_eq!(config.cache_dir, PathBuf::from("/tmp/segments"));
    assert_eq!(config.crf, 23);
}

#[test]
fn cli_flag_overrides_default() {
    let args = make_args(Some(9000), Some(PathBuf::from("/mnt/movies")));
    let config = Config::resolve(None, &args);
    assert_eq!(config.port, 9000);
    assert_eq!(config.media_root, PathBuf::from("/mnt/movies"));
}

#[test]
fn toml_overrides_default() {
    let file = FileConfig {
        port: Some(7777),
        media_root: None,
        data_dir: Some(PathBuf::from("/var/lib/gazeparty")),
        cache_dir: None,
        crf: Some(18),
        static_dir: None,
    };
    let args = make_args(None, None);
    let config = Config::resolve(Some(file), &args);
    assert_eq!(config.port, 7777);
    assert_eq!(config.data_dir, PathBuf::from("/var/lib/gazeparty"));
    assert_eq!(config.crf, 18);
}

#[test]
fn cli_overrides_toml() {
    let file = FileConfig {
        port: Some(7777),
        media_root: None,
        data_dir: None,
        cache_dir: None,
        crf: None,
        static_dir: None,
    };
    let args = make_args(Some(9000), None);
    let config = Config::resolve(Some(file), &args);
    assert_eq!(config.port, 9000); // CLI wins
}

#[test]
fn toml_parse() {
    let toml_str = "port = 9000\nmedia_root = \"/srv/video\"\ncrf = 20\n";
    let parsed: FileConfig = toml::from_str(toml_str).unwrap();
    assert_eq!(parsed.port, Some(9000));
    assert_eq!(parsed.media_root, Some(PathBuf::from("/srv/video")));
    assert_eq!(parsed.crf, Some(20));
}

#[test]
fn toml_unknown_fields_ignored() {
    // Future keys must not break parsing
    let toml_str = "port = 9000\nunknown_future_key = true\n";
    let parsed: Result<FileConfig, _> = toml::from_str(toml_str);
    assert!(parsed.is_ok());
}

#[test]
fn manifest_path_lives_in_data_dir() {
    let args = make_args(None, None);
    let config = Config::resolve(None, &args);
    assert_eq!(config.manifest_path(), PathBuf::from("/data/videos.json"));
}
