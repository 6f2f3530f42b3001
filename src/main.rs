use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use clap::Parser;
use tokio::sync::RwLock;

use gazeparty::media::library::VideoLibrary;
use gazeparty::stream::transcode::FfmpegTranscoder;
use gazeparty::stream::{janitor, segments::SegmentStore};
use gazeparty::{cli, config, http, media};

/// Set to true once the first Ctrl+C is received. Second Ctrl+C force-exits.
static SHUTTING_DOWN: AtomicBool = AtomicBool::new(false);

/// Wait for the first Ctrl+C (graceful shutdown).
/// On second Ctrl+C (during shutdown wait), force-exit immediately.
async fn wait_for_shutdown() {
    tokio::signal::ctrl_c()
        .await
        .expect("failed to install Ctrl+C handler");
    if SHUTTING_DOWN.swap(true, Ordering::SeqCst) {
        eprintln!("\ngazeparty: forced exit");
        std::process::exit(1);
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = cli::Args::parse();

    let file_config = config::find_config_file(args.config.as_deref()).and_then(|path| {
        match config::load_config(&path) {
            Ok(cfg) => {
                tracing::debug!("Loaded config from {}", path.display());
                Some(cfg)
            }
            Err(e) => {
                tracing::warn!("Failed to parse config file: {}", e);
                None
            }
        }
    });

    let config = config::Config::resolve(file_config, &args);

    if !config.media_root.is_dir() {
        eprintln!(
            "error: media root is not a directory: {}",
            config.media_root.display()
        );
        std::process::exit(1);
    }

    tracing::info!(
        "gazeparty: media={} data={} cache={} port={}",
        config.media_root.display(),
        config.data_dir.display(),
        config.cache_dir.display(),
        config.port
    );

    // Initial index pass — blocks until the library is usable. A failure to
    // set up the data dir or write the manifest is fatal at startup.
    let registry = Arc::new(RwLock::new(VideoLibrary::new()));
    if let Err(e) = media::indexer::load_and_sync(&config, &registry).await {
        eprintln!("error: library sync failed: {e}");
        std::process::exit(1);
    }

    // Background eviction of cached segments, for the process lifetime.
    tokio::spawn(janitor::run(
        config.cache_dir.clone(),
        janitor::SWEEP_INTERVAL,
        janitor::MAX_SEGMENT_AGE,
    ));

    let transcoder = Arc::new(FfmpegTranscoder::from_env(config.crf));
    let state = http::state::AppState {
        library: Arc::clone(&registry),
        segments: SegmentStore::new(config.cache_dir.clone(), transcoder),
    };
    let app = http::build_router(state, &config.static_dir);

    let addr = format!("0.0.0.0:{}", config.port);
    tracing::info!(
        "Serving {} videos on http://{}",
        registry.read().await.len(),
        addr
    );
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .unwrap_or_else(|e| {
            eprintln!("error: failed to bind {}: {}", addr, e);
            std::process::exit(1);
        });

    axum::serve(listener, app)
        .with_graceful_shutdown(wait_for_shutdown())
        .await
        .unwrap_or_else(|e| tracing::error!("HTTP server error: {}", e));

    tracing::info!("Goodbye.");
}
