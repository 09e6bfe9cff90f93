/// Main module for the linkpulse link checking service
///
/// This module serves as the entry point for the application: it wires up
/// logging, configuration, the durable store and the task service, then
/// waits for a termination signal before shutting the workers down.
use clap::Parser;
use linkpulse::config::{self, Config};
use linkpulse::logger;
use linkpulse::service::TaskService;
use linkpulse::store::Store;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::signal::unix::{SignalKind, signal};

/// Define command line arguments using clap
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Path to the configuration file
    #[arg(short, long, value_name = "FILE", env = "LINKPULSE_CONFIG")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() {
    let _logger = logger::init();

    let cli = Cli::parse();
    if let Some(path) = &cli.config {
        if let Err(e) = Config::init(path) {
            eprintln!("Failed to initialize configuration: {:?}", e);
            std::process::exit(1);
        }
    }
    let config = config::instance();

    let store = Arc::new(Store::open(&config.store.data_dir));
    let service = TaskService::new(store, config);

    let mut sigint_stream = signal(SignalKind::interrupt()).expect("watch SIGINT failed");
    let mut sigterm_stream = signal(SignalKind::terminate()).expect("watch SIGTERM failed");
    tokio::select! {
        _ = sigint_stream.recv() => {
            tracing::info!("SIGINT received, shutdown initiated...");
        }
        _ = sigterm_stream.recv() => {
            tracing::info!("SIGTERM received, shutdown initiated...");
        }
    }

    service.shutdown().await;
    tracing::info!("Shutdown complete");
}
