//! advocate - command-line companion for the disability advocacy data layer.
//!
//! Lists and edits local resources and events, manages favorites, maintains
//! the offline cache, and refreshes content from the remote API.

mod commands;

use std::io;

use anyhow::Result;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use advocate_core::{Config, Services};

/// When set, logs are also written to a daily rolling file in this directory
const LOG_DIR_ENV: &str = "ADVOCATE_LOG_DIR";

const LOG_FILE_PREFIX: &str = "advocate.log";

/// Initialize the tracing subscriber for logging
fn init_tracing() -> Option<WorkerGuard> {
    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug)
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    let (file_layer, guard) = match std::env::var_os(LOG_DIR_ENV) {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, LOG_FILE_PREFIX);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            (
                Some(fmt::layer().with_ansi(false).with_writer(writer)),
                Some(guard),
            )
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(file_layer)
        .with(filter)
        .init();

    guard
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let _log_guard = init_tracing();

    let args: Vec<String> = std::env::args().skip(1).collect();
    if args.is_empty() || args[0] == "--help" || args[0] == "-h" {
        commands::print_usage();
        return Ok(());
    }

    let config = Config::load()?.with_env_overrides();
    let services = Services::new(config)?;
    info!("advocate starting");

    let result = commands::run(&services, &args).await;

    // Best-effort housekeeping on every run.
    services.cache.clear_expired();

    result
}
