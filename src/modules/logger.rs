use std::fs;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

pub const LOG_DIR_ENV: &str = "DNF_PROXY_LOG_DIR";

/// Log directory from `DNF_PROXY_LOG_DIR`, created if missing. `None` means console only.
pub fn get_log_dir() -> Result<Option<PathBuf>, String> {
    let log_dir = match std::env::var(LOG_DIR_ENV) {
        Ok(dir) if !dir.is_empty() => PathBuf::from(dir),
        _ => return Ok(None),
    };

    if !log_dir.exists() {
        fs::create_dir_all(&log_dir)
            .map_err(|e| format!("Failed to create log directory: {}", e))?;
    }

    Ok(Some(log_dir))
}

/// Initialize logger system
pub fn init_logger() {
    // Capture log macro logs (reqwest, hyper)
    let _ = tracing_log::LogTracer::init();

    // 1. Console output layer
    let console_layer = fmt::Layer::new()
        .with_target(false)
        .with_thread_ids(false)
        .with_level(true);

    // 2. Optional file layer, daily rolling, no ANSI
    let file_layer = match get_log_dir() {
        Ok(Some(dir)) => {
            let file_appender = tracing_appender::rolling::daily(dir, "dnf-proxy.log");
            let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
            // Guard must outlive the process for the writer thread to keep flushing
            std::mem::forget(guard);
            Some(
                fmt::Layer::new()
                    .with_writer(non_blocking)
                    .with_ansi(false)
                    .with_target(true)
                    .with_level(true),
            )
        }
        Ok(None) => None,
        Err(e) => {
            eprintln!("Failed to initialize log directory: {}", e);
            None
        }
    };

    // 3. Filter layer (default to INFO and above)
    let filter_layer = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    // try_init: tests and embedders may already own a global subscriber
    let _ = tracing_subscriber::registry()
        .with(filter_layer)
        .with(console_layer)
        .with(file_layer)
        .try_init();

    info!("Logger system initialized");
}
