pub mod error;
pub mod modules;
pub mod proxy; // Proxy service module
pub mod utils;

use modules::logger;
use tracing::{error, info};

/// Run the proxy until Ctrl+C / SIGTERM.
///
/// Configuration errors (missing `NEOPLE_API_KEY` included) abort before the listener binds.
pub async fn run() -> anyhow::Result<()> {
    // Initialize logger
    logger::init_logger();

    let config = match modules::config::load_proxy_config() {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            return Err(e.into());
        }
    };

    let (server, handle) = proxy::AxumServer::start(&config).await?;

    wait_for_shutdown().await;

    info!("Shutting down...");
    server.stop();
    handle.await.ok();
    info!("Shutdown complete");

    Ok(())
}

async fn wait_for_shutdown() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!("Failed to install signal handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C signal"),
        _ = terminate => info!("Received terminate signal"),
    }
}
