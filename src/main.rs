use anyhow::Result;
use solstat::Monitor;
use solstat::config::Config;
use solstat::logging::init_logging;
use tracing::{error, info};

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Interrupt received"),
        _ = terminate => info!("Terminate signal received"),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::load().map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))?;
    init_logging(&config.logging)
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;
    config
        .validate()
        .map_err(|e| anyhow::anyhow!("Invalid configuration: {}", e))?;

    info!("Solstat {} starting up", env!("APP_VERSION"));

    let mut monitor = Monitor::from_config(config).map_err(|e| {
        error!("Startup failed: {}", e);
        anyhow::anyhow!("Startup failed: {}", e)
    })?;

    let outcome = tokio::select! {
        res = monitor.run() => res,
        _ = shutdown_signal() => Ok(()),
    };

    monitor.release();

    match outcome {
        Ok(()) => {
            info!("Monitor shutdown complete");
            Ok(())
        }
        Err(e) => {
            error!("Monitor stopped with fatal error: {}", e);
            Err(anyhow::anyhow!("Monitor error: {}", e))
        }
    }
}
