use clap::Parser;
use nodewatch::cli::{self, Cli, Commands};
use nodewatch::config::AppConfig;
use nodewatch::error::Result;
use std::sync::Arc;
use tokio::signal;
use tokio::sync::watch;
use tracing::{error, info};

mod main_runtime;

use main_runtime::{init_logging, init_logging_simple};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = AppConfig::load_from(&cli.config)?;
    config.validate()?;

    match &cli.command {
        Commands::Run => {
            init_logging(&config.logging);
            run_monitor(config).await?;
        }
        Commands::Check { platform } => {
            init_logging_simple();
            cli::check(&config, platform.as_deref()).await?;
        }
        Commands::Parse { file, platform } => {
            init_logging_simple();
            println!("{}", cli::parse_file(&config, file, platform)?);
        }
        Commands::Subscribe { id } => {
            init_logging_simple();
            cli::subscribe(&config, *id).await;
        }
        Commands::Unsubscribe { id } => {
            init_logging_simple();
            cli::unsubscribe(&config, *id).await;
        }
        Commands::Subscribers => {
            init_logging_simple();
            cli::list_subscribers(&config).await;
        }
    }

    Ok(())
}

/// Run the scheduler until Ctrl-C or SIGTERM
async fn run_monitor(config: AppConfig) -> Result<()> {
    let platforms = config.platforms();
    if platforms.is_empty() {
        info!("No platforms enabled, nothing to monitor");
        return Ok(());
    }

    info!(
        "Starting nodewatch: platforms [{}], data dir {}",
        platforms
            .iter()
            .map(|p| p.name.as_str())
            .collect::<Vec<_>>()
            .join(", "),
        config.storage.data_dir.display()
    );

    let transport = cli::build_transport(&config)?;
    let monitor = Arc::new(cli::build_monitor(&config, platforms, transport));
    info!(
        "{} subscriber(s) registered",
        monitor.subscribers().len().await
    );

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let handle = monitor.clone().start(shutdown_rx);

    shutdown_signal().await;
    info!("Shutdown signal received, finishing current cycle");
    let _ = shutdown_tx.send(true);

    if let Err(e) = handle.await {
        error!("Monitor task failed: {}", e);
    }
    info!("Shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => error!("Failed to install SIGTERM handler: {}", e),
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
