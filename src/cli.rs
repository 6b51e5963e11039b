use anyhow::Context;
use clap::{Parser, Subcommand};
use chrono::Utc;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::adapters::{CommandStatusSource, LogTransport, TelegramNotifier, Transport};
use crate::config::AppConfig;
use crate::domain::Platform;
use crate::error::Result;
use crate::parser;
use crate::persistence::{RecipientId, SnapshotStore, SubscriberRegistry};
use crate::services::Monitor;

#[derive(Parser)]
#[command(name = "nodewatch")]
#[command(version = "0.1.0")]
#[command(about = "Compute-node status monitor with change notifications", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Config directory (default.toml and <NODEWATCH_ENV>.toml)
    #[arg(short, long, global = true, default_value = "config")]
    pub config: PathBuf,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Poll enabled platforms and notify subscribers until stopped
    Run,
    /// Run a status check now and print the report
    Check {
        /// Platform to check (golem, render, ai_training)
        #[arg(short, long)]
        platform: Option<String>,
    },
    /// Parse a saved status report and print the snapshot as JSON
    Parse {
        /// Report file
        file: PathBuf,
        /// Platform whose report format applies
        #[arg(short, long, default_value = "golem")]
        platform: String,
    },
    /// Subscribe a chat to change notifications
    ///
    /// Writes subscribers.json directly. A `nodewatch run` that is already
    /// running only reads that file at startup and needs a restart to pick
    /// up the change.
    Subscribe {
        /// Chat ID
        #[arg(allow_hyphen_values = true)]
        id: RecipientId,
    },
    /// Remove a chat from change notifications
    ///
    /// Writes subscribers.json directly. A `nodewatch run` that is already
    /// running only reads that file at startup and needs a restart to pick
    /// up the change.
    Unsubscribe {
        /// Chat ID
        #[arg(allow_hyphen_values = true)]
        id: RecipientId,
    },
    /// List subscribed chats
    Subscribers,
}

/// Telegram when a bot token is configured, otherwise log-only
pub fn build_transport(config: &AppConfig) -> Result<Arc<dyn Transport>> {
    match config.telegram.resolved_token() {
        Some(token) => {
            tracing::info!("Telegram notifications enabled");
            Ok(Arc::new(TelegramNotifier::new(token)?))
        }
        None => {
            tracing::warn!("No bot token configured, notifications are only logged");
            Ok(Arc::new(LogTransport))
        }
    }
}

/// Monitor wired to the real command runner and the configured data dir
pub fn build_monitor(
    config: &AppConfig,
    platforms: Vec<Platform>,
    transport: Arc<dyn Transport>,
) -> Monitor {
    let data_dir = &config.storage.data_dir;
    Monitor::new(
        config.monitor.clone(),
        platforms,
        Arc::new(CommandStatusSource::new(config.monitor.check_timeout())),
        transport,
        SnapshotStore::in_dir(data_dir),
        Arc::new(SubscriberRegistry::in_dir(data_dir)),
    )
}

/// On-demand check of one platform, or of every enabled one
pub async fn check(config: &AppConfig, platform: Option<&str>) -> Result<()> {
    let platforms = match platform {
        Some(name) => vec![config.platform(name)?],
        None => config.platforms(),
    };
    if platforms.is_empty() {
        println!("No platforms enabled");
        return Ok(());
    }

    let names: Vec<String> = platforms.iter().map(|p| p.name.clone()).collect();
    let monitor = build_monitor(config, platforms, Arc::new(LogTransport));
    for name in names {
        println!("{}\n", monitor.check_report(&name).await);
    }
    Ok(())
}

/// Parse a saved report into pretty-printed snapshot JSON
pub fn parse_file(config: &AppConfig, file: &Path, platform: &str) -> Result<String> {
    let platform = config.platform(platform)?;
    let output = std::fs::read_to_string(file)
        .with_context(|| format!("failed to read report {}", file.display()))?;
    let snapshot = parser::parse(platform.format, Some(&output), Utc::now());
    Ok(serde_json::to_string_pretty(&snapshot)?)
}

pub async fn subscribe(config: &AppConfig, id: RecipientId) {
    let registry = SubscriberRegistry::in_dir(&config.storage.data_dir);
    if registry.register(id).await {
        println!("✅ {} subscribed to notifications", id);
    } else {
        println!("{} is already subscribed", id);
    }
}

pub async fn unsubscribe(config: &AppConfig, id: RecipientId) {
    let registry = SubscriberRegistry::in_dir(&config.storage.data_dir);
    if registry.unregister(id).await {
        println!("🔕 {} unsubscribed from notifications", id);
    } else {
        println!("{} was not subscribed", id);
    }
}

pub async fn list_subscribers(config: &AppConfig) {
    let registry = SubscriberRegistry::in_dir(&config.storage.data_dir);
    let subscribers = registry.all().await;
    if subscribers.is_empty() {
        println!("No subscribers");
        return;
    }
    for id in subscribers {
        println!("{}", id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::NodewatchError;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_negative_chat_id() {
        let cli = Cli::try_parse_from(["nodewatch", "subscribe", "-1001234"]).unwrap();
        assert!(matches!(cli.command, Commands::Subscribe { id: -1001234 }));
        assert_eq!(cli.config, PathBuf::from("config"));
    }

    #[test]
    fn test_subscription_help_mentions_restart() {
        let cli = Cli::command();
        for name in ["subscribe", "unsubscribe"] {
            let about = cli
                .find_subcommand(name)
                .and_then(|cmd| cmd.get_long_about())
                .map(|text| text.to_string())
                .unwrap_or_default();
            assert!(about.contains("restart"), "{name}: {about}");
        }
    }

    #[test]
    fn test_parse_file_to_json() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("status.txt");
        std::fs::write(
            &file,
            "│ Tasks │\n│ total processed  42 │\n",
        )
        .unwrap();

        let json = parse_file(&AppConfig::default(), &file, "golem").unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["tasks"]["total_processed"], 42);

        assert!(parse_file(&AppConfig::default(), &file, "folding").is_err());
    }

    #[test]
    fn test_parse_missing_file_names_path() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.txt");

        let err = parse_file(&AppConfig::default(), &missing, "golem").unwrap_err();
        assert!(matches!(err, NodewatchError::Other(_)));
        assert!(err.to_string().contains("nope.txt"));
    }

    #[tokio::test]
    async fn test_subscription_commands_persist() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = AppConfig::default();
        config.storage.data_dir = dir.path().to_path_buf();

        subscribe(&config, 7).await;
        subscribe(&config, 7).await;
        subscribe(&config, 8).await;
        unsubscribe(&config, 8).await;

        let registry = SubscriberRegistry::in_dir(dir.path());
        assert_eq!(registry.all().await, vec![7]);
    }
}
