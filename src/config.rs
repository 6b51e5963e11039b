use crate::domain::{CommandSpec, Platform};
use crate::error::{NodewatchError, Result};
use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Main configuration structure
#[derive(Debug, Clone, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub monitor: MonitorConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub telegram: TelegramConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub platforms: PlatformsConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MonitorConfig {
    /// Master switch for background polling
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Seconds between poll cycles
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,
    /// Timeout for one external status check
    #[serde(default = "default_check_timeout")]
    pub check_timeout_secs: u64,
    /// Pause between successive notification deliveries
    #[serde(default = "default_delivery_delay")]
    pub delivery_delay_ms: u64,
}

fn default_true() -> bool {
    true
}

fn default_poll_interval() -> u64 {
    300
}

fn default_check_timeout() -> u64 {
    30
}

fn default_delivery_delay() -> u64 {
    100
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            poll_interval_secs: default_poll_interval(),
            check_timeout_secs: default_check_timeout(),
            delivery_delay_ms: default_delivery_delay(),
        }
    }
}

impl MonitorConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn check_timeout(&self) -> Duration {
        Duration::from_secs(self.check_timeout_secs)
    }

    pub fn delivery_delay(&self) -> Duration {
        Duration::from_millis(self.delivery_delay_ms)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Directory holding state.json and subscribers.json
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("data")
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct TelegramConfig {
    /// Bot token; falls back to the BOT_TOKEN environment variable
    #[serde(default)]
    pub bot_token: Option<String>,
}

impl TelegramConfig {
    /// Configured token, else `BOT_TOKEN`. Blank values count as unset.
    pub fn resolved_token(&self) -> Option<String> {
        resolve_token(self.bot_token.as_deref(), std::env::var("BOT_TOKEN").ok())
    }
}

fn resolve_token(configured: Option<&str>, env: Option<String>) -> Option<String> {
    let present = |token: &String| !token.trim().is_empty();
    configured
        .map(str::to_string)
        .filter(present)
        .or_else(|| env.filter(present))
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Enable JSON formatted logs
    #[serde(default)]
    pub json: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

/// Per-platform switch and optional command override
#[derive(Debug, Clone, Deserialize, Default)]
pub struct PlatformConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub program: Option<String>,
    #[serde(default)]
    pub args: Option<Vec<String>>,
    #[serde(default)]
    pub accept_exit_codes: Option<Vec<i32>>,
}

impl PlatformConfig {
    fn enabled() -> Self {
        Self {
            enabled: true,
            ..Default::default()
        }
    }

    /// Built-in command with any configured overrides applied
    fn command(&self, builtin: &CommandSpec) -> CommandSpec {
        CommandSpec {
            program: self
                .program
                .clone()
                .unwrap_or_else(|| builtin.program.clone()),
            args: self.args.clone().unwrap_or_else(|| builtin.args.clone()),
            accept_exit_codes: self
                .accept_exit_codes
                .clone()
                .unwrap_or_else(|| builtin.accept_exit_codes.clone()),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct PlatformsConfig {
    #[serde(default = "PlatformConfig::enabled")]
    pub golem: PlatformConfig,
    #[serde(default)]
    pub render: PlatformConfig,
    #[serde(default)]
    pub ai_training: PlatformConfig,
}

impl Default for PlatformsConfig {
    fn default() -> Self {
        Self {
            golem: PlatformConfig::enabled(),
            render: PlatformConfig::default(),
            ai_training: PlatformConfig::default(),
        }
    }
}

impl PlatformsConfig {
    fn get(&self, name: &str) -> Option<&PlatformConfig> {
        match name {
            Platform::GOLEM => Some(&self.golem),
            Platform::RENDER => Some(&self.render),
            Platform::AI_TRAINING => Some(&self.ai_training),
            _ => None,
        }
    }

    /// Built-in platforms paired with their settings, in polling order
    fn entries(&self) -> impl Iterator<Item = (Platform, &PlatformConfig)> + '_ {
        Platform::BUILTIN
            .iter()
            .filter_map(move |name| Some((Platform::builtin(name)?, self.get(name)?)))
    }

    fn resolve(platform: Platform, cfg: &PlatformConfig) -> Platform {
        let command = cfg.command(&platform.command);
        platform.with_command(command)
    }
}

impl AppConfig {
    /// Load configuration from files and environment
    pub fn load() -> std::result::Result<Self, ConfigError> {
        Self::load_from("config")
    }

    /// Load configuration from a specific directory
    pub fn load_from<P: AsRef<Path>>(config_dir: P) -> std::result::Result<Self, ConfigError> {
        let config_dir = config_dir.as_ref();

        let builder = Config::builder()
            // Start with default values
            .set_default("monitor.enabled", true)?
            .set_default("monitor.poll_interval_secs", default_poll_interval())?
            .set_default("monitor.check_timeout_secs", default_check_timeout())?
            .set_default("monitor.delivery_delay_ms", default_delivery_delay())?
            .set_default("storage.data_dir", "data")?
            .set_default("logging.level", "info")?
            .set_default("logging.json", false)?
            .set_default("platforms.golem.enabled", true)?
            .set_default("platforms.render.enabled", false)?
            .set_default("platforms.ai_training.enabled", false)?
            // Load default config file
            .add_source(File::from(config_dir.join("default.toml")).required(false))
            // Load environment-specific config (e.g., config/production.toml)
            .add_source(
                File::from(config_dir.join(
                    std::env::var("NODEWATCH_ENV").unwrap_or_else(|_| "development".to_string()),
                ))
                .required(false),
            )
            // Override with environment variables (NODEWATCH_MONITOR__POLL_INTERVAL_SECS, etc.)
            .add_source(
                Environment::with_prefix("NODEWATCH")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            );

        builder.build()?.try_deserialize()
    }

    /// Reject settings the monitor cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.monitor.poll_interval_secs == 0 {
            return Err(NodewatchError::InvalidConfig(
                "monitor.poll_interval_secs must be a positive integer".to_string(),
            ));
        }
        if self.monitor.check_timeout_secs == 0 {
            return Err(NodewatchError::InvalidConfig(
                "monitor.check_timeout_secs must be a positive integer".to_string(),
            ));
        }
        for (platform, cfg) in self.platforms.entries() {
            if cfg.program.as_deref().is_some_and(|p| p.trim().is_empty()) {
                return Err(NodewatchError::InvalidConfig(format!(
                    "platforms.{}.program must not be empty",
                    platform.name
                )));
            }
        }
        Ok(())
    }

    /// All known platforms with configured command overrides applied
    pub fn all_platforms(&self) -> Vec<Platform> {
        self.platforms
            .entries()
            .map(|(platform, cfg)| PlatformsConfig::resolve(platform, cfg))
            .collect()
    }

    /// Platforms enabled for monitoring, in polling order
    pub fn platforms(&self) -> Vec<Platform> {
        self.platforms
            .entries()
            .filter(|(_, cfg)| cfg.enabled)
            .map(|(platform, cfg)| PlatformsConfig::resolve(platform, cfg))
            .collect()
    }

    /// Look up a known platform by key, enabled or not
    pub fn platform(&self, name: &str) -> Result<Platform> {
        let unknown = || NodewatchError::UnknownPlatform(name.to_string());
        let platform = Platform::builtin(name).ok_or_else(unknown)?;
        let cfg = self.platforms.get(name).ok_or_else(unknown)?;
        Ok(PlatformsConfig::resolve(platform, cfg))
    }
}
