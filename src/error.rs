use thiserror::Error;

/// Main error type for the node monitor
#[derive(Error, Debug)]
pub enum NodewatchError {
    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Unknown platform: {0}")]
    UnknownPlatform(String),

    // External status check errors
    #[error("Status check failed for {platform}: {reason}")]
    StatusCheck { platform: String, reason: String },

    #[error("Status check for {platform} timed out after {secs} seconds")]
    Timeout { platform: String, secs: u64 },

    // Notification errors
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Delivery to {recipient} failed: {reason}")]
    Delivery { recipient: i64, reason: String },

    // Serialization errors
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

impl NodewatchError {
    /// True for failures of the external status check (spawn, exit code, timeout)
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            NodewatchError::StatusCheck { .. } | NodewatchError::Timeout { .. }
        )
    }
}

/// Result type alias for NodewatchError
pub type Result<T> = std::result::Result<T, NodewatchError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_classification() {
        let timeout = NodewatchError::Timeout {
            platform: "golem".to_string(),
            secs: 30,
        };
        assert!(timeout.is_transient());
        assert!(timeout.to_string().contains("30 seconds"));

        let unknown = NodewatchError::UnknownPlatform("nope".to_string());
        assert!(!unknown.is_transient());
    }
}
