use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Reported state of the node service
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceState {
    Running,
    Stopped,
    Other(String),
}

impl ServiceState {
    /// Interpret a free-form status value ("is running", "is not running", ...)
    pub fn from_report(value: &str) -> Self {
        let lower = value.trim().to_ascii_lowercase();
        if lower.contains("not running") || lower.contains("stopped") {
            ServiceState::Stopped
        } else if lower.contains("running") {
            ServiceState::Running
        } else {
            ServiceState::Other(value.trim().to_string())
        }
    }

    pub fn is_running(&self) -> bool {
        matches!(self, ServiceState::Running)
    }
}

impl fmt::Display for ServiceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServiceState::Running => write!(f, "running"),
            ServiceState::Stopped => write!(f, "stopped"),
            ServiceState::Other(s) => write!(f, "{}", s),
        }
    }
}

/// VM / execution environment flag
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VmState {
    Valid,
    Invalid(String),
    Other(String),
}

impl VmState {
    pub fn from_report(value: &str) -> Self {
        let trimmed = value.trim();
        let lower = trimmed.to_ascii_lowercase();
        if lower.contains("invalid") {
            VmState::Invalid(trimmed.to_string())
        } else if lower == "valid" || lower == "ok" {
            VmState::Valid
        } else {
            VmState::Other(trimmed.to_string())
        }
    }

    pub fn is_valid(&self) -> bool {
        matches!(self, VmState::Valid)
    }
}

impl fmt::Display for VmState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VmState::Valid => write!(f, "valid"),
            VmState::Invalid(s) | VmState::Other(s) => write!(f, "{}", s),
        }
    }
}

/// Service section of a status report
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<ServiceState>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub commit: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub build_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub build: Option<String>,
    /// Node identifier
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subnet: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vm: Option<VmState>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub driver: Option<String>,
    /// Matched worker process (process-probe platforms only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub process: Option<String>,
}

impl ServiceInfo {
    pub fn is_empty(&self) -> bool {
        *self == ServiceInfo::default()
    }
}

/// Wallet section of a status report
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalletInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub network: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_balance: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub on_chain_balance: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub polygon_balance: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pending_balance: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issued_balance: Option<Decimal>,
}

impl WalletInfo {
    pub fn is_empty(&self) -> bool {
        *self == WalletInfo::default()
    }

    /// Shortened address for display (`0x3487…d075`)
    pub fn short_address(&self) -> Option<String> {
        let address = self.address.as_deref()?;
        if address.len() <= 12 || !address.is_ascii() {
            return Some(address.to_string());
        }
        Some(format!(
            "{}…{}",
            &address[..6],
            &address[address.len() - 4..]
        ))
    }
}

/// Task counters section of a status report
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskCounters {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub processed_last_hour: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub in_progress: Option<u64>,
    /// Total processed, including failures
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_processed: Option<u64>,
}

impl TaskCounters {
    pub fn is_empty(&self) -> bool {
        *self == TaskCounters::default()
    }
}

/// One parsed, timestamped view of a platform's status
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusSnapshot {
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub service: ServiceInfo,
    #[serde(default)]
    pub wallet: WalletInfo,
    #[serde(default)]
    pub tasks: TaskCounters,
}

impl StatusSnapshot {
    /// Snapshot with no recognized fields
    pub fn empty(timestamp: DateTime<Utc>) -> Self {
        Self {
            timestamp,
            service: ServiceInfo::default(),
            wallet: WalletInfo::default(),
            tasks: TaskCounters::default(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.service.is_empty() && self.wallet.is_empty() && self.tasks.is_empty()
    }
}
