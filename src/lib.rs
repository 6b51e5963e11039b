pub mod adapters;
pub mod cli;
pub mod config;
pub mod domain;
pub mod error;
pub mod parser;
pub mod persistence;
pub mod services;

pub use config::AppConfig;
pub use domain::{ChangeKind, ChangeSet, MonitorPhase, Platform, ReportFormat, StatusSnapshot};
pub use error::{NodewatchError, Result};
pub use persistence::{PersistedState, SnapshotStore, SubscriberRegistry};
pub use services::{CycleReport, Monitor};
