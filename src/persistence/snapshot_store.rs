//! Last-known snapshot per platform, persisted to `<data_dir>/state.json`.

use super::json_file::{load_json, save_json, Loaded};
use crate::domain::StatusSnapshot;
use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Current on-disk layout version
pub const STATE_VERSION: u32 = 1;

fn current_version() -> u32 {
    STATE_VERSION
}

/// Combined persisted state: one snapshot per platform key
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistedState {
    #[serde(default = "current_version")]
    pub version: u32,
    #[serde(default)]
    pub platforms: BTreeMap<String, StatusSnapshot>,
}

impl Default for PersistedState {
    fn default() -> Self {
        Self {
            version: STATE_VERSION,
            platforms: BTreeMap::new(),
        }
    }
}

impl PersistedState {
    pub fn get(&self, platform: &str) -> Option<&StatusSnapshot> {
        self.platforms.get(platform)
    }

    /// Replace the stored snapshot, returning the previous one
    pub fn insert(&mut self, platform: &str, snapshot: StatusSnapshot) -> Option<StatusSnapshot> {
        self.platforms.insert(platform.to_string(), snapshot)
    }

    pub fn is_empty(&self) -> bool {
        self.platforms.is_empty()
    }
}

/// File-backed store for [`PersistedState`]
#[derive(Debug, Clone)]
pub struct SnapshotStore {
    path: PathBuf,
}

impl SnapshotStore {
    pub const FILE_NAME: &'static str = "state.json";

    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store at `<data_dir>/state.json`
    pub fn in_dir(data_dir: &Path) -> Self {
        Self::new(data_dir.join(Self::FILE_NAME))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load persisted state. Missing or malformed files degrade to empty
    /// state; this never fails.
    pub fn load(&self) -> PersistedState {
        match load_json::<PersistedState>(&self.path) {
            Loaded::Found(state) => {
                if state.version > STATE_VERSION {
                    warn!(
                        "State file {} has newer version {} (supported: {}), loading anyway",
                        self.path.display(),
                        state.version,
                        STATE_VERSION
                    );
                }
                info!(
                    "Loaded prior state for {} platform(s) from {}",
                    state.platforms.len(),
                    self.path.display()
                );
                state
            }
            Loaded::Missing => {
                debug!("No state file at {}, starting fresh", self.path.display());
                PersistedState::default()
            }
            Loaded::Invalid(reason) => {
                warn!(
                    "Ignoring unreadable state file {}: {}",
                    self.path.display(),
                    reason
                );
                PersistedState::default()
            }
        }
    }

    /// Write state to disk. Callers log failures; in-memory state stays
    /// authoritative.
    pub fn save(&self, state: &PersistedState) -> Result<()> {
        save_json(&self.path, state)?;
        debug!("Persisted state to {}", self.path.display());
        Ok(())
    }

    /// [`save`](Self::save) on the blocking pool
    pub async fn persist(&self, state: PersistedState) -> Result<()> {
        let store = self.clone();
        tokio::task::spawn_blocking(move || store.save(&state))
            .await
            .map_err(anyhow::Error::from)?
    }
}
