//! Subscriber registry persisted to `<data_dir>/subscribers.json`.

use super::json_file::{load_json, save_json, Loaded};
use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, warn};

/// Recipient identifier (a chat id)
pub type RecipientId = i64;

/// On-disk format for the subscribers file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct SubscriberFile {
    #[serde(default)]
    subscribers: Vec<RecipientId>,
}

/// Set of recipients opted in to change notifications.
///
/// Every mutation is persisted immediately. A failed write is logged and the
/// in-memory set remains authoritative.
pub struct SubscriberRegistry {
    path: PathBuf,
    subscribers: RwLock<HashSet<RecipientId>>,
    /// Serializes file writes; readers never wait on disk
    writer: Mutex<()>,
}

impl SubscriberRegistry {
    pub const FILE_NAME: &'static str = "subscribers.json";

    /// Load the registry from `path`, degrading to empty on missing or
    /// malformed files.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let subscribers: HashSet<RecipientId> = match load_json::<SubscriberFile>(&path) {
            Loaded::Found(file) => file.subscribers.into_iter().collect(),
            Loaded::Missing => {
                debug!("No subscribers file at {}", path.display());
                HashSet::new()
            }
            Loaded::Invalid(reason) => {
                warn!(
                    "Ignoring unreadable subscribers file {}: {}",
                    path.display(),
                    reason
                );
                HashSet::new()
            }
        };

        info!("Loaded {} subscriber(s)", subscribers.len());
        Self {
            path,
            subscribers: RwLock::new(subscribers),
            writer: Mutex::new(()),
        }
    }

    /// Registry at `<data_dir>/subscribers.json`
    pub fn in_dir(data_dir: &Path) -> Self {
        Self::open(data_dir.join(Self::FILE_NAME))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Add a recipient. Returns true if it was not already registered.
    pub async fn register(&self, id: RecipientId) -> bool {
        let _writer = self.writer.lock().await;
        let file = {
            let mut subscribers = self.subscribers.write().await;
            if !subscribers.insert(id) {
                return false;
            }
            SubscriberFile::from_set(&subscribers)
        };
        info!("Subscriber {} registered", id);
        self.persist(file).await;
        true
    }

    /// Remove a recipient. Returns true if it was registered.
    pub async fn unregister(&self, id: RecipientId) -> bool {
        let _writer = self.writer.lock().await;
        let file = {
            let mut subscribers = self.subscribers.write().await;
            if !subscribers.remove(&id) {
                return false;
            }
            SubscriberFile::from_set(&subscribers)
        };
        info!("Subscriber {} unregistered", id);
        self.persist(file).await;
        true
    }

    pub async fn is_registered(&self, id: RecipientId) -> bool {
        self.subscribers.read().await.contains(&id)
    }

    /// All recipients, sorted
    pub async fn all(&self) -> Vec<RecipientId> {
        let subscribers = self.subscribers.read().await;
        sorted(&subscribers)
    }

    pub async fn len(&self) -> usize {
        self.subscribers.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.subscribers.read().await.is_empty()
    }

    /// Caller holds `writer`
    async fn persist(&self, file: SubscriberFile) {
        if let Err(e) = self.try_persist(file).await {
            warn!(
                "Failed to persist subscribers to {}: {}",
                self.path.display(),
                e
            );
        }
    }

    async fn try_persist(&self, file: SubscriberFile) -> Result<()> {
        let path = self.path.clone();
        tokio::task::spawn_blocking(move || save_json(&path, &file))
            .await
            .map_err(anyhow::Error::from)?
    }
}

impl SubscriberFile {
    fn from_set(set: &HashSet<RecipientId>) -> Self {
        Self {
            subscribers: sorted(set),
        }
    }
}

fn sorted(set: &HashSet<RecipientId>) -> Vec<RecipientId> {
    let mut ids: Vec<RecipientId> = set.iter().copied().collect();
    ids.sort_unstable();
    ids
}
