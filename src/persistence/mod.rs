//! Persistence Layer for State Management and Recovery
//!
//! File-backed JSON documents that survive restarts:
//! - Snapshot store for the last snapshot of each platform
//! - Subscriber registry for notification recipients
//!
//! Both degrade to empty state when the file is missing or malformed.

pub mod json_file;
pub mod snapshot_store;
pub mod subscribers;

pub use snapshot_store::{PersistedState, SnapshotStore, STATE_VERSION};
pub use subscribers::{RecipientId, SubscriberRegistry};
