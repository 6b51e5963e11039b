//! Capabilities the monitor consumes from the outside world
//!
//! The scheduler only talks to these traits, so tests can swap in fakes for
//! the status command, the message transport and the clock.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::Platform;
use crate::error::Result;
use crate::persistence::RecipientId;

// ============================================================================
// Status Source
// ============================================================================

/// Runs a platform's external status check
#[async_trait]
pub trait StatusSource: Send + Sync {
    /// Raw status output on success. Failures (missing binary, rejected
    /// exit code, timeout) come back as errors and are never fatal.
    async fn run_status_check(&self, platform: &Platform) -> Result<String>;
}

// ============================================================================
// Transport
// ============================================================================

/// Delivers one message to one recipient
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Transport: Send + Sync {
    async fn deliver(&self, recipient: RecipientId, message: &str) -> Result<()>;
}

// ============================================================================
// Clock
// ============================================================================

/// Source of snapshot and footer timestamps
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
