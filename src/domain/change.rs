use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A notification-worthy change between two snapshots
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
    NewJobs,
    CompletedJobs,
    PaymentReceived,
}

impl ChangeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChangeKind::NewJobs => "new_jobs",
            ChangeKind::CompletedJobs => "completed_jobs",
            ChangeKind::PaymentReceived => "payment_received",
        }
    }
}

impl fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Diff between the current and previous snapshot of one platform.
///
/// `Default` is the zero change set: no flags, no magnitudes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeSet {
    pub new_jobs: bool,
    pub completed_jobs: bool,
    pub payment_received: bool,
    /// Signed balance difference (current - previous)
    pub wallet_balance_delta: Decimal,
    pub new_job_count: u64,
    pub completed_job_count: u64,
}

impl ChangeSet {
    /// True if any flag is set
    pub fn any(&self) -> bool {
        self.new_jobs || self.completed_jobs || self.payment_received
    }

    /// Triggered flags in notification order
    pub fn triggered(&self) -> Vec<ChangeKind> {
        let mut kinds = Vec::with_capacity(3);
        if self.new_jobs {
            kinds.push(ChangeKind::NewJobs);
        }
        if self.completed_jobs {
            kinds.push(ChangeKind::CompletedJobs);
        }
        if self.payment_received {
            kinds.push(ChangeKind::PaymentReceived);
        }
        kinds
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_change_set() {
        let changes = ChangeSet::default();
        assert!(!changes.any());
        assert!(changes.triggered().is_empty());
        assert_eq!(changes.wallet_balance_delta, Decimal::ZERO);
    }

    #[test]
    fn test_triggered_order() {
        let changes = ChangeSet {
            payment_received: true,
            new_jobs: true,
            ..Default::default()
        };
        assert_eq!(
            changes.triggered(),
            vec![ChangeKind::NewJobs, ChangeKind::PaymentReceived]
        );
    }
}
