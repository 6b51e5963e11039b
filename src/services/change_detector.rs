//! Snapshot change detection
//!
//! Only growth is notification-worthy: task counts or balances that go down
//! never raise a flag.

use crate::domain::{ChangeSet, StatusSnapshot};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

/// Balance deltas at or below this are treated as noise
pub const BALANCE_EPSILON: Decimal = dec!(0.001);

/// Compare `current` with the previous snapshot of the same platform.
///
/// With no previous snapshot the zero change set is returned, so the first
/// poll after a cold start never notifies. Fields are compared only when
/// both snapshots carry them.
pub fn detect(current: &StatusSnapshot, previous: Option<&StatusSnapshot>) -> ChangeSet {
    let Some(previous) = previous else {
        return ChangeSet::default();
    };

    let mut changes = ChangeSet::default();

    if let (Some(now), Some(before)) = (current.tasks.in_progress, previous.tasks.in_progress) {
        if now > before {
            changes.new_jobs = true;
            changes.new_job_count = now - before;
        }
    }

    if let (Some(now), Some(before)) = (
        current.tasks.total_processed,
        previous.tasks.total_processed,
    ) {
        if now > before {
            changes.completed_jobs = true;
            changes.completed_job_count = now - before;
        }
    }

    if let (Some(now), Some(before)) = (
        current.wallet.total_balance,
        previous.wallet.total_balance,
    ) {
        let delta = now - before;
        changes.wallet_balance_delta = delta;
        changes.payment_received = delta > BALANCE_EPSILON;
    }

    changes
}
