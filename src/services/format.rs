//! Human-readable status reports and change notifications (Telegram Markdown)

use crate::domain::{ChangeKind, ChangeSet, Platform, ReportFormat, StatusSnapshot};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S UTC";

fn footer(at: DateTime<Utc>) -> String {
    format!("\n🕒 Last updated: `{}`", at.format(TIME_FORMAT))
}

fn amount(value: Decimal, unit: Option<&str>) -> String {
    let value = value.normalize();
    match unit {
        Some(unit) => format!("{} {}", value, unit),
        None => value.to_string(),
    }
}

fn signed_amount(value: Decimal, unit: Option<&str>) -> String {
    if value.is_sign_negative() {
        amount(value, unit)
    } else {
        format!("+{}", amount(value, unit))
    }
}

fn line(parts: &mut Vec<String>, label: &str, value: Option<String>) {
    if let Some(value) = value {
        parts.push(format!("• {}: `{}`", label, value));
    }
}

/// Full on-demand report for one platform
pub fn format_snapshot(platform: &Platform, snapshot: &StatusSnapshot) -> String {
    let body = match platform.format {
        ReportFormat::BoxReport => {
            let sections: Vec<String> = [
                format_status_section(snapshot),
                format_wallet_section(platform, snapshot),
                format_tasks_section(snapshot),
            ]
            .into_iter()
            .flatten()
            .collect();

            if sections.is_empty() {
                "No status information found in the report.".to_string()
            } else {
                sections.join("\n\n")
            }
        }
        ReportFormat::ProcessList => format_worker_section(snapshot),
    };

    format!(
        "📊 *{} Status*\n\n{}\n{}",
        platform.display_name,
        body,
        footer(snapshot.timestamp)
    )
}

/// Service section, or `None` when the report had none
pub fn format_status_section(snapshot: &StatusSnapshot) -> Option<String> {
    let service = &snapshot.service;
    if service.is_empty() {
        return None;
    }

    let mut parts = vec!["🔧 *Service Status*".to_string()];
    if let Some(status) = &service.status {
        let emoji = if status.is_running() { "🟢" } else { "🔴" };
        parts.push(format!("• Service: {} {}", emoji, status));
    }
    line(&mut parts, "Version", service.version.clone());
    line(&mut parts, "Commit", service.commit.clone());
    line(&mut parts, "Date", service.build_date.clone());
    line(&mut parts, "Build", service.build.clone());
    line(&mut parts, "Node Name", service.node_name.clone());
    line(&mut parts, "Subnet", service.subnet.clone());
    if let Some(vm) = &service.vm {
        let emoji = if vm.is_valid() { "✅" } else { "⚠️" };
        parts.push(format!("• VM: {} {}", emoji, vm));
    }
    line(&mut parts, "Driver", service.driver.clone());
    Some(parts.join("\n"))
}

/// Wallet section, or `None` when the report had none
pub fn format_wallet_section(platform: &Platform, snapshot: &StatusSnapshot) -> Option<String> {
    let wallet = &snapshot.wallet;
    if wallet.is_empty() {
        return None;
    }
    let unit = platform.unit.as_deref();

    let mut parts = vec!["💰 *Wallet*".to_string()];
    line(&mut parts, "Address", wallet.short_address());
    line(&mut parts, "Network", wallet.network.clone());
    line(&mut parts, "Total", wallet.total_balance.map(|v| amount(v, unit)));
    line(&mut parts, "On-chain", wallet.on_chain_balance.map(|v| amount(v, unit)));
    line(&mut parts, "Polygon", wallet.polygon_balance.map(|v| amount(v, unit)));
    line(&mut parts, "Pending", wallet.pending_balance.map(|v| amount(v, unit)));
    line(&mut parts, "Issued", wallet.issued_balance.map(|v| amount(v, unit)));
    Some(parts.join("\n"))
}

/// Task section, or `None` when the report had none
pub fn format_tasks_section(snapshot: &StatusSnapshot) -> Option<String> {
    let tasks = &snapshot.tasks;
    if tasks.is_empty() {
        return None;
    }

    let mut parts = vec!["📋 *Tasks*".to_string()];
    line(
        &mut parts,
        "Processed (last 1h)",
        tasks.processed_last_hour.map(|v| v.to_string()),
    );
    line(
        &mut parts,
        "In progress (last 1h)",
        tasks.in_progress.map(|v| v.to_string()),
    );
    line(
        &mut parts,
        "Total processed",
        tasks.total_processed.map(|v| v.to_string()),
    );
    Some(parts.join("\n"))
}

fn format_worker_section(snapshot: &StatusSnapshot) -> String {
    let service = &snapshot.service;
    let mut parts = Vec::new();
    match &service.status {
        Some(status) => {
            let emoji = if status.is_running() { "🟢" } else { "🔴" };
            parts.push(format!("• Worker Status: {} {}", emoji, status));
        }
        None => parts.push("• Worker Status: unknown".to_string()),
    }
    line(&mut parts, "Process", service.process.clone());
    parts.join("\n")
}

/// Notification for one triggered change
pub fn format_change(
    platform: &Platform,
    kind: ChangeKind,
    changes: &ChangeSet,
    snapshot: &StatusSnapshot,
    now: DateTime<Utc>,
) -> String {
    let unit = platform.unit.as_deref();
    let name = &platform.display_name;

    let body = match kind {
        ChangeKind::NewJobs => {
            let mut text = format!(
                "🆕 *New jobs on {}*\n\n• Started: `+{}`",
                name, changes.new_job_count
            );
            if let Some(in_progress) = snapshot.tasks.in_progress {
                text.push_str(&format!("\n• In progress: `{}`", in_progress));
            }
            text
        }
        ChangeKind::CompletedJobs => {
            let mut text = format!(
                "✅ *Jobs completed on {}*\n\n• Completed: `+{}`",
                name, changes.completed_job_count
            );
            if let Some(total) = snapshot.tasks.total_processed {
                text.push_str(&format!("\n• Total processed: `{}`", total));
            }
            text
        }
        ChangeKind::PaymentReceived => {
            let mut text = format!(
                "💰 *Payment received on {}*\n\n• Amount: `{}`",
                name,
                signed_amount(changes.wallet_balance_delta, unit)
            );
            if let Some(total) = snapshot.wallet.total_balance {
                text.push_str(&format!("\n• Balance: `{}`", amount(total, unit)));
            }
            text
        }
    };

    format!("{}\n{}", body, footer(now))
}

/// Reply for a failed on-demand check
pub fn format_check_error(platform: &Platform, error: &str) -> String {
    format!(
        "❌ Error checking {} status:\n\n`{}`",
        platform.display_name, error
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ServiceState;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;

    fn ts() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 10, 5, 8, 30, 0).unwrap()
    }

    #[test]
    fn test_format_full_snapshot() {
        let mut snapshot = StatusSnapshot::empty(ts());
        snapshot.service.status = Some(ServiceState::Running);
        snapshot.service.version = Some("0.17.6".to_string());
        snapshot.wallet.address = Some("0x34874a4904cad46fab709b57fabef0589a0fd075".to_string());
        snapshot.wallet.total_balance = Some(dec!(12.50));
        snapshot.tasks.total_processed = Some(117);

        let text = format_snapshot(&Platform::golem(), &snapshot);
        assert!(text.starts_with("📊 *GolemSP Status*"));
        assert!(text.contains("• Service: 🟢 running"));
        assert!(text.contains("• Version: `0.17.6`"));
        assert!(text.contains("• Address: `0x3487…d075`"));
        assert!(text.contains("• Total: `12.5 GLM`"));
        assert!(text.contains("• Total processed: `117`"));
        assert!(text.contains("2025-10-05 08:30:00 UTC"));
        assert!(!text.contains("Pending"));
    }

    #[test]
    fn test_format_empty_report() {
        let text = format_snapshot(&Platform::golem(), &StatusSnapshot::empty(ts()));
        assert!(text.contains("No status information found"));
    }

    #[test]
    fn test_format_worker() {
        let mut snapshot = StatusSnapshot::empty(ts());
        snapshot.service.status = Some(ServiceState::Stopped);
        let text = format_snapshot(&Platform::render(), &snapshot);
        assert!(text.contains("*Render Network Status*"));
        assert!(text.contains("• Worker Status: 🔴 stopped"));
    }

    #[test]
    fn test_format_payment() {
        let mut snapshot = StatusSnapshot::empty(ts());
        snapshot.wallet.total_balance = Some(dec!(10.5));
        let changes = ChangeSet {
            payment_received: true,
            wallet_balance_delta: dec!(0.5),
            ..Default::default()
        };

        let text = format_change(
            &Platform::golem(),
            ChangeKind::PaymentReceived,
            &changes,
            &snapshot,
            ts(),
        );
        assert!(text.contains("*Payment received on GolemSP*"));
        assert!(text.contains("`+0.5 GLM`"));
        assert!(text.contains("• Balance: `10.5 GLM`"));
        assert!(text.ends_with("`2025-10-05 08:30:00 UTC`"));
    }

    #[test]
    fn test_format_jobs() {
        let mut snapshot = StatusSnapshot::empty(ts());
        snapshot.tasks.in_progress = Some(2);
        let changes = ChangeSet {
            new_jobs: true,
            new_job_count: 2,
            ..Default::default()
        };
        let text = format_change(&Platform::golem(), ChangeKind::NewJobs, &changes, &snapshot, ts());
        assert!(text.contains("• Started: `+2`"));
        assert!(text.contains("• In progress: `2`"));
    }

    #[test]
    fn test_format_check_error() {
        let text = format_check_error(&Platform::golem(), "golemsp not found");
        assert_eq!(
            text,
            "❌ Error checking GolemSP status:\n\n`golemsp not found`"
        );
    }
}
