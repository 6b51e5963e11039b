//! Declarative field rules for the box-drawn status report.
//!
//! Each rule pairs a matcher (label text or address heuristic) with the
//! snapshot field it fills. Adding a field is a new table row.

use crate::domain::{ServiceState, StatusSnapshot, VmState};
use rust_decimal::Decimal;
use std::str::FromStr;

/// Report section a line belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Section {
    Status,
    Wallet,
    Tasks,
}

impl Section {
    pub const ALL: [Section; 3] = [Section::Status, Section::Wallet, Section::Tasks];

    pub fn name(&self) -> &'static str {
        match self {
            Section::Status => "Status",
            Section::Wallet => "Wallet",
            Section::Tasks => "Tasks",
        }
    }

    /// Recognize a normalized line as a section header
    pub fn from_header(line: &str) -> Option<Section> {
        let candidate = line.trim_end_matches(':').trim();
        Section::ALL
            .into_iter()
            .find(|section| candidate.eq_ignore_ascii_case(section.name()))
    }

    /// Clear the snapshot fields owned by this section
    pub fn reset(&self, snapshot: &mut StatusSnapshot) {
        match self {
            Section::Status => snapshot.service = Default::default(),
            Section::Wallet => snapshot.wallet = Default::default(),
            Section::Tasks => snapshot.tasks = Default::default(),
        }
    }
}

/// How a rule recognizes its line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Matcher {
    /// Case-insensitive label prefix followed by whitespace or end of line
    Label(&'static str),
    /// First token starts with `prefix` and is at least `min_len` characters
    Address { prefix: &'static str, min_len: usize },
}

impl Matcher {
    /// Returns the value portion of the line when it matches
    pub fn extract<'a>(&self, line: &'a str) -> Option<&'a str> {
        match *self {
            Matcher::Label(label) => {
                let head = line.get(..label.len())?;
                if !head.eq_ignore_ascii_case(label) {
                    return None;
                }
                let rest = &line[label.len()..];
                if !rest.is_empty() && !rest.starts_with(char::is_whitespace) {
                    return None;
                }
                Some(rest.trim())
            }
            Matcher::Address { prefix, min_len } => {
                let token = line.split_whitespace().next()?;
                if token.starts_with(prefix) && token.chars().count() >= min_len {
                    Some(token)
                } else {
                    None
                }
            }
        }
    }
}

/// Snapshot field a rule writes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    ServiceStatus,
    Version,
    Commit,
    BuildDate,
    Build,
    NodeName,
    Subnet,
    Vm,
    Driver,
    Address,
    Network,
    TotalBalance,
    OnChainBalance,
    PolygonBalance,
    PendingBalance,
    IssuedBalance,
    ProcessedLastHour,
    InProgress,
    TotalProcessed,
}

impl Field {
    /// Coerce `value` and store it. Returns false (leaving the field
    /// untouched) when the value does not coerce.
    pub fn apply(&self, value: &str, snapshot: &mut StatusSnapshot) -> bool {
        let service = &mut snapshot.service;
        let wallet = &mut snapshot.wallet;
        let tasks = &mut snapshot.tasks;

        match self {
            Field::ServiceStatus => store(&mut service.status, text(value).as_deref().map(ServiceState::from_report)),
            Field::Version => store(&mut service.version, text(value)),
            Field::Commit => store(&mut service.commit, text(value)),
            Field::BuildDate => store(&mut service.build_date, text(value)),
            Field::Build => store(&mut service.build, text(value)),
            Field::NodeName => store(&mut service.node_name, text(value)),
            Field::Subnet => store(&mut service.subnet, text(value)),
            Field::Vm => store(&mut service.vm, text(value).as_deref().map(VmState::from_report)),
            Field::Driver => store(&mut service.driver, text(value)),
            Field::Address => store(&mut wallet.address, text(value)),
            Field::Network => store(&mut wallet.network, text(value)),
            Field::TotalBalance => store(&mut wallet.total_balance, decimal(value)),
            Field::OnChainBalance => store(&mut wallet.on_chain_balance, decimal(value)),
            Field::PolygonBalance => store(&mut wallet.polygon_balance, decimal(value)),
            Field::PendingBalance => store(&mut wallet.pending_balance, decimal(value)),
            Field::IssuedBalance => store(&mut wallet.issued_balance, decimal(value)),
            Field::ProcessedLastHour => store(&mut tasks.processed_last_hour, count(value)),
            Field::InProgress => store(&mut tasks.in_progress, count(value)),
            Field::TotalProcessed => store(&mut tasks.total_processed, count(value)),
        }
    }
}

fn store<T>(slot: &mut Option<T>, value: Option<T>) -> bool {
    match value {
        Some(v) => {
            *slot = Some(v);
            true
        }
        None => false,
    }
}

fn text(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}

/// First token as a non-negative decimal (`"0.5 GLM (0)"` -> 0.5)
fn decimal(value: &str) -> Option<Decimal> {
    let token = value.split_whitespace().next()?.replace(',', "");
    let parsed = Decimal::from_str(&token).ok()?;
    (!parsed.is_sign_negative()).then_some(parsed)
}

/// First token as a task count
fn count(value: &str) -> Option<u64> {
    let token = value.split_whitespace().next()?.replace(',', "");
    token.parse().ok()
}

/// One row of the rule table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldRule {
    pub section: Section,
    pub matcher: Matcher,
    pub field: Field,
}

const fn rule(section: Section, matcher: Matcher, field: Field) -> FieldRule {
    FieldRule {
        section,
        matcher,
        field,
    }
}

/// Rules for the `golemsp status` report, in match order
pub const GOLEM_RULES: &[FieldRule] = &[
    rule(Section::Status, Matcher::Label("Service"), Field::ServiceStatus),
    rule(Section::Status, Matcher::Label("Version"), Field::Version),
    rule(Section::Status, Matcher::Label("Commit"), Field::Commit),
    rule(Section::Status, Matcher::Label("Date"), Field::BuildDate),
    rule(Section::Status, Matcher::Label("Build"), Field::Build),
    rule(Section::Status, Matcher::Label("Node Name"), Field::NodeName),
    rule(Section::Status, Matcher::Label("Subnet"), Field::Subnet),
    rule(Section::Status, Matcher::Label("VM"), Field::Vm),
    rule(Section::Status, Matcher::Label("Driver"), Field::Driver),
    rule(
        Section::Wallet,
        Matcher::Address {
            prefix: "0x",
            min_len: 42,
        },
        Field::Address,
    ),
    rule(Section::Wallet, Matcher::Label("network"), Field::Network),
    rule(Section::Wallet, Matcher::Label("amount (total)"), Field::TotalBalance),
    rule(Section::Wallet, Matcher::Label("(on-chain)"), Field::OnChainBalance),
    rule(Section::Wallet, Matcher::Label("(polygon)"), Field::PolygonBalance),
    rule(Section::Wallet, Matcher::Label("pending"), Field::PendingBalance),
    rule(Section::Wallet, Matcher::Label("issued"), Field::IssuedBalance),
    rule(Section::Tasks, Matcher::Label("last 1h processed"), Field::ProcessedLastHour),
    rule(Section::Tasks, Matcher::Label("last 1h in progress"), Field::InProgress),
    rule(Section::Tasks, Matcher::Label("total processed"), Field::TotalProcessed),
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_requires_word_boundary() {
        let m = Matcher::Label("Build");
        assert_eq!(m.extract("Build      1122"), Some("1122"));
        assert_eq!(m.extract("build 7"), Some("7"));
        assert_eq!(m.extract("Builder   x"), None);
        assert_eq!(m.extract("Build"), Some(""));
    }

    #[test]
    fn test_label_on_multibyte_line() {
        let m = Matcher::Label("VM");
        assert_eq!(m.extract("─x"), None);
    }

    #[test]
    fn test_address_heuristic() {
        let m = Matcher::Address {
            prefix: "0x",
            min_len: 42,
        };
        assert_eq!(
            m.extract("0x34874a4904cad46fab709b57fabef0589a0fd075"),
            Some("0x34874a4904cad46fab709b57fabef0589a0fd075")
        );
        assert_eq!(m.extract("0x1234"), None);
    }

    #[test]
    fn test_section_header() {
        assert_eq!(Section::from_header("Wallet"), Some(Section::Wallet));
        assert_eq!(Section::from_header("tasks:"), Some(Section::Tasks));
        assert_eq!(Section::from_header("Wallet balance"), None);
    }

    #[test]
    fn test_coercion_failure_leaves_field_absent() {
        let mut snapshot = StatusSnapshot::empty(chrono::Utc::now());
        assert!(!Field::TotalBalance.apply("n/a GLM", &mut snapshot));
        assert!(snapshot.wallet.total_balance.is_none());

        assert!(!Field::InProgress.apply("-3", &mut snapshot));
        assert!(snapshot.tasks.in_progress.is_none());

        assert!(Field::PendingBalance.apply("0.25 GLM (3)", &mut snapshot));
        assert_eq!(
            snapshot.wallet.pending_balance,
            Some(Decimal::from_str("0.25").unwrap())
        );
    }

    #[test]
    fn test_service_and_vm_states() {
        let mut snapshot = StatusSnapshot::empty(chrono::Utc::now());
        assert!(Field::ServiceStatus.apply("is not running", &mut snapshot));
        assert_eq!(snapshot.service.status, Some(ServiceState::Stopped));

        assert!(Field::Vm.apply("valid", &mut snapshot));
        assert_eq!(snapshot.service.vm, Some(VmState::Valid));

        assert!(!Field::Vm.apply("   ", &mut snapshot));
        assert_eq!(snapshot.service.vm, Some(VmState::Valid));
    }
}
