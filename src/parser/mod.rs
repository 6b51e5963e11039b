//! Status report parser
//!
//! Converts the raw text printed by a platform's status command into a
//! [`StatusSnapshot`]. Parsing never fails: unrecognized lines are skipped
//! and fields whose values do not coerce are left absent.

pub mod rules;

use crate::domain::{ReportFormat, ServiceState, StatusSnapshot};
use chrono::{DateTime, Utc};
use tracing::trace;

pub use rules::{Field, FieldRule, Matcher, Section, GOLEM_RULES};

/// Box-drawing and border characters stripped from both ends of a line
pub const BORDER_CHARS: &[char] = &[
    '│', '┃', '║', '┌', '┐', '└', '┘', '├', '┤', '┬', '┴', '┼', '─', '━', '═', '╔', '╗', '╚',
    '╝', '╠', '╣', '|',
];

/// Strip borders and surrounding whitespace; `None` for lines left blank
pub fn normalize_line(line: &str) -> Option<&str> {
    let stripped = line
        .trim_matches(|c: char| c.is_whitespace() || BORDER_CHARS.contains(&c))
        .trim();
    (!stripped.is_empty()).then_some(stripped)
}

/// Parse output according to the platform's report format
pub fn parse(format: ReportFormat, output: Option<&str>, timestamp: DateTime<Utc>) -> StatusSnapshot {
    match format {
        ReportFormat::BoxReport => parse_report(output, timestamp),
        ReportFormat::ProcessList => parse_process_list(output, timestamp),
    }
}

/// Parse a `golemsp status` style report
pub fn parse_report(output: Option<&str>, timestamp: DateTime<Utc>) -> StatusSnapshot {
    parse_with_rules(output, GOLEM_RULES, timestamp)
}

/// Parse a sectioned report using an explicit rule table
pub fn parse_with_rules(
    output: Option<&str>,
    rules: &[FieldRule],
    timestamp: DateTime<Utc>,
) -> StatusSnapshot {
    let mut snapshot = StatusSnapshot::empty(timestamp);
    let Some(output) = output else {
        return snapshot;
    };

    let mut current: Option<Section> = None;

    for line in output.lines().filter_map(normalize_line) {
        if let Some(section) = Section::from_header(line) {
            // A repeated header replaces what the earlier section reported
            section.reset(&mut snapshot);
            current = Some(section);
            continue;
        }

        let Some(section) = current else {
            continue;
        };

        let matched = rules
            .iter()
            .filter(|rule| rule.section == section)
            .find_map(|rule| rule.matcher.extract(line).map(|value| (rule.field, value)));

        match matched {
            Some((field, value)) => {
                if !field.apply(value, &mut snapshot) {
                    trace!("Dropped unparseable value for {:?}: {:?}", field, value);
                }
            }
            None => trace!("Ignored line in {} section: {:?}", section.name(), line),
        }
    }

    snapshot
}

/// Parse `pgrep -fl` output: any matching process means the worker is running
pub fn parse_process_list(output: Option<&str>, timestamp: DateTime<Utc>) -> StatusSnapshot {
    let mut snapshot = StatusSnapshot::empty(timestamp);
    let Some(output) = output else {
        return snapshot;
    };

    match output.lines().map(str::trim).find(|l| !l.is_empty()) {
        Some(process) => {
            snapshot.service.status = Some(ServiceState::Running);
            snapshot.service.process = Some(process.to_string());
        }
        None => snapshot.service.status = Some(ServiceState::Stopped),
    }

    snapshot
}
