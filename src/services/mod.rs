pub mod change_detector;
pub mod format;
pub mod monitor;

pub use change_detector::{detect, BALANCE_EPSILON};
pub use format::{format_change, format_check_error, format_snapshot};
pub use monitor::{CycleReport, Monitor, PlatformFailure, PlatformOutcome};
