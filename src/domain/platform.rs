use serde::{Deserialize, Serialize};
use std::fmt;

/// Layout of a platform's status output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportFormat {
    /// Box-drawn report with Status / Wallet / Tasks sections (`golemsp status`)
    BoxReport,
    /// `pgrep -fl` output: one matching process per line
    ProcessList,
}

impl fmt::Display for ReportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReportFormat::BoxReport => write!(f, "box_report"),
            ReportFormat::ProcessList => write!(f, "process_list"),
        }
    }
}

/// External command that produces a platform's status output
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandSpec {
    pub program: String,
    #[serde(default)]
    pub args: Vec<String>,
    /// Exit codes treated as a successful check
    #[serde(default = "default_accept_exit_codes")]
    pub accept_exit_codes: Vec<i32>,
}

fn default_accept_exit_codes() -> Vec<i32> {
    vec![0]
}

impl CommandSpec {
    pub fn new(program: &str, args: &[&str]) -> Self {
        Self {
            program: program.to_string(),
            args: args.iter().map(|a| a.to_string()).collect(),
            accept_exit_codes: default_accept_exit_codes(),
        }
    }

    pub fn accepting(mut self, codes: &[i32]) -> Self {
        self.accept_exit_codes = codes.to_vec();
        self
    }

    pub fn accepts(&self, code: i32) -> bool {
        self.accept_exit_codes.contains(&code)
    }
}

impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}

/// One independently monitored compute-marketplace source
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Platform {
    /// Stable key used in persisted state
    pub name: String,
    pub display_name: String,
    pub format: ReportFormat,
    pub command: CommandSpec,
    /// Currency unit for wallet balances
    pub unit: Option<String>,
}

impl Platform {
    pub const GOLEM: &'static str = "golem";
    pub const RENDER: &'static str = "render";
    pub const AI_TRAINING: &'static str = "ai_training";

    /// Keys of the built-in platforms, in polling order
    pub const BUILTIN: [&'static str; 3] = [Self::GOLEM, Self::RENDER, Self::AI_TRAINING];

    /// The primary provider node, reported by `golemsp status`
    pub fn golem() -> Self {
        Self {
            name: Self::GOLEM.to_string(),
            display_name: "GolemSP".to_string(),
            format: ReportFormat::BoxReport,
            command: CommandSpec::new("golemsp", &["status"]),
            unit: Some("GLM".to_string()),
        }
    }

    /// Render Network worker, detected by process probe
    pub fn render() -> Self {
        Self {
            name: Self::RENDER.to_string(),
            display_name: "Render Network".to_string(),
            format: ReportFormat::ProcessList,
            command: CommandSpec::new("pgrep", &["-fl", "render"]).accepting(&[0, 1]),
            unit: Some("RENDER".to_string()),
        }
    }

    /// Together.ai / Akash inference workers, detected by process probe
    pub fn ai_training() -> Self {
        Self {
            name: Self::AI_TRAINING.to_string(),
            display_name: "AI Training".to_string(),
            format: ReportFormat::ProcessList,
            command: CommandSpec::new("pgrep", &["-fl", "together|akash|ai-training|inference"])
                .accepting(&[0, 1]),
            unit: None,
        }
    }

    /// Built-in platform by key
    pub fn builtin(name: &str) -> Option<Self> {
        match name {
            Self::GOLEM => Some(Self::golem()),
            Self::RENDER => Some(Self::render()),
            Self::AI_TRAINING => Some(Self::ai_training()),
            _ => None,
        }
    }

    pub fn with_command(mut self, command: CommandSpec) -> Self {
        self.command = command;
        self
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}
