//! Status checks via subprocess
//!
//! Runs the platform's configured command with a timeout, the same way for
//! `golemsp status` and for `pgrep` process probes.

use crate::adapters::StatusSource;
use crate::domain::Platform;
use crate::error::{NodewatchError, Result};
use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tokio::time::timeout;
use tracing::{debug, warn};

/// Install locations searched when a program is not on PATH
const FALLBACK_DIRS: &[&str] = &["/usr/local/bin", "/usr/bin", "/opt/golemsp/bin"];

/// Status source backed by external commands
#[derive(Debug, Clone)]
pub struct CommandStatusSource {
    timeout: Duration,
}

impl CommandStatusSource {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

impl Default for CommandStatusSource {
    fn default() -> Self {
        Self::new(Duration::from_secs(30))
    }
}

#[async_trait]
impl StatusSource for CommandStatusSource {
    async fn run_status_check(&self, platform: &Platform) -> Result<String> {
        let spec = &platform.command;
        let program = locate_program(&spec.program).ok_or_else(|| NodewatchError::StatusCheck {
            platform: platform.name.clone(),
            reason: format!("{} command not found; is it installed and on PATH?", spec.program),
        })?;

        debug!("Running status check for {}: {}", platform.name, spec);

        let mut cmd = Command::new(&program);
        cmd.args(&spec.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let output = match timeout(self.timeout, cmd.output()).await {
            Err(_) => {
                warn!(
                    "Status check for {} timed out after {:?}",
                    platform.name, self.timeout
                );
                return Err(NodewatchError::Timeout {
                    platform: platform.name.clone(),
                    secs: self.timeout.as_secs(),
                });
            }
            Ok(Err(e)) => {
                return Err(NodewatchError::StatusCheck {
                    platform: platform.name.clone(),
                    reason: spawn_failure_reason(&program, &e),
                });
            }
            Ok(Ok(output)) => output,
        };

        match output.status.code() {
            Some(code) if spec.accepts(code) => {
                Ok(String::from_utf8_lossy(&output.stdout).into_owned())
            }
            code => {
                let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
                let reason = if stderr.is_empty() {
                    match code {
                        Some(code) => format!("command exited with status {}", code),
                        None => "command terminated by signal".to_string(),
                    }
                } else {
                    stderr
                };
                Err(NodewatchError::StatusCheck {
                    platform: platform.name.clone(),
                    reason,
                })
            }
        }
    }
}

/// Resolve a program name to an executable path.
///
/// Names containing a path separator are used as given. Bare names are
/// looked up on PATH, then in the usual install locations.
pub fn locate_program(program: &str) -> Option<PathBuf> {
    if program.contains(std::path::MAIN_SEPARATOR) {
        let path = PathBuf::from(program);
        return path.is_file().then_some(path);
    }

    let path_dirs = std::env::var_os("PATH")
        .map(|paths| std::env::split_paths(&paths).collect::<Vec<_>>())
        .unwrap_or_default();

    let home_bin = std::env::var_os("HOME").map(|home| Path::new(&home).join(".local/bin"));

    path_dirs
        .into_iter()
        .chain(FALLBACK_DIRS.iter().map(|dir| PathBuf::from(*dir)))
        .chain(home_bin)
        .map(|dir| dir.join(program))
        .find(|candidate| candidate.is_file())
}

fn spawn_failure_reason(program: &Path, err: &std::io::Error) -> String {
    match err.kind() {
        ErrorKind::NotFound => format!("{} not found", program.display()),
        ErrorKind::PermissionDenied => {
            if is_executable(program) {
                format!(
                    "permission denied executing {}; check file ownership and permissions",
                    program.display()
                )
            } else {
                format!(
                    "{} is not executable; run: chmod +x {}",
                    program.display(),
                    program.display()
                )
            }
        }
        _ => format!("error executing {}: {}", program.display(), err),
    }
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    std::fs::metadata(path)
        .map(|m| m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}
