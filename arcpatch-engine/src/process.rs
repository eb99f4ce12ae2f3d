//! External tool invocation
//!
//! Runs the packaging scripts as child processes with a hard deadline.
//! Outcomes are values, not errors: a missing interpreter, a non-zero
//! exit and an overrun deadline all surface as a failed [`ToolOutcome`],
//! so one bad invocation never aborts a batch.

use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tokio::time;
use tracing::{debug, warn};

/// Description of one external tool invocation
#[derive(Debug, Clone)]
pub struct ToolCommand {
    pub program: PathBuf,
    pub args: Vec<String>,
    pub working_dir: PathBuf,
    pub timeout: Duration,
}

/// How an invocation ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolStatus {
    /// The process exited on its own with this code.
    Exited(i32),
    /// The deadline elapsed and the process was killed.
    TimedOut,
    /// The process could not be started at all.
    LaunchFailed(String),
}

/// Captured result of one invocation
#[derive(Debug, Clone)]
pub struct ToolOutcome {
    pub status: ToolStatus,
    pub stdout: String,
    pub stderr: String,
}

impl ToolOutcome {
    /// True only for a clean exit within the deadline.
    pub fn success(&self) -> bool {
        matches!(self.status, ToolStatus::Exited(0))
    }

    fn launch_failed(reason: String) -> Self {
        Self {
            status: ToolStatus::LaunchFailed(reason),
            stdout: String::new(),
            stderr: String::new(),
        }
    }

    fn timed_out() -> Self {
        Self {
            status: ToolStatus::TimedOut,
            stdout: String::new(),
            stderr: String::new(),
        }
    }
}

/// Runs a tool to completion, or kills it at the deadline.
///
/// Stdout and stderr are captured for diagnostics and logged at debug
/// level whatever the outcome.
pub async fn run_tool(command: &ToolCommand) -> ToolOutcome {
    debug!(
        "Running tool: {:?} {:?} (cwd: {:?}, timeout: {:?})",
        command.program, command.args, command.working_dir, command.timeout
    );

    let child = Command::new(&command.program)
        .args(&command.args)
        .current_dir(&command.working_dir)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn();

    let child = match child {
        Ok(child) => child,
        Err(e) => {
            warn!("Failed to start {:?}: {}", command.program, e);
            return ToolOutcome::launch_failed(e.to_string());
        }
    };

    let output = match time::timeout(command.timeout, child.wait_with_output()).await {
        Ok(Ok(output)) => output,
        Ok(Err(e)) => {
            warn!(
                "Failed to collect output from {:?}: {}",
                command.program, e
            );
            return ToolOutcome::launch_failed(e.to_string());
        }
        Err(_) => {
            // Dropping the in-flight wait kills the child (kill_on_drop).
            warn!(
                "Tool {:?} exceeded its {:?} deadline, killed",
                command.program, command.timeout
            );
            return ToolOutcome::timed_out();
        }
    };

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let exit_code = output.status.code().unwrap_or(1);

    if !stdout.trim().is_empty() {
        debug!("tool stdout: {}", stdout.trim());
    }
    if !stderr.trim().is_empty() {
        debug!("tool stderr: {}", stderr.trim());
    }

    if !output.status.success() {
        debug!(
            "Tool {:?} failed with exit code {}",
            command.program, exit_code
        );
    }

    ToolOutcome {
        status: ToolStatus::Exited(exit_code),
        stdout,
        stderr,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sh(script: &str, timeout: Duration) -> ToolCommand {
        ToolCommand {
            program: PathBuf::from("/bin/sh"),
            args: vec!["-c".to_string(), script.to_string()],
            working_dir: std::env::temp_dir(),
            timeout,
        }
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_clean_exit_is_success() {
        let outcome = run_tool(&sh("exit 0", Duration::from_secs(5))).await;
        assert_eq!(outcome.status, ToolStatus::Exited(0));
        assert!(outcome.success());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_nonzero_exit_is_failure() {
        let outcome = run_tool(&sh("exit 3", Duration::from_secs(5))).await;
        assert_eq!(outcome.status, ToolStatus::Exited(3));
        assert!(!outcome.success());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_output_is_captured() {
        let outcome = run_tool(&sh("echo out; echo err >&2", Duration::from_secs(5))).await;
        assert!(outcome.success());
        assert!(outcome.stdout.contains("out"));
        assert!(outcome.stderr.contains("err"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_overrunning_tool_is_killed() {
        let started = std::time::Instant::now();
        let outcome = run_tool(&sh("sleep 5", Duration::from_millis(200))).await;
        assert_eq!(outcome.status, ToolStatus::TimedOut);
        assert!(!outcome.success());
        assert!(started.elapsed() < Duration::from_secs(4));
    }

    #[tokio::test]
    async fn test_missing_program_is_launch_failure() {
        let command = ToolCommand {
            program: PathBuf::from("/definitely/not/a/real/program"),
            args: vec![],
            working_dir: std::env::temp_dir(),
            timeout: Duration::from_secs(5),
        };
        let outcome = run_tool(&command).await;
        assert!(matches!(outcome.status, ToolStatus::LaunchFailed(_)));
        assert!(!outcome.success());
    }
}
