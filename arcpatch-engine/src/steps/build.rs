//! Archive build step
//!
//! Regenerates one archive unit from its edited sources by invoking the
//! apply script with a unit selector, never a full rebuild.

use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, warn};

use crate::process::{ToolCommand, run_tool};

/// Deadline for rebuilding a single archive unit.
pub const BUILD_TIMEOUT: Duration = Duration::from_secs(30);

/// Rebuilds individual archive units via the apply script
#[derive(Debug, Clone)]
pub struct ArchiveBuilder {
    interpreter: PathBuf,
    script: PathBuf,
    project_root: PathBuf,
    timeout: Duration,
}

impl ArchiveBuilder {
    pub fn new(interpreter: PathBuf, script: PathBuf, project_root: PathBuf) -> Self {
        Self {
            interpreter,
            script,
            project_root,
            timeout: BUILD_TIMEOUT,
        }
    }

    /// Overrides the build deadline.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Rebuilds one unit. True only when the tool exits cleanly in time;
    /// launch failures and timeouts count as ordinary failures.
    pub async fn build_unit(&self, unit: &str) -> bool {
        let command = ToolCommand {
            program: self.interpreter.clone(),
            args: vec![
                self.script.display().to_string(),
                "--only".to_string(),
                unit.to_string(),
            ],
            working_dir: self.project_root.clone(),
            timeout: self.timeout,
        };

        let outcome = run_tool(&command).await;
        if outcome.success() {
            debug!("Rebuilt archive unit {}", unit);
        } else {
            warn!("Archive build failed for {}: {:?}", unit, outcome.status);
        }
        outcome.success()
    }
}
