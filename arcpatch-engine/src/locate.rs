//! Interpreter discovery
//!
//! Finds the Python interpreter the packaging scripts run under. A
//! project may pin its own interpreter; otherwise the global setting
//! applies. Either must exist on disk to be used.

use std::path::PathBuf;
use std::process::Command;

use anyhow::{Context, Result};
use tracing::debug;

use arcpatch_core::domain::project::ProjectConfig;

use crate::store::Settings;

/// Picks the interpreter for a project: its pinned path first, then the
/// global default. Configured paths that don't exist are passed over.
pub fn resolve_interpreter(config: &ProjectConfig, settings: &Settings) -> Option<PathBuf> {
    [
        config.interpreter_path.as_ref(),
        settings.interpreter_path.as_ref(),
    ]
    .into_iter()
    .flatten()
    .find(|path| path.is_file())
    .cloned()
}

/// Enumerates Python installations visible on the PATH.
///
/// A lookup command that finds nothing is an empty list, not an error;
/// only a missing lookup command itself propagates.
pub fn detect_interpreters() -> Result<Vec<PathBuf>> {
    let output = if cfg!(windows) {
        Command::new("where").arg("python").output()
    } else {
        Command::new("which").args(["-a", "python3", "python"]).output()
    }
    .context("Failed to run the interpreter lookup command")?;

    if !output.status.success() {
        return Ok(Vec::new());
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    let found: Vec<PathBuf> = stdout
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(PathBuf::from)
        .collect();

    debug!("Found {} interpreter(s) on PATH", found.len());
    Ok(found)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_project_interpreter_takes_priority() {
        let dir = tempfile::tempdir().unwrap();
        let project_python = dir.path().join("project-python");
        let global_python = dir.path().join("global-python");
        fs::write(&project_python, b"").unwrap();
        fs::write(&global_python, b"").unwrap();

        let mut config = ProjectConfig::new("RM2", dir.path());
        config.interpreter_path = Some(project_python.clone());
        let settings = Settings {
            interpreter_path: Some(global_python),
            projects: vec![],
        };

        assert_eq!(
            resolve_interpreter(&config, &settings),
            Some(project_python)
        );
    }

    #[test]
    fn test_missing_project_interpreter_falls_back() {
        let dir = tempfile::tempdir().unwrap();
        let global_python = dir.path().join("global-python");
        fs::write(&global_python, b"").unwrap();

        let mut config = ProjectConfig::new("RM2", dir.path());
        config.interpreter_path = Some(dir.path().join("gone-python"));
        let settings = Settings {
            interpreter_path: Some(global_python.clone()),
            projects: vec![],
        };

        assert_eq!(resolve_interpreter(&config, &settings), Some(global_python));
    }

    #[test]
    fn test_no_interpreter_resolves_to_none() {
        let dir = tempfile::tempdir().unwrap();
        let config = ProjectConfig::new("RM2", dir.path());
        let settings = Settings::default();
        assert_eq!(resolve_interpreter(&config, &settings), None);
    }
}
