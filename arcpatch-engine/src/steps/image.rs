//! Image update step
//!
//! Locates a rebuilt archive file under the patched output tree and
//! injects it into the translated master image via the replace script.

use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, warn};

use arcpatch_core::domain::project::ProjectConfig;
use arcpatch_core::domain::unit::CATEGORY_MARKERS;

use crate::process::{ToolCommand, run_tool};

/// Deadline for injecting one archive into the master image. Longer than
/// the build deadline: the tool scans the whole image to patch in place.
pub const IMAGE_TIMEOUT: Duration = Duration::from_secs(60);

/// Injects rebuilt archive units into the master image
#[derive(Debug, Clone)]
pub struct ImageUpdater {
    interpreter: PathBuf,
    script: PathBuf,
    project_root: PathBuf,
    patched_dir: PathBuf,
    timeout: Duration,
}

impl ImageUpdater {
    pub fn new(interpreter: PathBuf, script: PathBuf, config: &ProjectConfig) -> Self {
        Self {
            interpreter,
            script,
            project_root: config.project_root.clone(),
            patched_dir: config.patched_dir(),
            timeout: IMAGE_TIMEOUT,
        }
    }

    /// Overrides the injection deadline.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Finds the on-disk file for a unit. Candidate directories are
    /// checked in category order; the first match wins and later
    /// directories are not consulted.
    pub fn locate_unit(&self, unit: &str) -> Option<PathBuf> {
        CATEGORY_MARKERS
            .iter()
            .map(|category| self.patched_dir.join(category).join(unit))
            .find(|path| path.is_file())
    }

    /// Injects one unit into the image. A unit with no on-disk file
    /// fails immediately without launching the tool.
    pub async fn inject_unit(&self, unit: &str) -> bool {
        let Some(archive_path) = self.locate_unit(unit) else {
            warn!("No rebuilt file found for unit {}", unit);
            return false;
        };

        let command = ToolCommand {
            program: self.interpreter.clone(),
            args: vec![
                self.script.display().to_string(),
                archive_path.display().to_string(),
            ],
            working_dir: self.project_root.clone(),
            timeout: self.timeout,
        };

        let outcome = run_tool(&command).await;
        if outcome.success() {
            debug!("Injected {} into the master image", unit);
        } else {
            warn!("Image update failed for {}: {:?}", unit, outcome.status);
        }
        outcome.success()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn updater(root: &std::path::Path) -> ImageUpdater {
        let config = ProjectConfig::new("RM2", root);
        ImageUpdater::new(
            PathBuf::from("/usr/bin/python3"),
            config.replace_specific_script(),
            &config,
        )
    }

    #[test]
    fn test_first_candidate_directory_wins() {
        let dir = tempfile::tempdir().unwrap();
        let patched = dir.path().join("3_patched/PSP_GAME/USRDIR");
        fs::create_dir_all(patched.join("facechat")).unwrap();
        fs::create_dir_all(patched.join("npc")).unwrap();
        fs::write(patched.join("facechat/001.arc"), b"a").unwrap();
        fs::write(patched.join("npc/001.arc"), b"b").unwrap();

        let found = updater(dir.path()).locate_unit("001.arc").unwrap();
        assert_eq!(found, patched.join("facechat/001.arc"));
    }

    #[test]
    fn test_second_candidate_directory_is_fallback() {
        let dir = tempfile::tempdir().unwrap();
        let patched = dir.path().join("3_patched/PSP_GAME/USRDIR");
        fs::create_dir_all(patched.join("npc")).unwrap();
        fs::write(patched.join("npc/002.arc"), b"b").unwrap();

        let found = updater(dir.path()).locate_unit("002.arc").unwrap();
        assert_eq!(found, patched.join("npc/002.arc"));
    }

    #[test]
    fn test_missing_unit_is_not_located() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(updater(dir.path()).locate_unit("003.arc"), None);
    }
}
