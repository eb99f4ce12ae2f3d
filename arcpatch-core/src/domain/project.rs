//! Project configuration
//!
//! Per-project settings persisted in the settings file. A run receives
//! its configuration as an explicit value, mutates the success timestamps
//! and retry list in place, and hands the record back to the store.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

/// Subdirectory of the project root holding the packaging scripts.
pub const TOOLS_DIR: &str = "tools";

/// Script that rebuilds archive units from edited sources.
pub const APPLY_SCRIPT: &str = "rm2_apply.py";

/// Script that injects a single archive file into the master image.
pub const REPLACE_SPECIFIC_SCRIPT: &str = "replace-specific.py";

/// Script that re-injects every packaged file into the master image.
pub const REPLACE_ALL_SCRIPT: &str = "replace-all.py";

/// Subdirectory of the project root holding build outputs.
pub const BUILD_DIR: &str = "build";

/// Path of the patched output tree relative to the project root.
pub const PATCHED_TREE: [&str; 3] = ["3_patched", "PSP_GAME", "USRDIR"];

/// Settings record for one game project
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectConfig {
    /// Project identifier (e.g. "RM2"); keys the settings store.
    pub id: String,

    /// Whether saving edited sources triggers the auto-apply pipeline.
    #[serde(default)]
    pub auto_apply_enabled: bool,

    /// Root of the extracted project tree (holds tools/, build/, 3_patched/).
    pub project_root: PathBuf,

    /// Project-level interpreter; falls back to the global setting.
    #[serde(default)]
    pub interpreter_path: Option<PathBuf>,

    /// Original master image the translated copy is made from.
    #[serde(default)]
    pub image_path: Option<PathBuf>,

    /// Whether to offer reopening the last folder when the project loads.
    #[serde(default = "default_true")]
    pub show_auto_load_message: bool,

    /// Folder last opened for this project.
    #[serde(default)]
    pub last_folder: Option<PathBuf>,

    /// Source basename -> time of the last successful archive build.
    ///
    /// Audit history only; runs never read it back to skip work.
    #[serde(default)]
    pub processed_sources: HashMap<String, DateTime<Utc>>,

    /// Unit name -> time of the last successful image injection.
    #[serde(default)]
    pub processed_units: HashMap<String, DateTime<Utc>>,

    /// Source basenames whose last build failed, kept for a later retry.
    /// Appended to across runs, never cleared automatically.
    #[serde(default)]
    pub retry_sources: Vec<String>,
}

impl ProjectConfig {
    pub fn new(id: impl Into<String>, project_root: impl Into<PathBuf>) -> Self {
        Self {
            id: id.into(),
            auto_apply_enabled: false,
            project_root: project_root.into(),
            interpreter_path: None,
            image_path: None,
            show_auto_load_message: true,
            last_folder: None,
            processed_sources: HashMap::new(),
            processed_units: HashMap::new(),
            retry_sources: Vec::new(),
        }
    }

    pub fn tools_dir(&self) -> PathBuf {
        self.project_root.join(TOOLS_DIR)
    }

    pub fn apply_script(&self) -> PathBuf {
        self.tools_dir().join(APPLY_SCRIPT)
    }

    pub fn replace_specific_script(&self) -> PathBuf {
        self.tools_dir().join(REPLACE_SPECIFIC_SCRIPT)
    }

    pub fn replace_all_script(&self) -> PathBuf {
        self.tools_dir().join(REPLACE_ALL_SCRIPT)
    }

    pub fn build_dir(&self) -> PathBuf {
        self.project_root.join(BUILD_DIR)
    }

    /// Location of the patchable copy of the master image.
    pub fn translated_image_path(&self) -> PathBuf {
        self.build_dir()
            .join(format!("{}_translated.iso", self.id))
    }

    /// Root of the patched output tree rebuilt archives land in.
    pub fn patched_dir(&self) -> PathBuf {
        PATCHED_TREE
            .iter()
            .fold(self.project_root.clone(), |path, segment| {
                path.join(segment)
            })
    }

    /// Records a successful archive build for a source file.
    pub fn mark_source_processed(&mut self, basename: &str, at: DateTime<Utc>) {
        self.processed_sources.insert(basename.to_string(), at);
    }

    /// Records a successful image injection for an archive unit.
    pub fn mark_unit_processed(&mut self, unit: &str, at: DateTime<Utc>) {
        self.processed_units.insert(unit.to_string(), at);
    }

    /// Queues a source for retry; already-queued names are not duplicated.
    pub fn record_failed_source(&mut self, basename: &str) {
        if !self.retry_sources.iter().any(|s| s == basename) {
            self.retry_sources.push(basename.to_string());
        }
    }
}

fn default_true() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_script_paths_derive_from_root() {
        let config = ProjectConfig::new("RM2", "/proj");
        assert_eq!(
            config.apply_script(),
            PathBuf::from("/proj/tools/rm2_apply.py")
        );
        assert_eq!(
            config.replace_specific_script(),
            PathBuf::from("/proj/tools/replace-specific.py")
        );
        assert_eq!(
            config.translated_image_path(),
            PathBuf::from("/proj/build/RM2_translated.iso")
        );
        assert_eq!(
            config.patched_dir(),
            PathBuf::from("/proj/3_patched/PSP_GAME/USRDIR")
        );
    }

    #[test]
    fn test_failed_source_is_recorded_once() {
        let mut config = ProjectConfig::new("RM2", "/proj");
        config.record_failed_source("002.xml");
        config.record_failed_source("002.xml");
        config.record_failed_source("005.xml");
        assert_eq!(config.retry_sources, vec!["002.xml", "005.xml"]);
    }

    #[test]
    fn test_mark_source_processed_overwrites() {
        let mut config = ProjectConfig::new("RM2", "/proj");
        let first = Utc::now();
        let later = first + chrono::Duration::seconds(60);
        config.mark_source_processed("001.xml", first);
        config.mark_source_processed("001.xml", later);
        assert_eq!(config.processed_sources.len(), 1);
        assert_eq!(config.processed_sources["001.xml"], later);
    }
}
