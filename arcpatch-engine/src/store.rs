//! Settings persistence
//!
//! The settings file holds the global interpreter location plus one
//! record per project. The store is injected into the pipeline as a
//! trait object, so runs never reach for ambient state.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Mutex;
use thiserror::Error;
use tracing::debug;

use arcpatch_core::domain::project::ProjectConfig;

/// Result type alias for store operations
pub type Result<T> = std::result::Result<T, StoreError>;

/// Errors that can occur while loading or saving settings
#[derive(Debug, Error)]
pub enum StoreError {
    /// Reading or writing the settings file failed
    #[error("settings file I/O failed: {0}")]
    Io(#[from] std::io::Error),

    /// The settings file exists but is not valid JSON
    #[error("settings file is not valid JSON: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// Application settings: global defaults plus per-project records
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Settings {
    /// Fallback interpreter used when a project doesn't pin one.
    #[serde(default)]
    pub interpreter_path: Option<PathBuf>,

    /// Per-project configuration records.
    #[serde(default)]
    pub projects: Vec<ProjectConfig>,
}

impl Settings {
    pub fn project(&self, id: &str) -> Option<&ProjectConfig> {
        self.projects.iter().find(|p| p.id == id)
    }

    pub fn project_mut(&mut self, id: &str) -> Option<&mut ProjectConfig> {
        self.projects.iter_mut().find(|p| p.id == id)
    }

    /// Inserts a project record, replacing any existing record with the
    /// same id.
    pub fn upsert_project(&mut self, config: ProjectConfig) {
        match self.project_mut(&config.id) {
            Some(existing) => *existing = config,
            None => self.projects.push(config),
        }
    }
}

/// Load/save interface the pipeline persists through
#[async_trait]
pub trait SettingsStore: Send + Sync {
    /// Loads the full settings document.
    async fn load(&self) -> Result<Settings>;

    /// Persists the full settings document.
    async fn save(&self, settings: &Settings) -> Result<()>;

    /// Persists one project record without disturbing the rest.
    async fn save_project(&self, config: &ProjectConfig) -> Result<()> {
        let mut settings = self.load().await?;
        settings.upsert_project(config.clone());
        self.save(&settings).await
    }
}

/// Settings store backed by a JSON file
///
/// A missing file reads as default settings, so first launch needs no
/// setup step.
pub struct JsonSettingsStore {
    path: PathBuf,
}

impl JsonSettingsStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl SettingsStore for JsonSettingsStore {
    async fn load(&self) -> Result<Settings> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No settings file at {:?}, using defaults", self.path);
                Ok(Settings::default())
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn save(&self, settings: &Settings) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
        let json = serde_json::to_vec_pretty(settings)?;
        tokio::fs::write(&self.path, json).await?;
        debug!("Saved settings to {:?}", self.path);
        Ok(())
    }
}

/// In-memory settings store for tests
#[derive(Default)]
pub struct InMemorySettingsStore {
    settings: Mutex<Settings>,
}

impl InMemorySettingsStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_settings(settings: Settings) -> Self {
        Self {
            settings: Mutex::new(settings),
        }
    }
}

#[async_trait]
impl SettingsStore for InMemorySettingsStore {
    async fn load(&self) -> Result<Settings> {
        Ok(self.settings.lock().unwrap().clone())
    }

    async fn save(&self, settings: &Settings) -> Result<()> {
        *self.settings.lock().unwrap() = settings.clone();
        Ok(())
    }
}
