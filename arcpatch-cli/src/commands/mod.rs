//! Commands module
//!
//! Defines all CLI commands and their handlers.

mod apply;
mod image;
mod project;
mod scripts;

pub use project::ProjectCommands;

use anyhow::{Context, Result};
use clap::Subcommand;
use colored::*;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use arcpatch_core::domain::project::ProjectConfig;
use arcpatch_engine::locate::{detect_interpreters, resolve_interpreter};
use arcpatch_engine::store::{JsonSettingsStore, Settings, SettingsStore};

/// Top-level CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Run the auto-apply pipeline over saved source files
    Apply {
        /// Project the files belong to
        #[arg(short, long)]
        project: String,

        /// Saved source files to process, in save order
        files: Vec<PathBuf>,
    },
    /// Rebuild and inject every translated file via the apply script
    ApplyAll {
        /// Project to apply
        #[arg(short, long)]
        project: String,
    },
    /// Re-inject every packaged file into the translated image
    ReplaceAll {
        /// Project to replace files for
        #[arg(short, long)]
        project: String,
    },
    /// Replace the translated image with a fresh copy of the original
    FreshImage {
        /// Project whose image to refresh
        #[arg(short, long)]
        project: String,
    },
    /// Project settings management
    Project {
        #[command(subcommand)]
        command: ProjectCommands,
    },
    /// List Python interpreters found on the PATH
    Interpreters,
}

/// Handle a CLI command
///
/// Routes the command to the appropriate handler module.
pub async fn handle_command(command: Commands, settings_path: &Path) -> Result<()> {
    match command {
        Commands::Apply { project, files } => {
            apply::handle_apply(settings_path, &project, files).await
        }
        Commands::ApplyAll { project } => {
            scripts::handle_apply_all(settings_path, &project).await
        }
        Commands::ReplaceAll { project } => {
            scripts::handle_replace_all(settings_path, &project).await
        }
        Commands::FreshImage { project } => {
            image::handle_fresh_image(settings_path, &project).await
        }
        Commands::Project { command } => {
            project::handle_project_command(command, settings_path).await
        }
        Commands::Interpreters => list_interpreters(),
    }
}

/// Everything a project-scoped command needs: the store, the loaded
/// settings and the project's own record.
pub(crate) struct ProjectContext {
    pub store: Arc<JsonSettingsStore>,
    pub settings: Settings,
    pub config: ProjectConfig,
}

impl ProjectContext {
    pub async fn load(settings_path: &Path, project_id: &str) -> Result<Self> {
        let store = Arc::new(JsonSettingsStore::new(settings_path));
        let settings = store.load().await?;
        let config = settings
            .project(project_id)
            .with_context(|| {
                format!(
                    "No settings recorded for project {}; run 'arcpatch project set' first",
                    project_id
                )
            })?
            .clone();

        Ok(Self {
            store,
            settings,
            config,
        })
    }

    /// Resolves the interpreter the packaging scripts run under.
    pub fn interpreter(&self) -> Result<PathBuf> {
        resolve_interpreter(&self.config, &self.settings).context(
            "No usable interpreter configured; set one with \
             'arcpatch project set --interpreter' or 'arcpatch project global-interpreter'",
        )
    }
}

/// List Python interpreters visible on the PATH
fn list_interpreters() -> Result<()> {
    let found = detect_interpreters()?;

    if found.is_empty() {
        println!("{}", "No Python installations found on the PATH.".yellow());
    } else {
        println!(
            "{}",
            format!("Found {} interpreter(s):", found.len()).bold()
        );
        for path in found {
            println!("  {} {}", "▸".cyan(), path.display());
        }
    }

    Ok(())
}
