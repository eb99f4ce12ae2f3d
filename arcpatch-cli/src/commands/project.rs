//! Project settings handlers
//!
//! Inspect and edit the per-project records in the settings file, plus
//! the global fallback interpreter.

use anyhow::{Context, Result};
use clap::Subcommand;
use colored::*;
use std::path::{Path, PathBuf};

use arcpatch_core::domain::project::ProjectConfig;
use arcpatch_engine::store::{JsonSettingsStore, SettingsStore};

/// Project subcommands
#[derive(Subcommand)]
pub enum ProjectCommands {
    /// List configured projects
    List,
    /// Show a project's settings
    Show {
        /// Project identifier
        id: String,

        /// Print the raw settings record as JSON
        #[arg(long)]
        json: bool,
    },
    /// Create or update a project's settings
    Set {
        /// Project identifier
        id: String,

        /// Root of the extracted project tree
        #[arg(long)]
        root: Option<PathBuf>,

        /// Original master image file
        #[arg(long)]
        image: Option<PathBuf>,

        /// Project-level Python interpreter
        #[arg(long)]
        interpreter: Option<PathBuf>,

        /// Enable or disable the auto-apply pipeline
        #[arg(long)]
        auto_apply: Option<bool>,
    },
    /// Set the global fallback interpreter
    GlobalInterpreter {
        /// Path to the Python executable
        path: PathBuf,
    },
}

/// Handle project commands
///
/// Routes project subcommands to their respective handlers.
pub async fn handle_project_command(
    command: ProjectCommands,
    settings_path: &Path,
) -> Result<()> {
    let store = JsonSettingsStore::new(settings_path);

    match command {
        ProjectCommands::List => list_projects(&store).await,
        ProjectCommands::Show { id, json } => show_project(&store, &id, json).await,
        ProjectCommands::Set {
            id,
            root,
            image,
            interpreter,
            auto_apply,
        } => set_project(&store, &id, root, image, interpreter, auto_apply).await,
        ProjectCommands::GlobalInterpreter { path } => {
            set_global_interpreter(&store, path).await
        }
    }
}

async fn list_projects(store: &JsonSettingsStore) -> Result<()> {
    let settings = store.load().await?;

    if settings.projects.is_empty() {
        println!("{}", "No projects configured.".yellow());
    } else {
        println!(
            "{}",
            format!("Found {} configured project(s):", settings.projects.len()).bold()
        );
        println!();
        for project in &settings.projects {
            print_project_summary(project);
        }
    }

    Ok(())
}

async fn show_project(store: &JsonSettingsStore, id: &str, json: bool) -> Result<()> {
    let settings = store.load().await?;
    let project = settings
        .project(id)
        .with_context(|| format!("No settings recorded for project {}", id))?;

    if json {
        println!("{}", serde_json::to_string_pretty(project)?);
        return Ok(());
    }

    print_project_summary(project);

    if !project.retry_sources.is_empty() {
        println!("    {}", "Pending retries:".bold());
        for source in &project.retry_sources {
            println!("      {} {}", "▸".yellow(), source);
        }
    }

    Ok(())
}

async fn set_project(
    store: &JsonSettingsStore,
    id: &str,
    root: Option<PathBuf>,
    image: Option<PathBuf>,
    interpreter: Option<PathBuf>,
    auto_apply: Option<bool>,
) -> Result<()> {
    let settings = store.load().await?;

    let mut project = match settings.project(id) {
        Some(existing) => existing.clone(),
        None => {
            let root = root.clone().with_context(|| {
                format!("Project {} does not exist yet; --root is required to create it", id)
            })?;
            ProjectConfig::new(id, root)
        }
    };

    if let Some(root) = root {
        project.project_root = root;
    }
    if let Some(image) = image {
        project.image_path = Some(image);
    }
    if let Some(interpreter) = interpreter {
        project.interpreter_path = Some(interpreter);
    }
    if let Some(auto_apply) = auto_apply {
        project.auto_apply_enabled = auto_apply;
    }

    store.save_project(&project).await?;

    println!("{}", format!("✓ Saved settings for {}", id).green().bold());
    Ok(())
}

async fn set_global_interpreter(store: &JsonSettingsStore, path: PathBuf) -> Result<()> {
    let mut settings = store.load().await?;
    settings.interpreter_path = Some(path.clone());
    store.save(&settings).await?;

    println!(
        "{}",
        format!("✓ Global interpreter set to {}", path.display())
            .green()
            .bold()
    );
    Ok(())
}

/// Print a project summary
fn print_project_summary(project: &ProjectConfig) {
    let auto_apply = if project.auto_apply_enabled {
        "enabled".green()
    } else {
        "disabled".red()
    };

    println!("  {} Project {}", "▸".cyan(), project.id.bold());
    println!("    Root:         {}", project.project_root.display());
    println!(
        "    Image:        {}",
        project
            .image_path
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "not set".to_string())
            .dimmed()
    );
    println!(
        "    Interpreter:  {}",
        project
            .interpreter_path
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "global default".to_string())
            .dimmed()
    );
    println!("    Auto-apply:   {}", auto_apply);
    println!(
        "    History:      {} source(s) built, {} unit(s) injected, {} pending retry",
        project.processed_sources.len(),
        project.processed_units.len(),
        project.retry_sources.len()
    );
    println!();
}
