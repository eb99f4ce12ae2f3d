//! Apply command handler
//!
//! Runs the auto-apply pipeline over a batch of saved source files and
//! renders its progress stream on the terminal.

use anyhow::{Context, Result, anyhow};
use colored::*;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use arcpatch_core::domain::event::RunOutcome;
use arcpatch_engine::pipeline::AutoApplyPipeline;
use arcpatch_engine::store::SettingsStore;

use super::ProjectContext;

/// Run the auto-apply pipeline for one batch of saved files
pub async fn handle_apply(
    settings_path: &Path,
    project_id: &str,
    files: Vec<PathBuf>,
) -> Result<()> {
    let ctx = ProjectContext::load(settings_path, project_id).await?;
    let interpreter = ctx.interpreter()?;

    let store: Arc<dyn SettingsStore> = ctx.store.clone();
    let pipeline = AutoApplyPipeline::new(interpreter, &ctx.config, store);

    let mut handle = pipeline.spawn(ctx.config.clone(), files);

    while let Some(update) = handle.progress.recv().await {
        println!(
            "{} {}",
            format!("[{:>3}%]", update.percentage).cyan(),
            update.message
        );
    }

    let outcome = handle.task.await.context("Auto-apply run task panicked")?;

    match outcome {
        RunOutcome::Disabled => {
            println!(
                "{}",
                "Auto-apply is disabled for this project; nothing to do.".yellow()
            );
            Ok(())
        }
        RunOutcome::Completed(completion) if completion.success => {
            println!(
                "{}",
                format!(
                    "✓ Processed {} source file(s), {} archive unit(s) rebuilt",
                    completion.source_count, completion.unit_count
                )
                .green()
                .bold()
            );
            Ok(())
        }
        RunOutcome::Completed(completion) => {
            let message = completion
                .error_message
                .unwrap_or_else(|| "unknown error".to_string());
            println!("{}", format!("✗ Auto-apply failed: {}", message).red());
            Err(anyhow!("auto-apply run failed: {}", message))
        }
    }
}
