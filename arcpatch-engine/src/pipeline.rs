//! Auto-apply pipeline orchestration
//!
//! Sequences the two phases of a run over a batch of saved sources:
//! rebuild the archive units the sources belong to, then inject each
//! rebuilt unit into the translated master image. Units are processed
//! one at a time in input order; the external tools share the image
//! file, so nothing runs in parallel within a run.
//!
//! Progress flows over a channel and the completion is the value the run
//! resolves to, so a frontend drains updates on its own execution
//! context and there is no ambient "current run".

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use chrono::Utc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use uuid::Uuid;

use arcpatch_core::domain::event::{ProgressUpdate, RunCompletion, RunOutcome};
use arcpatch_core::domain::project::ProjectConfig;
use arcpatch_core::domain::unit::archive_unit_for;

use crate::steps::{ArchiveBuilder, ImageUpdater};
use crate::store::SettingsStore;

/// Auto-apply pipeline for one project
///
/// Holds the two step executors and the settings store the mutated
/// configuration is persisted through. Each call to [`run`] or [`spawn`]
/// is an independent run; no state carries over between runs except what
/// the store persists.
///
/// [`run`]: AutoApplyPipeline::run
/// [`spawn`]: AutoApplyPipeline::spawn
pub struct AutoApplyPipeline {
    builder: ArchiveBuilder,
    updater: ImageUpdater,
    store: Arc<dyn SettingsStore>,
}

/// Handle to a run launched in the background
pub struct RunHandle {
    /// Progress updates in emission order; closes when the run ends.
    pub progress: mpsc::UnboundedReceiver<ProgressUpdate>,
    /// Resolves to the run outcome once both phases finish.
    pub task: JoinHandle<RunOutcome>,
}

impl AutoApplyPipeline {
    /// Creates a pipeline from a project's configuration.
    ///
    /// The interpreter is resolved by the caller (project setting first,
    /// then the global default).
    pub fn new(
        interpreter: PathBuf,
        config: &ProjectConfig,
        store: Arc<dyn SettingsStore>,
    ) -> Self {
        let builder = ArchiveBuilder::new(
            interpreter.clone(),
            config.apply_script(),
            config.project_root.clone(),
        );
        let updater = ImageUpdater::new(interpreter, config.replace_specific_script(), config);

        Self {
            builder,
            updater,
            store,
        }
    }

    /// Launches a run in the background and returns its handle.
    ///
    /// The caller owns marshaling progress onto its own execution
    /// context; the run never touches frontend state.
    pub fn spawn(self, config: ProjectConfig, changeset: Vec<PathBuf>) -> RunHandle {
        let (tx, rx) = mpsc::unbounded_channel();
        let task = tokio::spawn(async move { self.run(config, changeset, tx).await });

        RunHandle { progress: rx, task }
    }

    /// Executes one run to completion.
    ///
    /// When auto-apply is disabled for the project the run terminates
    /// immediately: no events, no processes, no persistence. Otherwise
    /// exactly one completion is produced; an error escaping the
    /// orchestration itself becomes a failed completion and whatever
    /// progress was already reported stands.
    pub async fn run(
        &self,
        mut config: ProjectConfig,
        changeset: Vec<PathBuf>,
        progress: mpsc::UnboundedSender<ProgressUpdate>,
    ) -> RunOutcome {
        if !config.auto_apply_enabled {
            debug!("Auto-apply disabled for project {}, skipping", config.id);
            return RunOutcome::Disabled;
        }

        let run_id = Uuid::new_v4();
        let source_count = changeset.len();
        info!(
            "Starting auto-apply run {} over {} source file(s)",
            run_id, source_count
        );

        let completion = match self.run_phases(&mut config, &changeset, &progress).await {
            Ok(built_units) => {
                info!(
                    "Auto-apply run {} completed: {}/{} unit(s) built",
                    run_id,
                    built_units.len(),
                    source_count
                );
                RunCompletion::succeeded(source_count, built_units.len())
            }
            Err(e) => {
                warn!("Auto-apply run {} aborted: {:#}", run_id, e);
                RunCompletion::failed(format!("{:#}", e))
            }
        };

        RunOutcome::Completed(completion)
    }

    async fn run_phases(
        &self,
        config: &mut ProjectConfig,
        changeset: &[PathBuf],
        progress: &mpsc::UnboundedSender<ProgressUpdate>,
    ) -> anyhow::Result<Vec<String>> {
        let built_units = self.build_archives(config, changeset, progress).await;

        // An empty build list skips the image phase entirely.
        if !built_units.is_empty() {
            self.inject_units(config, &built_units, progress).await;
        }

        self.store
            .save_project(config)
            .await
            .context("Failed to persist project settings after run")?;

        Ok(built_units)
    }

    /// Phase 1: rebuild the archive unit behind every resolvable source.
    ///
    /// Sources with no unit are skipped silently. Build failures queue
    /// the source for retry and the batch continues.
    async fn build_archives(
        &self,
        config: &mut ProjectConfig,
        changeset: &[PathBuf],
        progress: &mpsc::UnboundedSender<ProgressUpdate>,
    ) -> Vec<String> {
        let total = changeset.len();
        emit(
            progress,
            ProgressUpdate::new("Processing source files...", 0, total),
        );

        let mut built_units = Vec::new();

        for (index, source) in changeset.iter().enumerate() {
            let Some(unit) = archive_unit_for(source) else {
                debug!("No archive unit for {:?}, skipping", source);
                continue;
            };

            emit(
                progress,
                ProgressUpdate::new(format!("Building archive: {}", unit), index + 1, total),
            );

            if self.builder.build_unit(&unit).await {
                config.mark_source_processed(&basename(source), Utc::now());
                built_units.push(unit);
            } else {
                config.record_failed_source(&basename(source));
            }
        }

        built_units
    }

    /// Phase 2: inject each rebuilt unit into the master image, in build
    /// order. Failures here are logged and swallowed; only archive
    /// builds feed the retry list.
    async fn inject_units(
        &self,
        config: &mut ProjectConfig,
        built_units: &[String],
        progress: &mpsc::UnboundedSender<ProgressUpdate>,
    ) {
        let total = built_units.len();
        emit(
            progress,
            ProgressUpdate::new("Updating master image...", 0, total),
        );

        for (index, unit) in built_units.iter().enumerate() {
            emit(
                progress,
                ProgressUpdate::new(format!("Injecting: {}", unit), index + 1, total),
            );

            if self.updater.inject_unit(unit).await {
                config.mark_unit_processed(unit, Utc::now());
            }
        }
    }
}

/// Sends an update, ignoring a receiver that has gone away. The run
/// carries on whether or not anyone is listening.
fn emit(progress: &mpsc::UnboundedSender<ProgressUpdate>, update: ProgressUpdate) {
    let _ = progress.send(update);
}

fn basename(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}
