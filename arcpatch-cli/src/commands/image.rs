//! Image command handler
//!
//! Replaces the translated master image with a fresh copy of the
//! original, showing copy progress in coarse steps.

use anyhow::Result;
use colored::*;
use std::path::Path;

use arcpatch_engine::copy::{CopyProgress, force_fresh_image};

use super::ProjectContext;

/// Replace the translated image with a fresh copy of the original
pub async fn handle_fresh_image(settings_path: &Path, project_id: &str) -> Result<()> {
    let ctx = ProjectContext::load(settings_path, project_id).await?;

    let target = force_fresh_image(&ctx.config, print_copy_progress).await?;

    println!(
        "{}",
        format!("✓ Fresh image copy created at {}", target.display())
            .green()
            .bold()
    );
    Ok(())
}

/// Prints copy progress every ten percentage points. The engine already
/// throttles to whole percentage points; this thins it further for the
/// terminal.
pub(crate) fn print_copy_progress(progress: CopyProgress) {
    if progress.percentage % 10 == 0 {
        println!(
            "{} {}% ({} / {} bytes)",
            "Copying image...".dimmed(),
            progress.percentage,
            progress.bytes_copied,
            progress.total_bytes
        );
    }
}
