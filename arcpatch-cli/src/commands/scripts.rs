//! Maintenance script handlers
//!
//! Drives the long-running apply and replace-all scripts, echoing their
//! output as it streams in.

use anyhow::{Result, anyhow};
use colored::*;
use std::path::Path;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use arcpatch_core::domain::log::{OutputLine, OutputStream};
use arcpatch_engine::script;

use super::ProjectContext;
use super::image::print_copy_progress;

/// Rebuild and inject every translated file
pub async fn handle_apply_all(settings_path: &Path, project_id: &str) -> Result<()> {
    let ctx = ProjectContext::load(settings_path, project_id).await?;
    let interpreter = ctx.interpreter()?;

    let (tx, rx) = mpsc::unbounded_channel();
    let printer = spawn_printer(rx);

    let code = script::apply_all(&interpreter, &ctx.config, tx).await?;
    let _ = printer.await;

    finish("Apply", code)
}

/// Re-inject every packaged file into the translated image, creating
/// the image first when it is missing
pub async fn handle_replace_all(settings_path: &Path, project_id: &str) -> Result<()> {
    let ctx = ProjectContext::load(settings_path, project_id).await?;
    let interpreter = ctx.interpreter()?;

    let (tx, rx) = mpsc::unbounded_channel();
    let printer = spawn_printer(rx);

    let code = script::replace_all(&interpreter, &ctx.config, tx, print_copy_progress).await?;
    let _ = printer.await;

    finish("Replace-all", code)
}

/// Echoes streamed script output until the channel closes
fn spawn_printer(mut rx: mpsc::UnboundedReceiver<OutputLine>) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(line) = rx.recv().await {
            match line.stream {
                OutputStream::Stdout => println!("{}", line.text),
                OutputStream::Stderr => eprintln!("{}", line.text.red()),
            }
        }
    })
}

fn finish(operation: &str, code: i32) -> Result<()> {
    if code == 0 {
        println!(
            "{}",
            format!("✓ {} completed successfully", operation).green().bold()
        );
        Ok(())
    } else {
        Err(anyhow!("{} script exited with code {}", operation, code))
    }
}
