//! Streaming script execution
//!
//! The long-running maintenance scripts (full apply, replace-all) run
//! with no deadline; their output is forwarded line by line over a
//! channel so a frontend can show it as it happens.

use std::path::Path;
use std::process::Stdio;

use anyhow::{Context, Result};
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use arcpatch_core::domain::log::{OutputLine, OutputStream};
use arcpatch_core::domain::project::ProjectConfig;

use crate::copy::{CopyProgress, ensure_translated_image};

/// Target selector the full apply run passes to the apply script.
const APPLY_ALL_ARGS: [&str; 2] = ["--target", "both"];

/// Runs a script to completion, forwarding every output line.
///
/// Returns the exit code. Unlike the pipeline steps there is no
/// deadline: these scripts legitimately run for minutes, and the caller
/// watches the stream instead.
pub async fn run_streaming(
    interpreter: &Path,
    script: &Path,
    args: &[String],
    working_dir: &Path,
    lines: UnboundedSender<OutputLine>,
) -> Result<i32> {
    info!("Running script {:?} {:?}", script, args);

    let mut child = Command::new(interpreter)
        .arg(script)
        .args(args)
        .current_dir(working_dir)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .with_context(|| format!("Failed to start {}", script.display()))?;

    let stdout = child.stdout.take().context("Child stdout was not piped")?;
    let stderr = child.stderr.take().context("Child stderr was not piped")?;

    let out_task = forward_lines(stdout, OutputStream::Stdout, lines.clone());
    let err_task = forward_lines(stderr, OutputStream::Stderr, lines);

    let status = child
        .wait()
        .await
        .with_context(|| format!("Failed to wait for {}", script.display()))?;

    // Both pipes are closed once the child exits; drain what's left.
    let _ = out_task.await;
    let _ = err_task.await;

    let code = status.code().unwrap_or(-1);
    if status.success() {
        info!("Script {:?} completed successfully", script);
    } else {
        warn!("Script {:?} exited with code {}", script, code);
    }

    Ok(code)
}

fn forward_lines(
    reader: impl AsyncRead + Unpin + Send + 'static,
    stream: OutputStream,
    lines: UnboundedSender<OutputLine>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut reader = BufReader::new(reader).lines();
        while let Ok(Some(text)) = reader.next_line().await {
            if lines.send(OutputLine::new(stream, text)).is_err() {
                break;
            }
        }
    })
}

/// Rebuilds and injects everything via the apply script.
pub async fn apply_all(
    interpreter: &Path,
    config: &ProjectConfig,
    lines: UnboundedSender<OutputLine>,
) -> Result<i32> {
    let args: Vec<String> = APPLY_ALL_ARGS.iter().map(|s| s.to_string()).collect();
    run_streaming(
        interpreter,
        &config.apply_script(),
        &args,
        &config.project_root,
        lines,
    )
    .await
}

/// Re-injects every packaged file into the translated image, creating
/// the image from the original first when it is missing.
pub async fn replace_all(
    interpreter: &Path,
    config: &ProjectConfig,
    lines: UnboundedSender<OutputLine>,
    on_copy_progress: impl FnMut(CopyProgress) + Send + 'static,
) -> Result<i32> {
    ensure_translated_image(config, on_copy_progress).await?;
    run_streaming(
        interpreter,
        &config.replace_all_script(),
        &[],
        &config.project_root,
        lines,
    )
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use tokio::sync::mpsc;

    #[cfg(unix)]
    #[tokio::test]
    async fn test_both_streams_are_forwarded() {
        let dir = tempfile::tempdir().unwrap();
        let script = dir.path().join("tool.sh");
        std::fs::write(&script, "echo one\necho two >&2\necho three\n").unwrap();

        let (tx, mut rx) = mpsc::unbounded_channel();
        let code = run_streaming(
            &PathBuf::from("/bin/sh"),
            &script,
            &[],
            dir.path(),
            tx,
        )
        .await
        .unwrap();
        assert_eq!(code, 0);

        let mut stdout_lines = Vec::new();
        let mut stderr_lines = Vec::new();
        while let Some(line) = rx.recv().await {
            match line.stream {
                OutputStream::Stdout => stdout_lines.push(line.text),
                OutputStream::Stderr => stderr_lines.push(line.text),
            }
        }
        assert_eq!(stdout_lines, vec!["one", "three"]);
        assert_eq!(stderr_lines, vec!["two"]);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_exit_code_is_reported_not_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let script = dir.path().join("tool.sh");
        std::fs::write(&script, "exit 9\n").unwrap();

        let (tx, _rx) = mpsc::unbounded_channel();
        let code = run_streaming(
            &PathBuf::from("/bin/sh"),
            &script,
            &[],
            dir.path(),
            tx,
        )
        .await
        .unwrap();
        assert_eq!(code, 9);
    }

    #[tokio::test]
    async fn test_missing_interpreter_propagates() {
        let dir = tempfile::tempdir().unwrap();
        let (tx, _rx) = mpsc::unbounded_channel();
        let result = run_streaming(
            &PathBuf::from("/definitely/not/python"),
            &dir.path().join("tool.py"),
            &[],
            dir.path(),
            tx,
        )
        .await;
        assert!(result.is_err());
    }
}
