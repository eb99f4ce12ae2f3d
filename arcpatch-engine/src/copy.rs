//! Master image duplication
//!
//! Copies the multi-gigabyte original image into the project build tree
//! through a fixed 1 MiB buffer on a blocking worker. Progress is
//! reported only when the integer percentage advances, not once per
//! chunk, so a listener is never flooded.

use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use tracing::{debug, info};

use arcpatch_core::domain::project::ProjectConfig;

/// Buffer size for image copies.
pub const COPY_BUFFER_SIZE: usize = 1024 * 1024;

/// Progress of an in-flight copy
#[derive(Debug, Clone, Copy)]
pub struct CopyProgress {
    pub bytes_copied: u64,
    pub total_bytes: u64,
    pub percentage: u32,
}

/// Copies `source` to `target`, invoking `on_progress` as whole
/// percentage points complete. Returns the number of bytes copied.
pub fn copy_with_progress(
    source: &Path,
    target: &Path,
    mut on_progress: impl FnMut(CopyProgress),
) -> std::io::Result<u64> {
    let total_bytes = fs::metadata(source)?.len();
    let mut reader = File::open(source)?;
    let mut writer = File::create(target)?;

    let mut buffer = vec![0u8; COPY_BUFFER_SIZE];
    let mut bytes_copied = 0u64;
    let mut last_percentage = u32::MAX;

    loop {
        let read = reader.read(&mut buffer)?;
        if read == 0 {
            break;
        }
        writer.write_all(&buffer[..read])?;
        bytes_copied += read as u64;

        let percentage = if total_bytes > 0 {
            (bytes_copied * 100 / total_bytes) as u32
        } else {
            100
        };
        if percentage != last_percentage {
            last_percentage = percentage;
            on_progress(CopyProgress {
                bytes_copied,
                total_bytes,
                percentage,
            });
        }
    }

    writer.flush()?;
    Ok(bytes_copied)
}

/// Ensures the translated image exists in the build tree.
///
/// The original is copied only when the translated image is absent; an
/// existing copy is kept as-is so accumulated patches survive.
pub async fn ensure_translated_image(
    config: &ProjectConfig,
    on_progress: impl FnMut(CopyProgress) + Send + 'static,
) -> Result<PathBuf> {
    let source = master_image(config)?;
    let target = config.translated_image_path();

    if target.is_file() {
        debug!("Translated image already present at {:?}", target);
        return Ok(target);
    }

    copy_image(source, target, on_progress).await
}

/// Replaces any existing translated image with a fresh copy of the
/// original.
pub async fn force_fresh_image(
    config: &ProjectConfig,
    on_progress: impl FnMut(CopyProgress) + Send + 'static,
) -> Result<PathBuf> {
    let source = master_image(config)?;
    let target = config.translated_image_path();

    if target.is_file() {
        fs::remove_file(&target)
            .with_context(|| format!("Failed to delete {}", target.display()))?;
    }

    copy_image(source, target, on_progress).await
}

fn master_image(config: &ProjectConfig) -> Result<PathBuf> {
    let source = config
        .image_path
        .clone()
        .context("No master image configured for the project")?;

    if !source.is_file() {
        bail!("Master image not found: {}", source.display());
    }

    Ok(source)
}

async fn copy_image(
    source: PathBuf,
    target: PathBuf,
    on_progress: impl FnMut(CopyProgress) + Send + 'static,
) -> Result<PathBuf> {
    if let Some(parent) = target.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }

    info!("Copying master image {:?} -> {:?}", source, target);

    let worker_source = source.clone();
    let worker_target = target.clone();
    let copied = tokio::task::spawn_blocking(move || {
        copy_with_progress(&worker_source, &worker_target, on_progress)
    })
    .await
    .context("Image copy task panicked")?
    .with_context(|| format!("Failed to copy {}", source.display()))?;

    info!("Copied {} byte(s) to {:?}", copied, target);
    Ok(target)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[test]
    fn test_copy_reports_each_percentage_once() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("source.iso");
        let target = dir.path().join("target.iso");
        fs::write(&source, vec![7u8; 4096]).unwrap();

        let mut seen = Vec::new();
        let copied = copy_with_progress(&source, &target, |p| seen.push(p.percentage)).unwrap();

        assert_eq!(copied, 4096);
        assert_eq!(fs::read(&target).unwrap().len(), 4096);
        // A single sub-buffer read lands straight at 100.
        assert_eq!(seen, vec![100]);
    }

    #[test]
    fn test_copy_preserves_content() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("source.iso");
        let target = dir.path().join("target.iso");
        let payload: Vec<u8> = (0..=255).cycle().take(10_000).collect();
        fs::write(&source, &payload).unwrap();

        copy_with_progress(&source, &target, |_| {}).unwrap();
        assert_eq!(fs::read(&target).unwrap(), payload);
    }

    #[tokio::test]
    async fn test_ensure_keeps_existing_translated_image() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = ProjectConfig::new("RM2", dir.path());
        let original = dir.path().join("original.iso");
        fs::write(&original, b"original").unwrap();
        config.image_path = Some(original);

        let target = config.translated_image_path();
        fs::create_dir_all(target.parent().unwrap()).unwrap();
        fs::write(&target, b"patched already").unwrap();

        let kept = ensure_translated_image(&config, |_| {}).await.unwrap();
        assert_eq!(kept, target);
        assert_eq!(fs::read(&target).unwrap(), b"patched already");
    }

    #[tokio::test]
    async fn test_force_fresh_replaces_translated_image() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = ProjectConfig::new("RM2", dir.path());
        let original = dir.path().join("original.iso");
        fs::write(&original, b"original").unwrap();
        config.image_path = Some(original);

        let target = config.translated_image_path();
        fs::create_dir_all(target.parent().unwrap()).unwrap();
        fs::write(&target, b"stale").unwrap();

        let progress = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&progress);
        let fresh = force_fresh_image(&config, move |p| sink.lock().unwrap().push(p.percentage))
            .await
            .unwrap();

        assert_eq!(fs::read(&fresh).unwrap(), b"original");
        assert_eq!(*progress.lock().unwrap(), vec![100]);
    }

    #[tokio::test]
    async fn test_missing_master_image_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = ProjectConfig::new("RM2", dir.path());
        config.image_path = Some(dir.path().join("nope.iso"));

        assert!(ensure_translated_image(&config, |_| {}).await.is_err());
    }
}
