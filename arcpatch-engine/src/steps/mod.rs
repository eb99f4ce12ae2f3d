//! Pipeline steps
//!
//! The two external-tool steps of an auto-apply run: rebuilding an
//! archive unit from its edited sources, and injecting a rebuilt unit
//! into the translated master image.

mod build;
mod image;

pub use build::{ArchiveBuilder, BUILD_TIMEOUT};
pub use image::{IMAGE_TIMEOUT, ImageUpdater};
