//! Arcpatch Core
//!
//! Core types for the arcpatch auto-apply pipeline.
//!
//! This crate contains:
//! - Domain types: project settings, archive units, run events
//! - No I/O and no async code; the engine crate owns both

pub mod domain;
