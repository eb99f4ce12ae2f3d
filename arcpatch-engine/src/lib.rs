//! Arcpatch Engine
//!
//! The save -> auto-apply pipeline behind the arcpatch tool: when edited
//! source files are saved, the archive units they belong to are rebuilt
//! via the project's packaging scripts and each rebuilt unit is injected
//! into the translated master image.
//!
//! Architecture:
//! - Process: external tool invocation with hard deadlines
//! - Steps: the archive build and image update steps
//! - Pipeline: sequences both phases over a change set, emits progress
//! - Store: settings persistence injected into the pipeline
//! - Copy: buffered duplication of the master image
//! - Script: streaming execution of the long-running maintenance scripts
//! - Locate: interpreter discovery and fallback resolution

pub mod copy;
pub mod locate;
pub mod pipeline;
pub mod process;
pub mod script;
pub mod steps;
pub mod store;
