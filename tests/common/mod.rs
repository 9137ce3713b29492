//! Shared fixtures for CX ingestion tests
//!
//! Builds CX documents as JSON and reads back the artifacts a pass leaves in
//! its aspect directory.

#![allow(dead_code)]

pub mod artifacts;
pub mod document;

pub use artifacts::{artifact_names, read_artifacts};
pub use document::{meta, minimal_network, CxDocument};
