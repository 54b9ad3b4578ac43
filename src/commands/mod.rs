//! Top-level command orchestration.
pub mod build;
