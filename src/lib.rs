//! Manifest-driven static asset build pipeline.
//!
//! Reads manifests listing ordered JavaScript and CSS sources plus extra
//! files to ship, concatenates and compresses the sources with external
//! tools, and deploys the results into a versioned `stage`/`dist` tree.
//!
//! The public API is organised into layers:
//!
//! - **[`config`]**: manifest grammar, tool settings, root resolution
//! - **[`context`]**, **[`versioning`]**, **[`workspace`]**: per-run state and the versioned output tree
//! - **[`pipeline`]**, **[`deploy`]**, **[`tools`]**: build steps and the adapters they call
//! - **[`commands`]**: top-level orchestration and the abort path
#![deny(clippy::or_fun_call)]
#![deny(clippy::bool_to_int_with_if)]

pub mod cli;
pub mod commands;
pub mod config;
pub mod context;
pub mod deploy;
pub mod error;
pub mod exec;
pub mod fs;
pub mod logging;
pub mod pipeline;
pub mod tools;
pub mod versioning;
pub mod workspace;
