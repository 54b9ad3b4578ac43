//! Configuration: root/output resolution, tool settings, and manifests.
pub mod manifest;
pub mod toml_loader;
pub mod tools;

use std::path::{Path, PathBuf};

use crate::error::ConfigError;

/// Name of the optional tool configuration file in the root directory.
pub const CONFIG_FILE: &str = "assetbuild.toml";

/// Name of the log file, both globally and inside each build directory.
pub const LOG_FILE: &str = "assetbuild.log";

/// Resolved locations and tool settings for a run.
#[derive(Debug, Clone)]
pub struct Config {
    /// Directory all manifest entries are resolved against.
    pub root: PathBuf,
    /// Directory holding `<id>/`, `latest` and the global log.
    pub output_root: PathBuf,
    /// External tool invocations.
    pub tools: tools::ToolsConfig,
}

impl Config {
    /// Resolve the root and output directories and load `assetbuild.toml`.
    ///
    /// `root` falls back to the current directory; `output` falls back to
    /// `<root>/build`.
    ///
    /// # Errors
    ///
    /// Returns an error if the root is not a directory or the tool
    /// configuration cannot be read or parsed.
    pub fn load(root: Option<&Path>, output: Option<&Path>) -> Result<Self, ConfigError> {
        let root = resolve_root(root)?;
        let output_root = output.map_or_else(|| root.join("build"), Path::to_path_buf);
        let tools = toml_loader::load_config(&root.join(CONFIG_FILE))?;
        Ok(Self {
            root,
            output_root,
            tools,
        })
    }

    /// Log file used until the build directory exists.
    #[must_use]
    pub fn global_log(&self) -> PathBuf {
        self.output_root.join(LOG_FILE)
    }
}

/// Resolve the root directory from the CLI/environment or the current
/// directory.
///
/// # Errors
///
/// Returns an error if the directory does not exist.
pub fn resolve_root(root: Option<&Path>) -> Result<PathBuf, ConfigError> {
    let candidate = match root {
        Some(root) => root.to_path_buf(),
        None => std::env::current_dir().map_err(|source| ConfigError::Io {
            path: PathBuf::from("."),
            source,
        })?,
    };
    if !candidate.is_dir() {
        return Err(ConfigError::RootNotFound(candidate));
    }
    dunce::canonicalize(&candidate).map_err(|source| ConfigError::Io {
        path: candidate,
        source,
    })
}
