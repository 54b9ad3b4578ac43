//! Immutable per-run build context.
use std::path::{Component, Path, PathBuf};

use crate::config::{Config, LOG_FILE};
use crate::error::ConfigError;

/// Everything a build step needs to know about where it runs.
///
/// Stage and dist directories are pure functions of the output root and the
/// build id.
#[derive(Debug, Clone)]
pub struct BuildContext {
    /// Build identifier, also the name of the build directory.
    pub build_id: String,
    /// Directory manifest entries are resolved against.
    pub root: PathBuf,
    /// Directory holding all builds and the `latest` link.
    pub output_root: PathBuf,
    /// `<output_root>/<id>`.
    pub build_dir: PathBuf,
    /// Intermediate artifacts: `<build_dir>/stage`.
    pub stage_dir: PathBuf,
    /// Deployable tree: `<build_dir>/dist`.
    pub dist_dir: PathBuf,
    /// Private temp directory for this run.
    pub workspace: PathBuf,
    /// Per-build log file.
    pub log_file: PathBuf,
    /// Run the minifiers and packer.
    pub compress: bool,
    /// Console mirroring requested on the command line.
    pub verbose: bool,
}

impl BuildContext {
    /// Build the context for `build_id`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingBuildId`] if no id (or an empty one) was
    /// given and [`ConfigError::InvalidBuildId`] if it is not usable as a
    /// single directory name.
    pub fn new(
        build_id: Option<&str>,
        config: &Config,
        workspace: &Path,
        compress: bool,
        verbose: bool,
    ) -> Result<Self, ConfigError> {
        let build_id = validate_build_id(build_id)?;
        let build_dir = config.output_root.join(&build_id);
        Ok(Self {
            stage_dir: build_dir.join("stage"),
            dist_dir: build_dir.join("dist"),
            log_file: build_dir.join(LOG_FILE),
            build_dir,
            build_id,
            root: config.root.clone(),
            output_root: config.output_root.clone(),
            workspace: workspace.to_path_buf(),
            compress,
            verbose,
        })
    }

    /// Path of a stage artifact, e.g. `stage/app-raw.js`.
    #[must_use]
    pub fn stage_artifact(&self, name: &str, suffix: &str) -> PathBuf {
        self.stage_dir.join(format!("{name}-{suffix}"))
    }

    /// Resolve a manifest entry against the root directory.
    #[must_use]
    pub fn resolve(&self, entry: &Path) -> PathBuf {
        self.root.join(entry)
    }
}

/// Check that a build id is present and names exactly one directory.
///
/// # Errors
///
/// See [`BuildContext::new`].
pub fn validate_build_id(build_id: Option<&str>) -> Result<String, ConfigError> {
    let id = build_id.map(str::trim).unwrap_or_default();
    if id.is_empty() {
        return Err(ConfigError::MissingBuildId);
    }
    let mut components = Path::new(id).components();
    let single = matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    );
    if !single || id.contains(['/', '\\']) {
        return Err(ConfigError::InvalidBuildId(id.to_string()));
    }
    Ok(id.to_string())
}
