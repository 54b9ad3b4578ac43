//! Domain-specific error types for the asset build pipeline.
//!
//! Internal modules return typed errors (e.g., [`ManifestError`],
//! [`ToolError`]) which all convert into [`BuildError`]. The command layer
//! wraps them in [`anyhow::Error`] at the CLI boundary and the abort path
//! downcasts back to decide how the failure is reported.
//!
//! # Error hierarchy
//!
//! ```text
//! BuildError
//! ├── Config(ConfigError)      build id, tool lookup, assetbuild.toml
//! ├── Manifest(ManifestError)  manifest syntax and referenced sources
//! ├── Tool(ToolError)          minifier / packer subprocess failures
//! ├── Io                       workspace, stage and dist file operations
//! └── UserAbort                operator declined a confirmation
//! ```
//!
//! Missing `subtree` / `copy` sources have no variant here: deployment logs
//! them as warnings and carries on.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Top-level error type for a build run.
#[derive(Error, Debug)]
pub enum BuildError {
    /// Pre-flight configuration problem.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// A manifest failed validation.
    #[error("Manifest error: {0}")]
    Manifest(#[from] ManifestError),

    /// An external tool failed.
    #[error("Tool error: {0}")]
    Tool(#[from] ToolError),

    /// A filesystem operation failed.
    #[error("IO error: {context}: {source}")]
    Io {
        /// What was being attempted.
        context: String,
        /// Underlying I/O error.
        source: io::Error,
    },

    /// The operator declined to continue.
    #[error("Aborted by user: {0}")]
    UserAbort(String),
}

impl BuildError {
    /// Whether this error is an operator decision rather than a failure.
    #[must_use]
    pub const fn is_user_abort(&self) -> bool {
        matches!(self, Self::UserAbort(_))
    }
}

/// Errors detected before any build work starts.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// No build identifier was given.
    #[error("a build id is required (use -i/--id)")]
    MissingBuildId,

    /// The build identifier cannot be used as a directory name.
    #[error("invalid build id '{0}': must be a single path component")]
    InvalidBuildId(String),

    /// No manifest was given on the command line.
    #[error("no manifest files given")]
    NoManifests,

    /// The root directory does not exist or is not a directory.
    #[error("root directory not found: {}", .0.display())]
    RootNotFound(PathBuf),

    /// A required external program is not installed or not executable.
    #[error("required tool '{program}' for {role} not found on PATH")]
    ToolNotFound {
        /// What the tool is used for (e.g. `"js minifier"`).
        role: String,
        /// Program name as configured.
        program: String,
    },

    /// `assetbuild.toml` exists but could not be parsed.
    #[error("invalid tool configuration in {}: {message}", .path.display())]
    InvalidFile {
        /// Path to the offending file.
        path: PathBuf,
        /// Parser diagnostic.
        message: String,
    },

    /// `assetbuild.toml` exists but could not be read.
    #[error("IO error reading config file {}: {source}", .path.display())]
    Io {
        /// Path to the file that could not be read.
        path: PathBuf,
        /// Underlying I/O error.
        source: io::Error,
    },
}

/// Errors raised while reading and validating a manifest.
#[derive(Error, Debug)]
pub enum ManifestError {
    /// The manifest itself could not be read.
    #[error("cannot read manifest {}: {source}", .path.display())]
    Unreadable {
        /// Manifest path.
        path: PathBuf,
        /// Underlying I/O error.
        source: io::Error,
    },

    /// A `sourcetype:` header names an unsupported type.
    #[error("{}:{line}: unknown sourcetype '{name}'", .file.display())]
    UnknownSourceType {
        /// Manifest path.
        file: PathBuf,
        /// 1-based line number.
        line: usize,
        /// The unrecognised type name.
        name: String,
    },

    /// A `js` or `css` entry has the wrong file extension.
    #[error("{}:{line}: '{path}' does not have the .{expected} extension", .file.display())]
    ExtensionMismatch {
        /// Manifest path.
        file: PathBuf,
        /// 1-based line number.
        line: usize,
        /// Entry path as written in the manifest.
        path: String,
        /// Extension required by the section.
        expected: &'static str,
    },

    /// A `js` or `css` entry does not name a readable file.
    #[error("{}:{line}: cannot read source file '{}'", .file.display(), .path.display())]
    MissingSource {
        /// Manifest path.
        file: PathBuf,
        /// 1-based line number.
        line: usize,
        /// Entry path relative to the root directory.
        path: PathBuf,
    },

    /// A `copy` row does not have exactly two fields.
    #[error("{}:{line}: copy entry must be '<file> <target-dir>', got '{content}'", .file.display())]
    MalformedCopy {
        /// Manifest path.
        file: PathBuf,
        /// 1-based line number.
        line: usize,
        /// The offending row after comment stripping.
        content: String,
    },
}

/// Errors raised by the external tool adapters.
#[derive(Error, Debug)]
pub enum ToolError {
    /// The program could not be started.
    #[error("failed to execute {tool}: {source}")]
    Spawn {
        /// Tool program name.
        tool: String,
        /// Underlying I/O error.
        source: io::Error,
    },

    /// The program exited unsuccessfully.
    #[error("{tool} failed (exit {}), see {}", .code.map_or_else(|| "signal".to_string(), |c| c.to_string()), .log.display())]
    Failed {
        /// Tool program name.
        tool: String,
        /// Exit code, `None` when terminated by a signal.
        code: Option<i32>,
        /// Log capturing the tool's diagnostics.
        log: PathBuf,
    },

    /// The program ran longer than its configured timeout and was killed.
    #[error("{tool} timed out after {secs}s, see {}", .log.display())]
    TimedOut {
        /// Tool program name.
        tool: String,
        /// Configured timeout in seconds.
        secs: u64,
        /// Log capturing the tool's diagnostics.
        log: PathBuf,
    },
}

/// Attach a description to an [`io::Result`], producing a [`BuildError::Io`].
pub trait IoContext<T> {
    /// Wrap the error with the context returned by `f`.
    ///
    /// # Errors
    ///
    /// Returns [`BuildError::Io`] if `self` is an error.
    fn io_context<F: FnOnce() -> String>(self, f: F) -> Result<T, BuildError>;
}

impl<T> IoContext<T> for io::Result<T> {
    fn io_context<F: FnOnce() -> String>(self, f: F) -> Result<T, BuildError> {
        self.map_err(|source| BuildError::Io {
            context: f(),
            source,
        })
    }
}
