//! Adapters for the external minifiers and the JavaScript symbol packer.
use std::path::{Path, PathBuf};

use crate::config::manifest::AssetKind;
use crate::config::tools::{ToolSpec, ToolsConfig};
use crate::error::{ConfigError, ToolError};
use crate::exec::{self, ExecResult};

/// Files produced by a successful adapter call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolOutput {
    /// The transformed asset.
    pub output: PathBuf,
    /// Log written during the call.
    pub log: PathBuf,
    /// Diagnostics file (packer only).
    pub diag: Option<PathBuf>,
}

/// The compression steps the pipeline can invoke.
#[cfg_attr(test, mockall::automock)]
pub trait Toolchain {
    /// Minify `input` into `output`, writing diagnostics to `log`.
    ///
    /// # Errors
    ///
    /// Returns an error if the minifier cannot be started, fails, or times out.
    fn minify(
        &self,
        kind: AssetKind,
        input: &Path,
        output: &Path,
        log: &Path,
    ) -> Result<ToolOutput, ToolError>;

    /// Pack minified JavaScript `input` into `output`, producing `log` and
    /// `diag`.
    ///
    /// # Errors
    ///
    /// Returns an error if the packer cannot be started, fails, or times out.
    fn pack(
        &self,
        input: &Path,
        output: &Path,
        log: &Path,
        diag: &Path,
    ) -> Result<ToolOutput, ToolError>;
}

/// [`Toolchain`] backed by the programs configured in `assetbuild.toml`.
#[derive(Debug, Clone)]
pub struct ExternalTools {
    config: ToolsConfig,
}

impl ExternalTools {
    /// Wrap the configured tool invocations.
    #[must_use]
    pub const fn new(config: ToolsConfig) -> Self {
        Self { config }
    }

    /// Check that every configured program can be found.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ToolNotFound`] for the first missing program.
    pub fn preflight(&self) -> Result<(), ConfigError> {
        for (role, spec) in self.config.roles() {
            if !exec::which(&spec.program) {
                return Err(ConfigError::ToolNotFound {
                    role: role.to_string(),
                    program: spec.program.clone(),
                });
            }
        }
        Ok(())
    }

    const fn minifier(&self, kind: AssetKind) -> &ToolSpec {
        match kind {
            AssetKind::Js => &self.config.js_minifier,
            AssetKind::Css => &self.config.css_minifier,
        }
    }
}

/// Turn an execution result into the adapter result.
fn check(spec: &ToolSpec, result: ExecResult, log: &Path) -> Result<(), ToolError> {
    if result.timed_out {
        return Err(ToolError::TimedOut {
            tool: spec.program.clone(),
            secs: spec.timeout_secs.unwrap_or_default(),
            log: log.to_path_buf(),
        });
    }
    if !result.success {
        return Err(ToolError::Failed {
            tool: spec.program.clone(),
            code: result.code,
            log: log.to_path_buf(),
        });
    }
    Ok(())
}

fn spawn_error(spec: &ToolSpec, source: std::io::Error) -> ToolError {
    ToolError::Spawn {
        tool: spec.program.clone(),
        source,
    }
}

impl Toolchain for ExternalTools {
    fn minify(
        &self,
        kind: AssetKind,
        input: &Path,
        output: &Path,
        log: &Path,
    ) -> Result<ToolOutput, ToolError> {
        let spec = self.minifier(kind);
        let args = spec.render_args(input, output, log);
        let result = exec::run_redirected(&spec.program, &args, output, log, spec.timeout())
            .map_err(|e| spawn_error(spec, e))?;
        check(spec, result, log)?;
        Ok(ToolOutput {
            output: output.to_path_buf(),
            log: log.to_path_buf(),
            diag: None,
        })
    }

    fn pack(
        &self,
        input: &Path,
        output: &Path,
        log: &Path,
        diag: &Path,
    ) -> Result<ToolOutput, ToolError> {
        let spec = &self.config.packer;
        // The packer writes its own log; make sure it exists even if it doesn't.
        exec::touch(log).map_err(|e| spawn_error(spec, e))?;
        let args = spec.render_args(input, output, log);
        let result = exec::run_redirected(&spec.program, &args, diag, diag, spec.timeout())
            .map_err(|e| spawn_error(spec, e))?;
        check(spec, result, log)?;
        Ok(ToolOutput {
            output: output.to_path_buf(),
            log: log.to_path_buf(),
            diag: Some(diag.to_path_buf()),
        })
    }
}
