//! Private per-process temp workspace with guaranteed cleanup.
//!
//! The workspace is removed when [`Workspace::cleanup`] runs, when the value
//! is dropped, and, for the process' live workspaces, when Ctrl-C is pressed.
use std::path::{Path, PathBuf};
use std::sync::{Mutex, Once};

use tempfile::TempDir;

use crate::error::{BuildError, IoContext as _};

/// Directories to remove if the process is interrupted.
static LIVE: Mutex<Vec<PathBuf>> = Mutex::new(Vec::new());
static HANDLER: Once = Once::new();

fn live() -> std::sync::MutexGuard<'static, Vec<PathBuf>> {
    LIVE.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
}

/// Install the Ctrl-C handler once per process.
fn install_interrupt_handler() {
    HANDLER.call_once(|| {
        // Fails only if another handler is already installed; the Drop-based
        // cleanup still applies in that case.
        let _ = ctrlc::set_handler(|| {
            for dir in live().iter() {
                let _ = std::fs::remove_dir_all(dir);
            }
            std::process::exit(1);
        });
    });
}

/// A temp directory owned by one build run.
#[derive(Debug)]
pub struct Workspace {
    dir: Option<TempDir>,
    path: PathBuf,
}

impl Workspace {
    /// Create a workspace under `parent`, or under the system temp directory
    /// when `parent` is `None`.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created.
    pub fn create(parent: Option<&Path>) -> Result<Self, BuildError> {
        let parent = parent.map_or_else(std::env::temp_dir, Path::to_path_buf);
        let dir = tempfile::Builder::new()
            .prefix("assetbuild-")
            .tempdir_in(&parent)
            .io_context(|| format!("creating workspace in {}", parent.display()))?;
        let path = dir.path().to_path_buf();

        install_interrupt_handler();
        live().push(path.clone());

        Ok(Self {
            dir: Some(dir),
            path,
        })
    }

    /// Workspace directory.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Remove the workspace. Safe to call more than once.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be removed.
    pub fn cleanup(&mut self) -> Result<(), BuildError> {
        let Some(dir) = self.dir.take() else {
            return Ok(());
        };
        live().retain(|p| p != &self.path);
        dir.close()
            .io_context(|| format!("removing workspace {}", self.path.display()))
    }
}

impl Drop for Workspace {
    fn drop(&mut self) {
        let _ = self.cleanup();
    }
}
