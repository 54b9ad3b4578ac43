//! File-system helpers shared by the pipeline, versioning, and deployment.
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{BuildError, IoContext as _};

/// Create `dir` and any missing ancestors.
///
/// # Errors
///
/// Returns an error if the directory cannot be created.
pub fn ensure_dir(dir: &Path) -> Result<(), BuildError> {
    fs::create_dir_all(dir).io_context(|| format!("creating directory {}", dir.display()))
}

/// Remove the directory tree at `dir` if it exists.
///
/// # Errors
///
/// Returns an error if the directory exists but cannot be removed.
pub fn remove_dir_if_exists(dir: &Path) -> Result<(), BuildError> {
    if dir.symlink_metadata().is_ok() {
        fs::remove_dir_all(dir).io_context(|| format!("removing {}", dir.display()))?;
    }
    Ok(())
}

/// Copy the file `src` into the directory `dir`, creating the directory if
/// needed, and return the destination path.
///
/// # Errors
///
/// Returns an error if the directory cannot be created, `src` has no file
/// name, or the copy fails.
pub fn copy_into(src: &Path, dir: &Path) -> Result<PathBuf, BuildError> {
    ensure_dir(dir)?;
    let name = src.file_name().ok_or_else(|| BuildError::Io {
        context: format!("copying {}", src.display()),
        source: std::io::Error::new(std::io::ErrorKind::InvalidInput, "path has no file name"),
    })?;
    let dst = dir.join(name);
    fs::copy(src, &dst)
        .io_context(|| format!("copying {} to {}", src.display(), dst.display()))?;
    Ok(dst)
}

/// Move `src` to `dst`, falling back to copy-and-remove when the two live on
/// different filesystems.
///
/// # Errors
///
/// Returns an error if neither rename nor copy succeeds.
pub fn move_file(src: &Path, dst: &Path) -> Result<(), BuildError> {
    if fs::rename(src, dst).is_ok() {
        return Ok(());
    }
    fs::copy(src, dst).io_context(|| format!("moving {} to {}", src.display(), dst.display()))?;
    fs::remove_file(src).io_context(|| format!("removing {}", src.display()))
}

/// Copy the tree under `src` into `dst`, merging with whatever `dst`
/// already holds. File links are dereferenced, so dist receives real files.
/// Directory links and dangling links are skipped, which keeps a link back
/// into an ancestor from recursing forever.
///
/// # Errors
///
/// Returns an error on the first entry that cannot be read or written.
pub fn copy_dir_recursive(src: &Path, dst: &Path) -> Result<(), BuildError> {
    ensure_dir(dst)?;
    for entry in fs::read_dir(src).io_context(|| format!("reading directory {}", src.display()))? {
        let entry = entry.io_context(|| format!("reading entry in {}", src.display()))?;
        let from = entry.path();
        let to = dst.join(entry.file_name());
        let kind = entry
            .file_type()
            .io_context(|| format!("inspecting {}", from.display()))?;
        if kind.is_dir() {
            copy_dir_recursive(&from, &to)?;
        } else if from.is_file() {
            fs::copy(&from, &to)
                .io_context(|| format!("copying {} to {}", from.display(), to.display()))?;
        }
    }
    Ok(())
}
