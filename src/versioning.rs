//! Versioned build directories: overwrite confirmation and the `latest` link.
use std::fs;
use std::io::{self, BufRead, IsTerminal as _, Write as _};
use std::path::Path;

use crate::context::BuildContext;
use crate::error::{BuildError, IoContext as _};
use crate::fs::{ensure_dir, remove_dir_if_exists};
use crate::logging::Log;

/// Name of the link pointing at the most recently started build.
pub const LATEST: &str = "latest";

/// Asks the operator whether to continue.
#[cfg_attr(test, mockall::automock)]
pub trait Confirm {
    /// Ask `prompt`; `Ok(true)` means continue.
    ///
    /// # Errors
    ///
    /// Returns an error if the answer cannot be read.
    fn confirm(&self, prompt: &str) -> Result<bool, BuildError>;
}

/// Prompt on the terminal, or read a `y/N` line from stdin when it is not a
/// terminal.
#[derive(Debug, Default, Clone, Copy)]
pub struct InteractiveConfirm;

impl Confirm for InteractiveConfirm {
    fn confirm(&self, prompt: &str) -> Result<bool, BuildError> {
        if io::stdin().is_terminal() && io::stderr().is_terminal() {
            return dialoguer::Confirm::new()
                .with_prompt(prompt)
                .default(false)
                .interact()
                .map_err(io::Error::other)
                .io_context(|| "reading confirmation".to_string());
        }
        let mut stderr = io::stderr().lock();
        write!(stderr, "{prompt} [y/N] ")
            .and_then(|()| stderr.flush())
            .io_context(|| "writing prompt".to_string())?;
        read_answer(io::stdin().lock()).io_context(|| "reading confirmation".to_string())
    }
}

/// Answers yes without asking (`--yes`).
#[derive(Debug, Default, Clone, Copy)]
pub struct AssumeYes;

impl Confirm for AssumeYes {
    fn confirm(&self, _prompt: &str) -> Result<bool, BuildError> {
        Ok(true)
    }
}

/// Read one line and interpret it as a yes/no answer. Anything other than
/// `y` or `yes` (case-insensitive), including end of input, is a no.
///
/// # Errors
///
/// Returns an error if reading fails.
pub fn read_answer(mut input: impl BufRead) -> io::Result<bool> {
    let mut line = String::new();
    input.read_line(&mut line)?;
    let answer = line.trim().to_ascii_lowercase();
    Ok(answer == "y" || answer == "yes")
}

/// Prepare fresh stage and dist directories for this build and point
/// `latest` at it.
///
/// Existing directories are only removed after `confirm` agrees; declining
/// leaves them untouched and returns [`BuildError::UserAbort`].
///
/// # Errors
///
/// Returns an error if the operator declines or a directory operation fails.
pub fn prepare_build_dirs(
    ctx: &BuildContext,
    confirm: &dyn Confirm,
    log: &dyn Log,
) -> Result<(), BuildError> {
    let existing: Vec<&Path> = [ctx.stage_dir.as_path(), ctx.dist_dir.as_path()]
        .into_iter()
        .filter(|dir| dir.exists())
        .collect();

    if !existing.is_empty() {
        for dir in &existing {
            log.warn(&format!("{} already exists", dir.display()));
        }
        let prompt = format!("Overwrite build {}?", ctx.build_id);
        if !confirm.confirm(&prompt)? {
            return Err(BuildError::UserAbort(format!(
                "build {} already exists",
                ctx.build_id
            )));
        }
        for dir in existing {
            log.debug(&format!("removing {}", dir.display()));
            remove_dir_if_exists(dir)?;
        }
    }

    ensure_dir(&ctx.stage_dir)?;
    ensure_dir(&ctx.dist_dir)?;
    update_latest(&ctx.output_root, &ctx.build_id)?;
    log.debug(&format!("{LATEST} -> {}", ctx.build_id));
    Ok(())
}

/// Atomically point `<output_root>/latest` at `<build_id>`.
///
/// A uniquely named link is created next to `latest` and renamed over it, so
/// readers never observe a missing or half-written link.
///
/// # Errors
///
/// Returns an error if the link cannot be created or renamed.
pub fn update_latest(output_root: &Path, build_id: &str) -> Result<(), BuildError> {
    let latest = output_root.join(LATEST);
    let staging = output_root.join(format!(".{LATEST}-{}", std::process::id()));

    if staging.symlink_metadata().is_ok() {
        remove_link(&staging)?;
    }
    create_dir_link(Path::new(build_id), &staging)?;

    if fs::rename(&staging, &latest).is_err() {
        // Windows refuses to rename over an existing directory link, and a
        // plain directory named `latest` cannot be replaced by rename either.
        if latest.symlink_metadata().is_ok() {
            remove_link(&latest)?;
        }
        fs::rename(&staging, &latest)
            .io_context(|| format!("replacing {}", latest.display()))?;
    }
    Ok(())
}

fn create_dir_link(target: &Path, link: &Path) -> Result<(), BuildError> {
    #[cfg(unix)]
    let result = std::os::unix::fs::symlink(target, link);
    #[cfg(windows)]
    let result = std::os::windows::fs::symlink_dir(target, link);
    result.io_context(|| format!("creating link {} -> {}", link.display(), target.display()))
}

fn remove_link(path: &Path) -> Result<(), BuildError> {
    let meta = fs::symlink_metadata(path)
        .io_context(|| format!("reading metadata: {}", path.display()))?;
    let result = if meta.is_symlink() {
        fs::remove_file(path).or_else(|_| fs::remove_dir(path))
    } else if meta.is_dir() {
        fs::remove_dir_all(path)
    } else {
        fs::remove_file(path)
    };
    result.io_context(|| format!("removing {}", path.display()))
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::config::tools::ToolsConfig;
    use crate::logging::RecordingLog;

    fn context(out: &Path, id: &str) -> BuildContext {
        let config = Config {
            root: out.to_path_buf(),
            output_root: out.to_path_buf(),
            tools: ToolsConfig::default(),
        };
        BuildContext::new(Some(id), &config, Path::new("/unused"), true, false).unwrap()
    }

    #[test]
    fn read_answer_accepts_yes_variants() {
        assert!(read_answer("y\n".as_bytes()).unwrap());
        assert!(read_answer("YES\n".as_bytes()).unwrap());
        assert!(!read_answer("n\n".as_bytes()).unwrap());
        assert!(!read_answer("\n".as_bytes()).unwrap());
        assert!(!read_answer("".as_bytes()).unwrap());
    }

    #[test]
    fn fresh_build_creates_dirs_without_asking() {
        let out = tempfile::tempdir().unwrap();
        let ctx = context(out.path(), "1");
        let mut confirm = MockConfirm::new();
        confirm.expect_confirm().never();

        prepare_build_dirs(&ctx, &confirm, &RecordingLog::default()).unwrap();

        assert!(ctx.stage_dir.is_dir());
        assert!(ctx.dist_dir.is_dir());
        assert_eq!(
            fs::read_link(out.path().join(LATEST)).unwrap(),
            Path::new("1")
        );
    }

    #[test]
    fn declining_leaves_existing_build_untouched() {
        let out = tempfile::tempdir().unwrap();
        let ctx = context(out.path(), "1");
        fs::create_dir_all(&ctx.stage_dir).unwrap();
        fs::write(ctx.stage_dir.join("app-raw.js"), "old").unwrap();
        fs::create_dir_all(ctx.dist_dir.join("js")).unwrap();
        fs::write(ctx.dist_dir.join("js/app-sp.js"), "old-dist").unwrap();

        let mut confirm = MockConfirm::new();
        confirm.expect_confirm().times(1).returning(|_| Ok(false));
        let log = RecordingLog::default();

        let err = prepare_build_dirs(&ctx, &confirm, &log).unwrap_err();

        assert!(err.is_user_abort());
        assert_eq!(
            fs::read_to_string(ctx.stage_dir.join("app-raw.js")).unwrap(),
            "old"
        );
        assert_eq!(
            fs::read_to_string(ctx.dist_dir.join("js/app-sp.js")).unwrap(),
            "old-dist"
        );
        assert_eq!(log.warnings().len(), 2);
        assert!(out.path().join(LATEST).symlink_metadata().is_err());
    }

    #[test]
    fn accepting_recreates_empty_dirs() {
        let out = tempfile::tempdir().unwrap();
        let ctx = context(out.path(), "1");
        fs::create_dir_all(&ctx.stage_dir).unwrap();
        fs::write(ctx.stage_dir.join("stale.js"), "old").unwrap();

        let mut confirm = MockConfirm::new();
        confirm
            .expect_confirm()
            .withf(|prompt| prompt.contains("build 1"))
            .times(1)
            .returning(|_| Ok(true));

        prepare_build_dirs(&ctx, &confirm, &RecordingLog::default()).unwrap();

        assert!(ctx.stage_dir.is_dir());
        assert!(!ctx.stage_dir.join("stale.js").exists());
    }

    #[test]
    fn latest_is_replaced_not_merged() {
        let out = tempfile::tempdir().unwrap();
        fs::create_dir_all(out.path().join("1")).unwrap();
        fs::create_dir_all(out.path().join("2")).unwrap();

        update_latest(out.path(), "1").unwrap();
        update_latest(out.path(), "2").unwrap();

        let latest = out.path().join(LATEST);
        assert_eq!(fs::read_link(&latest).unwrap(), Path::new("2"));
        let leftovers: Vec<_> = fs::read_dir(out.path())
            .unwrap()
            .filter_map(Result::ok)
            .filter(|e| e.file_name().to_string_lossy().starts_with(".latest"))
            .collect();
        assert!(leftovers.is_empty());
    }

    #[test]
    fn latest_replaces_plain_directory() {
        let out = tempfile::tempdir().unwrap();
        fs::create_dir_all(out.path().join(LATEST)).unwrap();
        fs::create_dir_all(out.path().join("3")).unwrap();

        update_latest(out.path(), "3").unwrap();

        assert_eq!(
            fs::read_link(out.path().join(LATEST)).unwrap(),
            Path::new("3")
        );
    }
}
