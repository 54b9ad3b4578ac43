//! Deployment of stage artifacts and manifest-declared extras into dist.
//!
//! Missing `subtree` and `copy` sources are reported once each as warnings
//! and skipped; copy failures for sources that do exist are fatal.
use std::path::{Component, Path};

use crate::config::manifest::Manifest;
use crate::context::BuildContext;
use crate::error::{BuildError, IoContext as _};
use crate::fs::{copy_dir_recursive, copy_into};
use crate::logging::Log;
use crate::pipeline::Artifacts;

/// Copy the deployable artifacts and every `subtree`/`copy` entry of
/// `manifest` into the dist directory.
///
/// Returns the number of warnings emitted.
///
/// # Errors
///
/// Returns an error if an existing source cannot be copied.
pub fn deploy(
    ctx: &BuildContext,
    manifest: &Manifest,
    artifacts: &[Artifacts],
    log: &dyn Log,
) -> Result<usize, BuildError> {
    let mut warnings = 0;

    for artifact in artifacts {
        let dir = ctx.dist_dir.join(artifact.kind.ext());
        let dst = copy_into(artifact.deployable(), &dir)?;
        log.debug(&format!("deployed {}", dst.display()));
    }

    for dir in manifest.subtrees() {
        if !stays_inside(dir) {
            log.warn(&format!(
                "Cannot copy subtree {}: path leaves the root directory",
                dir.display()
            ));
            warnings += 1;
            continue;
        }
        let src = ctx.resolve(dir);
        if !src.is_dir() {
            log.warn(&format!("Cannot copy subtree {}: Not found", dir.display()));
            warnings += 1;
            continue;
        }
        if holds_output(&src, &ctx.output_root)? {
            log.warn(&format!(
                "Cannot copy subtree {}: contains the output directory",
                dir.display()
            ));
            warnings += 1;
            continue;
        }
        copy_dir_recursive(&src, &ctx.dist_dir.join(dir))?;
        log.debug(&format!("deployed subtree {}", dir.display()));
    }

    for (file, target) in manifest.copies() {
        if !stays_inside(file) || !stays_inside(target) {
            log.warn(&format!(
                "Cannot copy file {}: path leaves the root directory",
                file.display()
            ));
            warnings += 1;
            continue;
        }
        let src = ctx.resolve(file);
        if !src.is_file() {
            log.warn(&format!("Cannot copy file {}: Not found", file.display()));
            warnings += 1;
            continue;
        }
        let dst = copy_into(&src, &ctx.dist_dir.join(target))?;
        log.debug(&format!("deployed {}", dst.display()));
    }

    Ok(warnings)
}

/// Whether copying `src` would read the build tree it is writing into.
fn holds_output(src: &Path, output_root: &Path) -> Result<bool, BuildError> {
    let src = dunce::canonicalize(src).io_context(|| format!("resolving {}", src.display()))?;
    let out = dunce::canonicalize(output_root)
        .io_context(|| format!("resolving {}", output_root.display()))?;
    Ok(out.starts_with(&src))
}

/// Whether a manifest path is relative and never climbs out of its base.
fn stays_inside(path: &Path) -> bool {
    path.components()
        .all(|c| matches!(c, Component::Normal(_) | Component::CurDir))
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::config::manifest::AssetKind;
    use crate::config::tools::ToolsConfig;
    use crate::logging::RecordingLog;
    use std::fs;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn setup() -> (TempDir, BuildContext) {
        let root = tempfile::tempdir().unwrap();
        let config = Config {
            root: root.path().to_path_buf(),
            output_root: root.path().join("build"),
            tools: ToolsConfig::default(),
        };
        let ctx = BuildContext::new(Some("1"), &config, root.path(), true, false).unwrap();
        fs::create_dir_all(&ctx.stage_dir).unwrap();
        fs::create_dir_all(&ctx.dist_dir).unwrap();
        (root, ctx)
    }

    fn manifest(content: &str) -> Manifest {
        Manifest::parse(Path::new("ex.manifest"), content).unwrap()
    }

    #[test]
    fn packed_js_and_minified_css_are_deployed() {
        let (_root, ctx) = setup();
        let sp = ctx.stage_artifact("ex", "sp.js");
        let min_js = ctx.stage_artifact("ex", "min.js");
        let min_css = ctx.stage_artifact("ex", "min.css");
        for f in [&sp, &min_js, &min_css] {
            fs::write(f, "x").unwrap();
        }
        let artifacts = [
            Artifacts {
                kind: AssetKind::Js,
                raw: ctx.stage_artifact("ex", "raw.js"),
                minified: min_js,
                packed: Some(sp),
            },
            Artifacts {
                kind: AssetKind::Css,
                raw: ctx.stage_artifact("ex", "raw.css"),
                minified: min_css,
                packed: None,
            },
        ];

        let log = RecordingLog::default();
        let warnings = deploy(&ctx, &manifest(""), &artifacts, &log).unwrap();

        assert_eq!(warnings, 0);
        assert!(ctx.dist_dir.join("js/ex-sp.js").exists());
        assert!(!ctx.dist_dir.join("js/ex-min.js").exists());
        assert!(ctx.dist_dir.join("css/ex-min.css").exists());
    }

    #[test]
    fn subtree_is_copied_to_same_relative_path() {
        let (root, ctx) = setup();
        fs::create_dir_all(root.path().join("img/icons")).unwrap();
        fs::write(root.path().join("img/icons/a.png"), "png").unwrap();

        let log = RecordingLog::default();
        let warnings =
            deploy(&ctx, &manifest("sourcetype:subtree\nimg\n"), &[], &log).unwrap();

        assert_eq!(warnings, 0);
        assert_eq!(
            fs::read_to_string(ctx.dist_dir.join("img/icons/a.png")).unwrap(),
            "png"
        );
    }

    #[test]
    fn copy_places_file_in_target_dir() {
        let (root, ctx) = setup();
        fs::create_dir_all(root.path().join("vendor")).unwrap();
        fs::write(root.path().join("vendor/robots.txt"), "ok").unwrap();

        let log = RecordingLog::default();
        deploy(
            &ctx,
            &manifest("sourcetype:copy\nvendor/robots.txt static\n"),
            &[],
            &log,
        )
        .unwrap();

        assert_eq!(
            fs::read_to_string(ctx.dist_dir.join("static/robots.txt")).unwrap(),
            "ok"
        );
    }

    #[test]
    fn missing_extras_warn_once_each_and_continue() {
        let (root, ctx) = setup();
        fs::write(root.path().join("present.txt"), "p").unwrap();

        let log = RecordingLog::default();
        let warnings = deploy(
            &ctx,
            &manifest(
                "sourcetype:subtree\nnope\nsourcetype:copy\nmissing.txt out\npresent.txt out\n",
            ),
            &[],
            &log,
        )
        .unwrap();

        assert_eq!(warnings, 2);
        insta::assert_snapshot!(log.warnings().join("\n"), @r"
        Cannot copy subtree nope: Not found
        Cannot copy file missing.txt: Not found
        ");
        assert!(ctx.dist_dir.join("out/present.txt").exists());
    }

    #[test]
    fn escaping_paths_are_skipped_with_warning() {
        let (_root, ctx) = setup();
        let log = RecordingLog::default();
        let warnings = deploy(
            &ctx,
            &manifest("sourcetype:subtree\n../outside\nsourcetype:copy\na.txt ../../etc\n"),
            &[],
            &log,
        )
        .unwrap();
        assert_eq!(warnings, 2);
        assert!(log.warnings().iter().all(|w| w.contains("leaves the root")));
    }

    #[test]
    fn subtree_holding_the_build_tree_is_skipped() {
        let (root, ctx) = setup();
        fs::write(root.path().join("index.html"), "<html>").unwrap();

        let log = RecordingLog::default();
        let warnings = deploy(
            &ctx,
            &manifest("sourcetype:subtree\n.\nsourcetype:copy\nindex.html .\n"),
            &[],
            &log,
        )
        .unwrap();

        assert_eq!(warnings, 1);
        insta::assert_snapshot!(log.warnings().join("\n"), @"Cannot copy subtree .: contains the output directory");
        assert!(!ctx.dist_dir.join("build").exists());
        assert!(ctx.dist_dir.join("index.html").exists());
    }

    #[test]
    fn stays_inside_rejects_parent_and_absolute() {
        assert!(stays_inside(Path::new("img/icons")));
        assert!(stays_inside(Path::new("./img")));
        assert!(!stays_inside(Path::new("../img")));
        assert!(!stays_inside(&PathBuf::from("/etc")));
    }
}
