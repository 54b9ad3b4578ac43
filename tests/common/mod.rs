// Shared helpers for integration tests.
//
// Provides a temporary project (root directory plus a private tmpdir for
// workspaces) and a fluent builder so each test can lay out sources,
// manifests and tool configuration without repeating filesystem
// boilerplate.
//
// Used by all integration test binaries that declare `mod common;`.
#![allow(dead_code, clippy::expect_used, clippy::panic)]

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use assetbuild::cli::Cli;
use assetbuild::commands::build;
use assetbuild::error::BuildError;
use assetbuild::logging::{Logger, subscriber_for};
use assetbuild::versioning::Confirm;
use clap::Parser as _;

/// Tool configuration whose programs copy their input unchanged.
pub const COPYING_TOOLS: &str = r#"
[js_minifier]
program = "cat"
args = ["{input}"]

[css_minifier]
program = "cat"
args = ["{input}"]

[packer]
program = "cp"
args = ["{input}", "{output}"]
"#;

/// Tool configuration naming programs that cannot exist on `PATH`.
pub const ABSENT_TOOLS: &str = r#"
[js_minifier]
program = "assetbuild-test-no-such-minifier"

[css_minifier]
program = "assetbuild-test-no-such-minifier"

[packer]
program = "assetbuild-test-no-such-packer"
"#;

/// Tool configuration whose JavaScript minifier reports a syntax error.
pub const FAILING_JS_MINIFIER: &str = r#"
[js_minifier]
program = "sh"
args = ["-c", "echo 'SyntaxError: Unexpected token' >&2; exit 1"]

[css_minifier]
program = "cat"
args = ["{input}"]

[packer]
program = "cp"
args = ["{input}", "{output}"]
"#;

/// Tool configuration whose packer exits non-zero.
pub const FAILING_PACKER: &str = r#"
[js_minifier]
program = "cat"
args = ["{input}"]

[css_minifier]
program = "cat"
args = ["{input}"]

[packer]
program = "false"
"#;

/// Always declines the overwrite prompt.
#[derive(Debug)]
pub struct Decline;

impl Confirm for Decline {
    fn confirm(&self, _prompt: &str) -> Result<bool, BuildError> {
        Ok(false)
    }
}

/// Fails the test if asked.
#[derive(Debug)]
pub struct NeverAsked;

impl Confirm for NeverAsked {
    fn confirm(&self, prompt: &str) -> Result<bool, BuildError> {
        panic!("unexpected confirmation prompt: {prompt}");
    }
}

/// Result of one in-process build invocation.
pub struct Outcome {
    pub code: ExitCode,
    pub log: Logger,
}

impl Outcome {
    pub fn succeeded(&self) -> bool {
        self.code == ExitCode::SUCCESS
    }

    /// Contents of the log file the run ended on.
    pub fn log_text(&self) -> String {
        let path = self.log.log_path().expect("log file attached");
        std::fs::read_to_string(path).expect("read log file")
    }
}

/// An isolated project backed by temporary directories.
pub struct TestProject {
    /// Root directory sources and manifests live in.
    pub root: tempfile::TempDir,
    /// Parent directory for workspaces created by runs.
    pub tmp: tempfile::TempDir,
}

impl TestProject {
    pub fn root_path(&self) -> &Path {
        self.root.path()
    }

    pub fn output(&self) -> PathBuf {
        self.root.path().join("build")
    }

    pub fn stage(&self, id: &str) -> PathBuf {
        self.output().join(id).join("stage")
    }

    pub fn dist(&self, id: &str) -> PathBuf {
        self.output().join(id).join("dist")
    }

    pub fn read(&self, path: &Path) -> String {
        std::fs::read_to_string(path)
            .unwrap_or_else(|e| panic!("read {}: {e}", path.display()))
    }

    /// Number of entries left in the workspace parent directory.
    pub fn leftover_workspaces(&self) -> usize {
        std::fs::read_dir(self.tmp.path())
            .expect("read tmpdir")
            .count()
    }

    /// Parse `args` as given after `--root <root> --tmpdir <tmp>`.
    pub fn cli(&self, args: &[&str]) -> Cli {
        let root = self.root.path().to_str().expect("utf-8 root");
        let tmp = self.tmp.path().to_str().expect("utf-8 tmpdir");
        let manifests_and_flags = args.iter().map(|a| {
            if a.ends_with(".manifest") {
                self.root.path().join(a).to_string_lossy().into_owned()
            } else {
                (*a).to_string()
            }
        });
        let argv: Vec<String> = ["assetbuild", "--root", root, "--tmpdir", tmp]
            .into_iter()
            .map(String::from)
            .chain(manifests_and_flags)
            .collect();
        Cli::parse_from(argv)
    }

    /// Run a build with `args`, answering prompts with `confirm`.
    pub fn run_with(&self, args: &[&str], confirm: &dyn Confirm) -> Outcome {
        let cli = self.cli(args);
        let log = Logger::new(cli.verbose);
        let _guard = tracing::subscriber::set_default(subscriber_for(&log));
        let code = build::run_with(&cli, &log, confirm);
        Outcome { code, log }
    }

    /// Run a build with `args`; fails if a confirmation prompt appears.
    pub fn run(&self, args: &[&str]) -> Outcome {
        self.run_with(args, &NeverAsked)
    }
}

/// Fluent builder for [`TestProject`].
pub struct TestProjectBuilder {
    project: TestProject,
}

impl TestProjectBuilder {
    pub fn new() -> Self {
        Self {
            project: TestProject {
                root: tempfile::tempdir().expect("create root dir"),
                tmp: tempfile::tempdir().expect("create tmp dir"),
            },
        }
    }

    /// Write `content` to `rel` under the root, creating parent directories.
    pub fn with_file(self, rel: &str, content: &str) -> Self {
        let path = self.project.root.path().join(rel);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("create parent dir");
        }
        std::fs::write(&path, content).expect("write file");
        self
    }

    /// Write `<name>.manifest` under the root.
    pub fn with_manifest(self, name: &str, content: &str) -> Self {
        self.with_file(&format!("{name}.manifest"), content)
    }

    /// Write `assetbuild.toml` under the root.
    pub fn with_tools(self, toml: &str) -> Self {
        self.with_file("assetbuild.toml", toml)
    }

    pub fn build(self) -> TestProject {
        self.project
    }
}
