//! Command-line interface definition.
use std::path::PathBuf;

use clap::{ArgAction, Parser};

/// Version reported by `--version`, set by the build script when available.
pub const VERSION: &str = match option_env!("ASSETBUILD_VERSION") {
    Some(version) => version,
    None => env!("CARGO_PKG_VERSION"),
};

/// Command line of the asset build pipeline.
#[derive(Parser, Debug)]
#[command(
    name = "assetbuild",
    about = "Manifest-driven static asset build pipeline",
    version = VERSION,
    disable_help_flag = true
)]
pub struct Cli {
    /// Build identifier; names the build directory under the output root
    #[arg(short, long, value_name = "ID")]
    pub id: Option<String>,

    /// Skip minification and packing; deploy the concatenated sources
    #[arg(short, long)]
    pub nocompress: bool,

    /// Mirror log output to the console
    #[arg(short, long)]
    pub verbose: bool,

    /// Replace an existing build without asking
    #[arg(short, long)]
    pub yes: bool,

    /// Directory manifest entries are resolved against (default: current directory)
    #[arg(long, env = "ASSETBUILD_ROOT", value_name = "DIR")]
    pub root: Option<PathBuf>,

    /// Directory holding the versioned builds (default: <root>/build)
    #[arg(long, env = "ASSETBUILD_OUTPUT", value_name = "DIR")]
    pub output: Option<PathBuf>,

    /// Parent directory of the per-run workspace (default: system temp dir)
    #[arg(long, env = "ASSETBUILD_TMPDIR", value_name = "DIR")]
    pub tmpdir: Option<PathBuf>,

    /// Print help
    #[arg(short = 'h', long = "help", visible_alias = "usage", action = ArgAction::Help)]
    pub help: Option<bool>,

    /// Manifest files to build, in order
    #[arg(value_name = "MANIFEST")]
    pub manifests: Vec<PathBuf>,
}

impl Cli {
    /// Whether the minifiers and packer run.
    #[must_use]
    pub const fn compress(&self) -> bool {
        !self.nocompress
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn verify_cli() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parse_id_and_manifests() {
        let cli = Cli::parse_from(["assetbuild", "-i", "42", "a.manifest", "b.manifest"]);
        assert_eq!(cli.id.as_deref(), Some("42"));
        assert_eq!(
            cli.manifests,
            [PathBuf::from("a.manifest"), PathBuf::from("b.manifest")]
        );
        assert!(cli.compress());
        assert!(!cli.verbose);
    }

    #[test]
    fn parse_long_flags() {
        let cli = Cli::parse_from([
            "assetbuild",
            "--id",
            "7",
            "--nocompress",
            "--verbose",
            "--yes",
            "m.manifest",
        ]);
        assert!(!cli.compress());
        assert!(cli.verbose);
        assert!(cli.yes);
    }

    #[test]
    fn parse_short_flags_combined() {
        let cli = Cli::parse_from(["assetbuild", "-nvy", "-i", "7", "m.manifest"]);
        assert!(cli.nocompress);
        assert!(cli.verbose);
        assert!(cli.yes);
    }

    #[test]
    fn parse_without_id_is_accepted() {
        let cli = Cli::parse_from(["assetbuild", "m.manifest"]);
        assert!(cli.id.is_none());
    }

    #[test]
    fn parse_root_and_output() {
        let cli = Cli::parse_from([
            "assetbuild",
            "--root",
            "/src",
            "--output",
            "/out",
            "-i",
            "1",
            "m.manifest",
        ]);
        assert_eq!(cli.root, Some(PathBuf::from("/src")));
        assert_eq!(cli.output, Some(PathBuf::from("/out")));
    }

    #[test]
    fn usage_is_an_alias_for_help() {
        for flag in ["-h", "--help", "--usage"] {
            let err = Cli::try_parse_from(["assetbuild", flag]).unwrap_err();
            assert_eq!(err.kind(), clap::error::ErrorKind::DisplayHelp, "{flag}");
        }
    }

    #[test]
    fn unknown_flag_is_rejected() {
        assert!(Cli::try_parse_from(["assetbuild", "--bogus"]).is_err());
    }
}
