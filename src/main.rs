//! Command-line entry point for assetbuild.

use std::process::ExitCode;

use assetbuild::{cli, commands, logging};
use clap::Parser;

fn main() -> ExitCode {
    let _ = enable_ansi_support::enable_ansi_support();
    let args = cli::Cli::parse();
    let log = logging::init_subscriber(args.verbose);
    commands::build::run(&args, &log)
}
