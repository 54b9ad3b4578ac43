//! The build command: validate, prepare the versioned tree, run the
//! pipeline, and funnel every failure through one abort path.
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context as _, Result};

use crate::cli::{Cli, VERSION};
use crate::config::Config;
use crate::context::{BuildContext, validate_build_id};
use crate::error::{BuildError, ConfigError};
use crate::fs::ensure_dir;
use crate::logging::Logger;
use crate::pipeline::Pipeline;
use crate::tools::ExternalTools;
use crate::versioning::{AssumeYes, Confirm, InteractiveConfirm, prepare_build_dirs};
use crate::workspace::Workspace;

/// Run the build command.
///
/// Returns [`ExitCode::SUCCESS`] when every manifest was built and deployed,
/// [`ExitCode::FAILURE`] after an abort.
#[must_use]
pub fn run(cli: &Cli, log: &Logger) -> ExitCode {
    let confirm: &dyn Confirm = if cli.yes {
        &AssumeYes
    } else {
        &InteractiveConfirm
    };
    run_with(cli, log, confirm)
}

/// Run the build command with an explicit overwrite confirmation.
#[must_use]
pub fn run_with(cli: &Cli, log: &Logger, confirm: &dyn Confirm) -> ExitCode {
    let mut workspace = None;
    match execute(cli, log, confirm, &mut workspace) {
        Ok(()) => {
            if let Some(ws) = workspace.as_mut()
                && let Err(e) = ws.cleanup()
            {
                log.warn(&format!("{e}"));
            }
            ExitCode::SUCCESS
        }
        Err(e) => abort(log, &e, workspace.as_mut()),
    }
}

fn execute(
    cli: &Cli,
    log: &Logger,
    confirm: &dyn Confirm,
    workspace: &mut Option<Workspace>,
) -> Result<()> {
    let config = Config::load(cli.root.as_deref(), cli.output.as_deref())?;
    validate_build_id(cli.id.as_deref())?;
    if cli.manifests.is_empty() {
        return Err(ConfigError::NoManifests.into());
    }
    let manifests = cli
        .manifests
        .iter()
        .map(|m| std::path::absolute(m).with_context(|| format!("resolving {}", m.display())))
        .collect::<Result<Vec<PathBuf>>>()?;

    let ws = workspace.insert(Workspace::create(cli.tmpdir.as_deref())?);

    ensure_dir(&config.output_root)?;
    log.attach_file(&config.global_log())
        .with_context(|| format!("opening {}", config.global_log().display()))?;
    log.info(&format!("assetbuild {VERSION}"));
    log.debug(&format!("root: {}", config.root.display()));
    log.debug(&format!("workspace: {}", ws.path().display()));

    let ctx = BuildContext::new(
        cli.id.as_deref(),
        &config,
        ws.path(),
        cli.compress(),
        cli.verbose,
    )?;

    let tools = ExternalTools::new(config.tools.clone());
    if ctx.compress {
        log.stage("Checking tools");
        tools.preflight()?;
    }

    log.stage(&format!("Preparing build {}", ctx.build_id));
    prepare_build_dirs(&ctx, confirm, log)?;
    log.relocate(&ctx.log_file)
        .with_context(|| format!("moving log to {}", ctx.log_file.display()))?;

    Pipeline::new(&ctx, &tools, log).run(&manifests)?;

    log.print_summary();
    Ok(())
}

/// Report a fatal error and clean up.
///
/// Forces verbose output, logs the error and the abort banner, removes the
/// workspace, and returns the failure exit code. Operator cancellations are
/// reported as such rather than as internal errors.
pub fn abort(log: &Logger, err: &anyhow::Error, workspace: Option<&mut Workspace>) -> ExitCode {
    let user_abort = err
        .downcast_ref::<BuildError>()
        .is_some_and(BuildError::is_user_abort);

    log.force_verbose();
    log.print_summary();
    log.abort(&describe(err), user_abort);

    if let Some(ws) = workspace
        && let Err(e) = ws.cleanup()
    {
        log.warn(&format!("{e}"));
    }
    ExitCode::FAILURE
}

/// Join the error chain into one line, dropping causes whose text an outer
/// layer already carries.
fn describe(err: &anyhow::Error) -> String {
    let mut line = String::new();
    for cause in err.chain() {
        let text = cause.to_string();
        if line.contains(&text) {
            continue;
        }
        if !line.is_empty() {
            line.push_str(": ");
        }
        line.push_str(&text);
    }
    line
}
