mod cli;
mod error;
mod logging;

use crate::cli::{Cli, usage_error};
use crate::error::{ErrorKind, Result};
use clap::Parser;
use exn::ResultExt;
use grabbags_bagit::Bagit;
use grabbags_batch::{BatchRunner, Plan};
use grabbags_config::Settings;
use std::process::ExitCode;

fn main() -> ExitCode {
    let cli = Cli::parse();
    // Every configuration problem is reported before any directory is read.
    let settings = Settings::load(cli.config.as_deref()).unwrap_or_else(|e| usage_error(&*e));
    let plan = cli.options(&settings).resolve().unwrap_or_else(|e| usage_error(&*e));
    match run(&cli, &settings, plan) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:?}");
            ExitCode::FAILURE
        },
    }
}

fn run(cli: &Cli, settings: &Settings, plan: Plan) -> Result<()> {
    logging::init(cli.quiet || settings.quiet, cli.log.as_deref().or(settings.log.as_deref()))?;
    let config = plan.config.with_default_checksums(&settings.checksums);
    tracing::debug!(kind = %plan.kind, processes = config.processes, "Starting run");

    let runner = BatchRunner::new(Bagit::handle());
    let result = runner.run(&cli.directories, plan.kind, &config).or_raise(|| ErrorKind::Batch)?;
    result.report().log();
    Ok(())
}
