//! `precheck` application entry point.
//!
//! Uses `eyre` for opaque error handling at the application boundary,
//! converting domain-specific errors into human-readable reports.
//!
//! Configuration is loaded with layered precedence via `OrthoConfig`:
//! 1. Application defaults
//! 2. Configuration file (`~/.config/precheck/config.toml` or path from `PRECHECK_CONFIG_PATH`)
//! 3. Environment variables (`PRECHECK_*`)
//! 4. Command-line arguments
//!
//! Exit codes: 0 when the image reported its broken preconditions as
//! expected, 1 when it did not, 2 when verification could not run.

use std::process::ExitCode;

use clap::Parser;
use eyre::{Report, Result as EyreResult, WrapErr};
use mockable::DefaultEnv;
use precheck::api::{self, CommandOutcome, Plan, VerifyParams};
use precheck::config::{AppConfig, CheckLogsArgs, Cli, Commands, load_config};
use precheck::error::ContainerError;
use precheck::report::Verdict;

/// Exit code for a verification that could not be carried out.
const OPERATIONAL_ERROR: u8 = 2;

fn main() -> ExitCode {
    let cli = Cli::parse();
    precheck::logging::init(cli.verbose);

    match run(&cli) {
        Ok(outcome) => ExitCode::from(outcome.exit_code()),
        Err(report) => {
            report_error(&report);
            ExitCode::from(OPERATIONAL_ERROR)
        }
    }
}

#[expect(clippy::print_stderr, reason = "the error report is the CLI's output")]
fn report_error(report: &Report) {
    eprintln!("Error: {report:?}");
}

/// Load configuration and dispatch the subcommand.
fn run(cli: &Cli) -> EyreResult<CommandOutcome> {
    let config = load_config(cli).map_err(Report::from)?;

    match &cli.command {
        Commands::Verify(_) => run_verify(&config),
        Commands::Plan => {
            let planned = api::plan(&config).map_err(Report::from)?;
            print_plan(&planned);
            Ok(CommandOutcome::Success)
        }
        Commands::CheckLogs(args) => run_check_logs(&config, args),
    }
}

fn run_verify(config: &AppConfig) -> EyreResult<CommandOutcome> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|error| ContainerError::RuntimeCreationFailed {
            message: error.to_string(),
        })?;
    let env = DefaultEnv::new();

    let run = api::verify(VerifyParams {
        config,
        runtime_handle: runtime.handle(),
        env: &env,
    })
    .wrap_err("verification could not be carried out")?;

    print_verdict(&run.verdict);
    Ok(CommandOutcome::from_verdict(&run.verdict))
}

fn run_check_logs(config: &AppConfig, args: &CheckLogsArgs) -> EyreResult<CommandOutcome> {
    let verdict = api::check_logs(&args.path, args.status, config)
        .wrap_err_with(|| format!("could not check {}", args.path))?;
    print_verdict(&verdict);
    Ok(CommandOutcome::from_verdict(&verdict))
}

#[expect(clippy::print_stdout, reason = "CLI output is the intended behaviour")]
fn print_verdict(verdict: &Verdict) {
    println!("{verdict}");
}

#[expect(clippy::print_stdout, reason = "CLI output is the intended behaviour")]
fn print_plan(planned: &Plan) {
    let request = &planned.request;
    println!("image: {}", request.image());
    println!("name: {}", request.name().unwrap_or("(engine-assigned)"));
    println!("tty: {}", request.tty());
    for bind in request.binds() {
        println!("bind: {bind}");
    }
    for entry in request.env() {
        println!("env: {entry}");
    }
    for expected in planned.scenario.expected_diagnostics() {
        println!("expect: {expected}");
    }
}
