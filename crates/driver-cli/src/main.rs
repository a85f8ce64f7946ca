use std::error::Error;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use commands::{
    check::{self, CheckArgs},
    generate::{self, GenerateArgs},
    initialize::{self, InitializeArgs},
    unqueued::{self, UnqueuedArgs},
};
use driver_core::DriverError;
use tracing::error;
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser, Debug)]
#[command(
    name = "coupled-driver",
    about = "Coupled ocean model run configuration generator"
)]
struct Cli {
    /// Show debug log messages.
    #[arg(long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Write configuration documents for a new run from command line flags.
    Initialize(InitializeArgs),
    /// Generate the coldstart/hotstart ensemble tree from configuration documents.
    Generate(GenerateArgs),
    /// Report the completion status of a generated ensemble.
    Check(CheckArgs),
    /// Find unfinished runs with no queued job and optionally resubmit them.
    Unqueued(UnqueuedArgs),
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn report(err: &(dyn Error + 'static)) {
    match err.downcast_ref::<DriverError>() {
        Some(driver) => {
            let info = driver.info();
            error!(code = %info.code, "{driver}");
            if let Some(hint) = &info.hint {
                error!("hint: {hint}");
            }
        }
        None => error!("{err}"),
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    let result = match cli.command {
        Command::Initialize(args) => initialize::run(&args),
        Command::Generate(args) => generate::run(&args),
        Command::Check(args) => check::run(&args),
        Command::Unqueued(args) => unqueued::run(&args),
    };
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            report(err.as_ref());
            ExitCode::FAILURE
        }
    }
}
