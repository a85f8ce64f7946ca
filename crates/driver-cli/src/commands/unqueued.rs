use std::error::Error;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use clap::Args;
use driver_core::{DriverError, ErrorInfo};
use driver_generate::{
    check_completion, parse_job_id, parse_queue, run_submission, setup_submission, unqueued_runs,
    QueuedJob, QUEUE_FORMAT,
};
use tracing::{debug, info};

#[derive(Args, Debug)]
pub struct UnqueuedArgs {
    /// Ensemble root or single run directory.
    #[arg(default_value = ".")]
    pub directory: PathBuf,
    /// Resubmit every unqueued run.
    #[arg(long)]
    pub submit: bool,
    /// Job id every resubmitted run also waits for.
    #[arg(long)]
    pub dependency: Option<String>,
    /// Print the unqueued runs as JSON.
    #[arg(long)]
    pub json: bool,
}

fn execute(mut command: Command, program: &str, directory: &Path) -> Result<String, DriverError> {
    let Output {
        status,
        stdout,
        stderr,
    } = command
        .output()
        .map_err(|err| DriverError::io("spawn_scheduler", directory, err))?;
    if !status.success() {
        return Err(DriverError::Io(
            ErrorInfo::new(
                "scheduler_command_failed",
                format!(
                    "{program} exited with {status}: {}",
                    String::from_utf8_lossy(&stderr).trim()
                ),
            )
            .with_context("program", program)
            .with_context("path", directory.display().to_string()),
        ));
    }
    Ok(String::from_utf8_lossy(&stdout).into_owned())
}

fn queued_jobs(directory: &Path) -> Result<Vec<QueuedJob>, DriverError> {
    let mut command = Command::new("squeue");
    command.args(["--noheader", "--format", QUEUE_FORMAT]);
    match std::env::var("USER") {
        Ok(user) if !user.is_empty() => command.args(["--user", user.as_str()]),
        _ => command.arg("--me"),
    };
    let jobs = parse_queue(&execute(command, "squeue", directory)?);
    debug!(jobs = jobs.len(), "read scheduler queue");
    Ok(jobs)
}

fn submit(directory: &Path, dependency: Option<&str>) -> Result<String, DriverError> {
    let mut setup = Command::new("sbatch");
    setup.args(setup_submission()).current_dir(directory);
    let output = execute(setup, "sbatch", directory)?;
    let setup_job = parse_job_id(&output).ok_or_else(|| {
        DriverError::Io(
            ErrorInfo::new("job_id_missing", "sbatch printed no job id")
                .with_context("path", directory.display().to_string())
                .with_context("output", output.trim()),
        )
    })?;
    let mut run = Command::new("sbatch");
    run.args(run_submission(&setup_job, dependency))
        .current_dir(directory);
    execute(run, "sbatch", directory)?;
    Ok(setup_job)
}

pub fn run(args: &UnqueuedArgs) -> Result<(), Box<dyn Error>> {
    let completions = check_completion(&args.directory)?;
    let jobs = queued_jobs(&args.directory)?;
    let unqueued = unqueued_runs(&completions, &jobs);
    for completion in &unqueued {
        if args.submit {
            info!(run = %completion.name, "submitting unqueued run");
            let setup_job = submit(&completion.directory, args.dependency.as_deref())?;
            debug!(run = %completion.name, setup_job = %setup_job, "submitted");
        } else {
            info!(run = %completion.name, status = %completion.status, "found unqueued run");
        }
    }
    if args.json {
        println!("{}", serde_json::to_string_pretty(&unqueued)?);
    } else {
        for completion in &unqueued {
            println!("{}: {}", completion.name, completion.directory.display());
        }
    }
    Ok(())
}
