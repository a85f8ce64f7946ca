//! Scheduler queue listings and the run directories missing from them.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::check::{CompletionStatus, RunCompletion};
use crate::generate::{RUN_LINK, SETUP_LINK};

/// `squeue --format` string read by [`parse_queue`]: job id, job name, working directory.
pub const QUEUE_FORMAT: &str = "%i %j %Z";

/// One job listed by the scheduler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueuedJob {
    /// Scheduler job id.
    pub id: String,
    /// Job name.
    pub name: String,
    /// Working directory the job runs in.
    pub directory: PathBuf,
}

/// Parses a queue listing written with [`QUEUE_FORMAT`].
///
/// A `JOBID` header line and malformed lines are ignored. The working directory is the
/// rest of the line, so it may contain spaces.
pub fn parse_queue(listing: &str) -> Vec<QueuedJob> {
    listing
        .lines()
        .filter_map(|line| {
            let (id, rest) = line.trim().split_once(char::is_whitespace)?;
            let (name, directory) = rest.trim_start().split_once(char::is_whitespace)?;
            let directory = directory.trim();
            if id == "JOBID" || directory.is_empty() {
                return None;
            }
            Some(QueuedJob {
                id: id.to_string(),
                name: name.to_string(),
                directory: PathBuf::from(directory),
            })
        })
        .collect()
}

fn same_directory(left: &Path, right: &Path) -> bool {
    match (fs::canonicalize(left), fs::canonicalize(right)) {
        (Ok(left), Ok(right)) => left == right,
        _ => left == right,
    }
}

/// Whether a run in `status` still needs a job in the queue.
pub fn needs_submission(status: CompletionStatus) -> bool {
    !matches!(
        status,
        CompletionStatus::Completed | CompletionStatus::NotConfigured
    )
}

/// Runs that have not completed and have no job queued in their directory.
pub fn unqueued_runs<'a>(
    completions: &'a [RunCompletion],
    jobs: &[QueuedJob],
) -> Vec<&'a RunCompletion> {
    completions
        .iter()
        .filter(|completion| needs_submission(completion.status))
        .filter(|completion| {
            match jobs
                .iter()
                .find(|job| same_directory(&job.directory, &completion.directory))
            {
                Some(job) => {
                    debug!(run = %completion.name, job = %job.id, "run is queued");
                    false
                }
                None => true,
            }
        })
        .collect()
}

/// `sbatch` arguments submitting the partition job of a run directory.
pub fn setup_submission() -> Vec<String> {
    vec!["--parsable".to_string(), SETUP_LINK.to_string()]
}

/// `sbatch` arguments submitting the model job after `setup_job`, and after `dependency`
/// when given.
pub fn run_submission(setup_job: &str, dependency: Option<&str>) -> Vec<String> {
    let mut after = format!("afterok:{setup_job}");
    if let Some(dependency) = dependency {
        after.push(':');
        after.push_str(dependency);
    }
    vec![format!("--dependency={after}"), RUN_LINK.to_string()]
}

/// Job id printed by `sbatch --parsable`, which may carry a `;cluster` suffix.
pub fn parse_job_id(output: &str) -> Option<String> {
    let line = output.lines().map(str::trim).find(|line| !line.is_empty())?;
    let id = line.split(';').next()?.trim();
    (!id.is_empty()).then(|| id.to_string())
}
