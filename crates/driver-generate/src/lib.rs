#![deny(missing_docs)]
#![doc = "Coldstart/hotstart ensemble generation: native control files, coupling files, job scripts and links."]

pub mod check;
pub mod control;
pub mod coupling;
pub mod generate;
pub mod links;
pub mod queue;
pub mod report;
pub mod state;

pub use check::{check_completion, check_run_directory, CompletionStatus, RunCompletion};
pub use control::{AdcircDriver, Station, CONTROL_FILENAME};
pub use coupling::{ModelingSystem, COUPLING_FILENAMES};
pub use generate::{
    generate, generate_directory, EnsembleLayout, COLDSTART_DIRECTORY, RESTART_FILENAMES,
    RUNS_DIRECTORY, RUN_LINK, SETUP_LINK,
};
pub use links::{create_link, create_link_with, LinkOutcome};
pub use queue::{
    needs_submission, parse_job_id, parse_queue, run_submission, setup_submission, unqueued_runs,
    QueuedJob, QUEUE_FORMAT,
};
pub use report::GenerationReport;
pub use state::{RunPhase, RunState};
