#![deny(missing_docs)]
#![doc = "Job script model: scheduler headers, model jobs and ensemble dispatch scripts."]

pub mod adcirc;
pub mod bash;
pub mod ensemble;
pub mod job;
pub mod script;

pub use adcirc::{
    adcirc_run_job, adcirc_setup_job, COLDSTART_JOB_NAME, HOTSTART_JOB_NAME, SETUP_JOB_NAME,
};
pub use bash::{bash_for_loop, bash_if_statement};
pub use ensemble::{EnsembleCleanupScript, EnsembleRunScript};
pub use job::{default_job_name, JobScript, DEFAULT_LOG_FILENAME};
pub use script::{make_executable, Script, SHEBANG};
