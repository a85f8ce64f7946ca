use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use driver_generate::{
    needs_submission, parse_job_id, parse_queue, run_submission, setup_submission, unqueued_runs,
    CompletionStatus, QueuedJob, RunCompletion, RunPhase,
};

fn completion(directory: &Path, status: CompletionStatus) -> RunCompletion {
    RunCompletion {
        name: directory
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default(),
        directory: directory.to_path_buf(),
        phase: RunPhase::Hotstart,
        status,
        percentage: 0.0,
        problems: BTreeMap::new(),
    }
}

fn job(id: &str, directory: &Path) -> QueuedJob {
    QueuedJob {
        id: id.to_string(),
        name: "ADCIRC_HOTSTART".to_string(),
        directory: directory.to_path_buf(),
    }
}

#[test]
fn queue_listing_keeps_directories_with_spaces() {
    let listing = "JOBID NAME WORK_DIR\n\
                   101 ADCIRC_SETUP /scratch/storm/runs/run_a\n\
                   \n\
                   102   ADCIRC_HOTSTART   /scratch/my storm/runs/run_b\n\
                   103 orphan\n";
    let jobs = parse_queue(listing);
    assert_eq!(
        jobs,
        vec![
            QueuedJob {
                id: "101".to_string(),
                name: "ADCIRC_SETUP".to_string(),
                directory: PathBuf::from("/scratch/storm/runs/run_a"),
            },
            QueuedJob {
                id: "102".to_string(),
                name: "ADCIRC_HOTSTART".to_string(),
                directory: PathBuf::from("/scratch/my storm/runs/run_b"),
            },
        ]
    );
}

#[test]
fn finished_and_foreign_directories_are_never_resubmitted() {
    assert!(needs_submission(CompletionStatus::NotStarted));
    assert!(needs_submission(CompletionStatus::Running));
    assert!(needs_submission(CompletionStatus::Error));
    assert!(needs_submission(CompletionStatus::Failed));
    assert!(!needs_submission(CompletionStatus::Completed));
    assert!(!needs_submission(CompletionStatus::NotConfigured));
}

#[test]
fn runs_with_a_queued_job_are_skipped() {
    let dir = tempfile::tempdir().expect("tempdir");
    let runs = dir.path().join("runs");
    let names = ["queued", "waiting", "crashed", "done"];
    for name in names {
        fs::create_dir_all(runs.join(name)).expect("run dir");
    }
    let completions = vec![
        completion(&runs.join("queued"), CompletionStatus::NotStarted),
        completion(&runs.join("waiting"), CompletionStatus::NotStarted),
        completion(&runs.join("crashed"), CompletionStatus::Error),
        completion(&runs.join("done"), CompletionStatus::Completed),
    ];
    // same directory spelled through a parent hop
    let jobs = vec![job("7", &runs.join("done").join("..").join("queued"))];

    let unqueued: Vec<&str> = unqueued_runs(&completions, &jobs)
        .into_iter()
        .map(|completion| completion.name.as_str())
        .collect();
    assert_eq!(unqueued, vec!["waiting", "crashed"]);
}

#[test]
fn resubmission_chains_the_model_job_after_partitioning() {
    assert_eq!(setup_submission(), vec!["--parsable", "adcprep.job"]);
    assert_eq!(
        run_submission("311", None),
        vec!["--dependency=afterok:311", "adcirc.job"]
    );
    assert_eq!(
        run_submission("311", Some("42")),
        vec!["--dependency=afterok:311:42", "adcirc.job"]
    );
    assert_eq!(parse_job_id("311\n").as_deref(), Some("311"));
    assert_eq!(parse_job_id("\n311;hera\n").as_deref(), Some("311"));
    assert_eq!(parse_job_id("  \n"), None);
}
