use std::fs;
use std::path::{Path, PathBuf};

use chrono::{Duration, NaiveDate};
use driver_config::{AdcircConfig, Configuration, ModelDriverConfig, RunConfiguration, SlurmConfig};
use driver_core::Platform;
use driver_generate::check::completion_percentage;
use driver_generate::{
    check_completion, check_run_directory, generate, CompletionStatus, RunPhase, RunState,
};

fn ensemble(dir: &Path, spinup: bool) -> PathBuf {
    let mesh = dir.join("fort.14.source");
    fs::write(&mesh, "test mesh\n").expect("mesh");
    let start = NaiveDate::from_ymd_opt(2008, 8, 23)
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .expect("date");
    let mut adcirc =
        AdcircConfig::new(&mesh, start, start + Duration::days(1), Duration::seconds(2)).expect("adcirc");
    if spinup {
        adcirc.set("tidal_spinup_duration", Duration::days(2)).expect("spinup");
    }
    let driver = ModelDriverConfig::new(Platform::Local, None).expect("driver");
    let slurm = SlurmConfig::new(None, 4, None).expect("slurm");
    let run = RunConfiguration::standalone(driver, slurm, adcirc, vec![]).expect("run");
    generate(&run, &dir.join("ensemble"), false).expect("generate").root
}

#[test]
fn fresh_ensemble_is_not_started() {
    let dir = tempfile::tempdir().expect("tempdir");
    let root = ensemble(dir.path(), false);

    let completions = check_completion(&root).expect("check");
    assert_eq!(completions.len(), 1);
    let run = &completions[0];
    assert_eq!(run.name, "unperturbed");
    assert_eq!(run.status, CompletionStatus::NotStarted);
    assert_eq!(run.state(), RunState::HotstartPrepared);
    assert!(run.problems.contains_key("fort.16"));
}

#[test]
fn spinup_ensemble_checks_coldstart_first() {
    let dir = tempfile::tempdir().expect("tempdir");
    let root = ensemble(dir.path(), true);

    let completions = check_completion(&root).expect("check");
    let phases: Vec<RunPhase> = completions.iter().map(|run| run.phase).collect();
    assert_eq!(phases, vec![RunPhase::Coldstart, RunPhase::Hotstart]);
    assert_eq!(completions[0].state(), RunState::ColdstartPrepared);
}

#[test]
fn progress_is_read_from_the_scheduler_log() {
    let dir = tempfile::tempdir().expect("tempdir");
    let root = ensemble(dir.path(), false);
    let run = root.join("runs").join("unperturbed");
    fs::write(run.join("fort.16"), "").expect("model log");
    let log = run.join("ADCIRC_HOTSTART.out.log");
    fs::write(&log, "  TIME STEP = 100\n  12.5% COMPLETE\n  45.0% COMPLETE\n").expect("log");

    let running = check_run_directory(&run, RunPhase::Hotstart).expect("check");
    assert_eq!(running.status, CompletionStatus::Running);
    assert_eq!(running.percentage, 45.0);
    assert_eq!(running.state(), RunState::HotstartSubmitted);
    assert_eq!(running.to_string(), "running - 45%");

    fs::write(&log, "  100.0% COMPLETE\nEnd Epilogue\n").expect("log");
    let done = check_run_directory(&run, RunPhase::Hotstart).expect("check");
    assert_eq!(done.status, CompletionStatus::Completed);
    assert_eq!(done.state(), RunState::Done);
}

#[test]
fn error_log_lines_are_reported() {
    let dir = tempfile::tempdir().expect("tempdir");
    let root = ensemble(dir.path(), false);
    let run = root.join("runs").join("unperturbed");
    fs::write(run.join("fort.16"), "").expect("model log");
    fs::write(run.join("ADCIRC_HOTSTART.out.log"), "End Epilogue\n").expect("log");
    fs::write(run.join("ADCIRC_HOTSTART.err.log"), "\nsegmentation fault\n").expect("err");

    let completion = check_run_directory(&run, RunPhase::Hotstart).expect("check");
    assert_eq!(completion.status, CompletionStatus::Error);
    assert_eq!(
        completion.problems["ADCIRC_HOTSTART.err.log"],
        vec!["segmentation fault".to_string()]
    );
}

#[test]
fn header_only_output_counts_as_running() {
    let dir = tempfile::tempdir().expect("tempdir");
    let root = ensemble(dir.path(), false);
    let run = root.join("runs").join("unperturbed");
    fs::write(run.join("fort.16"), "").expect("model log");
    fs::write(run.join("ADCIRC_HOTSTART.out.log"), "End Epilogue\n").expect("log");
    fs::write(run.join("fort.63.nc"), vec![0u8; 128]).expect("output");

    let completion = check_run_directory(&run, RunPhase::Hotstart).expect("check");
    assert_eq!(completion.status, CompletionStatus::Running);
    assert!(completion.problems.contains_key("fort.63.nc"));
}

#[test]
fn plain_directory_is_not_configured() {
    let dir = tempfile::tempdir().expect("tempdir");
    let completions = check_completion(dir.path()).expect("check");
    assert_eq!(completions.len(), 1);
    assert_eq!(completions[0].status, CompletionStatus::NotConfigured);
    assert_eq!(completions[0].state(), RunState::NotStarted);
}

#[test]
fn percentage_is_parsed_before_the_marker() {
    assert_eq!(completion_percentage("   45.0% COMPLETE"), Some(45.0));
    assert_eq!(completion_percentage("7% COMPLETE"), Some(7.0));
    assert_eq!(completion_percentage("TIME STEP = 10"), None);
}

#[test]
fn states_follow_the_ensemble_lifecycle() {
    assert_eq!(
        RunState::path(true),
        vec![
            RunState::NotStarted,
            RunState::ColdstartPrepared,
            RunState::ColdstartSubmitted,
            RunState::HotstartPrepared,
            RunState::HotstartSubmitted,
            RunState::Done,
        ]
    );
    assert_eq!(
        RunState::path(false),
        vec![
            RunState::NotStarted,
            RunState::HotstartPrepared,
            RunState::HotstartSubmitted,
            RunState::Done,
        ]
    );
    assert_eq!(RunState::Done.next(true), None);
    assert_eq!(RunState::HotstartPrepared.to_string(), "hotstart_prepared");
}
