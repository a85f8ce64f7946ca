//! Completion status of generated run directories, read from model and scheduler logs.

use std::collections::BTreeMap;
use std::fmt::{self, Display};
use std::fs;
use std::path::{Path, PathBuf};

use driver_core::errors::DriverError;
use serde::{Deserialize, Serialize};
use tracing::debug;
use walkdir::WalkDir;

use crate::generate::{COLDSTART_DIRECTORY, RUNS_DIRECTORY};
use crate::state::{RunPhase, RunState};

/// Output files at or below this size hold headers only.
const MINIMUM_OUTPUT_SIZE: u64 = 43_081;
const REQUIRED_INPUTS: [&str; 2] = ["fort.14", "fort.15"];
const MODEL_LOG: &str = "fort.16";

/// Progress of one run directory, in decreasing order of severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompletionStatus {
    /// Not a model run directory.
    NotConfigured,
    /// Inputs present, model not launched.
    NotStarted,
    /// Coupling layer log empty.
    Failed,
    /// Scheduler or model reported an error.
    Error,
    /// Launched and not finished.
    Running,
    /// Scheduler epilogue reached.
    Completed,
}

impl Display for CompletionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CompletionStatus::NotConfigured => "not_configured",
            CompletionStatus::NotStarted => "not_started",
            CompletionStatus::Failed => "failed",
            CompletionStatus::Error => "error",
            CompletionStatus::Running => "running",
            CompletionStatus::Completed => "completed",
        };
        f.write_str(name)
    }
}

/// Status of one directory with the problems found, keyed by file name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunCompletion {
    /// Directory name.
    pub name: String,
    /// Run directory as it was given to the check.
    pub directory: PathBuf,
    /// Phase the directory runs.
    pub phase: RunPhase,
    /// Most severe status found.
    pub status: CompletionStatus,
    /// Last progress percentage printed by the model.
    pub percentage: f64,
    /// Problem descriptions per file.
    pub problems: BTreeMap<String, Vec<String>>,
}

impl RunCompletion {
    /// Run state implied by the status.
    pub fn state(&self) -> RunState {
        match self.status {
            CompletionStatus::NotConfigured => RunState::NotStarted,
            CompletionStatus::NotStarted => RunState::prepared(self.phase),
            CompletionStatus::Failed | CompletionStatus::Error | CompletionStatus::Running => {
                RunState::submitted(self.phase)
            }
            CompletionStatus::Completed => RunState::submitted(self.phase)
                .next(true)
                .unwrap_or(RunState::Done),
        }
    }
}

impl Display for RunCompletion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {}%", self.status, self.percentage)
    }
}

struct Findings {
    statuses: Vec<CompletionStatus>,
    problems: BTreeMap<String, Vec<String>>,
}

impl Findings {
    fn new() -> Self {
        Self {
            statuses: Vec::new(),
            problems: BTreeMap::new(),
        }
    }

    fn note(&mut self, status: CompletionStatus, file: &str, problem: impl Into<String>) {
        self.statuses.push(status);
        self.problems
            .entry(file.to_string())
            .or_default()
            .push(problem.into());
    }

    fn status(&self) -> CompletionStatus {
        self.statuses
            .iter()
            .min()
            .copied()
            .unwrap_or(CompletionStatus::Completed)
    }
}

fn files_matching(directory: &Path, predicate: impl Fn(&str) -> bool) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = WalkDir::new(directory)
        .min_depth(1)
        .max_depth(1)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|entry| entry.file_name().to_str().is_some_and(&predicate))
        .map(|entry| entry.into_path())
        .collect();
    files.sort();
    files
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn read_lines(path: &Path) -> Result<Vec<String>, DriverError> {
    let bytes = fs::read(path).map_err(|err| DriverError::io("read_log", path, err))?;
    Ok(String::from_utf8_lossy(&bytes)
        .lines()
        .map(str::to_string)
        .collect())
}

fn is_error_line(line: &str) -> bool {
    line.get(..5)
        .is_some_and(|start| start.eq_ignore_ascii_case("error"))
}

/// Percentage printed as `N% COMPLETE` on `line`.
pub fn completion_percentage(line: &str) -> Option<f64> {
    let end = line.find("% COMPLETE")?;
    let digits = line[..end]
        .char_indices()
        .rev()
        .take_while(|(_, character)| character.is_ascii_digit() || *character == '.')
        .last()
        .map(|(index, _)| index)?;
    line[digits..end].parse().ok()
}

/// Checks one run directory.
pub fn check_run_directory(directory: &Path, phase: RunPhase) -> Result<RunCompletion, DriverError> {
    let name = file_name(directory);
    let mut findings = Findings::new();
    let mut percentage = 0.0;

    let missing: Vec<&str> = REQUIRED_INPUTS
        .into_iter()
        .filter(|input| !directory.join(input).exists())
        .collect();
    for input in &missing {
        findings.note(CompletionStatus::NotConfigured, input, "not a model run directory");
    }
    if !missing.is_empty() {
        return Ok(RunCompletion {
            name,
            directory: directory.to_path_buf(),
            phase,
            status: findings.status(),
            percentage,
            problems: findings.problems,
        });
    }

    if !directory.join(MODEL_LOG).exists() {
        findings.note(CompletionStatus::NotStarted, MODEL_LOG, "model output log not found");
    }

    for path in files_matching(directory, |name| name.ends_with(".err.log")) {
        let lines = read_lines(&path)?;
        let file = file_name(&path);
        for line in lines.into_iter().filter(|line| !line.trim().is_empty()) {
            findings.note(CompletionStatus::Error, &file, line);
        }
    }

    let output_logs = files_matching(directory, |name| name.ends_with(".out.log"));
    if output_logs.is_empty() {
        findings.note(CompletionStatus::NotStarted, "*.out.log", "no scheduler output log found");
    }
    for path in output_logs {
        let lines = read_lines(&path)?;
        let file = file_name(&path);
        if percentage == 0.0 {
            if let Some(found) = lines.iter().rev().find_map(|line| completion_percentage(line)) {
                percentage = found;
            }
        }
        for line in lines.iter().filter(|line| is_error_line(line)) {
            findings.note(CompletionStatus::Error, &file, line.clone());
        }
        if !lines.iter().any(|line| line.contains("End Epilogue")) {
            findings.note(CompletionStatus::Running, &file, "job is still running (no epilogue)");
        }
    }

    for path in files_matching(directory, |name| name.starts_with("PET") && name.ends_with(".ESMF_LogFile")) {
        let lines = read_lines(&path)?;
        let file = file_name(&path);
        if lines.is_empty() {
            findings.note(CompletionStatus::Failed, &file, "empty coupling log");
        }
        for line in lines.iter().filter(|line| is_error_line(line)) {
            findings.note(CompletionStatus::Error, &file, line.clone());
        }
    }

    for path in files_matching(directory, |name| name.starts_with("fort.") && name.ends_with(".nc")) {
        let size = fs::metadata(&path).map(|metadata| metadata.len()).unwrap_or(0);
        if size <= MINIMUM_OUTPUT_SIZE {
            findings.note(
                CompletionStatus::Running,
                &file_name(&path),
                format!("output holds headers only (size {size} not greater than {MINIMUM_OUTPUT_SIZE})"),
            );
        }
    }

    debug!(run = %name, status = %findings.status(), percentage, "checked run directory");
    Ok(RunCompletion {
        name,
        directory: directory.to_path_buf(),
        phase,
        status: findings.status(),
        percentage,
        problems: findings.problems,
    })
}

/// Checks an ensemble root: `coldstart/` when present, then every `runs/*` directory.
///
/// A directory without `runs/` is checked as a single hotstart run.
pub fn check_completion(directory: &Path) -> Result<Vec<RunCompletion>, DriverError> {
    let mut completions = Vec::new();
    let coldstart = directory.join(COLDSTART_DIRECTORY);
    if coldstart.is_dir() {
        completions.push(check_run_directory(&coldstart, RunPhase::Coldstart)?);
    }
    let runs = directory.join(RUNS_DIRECTORY);
    if runs.is_dir() {
        let members: Vec<PathBuf> = files_matching(&runs, |_| true)
            .into_iter()
            .filter(|path| path.is_dir())
            .collect();
        for member in members {
            completions.push(check_run_directory(&member, RunPhase::Hotstart)?);
        }
    } else if completions.is_empty() {
        completions.push(check_run_directory(directory, RunPhase::Hotstart)?);
    }
    Ok(completions)
}
