//! Record of what one generation pass produced.

use std::path::{Path, PathBuf};

use driver_core::errors::{DriverError, ErrorInfo};
use driver_core::files::WriteOutcome;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::links::LinkOutcome;
use crate::state::RunState;

/// Every artefact touched by [`crate::generate()`] and the state each run reached.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationReport {
    /// Ensemble root.
    pub root: PathBuf,
    /// State of the shared coldstart directory, when spin-up is configured.
    pub coldstart: Option<RunState>,
    /// File writes, in generation order.
    pub files: Vec<WriteOutcome>,
    /// Link requests, in generation order.
    pub links: Vec<LinkOutcome>,
    /// State per ensemble member, in generation order.
    pub runs: IndexMap<String, RunState>,
}

impl GenerationReport {
    /// Empty report for the ensemble at `root`.
    pub fn new(root: &Path) -> Self {
        Self {
            root: root.to_path_buf(),
            coldstart: None,
            files: Vec::new(),
            links: Vec::new(),
            runs: IndexMap::new(),
        }
    }

    pub(crate) fn file(&mut self, outcome: WriteOutcome) {
        self.files.push(outcome);
    }

    pub(crate) fn link(&mut self, outcome: LinkOutcome) {
        self.links.push(outcome);
    }

    pub(crate) fn reached(&mut self, name: &str, state: RunState) {
        self.runs.insert(name.to_string(), state);
    }

    /// Files written by this pass.
    pub fn written(&self) -> Vec<&Path> {
        self.files
            .iter()
            .filter(|outcome| outcome.written())
            .map(WriteOutcome::path)
            .collect()
    }

    /// Files left untouched because they already existed.
    pub fn skipped(&self) -> Vec<&Path> {
        let files = self
            .files
            .iter()
            .filter(|outcome| !outcome.written())
            .map(WriteOutcome::path);
        let links = self
            .links
            .iter()
            .filter(|outcome| matches!(outcome, LinkOutcome::Skipped(_)))
            .map(LinkOutcome::path);
        files.chain(links).collect()
    }

    /// Links pointing at existing files.
    pub fn linked(&self) -> Vec<&Path> {
        self.links_matching(|outcome| matches!(outcome, LinkOutcome::Linked(_)))
    }

    /// Links that fell back to copies.
    pub fn copied(&self) -> Vec<&Path> {
        self.links_matching(|outcome| matches!(outcome, LinkOutcome::Copied(_)))
    }

    /// Links whose targets do not exist yet.
    pub fn dangling(&self) -> Vec<&Path> {
        self.links_matching(|outcome| matches!(outcome, LinkOutcome::Dangling(_)))
    }

    fn links_matching(&self, predicate: impl Fn(&LinkOutcome) -> bool) -> Vec<&Path> {
        self.links
            .iter()
            .filter(|outcome| predicate(outcome))
            .map(LinkOutcome::path)
            .collect()
    }

    /// One-line tally for logs.
    pub fn summary(&self) -> String {
        format!(
            "{} written, {} skipped, {} linked, {} copied, {} dangling, {} run(s)",
            self.written().len(),
            self.skipped().len(),
            self.linked().len(),
            self.copied().len(),
            self.dangling().len(),
            self.runs.len(),
        )
    }

    /// Pretty JSON rendering for machine consumers.
    pub fn to_json(&self) -> Result<String, DriverError> {
        serde_json::to_string_pretty(self)
            .map_err(|err| DriverError::Serde(ErrorInfo::new("report_serialize", err.to_string())))
    }
}
