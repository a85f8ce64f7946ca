//! Coldstart/hotstart progression of an ensemble member.

use std::fmt::{self, Display};

use serde::{Deserialize, Serialize};

/// Simulation phase a directory is prepared for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunPhase {
    /// Spin-up from rest.
    Coldstart,
    /// Production run, resuming from spin-up when there is one.
    Hotstart,
}

impl RunPhase {
    /// Lower-case name, used for directory names and file suffixes.
    pub fn name(&self) -> &'static str {
        match self {
            RunPhase::Coldstart => "coldstart",
            RunPhase::Hotstart => "hotstart",
        }
    }
}

impl Display for RunPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Lifecycle of one run across both phases.
///
/// Without spin-up the coldstart states are never visited.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunState {
    /// Nothing generated.
    NotStarted,
    /// Coldstart inputs and scripts written.
    ColdstartPrepared,
    /// Coldstart jobs handed to the scheduler.
    ColdstartSubmitted,
    /// Hotstart inputs and scripts written.
    HotstartPrepared,
    /// Hotstart jobs handed to the scheduler.
    HotstartSubmitted,
    /// Hotstart finished.
    Done,
}

impl RunState {
    /// Successor state, `None` once done.
    pub fn next(self, spinup: bool) -> Option<RunState> {
        match self {
            RunState::NotStarted if spinup => Some(RunState::ColdstartPrepared),
            RunState::NotStarted => Some(RunState::HotstartPrepared),
            RunState::ColdstartPrepared => Some(RunState::ColdstartSubmitted),
            RunState::ColdstartSubmitted => Some(RunState::HotstartPrepared),
            RunState::HotstartPrepared => Some(RunState::HotstartSubmitted),
            RunState::HotstartSubmitted => Some(RunState::Done),
            RunState::Done => None,
        }
    }

    /// Every state visited from [`RunState::NotStarted`] to [`RunState::Done`].
    pub fn path(spinup: bool) -> Vec<RunState> {
        let mut states = vec![RunState::NotStarted];
        let mut current = RunState::NotStarted;
        while let Some(next) = current.next(spinup) {
            states.push(next);
            current = next;
        }
        states
    }

    /// State reached once the files for `phase` are written.
    pub fn prepared(phase: RunPhase) -> RunState {
        match phase {
            RunPhase::Coldstart => RunState::ColdstartPrepared,
            RunPhase::Hotstart => RunState::HotstartPrepared,
        }
    }

    /// State reached once the jobs for `phase` are queued.
    pub fn submitted(phase: RunPhase) -> RunState {
        match phase {
            RunPhase::Coldstart => RunState::ColdstartSubmitted,
            RunPhase::Hotstart => RunState::HotstartSubmitted,
        }
    }

    /// Phase the state belongs to.
    pub fn phase(&self) -> Option<RunPhase> {
        match self {
            RunState::ColdstartPrepared | RunState::ColdstartSubmitted => Some(RunPhase::Coldstart),
            RunState::HotstartPrepared | RunState::HotstartSubmitted | RunState::Done => {
                Some(RunPhase::Hotstart)
            }
            RunState::NotStarted => None,
        }
    }
}

impl Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RunState::NotStarted => "not_started",
            RunState::ColdstartPrepared => "coldstart_prepared",
            RunState::ColdstartSubmitted => "coldstart_submitted",
            RunState::HotstartPrepared => "hotstart_prepared",
            RunState::HotstartSubmitted => "hotstart_submitted",
            RunState::Done => "done",
        };
        f.write_str(name)
    }
}
