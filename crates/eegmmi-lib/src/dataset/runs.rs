use crate::error::{DatasetError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

pub const BASELINE_RUNS: [u8; 2] = [1, 2];
pub const HAND_IMAGINED_RUNS: [u8; 3] = [4, 8, 12];
pub const HAND_EXECUTED_RUNS: [u8; 3] = [3, 7, 11];
pub const FEET_IMAGINED_RUNS: [u8; 3] = [6, 10, 14];
pub const FEET_EXECUTED_RUNS: [u8; 3] = [5, 9, 13];

/// What the subject was doing during a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunRole {
    BaselineEyesOpen,
    BaselineEyesClosed,
    /// Left/right fist, real movement.
    HandExecuted,
    /// Left/right fist, imagined.
    HandImagined,
    /// Both fists/both feet, real movement.
    FeetExecuted,
    /// Both fists/both feet, imagined.
    FeetImagined,
}

impl RunRole {
    pub fn is_baseline(self) -> bool {
        matches!(self, Self::BaselineEyesOpen | Self::BaselineEyesClosed)
    }

    pub fn is_feet(self) -> bool {
        matches!(self, Self::FeetExecuted | Self::FeetImagined)
    }
}

impl fmt::Display for RunRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::BaselineEyesOpen => "baseline-eyes-open",
            Self::BaselineEyesClosed => "baseline-eyes-closed",
            Self::HandExecuted => "hand-executed",
            Self::HandImagined => "hand-imagined",
            Self::FeetExecuted => "feet-executed",
            Self::FeetImagined => "feet-imagined",
        };
        f.write_str(name)
    }
}

fn role_of(index: u8) -> Option<RunRole> {
    let role = match index {
        1 => RunRole::BaselineEyesOpen,
        2 => RunRole::BaselineEyesClosed,
        3..=14 => match (index - 3) % 4 {
            0 => RunRole::HandExecuted,
            1 => RunRole::HandImagined,
            2 => RunRole::FeetExecuted,
            _ => RunRole::FeetImagined,
        },
        _ => return None,
    };
    Some(role)
}

/// One of the 14 runs recorded per subject.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RunSpec {
    pub index: u8,
    pub role: RunRole,
}

impl RunSpec {
    pub fn from_index(index: u8) -> Result<Self> {
        role_of(index)
            .map(|role| Self { index, role })
            .ok_or(DatasetError::InvalidRun(index))
    }

    /// Key of the run inside a session.
    pub fn label(&self) -> String {
        match self.role {
            RunRole::BaselineEyesOpen => "baseline_eye_open".to_string(),
            RunRole::BaselineEyesClosed => "baseline_eye_closed".to_string(),
            _ => format!("run_{}", self.index),
        }
    }
}

/// Which task runs to fetch; baseline runs are always included.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSelectionPolicy {
    pub imagined: bool,
    pub executed: bool,
}

impl Default for RunSelectionPolicy {
    fn default() -> Self {
        Self {
            imagined: true,
            executed: false,
        }
    }
}

impl RunSelectionPolicy {
    pub fn hand_runs(&self) -> Vec<u8> {
        self.accumulate(HAND_IMAGINED_RUNS, HAND_EXECUTED_RUNS)
    }

    pub fn feet_runs(&self) -> Vec<u8> {
        self.accumulate(FEET_IMAGINED_RUNS, FEET_EXECUTED_RUNS)
    }

    fn accumulate(&self, imagined: [u8; 3], executed: [u8; 3]) -> Vec<u8> {
        let mut runs = Vec::with_capacity(6);
        if self.imagined {
            runs.extend(imagined);
        }
        if self.executed {
            runs.extend(executed);
        }
        runs
    }
}

/// Baseline runs, then hand runs, then feet runs, each group in accumulation
/// order (imagined before executed).
pub fn resolve_run_set(policy: &RunSelectionPolicy) -> Vec<RunSpec> {
    BASELINE_RUNS
        .into_iter()
        .chain(policy.hand_runs())
        .chain(policy.feet_runs())
        .filter_map(|index| role_of(index).map(|role| RunSpec { index, role }))
        .collect()
}
