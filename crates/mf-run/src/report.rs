//! What a finished run reports back.

use mf_core::{MfError, SolutionId};
use serde::{Deserialize, Serialize};

/// A solution group that ended a time step without converging.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NonConvergence {
    pub solution: SolutionId,
    /// Stress period, 0-based.
    pub kper: usize,
    /// Time step within the period, 0-based.
    pub kstp: usize,
    /// Outer iterations spent before giving up.
    pub iterations: usize,
}

impl NonConvergence {
    pub fn to_error(&self) -> MfError {
        MfError::ConvergenceFailure {
            solution: self.solution.get(),
            kper: self.kper,
            kstp: self.kstp,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunReport {
    pub time_steps: usize,
    /// Outer iterations across all groups and steps.
    pub iterations: usize,
    pub nonconverged: Vec<NonConvergence>,
}

impl RunReport {
    pub fn converged(&self) -> bool {
        self.nonconverged.is_empty()
    }

    /// Non-convergence entries as errors, in the order they happened.
    pub fn failures(&self) -> impl Iterator<Item = MfError> + '_ {
        self.nonconverged.iter().map(NonConvergence::to_error)
    }
}
