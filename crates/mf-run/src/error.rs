//! Error types for running a simulation.

use std::path::PathBuf;

use mf_core::MfError;
use thiserror::Error;

use crate::phase::Phase;

#[derive(Error, Debug)]
pub enum RunError {
    #[error("Callback failed during {phase}: {source}")]
    Callback {
        phase: Phase,
        #[source]
        source: MfError,
    },

    #[error(transparent)]
    Mf(#[from] MfError),

    #[error("Failed to write address dump: {path}")]
    Dump {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid run options: {what}")]
    InvalidOptions { what: String },
}

pub type RunResult<T> = Result<T, RunError>;

impl RunError {
    /// The phase a callback failed in, if that is what stopped the run.
    pub fn phase(&self) -> Option<Phase> {
        match self {
            RunError::Callback { phase, .. } => Some(*phase),
            _ => None,
        }
    }
}
