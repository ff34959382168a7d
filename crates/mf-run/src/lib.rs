//! mf-run: drive a bound simulation through its time loop.
//!
//! Contains:
//! - driver (the phase state machine)
//! - phase (callback invocation points)
//! - options (run options, YAML-loadable)
//! - report (run summary and non-convergence records)
//! - error (run errors)

pub mod driver;
pub mod error;
pub mod options;
pub mod phase;
pub mod report;

pub use driver::run;
pub use error::{RunError, RunResult};
pub use options::RunOptions;
pub use phase::Phase;
pub use report::{NonConvergence, RunReport};
