//! In-memory engine and simulation fixtures for tests.
//!
//! [`FakeEngine`] implements the engine contract over a table of buffers
//! with a scripted clock and scripted solution convergence.
//! [`SimulationFixture`] lays out a namespace the way a real engine does
//! (models, packages, solutions, TDIS, ATS, exchanges) and builds one.

#![forbid(unsafe_code)]

pub mod engine;
pub mod fixtures;

pub use engine::{FakeEngine, SolutionScript};
pub use fixtures::{ListFixture, SimulationFixture};
