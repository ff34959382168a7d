//! mf-model: a bound simulation and its parts.
//!
//! Contains:
//! - package (one bound package with typed and opaque access)
//! - model (grid, packages, convergence flag)
//! - exchange (model-to-model connection lists)
//! - solution (solution groups and their solver settings)
//! - simulation (binding from the engine namespace, time state)
//! - view (the simulation as seen from a callback)

pub mod exchange;
pub mod model;
pub mod package;
pub mod simulation;
pub mod solution;
pub mod view;

pub use exchange::Exchange;
pub use model::Model;
pub use package::{Package, PackageData, PackagePath};
pub use simulation::Simulation;
pub use solution::SolutionGroup;
pub use view::SimulationView;
