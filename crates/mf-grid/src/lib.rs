//! mf-grid: model grid geometry and node remapping.
//!
//! Provides:
//! - Logical grid shapes with row-major ravel/unravel
//! - Bidirectional dense <-> reduced node mapping
//! - Lazily loaded per-model discretization

pub mod discretization;
pub mod node_map;
pub mod shape;

pub use discretization::{DIS_NAME, Discretization};
pub use node_map::NodeMap;
pub use shape::GridShape;
