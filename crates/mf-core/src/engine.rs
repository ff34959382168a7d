//! The primitive contract a solver engine exposes.
//!
//! Everything above this trait talks to the engine only through these calls.
//! Implementations wrap an actual solver (usually through FFI); the test kit
//! ships an in-memory one.

use std::cell::RefCell;
use std::rc::Rc;

use thiserror::Error;

use crate::address::VariableAddress;
use crate::buffer::RawBuffer;
use crate::error::{MfError, MfResult};

/// Errors an engine implementation reports.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    #[error("unknown variable address {0}")]
    UnknownAddress(String),

    #[error("variable {0} is not exposed by reference")]
    NotReferenceable(String),

    #[error("{0}")]
    Failed(String),
}

pub type EngineResult<T> = Result<T, EngineError>;

/// Discretization family of a model grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum GridKind {
    /// Layer/row/column grid.
    Rectilinear,
    /// Layered or fully unstructured cells.
    Unstructured,
}

impl GridKind {
    /// Parse the engine's grid type name.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "rectilinear" => Some(GridKind::Rectilinear),
            "unstructured" => Some(GridKind::Unstructured),
            _ => None,
        }
    }
}

/// Storage owned by the engine and reachable without copying.
///
/// Handles are only valid while no engine call is in flight.
pub trait LiveBuffer {
    /// Copy the current contents out.
    fn snapshot(&self) -> RawBuffer;

    /// Overwrite the contents in place. `value` must match shape and type.
    fn store(&self, value: &RawBuffer) -> MfResult<()>;
}

impl LiveBuffer for RefCell<RawBuffer> {
    fn snapshot(&self) -> RawBuffer {
        self.borrow().clone()
    }

    fn store(&self, value: &RawBuffer) -> MfResult<()> {
        let mut current = self.borrow_mut();
        current.ensure_same_layout(value, "live buffer")?;
        *current = value.clone();
        Ok(())
    }
}

pub type BufferRef = Rc<dyn LiveBuffer>;

/// Primitive memory and phase-control contract of a solver engine.
pub trait Engine {
    /// Every addressable variable, in engine order.
    fn input_var_names(&self) -> EngineResult<Vec<String>>;

    /// Resolve a hierarchical name to an address.
    fn var_address(&self, name: &str, component: &str, subcomponent: Option<&str>) -> String {
        VariableAddress::new(name, component, subcomponent).to_string()
    }

    fn get_value(&self, address: &str) -> EngineResult<RawBuffer>;

    /// Zero-copy handle onto the variable's storage.
    fn get_value_ref(&self, address: &str) -> EngineResult<BufferRef>;

    fn set_value(&mut self, address: &str, value: &RawBuffer) -> EngineResult<()>;

    fn grid_kind(&self, grid_id: i32) -> EngineResult<GridKind>;

    fn subcomponent_count(&self) -> EngineResult<usize>;

    /// Offset applied to every node number the engine stores.
    fn node_index_base(&self) -> i32 {
        1
    }

    fn version(&self) -> Option<String> {
        None
    }

    fn initialize(&mut self) -> EngineResult<()>;
    fn current_time(&self) -> EngineResult<f64>;
    fn end_time(&self) -> EngineResult<f64>;
    fn time_step(&self) -> EngineResult<f64>;
    fn prepare_time_step(&mut self, dt: f64) -> EngineResult<()>;
    fn prepare_solve(&mut self, solution_id: i32) -> EngineResult<()>;

    /// One nonlinear iteration. Returns `true` once the solution has converged.
    fn solve(&mut self, solution_id: i32) -> EngineResult<bool>;

    fn finalize_solve(&mut self, solution_id: i32) -> EngineResult<()>;
    fn finalize_time_step(&mut self) -> EngineResult<()>;
    fn finalize(&mut self) -> EngineResult<()>;
}

impl From<EngineError> for MfError {
    fn from(e: EngineError) -> Self {
        match e {
            EngineError::UnknownAddress(address) => MfError::AddressNotFound { address },
            EngineError::NotReferenceable(address) => MfError::NotReferenceable { address },
            EngineError::Failed(message) => MfError::EngineFailure {
                context: "engine call".to_string(),
                message,
            },
        }
    }
}
