//! mf-core: foundation for binding a solver engine's flat memory space.
//!
//! Contains:
//! - error (shared error taxonomy)
//! - ids (engine model and solution ids)
//! - numeric (Real, sentinel, integral checks)
//! - address (hierarchical variable addresses)
//! - buffer (typed raw buffers exchanged with the engine)
//! - engine (the primitive contract an engine implements)
//! - session (shared, failure-aware engine handle)
//! - variable (an address bound for live or copied access)

pub mod address;
pub mod buffer;
pub mod engine;
pub mod error;
pub mod ids;
pub mod numeric;
pub mod session;
pub mod variable;

// Re-exports: nice ergonomics for downstream crates
pub use address::VariableAddress;
pub use buffer::{DType, RawBuffer, RawData};
pub use engine::{BufferRef, Engine, EngineError, EngineResult, GridKind, LiveBuffer};
pub use error::{MfError, MfResult};
pub use ids::*;
pub use numeric::*;
pub use session::{AddressIndex, Session};
pub use variable::Variable;
