//! mf-data: typed views over engine package variables.
//!
//! Contains:
//! - schema (static per-kind package layouts)
//! - record (list columns, field values, record collections)
//! - array (dense grid arrays over reduced buffers)
//! - list (variable-length records over count/node/bound/aux buffers)
//! - scalar (named scalars)
//! - advanced (opaque address-level access, rhs/hcof)

pub mod advanced;
pub mod array;
pub mod list;
pub mod record;
pub mod scalar;
pub mod schema;

pub use advanced::AdvancedView;
pub use array::{ArrayData, ArrayView};
pub use list::ListView;
pub use record::{Column, ColumnKind, FieldValue, ListData};
pub use scalar::ScalarView;
pub use schema::{BoundSchema, Capability};
