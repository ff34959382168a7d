//! Per-model discretization: grid shape and node map, loaded on first use.

use std::cell::OnceCell;

use mf_core::{GridKind, MfError, MfResult, Session};
use tracing::debug;

use crate::node_map::NodeMap;
use crate::shape::GridShape;

/// Name of the discretization package inside every model.
pub const DIS_NAME: &str = "DIS";

const RECTILINEAR_FIELDS: &[&str] = &["NLAY", "NROW", "NCOL"];
const UNSTRUCTURED_FIELDS: &[&str] = &["NLAY", "NCPL"];

/// Grid geometry of one model, cached for the model's lifetime.
pub struct Discretization {
    model: String,
    grid_kind: GridKind,
    session: Session,
    shape: OnceCell<GridShape>,
    node_map: OnceCell<NodeMap>,
}

impl Discretization {
    pub fn new(session: Session, model: &str, grid_kind: GridKind) -> Self {
        Self {
            model: model.to_uppercase(),
            grid_kind,
            session,
            shape: OnceCell::new(),
            node_map: OnceCell::new(),
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn grid_kind(&self) -> GridKind {
        self.grid_kind
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    fn address(&self, name: &str) -> String {
        self.session.var_address(name, &self.model, Some(DIS_NAME))
    }

    fn read_count(&self, name: &str) -> MfResult<usize> {
        let address = self.address(name);
        let raw = self.session.get_value(&address)?.get_i32(0)?;
        usize::try_from(raw).map_err(|_| MfError::InvalidArg {
            what: format!("{address} = {raw}"),
        })
    }

    /// Logical grid shape; fields missing from the engine are skipped.
    pub fn shape(&self) -> MfResult<&GridShape> {
        if let Some(shape) = self.shape.get() {
            return Ok(shape);
        }
        let fields = match self.grid_kind {
            GridKind::Rectilinear => RECTILINEAR_FIELDS,
            GridKind::Unstructured => UNSTRUCTURED_FIELDS,
        };
        let mut dims = Vec::with_capacity(fields.len());
        for field in fields {
            if self.session.has_address(&self.address(field))? {
                dims.push(self.read_count(field)?);
            }
        }
        if dims.is_empty() {
            dims.push(self.read_count("NODES")?);
        }
        let shape = GridShape::new(dims);
        debug!(model = %self.model, %shape, "grid shape loaded");
        Ok(self.shape.get_or_init(|| shape))
    }

    /// Number of dense nodes.
    pub fn size(&self) -> MfResult<usize> {
        Ok(self.shape()?.size())
    }

    /// Number of active nodes the engine stores.
    pub fn active_nodes(&self) -> MfResult<usize> {
        Ok(self.node_map()?.active_count())
    }

    pub fn node_map(&self) -> MfResult<&NodeMap> {
        if let Some(map) = self.node_map.get() {
            return Ok(map);
        }
        let size = self.size()?;
        let nodes = self.read_count("NODES")?;
        let map = if nodes == size {
            NodeMap::identity(size)
        } else {
            let nodeuser = self.session.get_value(&self.address("NODEUSER"))?;
            let reduced_address = self.address("NODEREDUCED");
            let nodereduced = if self.session.has_address(&reduced_address)? {
                Some(self.session.get_value(&reduced_address)?)
            } else {
                None
            };
            let nodereduced = nodereduced.as_ref().map(|b| b.as_ints()).transpose()?;
            NodeMap::from_engine(
                nodeuser.as_ints()?,
                nodereduced,
                self.session.node_index_base(),
                size,
            )?
        };
        debug!(
            model = %self.model,
            active = map.active_count(),
            dense = map.dense_size(),
            "node map built"
        );
        Ok(self.node_map.get_or_init(|| map))
    }
}

impl std::fmt::Debug for Discretization {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Discretization")
            .field("model", &self.model)
            .field("grid_kind", &self.grid_kind)
            .field("shape", &self.shape.get())
            .finish_non_exhaustive()
    }
}
