//! Array view: dense grid arrays over reduced engine buffers.

use std::collections::BTreeMap;
use std::rc::Rc;

use mf_core::{MfError, MfResult, RawBuffer, SENTINEL, Session, Variable};
use mf_grid::Discretization;
use ndarray::{ArrayD, IxDyn};

/// One gridded field of an array package.
///
/// Model-scoped fields read as arrays shaped like the model grid, with
/// [`SENTINEL`] at inactive cells. Simulation-scoped fields are copied
/// as flat 1-D arrays.
#[derive(Debug)]
pub struct ArrayView {
    name: String,
    var: Variable,
    grid: Option<Rc<Discretization>>,
}

impl ArrayView {
    pub fn new(name: &str, var: Variable, grid: Option<Rc<Discretization>>) -> Self {
        Self {
            name: name.to_lowercase(),
            var,
            grid,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    fn raw_values(raw: &RawBuffer) -> MfResult<Vec<f64>> {
        (0..raw.len()).map(|i| raw.get_f64(i)).collect()
    }

    fn shape_error(&self, expected: Vec<usize>, actual: Vec<usize>) -> MfError {
        MfError::ShapeMismatch {
            what: self.var.address().to_string(),
            expected,
            actual,
        }
    }

    pub fn read(&self) -> MfResult<ArrayD<f64>> {
        let raw = self.var.read()?;
        let values = Self::raw_values(&raw)?;
        let Some(grid) = &self.grid else {
            let n = values.len();
            return ArrayD::from_shape_vec(IxDyn(&[n]), values)
                .map_err(|_| self.shape_error(vec![n], raw.shape().to_vec()));
        };

        let shape = grid.shape()?;
        let size = shape.size();
        let dense = if values.len() == size {
            values
        } else {
            let map = grid.node_map()?;
            if values.len() != map.active_count() {
                return Err(self.shape_error(vec![map.active_count()], raw.shape().to_vec()));
            }
            let mut dense = vec![SENTINEL; size];
            for (&d, v) in map.reduced_to_dense().iter().zip(values) {
                dense[d] = v;
            }
            dense
        };
        ArrayD::from_shape_vec(IxDyn(shape.dims()), dense)
            .map_err(|_| self.shape_error(shape.dims().to_vec(), vec![size]))
    }

    /// Gather active-cell values into the engine buffer.
    ///
    /// Integer-backed buffers accept only integral values.
    pub fn write(&self, array: &ArrayD<f64>) -> MfResult<()> {
        let mut raw = self.var.read()?;
        let flat: Vec<f64> = array.iter().copied().collect();

        let Some(grid) = &self.grid else {
            if flat.len() != raw.len() {
                return Err(self.shape_error(vec![raw.len()], array.shape().to_vec()));
            }
            for (i, v) in flat.into_iter().enumerate() {
                raw.set_f64(i, v)?;
            }
            return self.var.write(&raw);
        };

        let shape = grid.shape()?;
        if flat.len() != shape.size() {
            return Err(self.shape_error(shape.dims().to_vec(), array.shape().to_vec()));
        }
        if raw.len() == flat.len() {
            for (i, &v) in flat.iter().enumerate() {
                raw.set_f64(i, v)?;
            }
        } else {
            let map = grid.node_map()?;
            if raw.len() != map.active_count() {
                return Err(self.shape_error(vec![map.active_count()], raw.shape().to_vec()));
            }
            for (r, &d) in map.reduced_to_dense().iter().enumerate() {
                raw.set_f64(r, flat[d])?;
            }
        }
        self.var.write(&raw)
    }
}

/// The named fields of one array package.
#[derive(Debug, Default)]
pub struct ArrayData {
    package: String,
    fields: BTreeMap<String, ArrayView>,
}

impl ArrayData {
    /// Bind every listed field the engine exposes under `component[/subcomponent]`.
    pub fn bind(
        session: &Session,
        fields: &[&str],
        component: &str,
        subcomponent: Option<&str>,
        grid: Option<Rc<Discretization>>,
    ) -> MfResult<Self> {
        let package = match subcomponent {
            Some(sub) => format!("{component}/{sub}"),
            None => component.to_string(),
        };
        let mut bound = BTreeMap::new();
        for &field in fields {
            let address = session.var_address(field, component, subcomponent);
            if let Some(var) = Variable::bind_optional(session, &address)? {
                let view = ArrayView::new(field, var, grid.clone());
                bound.insert(view.name().to_string(), view);
            }
        }
        Ok(Self {
            package,
            fields: bound,
        })
    }

    /// Field names, sorted.
    pub fn variable_names(&self) -> Vec<&str> {
        self.fields.keys().map(String::as_str).collect()
    }

    pub fn field(&self, name: &str) -> MfResult<&ArrayView> {
        self.fields
            .get(&name.to_lowercase())
            .ok_or_else(|| MfError::KeyNotAccessible {
                key: name.to_string(),
                package: self.package.clone(),
            })
    }

    pub fn get_array(&self, name: &str) -> MfResult<ArrayD<f64>> {
        self.field(name)?.read()
    }

    pub fn set_array(&self, name: &str, array: &ArrayD<f64>) -> MfResult<()> {
        self.field(name)?.write(array)
    }
}
