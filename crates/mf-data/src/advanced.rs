//! Opaque, address-level access to package variables.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use mf_core::{MfError, MfResult, RawBuffer, Session, Variable, VariableAddress};
use mf_grid::Discretization;

use crate::array::ArrayView;
use crate::schema::BoundSchema;

const RHS: &str = "rhs";
const HCOF: &str = "hcof";
const PACKAGE_TYPE: &str = "PACKAGE_TYPE";

/// Escape hatch over every engine variable of a package.
///
/// Bindings are resolved on first use and cached; reads always return a
/// copy.
pub struct AdvancedView {
    package: String,
    component: String,
    subcomponent: Option<String>,
    session: Session,
    sim_scoped: bool,
    names: Vec<String>,
    cache: RefCell<HashMap<String, Variable>>,
}

impl AdvancedView {
    /// Record the package path and discover the variables `schema` leaves out.
    pub fn bind(
        session: &Session,
        schema: &BoundSchema,
        component: &str,
        subcomponent: Option<&str>,
        sim_scoped: bool,
    ) -> MfResult<Self> {
        let package = match subcomponent {
            Some(sub) => format!("{component}/{sub}"),
            None => component.to_string(),
        };
        let mut names: Vec<String> = session
            .addresses()?
            .names()
            .iter()
            .filter_map(|a| VariableAddress::parse(a))
            .filter(|a| {
                a.is_under(component, subcomponent)
                    && !a.name().eq_ignore_ascii_case(PACKAGE_TYPE)
                    && !schema.covers(a.name())
            })
            .map(|a| a.name().to_lowercase())
            .collect();
        names.sort();
        names.dedup();

        Ok(Self {
            package,
            component: component.to_string(),
            subcomponent: subcomponent.map(str::to_string),
            session: session.clone(),
            sim_scoped,
            names,
            cache: RefCell::new(HashMap::new()),
        })
    }

    pub fn package(&self) -> &str {
        &self.package
    }

    /// Variables reachable only through this view, sorted.
    pub fn advanced_var_names(&self) -> &[String] {
        &self.names
    }

    fn address(&self, name: &str) -> String {
        self.session
            .var_address(name, &self.component, self.subcomponent.as_deref())
    }

    fn variable(&self, address: &str) -> MfResult<Variable> {
        if let Some(var) = self.cache.borrow().get(address) {
            return Ok(var.clone());
        }
        let var = Variable::bind(&self.session, address)?;
        self.cache
            .borrow_mut()
            .insert(address.to_string(), var.clone());
        Ok(var)
    }

    /// Copy of the package variable `name`.
    pub fn get_variable(&self, name: &str) -> MfResult<RawBuffer> {
        self.variable(&self.address(name))?.read()
    }

    /// Copy of an explicitly addressed variable.
    pub fn get_variable_at(&self, address: &str) -> MfResult<RawBuffer> {
        self.variable(address)?.read()
    }

    /// Overwrite `name`; shape and element type must match the engine's.
    pub fn set_variable(&self, name: &str, value: &RawBuffer) -> MfResult<()> {
        let var = self.variable(&self.address(name))?;
        var.read()?.ensure_same_layout(value, var.address())?;
        var.write(value)
    }

    pub fn set_variable_at(&self, address: &str, value: &RawBuffer) -> MfResult<()> {
        let var = self.variable(address)?;
        var.read()?.ensure_same_layout(value, address)?;
        var.write(value)
    }

    /// An array view over `name`, scattered through the model grid.
    pub fn array_view(&self, name: &str, grid: Rc<Discretization>) -> MfResult<ArrayView> {
        let var = self.variable(&self.address(name))?;
        Ok(ArrayView::new(name, var, Some(grid)))
    }

    fn matrix_term(&self, field: &str) -> MfResult<Variable> {
        let unsupported = || MfError::UnsupportedMutation {
            field: field.to_string(),
            package: self.package.clone(),
        };
        if self.sim_scoped {
            return Err(unsupported());
        }
        let address = self.address(field);
        if !self.session.has_address(&address)? {
            return Err(unsupported());
        }
        self.variable(&address)
    }

    fn read_term(&self, field: &str) -> MfResult<Vec<f64>> {
        let raw = self.matrix_term(field)?.read()?;
        (0..raw.len()).map(|i| raw.get_f64(i)).collect()
    }

    fn write_term(&self, field: &str, values: &[f64]) -> MfResult<()> {
        let var = self.matrix_term(field)?;
        let mut raw = var.read()?;
        if raw.len() != values.len() {
            return Err(MfError::ShapeMismatch {
                what: var.address().to_string(),
                expected: raw.shape().to_vec(),
                actual: vec![values.len()],
            });
        }
        for (i, &v) in values.iter().enumerate() {
            raw.set_f64(i, v)?;
        }
        var.write(&raw)
    }

    /// Right-hand-side contribution per bound record.
    pub fn rhs(&self) -> MfResult<Vec<f64>> {
        self.read_term(RHS)
    }

    pub fn set_rhs(&self, values: &[f64]) -> MfResult<()> {
        self.write_term(RHS, values)
    }

    /// Diagonal coefficient contribution per bound record.
    pub fn hcof(&self) -> MfResult<Vec<f64>> {
        self.read_term(HCOF)
    }

    pub fn set_hcof(&self, values: &[f64]) -> MfResult<()> {
        self.write_term(HCOF, values)
    }
}

impl std::fmt::Debug for AdvancedView {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdvancedView")
            .field("package", &self.package)
            .field("sim_scoped", &self.sim_scoped)
            .field("names", &self.names)
            .finish_non_exhaustive()
    }
}
