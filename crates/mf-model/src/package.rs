//! A bound package: one schema, one typed view, one opaque view.

use std::rc::Rc;

use mf_core::{MfError, MfResult, RawBuffer, Session};
use mf_data::schema::{self, BoundSchema};
use mf_data::{AdvancedView, ArrayData, Capability, FieldValue, ListData, ListView, ScalarView};
use mf_grid::Discretization;
use ndarray::ArrayD;

/// Typed access selected by the package kind.
#[derive(Debug)]
pub enum PackageData {
    Array(ArrayData),
    List(ListView),
    Scalar(ScalarView),
    Advanced,
}

/// Where a package lives in the engine namespace.
#[derive(Debug, Clone, Copy)]
pub struct PackagePath<'a> {
    pub component: &'a str,
    pub subcomponent: Option<&'a str>,
}

impl<'a> PackagePath<'a> {
    /// A package directly under a simulation-level component (`TDIS`, `SLN_1`).
    pub fn simulation(component: &'a str) -> Self {
        Self {
            component,
            subcomponent: None,
        }
    }

    /// A package inside a model (`GWF/WEL_0`).
    pub fn model(model: &'a str, package: &'a str) -> Self {
        Self {
            component: model,
            subcomponent: Some(package),
        }
    }
}

#[derive(Debug)]
pub struct Package {
    name: String,
    kind: String,
    schema: &'static BoundSchema,
    data: PackageData,
    advanced: AdvancedView,
    grid: Option<Rc<Discretization>>,
}

impl Package {
    /// Bind a package of `kind` at `path`.
    ///
    /// Model packages pass their model's grid; simulation-scoped packages
    /// pass `None` and get flat arrays, raw node numbers and no rhs/hcof.
    pub fn bind(
        session: &Session,
        name: &str,
        kind: &str,
        path: PackagePath<'_>,
        grid: Option<Rc<Discretization>>,
    ) -> MfResult<Self> {
        let schema = schema::lookup(kind);
        let PackagePath {
            component,
            subcomponent,
        } = path;
        let data = match schema.capability {
            Capability::Array => PackageData::Array(ArrayData::bind(
                session,
                schema.fields,
                component,
                subcomponent,
                grid.clone(),
            )?),
            Capability::List => PackageData::List(ListView::bind(
                session,
                schema,
                component,
                subcomponent,
                grid.clone(),
            )?),
            Capability::Scalar => PackageData::Scalar(ScalarView::bind(
                session,
                schema.fields,
                component,
                subcomponent,
            )?),
            Capability::Advanced => PackageData::Advanced,
        };
        let advanced =
            AdvancedView::bind(session, schema, component, subcomponent, grid.is_none())?;

        Ok(Self {
            name: name.to_lowercase(),
            kind: kind.to_lowercase(),
            schema,
            data,
            advanced,
            grid,
        })
    }

    /// Package name, lower-case (`wel_0`, `npf`, `tdis`).
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Package kind, lower-case (`wel`, `npf`, `tdis`).
    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn capability(&self) -> Capability {
        self.schema.capability
    }

    pub fn schema(&self) -> &'static BoundSchema {
        self.schema
    }

    pub fn is_sim_scoped(&self) -> bool {
        self.grid.is_none()
    }

    pub fn data(&self) -> &PackageData {
        &self.data
    }

    fn mismatch(&self, expected: Capability) -> MfError {
        MfError::CapabilityMismatch {
            package: self.advanced.package().to_string(),
            expected: expected.name(),
        }
    }

    pub fn as_array(&self) -> MfResult<&ArrayData> {
        match &self.data {
            PackageData::Array(a) => Ok(a),
            _ => Err(self.mismatch(Capability::Array)),
        }
    }

    pub fn as_list(&self) -> MfResult<&ListView> {
        match &self.data {
            PackageData::List(l) => Ok(l),
            _ => Err(self.mismatch(Capability::List)),
        }
    }

    pub fn as_scalar(&self) -> MfResult<&ScalarView> {
        match &self.data {
            PackageData::Scalar(s) => Ok(s),
            _ => Err(self.mismatch(Capability::Scalar)),
        }
    }

    pub fn advanced(&self) -> &AdvancedView {
        &self.advanced
    }

    pub fn get_array(&self, name: &str) -> MfResult<ArrayD<f64>> {
        self.as_array()?.get_array(name)
    }

    pub fn set_array(&self, name: &str, array: &ArrayD<f64>) -> MfResult<()> {
        self.as_array()?.set_array(name, array)
    }

    /// Current records of a list package.
    pub fn records(&self) -> MfResult<ListData> {
        self.as_list()?.read()
    }

    pub fn set_records(&self, data: Option<&ListData>) -> MfResult<()> {
        self.as_list()?.write(data)
    }

    pub fn get_scalar(&self, name: &str) -> MfResult<FieldValue> {
        self.as_scalar()?.get(name)
    }

    pub fn set_scalar(&self, name: &str, value: FieldValue) -> MfResult<()> {
        self.as_scalar()?.set(name, value)
    }

    /// Variables outside the schema, reachable through the opaque view.
    pub fn advanced_var_names(&self) -> &[String] {
        self.advanced.advanced_var_names()
    }

    pub fn get_variable(&self, name: &str) -> MfResult<RawBuffer> {
        self.advanced.get_variable(name)
    }

    pub fn set_variable(&self, name: &str, value: &RawBuffer) -> MfResult<()> {
        self.advanced.set_variable(name, value)
    }

    pub fn rhs(&self) -> MfResult<Vec<f64>> {
        self.advanced.rhs()
    }

    pub fn set_rhs(&self, values: &[f64]) -> MfResult<()> {
        self.advanced.set_rhs(values)
    }

    pub fn hcof(&self) -> MfResult<Vec<f64>> {
        self.advanced.hcof()
    }

    pub fn set_hcof(&self, values: &[f64]) -> MfResult<()> {
        self.advanced.set_hcof(values)
    }

    /// Dense view of an advanced variable of an array-kind model package.
    pub fn get_advanced_array(&self, name: &str) -> MfResult<ArrayD<f64>> {
        self.advanced_array(name)?.read()
    }

    pub fn set_advanced_array(&self, name: &str, array: &ArrayD<f64>) -> MfResult<()> {
        self.advanced_array(name)?.write(array)
    }

    fn advanced_array(&self, name: &str) -> MfResult<mf_data::ArrayView> {
        let grid = match (&self.data, &self.grid) {
            (PackageData::Array(_), Some(grid)) => Rc::clone(grid),
            _ => return Err(self.mismatch(Capability::Array)),
        };
        self.advanced.array_view(name, grid)
    }
}
