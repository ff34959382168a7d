//! A model: id, solution membership, grid and packages.

use std::cell::Cell;
use std::rc::Rc;

use mf_core::{
    AddressIndex, GridKind, MfError, MfResult, ModelId, Session, SolutionId, Variable,
    VariableAddress,
};
use mf_data::ArrayView;
use mf_grid::{DIS_NAME, Discretization, GridShape, NodeMap};
use ndarray::ArrayD;
use tracing::debug;

use crate::package::{Package, PackagePath};

pub(crate) const PACKAGE_TYPE: &str = "PACKAGE_TYPE";

/// Package names and kinds declared under `component` through `PACKAGE_TYPE`.
pub(crate) fn declared_packages(
    session: &Session,
    index: &AddressIndex,
    component: &str,
) -> MfResult<Vec<(String, String)>> {
    let mut found = Vec::new();
    for address in index.names() {
        let Some(parsed) = VariableAddress::parse(address) else {
            continue;
        };
        let Some(sub) = parsed.subcomponent() else {
            continue;
        };
        if !parsed.component().eq_ignore_ascii_case(component)
            || !parsed.name().eq_ignore_ascii_case(PACKAGE_TYPE)
        {
            continue;
        }
        let raw = session.get_value(address)?;
        let kind = raw
            .as_texts()?
            .first()
            .map(|s| s.trim().to_lowercase())
            .ok_or_else(|| MfError::InvalidArg {
                what: format!("empty {address}"),
            })?;
        found.push((sub.to_string(), kind));
    }
    Ok(found)
}

pub struct Model {
    name: String,
    id: ModelId,
    solution_id: SolutionId,
    grid: Rc<Discretization>,
    packages: Vec<Package>,
    allow_convergence: Cell<bool>,
    x: Option<Variable>,
}

impl Model {
    /// Bind the model named `name` (as enumerated, e.g. `GWF_1`).
    pub fn bind(session: &Session, index: &AddressIndex, name: &str) -> MfResult<Self> {
        let read_id = |field: &str| -> MfResult<i32> {
            Variable::bind(session, &session.var_address(field, name, None))?.read_i32()
        };
        let id = ModelId::clamped(read_id("ID")?);
        let solution_id = SolutionId::clamped(read_id("IDSOLN")?);
        let grid_kind = session.grid_kind(id.get() as i32)?;
        let grid = Rc::new(Discretization::new(session.clone(), name, grid_kind));

        let dis_kind = match grid_kind {
            GridKind::Rectilinear => "dis",
            GridKind::Unstructured => "disu",
        };
        let mut packages = vec![Package::bind(
            session,
            DIS_NAME,
            dis_kind,
            PackagePath::model(name, DIS_NAME),
            Some(Rc::clone(&grid)),
        )?];
        for (package, kind) in declared_packages(session, index, name)? {
            if package.eq_ignore_ascii_case(DIS_NAME) {
                continue;
            }
            packages.push(Package::bind(
                session,
                &package,
                &kind,
                PackagePath::model(name, &package),
                Some(Rc::clone(&grid)),
            )?);
        }

        let x = Variable::bind_optional(session, &session.var_address("X", name, None))?;
        debug!(
            model = name,
            id = id.get(),
            solution = solution_id.get(),
            packages = packages.len(),
            "model bound"
        );

        Ok(Self {
            name: name.to_lowercase(),
            id,
            solution_id,
            grid,
            packages,
            allow_convergence: Cell::new(true),
            x,
        })
    }

    /// Model name, lower-case.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn id(&self) -> ModelId {
        self.id
    }

    pub fn solution_id(&self) -> SolutionId {
        self.solution_id
    }

    pub fn grid_kind(&self) -> GridKind {
        self.grid.grid_kind()
    }

    pub fn discretization(&self) -> &Rc<Discretization> {
        &self.grid
    }

    pub fn shape(&self) -> MfResult<&GridShape> {
        self.grid.shape()
    }

    pub fn size(&self) -> MfResult<usize> {
        self.grid.size()
    }

    pub fn node_map(&self) -> MfResult<&NodeMap> {
        self.grid.node_map()
    }

    pub fn packages(&self) -> &[Package] {
        &self.packages
    }

    pub fn package_names(&self) -> Vec<&str> {
        self.packages.iter().map(Package::name).collect()
    }

    /// Distinct package kinds, in discovery order.
    pub fn package_kinds(&self) -> Vec<&str> {
        let mut kinds: Vec<&str> = Vec::new();
        for p in &self.packages {
            if !kinds.contains(&p.kind()) {
                kinds.push(p.kind());
            }
        }
        kinds
    }

    pub fn package(&self, name: &str) -> MfResult<&Package> {
        self.packages
            .iter()
            .find(|p| p.name().eq_ignore_ascii_case(name))
            .ok_or_else(|| MfError::KeyNotAccessible {
                key: name.to_string(),
                package: self.name.clone(),
            })
    }

    pub fn packages_of_kind(&self, kind: &str) -> Vec<&Package> {
        self.packages
            .iter()
            .filter(|p| p.kind().eq_ignore_ascii_case(kind))
            .collect()
    }

    /// Dense dependent-variable array (heads, concentrations).
    pub fn solution(&self) -> MfResult<ArrayD<f64>> {
        let var = self.x.clone().ok_or_else(|| MfError::AddressNotFound {
            address: format!("{}/X", self.name.to_uppercase()),
        })?;
        ArrayView::new("x", var, Some(Rc::clone(&self.grid))).read()
    }

    /// False keeps the solution group iterating past nominal convergence.
    pub fn allow_convergence(&self) -> bool {
        self.allow_convergence.get()
    }

    pub fn set_allow_convergence(&self, allow: bool) {
        self.allow_convergence.set(allow);
    }
}

impl std::fmt::Debug for Model {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Model")
            .field("name", &self.name)
            .field("id", &self.id)
            .field("solution_id", &self.solution_id)
            .field("packages", &self.package_names())
            .finish_non_exhaustive()
    }
}
