//! Builders laying out an engine namespace like a real simulation.
//!
//! Address conventions follow the engine:
//! - model scalars `MODEL/ID`, `MODEL/IDSOLN`, dependent variable `MODEL/X`
//! - model packages `MODEL/PACKAGE/VAR` plus `MODEL/PACKAGE/PACKAGE_TYPE`
//! - solutions `SLN_n/ID`, `SLN_n/MXITER`, linear solver `SLN_n/IMSLINEAR/VAR`
//! - simulation packages `TDIS/VAR`, `ATS/VAR`, `GWF-GWF_n/VAR`

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use mf_core::{Engine, GridKind, RawBuffer, Session};

use crate::engine::{FakeEngine, SolutionScript};

/// Contents of one list package.
///
/// `nodelist` holds raw engine node numbers (already offset by the
/// engine's node index base). Rows of `bound` are records.
#[derive(Debug, Clone, Default)]
pub struct ListFixture {
    pub maxbound: usize,
    pub nodelist: Vec<i32>,
    pub bound: Vec<Vec<f64>>,
    pub aux: Vec<(String, Vec<f64>)>,
}

impl ListFixture {
    pub fn new(maxbound: usize) -> Self {
        Self {
            maxbound,
            ..Self::default()
        }
    }

    pub fn record(mut self, node: i32, bound: &[f64]) -> Self {
        self.nodelist.push(node);
        self.bound.push(bound.to_vec());
        self
    }

    pub fn aux(mut self, name: &str, values: &[f64]) -> Self {
        self.aux.push((name.to_string(), values.to_vec()));
        self
    }
}

struct ModelFixture {
    name: String,
    dims: Vec<usize>,
    active: Option<Vec<bool>>,
}

/// Builder for a [`FakeEngine`] populated like a bound simulation.
#[derive(Default)]
pub struct SimulationFixture {
    engine: FakeEngine,
    models: Vec<ModelFixture>,
    scripts: HashMap<i32, SolutionScript>,
}

impl SimulationFixture {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn node_index_base(mut self, base: i32) -> Self {
        self.engine.set_node_index_base(base);
        self
    }

    /// Stress periods as `(perlen, nstp)`.
    pub fn tdis(mut self, periods: &[(f64, usize)]) -> Self {
        self.engine.set_periods(periods.to_vec());
        self
    }

    /// A solution group with its linear solver settings.
    pub fn solution(mut self, id: i32, mxiter: i32, converge_after: Option<usize>) -> Self {
        let name = format!("SLN_{id}");
        let e = &mut self.engine;
        e.insert(&format!("{name}/ID"), RawBuffer::scalar_int(id));
        e.insert(&format!("{name}/MXITER"), RawBuffer::scalar_int(mxiter));
        e.insert(&format!("{name}/DVCLOSE"), RawBuffer::scalar_double(1e-6));
        e.insert(&format!("{name}/BTOL"), RawBuffer::scalar_double(1e4));
        e.insert(&format!("{name}/IMSLINEAR/NITERC"), RawBuffer::scalar_int(100));
        e.insert(&format!("{name}/IMSLINEAR/DVCLOSE"), RawBuffer::scalar_double(1e-8));
        e.insert(&format!("{name}/IMSLINEAR/RCLOSE"), RawBuffer::scalar_double(1e-3));
        self.scripts.entry(id).or_default().converge_after = converge_after;
        self
    }

    /// Shrink `TDIS/DELT` by `factor` after each non-converged iteration of a solution.
    pub fn shrink_delt(mut self, solution: i32, factor: f64) -> Self {
        self.scripts.entry(solution).or_default().delt_shrink = Some(factor);
        self
    }

    /// A rectilinear model; `dims` is `[nlay, nrow, ncol]`.
    pub fn model(self, name: &str, id: i32, solution: i32, dims: &[usize]) -> Self {
        self.model_of_kind(name, id, solution, dims, GridKind::Rectilinear)
    }

    /// An unstructured model; `dims` is `[nlay, ncpl]` or `[nodes]`.
    pub fn unstructured_model(self, name: &str, id: i32, solution: i32, dims: &[usize]) -> Self {
        self.model_of_kind(name, id, solution, dims, GridKind::Unstructured)
    }

    fn model_of_kind(
        mut self,
        name: &str,
        id: i32,
        solution: i32,
        dims: &[usize],
        kind: GridKind,
    ) -> Self {
        let e = &mut self.engine;
        e.insert(&format!("{name}/ID"), RawBuffer::scalar_int(id));
        e.insert(&format!("{name}/IDSOLN"), RawBuffer::scalar_int(solution));
        e.set_grid_kind(id.max(1), kind);
        let fields: &[&str] = match (kind, dims.len()) {
            (GridKind::Rectilinear, _) => &["NLAY", "NROW", "NCOL"],
            (GridKind::Unstructured, 2) => &["NLAY", "NCPL"],
            (GridKind::Unstructured, _) => &[],
        };
        for (field, &d) in fields.iter().zip(dims) {
            e.insert(&format!("{name}/DIS/{field}"), RawBuffer::scalar_int(d as i32));
        }
        self.models.push(ModelFixture {
            name: name.to_string(),
            dims: dims.to_vec(),
            active: None,
        });
        self
    }

    /// Mark dense cells of a model inactive; one flag per dense cell.
    pub fn active_cells(mut self, model: &str, active: &[bool]) -> Self {
        if let Some(m) = self.models.iter_mut().find(|m| m.name == model) {
            m.active = Some(active.to_vec());
        }
        self
    }

    /// An array-kind package variable; adds `PACKAGE_TYPE` unless it is `DIS`.
    pub fn array(mut self, model: &str, package: &str, kind: &str, var: &str, value: RawBuffer) -> Self {
        self.package_type(model, package, kind);
        self.engine.insert(&format!("{model}/{package}/{var}"), value);
        self
    }

    /// A list-kind package with its count, node, bound and aux variables.
    pub fn list(mut self, model: &str, package: &str, kind: &str, list: ListFixture) -> Self {
        self.package_type(model, package, kind);
        let prefix = format!("{model}/{package}");
        let max = list.maxbound;
        let width = list.bound.first().map_or(1, Vec::len);
        let e = &mut self.engine;

        e.insert(&format!("{prefix}/NBOUND"), RawBuffer::scalar_int(list.nodelist.len() as i32));
        e.insert(&format!("{prefix}/MAXBOUND"), RawBuffer::scalar_int(max as i32));

        let mut nodelist = list.nodelist.clone();
        nodelist.resize(max, 0);
        e.insert(&format!("{prefix}/NODELIST"), RawBuffer::ints(nodelist));

        let mut bound = vec![0.0; max * width];
        for (i, row) in list.bound.iter().enumerate().take(max) {
            bound[i * width..i * width + row.len().min(width)].copy_from_slice(&row[..row.len().min(width)]);
        }
        if let Ok(buf) = RawBuffer::double_matrix(max, width, bound) {
            e.insert(&format!("{prefix}/BOUND"), buf);
        }

        e.insert(&format!("{prefix}/NAUX"), RawBuffer::scalar_int(list.aux.len() as i32));
        if !list.aux.is_empty() {
            let naux = list.aux.len();
            e.insert(
                &format!("{prefix}/AUXNAME_CST"),
                RawBuffer::texts(list.aux.iter().map(|(n, _)| n.clone())),
            );
            let mut auxvar = vec![0.0; max * naux];
            for (j, (_, values)) in list.aux.iter().enumerate() {
                for (i, &v) in values.iter().enumerate().take(max) {
                    auxvar[i * naux + j] = v;
                }
            }
            if let Ok(buf) = RawBuffer::double_matrix(max, naux, auxvar) {
                e.insert(&format!("{prefix}/AUXVAR"), buf);
            }
        }

        e.insert(&format!("{prefix}/RHS"), RawBuffer::doubles(vec![0.0; max]));
        e.insert(&format!("{prefix}/HCOF"), RawBuffer::doubles(vec![0.0; max]));
        self
    }

    /// A package of a kind with no bound schema.
    pub fn advanced_package(mut self, model: &str, package: &str, kind: &str) -> Self {
        self.package_type(model, package, kind);
        self
    }

    /// Adaptive time stepping; one `(iperats, dt0, dtmin, dtmax)` per period entry.
    pub fn ats(mut self, periods: &[(i32, f64, f64, f64)]) -> Self {
        let e = &mut self.engine;
        e.insert("ATS/MAXATS", RawBuffer::scalar_int(periods.len() as i32));
        e.insert("ATS/IPERATS", RawBuffer::ints(periods.iter().map(|p| p.0).collect()));
        e.insert("ATS/DT0", RawBuffer::doubles(periods.iter().map(|p| p.1).collect()));
        e.insert("ATS/DTMIN", RawBuffer::doubles(periods.iter().map(|p| p.2).collect()));
        e.insert("ATS/DTMAX", RawBuffer::doubles(periods.iter().map(|p| p.3).collect()));
        e.insert("ATS/DTADJ", RawBuffer::doubles(vec![0.0; periods.len()]));
        e.insert("ATS/DTFAILADJ", RawBuffer::doubles(vec![0.0; periods.len()]));
        self
    }

    /// A model-to-model exchange with raw `(nodem1, nodem2)` pairs.
    pub fn exchange(mut self, name: &str, pairs: &[(i32, i32)]) -> Self {
        let n = pairs.len();
        let e = &mut self.engine;
        e.insert(&format!("{name}/NEXG"), RawBuffer::scalar_int(n as i32));
        e.insert(&format!("{name}/NODEM1"), RawBuffer::ints(pairs.iter().map(|p| p.0).collect()));
        e.insert(&format!("{name}/NODEM2"), RawBuffer::ints(pairs.iter().map(|p| p.1).collect()));
        e.insert(&format!("{name}/CL1"), RawBuffer::doubles(vec![0.5; n]));
        e.insert(&format!("{name}/CL2"), RawBuffer::doubles(vec![0.5; n]));
        e.insert(&format!("{name}/IHC"), RawBuffer::ints(vec![1; n]));
        self
    }

    /// Any extra variable, exposed by reference.
    pub fn var(mut self, address: &str, value: RawBuffer) -> Self {
        self.engine.insert(address, value);
        self
    }

    /// Any extra variable, reachable only by copy.
    pub fn detached_var(mut self, address: &str, value: RawBuffer) -> Self {
        self.engine.insert_detached(address, value);
        self
    }

    pub fn fail_on(mut self, call: &str) -> Self {
        self.engine.fail_on(call);
        self
    }

    fn package_type(&mut self, model: &str, package: &str, kind: &str) {
        if package.eq_ignore_ascii_case("DIS") {
            return;
        }
        let address = format!("{model}/{package}/PACKAGE_TYPE");
        if self.engine.value(&address).is_none() {
            self.engine
                .insert(&address, RawBuffer::texts([kind.to_uppercase()]));
        }
    }

    /// Finish the model node layout and return the engine.
    pub fn build(mut self) -> FakeEngine {
        let base = self.engine.node_index_base();
        for m in &self.models {
            let size: usize = m.dims.iter().product();
            let active = m.active.clone().unwrap_or_else(|| vec![true; size]);
            let nodeuser: Vec<i32> = active
                .iter()
                .enumerate()
                .filter_map(|(i, &a)| a.then_some(i as i32 + base))
                .collect();
            let mut next = base;
            let nodereduced: Vec<i32> = active
                .iter()
                .map(|&a| {
                    if a {
                        next += 1;
                        next - 1
                    } else {
                        base - 1
                    }
                })
                .collect();
            let nodes = nodeuser.len();
            let e = &mut self.engine;
            e.insert(&format!("{}/DIS/NODES", m.name), RawBuffer::scalar_int(nodes as i32));
            if nodes != size {
                e.insert(&format!("{}/DIS/NODEUSER", m.name), RawBuffer::ints(nodeuser));
                e.insert(&format!("{}/DIS/NODEREDUCED", m.name), RawBuffer::ints(nodereduced));
            }
            e.insert(&format!("{}/X", m.name), RawBuffer::doubles(vec![0.0; nodes]));
        }
        for (id, script) in self.scripts {
            self.engine.script_solution(id, script);
        }
        self.engine
    }

    /// Build and wrap in a session, keeping a handle for inspection.
    pub fn session(self) -> (Session, Rc<RefCell<FakeEngine>>) {
        self.build().into_session()
    }
}
