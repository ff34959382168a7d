//! Binding a whole simulation from the engine namespace.
//!
//! The namespace is enumerated once and partitioned by path depth and
//! naming convention:
//! - models are components of three-part addresses with a `NAME/ID`
//!   entry, excluding solutions (`SLN*`)
//! - solution groups are components of two-part addresses with a
//!   `NAME/ID` entry that are neither models, `TDIS`, nor exchanges
//! - exchanges are components prefixed `GWF-GWF` or `GWT-GWT`
//! - `TDIS` is always bound; `ATS` only when the engine exposes it

use std::collections::BTreeMap;
use std::rc::Rc;

use mf_core::{
    AddressIndex, MfError, MfResult, ModelId, Session, SolutionId, Variable, VariableAddress,
};
use tracing::debug;

use crate::exchange::{Exchange, exchange_kind};
use crate::model::Model;
use crate::package::{Package, PackagePath};
use crate::solution::SolutionGroup;
use crate::view::SimulationView;

const TDIS: &str = "TDIS";
const ATS: &str = "ATS";
const SOLUTION_PREFIX: &str = "SLN";

fn push_unique(names: &mut Vec<String>, name: &str) {
    if !names.iter().any(|n| n == name) {
        names.push(name.to_string());
    }
}

#[derive(Debug)]
pub struct Simulation {
    session: Session,
    addresses: Rc<AddressIndex>,
    models: Vec<Model>,
    solutions: BTreeMap<SolutionId, SolutionGroup>,
    exchanges: Vec<Exchange>,
    tdis: Package,
    ats: Option<Package>,
}

impl Simulation {
    /// Enumerate the engine namespace and bind every model, solution
    /// group, exchange and simulation package.
    pub fn load(session: &Session) -> MfResult<Self> {
        let addresses = session.refresh_addresses()?;
        let has_id = |component: &str| {
            addresses.contains(&session.var_address("ID", component, None))
        };

        let parsed: Vec<VariableAddress> = addresses
            .names()
            .iter()
            .filter_map(|a| VariableAddress::parse(a))
            .collect();

        let mut model_names = Vec::new();
        let mut exchange_names = Vec::new();
        for address in &parsed {
            let component = address.component();
            if exchange_kind(component).is_some() {
                push_unique(&mut exchange_names, component);
                continue;
            }
            if address.depth() == 3
                && !component.to_ascii_uppercase().starts_with(SOLUTION_PREFIX)
                && has_id(component)
            {
                push_unique(&mut model_names, component);
            }
        }

        let mut solution_names = Vec::new();
        for address in parsed.iter().filter(|a| a.depth() == 2) {
            let component = address.component();
            if component.eq_ignore_ascii_case(TDIS)
                || exchange_kind(component).is_some()
                || model_names.iter().any(|m| m.eq_ignore_ascii_case(component))
                || !has_id(component)
            {
                continue;
            }
            push_unique(&mut solution_names, component);
        }

        let models = model_names
            .iter()
            .map(|name| Model::bind(session, &addresses, name))
            .collect::<MfResult<Vec<_>>>()?;

        let mut solutions = BTreeMap::new();
        for name in &solution_names {
            let id_var = Variable::bind(session, &session.var_address("ID", name, None))?;
            let id = SolutionId::clamped(id_var.read_i32()?);
            solutions.insert(id, SolutionGroup::bind(session, id, name)?);
        }

        let exchanges = exchange_names
            .iter()
            .map(|name| Exchange::bind(session, &addresses, name))
            .collect::<MfResult<Vec<_>>>()?;

        let tdis = Package::bind(session, TDIS, "tdis", PackagePath::simulation(TDIS), None)?;
        let ats = if parsed.iter().any(|a| a.component().eq_ignore_ascii_case(ATS)) {
            Some(Package::bind(
                session,
                ATS,
                "ats",
                PackagePath::simulation(ATS),
                None,
            )?)
        } else {
            None
        };

        debug!(
            models = ?model_names,
            solutions = ?solution_names,
            exchanges = ?exchange_names,
            ats = ats.is_some(),
            "simulation bound"
        );

        Ok(Self {
            session: session.clone(),
            addresses,
            models,
            solutions,
            exchanges,
            tdis,
            ats,
        })
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// The address enumeration this simulation was bound from.
    pub fn addresses(&self) -> &AddressIndex {
        &self.addresses
    }

    pub fn view(&self) -> SimulationView<'_> {
        SimulationView::new(self)
    }

    pub fn models(&self) -> &[Model] {
        &self.models
    }

    pub fn model_names(&self) -> Vec<&str> {
        self.models.iter().map(Model::name).collect()
    }

    pub fn model(&self, name: &str) -> MfResult<&Model> {
        self.models
            .iter()
            .find(|m| m.name().eq_ignore_ascii_case(name))
            .ok_or_else(|| MfError::KeyNotAccessible {
                key: name.to_string(),
                package: "simulation".to_string(),
            })
    }

    pub fn model_by_id(&self, id: ModelId) -> MfResult<&Model> {
        self.models
            .iter()
            .find(|m| m.id() == id)
            .ok_or_else(|| MfError::KeyNotAccessible {
                key: format!("model id {id}"),
                package: "simulation".to_string(),
            })
    }

    /// Solution groups, ordered by id.
    pub fn solutions(&self) -> impl Iterator<Item = &SolutionGroup> {
        self.solutions.values()
    }

    pub fn solution(&self, id: SolutionId) -> MfResult<&SolutionGroup> {
        self.solutions
            .get(&id)
            .ok_or_else(|| MfError::KeyNotAccessible {
                key: format!("solution id {id}"),
                package: "simulation".to_string(),
            })
    }

    /// Models solved by solution group `id`.
    pub fn models_in(&self, id: SolutionId) -> impl Iterator<Item = &Model> {
        self.models.iter().filter(move |m| m.solution_id() == id)
    }

    pub fn exchanges(&self) -> &[Exchange] {
        &self.exchanges
    }

    pub fn exchange_names(&self) -> Vec<&str> {
        self.exchanges.iter().map(Exchange::name).collect()
    }

    pub fn exchange(&self, name: &str) -> MfResult<&Exchange> {
        self.exchanges
            .iter()
            .find(|e| e.name().eq_ignore_ascii_case(name))
            .ok_or_else(|| MfError::KeyNotAccessible {
                key: name.to_string(),
                package: "simulation".to_string(),
            })
    }

    pub fn tdis(&self) -> &Package {
        &self.tdis
    }

    pub fn ats(&self) -> Option<&Package> {
        self.ats.as_ref()
    }

    fn tdis_index(&self, name: &str) -> MfResult<usize> {
        let raw = self.tdis.as_scalar()?.get_i32(name)?;
        Ok((raw - 1).max(0) as usize)
    }

    /// Current stress period, 0-based.
    pub fn kper(&self) -> MfResult<usize> {
        self.tdis_index("kper")
    }

    /// Current time step within the stress period, 0-based.
    pub fn kstp(&self) -> MfResult<usize> {
        self.tdis_index("kstp")
    }

    pub fn nper(&self) -> MfResult<usize> {
        Ok(self.tdis.as_scalar()?.get_i32("nper")?.max(0) as usize)
    }

    /// Number of time steps in the current stress period.
    pub fn nstp(&self) -> MfResult<usize> {
        let kper = self.kper()?;
        let value = self.tdis.as_scalar()?.get_at("nstp", kper)?;
        value
            .as_i32()
            .map(|n| n.max(0) as usize)
            .ok_or_else(|| MfError::TypeMismatch {
                what: "TDIS/NSTP".to_string(),
                expected: "int",
                actual: value.kind_name(),
            })
    }

    /// Length of the current time step.
    pub fn delt(&self) -> MfResult<f64> {
        self.tdis.as_scalar()?.get_f64("delt")
    }

    /// Simulation time at the end of the current time step.
    pub fn totim(&self) -> MfResult<f64> {
        self.tdis.as_scalar()?.get_f64("totim")
    }

    pub fn ats_active(&self) -> bool {
        self.ats.is_some()
    }

    /// Minimum step length when adaptive stepping covers the current period.
    pub fn ats_period(&self) -> MfResult<Option<f64>> {
        let Some(ats) = &self.ats else {
            return Ok(None);
        };
        let period = self.kper()? as i32 + 1;
        let records = ats.records()?;
        for i in 0..records.len() {
            if records.get(i, "iperats")?.as_i32() == Some(period) {
                return Ok(records.get(i, "dtmin")?.as_f64());
            }
        }
        Ok(None)
    }

    pub fn subcomponent_count(&self) -> MfResult<usize> {
        self.session.subcomponent_count()
    }

    /// True unless some model has disabled convergence.
    pub fn allow_convergence(&self) -> bool {
        self.models.iter().all(Model::allow_convergence)
    }

    pub fn set_allow_convergence(&self, allow: bool) {
        for m in &self.models {
            m.set_allow_convergence(allow);
        }
    }
}
