//! What callbacks see: the simulation, optionally scoped to one solution group.

use mf_core::{MfError, MfResult, SolutionId};

use crate::model::Model;
use crate::simulation::Simulation;
use crate::solution::SolutionGroup;

/// A borrowed view of a [`Simulation`].
///
/// Scoped to a solution group, model lookup and convergence control only
/// reach that group's models; all packages stay readable through
/// [`SimulationView::simulation`].
#[derive(Debug, Clone, Copy)]
pub struct SimulationView<'a> {
    sim: &'a Simulation,
    group: Option<SolutionId>,
    iteration: Option<usize>,
}

impl<'a> SimulationView<'a> {
    pub fn new(sim: &'a Simulation) -> Self {
        Self {
            sim,
            group: None,
            iteration: None,
        }
    }

    pub fn for_group(sim: &'a Simulation, group: SolutionId) -> Self {
        Self {
            sim,
            group: Some(group),
            iteration: None,
        }
    }

    pub fn with_iteration(self, iteration: usize) -> Self {
        Self {
            iteration: Some(iteration),
            ..self
        }
    }

    pub fn simulation(&self) -> &'a Simulation {
        self.sim
    }

    pub fn solution_id(&self) -> Option<SolutionId> {
        self.group
    }

    pub fn solution(&self) -> Option<&'a SolutionGroup> {
        self.group.and_then(|id| self.sim.solution(id).ok())
    }

    /// Current outer iteration, 0-based, while a group is iterating.
    pub fn iteration(&self) -> Option<usize> {
        self.iteration
    }

    pub fn models(&self) -> Vec<&'a Model> {
        let sim = self.sim;
        match self.group {
            Some(id) => sim.models_in(id).collect(),
            None => sim.models().iter().collect(),
        }
    }

    pub fn model(&self, name: &str) -> MfResult<&'a Model> {
        let model = self.sim.model(name)?;
        match self.group {
            Some(id) if model.solution_id() != id => Err(MfError::KeyNotAccessible {
                key: name.to_string(),
                package: format!("solution group {id}"),
            }),
            _ => Ok(model),
        }
    }

    pub fn allow_convergence(&self) -> bool {
        self.models().iter().all(|m| m.allow_convergence())
    }

    pub fn set_allow_convergence(&self, allow: bool) {
        for m in self.models() {
            m.set_allow_convergence(allow);
        }
    }

    pub fn kper(&self) -> MfResult<usize> {
        self.sim.kper()
    }

    pub fn kstp(&self) -> MfResult<usize> {
        self.sim.kstp()
    }

    pub fn nstp(&self) -> MfResult<usize> {
        self.sim.nstp()
    }

    pub fn delt(&self) -> MfResult<f64> {
        self.sim.delt()
    }

    pub fn totim(&self) -> MfResult<f64> {
        self.sim.totim()
    }
}
