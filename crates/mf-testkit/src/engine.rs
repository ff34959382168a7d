//! Fake engine: buffers in a table, a scripted clock and scripted solves.

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::rc::Rc;

use mf_core::{
    BufferRef, Engine, EngineError, EngineResult, GridKind, RawBuffer, Session,
};

/// How one solution group behaves under `solve`.
#[derive(Debug, Clone, Default)]
pub struct SolutionScript {
    /// Report convergence from this iteration on (1-based); `None` never converges.
    pub converge_after: Option<usize>,
    /// Multiply `TDIS/DELT` by this factor after every non-converged iteration.
    pub delt_shrink: Option<f64>,
}

#[derive(Debug)]
struct Slot {
    buffer: Rc<RefCell<RawBuffer>>,
    referenceable: bool,
}

/// In-memory engine implementing the full contract.
#[derive(Debug, Default)]
pub struct FakeEngine {
    order: Vec<String>,
    slots: HashMap<String, Slot>,
    grid_kinds: HashMap<i32, GridKind>,
    node_index_base: Option<i32>,

    periods: Vec<(f64, usize)>,
    kper: usize,
    kstp: usize,

    scripts: HashMap<i32, SolutionScript>,
    iterations: HashMap<i32, usize>,

    calls: Vec<String>,
    fail_on: HashSet<String>,
}

impl FakeEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a variable exposed by reference.
    pub fn insert(&mut self, address: &str, value: RawBuffer) {
        self.insert_slot(address, value, true);
    }

    /// Add or replace a variable only reachable by copy.
    pub fn insert_detached(&mut self, address: &str, value: RawBuffer) {
        self.insert_slot(address, value, false);
    }

    fn insert_slot(&mut self, address: &str, value: RawBuffer, referenceable: bool) {
        if !self.slots.contains_key(address) {
            self.order.push(address.to_string());
        }
        self.slots.insert(
            address.to_string(),
            Slot {
                buffer: Rc::new(RefCell::new(value)),
                referenceable,
            },
        );
    }

    pub fn set_referenceable(&mut self, address: &str, referenceable: bool) {
        if let Some(slot) = self.slots.get_mut(address) {
            slot.referenceable = referenceable;
        }
    }

    /// Current contents of a variable.
    pub fn value(&self, address: &str) -> Option<RawBuffer> {
        self.slots.get(address).map(|s| s.buffer.borrow().clone())
    }

    pub fn set_grid_kind(&mut self, grid_id: i32, kind: GridKind) {
        self.grid_kinds.insert(grid_id, kind);
    }

    pub fn set_node_index_base(&mut self, base: i32) {
        self.node_index_base = Some(base);
    }

    /// Stress periods as `(perlen, nstp)`; creates the `TDIS` variables.
    pub fn set_periods(&mut self, periods: Vec<(f64, usize)>) {
        self.insert("TDIS/NPER", RawBuffer::scalar_int(periods.len() as i32));
        self.insert("TDIS/ITMUNI", RawBuffer::scalar_int(4));
        self.insert("TDIS/KPER", RawBuffer::scalar_int(0));
        self.insert("TDIS/KSTP", RawBuffer::scalar_int(0));
        self.insert(
            "TDIS/NSTP",
            RawBuffer::ints(periods.iter().map(|p| p.1 as i32).collect()),
        );
        self.insert("TDIS/DELT", RawBuffer::scalar_double(0.0));
        self.insert("TDIS/PERTIM", RawBuffer::scalar_double(0.0));
        self.insert("TDIS/TOTIM", RawBuffer::scalar_double(0.0));
        self.insert(
            "TDIS/PERLEN",
            RawBuffer::doubles(periods.iter().map(|p| p.0).collect()),
        );
        self.insert("TDIS/TSMULT", RawBuffer::doubles(vec![1.0; periods.len()]));
        self.periods = periods;
    }

    pub fn script_solution(&mut self, solution_id: i32, script: SolutionScript) {
        self.scripts.insert(solution_id, script);
    }

    /// Make the named contract call (e.g. `"solve"`) report an engine failure.
    pub fn fail_on(&mut self, call: &str) {
        self.fail_on.insert(call.to_string());
    }

    /// Every contract call made so far, e.g. `"solve(2)"`.
    pub fn calls(&self) -> &[String] {
        &self.calls
    }

    pub fn count_calls(&self, prefix: &str) -> usize {
        self.calls.iter().filter(|c| c.starts_with(prefix)).count()
    }

    /// Wrap in a session, keeping a handle for inspection.
    pub fn into_session(self) -> (Session, Rc<RefCell<FakeEngine>>) {
        let shared = Rc::new(RefCell::new(self));
        (Session::from_shared(shared.clone()), shared)
    }

    fn record(&mut self, call: &str, detail: String) -> EngineResult<()> {
        self.calls.push(detail);
        if self.fail_on.contains(call) {
            return Err(EngineError::Failed(format!("injected failure in {call}")));
        }
        Ok(())
    }

    fn slot(&self, address: &str) -> EngineResult<&Slot> {
        self.slots
            .get(address)
            .ok_or_else(|| EngineError::UnknownAddress(address.to_string()))
    }

    fn put_f64(&self, address: &str, value: f64) {
        if let Some(slot) = self.slots.get(address) {
            let mut buffer = slot.buffer.borrow_mut();
            // Clock variables are created by set_periods with a matching type.
            let _ = buffer.set_f64(0, value);
        }
    }

    fn get_f64(&self, address: &str) -> f64 {
        self.slots
            .get(address)
            .and_then(|s| s.buffer.borrow().get_f64(0).ok())
            .unwrap_or(0.0)
    }

    fn period_start(&self, kper: usize) -> f64 {
        self.periods[..kper].iter().map(|p| p.0).sum()
    }

    /// Clock position after the step in progress, `(kper, kstp)` 1-based.
    fn next_position(&self) -> Option<(usize, usize)> {
        if self.kper == 0 {
            return self.periods.first().map(|_| (1, 1));
        }
        let (_, nstp) = self.periods[self.kper - 1];
        if self.kstp < nstp {
            Some((self.kper, self.kstp + 1))
        } else if self.kper < self.periods.len() {
            Some((self.kper + 1, 1))
        } else {
            None
        }
    }

    fn nominal_dt(&self, kper: usize) -> f64 {
        let (perlen, nstp) = self.periods[kper - 1];
        perlen / nstp.max(1) as f64
    }
}

impl Engine for FakeEngine {
    fn input_var_names(&self) -> EngineResult<Vec<String>> {
        Ok(self.order.clone())
    }

    fn get_value(&self, address: &str) -> EngineResult<RawBuffer> {
        Ok(self.slot(address)?.buffer.borrow().clone())
    }

    fn get_value_ref(&self, address: &str) -> EngineResult<BufferRef> {
        let slot = self.slot(address)?;
        if !slot.referenceable {
            return Err(EngineError::NotReferenceable(address.to_string()));
        }
        Ok(slot.buffer.clone())
    }

    fn set_value(&mut self, address: &str, value: &RawBuffer) -> EngineResult<()> {
        self.record("set_value", format!("set_value({address})"))?;
        let slot = self.slot(address)?;
        let mut current = slot.buffer.borrow_mut();
        current
            .ensure_same_layout(value, address)
            .map_err(|e| EngineError::Failed(e.to_string()))?;
        *current = value.clone();
        Ok(())
    }

    fn grid_kind(&self, grid_id: i32) -> EngineResult<GridKind> {
        self.grid_kinds
            .get(&grid_id)
            .copied()
            .ok_or_else(|| EngineError::Failed(format!("no grid with id {grid_id}")))
    }

    fn subcomponent_count(&self) -> EngineResult<usize> {
        Ok(self.grid_kinds.len())
    }

    fn node_index_base(&self) -> i32 {
        self.node_index_base.unwrap_or(1)
    }

    fn version(&self) -> Option<String> {
        Some("fake-engine".to_string())
    }

    fn initialize(&mut self) -> EngineResult<()> {
        self.record("initialize", "initialize".to_string())
    }

    fn current_time(&self) -> EngineResult<f64> {
        Ok(self.get_f64("TDIS/TOTIM"))
    }

    fn end_time(&self) -> EngineResult<f64> {
        Ok(self.period_start(self.periods.len()))
    }

    fn time_step(&self) -> EngineResult<f64> {
        match self.next_position() {
            Some((kper, _)) => Ok(self.nominal_dt(kper)),
            None => Ok(0.0),
        }
    }

    fn prepare_time_step(&mut self, dt: f64) -> EngineResult<()> {
        self.record("prepare_time_step", format!("prepare_time_step({dt})"))?;
        let (kper, kstp) = self
            .next_position()
            .ok_or_else(|| EngineError::Failed("simulation already ended".to_string()))?;
        self.kper = kper;
        self.kstp = kstp;
        self.put_f64("TDIS/KPER", kper as f64);
        self.put_f64("TDIS/KSTP", kstp as f64);
        self.put_f64("TDIS/DELT", dt);
        Ok(())
    }

    fn prepare_solve(&mut self, solution_id: i32) -> EngineResult<()> {
        self.record("prepare_solve", format!("prepare_solve({solution_id})"))?;
        self.iterations.insert(solution_id, 0);
        Ok(())
    }

    fn solve(&mut self, solution_id: i32) -> EngineResult<bool> {
        self.record("solve", format!("solve({solution_id})"))?;
        let script = self
            .scripts
            .get(&solution_id)
            .cloned()
            .ok_or_else(|| EngineError::Failed(format!("no solution {solution_id}")))?;
        let count = self.iterations.entry(solution_id).or_default();
        *count += 1;
        let converged = script.converge_after.is_some_and(|n| *count >= n);
        if !converged {
            if let Some(factor) = script.delt_shrink {
                let delt = self.get_f64("TDIS/DELT");
                self.put_f64("TDIS/DELT", delt * factor);
            }
        }
        Ok(converged)
    }

    fn finalize_solve(&mut self, solution_id: i32) -> EngineResult<()> {
        self.record("finalize_solve", format!("finalize_solve({solution_id})"))
    }

    fn finalize_time_step(&mut self) -> EngineResult<()> {
        self.record("finalize_time_step", "finalize_time_step".to_string())?;
        if self.kper == 0 {
            return Ok(());
        }
        let (perlen, nstp) = self.periods[self.kper - 1];
        let pertim = perlen * self.kstp as f64 / nstp.max(1) as f64;
        let totim = if self.kstp >= nstp {
            self.period_start(self.kper)
        } else {
            self.period_start(self.kper - 1) + pertim
        };
        self.put_f64("TDIS/PERTIM", pertim);
        self.put_f64("TDIS/TOTIM", totim);
        Ok(())
    }

    fn finalize(&mut self) -> EngineResult<()> {
        self.record("finalize", "finalize".to_string())
    }
}
