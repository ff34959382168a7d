//! Shared handle onto one engine session.
//!
//! All engine calls made by the views, the model layer and the driver go
//! through a [`Session`], which adds call context to errors and refuses any
//! further calls once the engine has reported a failure.

use std::cell::{Cell, RefCell};
use std::collections::HashSet;
use std::rc::Rc;

use crate::buffer::RawBuffer;
use crate::engine::{BufferRef, Engine, EngineError, EngineResult, GridKind};
use crate::error::{MfError, MfResult};
use crate::ids::SolutionId;

/// The engine's address enumeration, cached per bind.
#[derive(Debug, Default)]
pub struct AddressIndex {
    names: Vec<String>,
    lookup: HashSet<String>,
}

impl AddressIndex {
    fn new(names: Vec<String>) -> Self {
        let lookup = names.iter().cloned().collect();
        Self { names, lookup }
    }

    /// Addresses in engine order.
    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn contains(&self, address: &str) -> bool {
        self.lookup.contains(address)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

#[derive(Default)]
struct SessionState {
    failed: Cell<bool>,
    addresses: RefCell<Option<Rc<AddressIndex>>>,
}

/// Cloneable, single-threaded handle onto an engine.
#[derive(Clone)]
pub struct Session {
    engine: Rc<RefCell<dyn Engine>>,
    state: Rc<SessionState>,
}

impl Session {
    pub fn new<E: Engine + 'static>(engine: E) -> Self {
        Self::from_shared(Rc::new(RefCell::new(engine)))
    }

    /// Wrap an engine the caller keeps its own handle to.
    pub fn from_shared(engine: Rc<RefCell<dyn Engine>>) -> Self {
        Self {
            engine,
            state: Rc::new(SessionState::default()),
        }
    }

    /// True once any engine call has failed.
    pub fn is_failed(&self) -> bool {
        self.state.failed.get()
    }

    fn check_alive(&self, context: &str) -> MfResult<()> {
        if self.is_failed() {
            return Err(MfError::EngineFailure {
                context: context.to_string(),
                message: "session already failed".to_string(),
            });
        }
        Ok(())
    }

    fn map_err(&self, context: &str, err: EngineError) -> MfError {
        match err {
            EngineError::Failed(message) => {
                self.state.failed.set(true);
                tracing::error!(context, %message, "engine call failed");
                MfError::EngineFailure {
                    context: context.to_string(),
                    message,
                }
            }
            other => other.into(),
        }
    }

    fn call<T>(&self, context: &str, f: impl FnOnce(&dyn Engine) -> EngineResult<T>) -> MfResult<T> {
        self.check_alive(context)?;
        let engine = self.engine.borrow();
        f(&*engine).map_err(|e| self.map_err(context, e))
    }

    fn call_mut<T>(
        &self,
        context: &str,
        f: impl FnOnce(&mut dyn Engine) -> EngineResult<T>,
    ) -> MfResult<T> {
        self.check_alive(context)?;
        let mut engine = self.engine.borrow_mut();
        f(&mut *engine).map_err(|e| self.map_err(context, e))
    }

    /// The cached address enumeration, loading it on first use.
    pub fn addresses(&self) -> MfResult<Rc<AddressIndex>> {
        if let Some(index) = self.state.addresses.borrow().as_ref() {
            return Ok(Rc::clone(index));
        }
        self.refresh_addresses()
    }

    /// Re-enumerate the engine namespace, replacing the cache.
    pub fn refresh_addresses(&self) -> MfResult<Rc<AddressIndex>> {
        let names = self.call("input_var_names", |e| e.input_var_names())?;
        let index = Rc::new(AddressIndex::new(names));
        *self.state.addresses.borrow_mut() = Some(Rc::clone(&index));
        Ok(index)
    }

    pub fn has_address(&self, address: &str) -> MfResult<bool> {
        Ok(self.addresses()?.contains(address))
    }

    pub fn var_address(&self, name: &str, component: &str, subcomponent: Option<&str>) -> String {
        self.engine.borrow().var_address(name, component, subcomponent)
    }

    pub fn get_value(&self, address: &str) -> MfResult<RawBuffer> {
        self.call("get_value", |e| e.get_value(address))
    }

    pub fn get_value_ref(&self, address: &str) -> MfResult<BufferRef> {
        self.call("get_value_ref", |e| e.get_value_ref(address))
    }

    pub fn set_value(&self, address: &str, value: &RawBuffer) -> MfResult<()> {
        self.call_mut("set_value", |e| e.set_value(address, value))
    }

    pub fn grid_kind(&self, grid_id: i32) -> MfResult<GridKind> {
        self.call("grid_kind", |e| e.grid_kind(grid_id))
    }

    pub fn subcomponent_count(&self) -> MfResult<usize> {
        self.call("subcomponent_count", |e| e.subcomponent_count())
    }

    pub fn node_index_base(&self) -> i32 {
        self.engine.borrow().node_index_base()
    }

    pub fn version(&self) -> Option<String> {
        self.engine.borrow().version()
    }

    pub fn initialize(&self) -> MfResult<()> {
        self.call_mut("initialize", |e| e.initialize())
    }

    pub fn current_time(&self) -> MfResult<f64> {
        self.call("current_time", |e| e.current_time())
    }

    pub fn end_time(&self) -> MfResult<f64> {
        self.call("end_time", |e| e.end_time())
    }

    pub fn time_step(&self) -> MfResult<f64> {
        self.call("time_step", |e| e.time_step())
    }

    pub fn prepare_time_step(&self, dt: f64) -> MfResult<()> {
        self.call_mut("prepare_time_step", |e| e.prepare_time_step(dt))
    }

    pub fn prepare_solve(&self, id: SolutionId) -> MfResult<()> {
        self.call_mut("prepare_solve", |e| e.prepare_solve(id.get() as i32))
    }

    pub fn solve(&self, id: SolutionId) -> MfResult<bool> {
        self.call_mut("solve", |e| e.solve(id.get() as i32))
    }

    pub fn finalize_solve(&self, id: SolutionId) -> MfResult<()> {
        self.call_mut("finalize_solve", |e| e.finalize_solve(id.get() as i32))
    }

    pub fn finalize_time_step(&self) -> MfResult<()> {
        self.call_mut("finalize_time_step", |e| e.finalize_time_step())
    }

    pub fn finalize(&self) -> MfResult<()> {
        self.call_mut("finalize", |e| e.finalize())
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("failed", &self.is_failed())
            .finish_non_exhaustive()
    }
}
