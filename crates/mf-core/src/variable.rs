//! A single engine variable bound for repeated access.

use crate::buffer::{DType, RawBuffer, type_mismatch};
use crate::engine::BufferRef;
use crate::error::{MfError, MfResult};
use crate::session::Session;

#[derive(Clone)]
enum Binding {
    /// Aliases engine storage.
    Live(BufferRef),
    /// Engine refused a reference; reads and writes copy through the session.
    Detached { shape: Vec<usize>, dtype: DType },
}

/// An address resolved against a session, live when the engine allows it.
#[derive(Clone)]
pub struct Variable {
    address: String,
    session: Session,
    binding: Binding,
}

impl Variable {
    /// Bind an address that must be enumerated by the engine.
    pub fn bind(session: &Session, address: &str) -> MfResult<Self> {
        Self::bind_optional(session, address)?.ok_or_else(|| MfError::AddressNotFound {
            address: address.to_string(),
        })
    }

    /// Bind an address if the engine enumerates it.
    ///
    /// Falls back to copy semantics when the engine cannot hand out a reference.
    pub fn bind_optional(session: &Session, address: &str) -> MfResult<Option<Self>> {
        if !session.has_address(address)? {
            return Ok(None);
        }
        let binding = match session.get_value_ref(address) {
            Ok(buffer) => Binding::Live(buffer),
            Err(MfError::NotReferenceable { .. }) => {
                let value = session.get_value(address)?;
                Binding::Detached {
                    shape: value.shape().to_vec(),
                    dtype: value.dtype(),
                }
            }
            Err(e) => return Err(e),
        };
        Ok(Some(Self {
            address: address.to_string(),
            session: session.clone(),
            binding,
        }))
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    /// Trailing name component, lower-cased.
    pub fn short_name(&self) -> String {
        self.address
            .rsplit('/')
            .next()
            .unwrap_or(&self.address)
            .to_lowercase()
    }

    pub fn is_live(&self) -> bool {
        matches!(self.binding, Binding::Live(_))
    }

    pub fn read(&self) -> MfResult<RawBuffer> {
        match &self.binding {
            Binding::Live(buffer) => Ok(buffer.snapshot()),
            Binding::Detached { .. } => self.session.get_value(&self.address),
        }
    }

    /// Replace the whole variable. Shape and element type must not change.
    pub fn write(&self, value: &RawBuffer) -> MfResult<()> {
        match &self.binding {
            Binding::Live(buffer) => buffer.store(value),
            Binding::Detached { shape, dtype } => {
                if shape.as_slice() != value.shape() {
                    return Err(MfError::ShapeMismatch {
                        what: self.address.clone(),
                        expected: shape.clone(),
                        actual: value.shape().to_vec(),
                    });
                }
                if *dtype != value.dtype() {
                    return Err(type_mismatch(&self.address, *dtype, value.dtype()));
                }
                self.session.set_value(&self.address, value)
            }
        }
    }

    /// First element as an integer (count and flag variables).
    pub fn read_i32(&self) -> MfResult<i32> {
        self.read()?.get_i32(0)
    }

    pub fn read_f64(&self) -> MfResult<f64> {
        self.read()?.get_f64(0)
    }

    pub fn write_i32(&self, value: i32) -> MfResult<()> {
        let mut buf = self.read()?;
        buf.set_i32(0, value)?;
        self.write(&buf)
    }
}

impl std::fmt::Debug for Variable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Variable")
            .field("address", &self.address)
            .field("live", &self.is_live())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{Engine, EngineError, EngineResult, GridKind};
    use std::cell::RefCell;
    use std::collections::HashMap;
    use std::rc::Rc;

    /// Two variables: one live, one only reachable by copy.
    struct StubEngine {
        live: Rc<RefCell<RawBuffer>>,
        copied: RawBuffer,
        fail_next: bool,
        sets: HashMap<String, usize>,
    }

    impl StubEngine {
        fn new() -> Self {
            Self {
                live: Rc::new(RefCell::new(RawBuffer::doubles(vec![1.0, 2.0]))),
                copied: RawBuffer::ints(vec![7]),
                fail_next: false,
                sets: HashMap::new(),
            }
        }
    }

    impl Engine for StubEngine {
        fn input_var_names(&self) -> EngineResult<Vec<String>> {
            Ok(vec!["M/P/LIVE".into(), "M/P/COPY".into()])
        }
        fn get_value(&self, address: &str) -> EngineResult<RawBuffer> {
            match address {
                "M/P/LIVE" => Ok(self.live.borrow().clone()),
                "M/P/COPY" => Ok(self.copied.clone()),
                _ => Err(EngineError::UnknownAddress(address.into())),
            }
        }
        fn get_value_ref(&self, address: &str) -> EngineResult<BufferRef> {
            match address {
                "M/P/LIVE" => Ok(self.live.clone()),
                _ => Err(EngineError::NotReferenceable(address.into())),
            }
        }
        fn set_value(&mut self, address: &str, value: &RawBuffer) -> EngineResult<()> {
            if address == "M/P/COPY" {
                self.copied = value.clone();
            }
            *self.sets.entry(address.to_string()).or_default() += 1;
            Ok(())
        }
        fn grid_kind(&self, _: i32) -> EngineResult<GridKind> {
            Ok(GridKind::Rectilinear)
        }
        fn subcomponent_count(&self) -> EngineResult<usize> {
            Ok(1)
        }
        fn initialize(&mut self) -> EngineResult<()> {
            Ok(())
        }
        fn current_time(&self) -> EngineResult<f64> {
            Ok(0.0)
        }
        fn end_time(&self) -> EngineResult<f64> {
            Ok(1.0)
        }
        fn time_step(&self) -> EngineResult<f64> {
            Ok(1.0)
        }
        fn prepare_time_step(&mut self, _: f64) -> EngineResult<()> {
            Ok(())
        }
        fn prepare_solve(&mut self, _: i32) -> EngineResult<()> {
            Ok(())
        }
        fn solve(&mut self, _: i32) -> EngineResult<bool> {
            if self.fail_next {
                return Err(EngineError::Failed("diverged".into()));
            }
            Ok(true)
        }
        fn finalize_solve(&mut self, _: i32) -> EngineResult<()> {
            Ok(())
        }
        fn finalize_time_step(&mut self) -> EngineResult<()> {
            Ok(())
        }
        fn finalize(&mut self) -> EngineResult<()> {
            Ok(())
        }
    }

    #[test]
    fn live_binding_aliases_engine_storage() {
        let engine = Rc::new(RefCell::new(StubEngine::new()));
        let session = Session::from_shared(engine.clone());
        let var = Variable::bind(&session, "M/P/LIVE").unwrap();
        assert!(var.is_live());
        var.write(&RawBuffer::doubles(vec![5.0, 6.0])).unwrap();
        assert_eq!(
            engine.borrow().live.borrow().as_doubles().unwrap(),
            &[5.0, 6.0]
        );
        assert_eq!(var.short_name(), "live");
    }

    #[test]
    fn detached_binding_copies_through_session() {
        let engine = Rc::new(RefCell::new(StubEngine::new()));
        let session = Session::from_shared(engine.clone());
        let var = Variable::bind(&session, "M/P/COPY").unwrap();
        assert!(!var.is_live());
        assert_eq!(var.read_i32().unwrap(), 7);
        var.write_i32(9).unwrap();
        assert_eq!(engine.borrow().copied.as_ints().unwrap(), &[9]);
        assert_eq!(engine.borrow().sets["M/P/COPY"], 1);

        let err = var.write(&RawBuffer::ints(vec![1, 2])).unwrap_err();
        assert!(matches!(err, MfError::ShapeMismatch { .. }));
    }

    #[test]
    fn missing_address_is_optional_or_not_found() {
        let session = Session::new(StubEngine::new());
        assert!(Variable::bind_optional(&session, "M/P/AUXVAR").unwrap().is_none());
        assert!(matches!(
            Variable::bind(&session, "M/P/AUXVAR"),
            Err(MfError::AddressNotFound { .. })
        ));
    }

    #[test]
    fn failed_session_refuses_further_calls() {
        let engine = Rc::new(RefCell::new(StubEngine::new()));
        let session = Session::from_shared(engine.clone());
        let sid = crate::ids::Id::new(1).unwrap();
        assert!(session.solve(sid).unwrap());

        engine.borrow_mut().fail_next = true;
        let err = session.solve(sid).unwrap_err();
        assert!(err.is_engine_failure());
        assert!(session.is_failed());

        engine.borrow_mut().fail_next = false;
        let err = session.finalize().unwrap_err();
        assert!(matches!(err, MfError::EngineFailure { ref message, .. } if message == "session already failed"));
    }
}
