use thiserror::Error;

pub type MfResult<T> = Result<T, MfError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum MfError {
    #[error("Variable address not found: {address}")]
    AddressNotFound { address: String },

    #[error("Shape mismatch for {what}: expected {expected:?}, got {actual:?}")]
    ShapeMismatch {
        what: String,
        expected: Vec<usize>,
        actual: Vec<usize>,
    },

    #[error("Capacity exceeded for {what}: {requested} records requested, maxbound is {maxbound}")]
    CapacityExceeded {
        what: String,
        requested: usize,
        maxbound: usize,
    },

    #[error("Index out of range: {what} (index={index}, len={len})")]
    IndexOutOfRange {
        what: &'static str,
        index: usize,
        len: usize,
    },

    #[error("{key} is not accessible in package {package}")]
    KeyNotAccessible { key: String, package: String },

    #[error("{field} cannot be set on package {package}")]
    UnsupportedMutation { field: String, package: String },

    #[error("Variable {address} is not exposed by reference")]
    NotReferenceable { address: String },

    #[error("Solution {solution} did not converge (stress period {kper}, time step {kstp})")]
    ConvergenceFailure {
        solution: u32,
        kper: usize,
        kstp: usize,
    },

    #[error("Engine failure during {context}: {message}")]
    EngineFailure { context: String, message: String },

    #[error("Type mismatch for {what}: expected {expected}, got {actual}")]
    TypeMismatch {
        what: String,
        expected: &'static str,
        actual: &'static str,
    },

    #[error("Package {package} does not provide {expected} access")]
    CapabilityMismatch {
        package: String,
        expected: &'static str,
    },

    #[error("Invalid argument: {what}")]
    InvalidArg { what: String },

    #[error("Run aborted: {reason}")]
    Aborted { reason: String },
}

impl MfError {
    /// Shorthand for the cooperative-cancellation error a callback returns.
    pub fn aborted(reason: impl Into<String>) -> Self {
        MfError::Aborted {
            reason: reason.into(),
        }
    }

    /// True for failures that leave the engine session unusable.
    pub fn is_engine_failure(&self) -> bool {
        matches!(self, MfError::EngineFailure { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capacity_message_names_limits() {
        let err = MfError::CapacityExceeded {
            what: "wel_0".to_string(),
            requested: 3,
            maxbound: 2,
        };
        let msg = format!("{err}");
        assert!(msg.contains("wel_0"));
        assert!(msg.contains("maxbound is 2"));
    }

    #[test]
    fn only_engine_failures_poison_session() {
        assert!(
            MfError::EngineFailure {
                context: "solve".into(),
                message: "boom".into()
            }
            .is_engine_failure()
        );
        assert!(!MfError::aborted("user stop").is_engine_failure());
    }
}
