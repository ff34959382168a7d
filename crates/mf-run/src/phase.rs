//! Callback invocation points.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Where in the run a callback is being invoked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Initialize,
    StressPeriodStart,
    TimestepStart,
    SolveStart,
    IterationStart,
    IterationEnd,
    SolveEnd,
    TimestepEnd,
    StressPeriodEnd,
    Finalize,
}

impl Phase {
    pub fn as_str(self) -> &'static str {
        match self {
            Phase::Initialize => "initialize",
            Phase::StressPeriodStart => "stress_period_start",
            Phase::TimestepStart => "timestep_start",
            Phase::SolveStart => "solve_start",
            Phase::IterationStart => "iteration_start",
            Phase::IterationEnd => "iteration_end",
            Phase::SolveEnd => "solve_end",
            Phase::TimestepEnd => "timestep_end",
            Phase::StressPeriodEnd => "stress_period_end",
            Phase::Finalize => "finalize",
        }
    }

    /// True for phases invoked with a view scoped to one solution group.
    pub fn is_group_scoped(self) -> bool {
        matches!(
            self,
            Phase::StressPeriodStart
                | Phase::SolveStart
                | Phase::IterationStart
                | Phase::IterationEnd
                | Phase::SolveEnd
        )
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phases_serialize_by_name() {
        let text = serde_yaml::to_string(&Phase::StressPeriodStart).unwrap();
        assert_eq!(text.trim(), "stress_period_start");
        let back: Phase = serde_yaml::from_str("iteration_end").unwrap();
        assert_eq!(back, Phase::IterationEnd);
        assert_eq!(Phase::Finalize.to_string(), "finalize");
    }

    #[test]
    fn only_solve_phases_are_group_scoped() {
        assert!(Phase::IterationStart.is_group_scoped());
        assert!(Phase::StressPeriodStart.is_group_scoped());
        assert!(!Phase::TimestepStart.is_group_scoped());
        assert!(!Phase::Finalize.is_group_scoped());
    }
}
