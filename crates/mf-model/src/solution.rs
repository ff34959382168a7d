//! Solution groups: a numerical solution and the models it solves together.

use mf_core::{MfResult, Session, SolutionId};
use mf_data::schema::{ADVANCED, IMS, SLN};
use mf_data::{AdvancedView, ScalarView};

/// Sub-package holding the linear solver settings.
const LINEAR_SOLVER: &str = "IMSLINEAR";
const LINEAR_PREFIX: &str = "ims_";

#[derive(Debug)]
pub struct SolutionGroup {
    id: SolutionId,
    name: String,
    scalars: ScalarView,
    advanced: AdvancedView,
}

impl SolutionGroup {
    /// Bind solution component `name` (e.g. `SLN_1`).
    ///
    /// Linear solver scalars are folded in; names that clash with the
    /// nonlinear settings get an `ims_` prefix.
    pub fn bind(session: &Session, id: SolutionId, name: &str) -> MfResult<Self> {
        let mut scalars = ScalarView::bind(session, SLN.fields, name, None)?;
        let linear = ScalarView::bind(session, IMS.fields, name, Some(LINEAR_SOLVER))?;
        scalars.merge_prefixed(linear, LINEAR_PREFIX);
        let advanced = AdvancedView::bind(session, &ADVANCED, name, None, true)?;
        Ok(Self {
            id,
            name: name.to_lowercase(),
            scalars,
            advanced,
        })
    }

    pub fn id(&self) -> SolutionId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn scalars(&self) -> &ScalarView {
        &self.scalars
    }

    /// Every variable of the solution component, by name.
    pub fn advanced(&self) -> &AdvancedView {
        &self.advanced
    }

    /// Outer iteration limit (`MXITER`).
    pub fn max_iterations(&self) -> MfResult<usize> {
        Ok(self.scalars.get_i32("mxiter")?.max(0) as usize)
    }
}
