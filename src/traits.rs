//! Boundary to the external planner.
//!
//! The crate never searches for plans itself. A backend receives the PDDL
//! domain and problem text and returns the raw plan text, one action per
//! line. Concrete backends live in [`crate::downward`] and
//! [`crate::planning_service`]; tests can supply their own.

use serde::Serialize;

use crate::encoder::ProblemSpec;
use crate::error::PlannerError;
use crate::pddl;

/// Domain and problem text submitted to a planner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlanningTask {
    pub domain: String,
    pub problem: String,
}

impl PlanningTask {
    pub fn from_spec(spec: &ProblemSpec<'_>) -> Self {
        Self {
            domain: pddl::domain_pddl(),
            problem: pddl::problem_pddl(spec),
        }
    }
}

/// Produces a plan for a task.
///
/// Implementations distinguish an instance with no plan
/// ([`PlannerError::NoPlanFound`]) from a planner that could not be run
/// ([`PlannerError::InvocationFailed`]) and from one that ran out of time
/// ([`PlannerError::Timeout`]).
pub trait PlannerBackend {
    fn solve(&self, task: &PlanningTask) -> Result<String, PlannerError>;
}

impl<P: PlannerBackend + ?Sized> PlannerBackend for Box<P> {
    fn solve(&self, task: &PlanningTask) -> Result<String, PlannerError> {
        (**self).solve(task)
    }
}
