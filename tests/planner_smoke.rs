mod fixtures;

use std::cell::RefCell;
use std::time::Duration;

use trip_planner::catalog::Catalog;
use trip_planner::encoder::{PlanRequest, encode};
use trip_planner::error::{PlannerError, TripError};
use trip_planner::schedule::{EventKind, plan_trip};
use trip_planner::time_grid::TimeGrid;
use trip_planner::traits::{PlannerBackend, PlanningTask};

/// Returns a canned plan and remembers the task it was given.
struct MockPlanner {
    plan: &'static str,
    seen: RefCell<Option<PlanningTask>>,
}

impl MockPlanner {
    fn new(plan: &'static str) -> Self {
        Self {
            plan,
            seen: RefCell::new(None),
        }
    }
}

impl PlannerBackend for MockPlanner {
    fn solve(&self, task: &PlanningTask) -> Result<String, PlannerError> {
        *self.seen.borrow_mut() = Some(task.clone());
        Ok(self.plan.to_string())
    }
}

struct FailingPlanner(fn() -> PlannerError);

impl PlannerBackend for FailingPlanner {
    fn solve(&self, _task: &PlanningTask) -> Result<String, PlannerError> {
        Err((self.0)())
    }
}

const TWIN_PLAN: &str = "\
(visit museum day1 ts_8)
(advance_slot ts_8 ts_9 day1)
(advance_slot ts_9 ts_10 day1)
(move museum garden day1 ts_10)
(visit garden day1 ts_10)
; cost = 300 (general cost)
";

#[test]
fn test_plan_trip_with_mock_planner() {
    let catalog = fixtures::twin_sights();
    let request = PlanRequest::new("friday", 1, "museum", 8).unwrap();
    let spec = encode(&catalog, TimeGrid::default(), request).unwrap();
    let planner = MockPlanner::new(TWIN_PLAN);

    let (plan, schedule) = plan_trip(&spec, &planner).unwrap();

    assert_eq!(plan.len(), 5);
    let task = planner.seen.borrow().clone().unwrap();
    assert_eq!(task, PlanningTask::from_spec(&spec));
    assert!(task.problem.contains("(at museum)"));

    let kinds: Vec<_> = schedule.events.iter().map(|e| &e.kind).collect();
    assert!(matches!(kinds[0], EventKind::Visit { .. }));
    assert!(matches!(kinds[1], EventKind::Move { .. }));
    assert!(matches!(kinds[2], EventKind::Visit { .. }));
    assert_eq!(schedule.total_cost_minutes(), 300);
    assert!(spec.evaluate(&plan).unwrap().goal_satisfied);
}

#[test]
fn test_boxed_backend_is_usable() {
    let catalog = Catalog::tokyo().unwrap();
    let request = PlanRequest::new("wednesday", 5, "tokyo_tower", 8).unwrap();
    let spec = encode(&catalog, TimeGrid::default(), request).unwrap();
    let planner: Box<dyn PlannerBackend> =
        Box::new(MockPlanner::new("(visit tokyo_tower day1 ts_8)"));

    let (_, schedule) = plan_trip(&spec, &planner).unwrap();
    assert_eq!(schedule.events.len(), 1);
}

#[test]
fn test_planner_errors_are_propagated() {
    let catalog = fixtures::twin_sights();
    let request = PlanRequest::new("friday", 1, "museum", 8).unwrap();
    let spec = encode(&catalog, TimeGrid::default(), request).unwrap();

    let unsolvable = FailingPlanner(|| PlannerError::NoPlanFound("unsolvable".into()));
    let err = plan_trip(&spec, &unsolvable).unwrap_err();
    assert!(matches!(err, TripError::Planner(PlannerError::NoPlanFound(_))));

    let slow = FailingPlanner(|| PlannerError::Timeout(Duration::from_secs(1)));
    let err = plan_trip(&spec, &slow).unwrap_err();
    assert!(matches!(err, TripError::Planner(PlannerError::Timeout(_))));

    let missing = FailingPlanner(|| PlannerError::InvocationFailed("no python".into()));
    let err = plan_trip(&spec, &missing).unwrap_err();
    assert!(matches!(err, TripError::Planner(PlannerError::InvocationFailed(_))));
}

#[test]
fn test_inconsistent_plan_is_reported() {
    let catalog = fixtures::twin_sights();
    let request = PlanRequest::new("friday", 1, "museum", 8).unwrap();
    let spec = encode(&catalog, TimeGrid::default(), request).unwrap();
    let planner = MockPlanner::new("(visit museum day2 ts_8)");

    let err = plan_trip(&spec, &planner).unwrap_err();
    assert!(matches!(err, TripError::EncodingInconsistency(_)));
}
