//! Schedule reconstruction.
//!
//! Replays a [`Plan`] against a [`ProblemSpec`] and produces timestamped
//! events. The cursor starts at `(day 1, start slot)`; moves and visits
//! reconcile the cursor with the day/slot they name before taking their
//! duration, and slot advances may leave idle gaps.
//!
//! Day changes snap the clock to the named slot of the new day, discarding any
//! leftover from the previous day. Slot changes within a day only ever move
//! the clock forward.

use std::fmt;

use chrono::{Duration, NaiveDateTime};
use tracing::{debug, info, warn};

use crate::catalog::LocationId;
use crate::encoder::ProblemSpec;
use crate::error::{ActionDecodeError, EncodingInconsistency, TripError};
use crate::plan::{Action, Plan, PlanEntry};
use crate::time_grid::{Slot, TripDay};
use crate::traits::{PlannerBackend, PlanningTask};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventKind {
    Move { from: LocationId, to: LocationId },
    Visit { location: LocationId },
    Idle,
    /// A plan line that did not decode; zero length, at the cursor time.
    Unrecognized { line: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduleEvent {
    pub kind: EventKind,
    /// Cursor day when the event was produced.
    pub day: TripDay,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

impl ScheduleEvent {
    pub fn duration(&self) -> Duration {
        self.end - self.start
    }
}

impl fmt::Display for ScheduleEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Day {}, {} - {}: ",
            self.day.get(),
            self.start.format("%H:%M"),
            self.end.format("%H:%M")
        )?;
        match &self.kind {
            EventKind::Move { from, to } => write!(f, "MOVE {from} -> {to}"),
            EventKind::Visit { location } => write!(f, "VISIT {location}"),
            EventKind::Idle => f.write_str("[transition or idle]"),
            EventKind::Unrecognized { line } => write!(f, "UNRECOGNIZED {line}"),
        }
    }
}

/// Reconstructed itinerary plus the plan lines that could not be decoded.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Schedule {
    pub events: Vec<ScheduleEvent>,
    pub decode_errors: Vec<ActionDecodeError>,
}

impl Schedule {
    /// Minutes of travel plus dwell; idle time costs nothing.
    pub fn total_cost_minutes(&self) -> i64 {
        self.events
            .iter()
            .filter(|event| matches!(event.kind, EventKind::Move { .. } | EventKind::Visit { .. }))
            .map(|event| event.duration().num_minutes())
            .sum()
    }

    /// Time from the first event's start to the last event's end.
    pub fn elapsed(&self) -> Duration {
        match (self.events.first(), self.events.last()) {
            (Some(first), Some(last)) => last.end - first.start,
            _ => Duration::zero(),
        }
    }

    /// One rendered line per event.
    pub fn lines(&self) -> impl Iterator<Item = String> + '_ {
        self.events.iter().map(ScheduleEvent::to_string)
    }
}

#[derive(Debug, Clone, Copy)]
struct Cursor {
    day: TripDay,
    slot: Slot,
    time: NaiveDateTime,
}

/// Replays plans for one encoded problem. Holds no mutable state between
/// calls, so one interpreter can reconstruct any number of plans.
#[derive(Debug, Clone, Copy)]
pub struct Interpreter<'s, 'c> {
    spec: &'s ProblemSpec<'c>,
}

impl<'s, 'c> Interpreter<'s, 'c> {
    pub fn new(spec: &'s ProblemSpec<'c>) -> Self {
        Self { spec }
    }

    /// Reconstructs the schedule for `plan`, in plan order.
    ///
    /// Malformed entries become `Unrecognized` events and are collected in
    /// [`Schedule::decode_errors`]. Actions naming locations or days the
    /// problem does not contain abort reconstruction.
    pub fn reconstruct(&self, plan: &Plan) -> Result<Schedule, EncodingInconsistency> {
        let grid = self.spec.grid();
        let start_slot = self.spec.start_slot();
        let mut cursor = Cursor {
            day: TripDay::FIRST,
            slot: start_slot,
            time: grid.absolute_time(TripDay::FIRST, start_slot),
        };
        let mut schedule = Schedule::default();

        for entry in plan.entries() {
            match entry {
                PlanEntry::Action(action) => {
                    if let Some(event) = self.apply(&mut cursor, action)? {
                        schedule.events.push(event);
                    }
                }
                PlanEntry::Malformed(err) => {
                    warn!(line = err.line_number, "skipping undecodable action");
                    schedule.events.push(ScheduleEvent {
                        kind: EventKind::Unrecognized {
                            line: err.line.clone(),
                        },
                        day: cursor.day,
                        start: cursor.time,
                        end: cursor.time,
                    });
                    schedule.decode_errors.push(err.clone());
                }
            }
        }

        debug!(
            events = schedule.events.len(),
            decode_errors = schedule.decode_errors.len(),
            "reconstructed schedule"
        );
        Ok(schedule)
    }

    fn apply(
        &self,
        cursor: &mut Cursor,
        action: &Action,
    ) -> Result<Option<ScheduleEvent>, EncodingInconsistency> {
        match action {
            Action::Move { from, to, day, slot } => {
                self.spec.check_day(*day)?;
                let minutes = self.spec.travel_minutes(from, to)?;
                self.reconcile(cursor, *day, *slot);
                Ok(Some(self.span(
                    cursor,
                    minutes,
                    EventKind::Move {
                        from: from.clone(),
                        to: to.clone(),
                    },
                )))
            }
            Action::Visit { location, day, slot } => {
                self.spec.check_day(*day)?;
                let minutes = self.spec.dwell_minutes(location)?;
                self.reconcile(cursor, *day, *slot);
                Ok(Some(self.span(
                    cursor,
                    minutes,
                    EventKind::Visit {
                        location: location.clone(),
                    },
                )))
            }
            Action::AdvanceSlot { to, day, .. } => {
                self.spec.check_day(*day)?;
                cursor.day = *day;
                let target = self.spec.grid().absolute_time(cursor.day, *to);
                cursor.slot = *to;
                if target > cursor.time {
                    let event = ScheduleEvent {
                        kind: EventKind::Idle,
                        day: cursor.day,
                        start: cursor.time,
                        end: target,
                    };
                    cursor.time = target;
                    return Ok(Some(event));
                }
                Ok(None)
            }
        }
    }

    /// Aligns the cursor with the day/slot an action was planned for.
    fn reconcile(&self, cursor: &mut Cursor, day: TripDay, slot: Slot) {
        let grid = self.spec.grid();
        if day != cursor.day {
            cursor.day = day;
            cursor.slot = slot;
            cursor.time = grid.absolute_time(day, slot);
        } else if slot != cursor.slot {
            cursor.time = cursor.time.max(grid.absolute_time(day, slot));
            cursor.slot = slot;
        }
    }

    fn span(&self, cursor: &mut Cursor, minutes: u32, kind: EventKind) -> ScheduleEvent {
        let start = cursor.time;
        let end = start + Duration::minutes(i64::from(minutes));
        cursor.time = end;
        ScheduleEvent {
            kind,
            day: cursor.day,
            start,
            end,
        }
    }
}

/// Submits `spec` to `planner` and reconstructs the schedule of the plan it
/// returns.
pub fn plan_trip<P>(spec: &ProblemSpec<'_>, planner: &P) -> Result<(Plan, Schedule), TripError>
where
    P: PlannerBackend + ?Sized,
{
    let task = PlanningTask::from_spec(spec);
    let plan = Plan::parse(&planner.solve(&task)?);
    info!(entries = plan.len(), "received plan");
    let schedule = Interpreter::new(spec).reconstruct(&plan)?;
    Ok((plan, schedule))
}
