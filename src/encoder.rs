//! Problem encoder.
//!
//! Translates a [`Catalog`] and a [`PlanRequest`] into a [`ProblemSpec`]: the
//! objects, initial state, openness facts, cost tables and goal handed to the
//! external planner. The encoder does not check feasibility; a location that
//! is closed on every trip day is encoded as-is and the planner reports it.

use std::collections::BTreeSet;

use tracing::{debug, info};

use crate::catalog::{Catalog, Location, LocationId, WeeklyHours};
use crate::error::{ConfigError, EncodingInconsistency};
use crate::plan::{Action, Plan};
use crate::time_grid::{Slot, TimeGrid, TripDay, Weekday, weekday_for};

/// Whether the hour slot starting at `hour` is open on `day`.
///
/// Slot `h` is open iff some interval `[s, e)` satisfies `s <= h < e`, so an
/// interval ending at `e` opens slot `e - 1` but not slot `e`.
pub fn slot_open(hours: &WeeklyHours, day: Weekday, hour: u8) -> bool {
    hours.on(day).iter().any(|interval| interval.contains(hour))
}

/// Precomputed openness keyed by (location, weekday, hour), one 24-bit mask
/// per location and weekday.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpennessTable {
    masks: Vec<[u32; 7]>,
}

impl OpennessTable {
    pub fn build(catalog: &Catalog) -> Self {
        let masks = catalog
            .locations()
            .iter()
            .map(|location| {
                let mut week = [0u32; 7];
                for day in Weekday::ALL {
                    for slot in Slot::all() {
                        if slot_open(&location.hours, day, slot.hour()) {
                            week[day.index()] |= 1 << slot.hour();
                        }
                    }
                }
                week
            })
            .collect();
        Self { masks }
    }

    pub fn is_open(&self, location: usize, day: Weekday, slot: Slot) -> bool {
        self.masks
            .get(location)
            .is_some_and(|week| week[day.index()] & (1 << slot.hour()) != 0)
    }
}

/// Validated trip parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanRequest {
    pub start_weekday: Weekday,
    pub days: u32,
    pub start_location: LocationId,
    pub start_slot: Slot,
}

impl PlanRequest {
    pub fn new(
        start_weekday: &str,
        days: i64,
        start_location: &str,
        start_slot: i64,
    ) -> Result<Self, ConfigError> {
        let start_weekday = start_weekday.parse::<Weekday>()?;
        let days = u32::try_from(days)
            .ok()
            .filter(|d| *d >= 1)
            .ok_or(ConfigError::NonPositiveTripLength(days))?;
        let start_slot =
            Slot::new(start_slot).map_err(|_| ConfigError::SlotOutOfRange(start_slot))?;
        Ok(Self {
            start_weekday,
            days,
            start_location: LocationId::new(start_location.trim().to_ascii_lowercase()),
            start_slot,
        })
    }
}

/// The encoded planning problem. Immutable once built.
#[derive(Debug, Clone)]
pub struct ProblemSpec<'c> {
    catalog: &'c Catalog,
    grid: TimeGrid,
    request: PlanRequest,
    start_index: usize,
    day_weekdays: Vec<Weekday>,
    openness: OpennessTable,
}

/// Builds the [`ProblemSpec`] for `request`.
pub fn encode<'c>(
    catalog: &'c Catalog,
    grid: TimeGrid,
    request: PlanRequest,
) -> Result<ProblemSpec<'c>, ConfigError> {
    let start_index = catalog
        .index_of(request.start_location.as_str())
        .ok_or_else(|| ConfigError::UnknownStartLocation(request.start_location.to_string()))?;

    let day_weekdays: Vec<Weekday> = (1..=request.days)
        .map(|d| weekday_for(request.start_weekday, TripDay::FIRST.offset(d - 1)))
        .collect();
    let openness = OpennessTable::build(catalog);

    let spec = ProblemSpec {
        catalog,
        grid,
        request,
        start_index,
        day_weekdays,
        openness,
    };
    info!(
        start = %spec.request.start_weekday,
        days = spec.request.days,
        locations = catalog.len(),
        "encoded trip problem"
    );
    debug!(open_facts = spec.open_facts().count(), "openness facts");
    Ok(spec)
}

impl<'c> ProblemSpec<'c> {
    pub fn catalog(&self) -> &'c Catalog {
        self.catalog
    }

    pub fn grid(&self) -> &TimeGrid {
        &self.grid
    }

    pub fn request(&self) -> &PlanRequest {
        &self.request
    }

    pub fn days(&self) -> u32 {
        self.request.days
    }

    pub fn trip_days(&self) -> impl Iterator<Item = TripDay> {
        (1..=self.request.days).map(|d| TripDay::FIRST.offset(d - 1))
    }

    pub fn start_location(&self) -> &'c Location {
        &self.catalog.locations()[self.start_index]
    }

    pub fn start_slot(&self) -> Slot {
        self.request.start_slot
    }

    /// Weekday of a trip day, `None` past the end of the trip.
    pub fn weekday_of(&self, day: TripDay) -> Option<Weekday> {
        self.day_weekdays.get(day.get() as usize - 1).copied()
    }

    pub fn check_day(&self, day: TripDay) -> Result<(), EncodingInconsistency> {
        if day.get() > self.request.days {
            return Err(EncodingInconsistency::DayOutOfRange {
                day: day.get(),
                days: self.request.days,
            });
        }
        Ok(())
    }

    /// Openness fact for (location, trip day, slot).
    pub fn is_open(&self, location: usize, day: TripDay, slot: Slot) -> bool {
        self.weekday_of(day)
            .is_some_and(|weekday| self.openness.is_open(location, weekday, slot))
    }

    /// Every (location, day, slot) triple that is open, ordered by day,
    /// location, then slot.
    pub fn open_facts(&self) -> impl Iterator<Item = (&'c Location, TripDay, Slot)> + '_ {
        self.trip_days().flat_map(move |day| {
            self.catalog
                .locations()
                .iter()
                .enumerate()
                .flat_map(move |(i, location)| {
                    Slot::all()
                        .filter(move |slot| self.is_open(i, day, *slot))
                        .map(move |slot| (location, day, slot))
                })
        })
    }

    /// Locations the goal requires to be visited.
    pub fn goal(&self) -> &'c [Location] {
        self.catalog.locations()
    }

    fn index_of(&self, id: &LocationId) -> Result<usize, EncodingInconsistency> {
        self.catalog
            .index_of(id.as_str())
            .ok_or_else(|| EncodingInconsistency::UnknownLocation(id.to_string()))
    }

    pub fn travel_minutes(
        &self,
        from: &LocationId,
        to: &LocationId,
    ) -> Result<u32, EncodingInconsistency> {
        let (i, j) = (self.index_of(from)?, self.index_of(to)?);
        self.catalog
            .travel_minutes(i, j)
            .ok_or_else(|| EncodingInconsistency::MissingTravel {
                from: from.to_string(),
                to: to.to_string(),
            })
    }

    pub fn dwell_minutes(&self, location: &LocationId) -> Result<u32, EncodingInconsistency> {
        let i = self.index_of(location)?;
        Ok(self.catalog.locations()[i].dwell_minutes)
    }

    /// Replays the cost model over `plan`: travel for every move, dwell for
    /// every visit (repeated visits count again), nothing for slot advances.
    /// Malformed entries are ignored.
    pub fn evaluate(&self, plan: &Plan) -> Result<PlanEvaluation, EncodingInconsistency> {
        let mut total_cost = 0u64;
        let mut visited = BTreeSet::new();
        for action in plan.actions() {
            match action {
                Action::Move { from, to, day, .. } => {
                    self.check_day(*day)?;
                    total_cost += u64::from(self.travel_minutes(from, to)?);
                }
                Action::Visit { location, day, .. } => {
                    self.check_day(*day)?;
                    total_cost += u64::from(self.dwell_minutes(location)?);
                    visited.insert(location.clone());
                }
                Action::AdvanceSlot { day, .. } => self.check_day(*day)?,
            }
        }
        let goal_satisfied = self.goal().iter().all(|location| visited.contains(&location.id));
        debug!(total_cost, goal_satisfied, "evaluated plan");
        Ok(PlanEvaluation {
            total_cost,
            visited,
            goal_satisfied,
        })
    }
}

/// Outcome of checking a plan against the goal and the cost model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanEvaluation {
    /// Accumulated cost in minutes.
    pub total_cost: u64,
    pub visited: BTreeSet<LocationId>,
    pub goal_satisfied: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokyo_request() -> PlanRequest {
        PlanRequest::new("wednesday", 5, "tokyo_tower", 8).unwrap()
    }

    #[test]
    fn test_slot_open_boundaries() {
        let hours = WeeklyHours::new().with(Weekday::Monday, &[(9, 17)]).unwrap();
        assert!(!slot_open(&hours, Weekday::Monday, 8));
        assert!(slot_open(&hours, Weekday::Monday, 9));
        assert!(slot_open(&hours, Weekday::Monday, 16));
        assert!(!slot_open(&hours, Weekday::Monday, 17));
        assert!(!slot_open(&hours, Weekday::Tuesday, 10));
    }

    #[test]
    fn test_table_agrees_with_slot_open() {
        let catalog = Catalog::tokyo().unwrap();
        let table = OpennessTable::build(&catalog);
        for (i, location) in catalog.locations().iter().enumerate() {
            for day in Weekday::ALL {
                for slot in Slot::all() {
                    assert_eq!(
                        table.is_open(i, day, slot),
                        slot_open(&location.hours, day, slot.hour()),
                        "{} {} {}",
                        location.id,
                        day,
                        slot
                    );
                }
            }
        }
    }

    #[test]
    fn test_request_validation() {
        assert!(matches!(
            PlanRequest::new("someday", 5, "tokyo_tower", 8),
            Err(ConfigError::UnknownWeekday(_))
        ));
        assert!(matches!(
            PlanRequest::new("monday", 0, "tokyo_tower", 8),
            Err(ConfigError::NonPositiveTripLength(0))
        ));
        assert!(matches!(
            PlanRequest::new("monday", 2, "tokyo_tower", 24),
            Err(ConfigError::SlotOutOfRange(24))
        ));
    }

    #[test]
    fn test_unknown_start_location() {
        let catalog = Catalog::tokyo().unwrap();
        let request = PlanRequest::new("monday", 1, "mount_fuji", 8).unwrap();
        assert!(matches!(
            encode(&catalog, TimeGrid::default(), request),
            Err(ConfigError::UnknownStartLocation(_))
        ));
    }

    #[test]
    fn test_trip_days_follow_start_weekday() {
        let catalog = Catalog::tokyo().unwrap();
        let spec = encode(&catalog, TimeGrid::default(), tokyo_request()).unwrap();
        let weekdays: Vec<_> = spec.trip_days().filter_map(|d| spec.weekday_of(d)).collect();
        assert_eq!(
            weekdays,
            vec![
                Weekday::Wednesday,
                Weekday::Thursday,
                Weekday::Friday,
                Weekday::Saturday,
                Weekday::Sunday
            ]
        );
        assert_eq!(spec.weekday_of(TripDay::new(6).unwrap()), None);
    }

    #[test]
    fn test_tokyo_tower_closed_on_thursday() {
        let catalog = Catalog::tokyo().unwrap();
        let spec = encode(&catalog, TimeGrid::default(), tokyo_request()).unwrap();
        let tower = catalog.index_of("tokyo_tower").unwrap();
        let day2 = TripDay::new(2).unwrap();
        assert!(Slot::all().all(|slot| !spec.is_open(tower, day2, slot)));
        // Wednesday has a lunch break 12:00-13:00.
        let day1 = TripDay::new(1).unwrap();
        assert!(spec.is_open(tower, day1, Slot::new(11).unwrap()));
        assert!(!spec.is_open(tower, day1, Slot::new(12).unwrap()));
        assert!(spec.is_open(tower, day1, Slot::new(13).unwrap()));
    }

    #[test]
    fn test_open_fact_count() {
        let catalog = Catalog::tokyo().unwrap();
        let spec = encode(&catalog, TimeGrid::default(), tokyo_request()).unwrap();
        // Wed..Sun; tokyo_tower: 9 + 0 + 8 + 6 + 6; the rest are the same every day.
        let tower = 9 + 8 + 6 + 6;
        let others = 5 * (10 + 12 + 8 + 8 + 11 + 8);
        assert_eq!(spec.open_facts().count(), tower + others);
    }

    /// Formats events emitted at or below `level` while `f` runs.
    fn captured_logs(level: tracing::Level, f: impl FnOnce()) -> String {
        use std::sync::{Arc, Mutex};

        #[derive(Clone, Default)]
        struct Buffer(Arc<Mutex<Vec<u8>>>);

        impl std::io::Write for Buffer {
            fn write(&mut self, bytes: &[u8]) -> std::io::Result<usize> {
                self.0.lock().unwrap().extend_from_slice(bytes);
                Ok(bytes.len())
            }

            fn flush(&mut self) -> std::io::Result<()> {
                Ok(())
            }
        }

        let buffer = Buffer::default();
        let writer = buffer.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(level)
            .with_ansi(false)
            .with_writer(move || writer.clone())
            .finish();
        tracing::subscriber::with_default(subscriber, f);
        let bytes = buffer.0.lock().unwrap().clone();
        String::from_utf8(bytes).unwrap()
    }

    #[test]
    fn test_encode_summary_skips_fact_count_at_info() {
        let catalog = Catalog::tokyo().unwrap();
        let logs = captured_logs(tracing::Level::INFO, || {
            encode(&catalog, TimeGrid::default(), tokyo_request()).unwrap();
        });
        assert!(logs.contains("encoded trip problem"), "{logs}");
        assert!(!logs.contains("open_facts"), "{logs}");

        let logs = captured_logs(tracing::Level::DEBUG, || {
            encode(&catalog, TimeGrid::default(), tokyo_request()).unwrap();
        });
        assert!(logs.contains("open_facts=314"), "{logs}");
    }
}
