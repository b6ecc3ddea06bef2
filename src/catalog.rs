//! Static reference data: sights, dwell times, opening hours, travel times.
//!
//! A [`Catalog`] is built once (from the built-in Tokyo data or a TOML file)
//! and shared read-only by the encoder and the interpreter.

use std::borrow::Borrow;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::ConfigError;
use crate::time_grid::Weekday;

/// Unique identifier of a location, e.g. `tokyo_tower`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LocationId(String);

impl LocationId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for LocationId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LocationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Half-open hour interval `[start, end)`, `0 <= start < end <= 24`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OpeningInterval {
    start: u8,
    end: u8,
}

impl OpeningInterval {
    pub fn new(start: u8, end: u8) -> Result<Self, ConfigError> {
        if start >= end || end > 24 {
            return Err(ConfigError::InvalidCatalog(format!(
                "opening interval [{start},{end}) is not within 0..=24 with start < end"
            )));
        }
        Ok(Self { start, end })
    }

    pub fn start(&self) -> u8 {
        self.start
    }

    pub fn end(&self) -> u8 {
        self.end
    }

    /// Whether the whole hour slot starting at `hour` lies inside the interval.
    #[inline]
    pub fn contains(&self, hour: u8) -> bool {
        self.start <= hour && hour < self.end
    }
}

/// Opening intervals per weekday. A weekday without intervals is closed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WeeklyHours {
    days: [Vec<OpeningInterval>; 7],
}

impl WeeklyHours {
    /// Closed every day.
    pub fn new() -> Self {
        Self::default()
    }

    /// The same intervals on every weekday.
    pub fn every_day(intervals: &[(u8, u8)]) -> Result<Self, ConfigError> {
        Weekday::ALL
            .into_iter()
            .try_fold(Self::new(), |hours, day| hours.with(day, intervals))
    }

    /// Replaces the intervals of one weekday. Intervals must be ordered and
    /// non-overlapping.
    pub fn with(mut self, day: Weekday, intervals: &[(u8, u8)]) -> Result<Self, ConfigError> {
        let mut parsed: Vec<OpeningInterval> = Vec::with_capacity(intervals.len());
        for &(start, end) in intervals {
            let interval = OpeningInterval::new(start, end)?;
            if let Some(prev) = parsed.last() {
                if interval.start < prev.end {
                    return Err(ConfigError::InvalidCatalog(format!(
                        "{day} intervals overlap or are out of order at [{start},{end})"
                    )));
                }
            }
            parsed.push(interval);
        }
        self.days[day.index()] = parsed;
        Ok(self)
    }

    pub fn on(&self, day: Weekday) -> &[OpeningInterval] {
        &self.days[day.index()]
    }
}

/// A sight to visit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    pub id: LocationId,
    /// Time spent at the location, in minutes.
    pub dwell_minutes: u32,
    pub hours: WeeklyHours,
}

impl Location {
    pub fn new(id: impl Into<String>, dwell_minutes: u32, hours: WeeklyHours) -> Self {
        Self {
            id: LocationId::new(id),
            dwell_minutes,
            hours,
        }
    }
}

/// Directed travel duration between two distinct locations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TravelEdge {
    pub from: LocationId,
    pub to: LocationId,
    pub minutes: u32,
}

impl TravelEdge {
    pub fn new(from: impl Into<String>, to: impl Into<String>, minutes: u32) -> Self {
        Self {
            from: LocationId::new(from),
            to: LocationId::new(to),
            minutes,
        }
    }
}

/// Immutable set of locations with a total travel table.
#[derive(Debug, Clone)]
pub struct Catalog {
    locations: Vec<Location>,
    index: HashMap<LocationId, usize>,
    /// `travel[from][to]`, `None` on the diagonal only.
    travel: Vec<Vec<Option<u32>>>,
}

impl Catalog {
    /// Builds a catalog, rejecting duplicate ids, zero dwell times, self loops,
    /// duplicate or dangling edges, and missing ordered pairs.
    ///
    /// Ids are lowercased, matching how planners echo object names back, and
    /// must be valid PDDL names (see [`normalize_id`]).
    pub fn new(
        mut locations: Vec<Location>,
        edges: impl IntoIterator<Item = TravelEdge>,
    ) -> Result<Self, ConfigError> {
        let mut index = HashMap::with_capacity(locations.len());
        for (i, location) in locations.iter_mut().enumerate() {
            location.id = normalize_id(&location.id)?;
            if location.dwell_minutes == 0 {
                return Err(ConfigError::InvalidCatalog(format!(
                    "{} has a zero dwell time",
                    location.id
                )));
            }
            if index.insert(location.id.clone(), i).is_some() {
                return Err(ConfigError::InvalidCatalog(format!(
                    "duplicate location {}",
                    location.id
                )));
            }
        }

        let n = locations.len();
        let mut travel = vec![vec![None; n]; n];
        for edge in edges {
            let edge = TravelEdge {
                from: normalize_id(&edge.from)?,
                to: normalize_id(&edge.to)?,
                minutes: edge.minutes,
            };
            if edge.from == edge.to {
                return Err(ConfigError::InvalidCatalog(format!(
                    "self loop on {}",
                    edge.from
                )));
            }
            let lookup = |id: &LocationId| {
                index.get(id).copied().ok_or_else(|| {
                    ConfigError::InvalidCatalog(format!("travel edge names unknown location {id}"))
                })
            };
            let (from, to) = (lookup(&edge.from)?, lookup(&edge.to)?);
            if travel[from][to].replace(edge.minutes).is_some() {
                return Err(ConfigError::InvalidCatalog(format!(
                    "duplicate travel edge {} -> {}",
                    edge.from, edge.to
                )));
            }
        }

        for (from, row) in travel.iter().enumerate() {
            for (to, minutes) in row.iter().enumerate() {
                if from != to && minutes.is_none() {
                    return Err(ConfigError::InvalidCatalog(format!(
                        "missing travel time {} -> {}",
                        locations[from].id, locations[to].id
                    )));
                }
            }
        }

        debug!(locations = n, "catalog built");
        Ok(Self {
            locations,
            index,
            travel,
        })
    }

    /// Builds a catalog from a square matrix ordered like `locations`.
    /// Diagonal entries are ignored.
    pub fn from_matrix(locations: Vec<Location>, matrix: &[Vec<u32>]) -> Result<Self, ConfigError> {
        let n = locations.len();
        if matrix.len() != n || matrix.iter().any(|row| row.len() != n) {
            return Err(ConfigError::InvalidCatalog(format!("travel matrix must be {n}x{n}")));
        }
        let mut edges = Vec::with_capacity(n * n);
        for (i, from) in locations.iter().enumerate() {
            for (j, to) in locations.iter().enumerate() {
                if i != j {
                    edges.push(TravelEdge {
                        from: from.id.clone(),
                        to: to.id.clone(),
                        minutes: matrix[i][j],
                    });
                }
            }
        }
        Self::new(locations, edges)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let file: CatalogFile = toml::from_str(s)?;
        let mut locations = Vec::with_capacity(file.locations.len());
        for entry in file.locations {
            let mut hours = WeeklyHours::new();
            for (day, intervals) in &entry.hours {
                hours = hours.with(*day, intervals)?;
            }
            locations.push(Location {
                id: entry.id,
                dwell_minutes: entry.dwell_minutes,
                hours,
            });
        }
        Self::new(locations, file.travel)
    }

    pub fn locations(&self) -> &[Location] {
        &self.locations
    }

    pub fn len(&self) -> usize {
        self.locations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locations.is_empty()
    }

    pub fn index_of(&self, id: &str) -> Option<usize> {
        self.index.get(id).copied()
    }

    pub fn location(&self, id: &str) -> Option<&Location> {
        self.index_of(id).map(|i| &self.locations[i])
    }

    /// Travel minutes between two location indices; `None` for `from == to`.
    pub fn travel_minutes(&self, from: usize, to: usize) -> Option<u32> {
        self.travel.get(from)?.get(to).copied().flatten()
    }

    /// Every directed edge, in catalog order.
    pub fn edges(&self) -> impl Iterator<Item = (&Location, &Location, u32)> + '_ {
        self.travel.iter().enumerate().flat_map(move |(i, row)| {
            row.iter().enumerate().filter_map(move |(j, minutes)| {
                minutes.map(|m| (&self.locations[i], &self.locations[j], m))
            })
        })
    }

    /// The seven Tokyo sights with their dwell times, opening hours and
    /// travel matrix.
    pub fn tokyo() -> Result<Self, ConfigError> {
        let tokyo_tower = WeeklyHours::new()
            .with(Weekday::Monday, &[(9, 17)])?
            .with(Weekday::Tuesday, &[(10, 20)])?
            .with(Weekday::Wednesday, &[(8, 12), (13, 18)])?
            .with(Weekday::Thursday, &[])?
            .with(Weekday::Friday, &[(9, 17)])?
            .with(Weekday::Saturday, &[(10, 16)])?
            .with(Weekday::Sunday, &[(10, 16)])?;

        let locations = vec![
            Location::new("tokyo_tower", 121, tokyo_tower),
            Location::new("senso_ji", 121, WeeklyHours::every_day(&[(8, 18)])?),
            Location::new("akihabara", 121, WeeklyHours::every_day(&[(10, 22)])?),
            Location::new("meiji_shrine", 121, WeeklyHours::every_day(&[(8, 16)])?),
            Location::new("tsukiji_market", 121, WeeklyHours::every_day(&[(6, 14)])?),
            Location::new("odaiba", 121, WeeklyHours::every_day(&[(10, 21)])?),
            Location::new("shinjuku_garden", 121, WeeklyHours::every_day(&[(9, 17)])?),
        ];

        let matrix = vec![
            vec![0, 62, 123, 185, 240, 300, 123],
            vec![62, 0, 62, 123, 185, 240, 185],
            vec![123, 62, 0, 123, 185, 240, 185],
            vec![185, 123, 123, 0, 123, 185, 62],
            vec![240, 185, 185, 123, 0, 185, 123],
            vec![300, 240, 240, 185, 185, 0, 123],
            vec![123, 185, 185, 62, 123, 123, 0],
        ];

        Self::from_matrix(locations, &matrix)
    }
}

/// Lowercases `id` and checks that it is usable as a PDDL object name: an
/// ASCII letter followed by letters, digits, `_` or `-`. Names of the form
/// `day<n>` and `ts_<n>` belong to the day and slot objects.
pub fn normalize_id(id: &LocationId) -> Result<LocationId, ConfigError> {
    let name = id.as_str().trim().to_ascii_lowercase();
    let mut chars = name.chars();
    let well_formed = chars.next().is_some_and(|c| c.is_ascii_lowercase())
        && chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_' || c == '-');
    if !well_formed {
        return Err(ConfigError::InvalidCatalog(format!(
            "location id {:?} must start with a letter and contain only \
             letters, digits, '_' or '-'",
            id.as_str()
        )));
    }

    let numbered = |prefix: &str| {
        name.strip_prefix(prefix)
            .is_some_and(|n| !n.is_empty() && n.bytes().all(|b| b.is_ascii_digit()))
    };
    if numbered("day") || numbered("ts_") {
        return Err(ConfigError::InvalidCatalog(format!(
            "location id {:?} clashes with a day or slot name",
            id.as_str()
        )));
    }
    Ok(LocationId(name))
}

#[derive(Debug, Deserialize)]
struct CatalogFile {
    locations: Vec<LocationEntry>,
    #[serde(default)]
    travel: Vec<TravelEdge>,
}

#[derive(Debug, Deserialize)]
struct LocationEntry {
    id: LocationId,
    dwell_minutes: u32,
    #[serde(default)]
    hours: BTreeMap<Weekday, Vec<(u8, u8)>>,
}
