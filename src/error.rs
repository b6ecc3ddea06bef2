//! Error types for the trip planner.
//!
//! Each concern gets its own enum; `TripError` aggregates them for callers
//! that drive the whole pipeline.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Invalid trip configuration or catalog data. Fatal before any planning work.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("unrecognized weekday: {0:?}")]
    UnknownWeekday(String),

    #[error("trip length must be at least one day, got {0}")]
    NonPositiveTripLength(i64),

    #[error("start slot must be within 0..=23, got {0}")]
    SlotOutOfRange(i64),

    #[error("start location {0:?} is not in the catalog")]
    UnknownStartLocation(String),

    #[error("invalid catalog: {0}")]
    InvalidCatalog(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
}

/// Out-of-range trip day or slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TimeGridError {
    #[error("trip days start at 1, got {0}")]
    InvalidDay(i64),

    #[error("slot hour must be within 0..=23, got {0}")]
    InvalidSlot(i64),
}

/// A plan refers to something the encoded problem never declared.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EncodingInconsistency {
    #[error("unknown location {0:?}")]
    UnknownLocation(String),

    #[error("day {day} is outside the trip (1..={days})")]
    DayOutOfRange { day: u32, days: u32 },

    #[error("no travel time from {from:?} to {to:?}")]
    MissingTravel { from: String, to: String },
}

/// The external planner did not produce a usable plan.
#[derive(Debug, Error)]
pub enum PlannerError {
    /// The planner ran but the instance has no plan within its limits.
    #[error("no plan found: {0}")]
    NoPlanFound(String),

    /// The planner could not be run at all (process or transport failure).
    #[error("planner invocation failed: {0}")]
    InvocationFailed(String),

    #[error("planner timed out after {0:?}")]
    Timeout(Duration),

    #[error("no plan artifact found in {0}")]
    MissingPlanArtifact(PathBuf),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Why a single plan line could not be decoded.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeErrorKind {
    #[error("expected a parenthesized action")]
    MissingParens,

    #[error("empty action")]
    Empty,

    #[error("unknown action {0:?}")]
    UnknownAction(String),

    #[error("{action} takes {expected} parameters, found {found}")]
    Arity {
        action: &'static str,
        expected: usize,
        found: usize,
    },

    #[error("bad day token {0:?}")]
    BadDay(String),

    #[error("bad slot token {0:?}")]
    BadSlot(String),
}

/// A plan line that did not parse into an action. Recovered locally.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("line {line_number}: {kind} in {line:?}")]
pub struct ActionDecodeError {
    pub line_number: usize,
    pub line: String,
    pub kind: DecodeErrorKind,
}

/// Top-level error for the end-to-end pipeline.
#[derive(Debug, Error)]
pub enum TripError {
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(#[from] ConfigError),

    #[error("encoding inconsistency: {0}")]
    EncodingInconsistency(#[from] EncodingInconsistency),

    #[error(transparent)]
    Planner(#[from] PlannerError),
}
