//! Plans returned by the external planner.
//!
//! A plan is one action per line, e.g. `(move tokyo_tower senso_ji day1 ts_9)`.
//! Lines that do not decode are kept in place as [`PlanEntry::Malformed`] so
//! the interpreter can report them without losing the rest of the plan.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::SystemTime;

use tracing::{debug, warn};

use crate::catalog::LocationId;
use crate::error::{ActionDecodeError, DecodeErrorKind, PlannerError};
use crate::time_grid::{Slot, TripDay};

/// Default file name prefix of Fast Downward plan artifacts
/// (`sas_plan`, `sas_plan.1`, `sas_plan.2`, ...).
pub const PLAN_FILE_PREFIX: &str = "sas_plan";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Move {
        from: LocationId,
        to: LocationId,
        day: TripDay,
        slot: Slot,
    },
    Visit {
        location: LocationId,
        day: TripDay,
        slot: Slot,
    },
    AdvanceSlot {
        from: Slot,
        to: Slot,
        day: TripDay,
    },
}

impl Action {
    pub fn name(&self) -> &'static str {
        match self {
            Action::Move { .. } => "move",
            Action::Visit { .. } => "visit",
            Action::AdvanceSlot { .. } => "advance_slot",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Move { from, to, day, slot } => write!(f, "(move {from} {to} {day} {slot})"),
            Action::Visit { location, day, slot } => write!(f, "(visit {location} {day} {slot})"),
            Action::AdvanceSlot { from, to, day } => write!(f, "(advance_slot {from} {to} {day})"),
        }
    }
}

impl FromStr for Action {
    type Err = DecodeErrorKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase();
        let body = normalized
            .strip_prefix('(')
            .and_then(|rest| rest.strip_suffix(')'))
            .ok_or(DecodeErrorKind::MissingParens)?;
        let tokens: Vec<&str> = body.split_whitespace().collect();
        let (&name, params) = tokens.split_first().ok_or(DecodeErrorKind::Empty)?;

        match name {
            "move" => {
                let [from, to, day, slot] = arity::<4>("move", params)?;
                Ok(Action::Move {
                    from: LocationId::new(from),
                    to: LocationId::new(to),
                    day: parse_day(day)?,
                    slot: parse_slot(slot)?,
                })
            }
            "visit" => {
                let [location, day, slot] = arity::<3>("visit", params)?;
                Ok(Action::Visit {
                    location: LocationId::new(location),
                    day: parse_day(day)?,
                    slot: parse_slot(slot)?,
                })
            }
            "advance_slot" => {
                let [from, to, day] = arity::<3>("advance_slot", params)?;
                Ok(Action::AdvanceSlot {
                    from: parse_slot(from)?,
                    to: parse_slot(to)?,
                    day: parse_day(day)?,
                })
            }
            other => Err(DecodeErrorKind::UnknownAction(other.to_string())),
        }
    }
}

fn arity<'a, const N: usize>(
    action: &'static str,
    params: &[&'a str],
) -> Result<[&'a str; N], DecodeErrorKind> {
    <[&str; N]>::try_from(params).map_err(|_| DecodeErrorKind::Arity {
        action,
        expected: N,
        found: params.len(),
    })
}

fn parse_day(token: &str) -> Result<TripDay, DecodeErrorKind> {
    token
        .strip_prefix("day")
        .and_then(|n| n.parse::<i64>().ok())
        .and_then(|n| TripDay::new(n).ok())
        .ok_or_else(|| DecodeErrorKind::BadDay(token.to_string()))
}

fn parse_slot(token: &str) -> Result<Slot, DecodeErrorKind> {
    token
        .strip_prefix("ts_")
        .and_then(|n| n.parse::<i64>().ok())
        .and_then(|n| Slot::new(n).ok())
        .ok_or_else(|| DecodeErrorKind::BadSlot(token.to_string()))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlanEntry {
    Action(Action),
    Malformed(ActionDecodeError),
}

/// Ordered plan; entry order is execution order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Plan {
    entries: Vec<PlanEntry>,
}

impl Plan {
    pub fn new(entries: Vec<PlanEntry>) -> Self {
        Self { entries }
    }

    pub fn from_actions(actions: impl IntoIterator<Item = Action>) -> Self {
        Self::new(actions.into_iter().map(PlanEntry::Action).collect())
    }

    /// Parses planner output. Blank lines and `;` comments are skipped.
    pub fn parse(text: &str) -> Self {
        let mut entries = Vec::new();
        for (i, raw) in text.lines().enumerate() {
            let line = raw.trim();
            if line.is_empty() || line.starts_with(';') {
                continue;
            }
            match line.parse::<Action>() {
                Ok(action) => entries.push(PlanEntry::Action(action)),
                Err(kind) => {
                    let err = ActionDecodeError {
                        line_number: i + 1,
                        line: line.to_string(),
                        kind,
                    };
                    warn!(%err, "undecodable plan line");
                    entries.push(PlanEntry::Malformed(err));
                }
            }
        }
        Self { entries }
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, PlannerError> {
        Ok(Self::parse(&fs::read_to_string(path)?))
    }

    pub fn entries(&self) -> &[PlanEntry] {
        &self.entries
    }

    pub fn actions(&self) -> impl Iterator<Item = &Action> {
        self.entries.iter().filter_map(|entry| match entry {
            PlanEntry::Action(action) => Some(action),
            PlanEntry::Malformed(_) => None,
        })
    }

    pub fn decode_errors(&self) -> impl Iterator<Item = &ActionDecodeError> {
        self.entries.iter().filter_map(|entry| match entry {
            PlanEntry::Malformed(err) => Some(err),
            PlanEntry::Action(_) => None,
        })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Finds the most recently modified file in `dir` whose name starts with
/// `prefix`. Among equal modification times the last one discovered wins.
pub fn latest_plan_artifact(dir: &Path, prefix: &str) -> Result<PathBuf, PlannerError> {
    let mut best: Option<(SystemTime, PathBuf)> = None;
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let matches = entry
            .file_name()
            .to_str()
            .is_some_and(|name| name.starts_with(prefix));
        if !matches || !entry.file_type()?.is_file() {
            continue;
        }
        let modified = entry.metadata()?.modified()?;
        if best.as_ref().is_none_or(|(time, _)| modified >= *time) {
            best = Some((modified, entry.path()));
        }
    }

    match best {
        Some((_, path)) => {
            debug!(path = %path.display(), "selected plan artifact");
            Ok(path)
        }
        None => Err(PlannerError::MissingPlanArtifact(dir.to_path_buf())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_move() {
        let action: Action = "(move tokyo_tower senso_ji day1 ts_9)".parse().unwrap();
        assert_eq!(
            action,
            Action::Move {
                from: LocationId::new("tokyo_tower"),
                to: LocationId::new("senso_ji"),
                day: TripDay::new(1).unwrap(),
                slot: Slot::new(9).unwrap(),
            }
        );
    }

    #[test]
    fn test_parse_tolerates_case_and_whitespace() {
        let action: Action = "  (ADVANCE_SLOT  TS_10 ts_11   Day2 )\t".parse().unwrap();
        assert_eq!(
            action,
            Action::AdvanceSlot {
                from: Slot::new(10).unwrap(),
                to: Slot::new(11).unwrap(),
                day: TripDay::new(2).unwrap(),
            }
        );
    }

    #[test]
    fn test_display_matches_plan_syntax() {
        let line = "(visit senso_ji day3 ts_14)";
        let action: Action = line.parse().unwrap();
        assert_eq!(action.to_string(), line);
    }

    #[test]
    fn test_decode_errors() {
        assert_eq!(
            "(frobnicate x y)".parse::<Action>(),
            Err(DecodeErrorKind::UnknownAction("frobnicate".to_string()))
        );
        assert_eq!("visit a day1 ts_1".parse::<Action>(), Err(DecodeErrorKind::MissingParens));
        assert_eq!("( )".parse::<Action>(), Err(DecodeErrorKind::Empty));
        assert_eq!(
            "(visit a day1)".parse::<Action>(),
            Err(DecodeErrorKind::Arity {
                action: "visit",
                expected: 3,
                found: 2
            })
        );
        assert_eq!(
            "(visit a day0 ts_1)".parse::<Action>(),
            Err(DecodeErrorKind::BadDay("day0".to_string()))
        );
        assert_eq!(
            "(visit a day1 ts_24)".parse::<Action>(),
            Err(DecodeErrorKind::BadSlot("ts_24".to_string()))
        );
    }

    #[test]
    fn test_plan_skips_comments_and_keeps_bad_lines() {
        let plan = Plan::parse(
            "(visit tokyo_tower day1 ts_8)\n\n(frobnicate x y)\n; cost = 121 (general cost)\n",
        );
        assert_eq!(plan.len(), 2);
        assert_eq!(plan.actions().count(), 1);
        let errors: Vec<_> = plan.decode_errors().collect();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].line_number, 3);
        assert_eq!(errors[0].line, "(frobnicate x y)");
    }
}
