//! PDDL serialization of a [`ProblemSpec`].
//!
//! The domain text is static apart from its name; the problem text lists every
//! object, initial fact, cost entry and openness fact of the encoded problem so it
//! can be rebuilt from the text.

use std::fmt;

use crate::encoder::ProblemSpec;
use crate::time_grid::Slot;

pub const DOMAIN_NAME: &str = "tokyo_trip";
pub const PROBLEM_NAME: &str = "tokyo_trip_plan";

const DOMAIN_BODY: &str = r#"  (:requirements :strips :typing :action-costs)
  (:types
    day location time_slot
  )
  (:predicates
    (at ?loc - location)
    (available ?loc - location)
    (visited ?loc - location)
    (day_now ?d - day)
    (next_day ?d1 ?d2 - day)
    (time_slot_now ?ts - time_slot)
    (next_slot ?ts1 ?ts2 - time_slot)
    (open ?loc - location ?d - day ?ts - time_slot)
  )
  (:functions
    (total-cost) - number
    (travel_time ?from - location ?to - location) - number
    (play_time ?loc - location) - number
  )
  (:action move
    :parameters (?from - location ?to - location ?d - day ?ts - time_slot)
    :precondition (and
      (at ?from)
      (available ?to)
      (day_now ?d)
      (time_slot_now ?ts)
      (open ?to ?d ?ts)
    )
    :effect (and
      (not (at ?from))
      (at ?to)
      (increase (total-cost) (travel_time ?from ?to))
    )
  )
  (:action visit
    :parameters (?loc - location ?d - day ?ts - time_slot)
    :precondition (and
      (at ?loc)
      (available ?loc)
      (day_now ?d)
      (time_slot_now ?ts)
      (open ?loc ?d ?ts)
    )
    :effect (and
      (visited ?loc)
      (increase (total-cost) (play_time ?loc))
    )
  )
  (:action advance_slot
    :parameters (?ts1 - time_slot ?ts2 - time_slot ?d - day)
    :precondition (and
      (time_slot_now ?ts1)
      (day_now ?d)
      (next_slot ?ts1 ?ts2)
    )
    :effect (and
      (not (time_slot_now ?ts1))
      (time_slot_now ?ts2)
      (increase (total-cost) 0)
    )
  )
)
"#;

/// Domain description: the `move`, `visit` and `advance_slot` actions.
pub fn domain_pddl() -> String {
    format!("(define (domain {DOMAIN_NAME})\n{DOMAIN_BODY}")
}

/// Problem instance for `spec`.
pub fn problem_pddl(spec: &ProblemSpec<'_>) -> String {
    ProblemText(spec).to_string()
}

struct ProblemText<'s, 'c>(&'s ProblemSpec<'c>);

impl fmt::Display for ProblemText<'_, '_> {
    fn fmt(&self, out: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_problem(out, self.0)
    }
}

fn write_problem(out: &mut fmt::Formatter<'_>, spec: &ProblemSpec<'_>) -> fmt::Result {
    let catalog = spec.catalog();
    let names = |items: Vec<String>| items.join(" ");
    let locations = names(catalog.locations().iter().map(|l| l.id.to_string()).collect());
    let days = names(spec.trip_days().map(|d| d.to_string()).collect());
    let slots = names(Slot::all().map(|s| s.to_string()).collect());

    writeln!(out, "(define (problem {PROBLEM_NAME})")?;
    writeln!(out, "  (:domain {DOMAIN_NAME})")?;
    writeln!(out)?;
    writeln!(out, "  (:objects")?;
    writeln!(out, "    {locations} - location")?;
    writeln!(out, "    {days} - day")?;
    writeln!(out, "    {slots} - time_slot")?;
    writeln!(out, "  )")?;
    writeln!(out)?;

    writeln!(out, "  (:init")?;
    writeln!(out, "    (at {})", spec.start_location().id)?;
    for location in catalog.locations() {
        writeln!(out, "    (available {})", location.id)?;
    }
    writeln!(out, "    (day_now day1)")?;
    writeln!(out, "    (time_slot_now {})", spec.start_slot())?;
    for day in spec.trip_days().skip(1) {
        writeln!(out, "    (next_day day{} {day})", day.get() - 1)?;
    }
    for slot in Slot::all() {
        if let Some(next) = slot.next() {
            writeln!(out, "    (next_slot {slot} {next})")?;
        }
    }
    writeln!(out, "    (= (total-cost) 0)")?;
    writeln!(out)?;
    for location in catalog.locations() {
        writeln!(out, "    (= (play_time {}) {})", location.id, location.dwell_minutes)?;
    }
    for (from, to, minutes) in catalog.edges() {
        writeln!(out, "    (= (travel_time {} {}) {minutes})", from.id, to.id)?;
    }
    writeln!(out)?;
    for (location, day, slot) in spec.open_facts() {
        writeln!(out, "    (open {} {day} {slot})", location.id)?;
    }
    writeln!(out, "  )")?;
    writeln!(out)?;

    writeln!(out, "  (:goal (and")?;
    for location in spec.goal() {
        writeln!(out, "    (visited {})", location.id)?;
    }
    writeln!(out, "  ))")?;
    writeln!(out, "  (:metric minimize (total-cost))")?;
    writeln!(out, ")")
}
