//! trip-planner
//!
//! Encodes a multi-day sightseeing trip as a planning problem for an external
//! planner and turns the returned plan back into a timestamped itinerary.

pub mod traits;
pub mod error;
pub mod time_grid;
pub mod catalog;
pub mod encoder;
pub mod pddl;
pub mod plan;
pub mod schedule;
pub mod config;
pub mod downward;
pub mod planning_service;
