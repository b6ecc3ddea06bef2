//! Test fixtures for trip-planner.
//!
//! Provides small hand-checked catalogs and helpers for writing plans.

pub mod catalogs;

pub use catalogs::*;
