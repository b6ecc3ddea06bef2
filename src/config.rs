//! Trip configuration loaded from TOML.
//!
//! ```toml
//! start_weekday = "wednesday"
//! days = 5
//! start_location = "tokyo_tower"
//! start_slot = 8
//! catalog = "sights.toml"   # optional, built-in Tokyo sights otherwise
//!
//! [planner]
//! backend = "fast_downward"
//! alias = "seq-sat-lama-2011"
//! work_dir = "plans"
//! [planner.launcher]
//! kind = "docker"
//! image = "aibasel/downward"
//! ```

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::catalog::Catalog;
use crate::downward::{FastDownward, FastDownwardConfig};
use crate::encoder::PlanRequest;
use crate::error::{ConfigError, PlannerError};
use crate::planning_service::{PlanningServiceClient, PlanningServiceConfig};
use crate::traits::PlannerBackend;

/// Which external planner to call.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "backend", rename_all = "snake_case")]
pub enum PlannerConfig {
    FastDownward(FastDownwardConfig),
    Http(PlanningServiceConfig),
}

impl Default for PlannerConfig {
    fn default() -> Self {
        PlannerConfig::FastDownward(FastDownwardConfig::default())
    }
}

impl PlannerConfig {
    pub fn build(&self) -> Result<Box<dyn PlannerBackend>, PlannerError> {
        let planner: Box<dyn PlannerBackend> = match self {
            PlannerConfig::FastDownward(config) => Box::new(FastDownward::new(config.clone())?),
            PlannerConfig::Http(config) => Box::new(PlanningServiceClient::new(config.clone())?),
        };
        Ok(planner)
    }
}

/// Raw trip settings; validated by [`TripConfig::request`].
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct TripConfig {
    pub start_weekday: String,
    pub days: i64,
    pub start_location: String,
    pub start_slot: i64,
    /// Catalog file; the built-in Tokyo catalog when absent.
    pub catalog: Option<PathBuf>,
    pub planner: PlannerConfig,
}

impl Default for TripConfig {
    fn default() -> Self {
        Self {
            start_weekday: "wednesday".to_string(),
            days: 5,
            start_location: "tokyo_tower".to_string(),
            start_slot: 8,
            catalog: None,
            planner: PlannerConfig::default(),
        }
    }
}

impl TripConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(s)?)
    }

    pub fn load_catalog(&self) -> Result<Catalog, ConfigError> {
        match &self.catalog {
            Some(path) => Catalog::load(path),
            None => Catalog::tokyo(),
        }
    }

    /// Validates the trip settings against `catalog`.
    pub fn request(&self, catalog: &Catalog) -> Result<PlanRequest, ConfigError> {
        let request = PlanRequest::new(
            &self.start_weekday,
            self.days,
            &self.start_location,
            self.start_slot,
        )?;
        if catalog.index_of(request.start_location.as_str()).is_none() {
            return Err(ConfigError::UnknownStartLocation(self.start_location.clone()));
        }
        Ok(request)
    }
}
