//! Care engine configuration.
//!
//! # Responsibility
//! - Hold the numeric product defaults (windows, cadences, light math).
//! - Load overrides from JSON and reject values the engine cannot use.
//!
//! # Invariants
//! - A `CareConfig` returned by [`CareConfig::from_json_str`] is validated.
//! - Species cadences override the configured interval defaults.

use crate::model::reminder::TaskKind;
use crate::model::species::SpeciesProfile;
use crate::time::days_to_ms;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Default lux to PPFD factor for daylight, µmol·m⁻²·s⁻¹ per lux.
pub const DEFAULT_LUX_TO_PPFD_FACTOR: f64 = 0.0185;
pub const DEFAULT_PHOTOPERIOD_HOURS: f64 = 12.0;
pub const DEFAULT_EVALUATION_WINDOW_DAYS: u32 = 7;
pub const DEFAULT_WATER_INTERVAL_DAYS: u32 = 7;
pub const DEFAULT_FERTILIZE_INTERVAL_DAYS: u32 = 30;

const MAX_PHOTOPERIOD_HOURS: f64 = 24.0;

#[derive(Debug)]
pub enum ConfigError {
    Parse(serde_json::Error),
    Invalid(String),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Parse(err) => write!(f, "failed to parse care config: {err}"),
            Self::Invalid(message) => write!(f, "invalid care config: {message}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Parse(err) => Some(err),
            Self::Invalid(_) => None,
        }
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(value: serde_json::Error) -> Self {
        Self::Parse(value)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CareConfig {
    /// Trailing window aggregated for a verdict.
    pub evaluation_window_days: u32,
    pub water_interval_days: u32,
    pub fertilize_interval_days: u32,
    pub lux_to_ppfd_factor: f64,
    /// Light hours per day used for DLI estimates.
    pub photoperiod_hours: f64,
}

impl Default for CareConfig {
    fn default() -> Self {
        Self {
            evaluation_window_days: DEFAULT_EVALUATION_WINDOW_DAYS,
            water_interval_days: DEFAULT_WATER_INTERVAL_DAYS,
            fertilize_interval_days: DEFAULT_FERTILIZE_INTERVAL_DAYS,
            lux_to_ppfd_factor: DEFAULT_LUX_TO_PPFD_FACTOR,
            photoperiod_hours: DEFAULT_PHOTOPERIOD_HOURS,
        }
    }
}

impl CareConfig {
    /// Parses a JSON document; missing fields take their defaults.
    pub fn from_json_str(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.evaluation_window_days == 0 {
            return Err(ConfigError::Invalid(
                "evaluation_window_days must be > 0".to_string(),
            ));
        }
        if self.water_interval_days == 0 || self.fertilize_interval_days == 0 {
            return Err(ConfigError::Invalid(
                "care intervals must be > 0 days".to_string(),
            ));
        }
        if !self.lux_to_ppfd_factor.is_finite() || self.lux_to_ppfd_factor <= 0.0 {
            return Err(ConfigError::Invalid(format!(
                "lux_to_ppfd_factor must be > 0, got {}",
                self.lux_to_ppfd_factor
            )));
        }
        if !(self.photoperiod_hours > 0.0 && self.photoperiod_hours <= MAX_PHOTOPERIOD_HOURS) {
            return Err(ConfigError::Invalid(format!(
                "photoperiod_hours must be in (0, 24], got {}",
                self.photoperiod_hours
            )));
        }
        Ok(())
    }

    pub fn evaluation_window_ms(&self) -> i64 {
        days_to_ms(self.evaluation_window_days)
    }

    /// Interval for a fixed-cadence task, preferring the species cadence.
    ///
    /// Returns `None` for kinds that are not interval driven.
    pub fn interval_ms(&self, kind: TaskKind, profile: &SpeciesProfile) -> Option<i64> {
        let days = match kind {
            TaskKind::Water => profile
                .water_interval_days
                .unwrap_or(self.water_interval_days),
            TaskKind::Fertilize => profile
                .fertilize_interval_days
                .unwrap_or(self.fertilize_interval_days),
            TaskKind::Reposition => return None,
        };
        Some(days_to_ms(days))
    }
}
