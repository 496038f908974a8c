//! Domain model for plants, light samples, species bands and reminders.
//!
//! # Responsibility
//! - Define canonical data structures used by core business logic.
//! - Validate field-level invariants before anything reaches storage.
//!
//! # Invariants
//! - Every plant, sample and reminder is identified by a stable UUID.
//! - Samples are immutable once written; reminders are retired, not deleted.

use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod plant;
pub mod reminder;
pub mod sample;
pub mod species;
pub mod verdict;

use species::GrowthStage;

/// Field-level validation failure for domain records.
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    EmptyPlantName,
    InvalidCalibrationFactor(f64),
    InvalidLux(f64),
    EmptySpeciesKey,
    InvalidProfileBand {
        species_key: String,
        reason: &'static str,
    },
    InvalidInterval {
        species_key: String,
    },
    InvalidStageTarget {
        species_key: String,
        stage: GrowthStage,
        reason: &'static str,
    },
    /// The key is reserved for the generic fallback profile.
    ReservedSpeciesKey(String),
    InvalidGrowthStage(String),
    SampleCountOverflow(usize),
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyPlantName => write!(f, "plant name cannot be empty"),
            Self::InvalidCalibrationFactor(value) => {
                write!(f, "lux_to_ppfd_factor must be finite and > 0, got {value}")
            }
            Self::InvalidLux(value) => write!(f, "lux must be finite and >= 0, got {value}"),
            Self::EmptySpeciesKey => write!(f, "species key cannot be empty"),
            Self::InvalidProfileBand {
                species_key,
                reason,
            } => write!(f, "invalid light band for species `{species_key}`: {reason}"),
            Self::InvalidInterval { species_key } => {
                write!(f, "care interval for species `{species_key}` must be > 0 days")
            }
            Self::InvalidStageTarget {
                species_key,
                stage,
                reason,
            } => write!(
                f,
                "invalid {} target for species `{species_key}`: {reason}",
                stage.as_str()
            ),
            Self::InvalidGrowthStage(value) => write!(
                f,
                "unknown growth stage `{value}`, expected seedling, vegetative or flower"
            ),
            Self::ReservedSpeciesKey(key) => {
                write!(f, "species key `{key}` is reserved for generic guidance")
            }
            Self::SampleCountOverflow(len) => {
                write!(f, "{len} samples exceed the aggregate sample count range")
            }
        }
    }
}

impl Error for ValidationError {}
