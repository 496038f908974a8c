//! Error surface of the care use-cases.

use crate::config::ConfigError;
use crate::db::DbError;
use crate::model::plant::PlantId;
use crate::model::reminder::ReminderId;
use crate::repo::RepoError;
use crate::sampler::SampleError;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Every variant is recoverable at the call site; none is retried here.
#[derive(Debug)]
pub enum CareError {
    /// Malformed reading; nothing was persisted.
    InvalidMeasurementInput(String),
    UnknownPlant(PlantId),
    /// Reminder is absent, already completed or retired.
    UnknownReminder(ReminderId),
    /// No samples inside the evaluation window. A "no verdict yet" outcome,
    /// not a failure.
    InsufficientData {
        plant_id: PlantId,
        window_start: i64,
        window_end: i64,
    },
    /// Rejected plant, profile or config input.
    InvalidInput(String),
    StorageUnavailable(RepoError),
}

impl CareError {
    pub fn is_insufficient_data(&self) -> bool {
        matches!(self, Self::InsufficientData { .. })
    }

    /// Stable machine-readable code for UI and FFI callers.
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidMeasurementInput(_) => "invalid_measurement_input",
            Self::UnknownPlant(_) => "unknown_plant",
            Self::UnknownReminder(_) => "unknown_reminder",
            Self::InsufficientData { .. } => "insufficient_data",
            Self::InvalidInput(_) => "invalid_input",
            Self::StorageUnavailable(_) => "storage_unavailable",
        }
    }
}

impl Display for CareError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidMeasurementInput(reason) => {
                write!(f, "invalid measurement input: {reason}")
            }
            Self::UnknownPlant(id) => write!(f, "unknown plant: {id}"),
            Self::UnknownReminder(id) => write!(f, "unknown or closed reminder: {id}"),
            Self::InsufficientData {
                plant_id,
                window_start,
                window_end,
            } => write!(
                f,
                "no light samples for plant {plant_id} between {window_start} and {window_end}"
            ),
            Self::InvalidInput(message) => write!(f, "invalid input: {message}"),
            Self::StorageUnavailable(err) => write!(f, "storage unavailable: {err}"),
        }
    }
}

impl Error for CareError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::StorageUnavailable(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for CareError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::PlantNotFound(id) => Self::UnknownPlant(id),
            RepoError::ReminderNotFound(id) => Self::UnknownReminder(id),
            RepoError::Validation(err) => Self::InvalidInput(err.to_string()),
            other => Self::StorageUnavailable(other),
        }
    }
}

impl From<DbError> for CareError {
    fn from(value: DbError) -> Self {
        Self::StorageUnavailable(RepoError::Db(value))
    }
}

impl From<SampleError> for CareError {
    fn from(value: SampleError) -> Self {
        match value {
            SampleError::InvalidMeasurementInput(reason) => Self::InvalidMeasurementInput(reason),
        }
    }
}

impl From<ConfigError> for CareError {
    fn from(value: ConfigError) -> Self {
        Self::InvalidInput(value.to_string())
    }
}
