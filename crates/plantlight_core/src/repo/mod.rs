//! Store contracts and persistence implementations.
//!
//! # Responsibility
//! - Define plant-scoped data access contracts used by the engine and
//!   scheduler.
//! - Isolate SQLite query details from service orchestration.
//! - Provide an in-memory store with the same contracts for tests and
//!   embedding.
//!
//! # Invariants
//! - Write paths validate records before persistence.
//! - Samples and reminders can only reference existing plants
//!   (`PlantNotFound` otherwise).
//! - Read paths reject invalid persisted state instead of masking it.

use crate::db::DbError;
use crate::model::plant::PlantId;
use crate::model::reminder::{ReminderId, TaskKind};
use crate::model::ValidationError;
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

pub mod memory;
pub mod plant_repo;
pub mod reminder_repo;
pub mod sample_repo;
pub mod species_repo;
pub mod sqlite_store;

pub use memory::MemoryStore;
pub use plant_repo::PlantRepository;
pub use reminder_repo::ReminderRepository;
pub use sample_repo::SampleRepository;
pub use species_repo::SpeciesRepository;
pub use sqlite_store::SqliteStore;

pub type RepoResult<T> = Result<T, RepoError>;

/// Store-level error for persistence and query operations.
#[derive(Debug)]
pub enum RepoError {
    Validation(ValidationError),
    Db(DbError),
    PlantNotFound(PlantId),
    ReminderNotFound(ReminderId),
    /// Another writer already holds the single open reminder of this kind.
    OpenReminderExists {
        plant_id: PlantId,
        kind: TaskKind,
    },
    InvalidData(String),
    /// A thread panicked while holding store state.
    Poisoned(&'static str),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::PlantNotFound(id) => write!(f, "plant not found: {id}"),
            Self::ReminderNotFound(id) => write!(f, "open reminder not found: {id}"),
            Self::OpenReminderExists { plant_id, kind } => write!(
                f,
                "plant {plant_id} already has an open {} reminder",
                kind.as_str()
            ),
            Self::InvalidData(message) => write!(f, "invalid persisted data: {message}"),
            Self::Poisoned(what) => write!(f, "{what} lock poisoned"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ValidationError> for RepoError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Everything the engine and scheduler need from storage.
pub trait CareStore:
    PlantRepository + SampleRepository + ReminderRepository + SpeciesRepository + Send + Sync
{
}

impl<T> CareStore for T where
    T: PlantRepository + SampleRepository + ReminderRepository + SpeciesRepository + Send + Sync
{
}

pub(crate) fn parse_uuid(value: &str, column: &str) -> RepoResult<Uuid> {
    Uuid::parse_str(value)
        .map_err(|_| RepoError::InvalidData(format!("invalid uuid value `{value}` in {column}")))
}
