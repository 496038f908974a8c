//! Core domain logic for plantlight.
//! This crate is the single source of truth for light verdicts and care
//! reminder invariants.

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod sampler;
pub mod service;
pub mod species;
pub mod time;

pub use config::{CareConfig, ConfigError};
pub use db::{open_db, open_db_in_memory, DbError, DbResult};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::plant::{Plant, PlantId};
pub use model::reminder::{Reminder, ReminderId, ReminderOrigin, TaskKind};
pub use model::sample::{LightAggregate, LightSample, MeasurementSource, RawReading};
pub use model::species::{GrowthStage, LightRange, ProfileResolution, SpeciesProfile, StageTarget};
pub use model::verdict::{LightStatus, RangeStatus, Verdict};
pub use model::ValidationError;
pub use repo::{CareStore, MemoryStore, RepoError, RepoResult, SqliteStore};
pub use sampler::{sample, SampleError};
pub use service::{
    CareError, PlantCare, PlantLocks, RecommendationEngine, ReminderScheduler, TickReport,
};
pub use species::SpeciesRegistry;
pub use time::{Clock, FixedClock, SystemClock};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
