//! Care use-case services.
//!
//! # Responsibility
//! - Orchestrate store calls into verdicts, reminders and facade APIs.
//! - Keep UI/FFI layers decoupled from storage details.

pub mod error;
pub mod locks;
pub mod plant_care;
pub mod recommendation;
pub mod scheduler;

pub use error::CareError;
pub use locks::{PlantGuard, PlantLocks};
pub use plant_care::PlantCare;
pub use recommendation::{classify, stage_status, RecommendationEngine, SharedRegistry};
pub use scheduler::{ReminderScheduler, TickReport};
