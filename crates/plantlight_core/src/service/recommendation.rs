//! Recommendation engine: recent light versus species band.
//!
//! # Responsibility
//! - Aggregate a plant's samples over the evaluation window.
//! - Classify the mean against the resolved species band.
//! - Attach PPFD/DLI estimates, checked against the growth-stage target
//!   when the species defines one.
//!
//! # Invariants
//! - Band boundaries are inclusive: `min <= mean <= max` is adequate.
//! - Only the lux band decides `status`; stage range results are advisory.
//! - No samples in the window is `InsufficientData`, never a default verdict.
//! - Evaluation only reads store state; calling it twice with the same
//!   `now` and unchanged data yields equal verdicts.

use super::error::CareError;
use crate::config::CareConfig;
use crate::model::plant::{Plant, PlantId};
use crate::model::species::{LightRange, ProfileResolution, SpeciesProfile, StageTarget};
use crate::model::verdict::{LightStatus, RangeStatus, Verdict};
use crate::repo::{CareStore, RepoError};
use crate::sampler::{dli_from_ppfd, ppfd_from_lux};
use crate::species::SpeciesRegistry;
use log::debug;
use std::sync::{Arc, RwLock};

/// Registry handle shared by the engine, scheduler and facade.
pub type SharedRegistry = Arc<RwLock<SpeciesRegistry>>;

pub struct RecommendationEngine<S> {
    store: Arc<S>,
    registry: SharedRegistry,
    config: CareConfig,
}

impl<S> Clone for RecommendationEngine<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            registry: Arc::clone(&self.registry),
            config: self.config.clone(),
        }
    }
}

impl<S: CareStore> RecommendationEngine<S> {
    pub fn new(store: Arc<S>, registry: SharedRegistry, config: CareConfig) -> Self {
        Self {
            store,
            registry,
            config,
        }
    }

    /// Produces a verdict for `plant_id` from samples in `[now - window, now]`.
    pub fn evaluate(&self, plant_id: PlantId, now: i64) -> Result<Verdict, CareError> {
        let plant = self
            .store
            .get_plant(plant_id)?
            .ok_or(CareError::UnknownPlant(plant_id))?;

        let window_ms = self.config.evaluation_window_ms();
        let aggregate = self
            .store
            .latest_aggregate(plant_id, window_ms, now)?
            .ok_or(CareError::InsufficientData {
                plant_id,
                window_start: now.saturating_sub(window_ms),
                window_end: now,
            })?;

        let resolution = self.resolve_profile(&plant)?;
        let profile = resolution.profile();
        let status = classify(aggregate.mean_lux, profile);
        let factor = plant
            .lux_to_ppfd_factor
            .unwrap_or(self.config.lux_to_ppfd_factor);
        let ppfd = ppfd_from_lux(aggregate.mean_lux, factor);
        let dli = dli_from_ppfd(ppfd, self.config.photoperiod_hours);
        let (ppfd_status, dli_status) = profile
            .stage_target(plant.growth_stage)
            .map_or((None, None), |target| {
                stage_status(target, ppfd, dli, self.config.photoperiod_hours)
            });

        debug!(
            "event=plant_evaluate module=service status=ok plant_id={} verdict={} mean_lux={:.1} samples={} fallback={} stage={} ppfd_status={} dli_status={}",
            plant_id,
            status.as_str(),
            aggregate.mean_lux,
            aggregate.sample_count,
            resolution.is_fallback(),
            plant.growth_stage.as_str(),
            ppfd_status.map_or("none", RangeStatus::as_str),
            dli_status.map_or("none", RangeStatus::as_str)
        );

        Ok(Verdict {
            plant_id,
            evaluated_at: now,
            status,
            mean_lux: aggregate.mean_lux,
            sample_count: aggregate.sample_count,
            ppfd,
            dli,
            within_preferred: profile.prefers(aggregate.mean_lux),
            growth_stage: plant.growth_stage,
            ppfd_status,
            dli_status,
            profile: resolution,
        })
    }

    /// Resolves the plant's species key against the shared registry.
    pub fn resolve_profile(&self, plant: &Plant) -> Result<ProfileResolution, CareError> {
        let registry = self
            .registry
            .read()
            .map_err(|_| CareError::StorageUnavailable(RepoError::Poisoned("species registry")))?;
        Ok(registry.lookup(plant.species_key.as_deref()))
    }

    pub fn config(&self) -> &CareConfig {
        &self.config
    }
}

/// Classifies a mean illuminance against an inclusive band.
pub fn classify(mean_lux: f64, profile: &SpeciesProfile) -> LightStatus {
    if mean_lux < profile.min_lux {
        LightStatus::TooDark
    } else if mean_lux > profile.max_lux {
        LightStatus::TooBright
    } else {
        LightStatus::Adequate
    }
}

/// Checks PPFD and DLI against one stage target.
///
/// A missing DLI bound is derived from the matching PPFD bound over
/// `photoperiod_hours`. A range with neither bound yields `None`.
pub fn stage_status(
    target: &StageTarget,
    ppfd: f64,
    dli: f64,
    photoperiod_hours: f64,
) -> (Option<RangeStatus>, Option<RangeStatus>) {
    let to_dli = |bound: Option<f64>| bound.map(|value| dli_from_ppfd(value, photoperiod_hours));
    let dli_range = LightRange::new(
        target.dli.min.or_else(|| to_dli(target.ppfd.min)),
        target.dli.max.or_else(|| to_dli(target.ppfd.max)),
    );
    (
        range_status(&target.ppfd, ppfd),
        range_status(&dli_range, dli),
    )
}

fn range_status(range: &LightRange, value: f64) -> Option<RangeStatus> {
    (!range.is_unbounded()).then(|| range.check(value))
}
