//! Plant care facade.
//!
//! # Responsibility
//! - Expose the UI-facing use-cases over one store, registry and clock.
//! - Serialize per-plant mutations through [`PlantLocks`].
//!
//! # Invariants
//! - Measurements are validated by the sampler before anything is stored.
//! - Wall-clock time is read only from the injected [`Clock`].

use super::error::CareError;
use super::locks::PlantLocks;
use super::recommendation::{RecommendationEngine, SharedRegistry};
use super::scheduler::{ReminderScheduler, TickReport};
use crate::config::CareConfig;
use crate::model::plant::{Plant, PlantId};
use crate::model::reminder::{Reminder, ReminderId};
use crate::model::sample::{LightSample, RawReading};
use crate::model::species::{GrowthStage, ProfileResolution, SpeciesProfile};
use crate::model::verdict::Verdict;
use crate::model::ValidationError;
use crate::repo::{CareStore, RepoError};
use crate::sampler;
use crate::species::{normalize_species_key, SpeciesRegistry};
use crate::time::Clock;
use log::info;
use std::sync::{Arc, RwLock};

pub struct PlantCare<S> {
    store: Arc<S>,
    registry: SharedRegistry,
    engine: RecommendationEngine<S>,
    scheduler: ReminderScheduler<S>,
    locks: Arc<PlantLocks>,
    clock: Arc<dyn Clock>,
}

impl<S: CareStore> PlantCare<S> {
    /// Wires the services over `store`, loading imported species profiles.
    pub fn new(store: S, config: CareConfig, clock: Arc<dyn Clock>) -> Result<Self, CareError> {
        Self::with_locks(store, config, clock, Arc::new(PlantLocks::new()))
    }

    /// Like [`PlantCare::new`], but serializes plants through a lock table
    /// shared with other facades over the same database.
    pub fn with_locks(
        store: S,
        config: CareConfig,
        clock: Arc<dyn Clock>,
        locks: Arc<PlantLocks>,
    ) -> Result<Self, CareError> {
        config.validate()?;
        let store = Arc::new(store);
        let registry: SharedRegistry =
            Arc::new(RwLock::new(SpeciesRegistry::load(store.as_ref())?));
        let engine = RecommendationEngine::new(Arc::clone(&store), Arc::clone(&registry), config);
        let scheduler = ReminderScheduler::new(
            Arc::clone(&store),
            engine.clone(),
            Arc::clone(&locks),
            engine.config().clone(),
        );

        Ok(Self {
            store,
            registry,
            engine,
            scheduler,
            locks,
            clock,
        })
    }

    pub fn store(&self) -> &S {
        self.store.as_ref()
    }

    pub fn engine(&self) -> &RecommendationEngine<S> {
        &self.engine
    }

    pub fn scheduler(&self) -> &ReminderScheduler<S> {
        &self.scheduler
    }

    pub fn locks(&self) -> &PlantLocks {
        self.locks.as_ref()
    }

    pub fn config(&self) -> &CareConfig {
        self.engine.config()
    }

    pub fn now(&self) -> i64 {
        self.clock.now_ms()
    }

    pub fn create_plant(
        &self,
        name: &str,
        species_key: Option<&str>,
    ) -> Result<Plant, CareError> {
        let plant = Plant::new(
            name.trim(),
            species_key.and_then(normalize_species_key),
            self.now(),
        );
        self.store.create_plant(&plant)?;
        info!(
            "event=plant_create module=service status=ok plant_id={} species_key={}",
            plant.id,
            plant.species_key.as_deref().unwrap_or("none")
        );
        Ok(plant)
    }

    pub fn get_plant(&self, plant_id: PlantId) -> Result<Plant, CareError> {
        self.store
            .get_plant(plant_id)?
            .ok_or(CareError::UnknownPlant(plant_id))
    }

    /// Plants ordered by `created_at ASC, id ASC`.
    pub fn list_plants(&self) -> Result<Vec<Plant>, CareError> {
        Ok(self.store.list_plants()?)
    }

    /// Sets or clears the species key. Unknown keys are kept and resolve to
    /// generic guidance.
    pub fn assign_species(
        &self,
        plant_id: PlantId,
        species_key: Option<&str>,
    ) -> Result<Plant, CareError> {
        self.update_plant(plant_id, |plant| {
            plant.species_key = species_key.and_then(normalize_species_key);
        })
    }

    /// Sets or clears the per-plant lux to PPFD factor.
    pub fn set_calibration(
        &self,
        plant_id: PlantId,
        lux_to_ppfd_factor: Option<f64>,
    ) -> Result<Plant, CareError> {
        self.update_plant(plant_id, |plant| {
            plant.lux_to_ppfd_factor = lux_to_ppfd_factor;
        })
    }

    /// Moves the plant to another growth stage; later verdicts check the
    /// species target for that stage.
    pub fn set_growth_stage(
        &self,
        plant_id: PlantId,
        growth_stage: GrowthStage,
    ) -> Result<Plant, CareError> {
        self.update_plant(plant_id, |plant| {
            plant.growth_stage = growth_stage;
        })
    }

    /// Deletes a plant with its samples and reminders.
    pub fn delete_plant(&self, plant_id: PlantId) -> Result<(), CareError> {
        let _guard = self.locks.lock(plant_id);
        self.store.delete_plant(plant_id)?;
        info!("event=plant_delete module=service status=ok plant_id={plant_id}");
        Ok(())
    }

    /// Normalizes and stores one reading taken now.
    pub fn record_measurement(
        &self,
        plant_id: PlantId,
        raw: &RawReading,
    ) -> Result<LightSample, CareError> {
        self.record_measurement_at(plant_id, raw, self.now(), None)
    }

    /// Normalizes and stores one reading with an explicit timestamp and note.
    pub fn record_measurement_at(
        &self,
        plant_id: PlantId,
        raw: &RawReading,
        measured_at: i64,
        note: Option<&str>,
    ) -> Result<LightSample, CareError> {
        let mut sample = sampler::sample(raw, measured_at)?;
        if let Some(note) = note {
            sample = sample.with_note(note);
        }

        let _guard = self.locks.lock(plant_id);
        self.store.append_sample(plant_id, &sample)?;
        info!(
            "event=measurement_record module=service status=ok plant_id={} source={} lux={:.1}",
            plant_id,
            sample.source.as_str(),
            sample.lux
        );
        Ok(sample)
    }

    /// Samples with `from <= measured_at <= to`, oldest first.
    pub fn query_samples(
        &self,
        plant_id: PlantId,
        from: i64,
        to: i64,
    ) -> Result<Vec<LightSample>, CareError> {
        Ok(self.store.query_samples(plant_id, from, to)?)
    }

    /// Current verdict; `InsufficientData` when nothing was measured recently.
    pub fn get_verdict(&self, plant_id: PlantId) -> Result<Verdict, CareError> {
        self.engine.evaluate(plant_id, self.now())
    }

    pub fn get_open_reminders(&self, plant_id: PlantId) -> Result<Vec<Reminder>, CareError> {
        self.scheduler.open_reminders(plant_id)
    }

    pub fn get_due_reminders(&self, plant_id: PlantId) -> Result<Vec<Reminder>, CareError> {
        self.scheduler.due_reminders(plant_id, self.now())
    }

    pub fn complete_reminder(&self, reminder_id: ReminderId) -> Result<Reminder, CareError> {
        self.scheduler.complete(reminder_id, self.now())
    }

    /// Runs one scheduler sweep. Invoked by the host, never on a timer here.
    pub fn run_scheduled_tick(&self, now: i64) -> Result<TickReport, CareError> {
        self.scheduler.tick(now)
    }

    pub fn species_profile(&self, species_key: Option<&str>) -> Result<ProfileResolution, CareError> {
        let registry = self.registry.read().map_err(|_| registry_poisoned())?;
        Ok(registry.lookup(species_key))
    }

    /// Persists a species profile and makes it visible to later lookups.
    pub fn import_species_profile(&self, profile: SpeciesProfile) -> Result<(), CareError> {
        let species_key = normalize_species_key(&profile.species_key)
            .ok_or(RepoError::Validation(ValidationError::EmptySpeciesKey))?;
        let profile = SpeciesProfile {
            species_key,
            ..profile
        };
        self.store.upsert_species_profile(&profile)?;

        let mut registry = self.registry.write().map_err(|_| registry_poisoned())?;
        registry.insert(profile.clone()).map_err(RepoError::from)?;
        info!(
            "event=species_import module=service status=ok species_key={}",
            profile.species_key
        );
        Ok(())
    }

    /// Rebuilds the registry from the built-in catalog and the store.
    pub fn reload_species(&self) -> Result<usize, CareError> {
        let fresh = SpeciesRegistry::load(self.store.as_ref())?;
        let count = fresh.len();
        *self.registry.write().map_err(|_| registry_poisoned())? = fresh;
        Ok(count)
    }

    fn update_plant(
        &self,
        plant_id: PlantId,
        apply: impl FnOnce(&mut Plant),
    ) -> Result<Plant, CareError> {
        let _guard = self.locks.lock(plant_id);
        let mut plant = self.get_plant(plant_id)?;
        apply(&mut plant);
        self.store.update_plant(&plant)?;
        info!(
            "event=plant_update module=service status=ok plant_id={} species_key={} growth_stage={}",
            plant.id,
            plant.species_key.as_deref().unwrap_or("none"),
            plant.growth_stage.as_str()
        );
        Ok(plant)
    }
}

fn registry_poisoned() -> CareError {
    CareError::StorageUnavailable(RepoError::Poisoned("species registry"))
}
