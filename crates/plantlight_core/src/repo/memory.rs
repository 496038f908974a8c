//! In-memory implementation of the store contracts.
//!
//! Mirrors the SQLite store semantics (referential checks, ordering,
//! cascade delete, open-reminder rules) so engine and scheduler behavior can
//! be exercised without a database.

use crate::model::plant::{Plant, PlantId};
use crate::model::reminder::{Reminder, ReminderId, TaskKind};
use crate::model::sample::{LightAggregate, LightSample};
use crate::model::species::SpeciesProfile;
use crate::repo::{
    PlantRepository, ReminderRepository, RepoError, RepoResult, SampleRepository,
    SpeciesRepository,
};
use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard};

#[derive(Default)]
struct MemoryState {
    plants: HashMap<PlantId, Plant>,
    samples: HashMap<PlantId, Vec<LightSample>>,
    reminders: HashMap<ReminderId, Reminder>,
    species: BTreeMap<String, SpeciesProfile>,
}

impl MemoryState {
    fn ensure_plant(&self, id: PlantId) -> RepoResult<()> {
        if self.plants.contains_key(&id) {
            Ok(())
        } else {
            Err(RepoError::PlantNotFound(id))
        }
    }

    fn open_reminder_mut(&mut self, id: ReminderId) -> RepoResult<&mut Reminder> {
        match self.reminders.get_mut(&id) {
            Some(reminder) if reminder.is_open() => Ok(reminder),
            _ => Err(RepoError::ReminderNotFound(id)),
        }
    }
}

#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<MemoryState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> RepoResult<MutexGuard<'_, MemoryState>> {
        self.state
            .lock()
            .map_err(|_| RepoError::Poisoned("memory store"))
    }
}

fn sort_reminders(reminders: &mut [Reminder]) {
    reminders.sort_by(|a, b| a.due_at.cmp(&b.due_at).then_with(|| a.id.cmp(&b.id)));
}

impl PlantRepository for MemoryStore {
    fn create_plant(&self, plant: &Plant) -> RepoResult<PlantId> {
        plant.validate()?;
        let mut state = self.state()?;
        if state.plants.contains_key(&plant.id) {
            return Err(RepoError::InvalidData(format!(
                "plant already exists: {}",
                plant.id
            )));
        }
        let mut stored = plant.clone();
        stored.name = stored.name.trim().to_string();
        state.plants.insert(plant.id, stored);
        Ok(plant.id)
    }

    fn get_plant(&self, id: PlantId) -> RepoResult<Option<Plant>> {
        Ok(self.state()?.plants.get(&id).cloned())
    }

    fn list_plants(&self) -> RepoResult<Vec<Plant>> {
        let mut plants = self.state()?.plants.values().cloned().collect::<Vec<_>>();
        plants.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(plants)
    }

    fn update_plant(&self, plant: &Plant) -> RepoResult<()> {
        plant.validate()?;
        let mut state = self.state()?;
        let stored = state
            .plants
            .get_mut(&plant.id)
            .ok_or(RepoError::PlantNotFound(plant.id))?;
        stored.name = plant.name.trim().to_string();
        stored.species_key = plant.species_key.clone();
        stored.lux_to_ppfd_factor = plant.lux_to_ppfd_factor;
        stored.growth_stage = plant.growth_stage;
        Ok(())
    }

    fn delete_plant(&self, id: PlantId) -> RepoResult<()> {
        let mut state = self.state()?;
        if state.plants.remove(&id).is_none() {
            return Err(RepoError::PlantNotFound(id));
        }
        state.samples.remove(&id);
        state.reminders.retain(|_, reminder| reminder.plant_id != id);
        Ok(())
    }
}

impl SampleRepository for MemoryStore {
    fn append_sample(&self, plant_id: PlantId, sample: &LightSample) -> RepoResult<()> {
        sample.validate()?;
        let mut state = self.state()?;
        state.ensure_plant(plant_id)?;
        let ledger = state.samples.entry(plant_id).or_default();
        let position = ledger.partition_point(|existing| {
            (existing.measured_at, existing.id) <= (sample.measured_at, sample.id)
        });
        ledger.insert(position, sample.clone());
        Ok(())
    }

    fn query_samples(
        &self,
        plant_id: PlantId,
        from: i64,
        to: i64,
    ) -> RepoResult<Vec<LightSample>> {
        let state = self.state()?;
        state.ensure_plant(plant_id)?;
        if from > to {
            return Ok(Vec::new());
        }
        // Ledgers are kept sorted by (measured_at, id) on append.
        let samples = state
            .samples
            .get(&plant_id)
            .map(|ledger| {
                ledger
                    .iter()
                    .filter(|sample| sample.measured_at >= from && sample.measured_at <= to)
                    .cloned()
                    .collect::<Vec<_>>()
            })
            .unwrap_or_default();
        Ok(samples)
    }

    fn latest_aggregate(
        &self,
        plant_id: PlantId,
        window_ms: i64,
        now: i64,
    ) -> RepoResult<Option<LightAggregate>> {
        let window_start = now.saturating_sub(window_ms.max(0));
        let samples = self.query_samples(plant_id, window_start, now)?;
        LightAggregate::from_samples(&samples, window_start, now)
            .map_err(|err| RepoError::InvalidData(err.to_string()))
    }
}

impl ReminderRepository for MemoryStore {
    fn create_reminder(&self, reminder: &Reminder) -> RepoResult<ReminderId> {
        let mut state = self.state()?;
        state.ensure_plant(reminder.plant_id)?;
        let duplicate_open = reminder.is_open()
            && state.reminders.values().any(|existing| {
                existing.plant_id == reminder.plant_id
                    && existing.kind == reminder.kind
                    && existing.is_open()
            });
        if duplicate_open {
            return Err(RepoError::OpenReminderExists {
                plant_id: reminder.plant_id,
                kind: reminder.kind,
            });
        }
        if state.reminders.contains_key(&reminder.id) {
            return Err(RepoError::InvalidData(format!(
                "reminder conflicts with an existing row: {}",
                reminder.id
            )));
        }
        state.reminders.insert(reminder.id, reminder.clone());
        Ok(reminder.id)
    }

    fn get_reminder(&self, id: ReminderId) -> RepoResult<Option<Reminder>> {
        Ok(self.state()?.reminders.get(&id).cloned())
    }

    fn list_reminders(
        &self,
        plant_id: PlantId,
        include_closed: bool,
    ) -> RepoResult<Vec<Reminder>> {
        let state = self.state()?;
        state.ensure_plant(plant_id)?;
        let mut reminders = state
            .reminders
            .values()
            .filter(|reminder| reminder.plant_id == plant_id)
            .filter(|reminder| include_closed || reminder.is_open())
            .cloned()
            .collect::<Vec<_>>();
        sort_reminders(&mut reminders);
        Ok(reminders)
    }

    fn find_open_reminder(
        &self,
        plant_id: PlantId,
        kind: TaskKind,
    ) -> RepoResult<Option<Reminder>> {
        let state = self.state()?;
        let mut open = state
            .reminders
            .values()
            .filter(|reminder| {
                reminder.plant_id == plant_id && reminder.kind == kind && reminder.is_open()
            })
            .cloned()
            .collect::<Vec<_>>();
        sort_reminders(&mut open);
        Ok(open.into_iter().next())
    }

    fn last_completed_at(&self, plant_id: PlantId, kind: TaskKind) -> RepoResult<Option<i64>> {
        let state = self.state()?;
        Ok(state
            .reminders
            .values()
            .filter(|reminder| reminder.plant_id == plant_id && reminder.kind == kind)
            .filter_map(|reminder| reminder.completed_at)
            .max())
    }

    fn complete_reminder(&self, id: ReminderId, completed_at: i64) -> RepoResult<Reminder> {
        let mut state = self.state()?;
        let reminder = state.open_reminder_mut(id)?;
        reminder.completed_at = Some(completed_at);
        Ok(reminder.clone())
    }

    fn retire_reminder(&self, id: ReminderId, retired_at: i64) -> RepoResult<Reminder> {
        let mut state = self.state()?;
        let reminder = state.open_reminder_mut(id)?;
        reminder.retired_at = Some(retired_at);
        Ok(reminder.clone())
    }
}

impl SpeciesRepository for MemoryStore {
    fn list_species_profiles(&self) -> RepoResult<Vec<SpeciesProfile>> {
        Ok(self.state()?.species.values().cloned().collect())
    }

    fn upsert_species_profile(&self, profile: &SpeciesProfile) -> RepoResult<()> {
        profile.validate_import()?;
        self.state()?
            .species
            .insert(profile.species_key.clone(), profile.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::MemoryStore;
    use crate::model::plant::Plant;
    use crate::model::reminder::{Reminder, ReminderOrigin, TaskKind};
    use crate::model::sample::{LightSample, MeasurementSource};
    use crate::repo::{PlantRepository, ReminderRepository, RepoError, SampleRepository};

    #[test]
    fn out_of_order_appends_are_read_back_sorted() {
        let store = MemoryStore::new();
        let plant = Plant::new("Pilea", None, 0);
        store.create_plant(&plant).unwrap();
        for at in [30, 10, 20, 10] {
            store
                .append_sample(plant.id, &LightSample::new(at, 100.0, MeasurementSource::Sensor))
                .unwrap();
        }
        let samples = store.query_samples(plant.id, 0, 100).unwrap();
        let times = samples.iter().map(|s| s.measured_at).collect::<Vec<_>>();
        assert_eq!(times, vec![10, 10, 20, 30]);
    }

    #[test]
    fn second_open_reminder_of_same_kind_is_rejected() {
        let store = MemoryStore::new();
        let plant = Plant::new("Pilea", None, 0);
        store.create_plant(&plant).unwrap();
        let first = Reminder::new(plant.id, TaskKind::Water, ReminderOrigin::Schedule, 1, 0);
        let second = Reminder::new(plant.id, TaskKind::Water, ReminderOrigin::Schedule, 2, 0);
        store.create_reminder(&first).unwrap();
        let err = store.create_reminder(&second).unwrap_err();
        assert!(matches!(
            err,
            RepoError::OpenReminderExists { plant_id, kind: TaskKind::Water } if plant_id == plant.id
        ));
    }

    #[test]
    fn delete_plant_cascades() {
        let store = MemoryStore::new();
        let plant = Plant::new("Pilea", None, 0);
        store.create_plant(&plant).unwrap();
        store
            .append_sample(plant.id, &LightSample::new(1, 100.0, MeasurementSource::Sensor))
            .unwrap();
        let reminder = Reminder::new(plant.id, TaskKind::Water, ReminderOrigin::Schedule, 1, 0);
        store.create_reminder(&reminder).unwrap();
        assert_eq!(store.query_samples(plant.id, 0, 1).unwrap().len(), 1);

        store.delete_plant(plant.id).unwrap();
        assert!(store.get_reminder(reminder.id).unwrap().is_none());
        assert!(matches!(
            store.query_samples(plant.id, 0, 1),
            Err(RepoError::PlantNotFound(_))
        ));

        // Re-inserting the same id must not resurrect the old ledger.
        store.create_plant(&plant).unwrap();
        assert!(store.query_samples(plant.id, 0, 1).unwrap().is_empty());
        assert!(store.list_reminders(plant.id, true).unwrap().is_empty());
    }
}
