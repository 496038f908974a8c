//! Reminder scheduler.
//!
//! # Responsibility
//! - Create interval reminders (water, fertilize) when their cadence lapses.
//! - Turn out-of-band verdicts into reposition reminders and retire them
//!   once light is adequate again.
//! - Complete reminders, which resets the interval clock of their kind.
//!
//! # Invariants
//! - At most one open reminder per plant and kind.
//! - A plant is swept only while its lock is held; busy plants are skipped.
//! - Ticking twice with the same `now` creates nothing the second time.
//! - Losing an insert race to another writer counts as "already open".

use super::error::CareError;
use super::locks::PlantLocks;
use super::recommendation::RecommendationEngine;
use crate::config::CareConfig;
use crate::model::plant::{Plant, PlantId};
use crate::model::reminder::{Reminder, ReminderId, ReminderOrigin, TaskKind};
use crate::model::species::SpeciesProfile;
use crate::model::verdict::Verdict;
use crate::repo::{CareStore, RepoError};
use log::{debug, error, info, warn};
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;

/// Outcome of one scheduled sweep.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TickReport {
    pub now: i64,
    pub plants_swept: usize,
    pub created: Vec<Reminder>,
    pub retired: Vec<Reminder>,
    /// Plants whose lock was held elsewhere; picked up by the next tick.
    pub skipped_busy: Vec<PlantId>,
    /// Plants without samples in the evaluation window.
    pub insufficient_data: Vec<PlantId>,
}

impl TickReport {
    fn new(now: i64) -> Self {
        Self {
            now,
            ..Self::default()
        }
    }
}

pub struct ReminderScheduler<S> {
    store: Arc<S>,
    engine: RecommendationEngine<S>,
    locks: Arc<PlantLocks>,
    config: CareConfig,
}

impl<S: CareStore> ReminderScheduler<S> {
    pub fn new(
        store: Arc<S>,
        engine: RecommendationEngine<S>,
        locks: Arc<PlantLocks>,
        config: CareConfig,
    ) -> Self {
        Self {
            store,
            engine,
            locks,
            config,
        }
    }

    /// Sweeps every plant once at `now`.
    pub fn tick(&self, now: i64) -> Result<TickReport, CareError> {
        let started_at = Instant::now();
        info!("event=reminder_tick module=service status=start now={now}");

        let plants = self.store.list_plants()?;
        let mut report = TickReport::new(now);
        for plant in &plants {
            let Some(_guard) = self.locks.try_lock(plant.id) else {
                warn!(
                    "event=reminder_tick module=service status=skipped reason=plant_busy plant_id={}",
                    plant.id
                );
                report.skipped_busy.push(plant.id);
                continue;
            };

            match self.sweep_plant(plant, now, &mut report) {
                Ok(()) => report.plants_swept += 1,
                // Deleted between listing and locking.
                Err(CareError::UnknownPlant(plant_id)) => {
                    debug!(
                        "event=reminder_tick module=service status=skipped reason=plant_deleted plant_id={plant_id}"
                    );
                }
                Err(err) => {
                    error!(
                        "event=reminder_tick module=service status=error plant_id={} error={}",
                        plant.id, err
                    );
                    return Err(err);
                }
            }
        }

        info!(
            "event=reminder_tick module=service status=ok plants={} created={} retired={} busy={} insufficient={} duration_ms={}",
            report.plants_swept,
            report.created.len(),
            report.retired.len(),
            report.skipped_busy.len(),
            report.insufficient_data.len(),
            started_at.elapsed().as_millis()
        );
        Ok(report)
    }

    /// Completes an open reminder at `now`.
    pub fn complete(&self, reminder_id: ReminderId, now: i64) -> Result<Reminder, CareError> {
        let reminder = self
            .store
            .get_reminder(reminder_id)?
            .filter(Reminder::is_open)
            .ok_or(CareError::UnknownReminder(reminder_id))?;

        let _guard = self.locks.lock(reminder.plant_id);
        let completed = self.store.complete_reminder(reminder_id, now)?;
        info!(
            "event=reminder_complete module=service status=ok reminder_id={} plant_id={} kind={}",
            completed.id,
            completed.plant_id,
            completed.kind.as_str()
        );
        Ok(completed)
    }

    /// Open reminders for a plant ordered by due time.
    pub fn open_reminders(&self, plant_id: PlantId) -> Result<Vec<Reminder>, CareError> {
        Ok(self.store.list_reminders(plant_id, false)?)
    }

    /// Open reminders whose due time has been reached.
    pub fn due_reminders(&self, plant_id: PlantId, now: i64) -> Result<Vec<Reminder>, CareError> {
        let mut reminders = self.open_reminders(plant_id)?;
        reminders.retain(|reminder| reminder.is_due(now));
        Ok(reminders)
    }

    fn sweep_plant(
        &self,
        plant: &Plant,
        now: i64,
        report: &mut TickReport,
    ) -> Result<(), CareError> {
        let resolution = self.engine.resolve_profile(plant)?;
        for kind in TaskKind::INTERVAL_KINDS {
            if let Some(reminder) =
                self.schedule_interval_task(plant, kind, resolution.profile(), now)?
            {
                report.created.push(reminder);
            }
        }

        match self.engine.evaluate(plant.id, now) {
            Ok(verdict) => self.apply_verdict(&verdict, now, report),
            Err(CareError::InsufficientData { plant_id, .. }) => {
                report.insufficient_data.push(plant_id);
                Ok(())
            }
            Err(err) => Err(err),
        }
    }

    fn schedule_interval_task(
        &self,
        plant: &Plant,
        kind: TaskKind,
        profile: &SpeciesProfile,
        now: i64,
    ) -> Result<Option<Reminder>, CareError> {
        let Some(interval_ms) = self.config.interval_ms(kind, profile) else {
            return Ok(None);
        };
        if self.store.find_open_reminder(plant.id, kind)?.is_some() {
            return Ok(None);
        }

        let anchor = self
            .store
            .last_completed_at(plant.id, kind)?
            .unwrap_or(plant.created_at);
        let due_at = anchor.saturating_add(interval_ms);
        if now < due_at {
            return Ok(None);
        }

        let reminder = Reminder::new(plant.id, kind, ReminderOrigin::Schedule, due_at, now);
        if !self.insert_reminder(&reminder)? {
            return Ok(None);
        }
        info!(
            "event=reminder_create module=service status=ok origin=schedule plant_id={} kind={} due_at={}",
            plant.id,
            kind.as_str(),
            due_at
        );
        Ok(Some(reminder))
    }

    /// Inserts `reminder`; `false` when another writer already opened one
    /// of the same kind for the plant.
    fn insert_reminder(&self, reminder: &Reminder) -> Result<bool, CareError> {
        match self.store.create_reminder(reminder) {
            Ok(_) => Ok(true),
            Err(RepoError::OpenReminderExists { plant_id, kind }) => {
                debug!(
                    "event=reminder_create module=service status=skipped reason=already_open plant_id={plant_id} kind={}",
                    kind.as_str()
                );
                Ok(false)
            }
            Err(err) => Err(err.into()),
        }
    }

    fn apply_verdict(
        &self,
        verdict: &Verdict,
        now: i64,
        report: &mut TickReport,
    ) -> Result<(), CareError> {
        let open = self
            .store
            .find_open_reminder(verdict.plant_id, TaskKind::Reposition)?;

        if verdict.status.needs_reposition() {
            if open.is_none() {
                let reminder = Reminder::new(
                    verdict.plant_id,
                    TaskKind::Reposition,
                    ReminderOrigin::Verdict,
                    now,
                    now,
                );
                if !self.insert_reminder(&reminder)? {
                    return Ok(());
                }
                info!(
                    "event=reminder_create module=service status=ok origin=verdict plant_id={} verdict={}",
                    verdict.plant_id,
                    verdict.status.as_str()
                );
                report.created.push(reminder);
            }
            return Ok(());
        }

        if let Some(open) = open.filter(|reminder| reminder.origin == ReminderOrigin::Verdict) {
            let retired = self.store.retire_reminder(open.id, now)?;
            info!(
                "event=reminder_retire module=service status=ok plant_id={} reminder_id={}",
                retired.plant_id, retired.id
            );
            report.retired.push(retired);
        }
        Ok(())
    }
}
