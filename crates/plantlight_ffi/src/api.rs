//! FFI use-case API for Flutter-facing calls.
//!
//! # Responsibility
//! - Expose plant, measurement, verdict and reminder use-cases to Dart via FRB.
//! - Flatten core results into plain envelopes with string ids.
//!
//! # Invariants
//! - Exported functions must not panic across the FFI boundary.
//! - Failures carry a stable `error_code` plus a human-readable message.
//! - "No verdict yet" is reported as `ok=true, status=None`, not as a failure.
//! - Every call shares one process-wide plant lock table, so overlapping
//!   calls never sweep or mutate the same plant at once.

use log::warn;
use plantlight_core::{
    core_version as core_version_inner, init_logging as init_logging_inner, ping as ping_inner,
    CareConfig, CareError, GrowthStage, Plant, PlantCare, PlantId, PlantLocks, RangeStatus,
    RawReading, Reminder, SqliteStore, SystemClock, ValidationError,
};
use std::path::PathBuf;
use std::sync::{Arc, OnceLock};
use uuid::Uuid;

const DB_FILE_NAME: &str = "plantlight.sqlite3";
static DB_PATH: OnceLock<PathBuf> = OnceLock::new();
static PLANT_LOCKS: OnceLock<Arc<PlantLocks>> = OnceLock::new();

/// Minimal health-check API for FRB smoke integration.
#[flutter_rust_bridge::frb(sync)]
pub fn ping() -> String {
    ping_inner().to_owned()
}

#[flutter_rust_bridge::frb(sync)]
pub fn core_version() -> String {
    core_version_inner().to_owned()
}

/// Initializes Rust core logging once per process.
///
/// Returns an empty string on success and the error message otherwise.
/// Repeating the call with the same `level + log_dir` is a no-op.
#[flutter_rust_bridge::frb(sync)]
pub fn init_logging(level: String, log_dir: String) -> String {
    match init_logging_inner(level.as_str(), log_dir.as_str()) {
        Ok(()) => String::new(),
        Err(err) => err.to_string(),
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlantItem {
    pub plant_id: String,
    pub name: String,
    pub species_key: Option<String>,
    pub lux_to_ppfd_factor: Option<f64>,
    /// `seedling|vegetative|flower`.
    pub growth_stage: String,
    pub created_at: i64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlantResponse {
    pub ok: bool,
    pub plant: Option<PlantItem>,
    pub error_code: Option<String>,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlantListResponse {
    pub ok: bool,
    pub items: Vec<PlantItem>,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MeasurementResponse {
    pub ok: bool,
    pub sample_id: Option<String>,
    /// Normalized lux-equivalent value that was stored.
    pub lux: Option<f64>,
    pub error_code: Option<String>,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct VerdictResponse {
    pub ok: bool,
    /// `too_dark|adequate|too_bright`; `None` when there is no recent data.
    pub status: Option<String>,
    pub mean_lux: Option<f64>,
    pub sample_count: u32,
    pub ppfd: Option<f64>,
    pub dli: Option<f64>,
    pub within_preferred: bool,
    pub growth_stage: Option<String>,
    /// `low|ok|high` against the species target for the growth stage;
    /// `None` when the species defines no such target.
    pub ppfd_status: Option<String>,
    pub dli_status: Option<String>,
    /// True when the verdict used the generic fallback band.
    pub generic_guidance: bool,
    pub error_code: Option<String>,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReminderItem {
    pub reminder_id: String,
    pub plant_id: String,
    /// `water|fertilize|reposition`.
    pub kind: String,
    /// `schedule|verdict`.
    pub origin: String,
    pub due_at: i64,
    pub created_at: i64,
    pub completed_at: Option<i64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReminderListResponse {
    pub ok: bool,
    pub items: Vec<ReminderItem>,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ActionResponse {
    pub ok: bool,
    pub id: Option<String>,
    pub error_code: Option<String>,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TickResponse {
    pub ok: bool,
    pub plants_swept: u32,
    pub created: Vec<ReminderItem>,
    pub retired_count: u32,
    pub skipped_busy: u32,
    pub message: String,
}

impl ActionResponse {
    fn success(message: impl Into<String>, id: String) -> Self {
        Self {
            ok: true,
            id: Some(id),
            error_code: None,
            message: message.into(),
        }
    }

    fn failure(err: &CareError, operation: &str) -> Self {
        Self {
            ok: false,
            id: None,
            error_code: Some(err.code().to_string()),
            message: format!("{operation} failed: {err}"),
        }
    }
}

impl PlantResponse {
    fn from_result(result: Result<Plant, CareError>, operation: &str, done: &str) -> Self {
        match result {
            Ok(plant) => Self {
                ok: true,
                plant: Some(to_plant_item(&plant)),
                error_code: None,
                message: done.to_string(),
            },
            Err(err) => Self {
                ok: false,
                plant: None,
                error_code: Some(err.code().to_string()),
                message: format!("{operation} failed: {err}"),
            },
        }
    }
}

/// Registers a plant. `species_key` may be unknown to the catalog.
#[flutter_rust_bridge::frb(sync)]
pub fn plant_create(name: String, species_key: Option<String>) -> PlantResponse {
    let result = with_care(|care| care.create_plant(&name, species_key.as_deref()));
    PlantResponse::from_result(result, "plant_create", "Plant created.")
}

#[flutter_rust_bridge::frb(sync)]
pub fn plant_list() -> PlantListResponse {
    match with_care(|care| care.list_plants()) {
        Ok(plants) => PlantListResponse {
            ok: true,
            message: format!("Found {} plant(s).", plants.len()),
            items: plants.iter().map(to_plant_item).collect(),
        },
        Err(err) => PlantListResponse {
            ok: false,
            items: Vec::new(),
            message: format!("plant_list failed: {err}"),
        },
    }
}

#[flutter_rust_bridge::frb(sync)]
pub fn plant_assign_species(plant_id: String, species_key: Option<String>) -> PlantResponse {
    let result = parse_id(&plant_id)
        .and_then(|id| with_care(|care| care.assign_species(id, species_key.as_deref())));
    PlantResponse::from_result(result, "plant_assign_species", "Species assigned.")
}

/// Sets the growth stage (`seedling|vegetative|flower`) used for PPFD/DLI
/// targets.
#[flutter_rust_bridge::frb(sync)]
pub fn plant_set_growth_stage(plant_id: String, growth_stage: String) -> PlantResponse {
    let result = parse_id(&plant_id).and_then(|id| {
        let stage = parse_growth_stage(&growth_stage)?;
        with_care(|care| care.set_growth_stage(id, stage))
    });
    PlantResponse::from_result(result, "plant_set_growth_stage", "Growth stage updated.")
}

/// Deletes a plant together with its samples and reminders.
#[flutter_rust_bridge::frb(sync)]
pub fn plant_delete(plant_id: String) -> ActionResponse {
    match parse_id(&plant_id).and_then(|id| with_care(|care| care.delete_plant(id))) {
        Ok(()) => ActionResponse::success("Plant deleted.", plant_id),
        Err(err) => ActionResponse::failure(&err, "plant_delete"),
    }
}

/// Records an ambient light sensor reading taken now.
#[flutter_rust_bridge::frb(sync)]
pub fn measurement_record_sensor(plant_id: String, lux: f64) -> MeasurementResponse {
    record_measurement(&plant_id, RawReading::Sensor { lux })
}

/// Records a camera exposure reading taken now. Missing fields are rejected.
#[flutter_rust_bridge::frb(sync)]
pub fn measurement_record_exposure(
    plant_id: String,
    iso: Option<f64>,
    shutter_seconds: Option<f64>,
    aperture: Option<f64>,
) -> MeasurementResponse {
    record_measurement(
        &plant_id,
        RawReading::Exposure {
            iso,
            shutter_seconds,
            aperture,
        },
    )
}

#[flutter_rust_bridge::frb(sync)]
pub fn verdict_get(plant_id: String) -> VerdictResponse {
    match parse_id(&plant_id).and_then(|id| with_care(|care| care.get_verdict(id))) {
        Ok(verdict) => VerdictResponse {
            ok: true,
            status: Some(verdict.status.as_str().to_string()),
            mean_lux: Some(verdict.mean_lux),
            sample_count: verdict.sample_count,
            ppfd: Some(verdict.ppfd),
            dli: Some(verdict.dli),
            within_preferred: verdict.within_preferred,
            growth_stage: Some(verdict.growth_stage.as_str().to_string()),
            ppfd_status: verdict.ppfd_status.map(range_status_text),
            dli_status: verdict.dli_status.map(range_status_text),
            generic_guidance: verdict.profile.is_fallback(),
            error_code: None,
            message: format!("Light is {}.", verdict.status.as_str()),
        },
        Err(err) => VerdictResponse {
            ok: err.is_insufficient_data(),
            status: None,
            mean_lux: None,
            sample_count: 0,
            ppfd: None,
            dli: None,
            within_preferred: false,
            growth_stage: None,
            ppfd_status: None,
            dli_status: None,
            generic_guidance: false,
            error_code: Some(err.code().to_string()),
            message: if err.is_insufficient_data() {
                "No recent measurements.".to_string()
            } else {
                format!("verdict_get failed: {err}")
            },
        },
    }
}

#[flutter_rust_bridge::frb(sync)]
pub fn reminders_open(plant_id: String) -> ReminderListResponse {
    match parse_id(&plant_id).and_then(|id| with_care(|care| care.get_open_reminders(id))) {
        Ok(reminders) => ReminderListResponse {
            ok: true,
            message: format!("Found {} open reminder(s).", reminders.len()),
            items: reminders.iter().map(to_reminder_item).collect(),
        },
        Err(err) => ReminderListResponse {
            ok: false,
            items: Vec::new(),
            message: format!("reminders_open failed: {err}"),
        },
    }
}

#[flutter_rust_bridge::frb(sync)]
pub fn reminder_complete(reminder_id: String) -> ActionResponse {
    match parse_id(&reminder_id).and_then(|id| with_care(|care| care.complete_reminder(id))) {
        Ok(reminder) => ActionResponse::success("Reminder completed.", reminder.id.to_string()),
        Err(err) => ActionResponse::failure(&err, "reminder_complete"),
    }
}

/// Runs one scheduler sweep at the current wall-clock time.
///
/// The host decides when to call this (app resume, background task).
#[flutter_rust_bridge::frb(sync)]
pub fn scheduled_tick() -> TickResponse {
    match with_care(|care| care.run_scheduled_tick(care.now())) {
        Ok(report) => TickResponse {
            ok: true,
            plants_swept: count_u32(report.plants_swept),
            retired_count: count_u32(report.retired.len()),
            skipped_busy: count_u32(report.skipped_busy.len()),
            message: format!("Created {} reminder(s).", report.created.len()),
            created: report.created.iter().map(to_reminder_item).collect(),
        },
        Err(err) => TickResponse {
            ok: false,
            plants_swept: 0,
            created: Vec::new(),
            retired_count: 0,
            skipped_busy: 0,
            message: format!("scheduled_tick failed: {err}"),
        },
    }
}

fn record_measurement(plant_id: &str, raw: RawReading) -> MeasurementResponse {
    match parse_id(plant_id).and_then(|id| with_care(|care| care.record_measurement(id, &raw))) {
        Ok(sample) => MeasurementResponse {
            ok: true,
            sample_id: Some(sample.id.to_string()),
            lux: Some(sample.lux),
            error_code: None,
            message: "Measurement recorded.".to_string(),
        },
        Err(err) => MeasurementResponse {
            ok: false,
            sample_id: None,
            lux: None,
            error_code: Some(err.code().to_string()),
            message: format!("measurement_record failed: {err}"),
        },
    }
}

fn resolve_db_path() -> PathBuf {
    DB_PATH
        .get_or_init(|| {
            if let Ok(raw) = std::env::var("PLANTLIGHT_DB_PATH") {
                let trimmed = raw.trim();
                if !trimmed.is_empty() {
                    return PathBuf::from(trimmed);
                }
            }
            std::env::temp_dir().join(DB_FILE_NAME)
        })
        .clone()
}

fn shared_locks() -> Arc<PlantLocks> {
    Arc::clone(PLANT_LOCKS.get_or_init(|| Arc::new(PlantLocks::new())))
}

fn with_care<T>(
    f: impl FnOnce(&PlantCare<SqliteStore>) -> Result<T, CareError>,
) -> Result<T, CareError> {
    let result = SqliteStore::open(resolve_db_path())
        .map_err(CareError::from)
        .and_then(|store| {
            PlantCare::with_locks(
                store,
                CareConfig::default(),
                Arc::new(SystemClock),
                shared_locks(),
            )
        })
        .and_then(|care| f(&care));
    if let Err(err) = &result {
        if !err.is_insufficient_data() {
            warn!(
                "event=ffi_call module=ffi status=error error_code={} error={}",
                err.code(),
                err
            );
        }
    }
    result
}

fn parse_id(raw: &str) -> Result<PlantId, CareError> {
    Uuid::parse_str(raw.trim())
        .map_err(|_| CareError::InvalidInput(format!("invalid id `{}`", raw.trim())))
}

fn parse_growth_stage(raw: &str) -> Result<GrowthStage, CareError> {
    GrowthStage::parse(raw).ok_or_else(|| {
        let err = ValidationError::InvalidGrowthStage(raw.trim().to_string());
        CareError::InvalidInput(err.to_string())
    })
}

fn range_status_text(status: RangeStatus) -> String {
    status.as_str().to_string()
}

fn count_u32(value: usize) -> u32 {
    u32::try_from(value).unwrap_or(u32::MAX)
}

fn to_plant_item(plant: &Plant) -> PlantItem {
    PlantItem {
        plant_id: plant.id.to_string(),
        name: plant.name.clone(),
        species_key: plant.species_key.clone(),
        lux_to_ppfd_factor: plant.lux_to_ppfd_factor,
        growth_stage: plant.growth_stage.as_str().to_string(),
        created_at: plant.created_at,
    }
}

fn to_reminder_item(reminder: &Reminder) -> ReminderItem {
    ReminderItem {
        reminder_id: reminder.id.to_string(),
        plant_id: reminder.plant_id.to_string(),
        kind: reminder.kind.as_str().to_string(),
        origin: reminder.origin.as_str().to_string(),
        due_at: reminder.due_at,
        created_at: reminder.created_at,
        completed_at: reminder.completed_at,
    }
}

#[cfg(test)]
mod tests {
    use super::{
        core_version, init_logging, measurement_record_exposure, measurement_record_sensor,
        ping, plant_assign_species, plant_create, plant_delete, plant_list,
        plant_set_growth_stage, reminder_complete, reminders_open, scheduled_tick, shared_locks,
        verdict_get,
    };
    use uuid::Uuid;

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }

    #[test]
    fn init_logging_rejects_bad_input() {
        assert!(!init_logging("info".to_string(), String::new()).is_empty());
        assert!(!init_logging("verbose".to_string(), "tmp/logs".to_string()).is_empty());
    }

    #[test]
    fn plant_lifecycle_through_envelopes() {
        let created = plant_create("Kitchen fern".to_string(), None);
        assert!(created.ok, "{}", created.message);
        let plant_id = created.plant.unwrap().plant_id;

        let listed = plant_list();
        assert!(listed.items.iter().any(|item| item.plant_id == plant_id));

        let assigned = plant_assign_species(plant_id.clone(), Some("Ficus Lyrata".to_string()));
        assert!(assigned.ok, "{}", assigned.message);
        assert_eq!(
            assigned.plant.unwrap().species_key.as_deref(),
            Some("ficus_lyrata")
        );

        let deleted = plant_delete(plant_id.clone());
        assert!(deleted.ok, "{}", deleted.message);
        let again = plant_delete(plant_id);
        assert_eq!(again.error_code.as_deref(), Some("unknown_plant"));
    }

    #[test]
    fn verdict_without_samples_is_not_a_failure() {
        let plant_id = plant_create("Shelf cactus".to_string(), None)
            .plant
            .unwrap()
            .plant_id;
        let verdict = verdict_get(plant_id.clone());
        assert!(verdict.ok);
        assert_eq!(verdict.status, None);
        assert_eq!(verdict.error_code.as_deref(), Some("insufficient_data"));

        let recorded = measurement_record_sensor(plant_id.clone(), 2_000.0);
        assert!(recorded.ok, "{}", recorded.message);
        let verdict = verdict_get(plant_id);
        assert_eq!(verdict.status.as_deref(), Some("adequate"));
        assert!(verdict.generic_guidance);
    }

    #[test]
    fn growth_stage_flows_into_verdict_targets() {
        let plant = plant_create("Sill basil".to_string(), Some("ocimum_basilicum".to_string()))
            .plant
            .unwrap();
        assert_eq!(plant.growth_stage, "vegetative");

        let bad = plant_set_growth_stage(plant.plant_id.clone(), "fruiting".to_string());
        assert_eq!(bad.error_code.as_deref(), Some("invalid_input"));

        let staged = plant_set_growth_stage(plant.plant_id.clone(), " Seedling ".to_string());
        assert!(staged.ok, "{}", staged.message);
        assert_eq!(staged.plant.unwrap().growth_stage, "seedling");

        // 20 000 lux -> 370 µmol·m⁻²·s⁻¹, above the seedling ceiling of 200.
        assert!(measurement_record_sensor(plant.plant_id.clone(), 20_000.0).ok);
        let verdict = verdict_get(plant.plant_id.clone());
        assert_eq!(verdict.status.as_deref(), Some("adequate"));
        assert_eq!(verdict.growth_stage.as_deref(), Some("seedling"));
        assert_eq!(verdict.ppfd_status.as_deref(), Some("high"));
        assert_eq!(verdict.dli_status.as_deref(), Some("high"));
        assert!(plant_delete(plant.plant_id).ok);
    }

    #[test]
    fn incomplete_exposure_is_rejected() {
        let plant_id = plant_create("Window basil".to_string(), None)
            .plant
            .unwrap()
            .plant_id;
        let response = measurement_record_exposure(plant_id, Some(100.0), None, Some(2.8));
        assert!(!response.ok);
        assert_eq!(
            response.error_code.as_deref(),
            Some("invalid_measurement_input")
        );
    }

    #[test]
    fn unknown_ids_report_stable_codes() {
        let response = reminder_complete(Uuid::new_v4().to_string());
        assert_eq!(response.error_code.as_deref(), Some("unknown_reminder"));
        let response = reminder_complete("not-a-uuid".to_string());
        assert_eq!(response.error_code.as_deref(), Some("invalid_input"));
        assert!(!reminders_open(Uuid::new_v4().to_string()).ok);
    }

    #[test]
    fn tick_skips_plant_held_by_another_call() {
        let plant_id = plant_create("Hallway palm".to_string(), None)
            .plant
            .unwrap()
            .plant_id;
        let id = Uuid::parse_str(&plant_id).unwrap();

        let locks = shared_locks();
        let guard = locks.try_lock(id).expect("plant should be free");
        let response = scheduled_tick();
        assert!(response.ok, "{}", response.message);
        assert!(response.skipped_busy >= 1);
        drop(guard);

        assert!(!locks.is_locked(id));
        assert!(plant_delete(plant_id).ok);
    }
}
