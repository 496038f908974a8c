use plantlight_core::repo::{PlantRepository, SampleRepository};
use plantlight_core::time::DAY_MS;
use plantlight_core::{
    CareStore, LightSample, MeasurementSource, MemoryStore, Plant, RepoError, SqliteStore,
};
use uuid::Uuid;

fn sqlite() -> SqliteStore {
    SqliteStore::open_in_memory().unwrap()
}

fn seeded_plant(store: &impl CareStore) -> Plant {
    let plant = Plant::new("Monstera", Some("monstera_deliciosa".to_string()), 0);
    store.create_plant(&plant).unwrap();
    plant
}

fn sensor(measured_at: i64, lux: f64) -> LightSample {
    LightSample::new(measured_at, lux, MeasurementSource::Sensor)
}

fn check_query_sorts_out_of_order_appends(store: impl CareStore) {
    let plant = seeded_plant(&store);
    for (at, lux) in [(300, 3.0), (100, 1.0), (200, 2.0), (100, 1.5)] {
        store.append_sample(plant.id, &sensor(at, lux)).unwrap();
    }

    let samples = store.query_samples(plant.id, 0, 1_000).unwrap();
    assert_eq!(samples.len(), 4);
    assert!(samples
        .windows(2)
        .all(|pair| (pair[0].measured_at, pair[0].id) <= (pair[1].measured_at, pair[1].id)));
}

#[test]
fn query_sorts_out_of_order_appends_sqlite() {
    check_query_sorts_out_of_order_appends(sqlite());
}

#[test]
fn query_sorts_out_of_order_appends_memory() {
    check_query_sorts_out_of_order_appends(MemoryStore::new());
}

fn check_query_range_is_inclusive(store: impl CareStore) {
    let plant = seeded_plant(&store);
    for at in [10, 20, 30, 40] {
        store.append_sample(plant.id, &sensor(at, 100.0)).unwrap();
    }

    let inside = store.query_samples(plant.id, 20, 30).unwrap();
    assert_eq!(
        inside.iter().map(|s| s.measured_at).collect::<Vec<_>>(),
        vec![20, 30]
    );
    assert!(store.query_samples(plant.id, 41, 50).unwrap().is_empty());
    assert!(store.query_samples(plant.id, 30, 20).unwrap().is_empty());
}

#[test]
fn query_range_is_inclusive_sqlite() {
    check_query_range_is_inclusive(sqlite());
}

#[test]
fn query_range_is_inclusive_memory() {
    check_query_range_is_inclusive(MemoryStore::new());
}

fn check_unknown_plant_is_rejected(store: impl CareStore) {
    let missing = Uuid::new_v4();
    let err = store.append_sample(missing, &sensor(0, 1.0)).unwrap_err();
    assert!(matches!(err, RepoError::PlantNotFound(id) if id == missing));
    assert!(matches!(
        store.query_samples(missing, 0, 10),
        Err(RepoError::PlantNotFound(_))
    ));
}

#[test]
fn unknown_plant_is_rejected_sqlite() {
    check_unknown_plant_is_rejected(sqlite());
}

#[test]
fn unknown_plant_is_rejected_memory() {
    check_unknown_plant_is_rejected(MemoryStore::new());
}

fn check_aggregate_covers_trailing_window(store: impl CareStore) {
    let plant = seeded_plant(&store);
    let now = 30 * DAY_MS;
    // Outside the 7 day window.
    store
        .append_sample(plant.id, &sensor(now - 8 * DAY_MS, 10_000.0))
        .unwrap();
    // Window edges count.
    store
        .append_sample(plant.id, &sensor(now - 7 * DAY_MS, 100.0))
        .unwrap();
    store.append_sample(plant.id, &sensor(now, 300.0)).unwrap();
    store
        .append_sample(plant.id, &sensor(now - DAY_MS, 200.0))
        .unwrap();
    // Future samples are ignored.
    store
        .append_sample(plant.id, &sensor(now + 1, 50_000.0))
        .unwrap();

    let aggregate = store
        .latest_aggregate(plant.id, 7 * DAY_MS, now)
        .unwrap()
        .unwrap();
    assert_eq!(aggregate.sample_count, 3);
    assert!((aggregate.mean_lux - 200.0).abs() < 1e-9);
    assert_eq!(aggregate.min_lux, 100.0);
    assert_eq!(aggregate.max_lux, 300.0);
    assert_eq!(aggregate.window_start, now - 7 * DAY_MS);
    assert_eq!(aggregate.window_end, now);

    assert!(store
        .latest_aggregate(plant.id, DAY_MS, now - 20 * DAY_MS)
        .unwrap()
        .is_none());
}

#[test]
fn aggregate_covers_trailing_window_sqlite() {
    check_aggregate_covers_trailing_window(sqlite());
}

#[test]
fn aggregate_covers_trailing_window_memory() {
    check_aggregate_covers_trailing_window(MemoryStore::new());
}

#[test]
fn samples_survive_reopen_and_cascade_with_plant() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("ledger.db");

    let plant_id = {
        let store = SqliteStore::open(&path).unwrap();
        let plant = seeded_plant(&store);
        let sample = sensor(5, 42.0).with_note("north window");
        store.append_sample(plant.id, &sample).unwrap();
        plant.id
    };

    let store = SqliteStore::open(&path).unwrap();
    let samples = store.query_samples(plant_id, 0, 10).unwrap();
    assert_eq!(samples.len(), 1);
    assert_eq!(samples[0].note.as_deref(), Some("north window"));
    assert_eq!(samples[0].source, MeasurementSource::Sensor);

    store.delete_plant(plant_id).unwrap();
    assert!(matches!(
        store.query_samples(plant_id, 0, 10),
        Err(RepoError::PlantNotFound(_))
    ));
}

#[test]
fn invalid_lux_is_not_persisted() {
    let store = sqlite();
    let plant = seeded_plant(&store);
    let err = store
        .append_sample(plant.id, &sensor(0, f64::NAN))
        .unwrap_err();
    assert!(matches!(err, RepoError::Validation(_)));
    assert!(store.query_samples(plant.id, 0, 10).unwrap().is_empty());
}
