use plantlight_core::db::migrations::latest_version;
use plantlight_core::db::{open_db, open_db_in_memory, DbError};
use rusqlite::Connection;
use std::thread;

#[test]
fn open_db_in_memory_applies_all_migrations() {
    let conn = open_db_in_memory().unwrap();

    assert_eq!(schema_version(&conn), latest_version());
    assert_table_exists(&conn, "plants");
    assert_table_exists(&conn, "light_samples");
    assert_table_exists(&conn, "species_profiles");
    assert_table_exists(&conn, "reminders");
    assert_table_exists(&conn, "species_stage_targets");
}

#[test]
fn version_two_database_upgrades_with_default_growth_stage() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("v2.db");

    let conn = Connection::open(&path).unwrap();
    conn.execute_batch(include_str!("../src/db/migrations/0001_init.sql"))
        .unwrap();
    conn.execute_batch(include_str!("../src/db/migrations/0002_reminders.sql"))
        .unwrap();
    conn.execute_batch(
        "INSERT INTO plants (id, name, created_at) VALUES ('p1', 'Fern', 0);
         PRAGMA user_version = 2;",
    )
    .unwrap();
    drop(conn);

    let conn = open_db(&path).unwrap();
    assert_eq!(schema_version(&conn), latest_version());
    let stage: String = conn
        .query_row("SELECT growth_stage FROM plants WHERE id = 'p1';", [], |row| {
            row.get(0)
        })
        .unwrap();
    assert_eq!(stage, "vegetative");
    assert!(conn
        .execute("UPDATE plants SET growth_stage = 'fruiting' WHERE id = 'p1';", [])
        .is_err());
}

#[test]
fn opening_same_database_twice_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("plantlight.db");

    let conn_first = open_db(&path).unwrap();
    assert_eq!(schema_version(&conn_first), latest_version());
    drop(conn_first);

    let conn_second = open_db(&path).unwrap();
    assert_eq!(schema_version(&conn_second), latest_version());
    assert_table_exists(&conn_second, "reminders");
}

#[test]
fn concurrent_first_open_migrates_once() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("shared.db");

    let handles = (0..4)
        .map(|_| {
            let path = path.clone();
            thread::spawn(move || open_db(path).map(|conn| schema_version(&conn)))
        })
        .collect::<Vec<_>>();

    for handle in handles {
        assert_eq!(handle.join().unwrap().unwrap(), latest_version());
    }
}

#[test]
fn opening_database_with_newer_schema_version_returns_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("future.db");

    let conn = Connection::open(&path).unwrap();
    conn.execute_batch("PRAGMA user_version = 999;").unwrap();
    drop(conn);

    let err = open_db(&path).unwrap_err();
    match err {
        DbError::UnsupportedSchemaVersion {
            db_version,
            latest_supported,
        } => {
            assert_eq!(db_version, 999);
            assert_eq!(latest_supported, latest_version());
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn foreign_keys_are_enforced() {
    let conn = open_db_in_memory().unwrap();
    let result = conn.execute(
        "INSERT INTO light_samples (id, plant_id, measured_at, lux, source)
         VALUES ('s1', 'missing-plant', 0, 10.0, 'sensor');",
        [],
    );
    assert!(result.is_err());
}

#[test]
fn second_open_reminder_per_kind_violates_unique_index() {
    let conn = open_db_in_memory().unwrap();
    conn.execute(
        "INSERT INTO plants (id, name, created_at) VALUES ('p1', 'Fern', 0);",
        [],
    )
    .unwrap();
    let insert = "INSERT INTO reminders (id, plant_id, kind, origin, due_at, created_at)
                  VALUES (?1, 'p1', 'water', 'schedule', 0, 0);";
    conn.execute(insert, ["r1"]).unwrap();
    assert!(conn.execute(insert, ["r2"]).is_err());

    conn.execute("UPDATE reminders SET completed_at = 5 WHERE id = 'r1';", [])
        .unwrap();
    conn.execute(insert, ["r2"]).unwrap();
}

fn schema_version(conn: &Connection) -> u32 {
    conn.query_row("PRAGMA user_version;", [], |row| row.get(0))
        .unwrap()
}

fn assert_table_exists(conn: &Connection, table_name: &str) {
    let exists: i64 = conn
        .query_row(
            "SELECT EXISTS(
                SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1
            );",
            [table_name],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(exists, 1, "expected table `{table_name}` to exist");
}
