//! CLI smoke entry point.
//!
//! # Responsibility
//! - Verify `plantlight_core` linkage without the Flutter runtime.
//! - Run one scheduled tick against a database file: `plantlight_cli tick <db>`.
//!
//! Set `PLANTLIGHT_LOG_DIR` (absolute) to capture core logs while ticking.

use log::info;
use plantlight_core::{
    default_log_level, init_logging, CareConfig, PlantCare, SqliteStore, SystemClock,
};
use std::process::ExitCode;
use std::sync::Arc;

fn main() -> ExitCode {
    println!("plantlight_core ping={}", plantlight_core::ping());
    println!("plantlight_core version={}", plantlight_core::core_version());

    let args = std::env::args().skip(1).collect::<Vec<_>>();
    match args.as_slice() {
        [] => ExitCode::SUCCESS,
        [command, db_path] if command == "tick" => match run_tick(db_path) {
            Ok(()) => ExitCode::SUCCESS,
            Err(message) => {
                eprintln!("tick failed: {message}");
                ExitCode::FAILURE
            }
        },
        _ => {
            eprintln!("usage: plantlight_cli [tick <db_path>]");
            ExitCode::from(2)
        }
    }
}

fn run_tick(db_path: &str) -> Result<(), String> {
    if let Ok(log_dir) = std::env::var("PLANTLIGHT_LOG_DIR") {
        init_logging(default_log_level(), &log_dir).map_err(|err| err.to_string())?;
    }

    let store = SqliteStore::open(db_path).map_err(|err| err.to_string())?;
    let care = PlantCare::new(store, CareConfig::default(), Arc::new(SystemClock))
        .map_err(|err| err.to_string())?;
    let report = care
        .run_scheduled_tick(care.now())
        .map_err(|err| err.to_string())?;

    info!(
        "event=cli_tick module=cli status=ok db_path={} created={}",
        db_path,
        report.created.len()
    );
    println!(
        "tick plants={} created={} retired={} busy={} insufficient_data={}",
        report.plants_swept,
        report.created.len(),
        report.retired.len(),
        report.skipped_busy.len(),
        report.insufficient_data.len()
    );
    for reminder in &report.created {
        println!(
            "  reminder plant_id={} kind={} due_at={}",
            reminder.plant_id,
            reminder.kind.as_str(),
            reminder.due_at
        );
    }
    Ok(())
}
