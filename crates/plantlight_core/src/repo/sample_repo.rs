//! Time-series store for light samples.
//!
//! # Responsibility
//! - Append immutable samples to a plant's ledger.
//! - Serve inclusive range queries and trailing-window aggregates.
//!
//! # Invariants
//! - Out-of-order appends are accepted; reads are always sorted by
//!   `(measured_at, id)`.
//! - An empty range is an empty result, never an error.

use crate::model::plant::PlantId;
use crate::model::sample::{LightAggregate, LightSample, MeasurementSource};
use crate::repo::plant_repo::ensure_plant_exists;
use crate::repo::sqlite_store::SqliteStore;
use crate::repo::{parse_uuid, RepoError, RepoResult};
use rusqlite::{params, Row};

pub trait SampleRepository {
    /// Appends one sample; fails with `PlantNotFound` for unknown plants.
    fn append_sample(&self, plant_id: PlantId, sample: &LightSample) -> RepoResult<()>;

    /// Samples with `from <= measured_at <= to`, oldest first.
    fn query_samples(&self, plant_id: PlantId, from: i64, to: i64)
        -> RepoResult<Vec<LightSample>>;

    /// Aggregate over `[now - window_ms, now]`; `None` when no sample falls inside.
    fn latest_aggregate(
        &self,
        plant_id: PlantId,
        window_ms: i64,
        now: i64,
    ) -> RepoResult<Option<LightAggregate>>;
}

impl SampleRepository for SqliteStore {
    fn append_sample(&self, plant_id: PlantId, sample: &LightSample) -> RepoResult<()> {
        sample.validate()?;
        self.with_conn(|conn| {
            ensure_plant_exists(conn, plant_id)?;
            conn.execute(
                "INSERT INTO light_samples (
                    id,
                    plant_id,
                    measured_at,
                    lux,
                    source,
                    note
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6);",
                params![
                    sample.id.to_string(),
                    plant_id.to_string(),
                    sample.measured_at,
                    sample.lux,
                    sample.source.as_str(),
                    sample.note.as_deref(),
                ],
            )?;
            Ok(())
        })
    }

    fn query_samples(
        &self,
        plant_id: PlantId,
        from: i64,
        to: i64,
    ) -> RepoResult<Vec<LightSample>> {
        self.with_conn(|conn| {
            ensure_plant_exists(conn, plant_id)?;
            if from > to {
                return Ok(Vec::new());
            }
            let mut stmt = conn.prepare(
                "SELECT
                    id,
                    measured_at,
                    lux,
                    source,
                    note
                 FROM light_samples
                 WHERE plant_id = ?1
                   AND measured_at BETWEEN ?2 AND ?3
                 ORDER BY measured_at ASC, id ASC;",
            )?;
            let mut rows = stmt.query(params![plant_id.to_string(), from, to])?;
            let mut samples = Vec::new();
            while let Some(row) = rows.next()? {
                samples.push(parse_sample_row(row)?);
            }
            Ok(samples)
        })
    }

    fn latest_aggregate(
        &self,
        plant_id: PlantId,
        window_ms: i64,
        now: i64,
    ) -> RepoResult<Option<LightAggregate>> {
        let window_start = now.saturating_sub(window_ms.max(0));
        self.with_conn(|conn| {
            ensure_plant_exists(conn, plant_id)?;
            let (count, mean, min, max): (i64, Option<f64>, Option<f64>, Option<f64>) = conn
                .query_row(
                    "SELECT COUNT(*), AVG(lux), MIN(lux), MAX(lux)
                     FROM light_samples
                     WHERE plant_id = ?1
                       AND measured_at BETWEEN ?2 AND ?3;",
                    params![plant_id.to_string(), window_start, now],
                    |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?)),
                )?;
            match (count, mean, min, max) {
                (0, ..) => Ok(None),
                (count, Some(mean_lux), Some(min_lux), Some(max_lux)) => {
                    Ok(Some(LightAggregate {
                        sample_count: u32::try_from(count).map_err(|_| {
                            RepoError::InvalidData(format!("sample count {count} out of range"))
                        })?,
                        mean_lux,
                        min_lux,
                        max_lux,
                        window_start,
                        window_end: now,
                    }))
                }
                _ => Err(RepoError::InvalidData(
                    "aggregate returned rows without lux statistics".to_string(),
                )),
            }
        })
    }
}

fn parse_sample_row(row: &Row<'_>) -> RepoResult<LightSample> {
    let id_text: String = row.get("id")?;
    let source_text: String = row.get("source")?;
    let source = MeasurementSource::parse(&source_text).ok_or_else(|| {
        RepoError::InvalidData(format!(
            "invalid source `{source_text}` in light_samples.source"
        ))
    })?;
    let sample = LightSample {
        id: parse_uuid(&id_text, "light_samples.id")?,
        measured_at: row.get("measured_at")?,
        lux: row.get("lux")?,
        source,
        note: row.get("note")?,
    };
    sample.validate()?;
    Ok(sample)
}
