//! Species profile reference data storage.
//!
//! Profiles are written only through the import path
//! (`upsert_species_profile`); the normal flow only reads them.
//! A profile row and its stage targets are replaced together.

use crate::model::species::{GrowthStage, LightRange, SpeciesProfile, StageTarget};
use crate::repo::sqlite_store::SqliteStore;
use crate::repo::{RepoError, RepoResult};
use rusqlite::{params, Connection, Row};
use std::collections::HashMap;

pub trait SpeciesRepository {
    fn list_species_profiles(&self) -> RepoResult<Vec<SpeciesProfile>>;
    fn upsert_species_profile(&self, profile: &SpeciesProfile) -> RepoResult<()>;
}

impl SpeciesRepository for SqliteStore {
    fn list_species_profiles(&self) -> RepoResult<Vec<SpeciesProfile>> {
        self.with_conn(|conn| {
            let mut stage_targets = load_stage_targets(conn)?;
            let mut stmt = conn.prepare(
                "SELECT
                    species_key,
                    min_lux,
                    max_lux,
                    preferred_min_lux,
                    preferred_max_lux,
                    water_interval_days,
                    fertilize_interval_days
                 FROM species_profiles
                 ORDER BY species_key ASC;",
            )?;
            let mut rows = stmt.query([])?;
            let mut profiles = Vec::new();
            while let Some(row) = rows.next()? {
                let targets = stage_targets.remove(&row.get::<_, String>("species_key")?);
                profiles.push(parse_profile_row(row, targets.unwrap_or_default())?);
            }
            Ok(profiles)
        })
    }

    fn upsert_species_profile(&self, profile: &SpeciesProfile) -> RepoResult<()> {
        profile.validate_import()?;
        self.with_conn(|conn| {
            let tx = conn.transaction()?;
            tx.execute(
                "INSERT INTO species_profiles (
                    species_key,
                    min_lux,
                    max_lux,
                    preferred_min_lux,
                    preferred_max_lux,
                    water_interval_days,
                    fertilize_interval_days
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                ON CONFLICT(species_key) DO UPDATE SET
                    min_lux = excluded.min_lux,
                    max_lux = excluded.max_lux,
                    preferred_min_lux = excluded.preferred_min_lux,
                    preferred_max_lux = excluded.preferred_max_lux,
                    water_interval_days = excluded.water_interval_days,
                    fertilize_interval_days = excluded.fertilize_interval_days;",
                params![
                    profile.species_key.as_str(),
                    profile.min_lux,
                    profile.max_lux,
                    profile.preferred_min_lux,
                    profile.preferred_max_lux,
                    profile.water_interval_days,
                    profile.fertilize_interval_days,
                ],
            )?;
            tx.execute(
                "DELETE FROM species_stage_targets WHERE species_key = ?1;",
                [profile.species_key.as_str()],
            )?;
            for target in &profile.stage_targets {
                tx.execute(
                    "INSERT INTO species_stage_targets (
                        species_key,
                        stage,
                        ppfd_min,
                        ppfd_max,
                        dli_min,
                        dli_max
                    ) VALUES (?1, ?2, ?3, ?4, ?5, ?6);",
                    params![
                        profile.species_key.as_str(),
                        target.stage.as_str(),
                        target.ppfd.min,
                        target.ppfd.max,
                        target.dli.min,
                        target.dli.max,
                    ],
                )?;
            }
            tx.commit()?;
            Ok(())
        })
    }
}

/// Stage targets of every stored profile keyed by species, in stage order.
fn load_stage_targets(conn: &Connection) -> RepoResult<HashMap<String, Vec<StageTarget>>> {
    let mut stmt = conn.prepare(
        "SELECT species_key, stage, ppfd_min, ppfd_max, dli_min, dli_max
         FROM species_stage_targets
         ORDER BY species_key ASC,
            CASE stage WHEN 'seedling' THEN 0 WHEN 'vegetative' THEN 1 ELSE 2 END;",
    )?;
    let mut rows = stmt.query([])?;
    let mut targets: HashMap<String, Vec<StageTarget>> = HashMap::new();
    while let Some(row) = rows.next()? {
        let stage_text: String = row.get("stage")?;
        let stage = GrowthStage::parse(&stage_text).ok_or_else(|| {
            RepoError::InvalidData(format!(
                "invalid species_stage_targets.stage `{stage_text}`"
            ))
        })?;
        targets
            .entry(row.get("species_key")?)
            .or_default()
            .push(StageTarget {
                stage,
                ppfd: LightRange::new(row.get("ppfd_min")?, row.get("ppfd_max")?),
                dli: LightRange::new(row.get("dli_min")?, row.get("dli_max")?),
            });
    }
    Ok(targets)
}

fn parse_profile_row(
    row: &Row<'_>,
    stage_targets: Vec<StageTarget>,
) -> RepoResult<SpeciesProfile> {
    let profile = SpeciesProfile {
        species_key: row.get("species_key")?,
        min_lux: row.get("min_lux")?,
        max_lux: row.get("max_lux")?,
        preferred_min_lux: row.get("preferred_min_lux")?,
        preferred_max_lux: row.get("preferred_max_lux")?,
        water_interval_days: row.get("water_interval_days")?,
        fertilize_interval_days: row.get("fertilize_interval_days")?,
        stage_targets,
    };
    profile
        .validate()
        .map_err(|err| RepoError::InvalidData(err.to_string()))?;
    Ok(profile)
}
