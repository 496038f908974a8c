//! Plant repository contract and SQLite implementation.
//!
//! # Invariants
//! - Deleting a plant removes its samples and reminders (FK cascade).
//! - Plants are listed in creation order.

use crate::model::plant::{Plant, PlantId};
use crate::model::species::GrowthStage;
use crate::repo::sqlite_store::SqliteStore;
use crate::repo::{parse_uuid, RepoError, RepoResult};
use rusqlite::{params, Connection, OptionalExtension, Row};

const PLANT_SELECT_SQL: &str = "SELECT
    id,
    name,
    species_key,
    lux_to_ppfd_factor,
    growth_stage,
    created_at
FROM plants";

/// Plant CRUD consumed from the UI collaborator.
pub trait PlantRepository {
    fn create_plant(&self, plant: &Plant) -> RepoResult<PlantId>;
    fn get_plant(&self, id: PlantId) -> RepoResult<Option<Plant>>;
    fn list_plants(&self) -> RepoResult<Vec<Plant>>;
    /// Replaces name, species, calibration and growth stage of an existing plant.
    fn update_plant(&self, plant: &Plant) -> RepoResult<()>;
    /// Deletes a plant together with its samples and reminders.
    fn delete_plant(&self, id: PlantId) -> RepoResult<()>;
}

impl PlantRepository for SqliteStore {
    fn create_plant(&self, plant: &Plant) -> RepoResult<PlantId> {
        plant.validate()?;
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO plants (
                    id,
                    name,
                    species_key,
                    lux_to_ppfd_factor,
                    growth_stage,
                    created_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6);",
                params![
                    plant.id.to_string(),
                    plant.name.trim(),
                    plant.species_key.as_deref(),
                    plant.lux_to_ppfd_factor,
                    plant.growth_stage.as_str(),
                    plant.created_at,
                ],
            )?;
            Ok(plant.id)
        })
    }

    fn get_plant(&self, id: PlantId) -> RepoResult<Option<Plant>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!("{PLANT_SELECT_SQL} WHERE id = ?1;"))?;
            let mut rows = stmt.query([id.to_string()])?;
            match rows.next()? {
                Some(row) => Ok(Some(parse_plant_row(row)?)),
                None => Ok(None),
            }
        })
    }

    fn list_plants(&self) -> RepoResult<Vec<Plant>> {
        self.with_conn(|conn| {
            let mut stmt =
                conn.prepare(&format!("{PLANT_SELECT_SQL} ORDER BY created_at ASC, id ASC;"))?;
            let mut rows = stmt.query([])?;
            let mut plants = Vec::new();
            while let Some(row) = rows.next()? {
                plants.push(parse_plant_row(row)?);
            }
            Ok(plants)
        })
    }

    fn update_plant(&self, plant: &Plant) -> RepoResult<()> {
        plant.validate()?;
        self.with_conn(|conn| {
            let changed = conn.execute(
                "UPDATE plants
                 SET
                    name = ?2,
                    species_key = ?3,
                    lux_to_ppfd_factor = ?4,
                    growth_stage = ?5
                 WHERE id = ?1;",
                params![
                    plant.id.to_string(),
                    plant.name.trim(),
                    plant.species_key.as_deref(),
                    plant.lux_to_ppfd_factor,
                    plant.growth_stage.as_str(),
                ],
            )?;
            if changed == 0 {
                return Err(RepoError::PlantNotFound(plant.id));
            }
            Ok(())
        })
    }

    fn delete_plant(&self, id: PlantId) -> RepoResult<()> {
        self.with_conn(|conn| {
            let changed = conn.execute("DELETE FROM plants WHERE id = ?1;", [id.to_string()])?;
            if changed == 0 {
                return Err(RepoError::PlantNotFound(id));
            }
            Ok(())
        })
    }
}

/// Fails with `PlantNotFound` unless the plant row exists.
pub(crate) fn ensure_plant_exists(conn: &Connection, id: PlantId) -> RepoResult<()> {
    let found = conn
        .query_row(
            "SELECT 1 FROM plants WHERE id = ?1;",
            [id.to_string()],
            |row| row.get::<_, i64>(0),
        )
        .optional()?;
    match found {
        Some(_) => Ok(()),
        None => Err(RepoError::PlantNotFound(id)),
    }
}

fn parse_plant_row(row: &Row<'_>) -> RepoResult<Plant> {
    let id_text: String = row.get("id")?;
    let stage_text: String = row.get("growth_stage")?;
    let growth_stage = GrowthStage::parse(&stage_text).ok_or_else(|| {
        RepoError::InvalidData(format!("invalid plants.growth_stage `{stage_text}`"))
    })?;
    let plant = Plant {
        id: parse_uuid(&id_text, "plants.id")?,
        name: row.get("name")?,
        species_key: row.get("species_key")?,
        lux_to_ppfd_factor: row.get("lux_to_ppfd_factor")?,
        growth_stage,
        created_at: row.get("created_at")?,
    };
    plant.validate()?;
    Ok(plant)
}
