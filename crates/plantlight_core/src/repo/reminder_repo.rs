//! Reminder repository contract and SQLite implementation.
//!
//! # Invariants
//! - Reminders are never deleted by this layer; they are completed or
//!   retired. Plant deletion cascades them away.
//! - Only open reminders can be completed or retired.
//! - A partial unique index backs the one-open-reminder-per-kind rule.

use crate::model::plant::PlantId;
use crate::model::reminder::{Reminder, ReminderId, ReminderOrigin, TaskKind};
use crate::repo::plant_repo::ensure_plant_exists;
use crate::repo::sqlite_store::SqliteStore;
use crate::repo::{parse_uuid, RepoError, RepoResult};
use rusqlite::{params, Connection, Row};

const REMINDER_SELECT_SQL: &str = "SELECT
    id,
    plant_id,
    kind,
    origin,
    due_at,
    created_at,
    completed_at,
    retired_at
FROM reminders";

pub trait ReminderRepository {
    fn create_reminder(&self, reminder: &Reminder) -> RepoResult<ReminderId>;
    fn get_reminder(&self, id: ReminderId) -> RepoResult<Option<Reminder>>;
    /// Reminders of one plant ordered by `due_at`; closed ones only on request.
    fn list_reminders(&self, plant_id: PlantId, include_closed: bool)
        -> RepoResult<Vec<Reminder>>;
    fn find_open_reminder(&self, plant_id: PlantId, kind: TaskKind)
        -> RepoResult<Option<Reminder>>;
    /// Latest completion time for a task kind, the anchor of its interval clock.
    fn last_completed_at(&self, plant_id: PlantId, kind: TaskKind) -> RepoResult<Option<i64>>;
    /// Marks an open reminder completed; `ReminderNotFound` otherwise.
    fn complete_reminder(&self, id: ReminderId, completed_at: i64) -> RepoResult<Reminder>;
    /// Marks an open reminder superseded; `ReminderNotFound` otherwise.
    fn retire_reminder(&self, id: ReminderId, retired_at: i64) -> RepoResult<Reminder>;
}

impl ReminderRepository for SqliteStore {
    fn create_reminder(&self, reminder: &Reminder) -> RepoResult<ReminderId> {
        self.with_conn(|conn| {
            ensure_plant_exists(conn, reminder.plant_id)?;
            conn.execute(
                "INSERT INTO reminders (
                    id,
                    plant_id,
                    kind,
                    origin,
                    due_at,
                    created_at,
                    completed_at,
                    retired_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8);",
                params![
                    reminder.id.to_string(),
                    reminder.plant_id.to_string(),
                    reminder.kind.as_str(),
                    reminder.origin.as_str(),
                    reminder.due_at,
                    reminder.created_at,
                    reminder.completed_at,
                    reminder.retired_at,
                ],
            )
            .map_err(|err| map_open_reminder_conflict(err, reminder))?;
            Ok(reminder.id)
        })
    }

    fn get_reminder(&self, id: ReminderId) -> RepoResult<Option<Reminder>> {
        self.with_conn(|conn| load_reminder(conn, id))
    }

    fn list_reminders(
        &self,
        plant_id: PlantId,
        include_closed: bool,
    ) -> RepoResult<Vec<Reminder>> {
        self.with_conn(|conn| {
            ensure_plant_exists(conn, plant_id)?;
            let mut stmt = conn.prepare(&format!(
                "{REMINDER_SELECT_SQL}
                 WHERE plant_id = ?1
                   AND (?2 = 1 OR (completed_at IS NULL AND retired_at IS NULL))
                 ORDER BY due_at ASC, id ASC;"
            ))?;
            let mut rows = stmt.query(params![plant_id.to_string(), i64::from(include_closed)])?;
            let mut reminders = Vec::new();
            while let Some(row) = rows.next()? {
                reminders.push(parse_reminder_row(row)?);
            }
            Ok(reminders)
        })
    }

    fn find_open_reminder(
        &self,
        plant_id: PlantId,
        kind: TaskKind,
    ) -> RepoResult<Option<Reminder>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "{REMINDER_SELECT_SQL}
                 WHERE plant_id = ?1
                   AND kind = ?2
                   AND completed_at IS NULL
                   AND retired_at IS NULL
                 ORDER BY due_at ASC, id ASC
                 LIMIT 1;"
            ))?;
            let mut rows = stmt.query(params![plant_id.to_string(), kind.as_str()])?;
            match rows.next()? {
                Some(row) => Ok(Some(parse_reminder_row(row)?)),
                None => Ok(None),
            }
        })
    }

    fn last_completed_at(&self, plant_id: PlantId, kind: TaskKind) -> RepoResult<Option<i64>> {
        self.with_conn(|conn| {
            let latest = conn.query_row(
                "SELECT MAX(completed_at)
                 FROM reminders
                 WHERE plant_id = ?1
                   AND kind = ?2;",
                params![plant_id.to_string(), kind.as_str()],
                |row| row.get::<_, Option<i64>>(0),
            )?;
            Ok(latest)
        })
    }

    fn complete_reminder(&self, id: ReminderId, completed_at: i64) -> RepoResult<Reminder> {
        self.with_conn(|conn| {
            close_open_reminder(conn, id, "completed_at", completed_at)?;
            load_reminder(conn, id)?.ok_or(RepoError::ReminderNotFound(id))
        })
    }

    fn retire_reminder(&self, id: ReminderId, retired_at: i64) -> RepoResult<Reminder> {
        self.with_conn(|conn| {
            close_open_reminder(conn, id, "retired_at", retired_at)?;
            load_reminder(conn, id)?.ok_or(RepoError::ReminderNotFound(id))
        })
    }
}

fn close_open_reminder(
    conn: &Connection,
    id: ReminderId,
    column: &'static str,
    at: i64,
) -> RepoResult<()> {
    let changed = conn.execute(
        &format!(
            "UPDATE reminders
             SET {column} = ?2
             WHERE id = ?1
               AND completed_at IS NULL
               AND retired_at IS NULL;"
        ),
        params![id.to_string(), at],
    )?;
    if changed == 0 {
        return Err(RepoError::ReminderNotFound(id));
    }
    Ok(())
}

/// Maps a hit on the open-reminder unique index to `OpenReminderExists`.
fn map_open_reminder_conflict(err: rusqlite::Error, reminder: &Reminder) -> RepoError {
    match &err {
        rusqlite::Error::SqliteFailure(failure, _)
            if reminder.is_open()
                && failure.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE =>
        {
            RepoError::OpenReminderExists {
                plant_id: reminder.plant_id,
                kind: reminder.kind,
            }
        }
        _ => RepoError::from(err),
    }
}

fn load_reminder(conn: &Connection, id: ReminderId) -> RepoResult<Option<Reminder>> {
    let mut stmt = conn.prepare(&format!("{REMINDER_SELECT_SQL} WHERE id = ?1;"))?;
    let mut rows = stmt.query([id.to_string()])?;
    match rows.next()? {
        Some(row) => Ok(Some(parse_reminder_row(row)?)),
        None => Ok(None),
    }
}

fn parse_reminder_row(row: &Row<'_>) -> RepoResult<Reminder> {
    let id_text: String = row.get("id")?;
    let plant_text: String = row.get("plant_id")?;
    let kind_text: String = row.get("kind")?;
    let kind = TaskKind::parse(&kind_text).ok_or_else(|| {
        RepoError::InvalidData(format!("invalid task kind `{kind_text}` in reminders.kind"))
    })?;
    let origin_text: String = row.get("origin")?;
    let origin = ReminderOrigin::parse(&origin_text).ok_or_else(|| {
        RepoError::InvalidData(format!(
            "invalid origin `{origin_text}` in reminders.origin"
        ))
    })?;

    Ok(Reminder {
        id: parse_uuid(&id_text, "reminders.id")?,
        plant_id: parse_uuid(&plant_text, "reminders.plant_id")?,
        kind,
        origin,
        due_at: row.get("due_at")?,
        created_at: row.get("created_at")?,
        completed_at: row.get("completed_at")?,
        retired_at: row.get("retired_at")?,
    })
}
