//! Care reminder model.
//!
//! # Invariants
//! - A reminder is open while neither `completed_at` nor `retired_at` is set.
//! - At most one open reminder exists per plant and task kind.

use super::plant::PlantId;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type ReminderId = Uuid;

/// Care task a reminder asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskKind {
    Water,
    Fertilize,
    Reposition,
}

impl TaskKind {
    /// Kinds driven by a fixed interval since the last completion.
    pub const INTERVAL_KINDS: [TaskKind; 2] = [TaskKind::Water, TaskKind::Fertilize];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Water => "water",
            Self::Fertilize => "fertilize",
            Self::Reposition => "reposition",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "water" => Some(Self::Water),
            "fertilize" => Some(Self::Fertilize),
            "reposition" => Some(Self::Reposition),
            _ => None,
        }
    }
}

/// What created a reminder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReminderOrigin {
    Schedule,
    Verdict,
}

impl ReminderOrigin {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Schedule => "schedule",
            Self::Verdict => "verdict",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "schedule" => Some(Self::Schedule),
            "verdict" => Some(Self::Verdict),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reminder {
    pub id: ReminderId,
    pub plant_id: PlantId,
    pub kind: TaskKind,
    pub origin: ReminderOrigin,
    /// Unix epoch milliseconds.
    pub due_at: i64,
    pub created_at: i64,
    pub completed_at: Option<i64>,
    /// Set when a newer state supersedes the reminder.
    pub retired_at: Option<i64>,
}

impl Reminder {
    pub fn new(
        plant_id: PlantId,
        kind: TaskKind,
        origin: ReminderOrigin,
        due_at: i64,
        created_at: i64,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            plant_id,
            kind,
            origin,
            due_at,
            created_at,
            completed_at: None,
            retired_at: None,
        }
    }

    pub fn is_open(&self) -> bool {
        self.completed_at.is_none() && self.retired_at.is_none()
    }

    pub fn is_completed(&self) -> bool {
        self.completed_at.is_some()
    }

    /// Open and due at or before `now`.
    pub fn is_due(&self, now: i64) -> bool {
        self.is_open() && self.due_at <= now
    }
}

#[cfg(test)]
mod tests {
    use super::{Reminder, ReminderOrigin, TaskKind};
    use uuid::Uuid;

    #[test]
    fn task_kind_text_roundtrip() {
        for kind in [TaskKind::Water, TaskKind::Fertilize, TaskKind::Reposition] {
            assert_eq!(TaskKind::parse(kind.as_str()), Some(kind));
        }
        assert_eq!(TaskKind::parse("prune"), None);
    }

    #[test]
    fn retired_reminder_is_not_open() {
        let mut reminder = Reminder::new(Uuid::new_v4(), TaskKind::Water, ReminderOrigin::Schedule, 10, 0);
        assert!(reminder.is_due(10));
        assert!(!reminder.is_due(9));
        reminder.retired_at = Some(11);
        assert!(!reminder.is_open());
        assert!(!reminder.is_completed());
    }
}
