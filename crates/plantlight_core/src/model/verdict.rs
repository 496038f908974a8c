//! Light adequacy verdict produced by the recommendation engine.

use super::plant::PlantId;
use super::species::{GrowthStage, ProfileResolution};
use serde::{Deserialize, Serialize};

/// Categorical judgement of a plant's recent light.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LightStatus {
    TooDark,
    Adequate,
    TooBright,
}

impl LightStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::TooDark => "too_dark",
            Self::Adequate => "adequate",
            Self::TooBright => "too_bright",
        }
    }

    /// Whether the plant should be moved.
    pub fn needs_reposition(self) -> bool {
        !matches!(self, Self::Adequate)
    }
}

/// Position of a value relative to an advisory range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RangeStatus {
    Low,
    Ok,
    High,
}

impl RangeStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Ok => "ok",
            Self::High => "high",
        }
    }
}

/// Derived verdict; not persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Verdict {
    pub plant_id: PlantId,
    pub evaluated_at: i64,
    pub status: LightStatus,
    /// Mean illuminance over the evaluation window.
    pub mean_lux: f64,
    pub sample_count: u32,
    /// µmol·m⁻²·s⁻¹ derived from `mean_lux`.
    pub ppfd: f64,
    /// mol·m⁻²·day⁻¹ for the configured photoperiod.
    pub dli: f64,
    pub within_preferred: bool,
    /// Stage the PPFD/DLI targets were taken from.
    pub growth_stage: GrowthStage,
    /// `None` when the profile has no bound for this stage.
    pub ppfd_status: Option<RangeStatus>,
    pub dli_status: Option<RangeStatus>,
    pub profile: ProfileResolution,
}
