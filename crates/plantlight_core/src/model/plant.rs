//! Plant domain model.

use super::species::GrowthStage;
use super::ValidationError;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable identifier of a plant.
pub type PlantId = Uuid;

/// A plant registered by the user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Plant {
    pub id: PlantId,
    pub name: String,
    /// Species catalog key. `None` resolves to generic guidance.
    pub species_key: Option<String>,
    /// Per-plant lux to PPFD calibration. Falls back to the configured default.
    pub lux_to_ppfd_factor: Option<f64>,
    /// Selects the species PPFD/DLI target.
    #[serde(default)]
    pub growth_stage: GrowthStage,
    /// Unix epoch milliseconds.
    pub created_at: i64,
}

impl Plant {
    /// Creates a new plant with a generated stable ID.
    pub fn new(name: impl Into<String>, species_key: Option<String>, created_at: i64) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            species_key,
            lux_to_ppfd_factor: None,
            growth_stage: GrowthStage::default(),
            created_at,
        }
    }

    /// Validates name and calibration invariants.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::EmptyPlantName);
        }
        if let Some(factor) = self.lux_to_ppfd_factor {
            if !factor.is_finite() || factor <= 0.0 {
                return Err(ValidationError::InvalidCalibrationFactor(factor));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::Plant;
    use crate::model::species::GrowthStage;
    use crate::model::ValidationError;

    #[test]
    fn blank_name_is_rejected() {
        let plant = Plant::new("  ", None, 0);
        assert_eq!(plant.validate(), Err(ValidationError::EmptyPlantName));
    }

    #[test]
    fn non_positive_factor_is_rejected() {
        let mut plant = Plant::new("Monstera", None, 0);
        plant.lux_to_ppfd_factor = Some(0.0);
        assert!(matches!(
            plant.validate(),
            Err(ValidationError::InvalidCalibrationFactor(_))
        ));
        plant.lux_to_ppfd_factor = Some(0.02);
        assert!(plant.validate().is_ok());
    }

    #[test]
    fn growth_stage_defaults_to_vegetative() {
        let plant: Plant = serde_json::from_str(
            r#"{"id":"7c9e6679-7425-40de-944b-e07fc1f90ae7","name":"Fern","species_key":null,"lux_to_ppfd_factor":null,"created_at":0}"#,
        )
        .unwrap();
        assert_eq!(plant.growth_stage, GrowthStage::Vegetative);
        assert_eq!(Plant::new("Fern", None, 0).growth_stage, GrowthStage::Vegetative);
    }
}
