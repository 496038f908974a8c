//! Species light band reference data.

use super::verdict::RangeStatus;
use super::ValidationError;
use serde::{Deserialize, Serialize};

/// Key of the profile used when a plant has no known species.
pub const FALLBACK_SPECIES_KEY: &str = "unknown";

/// Development phase of a plant; selects which light target applies.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GrowthStage {
    Seedling,
    #[default]
    Vegetative,
    Flower,
}

impl GrowthStage {
    pub const ALL: [Self; 3] = [Self::Seedling, Self::Vegetative, Self::Flower];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Seedling => "seedling",
            Self::Vegetative => "vegetative",
            Self::Flower => "flower",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        let value = value.trim();
        Self::ALL
            .into_iter()
            .find(|stage| stage.as_str().eq_ignore_ascii_case(value))
    }
}

/// Inclusive range whose ends may be open.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct LightRange {
    #[serde(default)]
    pub min: Option<f64>,
    #[serde(default)]
    pub max: Option<f64>,
}

impl LightRange {
    pub fn new(min: Option<f64>, max: Option<f64>) -> Self {
        Self { min, max }
    }

    pub fn is_unbounded(&self) -> bool {
        self.min.is_none() && self.max.is_none()
    }

    /// `Low` below `min`, `High` above `max`, `Ok` otherwise (edges included).
    pub fn check(&self, value: f64) -> RangeStatus {
        match (self.min, self.max) {
            (Some(min), _) if value < min => RangeStatus::Low,
            (_, Some(max)) if value > max => RangeStatus::High,
            _ => RangeStatus::Ok,
        }
    }

    fn validate(&self) -> Result<(), &'static str> {
        let bounds = [self.min, self.max];
        if bounds.iter().flatten().any(|value| !value.is_finite() || *value < 0.0) {
            return Err("bounds must be finite and >= 0");
        }
        if let (Some(min), Some(max)) = (self.min, self.max) {
            if min > max {
                return Err("expected min <= max");
            }
        }
        Ok(())
    }
}

/// PPFD (µmol·m⁻²·s⁻¹) and DLI (mol·m⁻²·day⁻¹) targets for one growth stage.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StageTarget {
    pub stage: GrowthStage,
    #[serde(default)]
    pub ppfd: LightRange,
    #[serde(default)]
    pub dli: LightRange,
}

/// Acceptable and preferred illuminance bands for one species.
///
/// Invariant: `0 <= min_lux <= preferred_min_lux <= preferred_max_lux <= max_lux`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpeciesProfile {
    pub species_key: String,
    pub min_lux: f64,
    pub max_lux: f64,
    pub preferred_min_lux: f64,
    pub preferred_max_lux: f64,
    /// Species watering cadence; `None` uses the configured default.
    #[serde(default)]
    pub water_interval_days: Option<u32>,
    #[serde(default)]
    pub fertilize_interval_days: Option<u32>,
    /// At most one entry per stage. Advisory only; the lux band decides the
    /// verdict.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub stage_targets: Vec<StageTarget>,
}

impl SpeciesProfile {
    /// The widest-band profile used when a species cannot be resolved.
    pub fn fallback() -> Self {
        Self {
            species_key: FALLBACK_SPECIES_KEY.to_string(),
            min_lux: 0.0,
            max_lux: 150_000.0,
            preferred_min_lux: 1_000.0,
            preferred_max_lux: 20_000.0,
            water_interval_days: None,
            fertilize_interval_days: None,
            stage_targets: Vec::new(),
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.species_key.trim().is_empty() {
            return Err(ValidationError::EmptySpeciesKey);
        }
        let band = [
            self.min_lux,
            self.preferred_min_lux,
            self.preferred_max_lux,
            self.max_lux,
        ];
        if band.iter().any(|value| !value.is_finite()) {
            return Err(self.band_error("bounds must be finite"));
        }
        if self.min_lux < 0.0 {
            return Err(self.band_error("min_lux must be >= 0"));
        }
        if !band.windows(2).all(|pair| pair[0] <= pair[1]) {
            return Err(self.band_error("expected min <= preferred_min <= preferred_max <= max"));
        }
        if self.water_interval_days == Some(0) || self.fertilize_interval_days == Some(0) {
            return Err(ValidationError::InvalidInterval {
                species_key: self.species_key.clone(),
            });
        }
        for (index, target) in self.stage_targets.iter().enumerate() {
            let reason = if self.stage_targets[..index]
                .iter()
                .any(|earlier| earlier.stage == target.stage)
            {
                Err("stage listed twice")
            } else {
                target.ppfd.validate().and_then(|()| target.dli.validate())
            };
            if let Err(reason) = reason {
                return Err(ValidationError::InvalidStageTarget {
                    species_key: self.species_key.clone(),
                    stage: target.stage,
                    reason,
                });
            }
        }
        Ok(())
    }

    /// Target for `stage`, if the profile defines one.
    pub fn stage_target(&self, stage: GrowthStage) -> Option<&StageTarget> {
        self.stage_targets.iter().find(|target| target.stage == stage)
    }

    /// Validation for catalog and imported entries; the fallback key is
    /// reserved.
    pub fn validate_import(&self) -> Result<(), ValidationError> {
        self.validate()?;
        if self
            .species_key
            .trim()
            .eq_ignore_ascii_case(FALLBACK_SPECIES_KEY)
        {
            return Err(ValidationError::ReservedSpeciesKey(self.species_key.clone()));
        }
        Ok(())
    }

    /// Returns whether `lux` lies inside the preferred band (inclusive).
    pub fn prefers(&self, lux: f64) -> bool {
        lux >= self.preferred_min_lux && lux <= self.preferred_max_lux
    }

    fn band_error(&self, reason: &'static str) -> ValidationError {
        ValidationError::InvalidProfileBand {
            species_key: self.species_key.clone(),
            reason,
        }
    }
}

/// Outcome of a species lookup.
///
/// `Fallback` carries the generic profile so callers can surface a
/// "generic guidance" indicator instead of presenting it as species advice.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "resolution", content = "profile", rename_all = "snake_case")]
pub enum ProfileResolution {
    Resolved(SpeciesProfile),
    Fallback(SpeciesProfile),
}

impl ProfileResolution {
    pub fn profile(&self) -> &SpeciesProfile {
        match self {
            Self::Resolved(profile) | Self::Fallback(profile) => profile,
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, Self::Fallback(_))
    }
}

#[cfg(test)]
mod tests {
    use super::{GrowthStage, LightRange, SpeciesProfile, StageTarget};
    use crate::model::verdict::RangeStatus;
    use crate::model::ValidationError;

    fn profile(min: f64, pmin: f64, pmax: f64, max: f64) -> SpeciesProfile {
        SpeciesProfile {
            species_key: "test".to_string(),
            min_lux: min,
            max_lux: max,
            preferred_min_lux: pmin,
            preferred_max_lux: pmax,
            water_interval_days: None,
            fertilize_interval_days: None,
            stage_targets: Vec::new(),
        }
    }

    fn target(stage: GrowthStage, ppfd: LightRange) -> StageTarget {
        StageTarget {
            stage,
            ppfd,
            dli: LightRange::default(),
        }
    }

    #[test]
    fn fallback_profile_is_valid() {
        assert!(SpeciesProfile::fallback().validate().is_ok());
    }

    #[test]
    fn fallback_key_cannot_be_imported() {
        let mut value = profile(200.0, 300.0, 500.0, 800.0);
        value.species_key = " Unknown ".to_string();
        assert!(value.validate().is_ok());
        assert!(matches!(
            value.validate_import(),
            Err(ValidationError::ReservedSpeciesKey(_))
        ));
        assert!(SpeciesProfile::fallback().validate_import().is_err());
    }

    #[test]
    fn unordered_band_is_rejected() {
        let err = profile(200.0, 100.0, 500.0, 800.0).validate().unwrap_err();
        assert!(matches!(err, ValidationError::InvalidProfileBand { .. }));
    }

    #[test]
    fn zero_interval_is_rejected() {
        let mut value = profile(200.0, 300.0, 500.0, 800.0);
        value.water_interval_days = Some(0);
        assert!(matches!(
            value.validate(),
            Err(ValidationError::InvalidInterval { .. })
        ));
    }

    #[test]
    fn preferred_band_is_inclusive() {
        let value = profile(200.0, 300.0, 500.0, 800.0);
        assert!(value.prefers(300.0));
        assert!(value.prefers(500.0));
        assert!(!value.prefers(501.0));
    }

    #[test]
    fn range_check_is_inclusive_and_open_ended() {
        let range = LightRange::new(Some(100.0), Some(200.0));
        assert_eq!(range.check(99.9), RangeStatus::Low);
        assert_eq!(range.check(100.0), RangeStatus::Ok);
        assert_eq!(range.check(200.0), RangeStatus::Ok);
        assert_eq!(range.check(200.1), RangeStatus::High);

        let floor_only = LightRange::new(Some(10.0), None);
        assert_eq!(floor_only.check(1_000_000.0), RangeStatus::Ok);
        assert_eq!(floor_only.check(9.0), RangeStatus::Low);
        assert_eq!(LightRange::default().check(0.0), RangeStatus::Ok);
    }

    #[test]
    fn stage_targets_are_validated() {
        let mut value = profile(200.0, 300.0, 500.0, 800.0);
        value.stage_targets = vec![
            target(GrowthStage::Seedling, LightRange::new(Some(100.0), Some(200.0))),
            target(GrowthStage::Flower, LightRange::new(Some(400.0), None)),
        ];
        assert!(value.validate().is_ok());
        assert_eq!(
            value.stage_target(GrowthStage::Flower).map(|t| t.ppfd.min),
            Some(Some(400.0))
        );
        assert!(value.stage_target(GrowthStage::Vegetative).is_none());

        value.stage_targets[1].ppfd = LightRange::new(Some(500.0), Some(400.0));
        assert!(matches!(
            value.validate(),
            Err(ValidationError::InvalidStageTarget {
                stage: GrowthStage::Flower,
                ..
            })
        ));

        value.stage_targets[1] = target(GrowthStage::Seedling, LightRange::default());
        assert!(matches!(
            value.validate(),
            Err(ValidationError::InvalidStageTarget {
                reason: "stage listed twice",
                ..
            })
        ));
    }

    #[test]
    fn growth_stage_text_mapping() {
        for stage in GrowthStage::ALL {
            assert_eq!(GrowthStage::parse(stage.as_str()), Some(stage));
        }
        assert_eq!(GrowthStage::parse(" Flower "), Some(GrowthStage::Flower));
        assert_eq!(GrowthStage::parse("fruiting"), None);
        assert_eq!(GrowthStage::default(), GrowthStage::Vegetative);
    }
}
