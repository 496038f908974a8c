//! Species profile registry.
//!
//! # Responsibility
//! - Resolve a plant's species key to exactly one light band profile.
//! - Tag fallback resolutions so callers can show generic guidance.
//!
//! # Invariants
//! - Keys are normalized (trimmed, lowercase, separators as `_`).
//! - Stored (imported) profiles override the built-in catalog.
//! - Unknown or missing keys resolve to [`SpeciesProfile::fallback`].

use crate::model::species::{ProfileResolution, SpeciesProfile};
use crate::model::ValidationError;
use crate::repo::{RepoResult, SpeciesRepository};
use log::{debug, info};
use once_cell::sync::Lazy;
use std::collections::BTreeMap;

static BUILTIN_CATALOG: Lazy<Vec<SpeciesProfile>> = Lazy::new(|| {
    serde_json::from_str(include_str!("catalog.json")).expect("valid built-in species catalog")
});

/// Read-only species key to profile mapping.
#[derive(Debug, Clone)]
pub struct SpeciesRegistry {
    profiles: BTreeMap<String, SpeciesProfile>,
    fallback: SpeciesProfile,
}

impl Default for SpeciesRegistry {
    fn default() -> Self {
        Self {
            profiles: BTreeMap::new(),
            fallback: SpeciesProfile::fallback(),
        }
    }
}

impl SpeciesRegistry {
    /// Builds a registry from explicit profiles. Later duplicates win.
    pub fn from_profiles(
        profiles: impl IntoIterator<Item = SpeciesProfile>,
    ) -> Result<Self, ValidationError> {
        let mut registry = Self::default();
        for profile in profiles {
            registry.insert(profile)?;
        }
        Ok(registry)
    }

    /// Registry holding the built-in catalog only.
    pub fn builtin() -> Self {
        let mut registry = Self::default();
        for profile in BUILTIN_CATALOG.iter() {
            if let Some(key) = normalize_species_key(&profile.species_key) {
                registry.profiles.insert(
                    key.clone(),
                    SpeciesProfile {
                        species_key: key,
                        ..profile.clone()
                    },
                );
            }
        }
        registry
    }

    /// Built-in catalog overlaid with profiles imported into `repo`.
    pub fn load(repo: &impl SpeciesRepository) -> RepoResult<Self> {
        let mut registry = Self::builtin();
        let stored = repo.list_species_profiles()?;
        let stored_count = stored.len();
        for profile in stored {
            registry.insert(profile)?;
        }
        info!(
            "event=species_registry_load module=species status=ok builtin={} stored={} total={}",
            BUILTIN_CATALOG.len(),
            stored_count,
            registry.len()
        );
        Ok(registry)
    }

    /// Validates and inserts one profile under its normalized key.
    pub fn insert(&mut self, profile: SpeciesProfile) -> Result<(), ValidationError> {
        let key =
            normalize_species_key(&profile.species_key).ok_or(ValidationError::EmptySpeciesKey)?;
        let profile = SpeciesProfile {
            species_key: key.clone(),
            ..profile
        };
        profile.validate_import()?;
        self.profiles.insert(key, profile);
        Ok(())
    }

    /// Resolves `species_key`, falling back to the generic wide band.
    pub fn lookup(&self, species_key: Option<&str>) -> ProfileResolution {
        let normalized = species_key.and_then(normalize_species_key);
        if let Some(profile) = normalized.as_ref().and_then(|key| self.profiles.get(key)) {
            return ProfileResolution::Resolved(profile.clone());
        }

        debug!(
            "event=species_lookup module=species status=fallback species_key={}",
            normalized.as_deref().unwrap_or("none")
        );
        ProfileResolution::Fallback(self.fallback.clone())
    }

    pub fn contains(&self, species_key: &str) -> bool {
        normalize_species_key(species_key).is_some_and(|key| self.profiles.contains_key(&key))
    }

    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }

    /// Sorted species keys.
    pub fn species_keys(&self) -> Vec<String> {
        self.profiles.keys().cloned().collect()
    }
}

/// Normalizes user or catalog input into a registry key.
///
/// Returns `None` for blank input.
pub fn normalize_species_key(raw: &str) -> Option<String> {
    let normalized = raw
        .trim()
        .to_lowercase()
        .split(|c: char| c.is_whitespace() || c == '-')
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("_");
    if normalized.is_empty() {
        None
    } else {
        Some(normalized)
    }
}

#[cfg(test)]
mod tests {
    use super::{normalize_species_key, SpeciesRegistry, BUILTIN_CATALOG};
    use crate::model::species::{GrowthStage, LightRange, SpeciesProfile, FALLBACK_SPECIES_KEY};
    use crate::model::ValidationError;
    use crate::repo::{MemoryStore, RepoError, SpeciesRepository};

    fn band(key: &str, min: f64, max: f64) -> SpeciesProfile {
        SpeciesProfile {
            species_key: key.to_string(),
            min_lux: min,
            max_lux: max,
            preferred_min_lux: min,
            preferred_max_lux: max,
            water_interval_days: None,
            fertilize_interval_days: None,
            stage_targets: Vec::new(),
        }
    }

    #[test]
    fn builtin_catalog_is_valid() {
        assert!(!BUILTIN_CATALOG.is_empty());
        for profile in BUILTIN_CATALOG.iter() {
            profile.validate_import().unwrap();
        }
        assert_eq!(SpeciesRegistry::builtin().len(), BUILTIN_CATALOG.len());
    }

    #[test]
    fn builtin_catalog_carries_stage_targets() {
        let registry = SpeciesRegistry::builtin();
        let basil = registry.lookup(Some("ocimum_basilicum"));
        let vegetative = basil
            .profile()
            .stage_target(GrowthStage::Vegetative)
            .unwrap();
        assert_eq!(vegetative.ppfd, LightRange::new(Some(200.0), Some(400.0)));
        assert!(registry
            .lookup(Some("calathea_orbifolia"))
            .profile()
            .stage_targets
            .is_empty());
    }

    #[test]
    fn keys_are_normalized() {
        assert_eq!(
            normalize_species_key("  Monstera Deliciosa "),
            Some("monstera_deliciosa".to_string())
        );
        assert_eq!(normalize_species_key("ficus-lyrata"), Some("ficus_lyrata".to_string()));
        assert_eq!(normalize_species_key("   "), None);
    }

    #[test]
    fn known_species_resolves_and_unknown_falls_back() {
        let registry = SpeciesRegistry::builtin();
        let resolved = registry.lookup(Some("Monstera deliciosa"));
        assert!(!resolved.is_fallback());
        assert_eq!(resolved.profile().species_key, "monstera_deliciosa");

        let fallback = registry.lookup(Some("triffid"));
        assert!(fallback.is_fallback());
        assert_eq!(fallback.profile().species_key, FALLBACK_SPECIES_KEY);
        assert!(registry.lookup(None).is_fallback());
    }

    #[test]
    fn stored_profiles_override_builtin() {
        let store = MemoryStore::new();
        store
            .upsert_species_profile(&band("monstera_deliciosa", 10.0, 20.0))
            .unwrap();
        store.upsert_species_profile(&band("pilea", 300.0, 900.0)).unwrap();

        let registry = SpeciesRegistry::load(&store).unwrap();
        assert_eq!(
            registry.lookup(Some("monstera_deliciosa")).profile().min_lux,
            10.0
        );
        assert!(registry.contains("Pilea"));
    }

    #[test]
    fn fallback_key_is_not_a_registry_entry() {
        let mut registry = SpeciesRegistry::builtin();
        let err = registry
            .insert(band(FALLBACK_SPECIES_KEY, 10.0, 20.0))
            .unwrap_err();
        assert!(matches!(err, ValidationError::ReservedSpeciesKey(_)));
        assert!(registry.lookup(Some("Unknown")).is_fallback());

        let store = MemoryStore::new();
        assert!(matches!(
            store.upsert_species_profile(&band("unknown", 10.0, 20.0)),
            Err(RepoError::Validation(ValidationError::ReservedSpeciesKey(_)))
        ));
    }

    #[test]
    fn invalid_profile_is_rejected() {
        let err = SpeciesRegistry::from_profiles([band("bad", 500.0, 100.0)]).unwrap_err();
        assert!(err.to_string().contains("bad"));
    }
}
