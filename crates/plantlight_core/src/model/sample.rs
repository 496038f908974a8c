//! Light sample and raw reading models.

use super::ValidationError;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type SampleId = Uuid;

/// Where an illuminance value came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MeasurementSource {
    /// Ambient light sensor, already in lux.
    Sensor,
    /// Estimated from camera exposure parameters.
    ImageEstimate,
}

impl MeasurementSource {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Sensor => "sensor",
            Self::ImageEstimate => "image_estimate",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "sensor" => Some(Self::Sensor),
            "image_estimate" => Some(Self::ImageEstimate),
            _ => None,
        }
    }
}

/// Raw observation supplied by the sensor or camera collaborator.
///
/// Exposure fields are optional because camera metadata can be partial;
/// the sampler rejects incomplete triplets.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RawReading {
    Sensor {
        lux: f64,
    },
    Exposure {
        iso: Option<f64>,
        shutter_seconds: Option<f64>,
        aperture: Option<f64>,
    },
}

/// One normalized illuminance observation for a plant. Immutable once stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LightSample {
    pub id: SampleId,
    /// Unix epoch milliseconds.
    pub measured_at: i64,
    /// Lux-equivalent illuminance.
    pub lux: f64,
    pub source: MeasurementSource,
    pub note: Option<String>,
}

impl LightSample {
    pub fn new(measured_at: i64, lux: f64, source: MeasurementSource) -> Self {
        Self {
            id: Uuid::new_v4(),
            measured_at,
            lux,
            source,
            note: None,
        }
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        let note = note.into();
        let trimmed = note.trim();
        self.note = if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        };
        self
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if !self.lux.is_finite() || self.lux < 0.0 {
            return Err(ValidationError::InvalidLux(self.lux));
        }
        Ok(())
    }
}

/// Statistics over the samples of one plant inside a time window.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LightAggregate {
    pub sample_count: u32,
    pub mean_lux: f64,
    pub min_lux: f64,
    pub max_lux: f64,
    /// Inclusive window bounds in epoch milliseconds.
    pub window_start: i64,
    pub window_end: i64,
}

impl LightAggregate {
    /// Aggregates `samples`; returns `None` for an empty slice.
    ///
    /// Fails when the slice holds more samples than `sample_count` can carry.
    pub fn from_samples(
        samples: &[LightSample],
        window_start: i64,
        window_end: i64,
    ) -> Result<Option<Self>, ValidationError> {
        if samples.is_empty() {
            return Ok(None);
        }
        let sample_count = sample_count(samples.len())?;
        let mut sum = 0.0;
        let mut min_lux = f64::INFINITY;
        let mut max_lux = f64::NEG_INFINITY;
        for sample in samples {
            sum += sample.lux;
            min_lux = min_lux.min(sample.lux);
            max_lux = max_lux.max(sample.lux);
        }
        Ok(Some(Self {
            sample_count,
            mean_lux: sum / f64::from(sample_count),
            min_lux,
            max_lux,
            window_start,
            window_end,
        }))
    }
}

fn sample_count(len: usize) -> Result<u32, ValidationError> {
    u32::try_from(len).map_err(|_| ValidationError::SampleCountOverflow(len))
}
