//! Measurement sampler and light unit conversions.
//!
//! # Responsibility
//! - Turn raw sensor or camera exposure readings into normalized samples.
//! - Convert between lux, PPFD and DLI.
//!
//! # Invariants
//! - Sampling is a pure transform; nothing here touches storage.
//! - Sensor lux must be finite and non-negative.
//! - Exposure estimates require ISO, shutter time and aperture, all > 0.

use crate::model::sample::{LightSample, MeasurementSource, RawReading};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Incident-light meter calibration constant `C` (lux·s per ISO).
pub const INCIDENT_CALIBRATION_CONSTANT: f64 = 250.0;

/// Seconds per hour divided by µmol per mol.
const DLI_FACTOR: f64 = 0.0036;

#[derive(Debug, Clone, PartialEq)]
pub enum SampleError {
    InvalidMeasurementInput(String),
}

impl Display for SampleError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidMeasurementInput(reason) => {
                write!(f, "invalid measurement input: {reason}")
            }
        }
    }
}

impl Error for SampleError {}

/// Normalizes one raw reading into a sample taken at `measured_at`.
pub fn sample(raw: &RawReading, measured_at: i64) -> Result<LightSample, SampleError> {
    match *raw {
        RawReading::Sensor { lux } => {
            if !lux.is_finite() || lux < 0.0 {
                return Err(SampleError::InvalidMeasurementInput(format!(
                    "sensor lux must be finite and >= 0, got {lux}"
                )));
            }
            Ok(LightSample::new(measured_at, lux, MeasurementSource::Sensor))
        }
        RawReading::Exposure {
            iso,
            shutter_seconds,
            aperture,
        } => {
            let iso = require_positive("iso", iso)?;
            let shutter_seconds = require_positive("shutter_seconds", shutter_seconds)?;
            let aperture = require_positive("aperture", aperture)?;
            let lux = lux_from_exposure(iso, shutter_seconds, aperture);
            if !lux.is_finite() {
                return Err(SampleError::InvalidMeasurementInput(
                    "exposure estimate is not finite".to_string(),
                ));
            }
            Ok(LightSample::new(
                measured_at,
                lux,
                MeasurementSource::ImageEstimate,
            ))
        }
    }
}

/// Estimates illuminance from camera exposure: `E = C * N^2 / (t * ISO)`.
pub fn lux_from_exposure(iso: f64, shutter_seconds: f64, aperture: f64) -> f64 {
    INCIDENT_CALIBRATION_CONSTANT * aperture * aperture / (shutter_seconds * iso)
}

/// Converts lux to PPFD (µmol·m⁻²·s⁻¹) with calibration factor `k`.
pub fn ppfd_from_lux(lux: f64, k: f64) -> f64 {
    lux * k
}

/// Daily light integral (mol·m⁻²·day⁻¹) for `hours` of light at `ppfd`.
pub fn dli_from_ppfd(ppfd: f64, hours: f64) -> f64 {
    ppfd * hours * DLI_FACTOR
}

fn require_positive(field: &'static str, value: Option<f64>) -> Result<f64, SampleError> {
    match value {
        None => Err(SampleError::InvalidMeasurementInput(format!(
            "exposure reading is missing `{field}`"
        ))),
        Some(value) if !value.is_finite() || value <= 0.0 => Err(
            SampleError::InvalidMeasurementInput(format!("`{field}` must be > 0, got {value}")),
        ),
        Some(value) => Ok(value),
    }
}

#[cfg(test)]
mod tests {
    use super::{dli_from_ppfd, lux_from_exposure, ppfd_from_lux, sample, SampleError};
    use crate::model::sample::{MeasurementSource, RawReading};

    #[test]
    fn sensor_reading_passes_through() {
        let result = sample(&RawReading::Sensor { lux: 420.5 }, 1_000).unwrap();
        assert_eq!(result.lux, 420.5);
        assert_eq!(result.measured_at, 1_000);
        assert_eq!(result.source, MeasurementSource::Sensor);
    }

    #[test]
    fn negative_or_nan_sensor_lux_is_rejected() {
        for lux in [-1.0, f64::NAN, f64::INFINITY] {
            let err = sample(&RawReading::Sensor { lux }, 0).unwrap_err();
            assert!(matches!(err, SampleError::InvalidMeasurementInput(_)));
        }
    }

    #[test]
    fn zero_sensor_lux_is_accepted() {
        assert_eq!(sample(&RawReading::Sensor { lux: 0.0 }, 0).unwrap().lux, 0.0);
    }

    #[test]
    fn exposure_triplet_is_converted() {
        // f/4, 1/100 s, ISO 100 => 250 * 16 / (0.01 * 100) = 4000 lux.
        let reading = RawReading::Exposure {
            iso: Some(100.0),
            shutter_seconds: Some(0.01),
            aperture: Some(4.0),
        };
        let result = sample(&reading, 5).unwrap();
        assert!((result.lux - 4_000.0).abs() < 1e-9);
        assert_eq!(result.source, MeasurementSource::ImageEstimate);
    }

    #[test]
    fn incomplete_exposure_is_rejected() {
        let reading = RawReading::Exposure {
            iso: Some(200.0),
            shutter_seconds: None,
            aperture: Some(2.8),
        };
        let err = sample(&reading, 0).unwrap_err();
        assert!(err.to_string().contains("shutter_seconds"));
    }

    #[test]
    fn zero_exposure_parameter_is_rejected() {
        let reading = RawReading::Exposure {
            iso: Some(0.0),
            shutter_seconds: Some(0.5),
            aperture: Some(2.8),
        };
        assert!(sample(&reading, 0).is_err());
    }

    #[test]
    fn light_math_matches_reference_values() {
        assert!((lux_from_exposure(100.0, 1.0, 1.0) - 2.5).abs() < 1e-12);
        assert!((ppfd_from_lux(1_000.0, 0.0185) - 18.5).abs() < 1e-9);
        // 100 µmol for 12 h => 4.32 mol/day.
        assert!((dli_from_ppfd(100.0, 12.0) - 4.32).abs() < 1e-9);
    }
}
