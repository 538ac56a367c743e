//! Per-component power calculators.
//!
//! Every calculator is a pure linear model over one sample variant:
//! `watts = intercept + Σ weight_i · feature_i`, clamped at zero. Radios and
//! GPS replace the intercept with a per-state lookup.
//!
//! Dispatch goes through [`ComponentSample`]: adding a component means adding
//! a variant and a [`PowerModel`] impl, not widening an interface.

mod audio;
mod cpu;
mod display;
mod gps;
mod radio;
mod sensors;

use chrono::{DateTime, Utc};
use joulemeter_model::{ComponentSample, PowerReading, SampleError};

use crate::calibration::CalibrationModel;
use crate::error::Result;

/// Power model for one sample type.
///
/// Implementations may assume the sample already passed
/// [`ComponentSample::validate`].
pub trait PowerModel {
    type Coefficients;

    fn watts(&self, coefficients: &Self::Coefficients) -> f64;
}

/// Instantaneous draw in watts for one sample. Never negative.
pub fn estimate(sample: &ComponentSample, calibration: &CalibrationModel) -> Result<f64> {
    sample.validate()?;
    Ok(model_watts(sample, calibration))
}

fn model_watts(sample: &ComponentSample, calibration: &CalibrationModel) -> f64 {
    let watts = match sample {
        ComponentSample::Cpu(s) => s.watts(&calibration.cpu),
        ComponentSample::Lcd(s) => s.watts(&calibration.lcd),
        ComponentSample::Oled(s) => s.watts(&calibration.oled),
        ComponentSample::Audio(s) => s.watts(&calibration.audio),
        ComponentSample::Gps(s) => s.watts(&calibration.gps),
        ComponentSample::Wifi(s) => s.watts(&calibration.wifi),
        ComponentSample::Cellular(s) => s.watts(&calibration.cellular),
        ComponentSample::Sensors(s) => s.watts(&calibration.sensors),
    };

    watts.max(0.0)
}

/// Readings for every valid sample in a batch, plus the errors of the
/// samples that were skipped.
pub fn estimate_batch(
    samples: &[ComponentSample],
    calibration: &CalibrationModel,
    timestamp: DateTime<Utc>,
) -> (Vec<PowerReading>, Vec<SampleError>) {
    let mut readings = Vec::with_capacity(samples.len());
    let mut skipped = Vec::new();

    for sample in samples {
        match sample.validate() {
            Ok(()) => readings.push(PowerReading::new(
                sample.kind(),
                model_watts(sample, calibration),
                timestamp,
            )),
            Err(e) => skipped.push(e),
        }
    }

    (readings, skipped)
}
