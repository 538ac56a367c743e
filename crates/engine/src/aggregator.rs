//! Sums per-component readings into total draw and integrates it over a tick.

use chrono::TimeDelta;
use joulemeter_model::PowerReading;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// How energy is integrated across a tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Integration {
    /// Draw is held constant over the tick.
    #[default]
    Constant,
    /// Average of the previous and current tick's draw.
    Trapezoidal,
}

impl Integration {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "constant" => Some(Integration::Constant),
            "trapezoidal" | "trapezoid" => Some(Integration::Trapezoidal),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Integration::Constant => "constant",
            Integration::Trapezoidal => "trapezoidal",
        }
    }
}

/// Result of aggregating one tick.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Aggregate {
    pub total_watts: f64,
    pub delta_joules: f64,
}

fn interval_seconds(interval: TimeDelta) -> Result<f64> {
    let invalid = || Error::InvalidInterval {
        interval_ms: interval.num_milliseconds(),
    };
    if interval <= TimeDelta::zero() {
        return Err(invalid());
    }
    interval
        .to_std()
        .map(|d| d.as_secs_f64())
        .map_err(|_| invalid())
}

/// Total draw of a batch of readings.
///
/// Watts are summed in ascending order so that any permutation of the same
/// readings produces a bit-identical total.
pub fn total_watts(readings: &[PowerReading]) -> f64 {
    let mut watts: Vec<f64> = readings.iter().map(|r| r.watts.max(0.0)).collect();
    watts.sort_by(f64::total_cmp);
    watts.into_iter().sum()
}

/// Sums the readings and converts to energy over `interval`, holding the
/// draw constant. Components without a reading contribute nothing.
pub fn aggregate(readings: &[PowerReading], interval: TimeDelta) -> Result<Aggregate> {
    let seconds = interval_seconds(interval)?;
    let total_watts = total_watts(readings);
    Ok(Aggregate {
        total_watts,
        delta_joules: total_watts * seconds,
    })
}

/// Like [`aggregate`], but integrates with `mode`. `previous_watts` is the
/// prior tick's total; without one, trapezoidal integration falls back to
/// constant.
pub fn aggregate_with(
    readings: &[PowerReading],
    interval: TimeDelta,
    mode: Integration,
    previous_watts: Option<f64>,
) -> Result<Aggregate> {
    let seconds = interval_seconds(interval)?;
    let total_watts = total_watts(readings);
    let mean_watts = match (mode, previous_watts) {
        (Integration::Trapezoidal, Some(previous)) => (previous.max(0.0) + total_watts) / 2.0,
        _ => total_watts,
    };
    Ok(Aggregate {
        total_watts,
        delta_joules: mean_watts * seconds,
    })
}
