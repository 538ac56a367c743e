use std::path::PathBuf;

use joulemeter_model::{ComponentKind, SampleError};
use thiserror::Error;

/// Problems with a calibration file or model. Always fatal to session
/// construction: estimating with missing coefficients would silently
/// report zero power.
#[derive(Debug, Error)]
pub enum CalibrationError {
    #[error("failed to read calibration {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid calibration file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("failed to encode calibration: {0}")]
    Encode(#[from] toml::ser::Error),

    #[error("calibration format version {found} is not supported (expected {min}..={max})")]
    UnsupportedVersion { found: u32, min: u32, max: u32 },

    #[error("{component} coefficient {field} = {value} must be finite and non-negative")]
    InvalidCoefficient {
        component: ComponentKind,
        field: &'static str,
        value: f64,
    },

    #[error("CPU frequency steps must be strictly ascending (step {index})")]
    UnsortedFrequencySteps { index: usize },
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid sample: {0}")]
    InvalidSample(#[from] SampleError),

    #[error("invalid interval: {interval_ms} ms (must be positive)")]
    InvalidInterval { interval_ms: i64 },

    #[error("session is not running")]
    NotRunning,

    #[error("calibration error: {0}")]
    Calibration(#[from] CalibrationError),

    #[error("ingest queue is closed")]
    QueueClosed,
}

pub type Result<T> = std::result::Result<T, Error>;
