//! Data model for joulemeter: per-component activity samples, the ticks
//! that batch them, and the power readings calculators produce.
//!
//! Hosts serialize [`Tick`]s as JSON, one per line:
//!
//! ```
//! use joulemeter_model::{ComponentSample, Tick};
//!
//! let line = r#"{"timestamp":"2024-01-01T00:00:00Z","interval_ms":1000,
//!     "samples":[{"component":"lcd","brightness":0.5}]}"#;
//! let tick: Tick = serde_json::from_str(line).unwrap();
//! assert!(matches!(tick.samples[0], ComponentSample::Lcd(_)));
//! ```

mod types;
mod validate;
mod version;

pub use types::{
    AudioSample, ComponentKind, ComponentSample, CoreSample, CpuSample, GpsSample, GpsState,
    LcdSample, LinkState, OledSample, PixelStats, PowerReading, RadioSample, SensorSample, Tick,
};
pub use validate::SampleError;
pub use version::{is_supported_format, CALIBRATION_FORMAT_VERSION, MIN_SUPPORTED_FORMAT_VERSION};
