//! Device calibration: the coefficients each component's power model uses.
//!
//! A calibration is loaded once per device and shared read-only between
//! sessions, usually behind an `Arc`. Files are TOML:
//!
//! ```toml
//! format_version = 2
//! device = "reference-handset"
//!
//! [cpu]
//! intercept = 0.1
//! utilization = 0.4
//!
//! [lcd]
//! intercept = 0.155
//! brightness = 0.612
//! # ... one table per component
//! ```

use std::fs;
use std::path::Path;

use joulemeter_model::{
    is_supported_format, ComponentKind, GpsState, LinkState, CALIBRATION_FORMAT_VERSION,
    MIN_SUPPORTED_FORMAT_VERSION,
};
use serde::{Deserialize, Serialize};

use crate::error::CalibrationError;

type Result<T> = std::result::Result<T, CalibrationError>;

fn default_device() -> String {
    "generic".to_string()
}

/// CPU weight that applies from `frequency_hz` upward.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FrequencyStep {
    pub frequency_hz: u64,
    pub weight: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CpuCoefficients {
    pub intercept: f64,
    /// Watts per fully busy core, used when no frequency steps are given.
    pub utilization: f64,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub frequency_steps: Vec<FrequencyStep>,
}

impl CpuCoefficients {
    /// Weight of the highest step at or below `frequency_hz`. Frequencies
    /// under the lowest step use the lowest step.
    pub fn weight_for(&self, frequency_hz: u64) -> f64 {
        let Some(first) = self.frequency_steps.first() else {
            return self.utilization;
        };
        self.frequency_steps
            .iter()
            .take_while(|step| step.frequency_hz <= frequency_hz)
            .last()
            .unwrap_or(first)
            .weight
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LcdCoefficients {
    pub intercept: f64,
    pub brightness: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OledCoefficients {
    pub intercept: f64,
    pub brightness: f64,
    #[serde(default)]
    pub red: f64,
    #[serde(default)]
    pub green: f64,
    #[serde(default)]
    pub blue: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AudioCoefficients {
    pub intercept: f64,
    pub volume: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GpsCoefficients {
    pub off: f64,
    pub sleep: f64,
    pub active: f64,
    /// Watts per fix/second.
    pub fix_rate: f64,
}

impl GpsCoefficients {
    pub fn state_watts(&self, state: GpsState) -> f64 {
        match state {
            GpsState::Off => self.off,
            GpsState::Sleep => self.sleep,
            GpsState::Active => self.active,
        }
    }
}

/// Per-state draw for a radio plus a per-byte transfer term.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RadioCoefficients {
    pub idle: f64,
    pub low_power: f64,
    pub active: f64,
    pub high_power: f64,
    pub per_byte: f64,
}

impl RadioCoefficients {
    pub fn state_watts(&self, state: LinkState) -> f64 {
        match state {
            LinkState::Idle => self.idle,
            LinkState::LowPower => self.low_power,
            LinkState::Active => self.active,
            LinkState::HighPower => self.high_power,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SensorCoefficients {
    pub intercept: f64,
    pub per_sensor: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalibrationModel {
    pub format_version: u32,
    #[serde(default = "default_device")]
    pub device: String,
    pub cpu: CpuCoefficients,
    pub lcd: LcdCoefficients,
    pub oled: OledCoefficients,
    pub audio: AudioCoefficients,
    pub gps: GpsCoefficients,
    pub wifi: RadioCoefficients,
    pub cellular: RadioCoefficients,
    pub sensors: SensorCoefficients,
}

impl CalibrationModel {
    /// Reference handset profile, used when no calibration file is configured.
    pub fn builtin() -> Self {
        Self {
            format_version: CALIBRATION_FORMAT_VERSION,
            device: "reference-handset".to_string(),
            cpu: CpuCoefficients {
                intercept: 0.02,
                utilization: 0.4,
                frequency_steps: vec![
                    FrequencyStep {
                        frequency_hz: 245_760_000,
                        weight: 0.342,
                    },
                    FrequencyStep {
                        frequency_hz: 384_000_000,
                        weight: 0.434,
                    },
                    FrequencyStep {
                        frequency_hz: 614_400_000,
                        weight: 0.55,
                    },
                    FrequencyStep {
                        frequency_hz: 1_000_000_000,
                        weight: 0.74,
                    },
                    FrequencyStep {
                        frequency_hz: 1_200_000_000,
                        weight: 0.86,
                    },
                ],
            },
            lcd: LcdCoefficients {
                intercept: 0.155,
                brightness: 0.612,
            },
            oled: OledCoefficients {
                intercept: 0.104,
                brightness: 0.05,
                red: 0.32,
                green: 0.44,
                blue: 0.68,
            },
            audio: AudioCoefficients {
                intercept: 0.384,
                volume: 0.05,
            },
            gps: GpsCoefficients {
                off: 0.0,
                sleep: 0.0173,
                active: 0.4292,
                fix_rate: 0.01,
            },
            wifi: RadioCoefficients {
                idle: 0.02,
                low_power: 0.038,
                active: 0.4,
                high_power: 0.72,
                per_byte: 1.0e-7,
            },
            cellular: RadioCoefficients {
                idle: 0.01,
                low_power: 0.401,
                active: 0.57,
                high_power: 0.75,
                per_byte: 2.0e-7,
            },
            sensors: SensorCoefficients {
                intercept: 0.0,
                per_sensor: 0.015,
            },
        }
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let model: Self = toml::from_str(content)?;
        model.validate()?;
        Ok(model)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|source| CalibrationError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    pub fn to_toml_string(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Rejects unsupported versions, negative or non-finite coefficients,
    /// and unordered CPU frequency steps. Every component model here is
    /// monotonic, so no coefficient may be negative.
    pub fn validate(&self) -> Result<()> {
        if !is_supported_format(self.format_version) {
            return Err(CalibrationError::UnsupportedVersion {
                found: self.format_version,
                min: MIN_SUPPORTED_FORMAT_VERSION,
                max: CALIBRATION_FORMAT_VERSION,
            });
        }

        for (component, field, value) in self.coefficients() {
            if !value.is_finite() || value < 0.0 {
                return Err(CalibrationError::InvalidCoefficient {
                    component,
                    field,
                    value,
                });
            }
        }

        for (index, pair) in self.cpu.frequency_steps.windows(2).enumerate() {
            if pair[1].frequency_hz <= pair[0].frequency_hz {
                return Err(CalibrationError::UnsortedFrequencySteps { index: index + 1 });
            }
        }

        Ok(())
    }

    fn coefficients(&self) -> Vec<(ComponentKind, &'static str, f64)> {
        use ComponentKind::*;

        let mut all = vec![
            (Cpu, "intercept", self.cpu.intercept),
            (Cpu, "utilization", self.cpu.utilization),
            (Lcd, "intercept", self.lcd.intercept),
            (Lcd, "brightness", self.lcd.brightness),
            (Oled, "intercept", self.oled.intercept),
            (Oled, "brightness", self.oled.brightness),
            (Oled, "red", self.oled.red),
            (Oled, "green", self.oled.green),
            (Oled, "blue", self.oled.blue),
            (Audio, "intercept", self.audio.intercept),
            (Audio, "volume", self.audio.volume),
            (Gps, "off", self.gps.off),
            (Gps, "sleep", self.gps.sleep),
            (Gps, "active", self.gps.active),
            (Gps, "fix_rate", self.gps.fix_rate),
            (Sensors, "intercept", self.sensors.intercept),
            (Sensors, "per_sensor", self.sensors.per_sensor),
        ];
        for (kind, radio) in [(Wifi, &self.wifi), (Cellular, &self.cellular)] {
            all.extend([
                (kind, "idle", radio.idle),
                (kind, "low_power", radio.low_power),
                (kind, "active", radio.active),
                (kind, "high_power", radio.high_power),
                (kind, "per_byte", radio.per_byte),
            ]);
        }
        all.extend(
            self.cpu
                .frequency_steps
                .iter()
                .map(|step| (Cpu, "frequency_steps.weight", step.weight)),
        );
        all
    }
}

impl Default for CalibrationModel {
    fn default() -> Self {
        Self::builtin()
    }
}
