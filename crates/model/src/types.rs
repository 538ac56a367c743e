use std::fmt;

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

/// Hardware component that draws power.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum ComponentKind {
    Cpu,
    Lcd,
    Oled,
    Audio,
    Gps,
    Wifi,
    Cellular,
    Sensors,
}

impl ComponentKind {
    /// Every component, in display order.
    pub const ALL: [ComponentKind; 8] = [
        ComponentKind::Cpu,
        ComponentKind::Lcd,
        ComponentKind::Oled,
        ComponentKind::Audio,
        ComponentKind::Gps,
        ComponentKind::Wifi,
        ComponentKind::Cellular,
        ComponentKind::Sensors,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            ComponentKind::Cpu => "CPU",
            ComponentKind::Lcd => "LCD",
            ComponentKind::Oled => "OLED",
            ComponentKind::Audio => "Audio",
            ComponentKind::Gps => "GPS",
            ComponentKind::Wifi => "Wi-Fi",
            ComponentKind::Cellular => "Cellular",
            ComponentKind::Sensors => "Sensors",
        }
    }
}

impl fmt::Display for ComponentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Radio link state. Radio power is dominated by which state the
/// interface sits in, not by how much data moves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum LinkState {
    #[default]
    Idle,
    LowPower,
    Active,
    HighPower,
}

impl LinkState {
    pub fn label(&self) -> &'static str {
        match self {
            LinkState::Idle => "Idle",
            LinkState::LowPower => "Low Power",
            LinkState::Active => "Active",
            LinkState::HighPower => "High Power",
        }
    }
}

/// GPS receiver state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum GpsState {
    #[default]
    Off,
    /// Powered but not acquiring fixes
    Sleep,
    /// Acquiring or tracking fixes
    Active,
}

impl GpsState {
    pub fn label(&self) -> &'static str {
        match self {
            GpsState::Off => "Off",
            GpsState::Sleep => "Sleep",
            GpsState::Active => "Active",
        }
    }
}

fn default_screen_on() -> bool {
    true
}

/// Activity of one CPU core over a tick.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CoreSample {
    pub frequency_hz: u64,
    /// Fraction of the tick the core was busy, in [0, 1].
    pub utilization: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct CpuSample {
    #[serde(default)]
    pub cores: Vec<CoreSample>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LcdSample {
    pub brightness: f64,
    #[serde(default = "default_screen_on")]
    pub screen_on: bool,
}

/// Mean channel intensities across the visible frame, each in [0, 1].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct PixelStats {
    pub red: f64,
    pub green: f64,
    pub blue: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OledSample {
    pub brightness: f64,
    #[serde(default = "default_screen_on")]
    pub screen_on: bool,
    /// Required: OLED draw depends on what is on screen.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pixels: Option<PixelStats>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct AudioSample {
    pub active: bool,
    #[serde(default)]
    pub volume: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct GpsSample {
    pub state: GpsState,
    /// Position fixes per second.
    #[serde(default)]
    pub fix_rate_hz: f64,
}

/// Shared by Wi-Fi and cellular radios.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct RadioSample {
    pub link_state: LinkState,
    #[serde(default)]
    pub bytes_transferred: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct SensorSample {
    pub active_sensors: u32,
}

/// One component's activity over one tick.
///
/// Serialized with a `component` tag, e.g.
/// `{"component":"lcd","brightness":0.5}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "component", rename_all = "snake_case")]
pub enum ComponentSample {
    Cpu(CpuSample),
    Lcd(LcdSample),
    Oled(OledSample),
    Audio(AudioSample),
    Gps(GpsSample),
    Wifi(RadioSample),
    Cellular(RadioSample),
    Sensors(SensorSample),
}

impl ComponentSample {
    pub fn kind(&self) -> ComponentKind {
        match self {
            ComponentSample::Cpu(_) => ComponentKind::Cpu,
            ComponentSample::Lcd(_) => ComponentKind::Lcd,
            ComponentSample::Oled(_) => ComponentKind::Oled,
            ComponentSample::Audio(_) => ComponentKind::Audio,
            ComponentSample::Gps(_) => ComponentKind::Gps,
            ComponentSample::Wifi(_) => ComponentKind::Wifi,
            ComponentSample::Cellular(_) => ComponentKind::Cellular,
            ComponentSample::Sensors(_) => ComponentKind::Sensors,
        }
    }
}

/// Instantaneous draw of one component, produced once per sample.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PowerReading {
    pub component: ComponentKind,
    pub watts: f64,
    pub timestamp: DateTime<Utc>,
}

impl PowerReading {
    /// Negative or NaN draw is recorded as zero.
    pub fn new(component: ComponentKind, watts: f64, timestamp: DateTime<Utc>) -> Self {
        Self {
            component,
            watts: watts.max(0.0),
            timestamp,
        }
    }
}

/// A batch of samples covering one measurement interval.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tick {
    pub timestamp: DateTime<Utc>,
    /// Signed so that a bad host interval can be carried and rejected.
    pub interval_ms: i64,
    #[serde(default)]
    pub samples: Vec<ComponentSample>,
}

impl Tick {
    pub fn new(timestamp: DateTime<Utc>, interval: TimeDelta, samples: Vec<ComponentSample>) -> Self {
        Self {
            timestamp,
            interval_ms: interval.num_milliseconds(),
            samples,
        }
    }

    /// The tick length, or `None` when `interval_ms` lies outside what a
    /// `TimeDelta` can hold.
    pub fn interval(&self) -> Option<TimeDelta> {
        TimeDelta::try_milliseconds(self.interval_ms)
    }
}
