use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use joulemeter_engine::{CalibrationError, CalibrationModel, Integration};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Off,
    Error,
    #[default]
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn from_str(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "off" => LogLevel::Off,
            "error" => LogLevel::Error,
            "info" => LogLevel::Info,
            "debug" => LogLevel::Debug,
            "trace" => LogLevel::Trace,
            _ => LogLevel::Warn,
        }
    }

    pub fn as_tracing_level(&self) -> Option<tracing::Level> {
        match self {
            LogLevel::Off => None,
            LogLevel::Error => Some(tracing::Level::ERROR),
            LogLevel::Warn => Some(tracing::Level::WARN),
            LogLevel::Info => Some(tracing::Level::INFO),
            LogLevel::Debug => Some(tracing::Level::DEBUG),
            LogLevel::Trace => Some(tracing::Level::TRACE),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UserConfig {
    pub log_level: LogLevel,
    /// Calibration file; the built-in reference profile is used when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub calibration: Option<PathBuf>,
    pub integration: Integration,
    pub compact_output: bool,
}

impl Default for UserConfig {
    fn default() -> Self {
        Self {
            log_level: LogLevel::Warn,
            calibration: None,
            integration: Integration::Constant,
            compact_output: false,
        }
    }
}

pub fn config_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("~/.config"))
        .join("joulemeter")
}

pub fn runtime_dir() -> PathBuf {
    dirs::runtime_dir()
        .or_else(dirs::cache_dir)
        .unwrap_or_else(|| PathBuf::from("/tmp"))
        .join("joulemeter")
}

pub fn config_path() -> PathBuf {
    config_dir().join("config.toml")
}

/// Where `calibration init` writes a profile.
pub fn default_calibration_path() -> PathBuf {
    config_dir().join("calibration.toml")
}

pub fn ensure_dirs() -> std::io::Result<()> {
    fs::create_dir_all(config_dir())?;
    fs::create_dir_all(runtime_dir())?;
    Ok(())
}

impl UserConfig {
    pub fn load() -> Self {
        let path = config_path();
        if !path.exists() {
            return Self::default();
        }

        match fs::read_to_string(&path) {
            Ok(content) => Self::parse(&content),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Failed to read config, using defaults");
                Self::default()
            }
        }
    }

    fn parse(content: &str) -> Self {
        toml::from_str(content).unwrap_or_else(|e| {
            warn!(error = %e, "Invalid config, using defaults");
            Self::default()
        })
    }

    pub fn save(&self) -> std::io::Result<()> {
        let _ = ensure_dirs();
        let path = config_path();
        let content = toml::to_string_pretty(self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string()))?;
        fs::write(path, content)
    }

    pub fn merge_with_args(
        &mut self,
        calibration: Option<PathBuf>,
        integration: Option<Integration>,
        compact: bool,
    ) {
        if let Some(path) = calibration {
            self.calibration = Some(path);
        }
        if let Some(mode) = integration {
            self.integration = mode;
        }
        if compact {
            self.compact_output = true;
        }
    }

    /// Loads the configured calibration, or the built-in profile.
    pub fn calibration(&self) -> Result<Arc<CalibrationModel>, CalibrationError> {
        let model = match &self.calibration {
            Some(path) => {
                debug!(path = %path.display(), "Loading calibration");
                CalibrationModel::load(path)?
            }
            None => CalibrationModel::builtin(),
        };
        Ok(Arc::new(model))
    }
}
