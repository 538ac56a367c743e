//! Calibration file format versioning.
//!
//! # Version History
//!
//! | Version | Changes |
//! |---------|---------|
//! | 1 | Initial format: scalar CPU weight, per-state radio power |
//! | 2 | Added `cpu.frequency_steps`, OLED per-channel weights |
//!
//! # Breaking Changes (require CALIBRATION_FORMAT_VERSION bump)
//!
//! - Removing or renaming a component section
//! - Changing the unit of a coefficient
//! - Changing how a coefficient enters a component's power model
//!
//! # Non-Breaking Changes (safe without version bump)
//!
//! - Adding new coefficients with `#[serde(default)]`
//!
//! # Support Policy
//!
//! Files one version behind are still accepted. A version-1 file simply has
//! no frequency steps and zero OLED channel weights.

/// Current calibration format version written by this build.
pub const CALIBRATION_FORMAT_VERSION: u32 = 2;

/// Oldest calibration format version this build can load.
pub const MIN_SUPPORTED_FORMAT_VERSION: u32 = 1;

/// Returns true if a calibration file with `version` can be loaded.
pub fn is_supported_format(version: u32) -> bool {
    (MIN_SUPPORTED_FORMAT_VERSION..=CALIBRATION_FORMAT_VERSION).contains(&version)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_supported_range() {
        assert!(is_supported_format(CALIBRATION_FORMAT_VERSION));
        assert!(is_supported_format(MIN_SUPPORTED_FORMAT_VERSION));
        assert!(!is_supported_format(0));
        assert!(!is_supported_format(CALIBRATION_FORMAT_VERSION + 1));
    }
}
