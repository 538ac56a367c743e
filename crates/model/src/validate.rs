//! Sample invariants: normalized fractions lie in [0, 1], nothing is NaN or
//! infinite, and every field a component's power model needs is present.

use thiserror::Error;

use crate::types::{ComponentKind, ComponentSample, PixelStats};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SampleError {
    #[error("{component} sample: {field} = {value} is outside [0, 1]")]
    OutOfRange {
        component: ComponentKind,
        field: &'static str,
        value: f64,
    },

    #[error("{component} sample: {field} must be a finite, non-negative number")]
    NotFinite {
        component: ComponentKind,
        field: &'static str,
    },

    #[error("{component} sample: missing {field}")]
    Missing {
        component: ComponentKind,
        field: &'static str,
    },
}

impl SampleError {
    pub fn component(&self) -> ComponentKind {
        match self {
            SampleError::OutOfRange { component, .. }
            | SampleError::NotFinite { component, .. }
            | SampleError::Missing { component, .. } => *component,
        }
    }
}

pub type Result<T> = std::result::Result<T, SampleError>;

fn fraction(component: ComponentKind, field: &'static str, value: f64) -> Result<()> {
    if value.is_nan() {
        return Err(SampleError::NotFinite { component, field });
    }
    if !(0.0..=1.0).contains(&value) {
        return Err(SampleError::OutOfRange {
            component,
            field,
            value,
        });
    }
    Ok(())
}

fn non_negative(component: ComponentKind, field: &'static str, value: f64) -> Result<()> {
    if !value.is_finite() || value < 0.0 {
        return Err(SampleError::NotFinite { component, field });
    }
    Ok(())
}

fn pixels(component: ComponentKind, stats: &PixelStats) -> Result<()> {
    fraction(component, "pixels.red", stats.red)?;
    fraction(component, "pixels.green", stats.green)?;
    fraction(component, "pixels.blue", stats.blue)
}

impl ComponentSample {
    /// Checks the sample against its variant's invariants.
    pub fn validate(&self) -> Result<()> {
        let component = self.kind();
        match self {
            ComponentSample::Cpu(cpu) => {
                if cpu.cores.is_empty() {
                    return Err(SampleError::Missing {
                        component,
                        field: "cores",
                    });
                }
                for core in &cpu.cores {
                    fraction(component, "utilization", core.utilization)?;
                }
                Ok(())
            }
            ComponentSample::Lcd(lcd) => fraction(component, "brightness", lcd.brightness),
            ComponentSample::Oled(oled) => {
                fraction(component, "brightness", oled.brightness)?;
                match &oled.pixels {
                    Some(stats) => pixels(component, stats),
                    None => Err(SampleError::Missing {
                        component,
                        field: "pixels",
                    }),
                }
            }
            ComponentSample::Audio(audio) => fraction(component, "volume", audio.volume),
            ComponentSample::Gps(gps) => non_negative(component, "fix_rate_hz", gps.fix_rate_hz),
            ComponentSample::Wifi(_)
            | ComponentSample::Cellular(_)
            | ComponentSample::Sensors(_) => Ok(()),
        }
    }
}
