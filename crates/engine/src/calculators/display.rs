//! LCD and OLED panels. An LCD's draw follows its backlight; an OLED's
//! follows what it shows, so its pixel channels are weighted separately.

use joulemeter_model::{LcdSample, OledSample};

use super::PowerModel;
use crate::calibration::{LcdCoefficients, OledCoefficients};

impl PowerModel for LcdSample {
    type Coefficients = LcdCoefficients;

    fn watts(&self, coefficients: &LcdCoefficients) -> f64 {
        if !self.screen_on {
            return 0.0;
        }
        coefficients.intercept + coefficients.brightness * self.brightness
    }
}

impl PowerModel for OledSample {
    type Coefficients = OledCoefficients;

    fn watts(&self, coefficients: &OledCoefficients) -> f64 {
        if !self.screen_on {
            return 0.0;
        }
        let pixels = self.pixels.unwrap_or_default();
        let content = coefficients.red * pixels.red
            + coefficients.green * pixels.green
            + coefficients.blue * pixels.blue;
        coefficients.intercept
            + coefficients.brightness * self.brightness
            + content * self.brightness
    }
}
