use joulemeter_model::AudioSample;

use super::PowerModel;
use crate::calibration::AudioCoefficients;

impl PowerModel for AudioSample {
    type Coefficients = AudioCoefficients;

    fn watts(&self, coefficients: &AudioCoefficients) -> f64 {
        if !self.active {
            return 0.0;
        }
        coefficients.intercept + coefficients.volume * self.volume
    }
}
