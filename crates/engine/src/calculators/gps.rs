use joulemeter_model::GpsSample;

use super::PowerModel;
use crate::calibration::GpsCoefficients;

impl PowerModel for GpsSample {
    type Coefficients = GpsCoefficients;

    fn watts(&self, coefficients: &GpsCoefficients) -> f64 {
        coefficients.state_watts(self.state) + coefficients.fix_rate * self.fix_rate_hz
    }
}
