use joulemeter_model::CpuSample;

use super::PowerModel;
use crate::calibration::CpuCoefficients;

impl PowerModel for CpuSample {
    type Coefficients = CpuCoefficients;

    fn watts(&self, coefficients: &CpuCoefficients) -> f64 {
        let busy: f64 = self
            .cores
            .iter()
            .map(|core| coefficients.weight_for(core.frequency_hz) * core.utilization)
            .sum();
        coefficients.intercept + busy
    }
}
