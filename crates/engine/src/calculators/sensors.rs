use joulemeter_model::SensorSample;

use super::PowerModel;
use crate::calibration::SensorCoefficients;

impl PowerModel for SensorSample {
    type Coefficients = SensorCoefficients;

    fn watts(&self, coefficients: &SensorCoefficients) -> f64 {
        if self.active_sensors == 0 {
            return 0.0;
        }
        coefficients.intercept + coefficients.per_sensor * f64::from(self.active_sensors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SENSORS: SensorCoefficients = SensorCoefficients {
        intercept: 0.005,
        per_sensor: 0.015,
    };

    #[test]
    fn test_no_sensors() {
        let sample = SensorSample { active_sensors: 0 };
        assert_eq!(sample.watts(&SENSORS), 0.0);
    }

    #[test]
    fn test_per_sensor_cost() {
        let sample = SensorSample { active_sensors: 3 };
        assert!((sample.watts(&SENSORS) - 0.05).abs() < 1e-12);
    }
}
