//! Wi-Fi and cellular radios share one model: a per-state lookup plus a
//! linear term on bytes moved during the tick.

use joulemeter_model::RadioSample;

use super::PowerModel;
use crate::calibration::RadioCoefficients;

impl PowerModel for RadioSample {
    type Coefficients = RadioCoefficients;

    fn watts(&self, coefficients: &RadioCoefficients) -> f64 {
        coefficients.state_watts(self.link_state)
            + coefficients.per_byte * self.bytes_transferred as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use joulemeter_model::LinkState;

    const CELLULAR: RadioCoefficients = RadioCoefficients {
        idle: 0.01,
        low_power: 0.401,
        active: 0.57,
        high_power: 0.75,
        per_byte: 1.0e-6,
    };

    fn sample(link_state: LinkState, bytes_transferred: u64) -> RadioSample {
        RadioSample {
            link_state,
            bytes_transferred,
        }
    }

    #[test]
    fn test_state_dominates() {
        assert_eq!(sample(LinkState::Idle, 0).watts(&CELLULAR), 0.01);
        assert_eq!(sample(LinkState::LowPower, 0).watts(&CELLULAR), 0.401);
        assert_eq!(sample(LinkState::Active, 0).watts(&CELLULAR), 0.57);
        assert_eq!(sample(LinkState::HighPower, 0).watts(&CELLULAR), 0.75);
    }

    #[test]
    fn test_bytes_term() {
        let watts = sample(LinkState::Active, 100_000).watts(&CELLULAR);
        assert!((watts - 0.67).abs() < 1e-12);
    }

    #[test]
    fn test_states_ordered() {
        let idle = sample(LinkState::Idle, 0).watts(&CELLULAR);
        let high = sample(LinkState::HighPower, 0).watts(&CELLULAR);
        assert!(idle < high);
    }
}
