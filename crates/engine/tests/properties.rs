use std::sync::Arc;

use chrono::{TimeDelta, Utc};
use joulemeter_engine::aggregator::total_watts;
use joulemeter_engine::{aggregate, estimate, AccountingSession, CalibrationModel};
use joulemeter_model::*;
use proptest::prelude::*;

fn fraction() -> impl Strategy<Value = f64> {
    0.0..=1.0f64
}

fn link_state() -> impl Strategy<Value = LinkState> {
    prop_oneof![
        Just(LinkState::Idle),
        Just(LinkState::LowPower),
        Just(LinkState::Active),
        Just(LinkState::HighPower),
    ]
}

fn gps_state() -> impl Strategy<Value = GpsState> {
    prop_oneof![
        Just(GpsState::Off),
        Just(GpsState::Sleep),
        Just(GpsState::Active),
    ]
}

fn core_sample() -> impl Strategy<Value = CoreSample> {
    (0u64..3_000_000_000, fraction()).prop_map(|(frequency_hz, utilization)| CoreSample {
        frequency_hz,
        utilization,
    })
}

fn component_sample() -> impl Strategy<Value = ComponentSample> {
    prop_oneof![
        prop::collection::vec(core_sample(), 1..8)
            .prop_map(|cores| ComponentSample::Cpu(CpuSample { cores })),
        (fraction(), any::<bool>()).prop_map(|(brightness, screen_on)| ComponentSample::Lcd(
            LcdSample {
                brightness,
                screen_on
            }
        )),
        (fraction(), fraction(), fraction(), fraction()).prop_map(|(brightness, red, green, blue)| {
            ComponentSample::Oled(OledSample {
                brightness,
                screen_on: true,
                pixels: Some(PixelStats { red, green, blue }),
            })
        }),
        (any::<bool>(), fraction())
            .prop_map(|(active, volume)| ComponentSample::Audio(AudioSample { active, volume })),
        (gps_state(), 0.0..20.0f64).prop_map(|(state, fix_rate_hz)| ComponentSample::Gps(
            GpsSample { state, fix_rate_hz }
        )),
        (link_state(), 0u64..10_000_000).prop_map(|(link_state, bytes_transferred)| {
            ComponentSample::Wifi(RadioSample {
                link_state,
                bytes_transferred,
            })
        }),
        (link_state(), 0u64..10_000_000).prop_map(|(link_state, bytes_transferred)| {
            ComponentSample::Cellular(RadioSample {
                link_state,
                bytes_transferred,
            })
        }),
        (0u32..16).prop_map(|active_sensors| ComponentSample::Sensors(SensorSample {
            active_sensors
        })),
    ]
}

fn readings(watts: Vec<f64>) -> Vec<PowerReading> {
    let now = Utc::now();
    watts
        .into_iter()
        .zip(ComponentKind::ALL.iter().cycle())
        .map(|(w, kind)| PowerReading::new(*kind, w, now))
        .collect()
}

proptest! {
    #[test]
    fn estimates_are_never_negative(sample in component_sample()) {
        let calibration = CalibrationModel::builtin();
        let watts = estimate(&sample, &calibration).unwrap();
        prop_assert!(watts >= 0.0);
        prop_assert!(watts.is_finite());
    }

    #[test]
    fn aggregate_ignores_order(watts in prop::collection::vec(0.0..10.0f64, 0..16), seed in any::<u64>()) {
        let original = readings(watts);
        let mut shuffled = original.clone();
        let len = shuffled.len();
        if len > 1 {
            let mut state = seed;
            for i in (1..len).rev() {
                state = state.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
                shuffled.swap(i, (state % (i as u64 + 1)) as usize);
            }
        }

        let a = aggregate(&original, TimeDelta::seconds(1)).unwrap();
        let b = aggregate(&shuffled, TimeDelta::seconds(1)).unwrap();
        prop_assert_eq!(a, b);
    }

    #[test]
    fn aggregate_groups_freely(watts in prop::collection::vec(0.0..10.0f64, 2..16), split in 0usize..16) {
        let all = readings(watts);
        let split = split % all.len();
        let (left, right) = all.split_at(split);

        let whole = total_watts(&all);
        let parts = total_watts(left) + total_watts(right);
        prop_assert!((whole - parts).abs() < 1e-9);
    }

    #[test]
    fn totals_never_decrease(
        ticks in prop::collection::vec(
            (prop::collection::vec(component_sample(), 0..6), -2000i64..5000),
            1..20,
        )
    ) {
        let calibration = Arc::new(CalibrationModel::builtin());
        let mut session = AccountingSession::new(calibration).unwrap();
        session.start();

        let mut joules = 0.0;
        let mut running = std::time::Duration::ZERO;
        for (samples, interval_ms) in ticks {
            let tick = Tick::new(Utc::now(), TimeDelta::milliseconds(interval_ms), samples);
            let accepted = session.ingest(&tick).is_ok();
            prop_assert_eq!(accepted, interval_ms > 0);

            prop_assert!(session.cur_power_cost() >= joules);
            prop_assert!(session.running_time() >= running);
            joules = session.cur_power_cost();
            running = session.running_time();
        }
    }
}
