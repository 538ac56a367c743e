//! Power accounting session: lifecycle and owner of cumulative energy.
//!
//! The session publishes its state as an immutable [`CostSnapshot`]. Each
//! change builds a new snapshot and swaps the `Arc`, so readers on other
//! threads (through a [`SessionReader`]) never see a half-updated total.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use joulemeter_model::{ComponentKind, PowerReading, SampleError, Tick};
use parking_lot::RwLock;
use tracing::{debug, info, warn};

use crate::aggregator::{aggregate_with, Integration};
use crate::calculators::estimate_batch;
use crate::calibration::CalibrationModel;
use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionState {
    #[default]
    Stopped,
    Running,
}

impl SessionState {
    pub fn label(&self) -> &'static str {
        match self {
            SessionState::Stopped => "Stopped",
            SessionState::Running => "Running",
        }
    }

    pub fn is_running(&self) -> bool {
        matches!(self, SessionState::Running)
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Cumulative accounting state at one point in time. Never mutated once
/// published.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CostSnapshot {
    pub state: SessionState,
    /// Energy since the last `start`, in joules.
    pub total_joules: f64,
    /// Sum of accepted tick intervals since the last `start`.
    pub running_time: Duration,
    /// Latest tick timestamp seen. Never moves backwards.
    pub last_update: Option<DateTime<Utc>>,
    /// Total draw of the most recent accepted tick.
    pub last_watts: Option<f64>,
    pub ticks: u64,
    pub per_component: BTreeMap<ComponentKind, f64>,
}

impl CostSnapshot {
    fn running() -> Self {
        Self {
            state: SessionState::Running,
            ..Self::default()
        }
    }

    pub fn joules_for(&self, component: ComponentKind) -> f64 {
        self.per_component.get(&component).copied().unwrap_or(0.0)
    }

    /// Mean draw over the running time, in watts.
    pub fn average_watts(&self) -> Option<f64> {
        let secs = self.running_time.as_secs_f64();
        (secs > 0.0).then(|| self.total_joules / secs)
    }
}

/// What one accepted tick contributed.
#[derive(Debug, Clone)]
pub struct TickReport {
    pub timestamp: DateTime<Utc>,
    pub readings: Vec<PowerReading>,
    /// Samples dropped from this tick for failing validation.
    pub skipped: Vec<SampleError>,
    pub total_watts: f64,
    pub delta_joules: f64,
    pub total_joules: f64,
    pub running_time: Duration,
}

type Shared = Arc<RwLock<Arc<CostSnapshot>>>;

/// Read-only view of a session, safe to hand to other threads.
#[derive(Debug, Clone)]
pub struct SessionReader {
    shared: Shared,
}

impl SessionReader {
    pub fn snapshot(&self) -> Arc<CostSnapshot> {
        Arc::clone(&self.shared.read())
    }

    pub fn cur_power_cost(&self) -> f64 {
        self.snapshot().total_joules
    }

    pub fn running_time(&self) -> Duration {
        self.snapshot().running_time
    }

    pub fn state(&self) -> SessionState {
        self.snapshot().state
    }
}

/// Owns the cumulative energy of one measurement session.
///
/// Writer operations take `&mut self`, so exactly one owner drives the
/// session; hand out [`SessionReader`]s for concurrent queries.
pub struct AccountingSession {
    calibration: Arc<CalibrationModel>,
    integration: Integration,
    shared: Shared,
}

impl AccountingSession {
    /// Fails if the calibration is invalid; estimating with bad coefficients
    /// would produce meaningless numbers rather than an error.
    pub fn new(calibration: Arc<CalibrationModel>) -> Result<Self> {
        calibration.validate()?;
        debug!(device = %calibration.device, "Calibration accepted");
        Ok(Self {
            calibration,
            integration: Integration::default(),
            shared: Arc::new(RwLock::new(Arc::new(CostSnapshot::default()))),
        })
    }

    pub fn with_integration(mut self, integration: Integration) -> Self {
        self.integration = integration;
        self
    }

    pub fn integration(&self) -> Integration {
        self.integration
    }

    pub fn calibration(&self) -> &Arc<CalibrationModel> {
        &self.calibration
    }

    pub fn reader(&self) -> SessionReader {
        SessionReader {
            shared: Arc::clone(&self.shared),
        }
    }

    pub fn snapshot(&self) -> Arc<CostSnapshot> {
        Arc::clone(&self.shared.read())
    }

    pub fn state(&self) -> SessionState {
        self.snapshot().state
    }

    pub fn cur_power_cost(&self) -> f64 {
        self.snapshot().total_joules
    }

    pub fn running_time(&self) -> Duration {
        self.snapshot().running_time
    }

    fn publish(&self, snapshot: CostSnapshot) {
        *self.shared.write() = Arc::new(snapshot);
    }

    /// Starts a fresh measurement. Returns false, keeping accumulated
    /// state, if the session is already running.
    pub fn start(&mut self) -> bool {
        if self.state().is_running() {
            debug!("Start ignored, session already running");
            return false;
        }
        self.publish(CostSnapshot::running());
        info!(
            device = %self.calibration.device,
            integration = self.integration.label(),
            "Session started"
        );
        true
    }

    /// Freezes the cumulative counters. Returns false if already stopped.
    pub fn stop(&mut self) -> bool {
        let current = self.snapshot();
        if !current.state.is_running() {
            debug!("Stop ignored, session not running");
            return false;
        }
        let frozen = CostSnapshot {
            state: SessionState::Stopped,
            ..(*current).clone()
        };
        info!(
            joules = frozen.total_joules,
            running_secs = frozen.running_time.as_secs_f64(),
            ticks = frozen.ticks,
            "Session stopped"
        );
        self.publish(frozen);
        true
    }

    /// Estimates every sample in `tick`, aggregates, and adds the tick's
    /// energy and interval to the running totals.
    ///
    /// Invalid samples are skipped and reported; a non-positive interval
    /// rejects the whole tick without touching any counter.
    pub fn ingest(&mut self, tick: &Tick) -> Result<TickReport> {
        let current = self.snapshot();
        if !current.state.is_running() {
            return Err(Error::NotRunning);
        }

        let invalid = || Error::InvalidInterval {
            interval_ms: tick.interval_ms,
        };
        let interval = tick
            .interval()
            .ok_or_else(invalid)
            .inspect_err(|e| debug!(error = %e, "Tick rejected"))?;
        let (readings, skipped) = estimate_batch(&tick.samples, &self.calibration, tick.timestamp);
        let aggregate = aggregate_with(&readings, interval, self.integration, current.last_watts)
            .inspect_err(|e| debug!(error = %e, "Tick rejected"))?;
        let running_time = interval
            .to_std()
            .ok()
            .and_then(|elapsed| current.running_time.checked_add(elapsed))
            .ok_or_else(invalid)?;

        for error in &skipped {
            warn!(component = %error.component(), error = %error, "Skipping sample");
        }

        let mut next = (*current).clone();
        next.total_joules += aggregate.delta_joules;
        next.running_time = running_time;
        next.last_watts = Some(aggregate.total_watts);
        next.ticks += 1;
        next.last_update = Some(match current.last_update {
            Some(last) => last.max(tick.timestamp),
            None => tick.timestamp,
        });

        if aggregate.total_watts > 0.0 {
            let scale = aggregate.delta_joules / aggregate.total_watts;
            for reading in &readings {
                *next.per_component.entry(reading.component).or_insert(0.0) +=
                    reading.watts * scale;
            }
        }

        debug!(
            components = readings.len(),
            skipped = skipped.len(),
            watts = aggregate.total_watts,
            delta_joules = aggregate.delta_joules,
            total_joules = next.total_joules,
            "Tick ingested"
        );

        let report = TickReport {
            timestamp: tick.timestamp,
            readings,
            skipped,
            total_watts: aggregate.total_watts,
            delta_joules: aggregate.delta_joules,
            total_joules: next.total_joules,
            running_time: next.running_time,
        };
        self.publish(next);
        Ok(report)
    }
}

impl fmt::Debug for AccountingSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccountingSession")
            .field("device", &self.calibration.device)
            .field("integration", &self.integration)
            .field("snapshot", &self.snapshot())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeDelta;
    use joulemeter_model::{AudioSample, ComponentSample, LcdSample};

    fn session() -> AccountingSession {
        AccountingSession::new(Arc::new(CalibrationModel::builtin())).unwrap()
    }

    fn audio_tick(secs: i64) -> Tick {
        Tick::new(
            Utc::now(),
            TimeDelta::seconds(secs),
            vec![ComponentSample::Audio(AudioSample {
                active: true,
                volume: 0.0,
            })],
        )
    }

    #[test]
    fn test_initial_state() {
        let session = session();
        assert_eq!(session.state(), SessionState::Stopped);
        assert_eq!(session.cur_power_cost(), 0.0);
        assert_eq!(session.running_time(), Duration::ZERO);
    }

    #[test]
    fn test_rejects_invalid_calibration() {
        let mut calibration = CalibrationModel::builtin();
        calibration.audio.intercept = -1.0;
        let result = AccountingSession::new(Arc::new(calibration));
        assert!(matches!(result, Err(Error::Calibration(_))));
    }

    #[test]
    fn test_start_stop_transitions() {
        let mut session = session();
        assert!(session.start());
        assert!(!session.start());
        assert_eq!(session.state(), SessionState::Running);
        assert!(session.stop());
        assert!(!session.stop());
        assert_eq!(session.state(), SessionState::Stopped);
    }

    #[test]
    fn test_per_component_attribution() {
        let mut session = session();
        session.start();
        let tick = Tick::new(
            Utc::now(),
            TimeDelta::seconds(2),
            vec![
                ComponentSample::Audio(AudioSample {
                    active: true,
                    volume: 0.0,
                }),
                ComponentSample::Lcd(LcdSample {
                    brightness: 0.0,
                    screen_on: true,
                }),
            ],
        );
        session.ingest(&tick).unwrap();

        let snapshot = session.snapshot();
        assert!((snapshot.joules_for(ComponentKind::Audio) - 0.768).abs() < 1e-9);
        assert!((snapshot.joules_for(ComponentKind::Lcd) - 0.31).abs() < 1e-9);
        assert_eq!(snapshot.joules_for(ComponentKind::Gps), 0.0);
        let sum: f64 = snapshot.per_component.values().sum();
        assert!((sum - snapshot.total_joules).abs() < 1e-9);
    }

    #[test]
    fn test_average_watts() {
        let mut session = session();
        assert_eq!(session.snapshot().average_watts(), None);
        session.start();
        session.ingest(&audio_tick(4)).unwrap();
        let avg = session.snapshot().average_watts().unwrap();
        assert!((avg - 0.384).abs() < 1e-9);
    }

    #[test]
    fn test_last_update_never_moves_back() {
        let mut session = session();
        session.start();
        let later = Utc::now();
        let earlier = later - TimeDelta::seconds(10);

        let mut tick = audio_tick(1);
        tick.timestamp = later;
        session.ingest(&tick).unwrap();
        tick.timestamp = earlier;
        session.ingest(&tick).unwrap();

        assert_eq!(session.snapshot().last_update, Some(later));
        assert_eq!(session.snapshot().ticks, 2);
    }

    #[test]
    fn test_trapezoidal_session() {
        let mut session = session().with_integration(Integration::Trapezoidal);
        session.start();
        let idle = Tick::new(Utc::now(), TimeDelta::seconds(1), Vec::new());
        session.ingest(&idle).unwrap();
        let report = session.ingest(&audio_tick(1)).unwrap();
        assert!((report.delta_joules - 0.192).abs() < 1e-9);
        assert!((report.total_watts - 0.384).abs() < 1e-9);
    }

    #[test]
    fn test_restart_clears_previous_draw() {
        let mut session = session().with_integration(Integration::Trapezoidal);
        session.start();
        session.ingest(&audio_tick(1)).unwrap();
        let idle = Tick::new(Utc::now(), TimeDelta::seconds(1), Vec::new());
        session.ingest(&idle).unwrap();
        assert_eq!(session.snapshot().last_watts, Some(0.0));

        session.stop();
        session.start();
        assert_eq!(session.snapshot().last_watts, None);

        // no previous draw, so the first tick integrates as constant
        let report = session.ingest(&audio_tick(1)).unwrap();
        assert!((report.delta_joules - 0.384).abs() < 1e-9);
        assert!((session.cur_power_cost() - 0.384).abs() < 1e-9);
    }

    #[test]
    fn test_reader_sees_updates() {
        let mut session = session();
        let reader = session.reader();
        session.start();
        session.ingest(&audio_tick(1)).unwrap();
        assert_eq!(reader.state(), SessionState::Running);
        assert_eq!(reader.cur_power_cost(), session.cur_power_cost());
        assert_eq!(reader.running_time(), Duration::from_secs(1));
    }
}
