//! Power estimation and energy accounting for joulemeter.
//!
//! Hosts push [`Tick`](joulemeter_model::Tick)s of per-component activity
//! samples into an [`AccountingSession`]. Each sample is turned into watts by
//! its calibrated component model, the readings are summed, and the tick's
//! energy is added to the session's running total.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//!
//! use chrono::{TimeDelta, Utc};
//! use joulemeter_engine::{AccountingSession, CalibrationModel};
//! use joulemeter_model::{ComponentSample, CoreSample, CpuSample, Tick};
//!
//! let calibration = Arc::new(CalibrationModel::builtin());
//! let mut session = AccountingSession::new(calibration)?;
//! session.start();
//!
//! let cpu = ComponentSample::Cpu(CpuSample {
//!     cores: vec![CoreSample { frequency_hz: 1_000_000_000, utilization: 0.5 }],
//! });
//! session.ingest(&Tick::new(Utc::now(), TimeDelta::seconds(1), vec![cpu]))?;
//! assert!(session.cur_power_cost() > 0.0);
//! # Ok::<(), joulemeter_engine::Error>(())
//! ```

pub mod aggregator;
pub mod calculators;
pub mod calibration;
mod error;
pub mod queue;
pub mod session;

pub use aggregator::{aggregate, Aggregate, Integration};
pub use calculators::estimate;
pub use calibration::CalibrationModel;
pub use error::{CalibrationError, Error, Result};
pub use queue::IngestHandle;
pub use session::{AccountingSession, CostSnapshot, SessionReader, SessionState, TickReport};
