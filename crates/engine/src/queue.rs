//! Single-writer ingest queue.
//!
//! Several component feeds may produce ticks concurrently. They all talk to
//! one task that owns the [`AccountingSession`], so `start`, `stop` and
//! `ingest` are applied strictly one at a time.

use joulemeter_model::Tick;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::debug;

use crate::error::{Error, Result};
use crate::session::{AccountingSession, SessionReader, TickReport};

pub const DEFAULT_QUEUE_CAPACITY: usize = 64;

enum Command {
    Start {
        reply: oneshot::Sender<bool>,
    },
    Stop {
        reply: oneshot::Sender<bool>,
    },
    Ingest {
        tick: Box<Tick>,
        reply: oneshot::Sender<Result<TickReport>>,
    },
}

/// Cloneable producer side of the queue.
#[derive(Debug, Clone)]
pub struct IngestHandle {
    tx: mpsc::Sender<Command>,
    reader: SessionReader,
}

impl IngestHandle {
    /// Moves `session` into a writer task. The task ends once every handle
    /// is dropped and hands the session back through the join handle.
    pub fn spawn(
        session: AccountingSession,
        capacity: usize,
    ) -> (Self, JoinHandle<AccountingSession>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        let reader = session.reader();
        let task = tokio::spawn(run_writer(session, rx));
        (Self { tx, reader }, task)
    }

    pub fn reader(&self) -> &SessionReader {
        &self.reader
    }

    pub async fn start(&self) -> Result<bool> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::Start { reply }).await?;
        rx.await.map_err(|_| Error::QueueClosed)
    }

    pub async fn stop(&self) -> Result<bool> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::Stop { reply }).await?;
        rx.await.map_err(|_| Error::QueueClosed)
    }

    pub async fn ingest(&self, tick: Tick) -> Result<TickReport> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::Ingest {
            tick: Box::new(tick),
            reply,
        })
        .await?;
        rx.await.map_err(|_| Error::QueueClosed)?
    }

    async fn send(&self, command: Command) -> Result<()> {
        self.tx.send(command).await.map_err(|_| Error::QueueClosed)
    }
}

async fn run_writer(
    mut session: AccountingSession,
    mut rx: mpsc::Receiver<Command>,
) -> AccountingSession {
    while let Some(command) = rx.recv().await {
        match command {
            Command::Start { reply } => {
                let _ = reply.send(session.start());
            }
            Command::Stop { reply } => {
                let _ = reply.send(session.stop());
            }
            Command::Ingest { tick, reply } => {
                let _ = reply.send(session.ingest(&tick));
            }
        }
    }
    debug!("Ingest queue closed");
    session
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::{TimeDelta, Utc};
    use joulemeter_model::{ComponentSample, SensorSample};

    use super::*;
    use crate::calibration::CalibrationModel;
    use crate::session::SessionState;

    fn sensors_tick() -> Tick {
        Tick::new(
            Utc::now(),
            TimeDelta::seconds(1),
            vec![ComponentSample::Sensors(SensorSample { active_sensors: 2 })],
        )
    }

    fn spawn() -> (IngestHandle, JoinHandle<AccountingSession>) {
        let session = AccountingSession::new(Arc::new(CalibrationModel::builtin())).unwrap();
        IngestHandle::spawn(session, DEFAULT_QUEUE_CAPACITY)
    }

    #[tokio::test]
    async fn test_queue_lifecycle() {
        let (handle, task) = spawn();

        assert!(matches!(
            handle.ingest(sensors_tick()).await,
            Err(Error::NotRunning)
        ));
        assert!(handle.start().await.unwrap());
        let report = handle.ingest(sensors_tick()).await.unwrap();
        assert!((report.total_watts - 0.03).abs() < 1e-12);
        assert!(handle.stop().await.unwrap());
        assert_eq!(handle.reader().state(), SessionState::Stopped);

        drop(handle);
        let session = task.await.unwrap();
        assert_eq!(session.snapshot().ticks, 1);
    }

    #[tokio::test]
    async fn test_concurrent_producers() {
        let (handle, task) = spawn();
        handle.start().await.unwrap();

        let mut producers = Vec::new();
        for _ in 0..4 {
            let producer = handle.clone();
            producers.push(tokio::spawn(async move {
                for _ in 0..25 {
                    producer.ingest(sensors_tick()).await.unwrap();
                }
            }));
        }
        for producer in producers {
            producer.await.unwrap();
        }

        let snapshot = handle.reader().snapshot();
        assert_eq!(snapshot.ticks, 100);
        assert_eq!(snapshot.running_time, std::time::Duration::from_secs(100));
        assert!((snapshot.total_joules - 3.0).abs() < 1e-9);

        drop(handle);
        task.await.unwrap();
    }
}
