//! Activity trace feeds: newline-delimited JSON [`Tick`]s read from a file
//! or stdin and pushed into the shared ingest queue.

use std::io;

use joulemeter_engine::{Error as EngineError, IngestHandle, TickReport};
use joulemeter_model::Tick;
use tokio::fs::File;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::{debug, warn};

pub const STDIN_FEED: &str = "-";

#[derive(Debug, thiserror::Error)]
pub enum TraceError {
    #[error("failed to open trace {feed}: {source}")]
    Open {
        feed: String,
        #[source]
        source: io::Error,
    },

    #[error("failed to read trace {feed}: {source}")]
    Read {
        feed: String,
        #[source]
        source: io::Error,
    },

    #[error("ingest queue closed while replaying {feed}")]
    QueueClosed { feed: String },
}

pub type Result<T> = std::result::Result<T, TraceError>;

/// Outcome of one trace line.
#[derive(Debug)]
pub enum FeedEvent {
    Ingested {
        feed: String,
        report: TickReport,
    },
    Rejected {
        feed: String,
        line: usize,
        error: EngineError,
    },
    Malformed {
        feed: String,
        line: usize,
        error: serde_json::Error,
    },
}

#[derive(Debug, Clone, Copy, Default)]
pub struct FeedOptions {
    /// Sleep for each tick's interval before ingesting it.
    pub realtime: bool,
}

/// Parses one trace line. Blank lines and `#` comments yield `None`.
pub fn parse_line(line: &str) -> Option<serde_json::Result<Tick>> {
    let trimmed = line.trim();
    if trimmed.is_empty() || trimmed.starts_with('#') {
        return None;
    }
    Some(serde_json::from_str(trimmed))
}

/// Streams `feed` into `handle`, reporting each line on `events`. Returns the
/// number of lines that produced an event.
pub async fn run_feed(
    feed: String,
    handle: IngestHandle,
    events: mpsc::Sender<FeedEvent>,
    options: FeedOptions,
) -> Result<usize> {
    if feed == STDIN_FEED {
        let reader = BufReader::new(tokio::io::stdin());
        return pump(feed, reader, handle, events, options).await;
    }

    let file = File::open(&feed).await.map_err(|source| TraceError::Open {
        feed: feed.clone(),
        source,
    })?;
    pump(feed, BufReader::new(file), handle, events, options).await
}

async fn pump<R>(
    feed: String,
    reader: R,
    handle: IngestHandle,
    events: mpsc::Sender<FeedEvent>,
    options: FeedOptions,
) -> Result<usize>
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = reader.lines();
    let mut line_no = 0usize;
    let mut handled = 0usize;

    loop {
        let line = lines.next_line().await.map_err(|source| TraceError::Read {
            feed: feed.clone(),
            source,
        })?;
        let Some(line) = line else {
            break;
        };
        line_no += 1;

        let event = match parse_line(&line) {
            None => continue,
            Some(Err(error)) => {
                warn!(feed = %feed, line = line_no, error = %error, "Malformed tick");
                FeedEvent::Malformed {
                    feed: feed.clone(),
                    line: line_no,
                    error,
                }
            }
            Some(Ok(tick)) => {
                if options.realtime && tick.interval_ms > 0 {
                    tokio::time::sleep(std::time::Duration::from_millis(tick.interval_ms as u64))
                        .await;
                }
                match handle.ingest(tick).await {
                    Ok(report) => FeedEvent::Ingested {
                        feed: feed.clone(),
                        report,
                    },
                    Err(EngineError::QueueClosed) => {
                        return Err(TraceError::QueueClosed { feed });
                    }
                    Err(error) => {
                        warn!(feed = %feed, line = line_no, error = %error, "Tick rejected");
                        FeedEvent::Rejected {
                            feed: feed.clone(),
                            line: line_no,
                            error,
                        }
                    }
                }
            }
        };

        handled += 1;
        if events.send(event).await.is_err() {
            debug!(feed = %feed, "Event receiver dropped, stopping feed");
            break;
        }
    }

    debug!(feed = %feed, lines = handled, "Feed finished");
    Ok(handled)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use joulemeter_engine::{AccountingSession, CalibrationModel};

    use super::*;

    #[test]
    fn test_parse_line_skips_blank_and_comments() {
        assert!(parse_line("").is_none());
        assert!(parse_line("   ").is_none());
        assert!(parse_line("# recorded on device A").is_none());
        assert!(matches!(parse_line("{not json"), Some(Err(_))));

        let tick = parse_line(r#"{"timestamp":"2024-01-01T00:00:00Z","interval_ms":1000}"#)
            .unwrap()
            .unwrap();
        assert!(tick.samples.is_empty());
    }

    #[tokio::test]
    async fn test_pump_reports_every_line() {
        let session = AccountingSession::new(Arc::new(CalibrationModel::builtin())).unwrap();
        let (handle, writer) = IngestHandle::spawn(session, 8);
        handle.start().await.unwrap();

        let trace = concat!(
            r#"{"timestamp":"2024-01-01T00:00:00Z","interval_ms":1000,"samples":[{"component":"sensors","active_sensors":2}]}"#,
            "\n\n",
            "garbage\n",
            r#"{"timestamp":"2024-01-01T00:00:01Z","interval_ms":-5,"samples":[]}"#,
            "\n",
        );
        let (tx, mut rx) = mpsc::channel(8);
        let handled = pump(
            "test".to_string(),
            BufReader::new(trace.as_bytes()),
            handle.clone(),
            tx,
            FeedOptions::default(),
        )
        .await
        .unwrap();
        assert_eq!(handled, 3);

        assert!(matches!(rx.recv().await, Some(FeedEvent::Ingested { .. })));
        assert!(matches!(
            rx.recv().await,
            Some(FeedEvent::Malformed { line: 3, .. })
        ));
        assert!(matches!(
            rx.recv().await,
            Some(FeedEvent::Rejected {
                line: 4,
                error: EngineError::InvalidInterval { .. },
                ..
            })
        ));
        assert!(rx.recv().await.is_none());

        drop(handle);
        let session = writer.await.unwrap();
        assert_eq!(session.snapshot().ticks, 1);
    }

    #[tokio::test]
    async fn test_missing_file() {
        let session = AccountingSession::new(Arc::new(CalibrationModel::builtin())).unwrap();
        let (handle, _writer) = IngestHandle::spawn(session, 8);
        let (tx, _rx) = mpsc::channel(8);
        let result = run_feed(
            "/nonexistent/trace.ndjson".to_string(),
            handle,
            tx,
            FeedOptions::default(),
        )
        .await;
        assert!(matches!(result, Err(TraceError::Open { .. })));
    }
}
