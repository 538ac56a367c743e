use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

use color_eyre::eyre::{eyre, Result};
use joulemeter_engine::queue::DEFAULT_QUEUE_CAPACITY;
use joulemeter_engine::{AccountingSession, CostSnapshot, IngestHandle, Integration, TickReport};
use joulemeter_model::ComponentKind;
use serde_json::{json, Value};
use tokio::sync::mpsc;
use tracing::{debug, error, info};

use crate::config::UserConfig;
use crate::trace::{run_feed, FeedEvent, FeedOptions};

pub struct ReplayArgs {
    pub traces: Vec<String>,
    pub calibration: Option<PathBuf>,
    pub integration: Option<Integration>,
    pub compact: bool,
    pub realtime: bool,
    pub quiet: bool,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
struct Tally {
    ingested: usize,
    rejected: usize,
    malformed: usize,
    skipped_samples: usize,
}

pub fn run(mut config: UserConfig, args: ReplayArgs) -> Result<()> {
    config.merge_with_args(
        args.calibration.clone(),
        args.integration,
        args.compact,
    );

    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(replay(config, args))
}

async fn replay(config: UserConfig, args: ReplayArgs) -> Result<()> {
    let calibration = config.calibration()?;
    info!(
        device = %calibration.device,
        integration = config.integration.label(),
        feeds = args.traces.len(),
        "Starting replay"
    );

    let session = AccountingSession::new(calibration)?.with_integration(config.integration);
    let (handle, writer) = IngestHandle::spawn(session, DEFAULT_QUEUE_CAPACITY);
    handle.start().await?;

    let (events_tx, events_rx) = mpsc::channel(DEFAULT_QUEUE_CAPACITY);
    let printer = tokio::spawn(print_events(events_rx, config.compact_output, args.quiet));

    let options = FeedOptions {
        realtime: args.realtime,
    };
    let feeds: Vec<_> = args
        .traces
        .iter()
        .map(|trace| {
            tokio::spawn(run_feed(
                trace.clone(),
                handle.clone(),
                events_tx.clone(),
                options,
            ))
        })
        .collect();
    drop(events_tx);

    let mut failed = 0usize;
    for (trace, outcome) in args.traces.iter().zip(futures::future::join_all(feeds).await) {
        match outcome {
            Ok(Ok(lines)) => debug!(feed = %trace, lines, "Feed joined"),
            Ok(Err(e)) => {
                error!(feed = %trace, error = %e, "Feed failed");
                eprintln!("Error: {}", e);
                failed += 1;
            }
            Err(e) => {
                error!(feed = %trace, error = %e, "Feed task panicked");
                failed += 1;
            }
        }
    }

    let tally = printer.await?;
    handle.stop().await?;
    drop(handle);
    let session = writer.await?;
    let snapshot = session.snapshot();

    eprintln!("{}", summary(&snapshot, &tally));

    if failed == args.traces.len() {
        return Err(eyre!("no trace could be replayed"));
    }
    Ok(())
}

async fn print_events(mut events: mpsc::Receiver<FeedEvent>, compact: bool, quiet: bool) -> Tally {
    let mut tally = Tally::default();

    while let Some(event) = events.recv().await {
        match event {
            FeedEvent::Ingested { feed, report } => {
                tally.ingested += 1;
                tally.skipped_samples += report.skipped.len();
                if quiet {
                    continue;
                }
                let doc = tick_document(&feed, &report);
                let rendered = if compact {
                    serde_json::to_string(&doc)
                } else {
                    serde_json::to_string_pretty(&doc)
                };
                match rendered {
                    Ok(line) => println!("{}", line),
                    Err(e) => error!(error = %e, "Failed to render tick report"),
                }
            }
            FeedEvent::Rejected { feed, line, error } => {
                tally.rejected += 1;
                eprintln!("{}:{}: tick rejected: {}", feed, line, error);
            }
            FeedEvent::Malformed { feed, line, error } => {
                tally.malformed += 1;
                eprintln!("{}:{}: malformed tick: {}", feed, line, error);
            }
        }
    }

    tally
}

fn tick_document(feed: &str, report: &TickReport) -> Value {
    let mut components: BTreeMap<ComponentKind, f64> = BTreeMap::new();
    for reading in &report.readings {
        *components.entry(reading.component).or_default() += reading.watts;
    }
    let skipped: Vec<String> = report.skipped.iter().map(|e| e.to_string()).collect();

    json!({
        "feed": feed,
        "timestamp": report.timestamp.to_rfc3339(),
        "total_watts": report.total_watts,
        "delta_joules": report.delta_joules,
        "total_joules": report.total_joules,
        "running_secs": report.running_time.as_secs_f64(),
        "components": components,
        "skipped": skipped,
    })
}

fn summary(snapshot: &CostSnapshot, tally: &Tally) -> String {
    let mut out = String::new();
    let running = Duration::from_millis(snapshot.running_time.as_millis() as u64);

    out.push_str(&format!("Energy:        {:.3} J\n", snapshot.total_joules));
    out.push_str(&format!("Running time:  {}\n", humantime::format_duration(running)));
    match snapshot.average_watts() {
        Some(watts) => out.push_str(&format!("Average draw:  {:.3} W\n", watts)),
        None => out.push_str("Average draw:  -\n"),
    }

    for (component, joules) in &snapshot.per_component {
        let share = if snapshot.total_joules > 0.0 {
            joules / snapshot.total_joules * 100.0
        } else {
            0.0
        };
        out.push_str(&format!(
            "  {:<10} {:>10.3} J  {:>5.1}%\n",
            component.label(),
            joules,
            share
        ));
    }

    out.push_str(&format!(
        "Ticks: {} ingested, {} rejected, {} malformed; {} samples skipped",
        tally.ingested, tally.rejected, tally.malformed, tally.skipped_samples
    ));
    out
}
