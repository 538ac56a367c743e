mod calibration;

pub use calibration::CalibrationCommands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use joulemeter_engine::Integration;

fn parse_integration(s: &str) -> Result<Integration, String> {
    Integration::from_str(s)
        .ok_or_else(|| format!("unknown integration '{}' (expected constant or trapezoidal)", s))
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Replay activity traces through an accounting session
    Replay {
        /// Newline-delimited JSON tick files, one per feed ("-" for stdin)
        #[arg(required = true)]
        traces: Vec<String>,

        /// Calibration file (overrides config)
        #[arg(short = 'C', long)]
        calibration: Option<PathBuf>,

        /// Energy integration: constant, trapezoidal
        #[arg(short, long, value_parser = parse_integration)]
        integration: Option<Integration>,

        /// Compact JSON output (one line per tick)
        #[arg(short, long)]
        compact: bool,

        /// Wait each tick's interval before ingesting it
        #[arg(short, long)]
        realtime: bool,

        /// Only print the final summary
        #[arg(short, long)]
        quiet: bool,
    },

    /// Inspect, validate or create calibration files
    #[command(alias = "cal")]
    Calibration {
        #[command(subcommand)]
        command: Option<CalibrationCommands>,
    },

    /// Show or edit configuration
    Config {
        /// Print config file path
        #[arg(long)]
        path: bool,

        /// Reset config to defaults
        #[arg(long)]
        reset: bool,

        /// Open config file in $EDITOR
        #[arg(short, long)]
        edit: bool,
    },

    /// View log output
    Logs {
        /// Number of lines to show
        #[arg(short, long, default_value_t = 50)]
        lines: usize,

        /// Follow log output
        #[arg(short, long)]
        follow: bool,
    },
}

/// Per-component power accounting from hardware activity traces
#[derive(Debug, Parser)]
#[command(name = "joulemeter", version, verbatim_doc_comment)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Log level (off, error, warn, info, debug, trace)
    #[arg(long, global = true)]
    pub log_level: Option<String>,
}
