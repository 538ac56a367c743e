use std::path::PathBuf;

use clap::Subcommand;

#[derive(Debug, Subcommand)]
pub enum CalibrationCommands {
    /// Print the calibration in effect (default)
    Show,

    /// Validate a calibration file
    Check {
        path: PathBuf,
    },

    /// Write the built-in reference profile to a file for editing
    Init {
        /// Destination (defaults to calibration.toml in the config dir)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Overwrite an existing file
        #[arg(short, long)]
        force: bool,
    },

    /// Print the configured calibration file path
    Path,
}
