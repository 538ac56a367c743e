mod cli;
mod commands;
mod config;
mod logging;
mod trace;

use clap::Parser;
use color_eyre::eyre::Result;

use cli::{Cli, Commands};
use commands::replay::ReplayArgs;
use config::{ensure_dirs, LogLevel, UserConfig};
use logging::LogMode;

fn main() -> Result<()> {
    color_eyre::install()?;
    let _ = ensure_dirs();

    let cli = Cli::parse();
    let config = UserConfig::load();
    let log_level_override = cli.log_level.as_deref().map(LogLevel::from_str);

    match cli.command {
        Commands::Replay {
            traces,
            calibration,
            integration,
            compact,
            realtime,
            quiet,
        } => {
            let _guard = logging::init(config.log_level, LogMode::Both, log_level_override);
            commands::replay::run(
                config,
                ReplayArgs {
                    traces,
                    calibration,
                    integration,
                    compact,
                    realtime,
                    quiet,
                },
            )
        }
        Commands::Calibration { command } => {
            let _guard = logging::init(config.log_level, LogMode::Stderr, log_level_override);
            commands::calibration::run(&config, command)
        }
        Commands::Config { path, reset, edit } => {
            let _guard = logging::init(config.log_level, LogMode::Stderr, log_level_override);
            commands::config::run(path, reset, edit)
        }
        Commands::Logs { lines, follow } => commands::logs::run(lines, follow),
    }
}
