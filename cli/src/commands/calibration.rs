use std::path::Path;

use color_eyre::eyre::{bail, Result};
use joulemeter_engine::CalibrationModel;

use crate::cli::CalibrationCommands;
use crate::config::{default_calibration_path, UserConfig};

pub fn run(config: &UserConfig, command: Option<CalibrationCommands>) -> Result<()> {
    match command.unwrap_or(CalibrationCommands::Show) {
        CalibrationCommands::Show => show(config),
        CalibrationCommands::Check { path } => check(&path),
        CalibrationCommands::Init { output, force } => {
            let output = output.unwrap_or_else(default_calibration_path);
            init(&output, force)
        }
        CalibrationCommands::Path => {
            match &config.calibration {
                Some(path) => println!("{}", path.display()),
                None => println!("(built-in reference profile)"),
            }
            Ok(())
        }
    }
}

fn show(config: &UserConfig) -> Result<()> {
    let calibration = config.calibration()?;
    match &config.calibration {
        Some(path) => println!("# Calibration: {}", path.display()),
        None => println!("# Calibration: built-in reference profile"),
    }
    println!();
    print!("{}", calibration.to_toml_string()?);
    Ok(())
}

fn check(path: &Path) -> Result<()> {
    let calibration = CalibrationModel::load(path)?;
    println!(
        "{}: ok (device {}, format v{}, {} frequency steps)",
        path.display(),
        calibration.device,
        calibration.format_version,
        calibration.cpu.frequency_steps.len()
    );
    Ok(())
}

fn init(output: &Path, force: bool) -> Result<()> {
    if output.exists() && !force {
        bail!(
            "{} already exists (use --force to overwrite)",
            output.display()
        );
    }
    if let Some(parent) = output.parent() {
        std::fs::create_dir_all(parent)?;
    }

    std::fs::write(output, CalibrationModel::builtin().to_toml_string()?)?;
    println!("Wrote reference calibration to: {}", output.display());
    println!("Point `calibration` in the config at it to use it for replays.");
    Ok(())
}
