use std::os::unix::process::CommandExt;
use std::path::{Path, PathBuf};

use color_eyre::eyre::Result;

use crate::config;
use crate::logging::LOG_FILE_PREFIX;

pub fn run(lines: usize, follow: bool) -> Result<()> {
    let log_dir = config::runtime_dir();

    let Some(path) = latest_log(&log_dir) else {
        println!("No log files found in {:?}", log_dir);
        println!("Log files are written while `joulemeter replay` runs.");
        return Ok(());
    };

    if follow {
        let err = std::process::Command::new("tail")
            .args(["-f", "-n", &lines.to_string()])
            .arg(&path)
            .exec();
        return Err(err.into());
    }

    std::process::Command::new("tail")
        .args(["-n", &lines.to_string()])
        .arg(&path)
        .status()?;

    Ok(())
}

fn latest_log(log_dir: &Path) -> Option<PathBuf> {
    let prefix = format!("{}.", LOG_FILE_PREFIX);
    let mut log_files: Vec<_> = std::fs::read_dir(log_dir)
        .map(|entries| {
            entries
                .filter_map(|e| e.ok())
                .filter(|e| {
                    let name = e.file_name();
                    let name = name.to_string_lossy();
                    name.starts_with(&prefix) && name.ends_with(".log")
                })
                .map(|e| e.path())
                .collect()
        })
        .unwrap_or_default();

    log_files.sort();
    log_files.pop()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_latest_log_picks_newest_day() {
        let dir = std::env::temp_dir().join(format!("joulemeter-logs-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        for name in [
            "joulemeter.2024-01-01.log",
            "joulemeter.2024-01-03.log",
            "joulemeter.2024-01-02.log",
            "other.2024-01-09.log",
        ] {
            std::fs::write(dir.join(name), "").unwrap();
        }

        let latest = latest_log(&dir).unwrap();
        assert_eq!(latest.file_name().unwrap(), "joulemeter.2024-01-03.log");
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_latest_log_missing_dir() {
        assert!(latest_log(Path::new("/nonexistent/joulemeter")).is_none());
    }
}
