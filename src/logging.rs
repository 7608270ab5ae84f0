//! Append-only run log.
//!
//! Scheduled runs happen unattended, so their summaries also go to a file
//! that survives restarts. Every macro forwards to `tracing` as well; the
//! file write is skipped until [`init_logger`] has been called.

use chrono::Local;
use lazy_static::lazy_static;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

lazy_static! {
    static ref LOG_FILE: Mutex<Option<File>> = Mutex::new(None);
}

/// Open (or create) the run log. `None` uses the default location.
pub fn init_logger(path: Option<&Path>) -> anyhow::Result<PathBuf> {
    let log_path = path.map(Path::to_path_buf).unwrap_or_else(get_log_path);

    if let Some(parent) = log_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)?;

    let timestamp = Local::now().format("%Y-%m-%d %H:%M:%S");
    writeln!(file, "\n=== FindAFriend started at {} ===\n", timestamp)?;

    if let Ok(mut log_file) = LOG_FILE.lock() {
        *log_file = Some(file);
    }

    Ok(log_path)
}

/// Default log file path
pub fn get_log_path() -> PathBuf {
    if let Some(data_dir) = dirs::data_dir() {
        data_dir.join("findafriend").join("findafriend.log")
    } else {
        PathBuf::from("findafriend.log")
    }
}

/// Write one line to the run log, if open
pub fn log(level: &str, message: &str) {
    let timestamp = Local::now().format("%Y-%m-%d %H:%M:%S%.3f");
    let formatted = format!("[{}] {}: {}", timestamp, level, message);

    if let Ok(mut log_file) = LOG_FILE.lock() {
        if let Some(ref mut f) = *log_file {
            let _ = writeln!(f, "{}", formatted);
            let _ = f.flush();
        }
    }
}

#[macro_export]
macro_rules! log_info {
    ($($arg:tt)*) => {{
        let message = format!($($arg)*);
        tracing::info!("{}", message);
        $crate::logging::log("INFO", &message);
    }};
}

#[macro_export]
macro_rules! log_warn {
    ($($arg:tt)*) => {{
        let message = format!($($arg)*);
        tracing::warn!("{}", message);
        $crate::logging::log("WARN", &message);
    }};
}

#[macro_export]
macro_rules! log_error {
    ($($arg:tt)*) => {{
        let message = format!($($arg)*);
        tracing::error!("{}", message);
        $crate::logging::log("ERROR", &message);
    }};
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_lines_land_in_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("logs").join("run.log");

        let opened = init_logger(Some(&path)).unwrap();
        assert_eq!(opened, path);

        crate::log_warn!("Clustering skipped - not enough data ({} of {})", 3, 5);

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("FindAFriend started"));
        assert!(content.contains("WARN: Clustering skipped - not enough data (3 of 5)"));
    }
}
