//! Tracing subscriber for one run.
//!
//! The subscriber is built as a value and handed to the run, not installed
//! globally: setup code holds it with `dispatcher::set_default`, the run
//! future carries it with `WithSubscriber::with_subscriber`.

use std::fs::{self, File, OpenOptions};
use std::path::Path;
use std::sync::Mutex;

use anyhow::{Context, Result};
use tracing::Dispatch;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::{fmt, EnvFilter};

use autoss_types::Settings;

/// Filter from `RUST_LOG`, else from the configured level name.
pub fn env_filter(settings: &Settings) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(settings.tracing_directive()))
}

fn open_log_file(path: &Path) -> Result<File> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create log directory {}", parent.display()))?;
        }
    }
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("Failed to open log file {}", path.display()))
}

/// Console (stderr) plus plain-text file logging.
pub fn build_dispatch(settings: &Settings) -> Result<Dispatch> {
    let file = open_log_file(&settings.expanded_log_file())?;

    let subscriber = tracing_subscriber::registry()
        .with(env_filter(settings))
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(
            fmt::layer()
                .with_ansi(false)
                .with_target(false)
                .with_writer(Mutex::new(file)),
        );
    Ok(Dispatch::new(subscriber))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::{NamedTempFile, TempDir};

    fn settings_with_log(path: &Path) -> Settings {
        let mut conf = NamedTempFile::new().unwrap();
        writeln!(conf, "[autoss]\nlog_file = {}\nlog_level = INFO", path.display()).unwrap();
        Settings::load(Some(conf.path().to_str().unwrap())).unwrap()
    }

    #[test]
    fn test_file_layer_writes_events() {
        let dir = TempDir::new().unwrap();
        let log_path = dir.path().join("logs").join("autoss.log");
        let dispatch = build_dispatch(&settings_with_log(&log_path)).unwrap();

        tracing::dispatcher::with_default(&dispatch, || {
            tracing::warn!(key = "vid1_1_1", "Frame vector record not found");
            tracing::debug!("below the configured level");
        });

        let written = fs::read_to_string(&log_path).unwrap();
        assert!(written.contains("Frame vector record not found"));
        assert!(written.contains("vid1_1_1"));
        assert!(!written.contains("\u{1b}["));
    }
}
