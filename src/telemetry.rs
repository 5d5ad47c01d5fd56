//! File-backed tracing setup. Stdout belongs to the TUI, so log lines go to
//! `~/.config/faultreport/faultreport.log`.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{Context, Result};
use tracing_subscriber::{filter::EnvFilter, fmt, prelude::*};

pub fn log_path() -> Result<PathBuf> {
    Ok(crate::config::config_dir()?.join("faultreport.log"))
}

/// Install the global subscriber. `RUST_LOG` wins over `default_level`.
pub fn init(path: &Path, default_level: &str) -> Result<()> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create log directory: {}", dir.display()))?;
    }
    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("Failed to open log file: {}", path.display()))?;

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_ansi(false)
                .with_target(false)
                .with_writer(Mutex::new(file))
                .with_filter(env_filter),
        )
        .try_init()
        .context("Failed to install tracing subscriber")?;
    Ok(())
}
