//! Tracing subscriber setup for the `snapmap` binary.
//!
//! Events go to systemd-journald on Linux when `[log] journald` is set and
//! the journal socket answers. Everything else lands in a daily rolling
//! `snapmap.log` under [`LogConfig::log_dir`].

use anyhow::{Context, Result};
use std::path::PathBuf;
use std::sync::OnceLock;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::LogConfig;

pub const LOG_ENV: &str = "SNAPMAP_LOG";
const LOG_FILE_PREFIX: &str = "snapmap.log";

// Flushes the file writer on exit; must outlive every span.
static FILE_GUARD: OnceLock<WorkerGuard> = OnceLock::new();

/// Where events ended up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogSink {
    Journald,
    File(PathBuf),
}

/// `SNAPMAP_LOG` when set and valid, else the configured level.
fn filter(config: &LogConfig) -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV)
        .or_else(|_| EnvFilter::try_new(&config.level))
        .unwrap_or_else(|_| EnvFilter::new("info"))
}

pub fn init(config: &LogConfig) -> Result<LogSink> {
    #[cfg(target_os = "linux")]
    {
        if config.journald {
            if let Ok(journald) = tracing_journald::layer() {
                tracing_subscriber::registry()
                    .with(filter(config))
                    .with(journald)
                    .try_init()
                    .context("Failed to install journald subscriber")?;
                tracing::info!("Logging to journald");
                return Ok(LogSink::Journald);
            }
        }
    }

    let dir = config.log_dir();
    std::fs::create_dir_all(&dir)
        .with_context(|| format!("Failed to create log directory {}", dir.display()))?;

    let (writer, guard) =
        tracing_appender::non_blocking(tracing_appender::rolling::daily(&dir, LOG_FILE_PREFIX));
    let _ = FILE_GUARD.set(guard);

    tracing_subscriber::registry()
        .with(filter(config))
        .with(fmt::layer().with_writer(writer).with_ansi(false))
        .try_init()
        .context("Failed to install file subscriber")?;

    tracing::info!(dir = %dir.display(), "Logging to file");
    Ok(LogSink::File(dir))
}
