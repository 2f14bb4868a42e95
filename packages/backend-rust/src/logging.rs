//! Tracing setup: a stdout layer plus an optional daily-rotated file.

use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;

/// Used when `RUST_LOG` is unset or unparsable. Per-request spans come from
/// `tower_http`; profile reads and writes log at debug.
pub const DEFAULT_FILTER: &str = "info,mathwiz_backend=debug,tower_http=debug,sqlx=warn";

const LOG_FILE_PREFIX: &str = "mathwiz.log";

/// Keeps the background log writer alive; drop it last
pub struct FileLogGuard {
    _guard: WorkerGuard,
}

pub fn env_filter(directives: Option<&str>) -> EnvFilter {
    directives
        .and_then(|d| EnvFilter::try_new(d).ok())
        .unwrap_or_else(|| EnvFilter::new(DEFAULT_FILTER))
}

fn file_appender(dir: &Path) -> std::io::Result<RollingFileAppender> {
    std::fs::create_dir_all(dir)?;
    Ok(RollingFileAppender::new(Rotation::DAILY, dir, LOG_FILE_PREFIX))
}

pub fn init_tracing(config: &Config) -> Option<FileLogGuard> {
    let stdout_layer = fmt::layer().with_target(true);
    let registry = tracing_subscriber::registry()
        .with(env_filter(config.log_level.as_deref()))
        .with(stdout_layer);

    let appender = config.log_dir.as_deref().and_then(|dir| match file_appender(dir) {
        Ok(appender) => Some(appender),
        Err(err) => {
            eprintln!("file logging disabled, cannot create {}: {err}", dir.display());
            None
        }
    });

    match appender {
        Some(appender) => {
            let (writer, guard) = tracing_appender::non_blocking(appender);
            registry
                .with(fmt::layer().with_writer(writer).with_ansi(false).with_target(true))
                .init();
            Some(FileLogGuard { _guard: guard })
        }
        None => {
            registry.init();
            None
        }
    }
}
