//! Process-wide logging for the rookeye binaries.
//!
//! [`init_with_level`] installs a small `log` backend writing
//! `[uptime LEVEL crate] message` lines to stderr. With the `tracing`
//! feature, [`init_tracing`] installs a `tracing-subscriber` formatter whose
//! default verbosity comes from the caller and can be refined by `RUST_LOG`.

use std::io::Write;
use std::sync::OnceLock;
use std::time::Instant;

use log::{LevelFilter, Log, Metadata, Record};

#[cfg(feature = "tracing")]
use tracing_subscriber::fmt::format::FmtSpan;
#[cfg(feature = "tracing")]
use tracing_subscriber::{fmt, EnvFilter};

struct StderrLogger {
    max_level: LevelFilter,
    started: Instant,
}

impl Log for StderrLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.max_level
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        // `rookeye_board::detector` -> `rookeye_board`
        let krate = record
            .target()
            .split_once("::")
            .map_or(record.target(), |(head, _)| head);
        let line = format!(
            "[{:8.3}s {:>5} {krate}] {}\n",
            self.started.elapsed().as_secs_f64(),
            record.level(),
            record.args()
        );
        let _ = std::io::stderr().lock().write_all(line.as_bytes());
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

static STDERR_LOGGER: OnceLock<StderrLogger> = OnceLock::new();

/// Install the stderr logger, keeping records at `level` or more severe.
///
/// Later calls are no-ops; the first level sticks.
pub fn init_with_level(level: LevelFilter) -> Result<(), log::SetLoggerError> {
    if STDERR_LOGGER.get().is_some() {
        return Ok(());
    }
    let logger = STDERR_LOGGER.get_or_init(|| StderrLogger {
        max_level: level,
        started: Instant::now(),
    });
    log::set_logger(logger)?;
    log::set_max_level(level);
    Ok(())
}

/// Map a `log` level filter onto the `tracing` one.
#[cfg(feature = "tracing")]
fn tracing_level(level: LevelFilter) -> tracing::level_filters::LevelFilter {
    use tracing::level_filters::LevelFilter as T;
    match level {
        LevelFilter::Off => T::OFF,
        LevelFilter::Error => T::ERROR,
        LevelFilter::Warn => T::WARN,
        LevelFilter::Info => T::INFO,
        LevelFilter::Debug => T::DEBUG,
        LevelFilter::Trace => T::TRACE,
    }
}

/// Install a global `tracing` subscriber on stderr.
///
/// `level` is the default directive; `RUST_LOG` directives, when set, are
/// layered on top. `log` records are not bridged here, binaries install
/// `tracing_log::LogTracer` for that.
#[cfg(feature = "tracing")]
pub fn init_tracing(json: bool, level: LevelFilter) {
    let filter = EnvFilter::builder()
        .with_default_directive(tracing_level(level).into())
        .from_env_lossy();
    let builder = fmt()
        .with_env_filter(filter)
        .with_span_events(FmtSpan::CLOSE)
        .with_writer(std::io::stderr);
    let installed = if json {
        tracing::subscriber::set_global_default(builder.json().flatten_event(true).finish())
    } else {
        tracing::subscriber::set_global_default(
            builder.with_timer(fmt::time::Uptime::default()).finish(),
        )
    };
    if installed.is_err() {
        log::debug!("tracing subscriber already installed");
    }
}
