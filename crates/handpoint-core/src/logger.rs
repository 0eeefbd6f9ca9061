//! Log installation for the `handpoint` binaries.
//!
//! Libraries in this workspace only emit through the `log` macros. A binary
//! installs one sink at startup: either the plain stderr sink from
//! [`init_with_level`] or, with the `tracing` feature, a subscriber from
//! [`init_tracing`].
//!
//! Both honour `HANDPOINT_LOG`, a comma separated list of directives such as
//! `warn,handpoint_fusion=debug`. A bare level sets the default, `target=level`
//! overrides it for every target starting with `target`.

use std::io::Write;
use std::str::FromStr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use log::{LevelFilter, Log, Metadata, Record};

/// Environment variable holding per-target log directives.
pub const LOG_ENV: &str = "HANDPOINT_LOG";

/// Default level plus per-target overrides.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LogFilter {
    default: LevelFilter,
    /// Sorted longest target first so the most specific one wins.
    targets: Vec<(String, LevelFilter)>,
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid log directive '{0}'")]
pub struct LogDirectiveError(pub String);

impl LogFilter {
    pub fn new(default: LevelFilter) -> Self {
        Self {
            default,
            targets: Vec::new(),
        }
    }

    pub fn with_target(mut self, target: impl Into<String>, level: LevelFilter) -> Self {
        let target = target.into();
        self.targets.retain(|(t, _)| *t != target);
        self.targets.push((target, level));
        self.targets.sort_by(|a, b| b.0.len().cmp(&a.0.len()));
        self
    }

    /// Parse directives on top of `default`.
    pub fn parse(default: LevelFilter, directives: &str) -> Result<Self, LogDirectiveError> {
        let mut filter = Self::new(default);
        for directive in directives.split(',').map(str::trim).filter(|d| !d.is_empty()) {
            let bad = || LogDirectiveError(directive.to_owned());
            match directive.split_once('=') {
                Some((target, level)) => {
                    let level = LevelFilter::from_str(level.trim()).map_err(|_| bad())?;
                    let target = target.trim();
                    if target.is_empty() {
                        return Err(bad());
                    }
                    filter = filter.with_target(target, level);
                }
                None => filter.default = LevelFilter::from_str(directive).map_err(|_| bad())?,
            }
        }
        Ok(filter)
    }

    /// `default` refined by [`LOG_ENV`]; a malformed variable is reported and ignored.
    pub fn from_env_or(default: LevelFilter) -> Self {
        match std::env::var(LOG_ENV) {
            Ok(directives) => Self::parse(default, &directives).unwrap_or_else(|e| {
                eprintln!("{LOG_ENV}: {e}; using {default}");
                Self::new(default)
            }),
            Err(_) => Self::new(default),
        }
    }

    pub fn level_for(&self, target: &str) -> LevelFilter {
        self.targets
            .iter()
            .find(|(t, _)| target.starts_with(t.as_str()))
            .map_or(self.default, |(_, level)| *level)
    }

    /// Most verbose level any target can reach.
    pub fn max_level(&self) -> LevelFilter {
        self.targets
            .iter()
            .map(|(_, level)| *level)
            .fold(self.default, Ord::max)
    }
}

struct StderrSink {
    filter: LogFilter,
    started: Instant,
}

impl Log for StderrSink {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.filter.level_for(metadata.target())
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let line = format_line(self.started.elapsed().as_millis(), record);
        let _ = std::io::stderr().lock().write_all(line.as_bytes());
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

/// `+1204ms WARN handpoint_calib::solver: message`
fn format_line(elapsed_ms: u128, record: &Record) -> String {
    format!(
        "+{elapsed_ms}ms {} {}: {}\n",
        record.level(),
        record.target(),
        record.args()
    )
}

static INSTALLED: AtomicBool = AtomicBool::new(false);

/// Install the stderr sink at `level`, refined by [`LOG_ENV`].
///
/// Calls after the first successful installation are no-ops.
pub fn init_with_level(level: LevelFilter) -> Result<(), log::SetLoggerError> {
    init_with_filter(LogFilter::from_env_or(level))
}

/// Install the stderr sink with an explicit filter.
pub fn init_with_filter(filter: LogFilter) -> Result<(), log::SetLoggerError> {
    if INSTALLED.load(Ordering::Acquire) {
        return Ok(());
    }
    let max = filter.max_level();
    let sink: &'static StderrSink = Box::leak(Box::new(StderrSink {
        filter,
        started: Instant::now(),
    }));
    log::set_logger(sink)?;
    log::set_max_level(max);
    INSTALLED.store(true, Ordering::Release);
    Ok(())
}

/// Install a `tracing` subscriber filtered by [`LOG_ENV`], then `RUST_LOG`,
/// then `info`. `json` switches to one JSON object per event with span
/// close timings.
#[cfg(feature = "tracing")]
pub fn init_tracing(json: bool) {
    use tracing_subscriber::fmt::{self, format::FmtSpan};
    use tracing_subscriber::prelude::*;
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_env(LOG_ENV)
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);
    let installed = if json {
        registry
            .with(
                fmt::layer()
                    .json()
                    .flatten_event(true)
                    .with_span_events(FmtSpan::CLOSE),
            )
            .try_init()
    } else {
        registry
            .with(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_timer(fmt::time::Uptime::default()),
            )
            .try_init()
    };
    if installed.is_err() {
        log::debug!("tracing subscriber already installed");
    }
}
