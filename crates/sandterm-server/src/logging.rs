//! Tracing setup for the server binary.
//!
//! Every log line in the workspace names one of the [`TARGETS`] below. The CLI picks a
//! verbosity that maps each target to a level; `--log target=level` adjusts single targets
//! and `RUST_LOG`, when set, replaces the whole filter.

use clap::ValueEnum;
use std::str::FromStr;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const PREFIX: &str = "sandterm";

/// Targets used under the `sandterm::` prefix.
pub const TARGETS: &[&str] = &["startup", "ws", "ws::ping", "console", "escape", "process"];

/// Target of tower-http's request traces.
const HTTP_TARGET: &str = "tower_http";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// How much the server says, from the CLI flags.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord)]
pub enum Verbosity {
    Quiet,
    #[default]
    Normal,
    Verbose,
    Debug,
    Trace,
}

impl Verbosity {
    /// `--quiet` beats everything, otherwise the loudest flag wins.
    pub fn from_flags(quiet: bool, verbose: bool, debug: bool, trace: bool) -> Self {
        match (quiet, trace, debug, verbose) {
            (true, ..) => Verbosity::Quiet,
            (_, true, ..) => Verbosity::Trace,
            (_, _, true, _) => Verbosity::Debug,
            (_, _, _, true) => Verbosity::Verbose,
            _ => Verbosity::Normal,
        }
    }

    /// Level for a `sandterm::` target at this verbosity.
    fn level_for(self, target: &str) -> LevelFilter {
        match (self, target) {
            (Verbosity::Quiet, _) => LevelFilter::WARN,
            // Keepalive pings only show up when tracing everything.
            (Verbosity::Trace, _) => LevelFilter::TRACE,
            (_, "ws::ping") => LevelFilter::OFF,
            // Dropped cursor targets are noise in normal operation.
            (Verbosity::Normal, "escape") => LevelFilter::WARN,
            (Verbosity::Normal | Verbosity::Verbose, _) => LevelFilter::INFO,
            (Verbosity::Debug, _) => LevelFilter::DEBUG,
        }
    }

    fn http_level(self) -> LevelFilter {
        match self {
            Verbosity::Quiet => LevelFilter::ERROR,
            Verbosity::Normal => LevelFilter::WARN,
            Verbosity::Verbose => LevelFilter::INFO,
            Verbosity::Debug => LevelFilter::DEBUG,
            Verbosity::Trace => LevelFilter::TRACE,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct LogSettings {
    pub verbosity: Verbosity,
    pub format: LogFormat,
    /// Per-target levels from `--log`, already prefixed.
    pub overrides: Vec<(String, LevelFilter)>,
}

impl LogSettings {
    pub fn new(verbosity: Verbosity, format: LogFormat) -> Self {
        Self {
            verbosity,
            format,
            overrides: Vec::new(),
        }
    }

    /// Add `target=level` pairs; each argument may hold several, comma separated.
    ///
    /// Bare targets get the `sandterm::` prefix. Pairs with an unknown level are skipped.
    pub fn with_overrides<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for arg in args {
            for pair in arg.as_ref().split(',') {
                let Some((target, level)) = pair.split_once('=') else {
                    continue;
                };
                let Ok(level) = LevelFilter::from_str(level.trim()) else {
                    continue;
                };
                self.overrides.push((qualify(target.trim()), level));
            }
        }
        self
    }

    /// Filter directives, one per target; overrides replace the verbosity's level.
    pub fn directives(&self) -> Vec<String> {
        let mut levels: Vec<(String, LevelFilter)> = TARGETS
            .iter()
            .map(|target| (format!("{}::{}", PREFIX, target), self.verbosity.level_for(target)))
            .collect();
        levels.push((HTTP_TARGET.to_string(), self.verbosity.http_level()));

        for (target, level) in &self.overrides {
            match levels.iter_mut().find(|(t, _)| t == target) {
                Some(entry) => entry.1 = *level,
                None => levels.push((target.clone(), *level)),
            }
        }

        levels
            .into_iter()
            .map(|(target, level)| format!("{}={}", target, level.to_string().to_lowercase()))
            .collect()
    }

    pub fn filter(&self) -> EnvFilter {
        if let Ok(env_filter) = EnvFilter::try_from_default_env() {
            return env_filter;
        }
        EnvFilter::try_new(self.directives().join(",")).unwrap_or_else(|_| EnvFilter::new("info"))
    }
}

fn qualify(target: &str) -> String {
    if target == PREFIX || target.starts_with("sandterm::") || target == HTTP_TARGET {
        target.to_string()
    } else {
        format!("{}::{}", PREFIX, target)
    }
}

/// Install the global subscriber.
pub fn init(settings: &LogSettings) {
    let registry = tracing_subscriber::registry().with(settings.filter());
    match settings.format {
        LogFormat::Text => registry.with(fmt::layer().with_target(true)).init(),
        LogFormat::Json => registry
            .with(fmt::layer().json().with_target(true).with_current_span(false))
            .init(),
    }
}
