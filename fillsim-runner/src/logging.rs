//! Tracing subscriber setup.
//!
//! # Environment variables
//!
//! - `RUST_LOG`: standard filter directives (e.g. `info,fillsim_core=debug`)
//! - `LOG_LEVEL`: default level when `RUST_LOG` is unset
//! - `LOG_FORMAT`: `pretty` (default), `compact` or `json`

use std::env;
use std::io::IsTerminal;

use anyhow::{anyhow, Result};
use tracing_subscriber::fmt::time::ChronoUtc;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3fZ";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Multi-line, human-readable.
    #[default]
    Pretty,
    /// One line per event.
    Compact,
    /// Newline-delimited JSON.
    Json,
}

impl LogFormat {
    /// Unknown names fall back to `Pretty`.
    pub fn parse(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "json" => Self::Json,
            "compact" => Self::Compact,
            _ => Self::Pretty,
        }
    }
}

#[derive(Debug, Clone)]
pub struct LogConfig {
    pub format: LogFormat,
    /// Filter used when `RUST_LOG` is not set.
    pub default_level: String,
    /// Include file and line of each event.
    pub include_location: bool,
    pub include_target: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            format: LogFormat::Pretty,
            default_level: "info".to_string(),
            include_location: false,
            include_target: true,
        }
    }
}

impl LogConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            format: lookup("LOG_FORMAT")
                .map(|s| LogFormat::parse(&s))
                .unwrap_or_default(),
            default_level: lookup("LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
            ..Self::default()
        }
    }

    pub fn json() -> Self {
        Self {
            format: LogFormat::Json,
            include_location: true,
            ..Self::default()
        }
    }

    pub fn with_default_level(mut self, level: impl Into<String>) -> Self {
        self.default_level = level.into();
        self
    }

    fn filter(&self) -> Result<EnvFilter> {
        self.filter_with(env::var(EnvFilter::DEFAULT_ENV).ok().as_deref())
    }

    /// `directives` (from `RUST_LOG`) win when they parse.
    fn filter_with(&self, directives: Option<&str>) -> Result<EnvFilter> {
        if let Some(filter) = directives.and_then(|d| EnvFilter::try_new(d).ok()) {
            return Ok(filter);
        }
        EnvFilter::try_new(&self.default_level)
            .map_err(|e| anyhow!("invalid log level {:?}: {e}", self.default_level))
    }
}

/// Install the global subscriber.
///
/// # Errors
///
/// Fails on an unparsable level, or when a global subscriber is already set.
pub fn init(config: &LogConfig) -> Result<()> {
    let filter = config.filter()?;
    let layer = fmt::layer()
        .with_timer(ChronoUtc::new(TIMESTAMP_FORMAT.to_string()))
        .with_target(config.include_target)
        .with_file(config.include_location)
        .with_line_number(config.include_location);
    let registry = tracing_subscriber::registry().with(filter);

    match config.format {
        LogFormat::Pretty => registry
            .with(layer.with_ansi(std::io::stdout().is_terminal()).pretty())
            .try_init(),
        LogFormat::Compact => registry
            .with(layer.with_ansi(std::io::stdout().is_terminal()).compact())
            .try_init(),
        LogFormat::Json => registry.with(layer.json()).try_init(),
    }
    .map_err(|e| anyhow!("failed to install tracing subscriber: {e}"))
}
