//! Serializable run configuration.
//!
//! A run is one fill configuration plus the securities it trades:
//!
//! ```toml
//! preset = "realistic"
//!
//! [[securities]]
//! symbol = "SPY"
//! hours = "us_equity"
//! price_increment = "0.01"
//!
//! [[securities]]
//! symbol = "ES"
//! hours = "cme_equity_futures"
//! extended_market_hours = true
//! price_increment = "0.25"
//! ```

use std::collections::BTreeSet;
use std::path::Path;

use anyhow::{Context, Result};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use fillsim_core::domain::ExchangeHours;
use fillsim_core::execution::{ConfigError, FillConfig, FillPreset};
use fillsim_core::market::Security;

// ─── Error type ──────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum RunConfigError {
    #[error("failed to parse run config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error(transparent)]
    Fill(#[from] ConfigError),
    #[error("set either `preset` or `[fill]`, not both")]
    PresetAndFill,
    #[error("security {0} is listed more than once")]
    DuplicateSymbol(String),
    #[error("security {symbol}: price_increment must be non-negative, got {increment}")]
    NegativeIncrement { symbol: String, increment: Decimal },
}

// ─── Exchange hours ──────────────────────────────────────────────────

/// Built-in exchange calendars.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HoursPreset {
    UsEquity,
    CmeEquityFutures,
    AlwaysOpen,
}

impl HoursPreset {
    pub fn hours(self) -> ExchangeHours {
        match self {
            Self::UsEquity => ExchangeHours::us_equity(),
            Self::CmeEquityFutures => ExchangeHours::cme_equity_futures(),
            Self::AlwaysOpen => ExchangeHours::always_open(),
        }
    }
}

/// A preset name, or a full calendar table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum HoursConfig {
    Preset(HoursPreset),
    Custom(ExchangeHours),
}

impl Default for HoursConfig {
    fn default() -> Self {
        Self::Preset(HoursPreset::UsEquity)
    }
}

impl HoursConfig {
    pub fn hours(&self) -> ExchangeHours {
        match self {
            Self::Preset(preset) => preset.hours(),
            Self::Custom(hours) => hours.clone(),
        }
    }
}

// ─── Securities ──────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SecurityConfig {
    pub symbol: String,
    /// Allow fills during pre-market, after-hours and overnight sessions.
    #[serde(default)]
    pub extended_market_hours: bool,
    /// Minimum price variation; zero disables rounding.
    #[serde(default)]
    pub price_increment: Decimal,
    // Last: a custom calendar serializes as a sub-table.
    #[serde(default)]
    pub hours: HoursConfig,
}

impl SecurityConfig {
    pub fn new(symbol: impl Into<String>, hours: HoursConfig) -> Self {
        Self {
            symbol: symbol.into(),
            extended_market_hours: false,
            price_increment: Decimal::ZERO,
            hours,
        }
    }

    /// A fresh security with an empty market data cache.
    pub fn build(&self) -> Security {
        Security::new(self.symbol.clone(), self.hours.hours())
            .with_extended_market_hours(self.extended_market_hours)
            .with_price_increment(self.price_increment)
    }
}

// ─── Run config ──────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunConfig {
    /// Named fill settings. Mutually exclusive with `fill`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preset: Option<FillPreset>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fill: Option<FillConfig>,
    #[serde(default)]
    pub securities: Vec<SecurityConfig>,
}

impl RunConfig {
    /// The effective fill settings: the preset, the explicit table, or defaults.
    pub fn fill_config(&self) -> FillConfig {
        match (self.preset, self.fill) {
            (_, Some(fill)) => fill,
            (Some(preset), None) => preset.config(),
            (None, None) => FillConfig::default(),
        }
    }

    pub fn from_toml_str(content: &str) -> Result<Self, RunConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Read and validate a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read run config {}", path.display()))?;
        Self::from_toml_str(&content)
            .with_context(|| format!("Invalid run config {}", path.display()))
    }

    pub fn validate(&self) -> Result<(), RunConfigError> {
        if self.preset.is_some() && self.fill.is_some() {
            return Err(RunConfigError::PresetAndFill);
        }
        self.fill_config().validate()?;

        let mut seen = BTreeSet::new();
        for security in &self.securities {
            if !seen.insert(security.symbol.as_str()) {
                return Err(RunConfigError::DuplicateSymbol(security.symbol.clone()));
            }
            if security.price_increment < Decimal::ZERO {
                return Err(RunConfigError::NegativeIncrement {
                    symbol: security.symbol.clone(),
                    increment: security.price_increment,
                });
            }
        }
        Ok(())
    }
}
