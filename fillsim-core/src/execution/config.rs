//! Fill engine configuration and named presets.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::fee::FeeConfig;
use super::gap::GapPolicy;
use super::liquidity::LiquidityPolicy;

// ─── Error type ──────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to parse fill config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("max_participation must be in (0, 1], got {0}")]
    Participation(Decimal),
    #[error("fee parameters must be non-negative")]
    NegativeFee,
}

// ─── Config ──────────────────────────────────────────────────────────

/// Everything the fill engine needs besides the market and the orders.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FillConfig {
    #[serde(default)]
    pub gap_policy: GapPolicy,
    /// Participation cap on trade-bar volume. `None` fills in full.
    #[serde(default)]
    pub liquidity: Option<LiquidityPolicy>,
    #[serde(default)]
    pub fees: FeeConfig,
}

impl FillConfig {
    pub fn from_preset(preset: FillPreset) -> Self {
        preset.config()
    }

    pub fn frictionless() -> Self {
        Self::from_preset(FillPreset::Frictionless)
    }

    /// Parse and validate a TOML document.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(liquidity) = &self.liquidity {
            if !liquidity.is_valid() {
                return Err(ConfigError::Participation(liquidity.max_participation));
            }
        }
        if !self.fees.is_valid() {
            return Err(ConfigError::NegativeFee);
        }
        Ok(())
    }
}

/// Named bundles of gap, liquidity and fee settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FillPreset {
    /// Stops fill at their trigger, no participation cap, no fees.
    Frictionless,
    /// Gaps fill at the open, 1 bp commission.
    Realistic,
    /// Worst-of gap fills, 10% participation cap, 5 bp commission.
    Hostile,
}

impl FillPreset {
    pub fn config(self) -> FillConfig {
        match self {
            Self::Frictionless => FillConfig {
                gap_policy: GapPolicy::FillAtTrigger,
                liquidity: None,
                fees: FeeConfig::None,
            },
            Self::Realistic => FillConfig {
                gap_policy: GapPolicy::FillAtOpen,
                liquidity: None,
                fees: FeeConfig::Bps {
                    bps: Decimal::ONE,
                },
            },
            Self::Hostile => FillConfig {
                gap_policy: GapPolicy::FillAtWorst,
                liquidity: Some(LiquidityPolicy::new(Decimal::new(10, 2))),
                fees: FeeConfig::Bps {
                    bps: Decimal::from(5),
                },
            },
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Frictionless => "frictionless",
            Self::Realistic => "realistic",
            Self::Hostile => "hostile",
        }
    }
}
