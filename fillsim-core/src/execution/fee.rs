//! Fee models.
//!
//! The engine hands the fill decision to a `FeeModel` and stores whatever it
//! returns in `FillResult::fee`, unchanged. Any
//! `Fn(&FeeContext) -> Decimal + Send + Sync` closure is a fee model.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::Order;

/// The fill decision a fee is computed for.
#[derive(Debug, Clone, Copy)]
pub struct FeeContext<'a> {
    pub order: &'a Order,
    /// Signed fill quantity.
    pub quantity: Decimal,
    pub price: Decimal,
    pub time: DateTime<Utc>,
}

impl FeeContext<'_> {
    pub fn notional(&self) -> Decimal {
        self.quantity.abs() * self.price
    }
}

pub trait FeeModel: Send + Sync {
    fn fee(&self, ctx: &FeeContext<'_>) -> Decimal;

    fn name(&self) -> &str {
        "custom"
    }
}

impl<F> FeeModel for F
where
    F: Fn(&FeeContext<'_>) -> Decimal + Send + Sync,
{
    fn fee(&self, ctx: &FeeContext<'_>) -> Decimal {
        self(ctx)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NoFee;

impl FeeModel for NoFee {
    fn fee(&self, _ctx: &FeeContext<'_>) -> Decimal {
        Decimal::ZERO
    }

    fn name(&self) -> &str {
        "none"
    }
}

/// Commission in basis points of notional.
#[derive(Debug, Clone, Copy)]
pub struct BpsFee {
    pub bps: Decimal,
}

impl FeeModel for BpsFee {
    fn fee(&self, ctx: &FeeContext<'_>) -> Decimal {
        ctx.notional() * self.bps / Decimal::from(10_000)
    }

    fn name(&self) -> &str {
        "bps"
    }
}

/// Fixed amount per unit, with a per-fill minimum.
#[derive(Debug, Clone, Copy)]
pub struct PerUnitFee {
    pub per_unit: Decimal,
    pub minimum: Decimal,
}

impl FeeModel for PerUnitFee {
    fn fee(&self, ctx: &FeeContext<'_>) -> Decimal {
        (ctx.quantity.abs() * self.per_unit).max(self.minimum)
    }

    fn name(&self) -> &str {
        "per_unit"
    }
}

/// Serializable fee selection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "model", rename_all = "snake_case")]
pub enum FeeConfig {
    #[default]
    None,
    Bps {
        bps: Decimal,
    },
    PerUnit {
        per_unit: Decimal,
        #[serde(default)]
        minimum: Decimal,
    },
}

impl FeeConfig {
    pub fn is_valid(&self) -> bool {
        match self {
            Self::None => true,
            Self::Bps { bps } => *bps >= Decimal::ZERO,
            Self::PerUnit { per_unit, minimum } => {
                *per_unit >= Decimal::ZERO && *minimum >= Decimal::ZERO
            }
        }
    }

    pub fn build(&self) -> Box<dyn FeeModel> {
        match *self {
            Self::None => Box::new(NoFee),
            Self::Bps { bps } => Box::new(BpsFee { bps }),
            Self::PerUnit { per_unit, minimum } => Box::new(PerUnitFee { per_unit, minimum }),
        }
    }
}
