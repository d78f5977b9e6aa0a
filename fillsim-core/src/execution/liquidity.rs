//! Liquidity constraints: participation limits on trade-bar volume.
//!
//! Optional. When enabled, a fill takes at most a fraction of the bar's
//! traded volume and the order is reported `PartiallyFilled`. The remainder
//! stays open and is evaluated again on later data.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiquidityPolicy {
    /// Maximum participation as a fraction of bar volume, in `(0, 1]`.
    /// Example: 0.10 fills at most 10% of the bar's volume.
    pub max_participation: Decimal,
}

impl LiquidityPolicy {
    pub fn new(max_participation: Decimal) -> Self {
        Self { max_participation }
    }

    pub fn is_valid(&self) -> bool {
        self.max_participation > Decimal::ZERO && self.max_participation <= Decimal::ONE
    }

    /// Maximum fillable quantity given bar volume.
    pub fn max_fill_qty(&self, bar_volume: Decimal) -> Decimal {
        bar_volume * self.max_participation
    }

    /// Apply the participation limit to an unsigned desired quantity.
    ///
    /// Returns `(fill_qty, remainder_qty)`. Sources without volume (quote
    /// bars, ticks, bars reporting zero volume) are not constrained.
    pub fn constrain(
        &self,
        desired_qty: Decimal,
        bar_volume: Option<Decimal>,
    ) -> (Decimal, Decimal) {
        let Some(volume) = bar_volume.filter(|v| *v > Decimal::ZERO) else {
            return (desired_qty, Decimal::ZERO);
        };
        let max_qty = self.max_fill_qty(volume);
        if desired_qty <= max_qty {
            (desired_qty, Decimal::ZERO)
        } else {
            (max_qty, desired_qty - max_qty)
        }
    }
}
