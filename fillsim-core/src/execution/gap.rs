//! Gap-through handling for stop fills.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::OrderSide;

/// Fill price when a bar opens beyond a stop's trigger.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GapPolicy {
    /// Fill at the open (worse than trigger, the realistic default).
    #[default]
    FillAtOpen,
    /// Fill at the trigger level (optimistic).
    FillAtTrigger,
    /// Fill at the worse of open and trigger for the order's side.
    FillAtWorst,
}

impl GapPolicy {
    pub fn resolve(self, open: Decimal, trigger: Decimal, side: OrderSide) -> Decimal {
        match self {
            Self::FillAtOpen => open,
            Self::FillAtTrigger => trigger,
            Self::FillAtWorst => match side {
                OrderSide::Buy => open.max(trigger),
                OrderSide::Sell => open.min(trigger),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn gap_up_through_buy_stop() {
        let (open, stop) = (dec!(105), dec!(100));
        assert_eq!(GapPolicy::FillAtOpen.resolve(open, stop, OrderSide::Buy), dec!(105));
        assert_eq!(GapPolicy::FillAtTrigger.resolve(open, stop, OrderSide::Buy), dec!(100));
        assert_eq!(GapPolicy::FillAtWorst.resolve(open, stop, OrderSide::Buy), dec!(105));
    }

    #[test]
    fn gap_down_through_sell_stop() {
        let (open, stop) = (dec!(95), dec!(100));
        assert_eq!(GapPolicy::FillAtOpen.resolve(open, stop, OrderSide::Sell), dec!(95));
        assert_eq!(GapPolicy::FillAtTrigger.resolve(open, stop, OrderSide::Sell), dec!(100));
        assert_eq!(GapPolicy::FillAtWorst.resolve(open, stop, OrderSide::Sell), dec!(95));
    }

    #[test]
    fn default_is_fill_at_open() {
        assert_eq!(GapPolicy::default(), GapPolicy::FillAtOpen);
    }
}
