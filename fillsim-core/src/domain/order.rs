//! Orders, their families, and the state an order carries between evaluations.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::fill::{FillResult, FillStatus};
use crate::error::FillError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct OrderId(pub u64);

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for OrderId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderSide {
    Buy,
    Sell,
}

impl OrderSide {
    /// Side encoded by a signed quantity. Zero has no side.
    pub fn from_quantity(quantity: Decimal) -> Option<Self> {
        if quantity > Decimal::ZERO {
            Some(Self::Buy)
        } else if quantity < Decimal::ZERO {
            Some(Self::Sell)
        } else {
            None
        }
    }
}

/// How a trailing stop's distance from the market is expressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TrailingType {
    /// Fixed price distance.
    Amount,
    /// Fraction of the reference price (0.05 = 5%).
    Percentage,
}

impl TrailingType {
    /// Stop price trailing `reference` by `amount` on the protective side.
    ///
    /// Sell stops sit below the market, buy stops above it.
    pub fn stop_from(self, reference: Decimal, side: OrderSide, amount: Decimal) -> Decimal {
        match (self, side) {
            (Self::Amount, OrderSide::Sell) => reference - amount,
            (Self::Amount, OrderSide::Buy) => reference + amount,
            (Self::Percentage, OrderSide::Sell) => reference * (Decimal::ONE - amount),
            (Self::Percentage, OrderSide::Buy) => reference * (Decimal::ONE + amount),
        }
    }
}

/// Order family and its immutable price parameters.
///
/// `TrailingStop::stop_price` is the one parameter that moves: the engine
/// ratchets it as the market moves in the position's favor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum OrderKind {
    /// Fill at the current market price.
    Market,
    /// Fill at the limit price or better.
    Limit { limit_price: Decimal },
    /// Trigger at the stop price, then fill at market.
    StopMarket { stop_price: Decimal },
    /// Trigger at the stop price, then rest as a limit order.
    StopLimit {
        stop_price: Decimal,
        limit_price: Decimal,
    },
    /// Trigger when trades touch the trigger price, then fill at the limit.
    LimitIfTouched {
        trigger_price: Decimal,
        limit_price: Decimal,
    },
    /// Stop that follows the market at a fixed distance.
    TrailingStop {
        stop_price: Decimal,
        trailing_amount: Decimal,
        trailing_type: TrailingType,
    },
    /// Fill at the next regular session's opening price.
    MarketOnOpen,
    /// Fill at the next regular session's closing price.
    MarketOnClose,
}

impl OrderKind {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Market => "market",
            Self::Limit { .. } => "limit",
            Self::StopMarket { .. } => "stop_market",
            Self::StopLimit { .. } => "stop_limit",
            Self::LimitIfTouched { .. } => "limit_if_touched",
            Self::TrailingStop { .. } => "trailing_stop",
            Self::MarketOnOpen => "market_on_open",
            Self::MarketOnClose => "market_on_close",
        }
    }
}

/// Latched "trigger condition has been satisfied" flag.
///
/// Moves from untouched to touched once and never back. The touch time is
/// the end of the observation (or the tick) that satisfied the trigger.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TriggerLatch {
    touched_at: Option<DateTime<Utc>>,
}

impl TriggerLatch {
    pub fn is_touched(&self) -> bool {
        self.touched_at.is_some()
    }

    pub fn touched_at(&self) -> Option<DateTime<Utc>> {
        self.touched_at
    }

    /// Set the latch. Returns `true` only on the first call; later calls keep
    /// the original touch time.
    pub(crate) fn mark(&mut self, at: DateTime<Utc>) -> bool {
        if self.touched_at.is_some() {
            return false;
        }
        self.touched_at = Some(at);
        true
    }
}

/// Which observation a trailing stop has already absorbed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct TrailingProgress {
    /// End time of the last observation applied to the stop.
    pub applied_through: DateTime<Utc>,
    /// Stop price in effect before that observation was applied.
    pub stop_before: Decimal,
}

/// A single order under simulation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub symbol: String,
    /// Signed quantity: positive buys, negative sells.
    pub quantity: Decimal,
    pub submitted_at: DateTime<Utc>,
    pub kind: OrderKind,
    filled_quantity: Decimal,
    latch: TriggerLatch,
    trailing_progress: Option<TrailingProgress>,
}

impl Order {
    pub fn new(
        id: impl Into<OrderId>,
        symbol: impl Into<String>,
        quantity: Decimal,
        submitted_at: DateTime<Utc>,
        kind: OrderKind,
    ) -> Self {
        Self {
            id: id.into(),
            symbol: symbol.into(),
            quantity,
            submitted_at,
            kind,
            filled_quantity: Decimal::ZERO,
            latch: TriggerLatch::default(),
            trailing_progress: None,
        }
    }

    pub fn market(
        id: impl Into<OrderId>,
        symbol: impl Into<String>,
        quantity: Decimal,
        submitted_at: DateTime<Utc>,
    ) -> Self {
        Self::new(id, symbol, quantity, submitted_at, OrderKind::Market)
    }

    pub fn limit(
        id: impl Into<OrderId>,
        symbol: impl Into<String>,
        quantity: Decimal,
        submitted_at: DateTime<Utc>,
        limit_price: Decimal,
    ) -> Self {
        Self::new(
            id,
            symbol,
            quantity,
            submitted_at,
            OrderKind::Limit { limit_price },
        )
    }

    pub fn stop_market(
        id: impl Into<OrderId>,
        symbol: impl Into<String>,
        quantity: Decimal,
        submitted_at: DateTime<Utc>,
        stop_price: Decimal,
    ) -> Self {
        Self::new(
            id,
            symbol,
            quantity,
            submitted_at,
            OrderKind::StopMarket { stop_price },
        )
    }

    pub fn stop_limit(
        id: impl Into<OrderId>,
        symbol: impl Into<String>,
        quantity: Decimal,
        submitted_at: DateTime<Utc>,
        stop_price: Decimal,
        limit_price: Decimal,
    ) -> Self {
        Self::new(
            id,
            symbol,
            quantity,
            submitted_at,
            OrderKind::StopLimit {
                stop_price,
                limit_price,
            },
        )
    }

    pub fn limit_if_touched(
        id: impl Into<OrderId>,
        symbol: impl Into<String>,
        quantity: Decimal,
        submitted_at: DateTime<Utc>,
        trigger_price: Decimal,
        limit_price: Decimal,
    ) -> Self {
        Self::new(
            id,
            symbol,
            quantity,
            submitted_at,
            OrderKind::LimitIfTouched {
                trigger_price,
                limit_price,
            },
        )
    }

    pub fn trailing_stop(
        id: impl Into<OrderId>,
        symbol: impl Into<String>,
        quantity: Decimal,
        submitted_at: DateTime<Utc>,
        stop_price: Decimal,
        trailing_amount: Decimal,
        trailing_type: TrailingType,
    ) -> Self {
        Self::new(
            id,
            symbol,
            quantity,
            submitted_at,
            OrderKind::TrailingStop {
                stop_price,
                trailing_amount,
                trailing_type,
            },
        )
    }

    /// Trailing stop whose initial stop trails `market_price` by the
    /// configured distance.
    pub fn trailing_stop_from_market(
        id: impl Into<OrderId>,
        symbol: impl Into<String>,
        quantity: Decimal,
        submitted_at: DateTime<Utc>,
        market_price: Decimal,
        trailing_amount: Decimal,
        trailing_type: TrailingType,
    ) -> Self {
        let side = OrderSide::from_quantity(quantity).unwrap_or(OrderSide::Buy);
        let stop_price = trailing_type.stop_from(market_price, side, trailing_amount);
        Self::trailing_stop(
            id,
            symbol,
            quantity,
            submitted_at,
            stop_price,
            trailing_amount,
            trailing_type,
        )
    }

    pub fn market_on_open(
        id: impl Into<OrderId>,
        symbol: impl Into<String>,
        quantity: Decimal,
        submitted_at: DateTime<Utc>,
    ) -> Self {
        Self::new(id, symbol, quantity, submitted_at, OrderKind::MarketOnOpen)
    }

    pub fn market_on_close(
        id: impl Into<OrderId>,
        symbol: impl Into<String>,
        quantity: Decimal,
        submitted_at: DateTime<Utc>,
    ) -> Self {
        Self::new(id, symbol, quantity, submitted_at, OrderKind::MarketOnClose)
    }

    pub fn side(&self) -> Option<OrderSide> {
        OrderSide::from_quantity(self.quantity)
    }

    pub fn filled_quantity(&self) -> Decimal {
        self.filled_quantity
    }

    /// Signed quantity still to be filled.
    pub fn remaining_quantity(&self) -> Decimal {
        self.quantity - self.filled_quantity
    }

    pub fn is_filled(&self) -> bool {
        !self.quantity.is_zero() && self.remaining_quantity().is_zero()
    }

    pub fn latch(&self) -> &TriggerLatch {
        &self.latch
    }

    pub fn is_touched(&self) -> bool {
        self.latch.is_touched()
    }

    pub(crate) fn latch_mut(&mut self) -> &mut TriggerLatch {
        &mut self.latch
    }

    /// Current stop price for the stop families.
    pub fn stop_price(&self) -> Option<Decimal> {
        match &self.kind {
            OrderKind::StopMarket { stop_price }
            | OrderKind::StopLimit { stop_price, .. }
            | OrderKind::TrailingStop { stop_price, .. } => Some(*stop_price),
            _ => None,
        }
    }

    pub(crate) fn trailing_progress(&self) -> Option<TrailingProgress> {
        self.trailing_progress
    }

    /// Move a trailing stop to `new_stop` and record the observation that
    /// produced it. A stop that would retreat against the position is a
    /// contract failure.
    pub(crate) fn ratchet_trailing_stop(
        &mut self,
        new_stop: Decimal,
        progress: TrailingProgress,
    ) -> Result<bool, FillError> {
        let side = self
            .side()
            .ok_or_else(|| FillError::invariant(self.id, "zero quantity order"))?;
        let id = self.id;
        let OrderKind::TrailingStop { stop_price, .. } = &mut self.kind else {
            return Err(FillError::invariant(id, "not a trailing stop"));
        };
        let retreats = match side {
            OrderSide::Sell => new_stop < *stop_price,
            OrderSide::Buy => new_stop > *stop_price,
        };
        if retreats {
            return Err(FillError::invariant(
                id,
                format!("trailing stop would retreat from {stop_price} to {new_stop}"),
            ));
        }
        let changed = new_stop != *stop_price;
        *stop_price = new_stop;
        self.trailing_progress = Some(progress);
        Ok(changed)
    }

    /// Accumulate a fill reported by the engine.
    ///
    /// The driver calls this after each evaluation. A fill whose sign does
    /// not match the order, or that would overfill it, is rejected.
    pub fn record_fill(&mut self, fill: &FillResult) -> Result<(), FillError> {
        if fill.order_id != self.id {
            return Err(FillError::invariant(
                self.id,
                format!("fill belongs to order {}", fill.order_id),
            ));
        }
        if fill.status == FillStatus::None {
            return Ok(());
        }
        let side = self
            .side()
            .ok_or_else(|| FillError::invariant(self.id, "zero quantity order"))?;
        if OrderSide::from_quantity(fill.quantity) != Some(side) {
            return Err(FillError::invariant(
                self.id,
                format!(
                    "fill quantity {} does not match order quantity {}",
                    fill.quantity, self.quantity
                ),
            ));
        }
        let filled = self.filled_quantity + fill.quantity;
        if filled.abs() > self.quantity.abs() {
            return Err(FillError::invariant(
                self.id,
                format!("fill of {} overfills order of {}", filled, self.quantity),
            ));
        }
        self.filled_quantity = filled;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 2, 15, 0, 0).unwrap()
    }

    fn filled(order: &Order, quantity: Decimal) -> FillResult {
        FillResult {
            order_id: order.id,
            status: FillStatus::Filled,
            quantity,
            price: dec!(100),
            fee: Decimal::ZERO,
            time: t0(),
        }
    }

    #[test]
    fn side_follows_quantity_sign() {
        assert_eq!(OrderSide::from_quantity(dec!(10)), Some(OrderSide::Buy));
        assert_eq!(OrderSide::from_quantity(dec!(-10)), Some(OrderSide::Sell));
        assert_eq!(OrderSide::from_quantity(Decimal::ZERO), None);
    }

    #[test]
    fn latch_keeps_first_touch_time() {
        let mut latch = TriggerLatch::default();
        assert!(!latch.is_touched());
        assert!(latch.mark(t0()));
        let later = t0() + chrono::Duration::minutes(5);
        assert!(!latch.mark(later));
        assert_eq!(latch.touched_at(), Some(t0()));
    }

    #[test]
    fn trailing_amounts_sit_on_protective_side() {
        assert_eq!(
            TrailingType::Amount.stop_from(dec!(100), OrderSide::Sell, dec!(5)),
            dec!(95)
        );
        assert_eq!(
            TrailingType::Amount.stop_from(dec!(100), OrderSide::Buy, dec!(5)),
            dec!(105)
        );
        assert_eq!(
            TrailingType::Percentage.stop_from(dec!(200), OrderSide::Sell, dec!(0.05)),
            dec!(190)
        );
        assert_eq!(
            TrailingType::Percentage.stop_from(dec!(200), OrderSide::Buy, dec!(0.05)),
            dec!(210)
        );
    }

    #[test]
    fn trailing_stop_from_market_seeds_stop() {
        let order = Order::trailing_stop_from_market(
            1,
            "ES",
            dec!(-1),
            t0(),
            dec!(4500),
            dec!(5),
            TrailingType::Amount,
        );
        assert_eq!(order.stop_price(), Some(dec!(4495)));
    }

    #[test]
    fn trailing_stop_never_retreats() {
        let mut order = Order::trailing_stop(
            1,
            "SPY",
            dec!(-10),
            t0(),
            dec!(95),
            dec!(5),
            TrailingType::Amount,
        );
        let progress = TrailingProgress {
            applied_through: t0(),
            stop_before: dec!(95),
        };
        assert_eq!(order.ratchet_trailing_stop(dec!(97), progress), Ok(true));
        assert_eq!(order.stop_price(), Some(dec!(97)));
        assert!(order.ratchet_trailing_stop(dec!(96), progress).is_err());
        assert_eq!(order.stop_price(), Some(dec!(97)));
    }

    #[test]
    fn record_fill_accumulates_and_rejects_overfill() {
        let mut order = Order::market(1, "SPY", dec!(100), t0());
        order.record_fill(&filled(&order, dec!(40))).unwrap();
        assert_eq!(order.remaining_quantity(), dec!(60));
        assert!(!order.is_filled());

        assert!(order.record_fill(&filled(&order, dec!(70))).is_err());
        order.record_fill(&filled(&order, dec!(60))).unwrap();
        assert!(order.is_filled());
    }

    #[test]
    fn record_fill_rejects_sign_mismatch() {
        let mut order = Order::market(1, "SPY", dec!(-100), t0());
        let err = order.record_fill(&filled(&order, dec!(100))).unwrap_err();
        assert!(matches!(err, FillError::InvariantViolation { .. }));
        assert_eq!(order.filled_quantity(), Decimal::ZERO);
    }

    #[test]
    fn order_serialization_roundtrip() {
        let order = Order::stop_limit(42, "AAPL", dec!(50), t0(), dec!(150), dec!(151));
        let json = serde_json::to_string(&order).unwrap();
        let back: Order = serde_json::from_str(&json).unwrap();
        assert_eq!(order, back);
    }
}
