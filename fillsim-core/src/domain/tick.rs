//! Ticks: individual trades and top-of-book quotes.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::bar::Ohlc;
use super::order::OrderSide;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TickKind {
    Trade,
    Quote,
}

/// A single tick. Trade ticks carry `value`; quote ticks carry `bid`/`ask`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tick {
    pub kind: TickKind,
    pub time: DateTime<Utc>,
    pub value: Decimal,
    #[serde(default)]
    pub quantity: Decimal,
    #[serde(default)]
    pub bid: Option<Decimal>,
    #[serde(default)]
    pub ask: Option<Decimal>,
    #[serde(default)]
    pub fill_forward: bool,
}

impl Tick {
    pub fn trade(time: DateTime<Utc>, value: Decimal, quantity: Decimal) -> Self {
        Self {
            kind: TickKind::Trade,
            time,
            value,
            quantity,
            bid: None,
            ask: None,
            fill_forward: false,
        }
    }

    pub fn quote(time: DateTime<Utc>, bid: Option<Decimal>, ask: Option<Decimal>) -> Self {
        let value = match (bid, ask) {
            (Some(b), Some(a)) => (b + a) / Decimal::TWO,
            (Some(p), None) | (None, Some(p)) => p,
            (None, None) => Decimal::ZERO,
        };
        Self {
            kind: TickKind::Quote,
            time,
            value,
            quantity: Decimal::ZERO,
            bid,
            ask,
            fill_forward: false,
        }
    }

    pub fn fill_forwarded(mut self) -> Self {
        self.fill_forward = true;
        self
    }

    pub fn is_trade(&self) -> bool {
        self.kind == TickKind::Trade
    }

    /// Price an order on `side` would see from this tick.
    ///
    /// Trade ticks report their traded value; quote ticks the ask for buys
    /// and the bid for sells. Non-positive prices are treated as absent.
    pub fn price_for(&self, side: OrderSide) -> Option<Decimal> {
        let price = match self.kind {
            TickKind::Trade => Some(self.value),
            TickKind::Quote => match side {
                OrderSide::Buy => self.ask,
                OrderSide::Sell => self.bid,
            },
        };
        price.filter(|p| *p > Decimal::ZERO)
    }

    /// The tick as a single-point bar for range logic.
    pub fn as_ohlc(&self, side: OrderSide) -> Option<Ohlc> {
        self.price_for(side).map(Ohlc::point)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;

    fn at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 2, 15, 0, 0).unwrap()
    }

    #[test]
    fn trade_tick_prices_both_sides_the_same() {
        let tick = Tick::trade(at(), dec!(291.50), dec!(100));
        assert_eq!(tick.price_for(OrderSide::Buy), Some(dec!(291.50)));
        assert_eq!(tick.price_for(OrderSide::Sell), Some(dec!(291.50)));
    }

    #[test]
    fn quote_tick_prices_by_side() {
        let tick = Tick::quote(at(), Some(dec!(99.98)), Some(dec!(100.02)));
        assert_eq!(tick.value, dec!(100.00));
        assert_eq!(tick.price_for(OrderSide::Buy), Some(dec!(100.02)));
        assert_eq!(tick.price_for(OrderSide::Sell), Some(dec!(99.98)));
    }

    #[test]
    fn missing_or_zero_prices_are_absent() {
        let bid_only = Tick::quote(at(), Some(dec!(99.98)), None);
        assert_eq!(bid_only.price_for(OrderSide::Buy), None);

        let zero = Tick::trade(at(), Decimal::ZERO, dec!(1));
        assert_eq!(zero.price_for(OrderSide::Buy), None);
    }

    #[test]
    fn tick_is_a_point_bar() {
        let tick = Tick::trade(at(), dec!(42), dec!(1));
        let ohlc = tick.as_ohlc(OrderSide::Buy).unwrap();
        assert_eq!(ohlc, Ohlc::point(dec!(42)));
    }
}
