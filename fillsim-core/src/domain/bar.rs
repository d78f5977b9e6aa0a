//! Bars: aggregated trade and quote observations.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::order::OrderSide;

/// Open/high/low/close prices of one bar (or one side of a quote bar).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ohlc {
    pub open: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    pub close: Decimal,
}

impl Ohlc {
    pub fn new(open: Decimal, high: Decimal, low: Decimal, close: Decimal) -> Self {
        Self {
            open,
            high,
            low,
            close,
        }
    }

    /// A single price seen as a bar: open = high = low = close.
    pub fn point(price: Decimal) -> Self {
        Self::new(price, price, price, price)
    }

    /// Basic sanity check: high bounds everything, low is bounded by everything.
    pub fn is_sane(&self) -> bool {
        self.high >= self.low
            && self.high >= self.open
            && self.high >= self.close
            && self.low <= self.open
            && self.low <= self.close
            && self.low > Decimal::ZERO
    }

    /// Net direction of the bar. Flat bars count as rising.
    pub fn is_rising(&self) -> bool {
        self.close >= self.open
    }
}

/// OHLCV trade bar covering `[start, end)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeBar {
    pub ohlc: Ohlc,
    pub volume: Decimal,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    /// Carried forward to fill a gap in the stream rather than observed.
    #[serde(default)]
    pub fill_forward: bool,
}

impl TradeBar {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>, ohlc: Ohlc, volume: Decimal) -> Self {
        Self {
            ohlc,
            volume,
            start,
            end,
            fill_forward: false,
        }
    }

    pub fn fill_forwarded(mut self) -> Self {
        self.fill_forward = true;
        self
    }
}

/// Bid and ask bars covering `[start, end)`. A missing side means no quote
/// was posted on that side during the bar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuoteBar {
    pub bid: Option<Ohlc>,
    pub ask: Option<Ohlc>,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    #[serde(default)]
    pub fill_forward: bool,
}

impl QuoteBar {
    pub fn new(
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        bid: Option<Ohlc>,
        ask: Option<Ohlc>,
    ) -> Self {
        Self {
            bid,
            ask,
            start,
            end,
            fill_forward: false,
        }
    }

    pub fn fill_forwarded(mut self) -> Self {
        self.fill_forward = true;
        self
    }

    /// The side an order trades against: buyers lift the ask, sellers hit the bid.
    pub fn side_for(&self, side: OrderSide) -> Option<&Ohlc> {
        match side {
            OrderSide::Buy => self.ask.as_ref(),
            OrderSide::Sell => self.bid.as_ref(),
        }
    }
}
