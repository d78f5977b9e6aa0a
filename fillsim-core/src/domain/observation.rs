use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::bar::{QuoteBar, TradeBar};
use super::tick::Tick;

/// The three data shapes a security can receive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DataShape {
    TradeBar,
    QuoteBar,
    Tick,
}

/// One market observation as delivered by the ingestion boundary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum MarketObservation {
    TradeBar(TradeBar),
    QuoteBar(QuoteBar),
    Tick(Tick),
}

impl MarketObservation {
    pub fn shape(&self) -> DataShape {
        match self {
            Self::TradeBar(_) => DataShape::TradeBar,
            Self::QuoteBar(_) => DataShape::QuoteBar,
            Self::Tick(_) => DataShape::Tick,
        }
    }

    pub fn start(&self) -> DateTime<Utc> {
        match self {
            Self::TradeBar(bar) => bar.start,
            Self::QuoteBar(bar) => bar.start,
            Self::Tick(tick) => tick.time,
        }
    }

    pub fn end(&self) -> DateTime<Utc> {
        match self {
            Self::TradeBar(bar) => bar.end,
            Self::QuoteBar(bar) => bar.end,
            Self::Tick(tick) => tick.time,
        }
    }

    pub fn is_fill_forward(&self) -> bool {
        match self {
            Self::TradeBar(bar) => bar.fill_forward,
            Self::QuoteBar(bar) => bar.fill_forward,
            Self::Tick(tick) => tick.fill_forward,
        }
    }
}

impl From<TradeBar> for MarketObservation {
    fn from(bar: TradeBar) -> Self {
        Self::TradeBar(bar)
    }
}

impl From<QuoteBar> for MarketObservation {
    fn from(bar: QuoteBar) -> Self {
        Self::QuoteBar(bar)
    }
}

impl From<Tick> for MarketObservation {
    fn from(tick: Tick) -> Self {
        Self::Tick(tick)
    }
}
