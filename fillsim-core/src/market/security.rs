use chrono::{DateTime, Utc};
use rust_decimal::{Decimal, RoundingStrategy};

use super::cache::SecurityMarketState;
use crate::domain::ExchangeHours;
use crate::error::FillError;

/// A tradable security: its trading hours plus its market data cache.
#[derive(Debug, Clone)]
pub struct Security {
    pub symbol: String,
    /// `None` means no local time reference; evaluation against it fails.
    pub exchange_hours: Option<ExchangeHours>,
    /// Whether orders may fill during extended (pre/post/overnight) sessions.
    pub extended_market_hours: bool,
    /// Minimum price variation. Zero disables rounding.
    pub price_increment: Decimal,
    state: SecurityMarketState,
}

impl Security {
    pub fn new(symbol: impl Into<String>, exchange_hours: ExchangeHours) -> Self {
        Self {
            symbol: symbol.into(),
            exchange_hours: Some(exchange_hours),
            extended_market_hours: false,
            price_increment: Decimal::ZERO,
            state: SecurityMarketState::new(),
        }
    }

    /// A security with no exchange hours configured.
    pub fn without_hours(symbol: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            exchange_hours: None,
            extended_market_hours: false,
            price_increment: Decimal::ZERO,
            state: SecurityMarketState::new(),
        }
    }

    pub fn with_extended_market_hours(mut self, enabled: bool) -> Self {
        self.extended_market_hours = enabled;
        self
    }

    pub fn with_price_increment(mut self, increment: Decimal) -> Self {
        self.price_increment = increment;
        self
    }

    pub fn hours(&self) -> Result<&ExchangeHours, FillError> {
        self.exchange_hours
            .as_ref()
            .ok_or_else(|| FillError::MissingTimeReference {
                symbol: self.symbol.clone(),
            })
    }

    pub fn local_time(&self) -> Option<DateTime<Utc>> {
        self.state.local_time()
    }

    pub fn state(&self) -> &SecurityMarketState {
        &self.state
    }

    /// Mutable cache access for the ingestion boundary.
    pub fn state_mut(&mut self) -> &mut SecurityMarketState {
        &mut self.state
    }

    /// Round a price to the nearest increment, midpoints away from zero.
    pub fn round_to_increment(&self, price: Decimal) -> Decimal {
        if self.price_increment <= Decimal::ZERO {
            return price;
        }
        let steps = (price / self.price_increment)
            .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero);
        steps * self.price_increment
    }
}
