//! Per-security cache of the latest market observations.
//!
//! One slot per data shape. Shapes are never merged: a fresher quote bar does
//! not overwrite the last trade bar and vice versa.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::domain::{DataShape, MarketObservation, QuoteBar, Tick, TradeBar};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SecurityMarketState {
    local_time: Option<DateTime<Utc>>,
    trade_bar: Option<TradeBar>,
    quote_bar: Option<QuoteBar>,
    ticks: Vec<Tick>,
    /// Local time at which the current tick slice was opened.
    tick_slice_at: Option<DateTime<Utc>>,
}

impl SecurityMarketState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn local_time(&self) -> Option<DateTime<Utc>> {
        self.local_time
    }

    /// Move the security's clock forward. Returns `false` (and leaves the
    /// clock alone) for a time at or before the current one.
    pub fn advance_to(&mut self, time: DateTime<Utc>) -> bool {
        match self.local_time {
            Some(now) if time <= now => false,
            _ => {
                self.local_time = Some(time);
                true
            }
        }
    }

    /// Store an observation in its shape's slot.
    ///
    /// Observations ending before the current local time are rejected and
    /// leave the cache untouched.
    pub fn update(&mut self, observation: impl Into<MarketObservation>) -> bool {
        let observation = observation.into();
        if let Some(now) = self.local_time {
            if observation.end() < now {
                debug!(
                    shape = ?observation.shape(),
                    end = %observation.end(),
                    local_time = %now,
                    "rejected out-of-order observation"
                );
                return false;
            }
        }
        match observation {
            MarketObservation::TradeBar(bar) => self.trade_bar = Some(bar),
            MarketObservation::QuoteBar(bar) => self.quote_bar = Some(bar),
            MarketObservation::Tick(tick) => {
                if self.tick_slice_at != self.local_time {
                    self.ticks.clear();
                    self.tick_slice_at = self.local_time;
                }
                self.ticks.push(tick);
            }
        }
        true
    }

    /// The stored observation of `shape`. For ticks, the latest tick of the
    /// current slice.
    pub fn latest(&self, shape: DataShape) -> Option<MarketObservation> {
        match shape {
            DataShape::TradeBar => self.trade_bar.clone().map(Into::into),
            DataShape::QuoteBar => self.quote_bar.clone().map(Into::into),
            DataShape::Tick => self.ticks.last().cloned().map(Into::into),
        }
    }

    pub fn trade_bar(&self) -> Option<&TradeBar> {
        self.trade_bar.as_ref()
    }

    pub fn quote_bar(&self) -> Option<&QuoteBar> {
        self.quote_bar.as_ref()
    }

    /// Ticks of the current slice, in arrival order.
    pub fn ticks(&self) -> &[Tick] {
        &self.ticks
    }

    /// Drop every stored observation. The clock is kept.
    pub fn clear(&mut self) {
        self.trade_bar = None;
        self.quote_bar = None;
        self.ticks.clear();
        self.tick_slice_at = None;
    }
}
