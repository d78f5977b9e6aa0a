//! Per-family fill decisions.
//!
//! Each strategy reads the market through the sampler, walks the price path,
//! updates the order's latched state, and says at what price and time the
//! order would fill. Quantity, liquidity and fees are applied by the engine.

mod if_touched;
mod limit;
mod market;
mod stop;
mod trailing;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use super::gap::GapPolicy;
use crate::domain::{Order, OrderKind, OrderSide};
use crate::error::FillError;
use crate::market::{Affinity, PriceSampler, PriceSource, SampleRequest, Security};

/// Read-only inputs of one evaluation.
pub(crate) struct FillContext<'a> {
    pub security: &'a Security,
    pub sampler: PriceSampler<'a>,
    pub now: DateTime<Utc>,
    pub gap_policy: GapPolicy,
}

impl FillContext<'_> {
    pub fn sample(
        &self,
        order: &Order,
        side: OrderSide,
        affinity: Affinity,
    ) -> Option<PriceSource> {
        self.sampler
            .sample(self.now, &SampleRequest::for_order(order, side, affinity))
    }
}

/// Price and time at which an order fills, before quantity is decided.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct FillDecision {
    pub price: Decimal,
    pub time: DateTime<Utc>,
    /// Traded volume of the source bar, for participation limits.
    pub volume: Option<Decimal>,
}

impl FillDecision {
    pub fn at(price: Decimal, time: DateTime<Utc>, source: &PriceSource) -> Self {
        let volume = match source {
            PriceSource::Bar(bar) => bar.volume,
            PriceSource::Ticks(_) => None,
        };
        Self {
            price,
            time,
            volume,
        }
    }
}

pub(crate) fn dispatch(
    ctx: &FillContext<'_>,
    order: &mut Order,
    side: OrderSide,
) -> Result<Option<FillDecision>, FillError> {
    let decision = match order.kind {
        OrderKind::Market => market::fill_market(ctx, order, side),
        OrderKind::MarketOnOpen => market::fill_market_on_open(ctx, order, side),
        OrderKind::MarketOnClose => market::fill_market_on_close(ctx, order, side),
        OrderKind::Limit { limit_price } => limit::fill_limit(ctx, order, side, limit_price),
        OrderKind::StopMarket { stop_price } => {
            stop::fill_stop_market(ctx, order, side, stop_price)
        }
        OrderKind::StopLimit {
            stop_price,
            limit_price,
        } => stop::fill_stop_limit(ctx, order, side, stop_price, limit_price),
        OrderKind::LimitIfTouched {
            trigger_price,
            limit_price,
        } => if_touched::fill_limit_if_touched(ctx, order, side, trigger_price, limit_price),
        OrderKind::TrailingStop {
            stop_price,
            trailing_amount,
            trailing_type,
        } => {
            return trailing::fill_trailing_stop(
                ctx,
                order,
                side,
                stop_price,
                trailing_amount,
                trailing_type,
            )
        }
    };
    Ok(decision)
}
