//! Market, market-on-open and market-on-close.

use chrono::Duration;

use super::{FillContext, FillDecision};
use crate::domain::{Order, OrderSide, TickKind};
use crate::market::{Affinity, PriceSource, SampleRequest};

/// Closing window for market-on-close orders on tick data.
const CLOSING_WINDOW_MINUTES: i64 = 1;

/// Latest usable price: the bar close or the last tick, quotes preferred.
pub(super) fn fill_market(
    ctx: &FillContext<'_>,
    order: &Order,
    side: OrderSide,
) -> Option<FillDecision> {
    let request =
        SampleRequest::for_order(order, side, Affinity::QuoteAware).including_submission_instant();
    let source = ctx.sampler.sample(ctx.now, &request)?;
    Some(FillDecision::at(source.last_price(), source.end(), &source))
}

/// Opening price of the first regular session opening after submission.
pub(super) fn fill_market_on_open(
    ctx: &FillContext<'_>,
    order: &Order,
    side: OrderSide,
) -> Option<FillDecision> {
    let hours = ctx.sampler.hours();
    let open_at = hours.next_regular_open(order.submitted_at)?;
    if ctx.now < open_at {
        return None;
    }
    let source = ctx.sample(order, side, Affinity::TradeOnly)?;
    match &source {
        PriceSource::Bar(bar) => (bar.end > open_at
            && hours.is_open_during(bar.start, bar.end, false))
        .then(|| FillDecision::at(bar.ohlc.open, bar.end, &source)),
        PriceSource::Ticks(walk) => walk
            .points()
            .iter()
            .find(|p| p.time >= open_at && hours.is_open(p.time, false))
            .map(|p| FillDecision::at(p.price, p.time, &source)),
    }
}

/// Closing price of the first regular session closing after submission.
pub(super) fn fill_market_on_close(
    ctx: &FillContext<'_>,
    order: &Order,
    side: OrderSide,
) -> Option<FillDecision> {
    let hours = ctx.sampler.hours();
    let close_at = hours.next_regular_close(order.submitted_at)?;
    let source = ctx.sample(order, side, Affinity::TradeOnly)?;
    match &source {
        PriceSource::Bar(bar) => (bar.start < close_at && close_at <= bar.end)
            .then(|| FillDecision::at(bar.ohlc.close, bar.end, &source)),
        PriceSource::Ticks(walk) => {
            let window_start = close_at - Duration::minutes(CLOSING_WINDOW_MINUTES);
            walk.points()
                .iter()
                .rev()
                .find(|p| {
                    p.kind == TickKind::Trade
                        && p.time >= window_start
                        && p.time < close_at
                        && hours.is_open(p.time, false)
                })
                .map(|p| FillDecision::at(p.price, p.time, &source))
        }
    }
}
