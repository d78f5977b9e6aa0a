//! Stop-market and stop-limit orders.

use rust_decimal::Decimal;

use super::{FillContext, FillDecision};
use crate::domain::{Order, OrderSide};
use crate::execution::touch::{mark_touched, prior_touch};
use crate::execution::walk::{walk_two_stage, Crossing, Level, PricePath};
use crate::market::{Affinity, PriceSource};

/// Fill price of a stop that triggered at `crossing`.
///
/// A bar that opens beyond the trigger resolves through the gap policy; an
/// intrabar trigger fills at the trigger level; a tick fills at its value.
pub(super) fn stop_fill_price(
    ctx: &FillContext<'_>,
    source: &PriceSource,
    crossing: &Crossing,
    trigger: Decimal,
    side: OrderSide,
) -> Decimal {
    match source {
        PriceSource::Bar(_) if crossing.at_open => {
            ctx.gap_policy.resolve(crossing.price, trigger, side)
        }
        _ => crossing.price,
    }
}

pub(super) fn fill_stop_market(
    ctx: &FillContext<'_>,
    order: &mut Order,
    side: OrderSide,
    stop_price: Decimal,
) -> Option<FillDecision> {
    let source = ctx.sample(order, side, Affinity::TradeOnly)?;
    // A stop triggered on earlier data is a market order for its remainder.
    let armed = prior_touch(order, &source);
    let trigger = (!armed).then(|| Level::stop(side, stop_price));
    let outcome = walk_two_stage(&PricePath::of(&source), trigger, None);
    if let Some(hit) = outcome.triggered {
        mark_touched(order, hit.time);
    }
    let fill = outcome.filled?;
    let price = if armed {
        fill.price
    } else {
        stop_fill_price(ctx, &source, &fill, stop_price, side)
    };
    Some(FillDecision::at(price, fill.time, &source))
}

/// Stop-limit: triggers on trade data like a stop, then rests as a limit.
///
/// Once touched on earlier data the limit stage may use quotes. A touch from
/// the observation being evaluated is replayed on trade data.
pub(super) fn fill_stop_limit(
    ctx: &FillContext<'_>,
    order: &mut Order,
    side: OrderSide,
    stop_price: Decimal,
    limit_price: Decimal,
) -> Option<FillDecision> {
    let limit = Level::limit(side, limit_price);

    if order.is_touched() {
        if let Some(source) = ctx.sample(order, side, Affinity::QuoteAware) {
            if prior_touch(order, &source) {
                let outcome = walk_two_stage(&PricePath::of(&source), None, Some(limit));
                return outcome
                    .filled
                    .map(|fill| FillDecision::at(fill.price, fill.time, &source));
            }
        }
    }

    let source = ctx.sample(order, side, Affinity::TradeOnly)?;
    let trigger = (!prior_touch(order, &source)).then(|| Level::stop(side, stop_price));
    let outcome = walk_two_stage(&PricePath::of(&source), trigger, Some(limit));
    if let Some(hit) = outcome.triggered {
        mark_touched(order, hit.time);
    }
    outcome
        .filled
        .map(|fill| FillDecision::at(fill.price, fill.time, &source))
}
