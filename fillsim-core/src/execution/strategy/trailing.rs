//! Trailing stops.
//!
//! The stop is checked before it moves: at each path point (or leg) the
//! current stop is tested first, then ratcheted toward the market. It never
//! retreats. Re-evaluating an observation that was already applied replays
//! the walk from the stop that was in effect before it. Once triggered on
//! earlier data the stop is frozen and the remainder fills at market.

use rust_decimal::Decimal;
use tracing::debug;

use super::stop::stop_fill_price;
use super::{FillContext, FillDecision};
use crate::domain::order::TrailingProgress;
use crate::domain::{Order, OrderSide, TrailingType};
use crate::error::FillError;
use crate::execution::touch::{mark_touched, prior_touch};
use crate::execution::walk::{walk_two_stage, Crossing, Level, PricePath};
use crate::market::Affinity;

#[derive(Debug, Clone, Copy, PartialEq)]
struct TrailingOutcome {
    /// Stop in effect when the walk ended (or when it triggered).
    stop: Decimal,
    triggered: Option<Crossing>,
}

/// Walk a path moving the stop with favorable prices.
fn walk_trailing(
    path: &PricePath<'_>,
    side: OrderSide,
    start_stop: Decimal,
    trail: impl Fn(Decimal) -> Decimal,
) -> TrailingOutcome {
    let tighten = |stop: Decimal, price: Decimal| {
        let candidate = trail(price);
        match side {
            OrderSide::Sell => stop.max(candidate),
            OrderSide::Buy => stop.min(candidate),
        }
    };
    let mut stop = start_stop;
    match path {
        PricePath::Bar { path, time } => {
            let open = path.open();
            if Level::stop(side, stop).satisfied(open) {
                return TrailingOutcome {
                    stop,
                    triggered: Some(Crossing {
                        price: open,
                        time: *time,
                        at_open: true,
                    }),
                };
            }
            stop = tighten(stop, open);
            for (from, to) in path.segments() {
                if Level::stop(side, stop).reached(from, to) {
                    return TrailingOutcome {
                        stop,
                        triggered: Some(Crossing {
                            price: stop,
                            time: *time,
                            at_open: false,
                        }),
                    };
                }
                stop = tighten(stop, to);
            }
        }
        PricePath::Ticks(points) => {
            for (i, point) in points.iter().enumerate() {
                if Level::stop(side, stop).satisfied(point.price) {
                    return TrailingOutcome {
                        stop,
                        triggered: Some(Crossing {
                            price: point.price,
                            time: point.time,
                            at_open: i == 0,
                        }),
                    };
                }
                stop = tighten(stop, point.price);
            }
        }
    }
    TrailingOutcome {
        stop,
        triggered: None,
    }
}

pub(super) fn fill_trailing_stop(
    ctx: &FillContext<'_>,
    order: &mut Order,
    side: OrderSide,
    stop_price: Decimal,
    trailing_amount: Decimal,
    trailing_type: TrailingType,
) -> Result<Option<FillDecision>, FillError> {
    let Some(source) = ctx.sample(order, side, Affinity::TradeOnly) else {
        return Ok(None);
    };
    if prior_touch(order, &source) {
        let outcome = walk_two_stage(&PricePath::of(&source), None, None);
        return Ok(outcome
            .filled
            .map(|fill| FillDecision::at(fill.price, fill.time, &source)));
    }

    let progress = order.trailing_progress();
    let start_stop = match progress {
        Some(p) if source.end() <= p.applied_through => p.stop_before,
        _ => stop_price,
    };
    let outcome = walk_trailing(&PricePath::of(&source), side, start_stop, |price| {
        ctx.security
            .round_to_increment(trailing_type.stop_from(price, side, trailing_amount))
    });

    // An older observation than the one already applied cannot move the stop.
    let stale_replay = matches!(progress, Some(p) if source.end() < p.applied_through);
    if !stale_replay {
        let moved = order.ratchet_trailing_stop(
            outcome.stop,
            TrailingProgress {
                applied_through: source.end(),
                stop_before: start_stop,
            },
        )?;
        if moved {
            debug!(
                order_id = %order.id,
                from = %stop_price,
                to = %outcome.stop,
                "trailing stop ratcheted"
            );
        }
    }

    let Some(hit) = outcome.triggered else {
        return Ok(None);
    };
    mark_touched(order, hit.time);
    let price = stop_fill_price(ctx, &source, &hit, outcome.stop, side);
    Ok(Some(FillDecision::at(price, hit.time, &source)))
}
