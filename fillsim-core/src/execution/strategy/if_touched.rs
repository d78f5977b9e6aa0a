use rust_decimal::Decimal;

use super::{FillContext, FillDecision};
use crate::domain::{Order, OrderSide};
use crate::execution::touch::{mark_touched, prior_touch};
use crate::execution::walk::{walk_two_stage, Level, PricePath};
use crate::market::{Affinity, PriceSource};

/// Limit-if-touched: trade data only, in both stages.
///
/// Buys touch at or below the trigger and fill at or below the limit; sells
/// mirror that. A bar fill is always at the limit price exactly, even when
/// the bar opens beyond it. A tick fill is at the satisfying tick's value.
/// If the limit is not reached after the touch along the assumed path, the
/// order stays touched and unfilled.
pub(super) fn fill_limit_if_touched(
    ctx: &FillContext<'_>,
    order: &mut Order,
    side: OrderSide,
    trigger_price: Decimal,
    limit_price: Decimal,
) -> Option<FillDecision> {
    let source = ctx.sample(order, side, Affinity::TradeOnly)?;
    let trigger = (!prior_touch(order, &source)).then(|| Level::limit(side, trigger_price));
    let outcome = walk_two_stage(
        &PricePath::of(&source),
        trigger,
        Some(Level::limit(side, limit_price)),
    );
    if let Some(hit) = outcome.triggered {
        mark_touched(order, hit.time);
    }
    let fill = outcome.filled?;
    let price = match &source {
        PriceSource::Bar(_) => limit_price,
        PriceSource::Ticks(_) => fill.price,
    };
    Some(FillDecision::at(price, fill.time, &source))
}
