use rust_decimal::Decimal;

use super::{FillContext, FillDecision};
use crate::domain::{Order, OrderSide};
use crate::execution::walk::{walk_two_stage, Level, PricePath};
use crate::market::Affinity;

/// Resting limit order.
///
/// On a bar the crossing is at the limit, or at the open when the bar gaps
/// through it favorably. On ticks it is the first satisfying tick's value.
pub(super) fn fill_limit(
    ctx: &FillContext<'_>,
    order: &Order,
    side: OrderSide,
    limit_price: Decimal,
) -> Option<FillDecision> {
    let source = ctx.sample(order, side, Affinity::QuoteAware)?;
    let outcome = walk_two_stage(
        &PricePath::of(&source),
        None,
        Some(Level::limit(side, limit_price)),
    );
    outcome
        .filled
        .map(|fill| FillDecision::at(fill.price, fill.time, &source))
}
