//! Trigger/touch tracking.
//!
//! The latch lives on the order. It is set at most once, and nothing clears
//! it. Whether a touch counts as history for the current evaluation depends
//! on the price source: a touch recorded from the very observation being
//! evaluated again is replayed rather than trusted, so repeated evaluation
//! of the same data gives the same answer.

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::domain::Order;
use crate::market::PriceSource;

/// Latch the order's trigger at `at`. Returns `true` on the first touch only.
pub fn mark_touched(order: &mut Order, at: DateTime<Utc>) -> bool {
    let first = order.latch_mut().mark(at);
    if first {
        debug!(order_id = %order.id, kind = order.kind.name(), %at, "trigger touched");
    }
    first
}

pub fn is_touched(order: &Order) -> bool {
    order.is_touched()
}

/// Whether the order was touched strictly before `source` began.
pub fn prior_touch(order: &Order, source: &PriceSource) -> bool {
    let Some(touched_at) = order.latch().touched_at() else {
        return false;
    };
    match source {
        PriceSource::Bar(bar) => touched_at <= bar.start,
        PriceSource::Ticks(walk) => touched_at < walk.first().time,
    }
}
