//! Price-path walking shared by the trigger/limit order families.
//!
//! A bar is walked continuously along its intrabar path: a level inside a
//! leg is crossed at exactly that level. Ticks are walked discretely: a
//! level is met at the first tick that satisfies it, at that tick's price.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use super::path::IntrabarPath;
use crate::domain::OrderSide;
use crate::market::{PriceSource, TickPoint};

/// A one-sided price condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    AtOrBelow(Decimal),
    AtOrAbove(Decimal),
}

impl Level {
    /// Stop condition: buy stops fire at or above, sell stops at or below.
    pub fn stop(side: OrderSide, price: Decimal) -> Self {
        match side {
            OrderSide::Buy => Self::AtOrAbove(price),
            OrderSide::Sell => Self::AtOrBelow(price),
        }
    }

    /// Limit (and touch) condition: buys at or below, sells at or above.
    pub fn limit(side: OrderSide, price: Decimal) -> Self {
        match side {
            OrderSide::Buy => Self::AtOrBelow(price),
            OrderSide::Sell => Self::AtOrAbove(price),
        }
    }

    pub fn price(&self) -> Decimal {
        match self {
            Self::AtOrBelow(p) | Self::AtOrAbove(p) => *p,
        }
    }

    pub fn satisfied(&self, price: Decimal) -> bool {
        match self {
            Self::AtOrBelow(level) => price <= *level,
            Self::AtOrAbove(level) => price >= *level,
        }
    }

    /// Whether a monotonic move from `from` to `to` reaches the level.
    pub fn reached(&self, from: Decimal, to: Decimal) -> bool {
        match self {
            Self::AtOrBelow(level) => from.min(to) <= *level,
            Self::AtOrAbove(level) => from.max(to) >= *level,
        }
    }
}

/// Where and when a level was met.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Crossing {
    pub price: Decimal,
    pub time: DateTime<Utc>,
    /// Met at the first price of the source (a gap, for bars).
    pub at_open: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TwoStageOutcome {
    pub triggered: Option<Crossing>,
    pub filled: Option<Crossing>,
}

/// The walkable form of a price source.
#[derive(Debug, Clone, Copy)]
pub enum PricePath<'a> {
    Bar {
        path: IntrabarPath,
        /// Bars are timestamped at their end.
        time: DateTime<Utc>,
    },
    Ticks(&'a [TickPoint]),
}

impl<'a> PricePath<'a> {
    pub fn of(source: &'a PriceSource) -> Self {
        match source {
            PriceSource::Bar(bar) => Self::Bar {
                path: IntrabarPath::resolve(&bar.ohlc),
                time: bar.end,
            },
            PriceSource::Ticks(walk) => Self::Ticks(walk.points()),
        }
    }
}

/// Walk `path` looking for `trigger`, then for `limit` from the trigger
/// moment on.
///
/// `trigger: None` means the order is already armed. `limit: None` means the
/// order fills the moment it triggers.
pub fn walk_two_stage(
    path: &PricePath<'_>,
    trigger: Option<Level>,
    limit: Option<Level>,
) -> TwoStageOutcome {
    match path {
        PricePath::Bar { path, time } => walk_bar(path, *time, trigger, limit),
        PricePath::Ticks(points) => walk_ticks(points, trigger, limit),
    }
}

fn fill_at(limit: Option<Level>, price: Decimal) -> Option<Decimal> {
    match limit {
        None => Some(price),
        Some(level) if level.satisfied(price) => Some(price),
        Some(_) => None,
    }
}

fn walk_bar(
    path: &IntrabarPath,
    time: DateTime<Utc>,
    trigger: Option<Level>,
    limit: Option<Level>,
) -> TwoStageOutcome {
    let crossing = |price, at_open| Crossing {
        price,
        time,
        at_open,
    };
    let mut out = TwoStageOutcome::default();
    let open = path.open();

    let mut armed = match trigger {
        None => true,
        Some(level) if level.satisfied(open) => {
            out.triggered = Some(crossing(open, true));
            true
        }
        Some(_) => false,
    };
    if armed {
        if let Some(price) = fill_at(limit, open) {
            out.filled = Some(crossing(price, true));
            return out;
        }
    }

    for (from, to) in path.segments() {
        let mut leg_start = from;
        if !armed {
            let Some(level) = trigger else { break };
            if !level.reached(from, to) {
                continue;
            }
            armed = true;
            leg_start = level.price();
            out.triggered = Some(crossing(leg_start, false));
            if let Some(price) = fill_at(limit, leg_start) {
                out.filled = Some(crossing(price, false));
                return out;
            }
        }
        if let Some(level) = limit {
            if level.reached(leg_start, to) {
                out.filled = Some(crossing(level.price(), false));
                return out;
            }
        }
    }
    out
}

fn walk_ticks(
    points: &[TickPoint],
    trigger: Option<Level>,
    limit: Option<Level>,
) -> TwoStageOutcome {
    let mut out = TwoStageOutcome::default();
    let mut armed = trigger.is_none();
    for (i, point) in points.iter().enumerate() {
        let crossing = |price| Crossing {
            price,
            time: point.time,
            at_open: i == 0,
        };
        if !armed {
            if let Some(level) = trigger {
                if level.satisfied(point.price) {
                    armed = true;
                    out.triggered = Some(crossing(point.price));
                }
            }
        }
        if armed {
            if let Some(price) = fill_at(limit, point.price) {
                out.filled = Some(crossing(price));
                return out;
            }
        }
    }
    out
}
