//! Price sampling: turns the observation cache into one usable price source.
//!
//! Exclusion rules, applied to every candidate:
//! 1. stale: ends before the evaluation instant
//! 2. fill-forwarded
//! 3. wrong shape for the request (quotes for trade-only orders)
//! 4. ends at or before the order's submission
//! 5. outside the security's trading hours
//!
//! The freshest surviving candidate wins. Ties go to ticks, then quote bars,
//! then trade bars.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use tracing::trace;

use super::cache::SecurityMarketState;
use super::security::Security;
use crate::domain::{DataShape, ExchangeHours, Ohlc, Order, OrderSide, Tick, TickKind};
use crate::error::FillError;

/// Which data shapes an order may consume.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Affinity {
    /// Trade bars and trade ticks only.
    TradeOnly,
    /// Quote bars and quote ticks preferred, trade data as fallback.
    QuoteAware,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SampleRequest {
    pub affinity: Affinity,
    pub side: OrderSide,
    pub submitted_at: DateTime<Utc>,
    /// Accept data ending exactly at the submission instant.
    pub include_submission_instant: bool,
}

impl SampleRequest {
    pub fn new(affinity: Affinity, side: OrderSide, submitted_at: DateTime<Utc>) -> Self {
        Self {
            affinity,
            side,
            submitted_at,
            include_submission_instant: false,
        }
    }

    pub fn for_order(order: &Order, side: OrderSide, affinity: Affinity) -> Self {
        Self::new(affinity, side, order.submitted_at)
    }

    pub fn including_submission_instant(mut self) -> Self {
        self.include_submission_instant = true;
        self
    }

    fn after_submission(&self, end: DateTime<Utc>) -> bool {
        end > self.submitted_at || (self.include_submission_instant && end == self.submitted_at)
    }
}

/// A bar-shaped price source: a trade bar or one side of a quote bar.
#[derive(Debug, Clone, PartialEq)]
pub struct BarSample {
    pub shape: DataShape,
    pub ohlc: Ohlc,
    /// Traded volume, for trade bars.
    pub volume: Option<Decimal>,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TickPoint {
    pub kind: TickKind,
    pub time: DateTime<Utc>,
    pub price: Decimal,
    pub quantity: Decimal,
}

/// Usable ticks of the current slice, in arrival order. Never empty.
#[derive(Debug, Clone, PartialEq)]
pub struct TickWalk {
    points: Vec<TickPoint>,
}

impl TickWalk {
    fn new(points: Vec<TickPoint>) -> Option<Self> {
        if points.is_empty() {
            None
        } else {
            Some(Self { points })
        }
    }

    pub fn points(&self) -> &[TickPoint] {
        &self.points
    }

    pub fn first(&self) -> &TickPoint {
        &self.points[0]
    }

    pub fn last(&self) -> &TickPoint {
        &self.points[self.points.len() - 1]
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PriceSource {
    Bar(BarSample),
    Ticks(TickWalk),
}

impl PriceSource {
    pub fn start(&self) -> DateTime<Utc> {
        match self {
            Self::Bar(bar) => bar.start,
            Self::Ticks(walk) => walk.first().time,
        }
    }

    pub fn end(&self) -> DateTime<Utc> {
        match self {
            Self::Bar(bar) => bar.end,
            Self::Ticks(walk) => walk.last().time,
        }
    }

    pub fn shape(&self) -> DataShape {
        match self {
            Self::Bar(bar) => bar.shape,
            Self::Ticks(_) => DataShape::Tick,
        }
    }

    /// Latest price of the source: the bar close or the last tick.
    pub fn last_price(&self) -> Decimal {
        match self {
            Self::Bar(bar) => bar.ohlc.close,
            Self::Ticks(walk) => walk.last().price,
        }
    }

    fn tie_rank(&self) -> u8 {
        match self.shape() {
            DataShape::Tick => 2,
            DataShape::QuoteBar => 1,
            DataShape::TradeBar => 0,
        }
    }
}

/// Reads one security's cache under its trading hours.
#[derive(Debug, Clone, Copy)]
pub struct PriceSampler<'a> {
    state: &'a SecurityMarketState,
    hours: &'a ExchangeHours,
    extended: bool,
}

impl<'a> PriceSampler<'a> {
    pub fn new(state: &'a SecurityMarketState, hours: &'a ExchangeHours, extended: bool) -> Self {
        Self {
            state,
            hours,
            extended,
        }
    }

    pub fn for_security(security: &'a Security) -> Result<Self, FillError> {
        Ok(Self::new(
            security.state(),
            security.hours()?,
            security.extended_market_hours,
        ))
    }

    pub fn hours(&self) -> &'a ExchangeHours {
        self.hours
    }

    /// The best usable price source at `now`, or `None` when nothing in the
    /// cache may be used.
    pub fn sample(&self, now: DateTime<Utc>, request: &SampleRequest) -> Option<PriceSource> {
        [
            self.trade_bar(now, request),
            self.quote_bar(now, request),
            self.tick_walk(now, request),
        ]
        .into_iter()
        .flatten()
        .max_by_key(|source| (source.end(), source.tie_rank()))
    }

    fn bar_usable(
        &self,
        shape: DataShape,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        fill_forward: bool,
        now: DateTime<Utc>,
        request: &SampleRequest,
    ) -> bool {
        let reason = if end < now {
            "stale"
        } else if fill_forward {
            "fill-forward"
        } else if !request.after_submission(end) {
            "before submission"
        } else if !self.hours.is_open_during(start, end, self.extended) {
            "outside trading hours"
        } else {
            return true;
        };
        trace!(?shape, %end, %now, reason, "excluded bar");
        false
    }

    fn trade_bar(&self, now: DateTime<Utc>, request: &SampleRequest) -> Option<PriceSource> {
        let bar = self.state.trade_bar()?;
        if !self.bar_usable(
            DataShape::TradeBar,
            bar.start,
            bar.end,
            bar.fill_forward,
            now,
            request,
        ) {
            return None;
        }
        Some(PriceSource::Bar(BarSample {
            shape: DataShape::TradeBar,
            ohlc: bar.ohlc,
            volume: Some(bar.volume),
            start: bar.start,
            end: bar.end,
        }))
    }

    fn quote_bar(&self, now: DateTime<Utc>, request: &SampleRequest) -> Option<PriceSource> {
        if request.affinity == Affinity::TradeOnly {
            return None;
        }
        let bar = self.state.quote_bar()?;
        if !self.bar_usable(
            DataShape::QuoteBar,
            bar.start,
            bar.end,
            bar.fill_forward,
            now,
            request,
        ) {
            return None;
        }
        let Some(ohlc) = bar.side_for(request.side) else {
            trace!(side = ?request.side, "quote bar has no usable side");
            return None;
        };
        Some(PriceSource::Bar(BarSample {
            shape: DataShape::QuoteBar,
            ohlc: *ohlc,
            volume: None,
            start: bar.start,
            end: bar.end,
        }))
    }

    fn tick_usable(&self, tick: &Tick, kind: TickKind, request: &SampleRequest) -> bool {
        tick.kind == kind
            && !tick.fill_forward
            && request.after_submission(tick.time)
            && self.hours.is_open(tick.time, self.extended)
    }

    fn ticks_of(&self, kind: TickKind, request: &SampleRequest) -> Option<TickWalk> {
        let points = self
            .state
            .ticks()
            .iter()
            .filter(|tick| self.tick_usable(tick, kind, request))
            .filter_map(|tick| {
                tick.price_for(request.side).map(|price| TickPoint {
                    kind,
                    time: tick.time,
                    price,
                    quantity: tick.quantity,
                })
            })
            .collect();
        TickWalk::new(points)
    }

    fn tick_walk(&self, now: DateTime<Utc>, request: &SampleRequest) -> Option<PriceSource> {
        let slice_end = self.state.ticks().last()?.time;
        if slice_end < now {
            trace!(%slice_end, %now, "excluded stale tick slice");
            return None;
        }
        let walk = match request.affinity {
            Affinity::TradeOnly => self.ticks_of(TickKind::Trade, request),
            Affinity::QuoteAware => self
                .ticks_of(TickKind::Quote, request)
                .or_else(|| self.ticks_of(TickKind::Trade, request)),
        };
        walk.map(PriceSource::Ticks)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{QuoteBar, TradeBar};
    use chrono::{Duration, TimeZone};
    use rust_decimal_macros::dec;

    // 10:00 New York on a Tuesday.
    fn t(minute: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 2, 15, 0, 0).unwrap() + Duration::minutes(minute)
    }

    fn submitted() -> DateTime<Utc> {
        t(-10)
    }

    fn request(affinity: Affinity, side: OrderSide) -> SampleRequest {
        SampleRequest::new(affinity, side, submitted())
    }

    fn trade_bar(end: i64, close: Decimal) -> TradeBar {
        TradeBar::new(
            t(end - 1),
            t(end),
            Ohlc::new(close, close + dec!(1), close - dec!(1), close),
            dec!(1000),
        )
    }

    fn quote_bar(end: i64, bid: Decimal, ask: Decimal) -> QuoteBar {
        QuoteBar::new(
            t(end - 1),
            t(end),
            Some(Ohlc::point(bid)),
            Some(Ohlc::point(ask)),
        )
    }

    fn sample(
        state: &SecurityMarketState,
        now: DateTime<Utc>,
        req: SampleRequest,
    ) -> Option<PriceSource> {
        let hours = ExchangeHours::us_equity();
        PriceSampler::new(state, &hours, false).sample(now, &req)
    }

    #[test]
    fn stale_bar_is_excluded() {
        let mut state = SecurityMarketState::new();
        state.update(trade_bar(1, dec!(100)));
        assert!(sample(&state, t(1), request(Affinity::TradeOnly, OrderSide::Buy)).is_some());
        assert!(sample(&state, t(2), request(Affinity::TradeOnly, OrderSide::Buy)).is_none());
    }

    #[test]
    fn fill_forward_is_excluded() {
        let mut state = SecurityMarketState::new();
        state.update(trade_bar(1, dec!(100)).fill_forwarded());
        assert!(sample(&state, t(1), request(Affinity::TradeOnly, OrderSide::Buy)).is_none());
    }

    #[test]
    fn trade_only_ignores_fresher_quotes() {
        let mut state = SecurityMarketState::new();
        state.update(trade_bar(1, dec!(100)));
        state.update(quote_bar(2, dec!(99), dec!(101)));
        let source = sample(&state, t(1), request(Affinity::TradeOnly, OrderSide::Buy)).unwrap();
        assert_eq!(source.shape(), DataShape::TradeBar);
    }

    #[test]
    fn quote_aware_picks_side_and_wins_ties() {
        let mut state = SecurityMarketState::new();
        state.update(trade_bar(1, dec!(100)));
        state.update(quote_bar(1, dec!(99.5), dec!(100.5)));

        let buy = sample(&state, t(1), request(Affinity::QuoteAware, OrderSide::Buy)).unwrap();
        assert_eq!(buy.shape(), DataShape::QuoteBar);
        assert_eq!(buy.last_price(), dec!(100.5));

        let sell = sample(&state, t(1), request(Affinity::QuoteAware, OrderSide::Sell)).unwrap();
        assert_eq!(sell.last_price(), dec!(99.5));
    }

    #[test]
    fn quote_aware_falls_back_to_trades() {
        let mut state = SecurityMarketState::new();
        state.update(trade_bar(1, dec!(100)));
        state.update(QuoteBar::new(t(0), t(1), Some(Ohlc::point(dec!(99))), None));
        let buy = sample(&state, t(1), request(Affinity::QuoteAware, OrderSide::Buy)).unwrap();
        assert_eq!(buy.shape(), DataShape::TradeBar);
    }

    #[test]
    fn ticks_win_ties_and_keep_order() {
        let mut state = SecurityMarketState::new();
        state.advance_to(t(1));
        state.update(trade_bar(1, dec!(100)));
        state.update(Tick::trade(t(1), dec!(10), dec!(1)));
        state.update(Tick::quote(t(1), Some(dec!(9)), Some(dec!(11))));
        state.update(Tick::trade(t(1), dec!(12), dec!(1)));

        let trade = sample(&state, t(1), request(Affinity::TradeOnly, OrderSide::Buy)).unwrap();
        let PriceSource::Ticks(walk) = trade else {
            panic!("expected ticks");
        };
        let prices: Vec<_> = walk.points().iter().map(|p| p.price).collect();
        assert_eq!(prices, vec![dec!(10), dec!(12)]);

        let quoted = sample(&state, t(1), request(Affinity::QuoteAware, OrderSide::Buy)).unwrap();
        assert_eq!(quoted.last_price(), dec!(11));
    }

    #[test]
    fn data_before_submission_is_excluded() {
        let mut state = SecurityMarketState::new();
        state.update(trade_bar(1, dec!(100)));
        let late = SampleRequest::new(Affinity::TradeOnly, OrderSide::Buy, t(1));
        assert!(sample(&state, t(1), late).is_none());
        assert!(sample(&state, t(1), late.including_submission_instant()).is_some());
    }

    #[test]
    fn bars_outside_hours_are_excluded() {
        let mut state = SecurityMarketState::new();
        // 03:00 New York.
        let start = Utc.with_ymd_and_hms(2024, 1, 2, 8, 0, 0).unwrap();
        let end = start + Duration::minutes(1);
        state.update(TradeBar::new(start, end, Ohlc::point(dec!(100)), dec!(1)));
        let submitted = start - Duration::hours(1);
        let req = SampleRequest::new(Affinity::TradeOnly, OrderSide::Buy, submitted);
        assert!(sample(&state, start + Duration::minutes(1), req).is_none());
    }
}
