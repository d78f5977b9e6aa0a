//! Property tests for fill invariants.
//!
//! Uses proptest to verify:
//! 1. Touch monotonicity: once touched, an order stays touched at the same time
//! 2. Trailing monotonicity: stops only tighten, never loosen
//! 3. Idempotence: re-evaluation without new data changes nothing
//! 4. Fill-forward exclusion: synthetic data never fills
//! 5. Limit honesty: a limit fill is never worse than the limit

use chrono::{DateTime, Duration, TimeZone, Utc};
use proptest::prelude::*;
use rust_decimal::Decimal;

use fillsim_core::domain::{ExchangeHours, FillStatus, Ohlc, Order, TradeBar, TrailingType};
use fillsim_core::market::Security;
use fillsim_core::FillEngine;

// ── Helpers ──────────────────────────────────────────────────────────

fn t(minute: i64) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 2, 15, 0, 0).unwrap() + Duration::minutes(minute)
}

fn cents(c: i64) -> Decimal {
    Decimal::new(c, 2)
}

fn push_bar(security: &mut Security, end: i64, ohlc: Ohlc, fill_forward: bool) {
    let mut bar = TradeBar::new(t(end - 1), t(end), ohlc, Decimal::from(10_000));
    if fill_forward {
        bar = bar.fill_forwarded();
    }
    security.state_mut().advance_to(t(end));
    security.state_mut().update(bar);
}

/// One order of each family, priced around `reference`.
fn make_order(family: u8, buy: bool, reference: Decimal, offset: Decimal) -> Order {
    let qty = if buy { Decimal::from(10) } else { Decimal::from(-10) };
    let toward = if buy { reference - offset } else { reference + offset };
    let away = if buy { reference + offset } else { reference - offset };
    match family % 7 {
        0 => Order::market(1, "SPY", qty, t(0)),
        1 => Order::limit(1, "SPY", qty, t(0), toward),
        2 => Order::stop_market(1, "SPY", qty, t(0), away),
        3 => Order::stop_limit(1, "SPY", qty, t(0), away, reference),
        4 => Order::limit_if_touched(1, "SPY", qty, t(0), toward, reference),
        5 => Order::trailing_stop(1, "SPY", qty, t(0), away, offset, TrailingType::Amount),
        _ => Order::market_on_close(1, "SPY", qty, t(0)),
    }
}

// ── Strategies (proptest) ────────────────────────────────────────────

fn arb_ohlc() -> impl Strategy<Value = Ohlc> {
    (9_000i64..11_000, 9_000i64..11_000, 0i64..300, 0i64..300).prop_map(
        |(open, close, up, down)| {
            Ohlc::new(
                cents(open),
                cents(open.max(close) + up),
                cents(open.min(close) - down),
                cents(close),
            )
        },
    )
}

fn arb_bars() -> impl Strategy<Value = Vec<Ohlc>> {
    prop::collection::vec(arb_ohlc(), 1..12)
}

fn arb_reference() -> impl Strategy<Value = Decimal> {
    (9_500i64..10_500).prop_map(cents)
}

fn arb_offset() -> impl Strategy<Value = Decimal> {
    (1i64..400).prop_map(cents)
}

// ── 1. Touch Monotonicity ────────────────────────────────────────────

proptest! {
    /// Once an order is touched it stays touched, and the touch time never moves.
    #[test]
    fn touch_is_monotonic(
        bars in arb_bars(),
        family in 2u8..6,
        buy in any::<bool>(),
        reference in arb_reference(),
        offset in arb_offset(),
    ) {
        let mut security = Security::new("SPY", ExchangeHours::us_equity());
        let engine = FillEngine::default();
        let mut order = make_order(family, buy, reference, offset);
        let mut first_touch = None;

        for (i, ohlc) in bars.into_iter().enumerate() {
            push_bar(&mut security, i as i64 + 1, ohlc, false);
            engine.evaluate(&security, &mut order).unwrap();
            match first_touch {
                Some(at) => prop_assert_eq!(order.latch().touched_at(), Some(at)),
                None => first_touch = order.latch().touched_at(),
            }
        }
    }
}

// ── 2. Trailing Monotonicity ─────────────────────────────────────────

proptest! {
    /// A trailing stop only ever moves toward the market.
    #[test]
    fn trailing_stop_never_loosens(
        bars in arb_bars(),
        buy in any::<bool>(),
        reference in arb_reference(),
        offset in arb_offset(),
    ) {
        let mut security = Security::new("SPY", ExchangeHours::us_equity());
        let engine = FillEngine::default();
        let mut order = make_order(5, buy, reference, offset);
        let mut stop = order.stop_price().unwrap();

        for (i, ohlc) in bars.into_iter().enumerate() {
            push_bar(&mut security, i as i64 + 1, ohlc, false);
            let result = engine.evaluate(&security, &mut order).unwrap();
            let next = order.stop_price().unwrap();
            if buy {
                prop_assert!(next <= stop, "buy stop loosened {} -> {}", stop, next);
            } else {
                prop_assert!(next >= stop, "sell stop loosened {} -> {}", stop, next);
            }
            stop = next;
            if result.is_fill() {
                break;
            }
        }
    }
}

// ── 3. Idempotence ───────────────────────────────────────────────────

proptest! {
    /// Evaluating twice with no new data returns the same result and leaves
    /// the order's latched state alone.
    #[test]
    fn evaluation_is_idempotent(
        ohlc in arb_ohlc(),
        family in 0u8..7,
        buy in any::<bool>(),
        reference in arb_reference(),
        offset in arb_offset(),
    ) {
        let mut security = Security::new("SPY", ExchangeHours::us_equity());
        push_bar(&mut security, 1, ohlc, false);
        let engine = FillEngine::default();
        let mut order = make_order(family, buy, reference, offset);

        let first = engine.evaluate(&security, &mut order).unwrap();
        let latch = *order.latch();
        let stop = order.stop_price();
        let second = engine.evaluate(&security, &mut order).unwrap();

        prop_assert_eq!(first, second);
        prop_assert_eq!(*order.latch(), latch);
        prop_assert_eq!(order.stop_price(), stop);
    }
}

// ── 4. Fill-Forward Exclusion ────────────────────────────────────────

proptest! {
    /// Fill-forwarded bars never produce a fill or a touch.
    #[test]
    fn fill_forward_never_fills(
        ohlc in arb_ohlc(),
        family in 0u8..7,
        buy in any::<bool>(),
        reference in arb_reference(),
        offset in arb_offset(),
    ) {
        let mut security = Security::new("SPY", ExchangeHours::us_equity());
        push_bar(&mut security, 1, ohlc, true);
        let mut order = make_order(family, buy, reference, offset);

        let result = FillEngine::default().evaluate(&security, &mut order).unwrap();
        prop_assert_eq!(result.status, FillStatus::None);
        prop_assert!(!order.is_touched());
    }
}

// ── 5. Limit Honesty ─────────────────────────────────────────────────

proptest! {
    /// Limit fills are at the limit or better.
    #[test]
    fn limit_fill_never_worse_than_limit(
        ohlc in arb_ohlc(),
        buy in any::<bool>(),
        reference in arb_reference(),
        offset in arb_offset(),
    ) {
        let mut security = Security::new("SPY", ExchangeHours::us_equity());
        push_bar(&mut security, 1, ohlc, false);
        let mut order = make_order(1, buy, reference, offset);
        let limit = if buy { reference - offset } else { reference + offset };

        let result = FillEngine::default().evaluate(&security, &mut order).unwrap();
        if result.is_fill() {
            if buy {
                prop_assert!(result.price <= limit);
            } else {
                prop_assert!(result.price >= limit);
            }
            prop_assert!(result.price >= ohlc.low && result.price <= ohlc.high);
        }
    }

    /// Market orders on a trade bar fill at its close.
    #[test]
    fn market_fills_at_close(ohlc in arb_ohlc(), buy in any::<bool>()) {
        let mut security = Security::new("SPY", ExchangeHours::us_equity());
        push_bar(&mut security, 1, ohlc, false);
        let mut order = make_order(0, buy, ohlc.close, Decimal::ONE);

        let result = FillEngine::default().evaluate(&security, &mut order).unwrap();
        prop_assert_eq!(result.status, FillStatus::Filled);
        prop_assert_eq!(result.price, ohlc.close);
    }
}
