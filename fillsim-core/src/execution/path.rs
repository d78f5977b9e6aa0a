//! Intrabar path: the assumed chronological order of a bar's extremes.
//!
//! A bar only says which prices were reached, not when. The convention:
//! a rising (or flat) bar went Open → Low → High → Close, a falling bar went
//! Open → High → Low → Close. This is a modelling policy, applied identically
//! to every order family. Changing it changes backtest results.

use rust_decimal::Decimal;

use crate::domain::Ohlc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IntrabarPath {
    points: [Decimal; 4],
}

impl IntrabarPath {
    pub fn resolve(ohlc: &Ohlc) -> Self {
        let points = if ohlc.is_rising() {
            [ohlc.open, ohlc.low, ohlc.high, ohlc.close]
        } else {
            [ohlc.open, ohlc.high, ohlc.low, ohlc.close]
        };
        Self { points }
    }

    pub fn points(&self) -> &[Decimal; 4] {
        &self.points
    }

    pub fn open(&self) -> Decimal {
        self.points[0]
    }

    /// Monotonic legs between consecutive path points.
    pub fn segments(&self) -> impl Iterator<Item = (Decimal, Decimal)> + '_ {
        self.points.windows(2).map(|leg| (leg[0], leg[1]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn rising_bar_visits_low_first() {
        let path = IntrabarPath::resolve(&Ohlc::new(dec!(100), dec!(110), dec!(95), dec!(108)));
        assert_eq!(path.points(), &[dec!(100), dec!(95), dec!(110), dec!(108)]);
    }

    #[test]
    fn falling_bar_visits_high_first() {
        let path = IntrabarPath::resolve(&Ohlc::new(dec!(100), dec!(110), dec!(95), dec!(97)));
        assert_eq!(path.points(), &[dec!(100), dec!(110), dec!(95), dec!(97)]);
    }

    #[test]
    fn flat_bar_counts_as_rising() {
        let path = IntrabarPath::resolve(&Ohlc::new(dec!(100), dec!(101), dec!(99), dec!(100)));
        assert_eq!(path.points()[1], dec!(99));
    }

    #[test]
    fn three_segments() {
        let path = IntrabarPath::resolve(&Ohlc::point(dec!(5)));
        assert_eq!(path.segments().count(), 3);
    }
}
