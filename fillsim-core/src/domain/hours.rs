//! Exchange hours: the time-zone-aware local time reference of a security.
//!
//! Sessions are defined in exchange-local wall-clock time and resolved to
//! concrete UTC intervals on demand, so DST transitions are handled by
//! `chrono_tz`. A session whose close is at or before its open runs past
//! midnight and belongs to the day it opens on.

use std::collections::BTreeSet;

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveTime, TimeZone, Utc, Weekday};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

/// How far ahead `next_regular_open` / `next_regular_close` look.
const SEARCH_HORIZON_DAYS: i64 = 14;

const WEEKDAYS: [Weekday; 5] = [
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
];

const ALL_DAYS: [Weekday; 7] = [
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
    Weekday::Sat,
    Weekday::Sun,
];

fn hm(hour: u32, minute: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(hour, minute, 0).unwrap_or(NaiveTime::MIN)
}

/// A recurring session in exchange-local time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionWindow {
    /// Days the session opens on.
    pub days: Vec<Weekday>,
    pub open: NaiveTime,
    pub close: NaiveTime,
}

impl SessionWindow {
    pub fn new(days: impl Into<Vec<Weekday>>, open: NaiveTime, close: NaiveTime) -> Self {
        Self {
            days: days.into(),
            open,
            close,
        }
    }

    fn crosses_midnight(&self) -> bool {
        self.close <= self.open
    }

    /// The concrete session opening on `date`, if any. Sessions whose open
    /// or close falls in a DST gap are skipped.
    fn on(&self, date: NaiveDate, tz: &Tz) -> Option<SessionInterval> {
        if !self.days.contains(&date.weekday()) {
            return None;
        }
        let close_date = if self.crosses_midnight() {
            date + Duration::days(1)
        } else {
            date
        };
        let start = tz.from_local_datetime(&date.and_time(self.open)).earliest()?;
        let end = tz
            .from_local_datetime(&close_date.and_time(self.close))
            .earliest()?;
        Some(SessionInterval {
            start: start.with_timezone(&Utc),
            end: end.with_timezone(&Utc),
        })
    }
}

/// A resolved session: `[start, end)` in UTC.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionInterval {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl SessionInterval {
    pub fn contains(&self, t: DateTime<Utc>) -> bool {
        self.start <= t && t < self.end
    }

    pub fn overlaps(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> bool {
        self.start < end && start < self.end
    }
}

/// Trading hours of one exchange.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExchangeHours {
    pub timezone: Tz,
    /// Local dates with no sessions opening.
    #[serde(default)]
    pub holidays: BTreeSet<NaiveDate>,
    #[serde(default)]
    pub regular: Vec<SessionWindow>,
    /// Pre-market, after-hours and overnight sessions.
    #[serde(default)]
    pub extended: Vec<SessionWindow>,
}

impl ExchangeHours {
    pub fn new(timezone: Tz) -> Self {
        Self {
            timezone,
            holidays: BTreeSet::new(),
            regular: Vec::new(),
            extended: Vec::new(),
        }
    }

    pub fn with_regular(mut self, window: SessionWindow) -> Self {
        self.regular.push(window);
        self
    }

    pub fn with_extended(mut self, window: SessionWindow) -> Self {
        self.extended.push(window);
        self
    }

    pub fn with_holiday(mut self, date: NaiveDate) -> Self {
        self.holidays.insert(date);
        self
    }

    /// NYSE/Nasdaq cash equities: 09:30–16:00 New York, with 04:00 pre-market
    /// and after-hours until 20:00.
    pub fn us_equity() -> Self {
        Self::new(chrono_tz::America::New_York)
            .with_regular(SessionWindow::new(WEEKDAYS, hm(9, 30), hm(16, 0)))
            .with_extended(SessionWindow::new(WEEKDAYS, hm(4, 0), hm(9, 30)))
            .with_extended(SessionWindow::new(WEEKDAYS, hm(16, 0), hm(20, 0)))
    }

    /// CME equity index futures (Chicago): regular 08:30–15:00, the 15:00–16:00
    /// post-close, and the overnight session opening 17:00 Sunday to Thursday.
    pub fn cme_equity_futures() -> Self {
        Self::new(chrono_tz::America::Chicago)
            .with_regular(SessionWindow::new(WEEKDAYS, hm(8, 30), hm(15, 0)))
            .with_extended(SessionWindow::new(WEEKDAYS, hm(15, 0), hm(16, 0)))
            .with_extended(SessionWindow::new(
                [
                    Weekday::Sun,
                    Weekday::Mon,
                    Weekday::Tue,
                    Weekday::Wed,
                    Weekday::Thu,
                ],
                hm(17, 0),
                hm(8, 30),
            ))
    }

    /// Open around the clock. Each UTC day is one regular session.
    pub fn always_open() -> Self {
        Self::new(chrono_tz::UTC).with_regular(SessionWindow::new(
            ALL_DAYS,
            NaiveTime::MIN,
            NaiveTime::MIN,
        ))
    }

    fn windows(&self, extended: bool) -> impl Iterator<Item = &SessionWindow> {
        let extra: &[SessionWindow] = if extended { &self.extended } else { &[] };
        self.regular.iter().chain(extra)
    }

    /// Sessions that end after `from` and start at or before `to`, sorted by
    /// start time.
    fn intervals(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
        windows: &[&SessionWindow],
    ) -> Vec<SessionInterval> {
        // An overnight session that opened the previous local day may still
        // be running at `from`.
        let mut date = from.with_timezone(&self.timezone).date_naive() - Duration::days(1);
        let last = to.with_timezone(&self.timezone).date_naive();
        let mut out = Vec::new();
        while date <= last {
            if !self.holidays.contains(&date) {
                out.extend(
                    windows
                        .iter()
                        .filter_map(|w| w.on(date, &self.timezone))
                        .filter(|iv| iv.end > from && iv.start <= to),
                );
            }
            date += Duration::days(1);
        }
        out.sort_by_key(|iv| iv.start);
        out
    }

    /// Whether the exchange is trading at `t`. Extended sessions count only
    /// when `extended` is set.
    pub fn is_open(&self, t: DateTime<Utc>, extended: bool) -> bool {
        let windows: Vec<_> = self.windows(extended).collect();
        self.intervals(t, t, &windows)
            .iter()
            .any(|iv| iv.contains(t))
    }

    /// Whether any part of `[start, end)` falls inside trading hours. A
    /// zero-length span is treated as the instant `start`.
    pub fn is_open_during(&self, start: DateTime<Utc>, end: DateTime<Utc>, extended: bool) -> bool {
        if end <= start {
            return self.is_open(start, extended);
        }
        let windows: Vec<_> = self.windows(extended).collect();
        self.intervals(start, end, &windows)
            .iter()
            .any(|iv| iv.overlaps(start, end))
    }

    /// Regular session in progress at `t`.
    pub fn regular_session_at(&self, t: DateTime<Utc>) -> Option<SessionInterval> {
        let windows: Vec<_> = self.regular.iter().collect();
        self.intervals(t, t, &windows)
            .into_iter()
            .find(|iv| iv.contains(t))
    }

    /// Opening time of the first regular session opening strictly after `after`.
    pub fn next_regular_open(&self, after: DateTime<Utc>) -> Option<DateTime<Utc>> {
        let windows: Vec<_> = self.regular.iter().collect();
        let horizon = after + Duration::days(SEARCH_HORIZON_DAYS);
        self.intervals(after, horizon, &windows)
            .into_iter()
            .map(|iv| iv.start)
            .find(|start| *start > after)
    }

    /// Closing time of the first regular session closing strictly after `after`.
    pub fn next_regular_close(&self, after: DateTime<Utc>) -> Option<DateTime<Utc>> {
        let windows: Vec<_> = self.regular.iter().collect();
        let horizon = after + Duration::days(SEARCH_HORIZON_DAYS);
        self.intervals(after, horizon, &windows)
            .into_iter()
            .map(|iv| iv.end)
            .filter(|end| *end > after)
            .min()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn utc(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, mo, d, h, mi, 0).unwrap()
    }

    #[test]
    fn us_equity_regular_and_extended() {
        let hours = ExchangeHours::us_equity();
        // 2024-01-02 is a Tuesday; New York is UTC-5 in January.
        assert!(hours.is_open(utc(2024, 1, 2, 15, 0), false));
        assert!(!hours.is_open(utc(2024, 1, 2, 13, 0), false));
        assert!(hours.is_open(utc(2024, 1, 2, 13, 0), true));
        assert!(!hours.is_open(utc(2024, 1, 3, 2, 0), true));
    }

    #[test]
    fn close_is_exclusive() {
        let hours = ExchangeHours::us_equity();
        assert!(hours.is_open(utc(2024, 1, 2, 20, 59), false));
        assert!(!hours.is_open(utc(2024, 1, 2, 21, 0), false));
    }

    #[test]
    fn weekend_is_closed() {
        let hours = ExchangeHours::us_equity();
        // Saturday 2024-01-06.
        assert!(!hours.is_open(utc(2024, 1, 6, 15, 0), true));
    }

    #[test]
    fn dst_shifts_the_utc_open() {
        let hours = ExchangeHours::us_equity();
        // 2024-07-02: New York is UTC-4, so 09:30 local is 13:30 UTC.
        assert!(hours.is_open(utc(2024, 7, 2, 13, 30), false));
        assert!(!hours.is_open(utc(2024, 7, 2, 13, 29), false));
    }

    #[test]
    fn overnight_futures_session_spans_midnight() {
        let hours = ExchangeHours::cme_equity_futures();
        // Tuesday 2024-01-02 03:00 UTC is Monday 21:00 in Chicago.
        let overnight = utc(2024, 1, 2, 3, 0);
        assert!(!hours.is_open(overnight, false));
        assert!(hours.is_open(overnight, true));
        // Saturday morning Chicago: the Friday session never opened overnight.
        assert!(!hours.is_open(utc(2024, 1, 6, 3, 0), true));
    }

    #[test]
    fn holiday_suppresses_sessions() {
        let day = NaiveDate::from_ymd_opt(2024, 1, 15).unwrap();
        let hours = ExchangeHours::us_equity().with_holiday(day);
        assert!(!hours.is_open(utc(2024, 1, 15, 15, 0), true));
        assert_eq!(
            hours.next_regular_open(utc(2024, 1, 12, 22, 0)),
            Some(utc(2024, 1, 16, 14, 30))
        );
    }

    #[test]
    fn next_open_and_close() {
        let hours = ExchangeHours::us_equity();
        let friday_evening = utc(2024, 1, 5, 22, 0);
        assert_eq!(
            hours.next_regular_open(friday_evening),
            Some(utc(2024, 1, 8, 14, 30))
        );
        let midday = utc(2024, 1, 2, 17, 0);
        assert_eq!(hours.next_regular_close(midday), Some(utc(2024, 1, 2, 21, 0)));
        // During the session, the next open is tomorrow's.
        assert_eq!(hours.next_regular_open(midday), Some(utc(2024, 1, 3, 14, 30)));
    }

    #[test]
    fn span_overlap() {
        let hours = ExchangeHours::us_equity();
        let start = utc(2024, 1, 2, 14, 0);
        assert!(hours.is_open_during(start, utc(2024, 1, 2, 14, 31), false));
        assert!(!hours.is_open_during(start, utc(2024, 1, 2, 14, 30), false));
    }

    #[test]
    fn always_open_is_open() {
        let hours = ExchangeHours::always_open();
        assert!(hours.is_open(utc(2024, 1, 6, 3, 17), false));
        assert!(hours.regular_session_at(utc(2024, 1, 6, 3, 17)).is_some());
    }

    #[test]
    fn hours_roundtrip_through_toml() {
        let hours = ExchangeHours::cme_equity_futures();
        let text = toml::to_string(&hours).unwrap();
        assert!(text.contains("America/Chicago"));
        let back: ExchangeHours = toml::from_str(&text).unwrap();
        assert_eq!(hours, back);
    }
}
