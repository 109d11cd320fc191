//! Regular-session calendar for the fallback window anchor.
//!
//! Only weekends are treated as closed days. Exchange holidays are not
//! modelled: a window that lands on a holiday is shifted to the holiday's own
//! 16:00, and the upstream simply returns nothing for it.

use chrono::{DateTime, Datelike, NaiveDate, NaiveTime, TimeZone, Utc, Weekday};
use chrono_tz::Tz;

/// Trading hours of a single market in its local timezone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MarketCalendar {
    timezone: Tz,
    open_time: NaiveTime,
    close_time: NaiveTime,
}

impl MarketCalendar {
    /// US equities: 09:30–16:00 America/New_York.
    pub fn us_equities() -> Self {
        Self::with_timezone(chrono_tz::America::New_York)
    }

    /// Regular 09:30–16:00 session in an arbitrary timezone.
    pub fn with_timezone(timezone: Tz) -> Self {
        Self {
            timezone,
            open_time: NaiveTime::MIN + chrono::Duration::minutes(9 * 60 + 30),
            close_time: NaiveTime::MIN + chrono::Duration::hours(16),
        }
    }

    pub fn timezone(&self) -> Tz {
        self.timezone
    }

    /// Most recent weekday session close at or before `timestamp`.
    ///
    /// Returns 0 when `timestamp` cannot be represented as a calendar date.
    pub fn previous_close(&self, timestamp: i64) -> i64 {
        let Some(local) = self.localize(timestamp) else {
            return 0;
        };

        let mut date = local.date_naive();
        if local.time() < self.close_time {
            match date.pred_opt() {
                Some(previous) => date = previous,
                None => return 0,
            }
        }

        while is_weekend(date) {
            match date.pred_opt() {
                Some(previous) => date = previous,
                None => return 0,
            }
        }

        self.close_on(date).unwrap_or(0)
    }

    /// Whether `timestamp` falls inside a weekday regular session.
    pub fn is_open(&self, timestamp: i64) -> bool {
        let Some(local) = self.localize(timestamp) else {
            return false;
        };

        if is_weekend(local.date_naive()) {
            return false;
        }

        let time = local.time();
        time >= self.open_time && time < self.close_time
    }

    fn localize(&self, timestamp: i64) -> Option<DateTime<Tz>> {
        DateTime::<Utc>::from_timestamp(timestamp, 0).map(|utc| utc.with_timezone(&self.timezone))
    }

    fn close_on(&self, date: NaiveDate) -> Option<i64> {
        self.timezone
            .from_local_datetime(&date.and_time(self.close_time))
            .earliest()
            .map(|close| close.timestamp())
    }
}

impl Default for MarketCalendar {
    fn default() -> Self {
        Self::us_equities()
    }
}

fn is_weekend(date: NaiveDate) -> bool {
    matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}
