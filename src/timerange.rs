// file: src/timerange.rs
// description: natural-language time range resolution and calendar helpers
// reference: https://docs.rs/chrono

use crate::error::{Result, WorklogError};
use chrono::{DateTime, Datelike, Days, Duration, Months, NaiveDate, NaiveTime, TimeZone, Utc};
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

lazy_static! {
    static ref LAST_N_DAYS: Regex = Regex::new(r"(?i)\b(?:last|past)\s+(\d{1,3})\s+days?\b")
        .expect("LAST_N_DAYS regex is valid");
    static ref LAST_N_DAYS_ZH: Regex =
        Regex::new(r"最近\s*(\d{1,3})\s*天").expect("LAST_N_DAYS_ZH regex is valid");
}

/// An inclusive window of UTC timestamps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl DateRange {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self> {
        let range = Self { start, end };
        range.validate()?;
        Ok(range)
    }

    pub fn validate(&self) -> Result<()> {
        if self.start > self.end {
            return Err(WorklogError::Validation(format!(
                "range start {} is after end {}",
                self.start, self.end
            )));
        }
        Ok(())
    }

    pub fn contains(&self, ts: &DateTime<Utc>) -> bool {
        self.start <= *ts && *ts <= self.end
    }

    /// Calendar days touched by the range.
    pub fn days(&self) -> i64 {
        (self.end.date_naive() - self.start.date_naive()).num_days() + 1
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeKeyword {
    Today,
    ThisWeek,
    LastWeek,
    ThisMonth,
    LastMonth,
    LastDays(u32),
}

impl RangeKeyword {
    /// First keyword found in `text`; `None` when nothing matches.
    pub fn detect(text: &str) -> Option<Self> {
        let lower = text.to_lowercase();
        let has = |needles: &[&str]| needles.iter().any(|n| lower.contains(n));

        if has(&["today", "今天"]) {
            return Some(RangeKeyword::Today);
        }
        if has(&["this week", "本周", "这周"]) {
            return Some(RangeKeyword::ThisWeek);
        }
        if has(&["last week", "上周"]) {
            return Some(RangeKeyword::LastWeek);
        }
        if has(&["this month", "本月", "这个月"]) {
            return Some(RangeKeyword::ThisMonth);
        }
        if has(&["last month", "上月", "上个月"]) {
            return Some(RangeKeyword::LastMonth);
        }

        LAST_N_DAYS
            .captures(&lower)
            .or_else(|| LAST_N_DAYS_ZH.captures(text))
            .and_then(|caps| caps.get(1))
            .and_then(|m| m.as_str().parse::<u32>().ok())
            .filter(|days| *days > 0)
            .map(RangeKeyword::LastDays)
    }

    pub fn resolve(&self, now: DateTime<Utc>) -> DateRange {
        match self {
            RangeKeyword::Today => today_range(now),
            RangeKeyword::ThisWeek => week_range(now),
            RangeKeyword::LastWeek => week_range(now - Duration::days(7)),
            RangeKeyword::ThisMonth => month_range(now),
            RangeKeyword::LastMonth => {
                let first = first_of_month(now.date_naive());
                let previous = first.checked_sub_months(Months::new(1)).unwrap_or(first);
                month_range(start_of_day(previous))
            }
            RangeKeyword::LastDays(days) => last_n_days(*days, now),
        }
    }
}

/// Range requested in a chat message; this week when nothing is recognised.
pub fn from_message(text: &str, now: DateTime<Utc>) -> DateRange {
    RangeKeyword::detect(text)
        .unwrap_or(RangeKeyword::ThisWeek)
        .resolve(now)
}

fn start_of_day(date: NaiveDate) -> DateTime<Utc> {
    Utc.from_utc_datetime(&date.and_time(NaiveTime::MIN))
}

fn end_of_day(date: NaiveDate) -> DateTime<Utc> {
    start_of_day(date) + Duration::days(1) - Duration::microseconds(1)
}

fn first_of_month(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

pub fn today_range(now: DateTime<Utc>) -> DateRange {
    let today = now.date_naive();
    DateRange {
        start: start_of_day(today),
        end: end_of_day(today),
    }
}

/// Monday 00:00:00 to Sunday 23:59:59.999999 of the week holding `at`.
pub fn week_range(at: DateTime<Utc>) -> DateRange {
    let date = at.date_naive();
    let monday = date - Duration::days(i64::from(date.weekday().num_days_from_monday()));
    let sunday = monday + Duration::days(6);
    DateRange {
        start: start_of_day(monday),
        end: end_of_day(sunday),
    }
}

pub fn month_range(at: DateTime<Utc>) -> DateRange {
    let first = first_of_month(at.date_naive());
    let last = first
        .checked_add_months(Months::new(1))
        .and_then(|next| next.checked_sub_days(Days::new(1)))
        .unwrap_or(first);
    DateRange {
        start: start_of_day(first),
        end: end_of_day(last),
    }
}

/// The last `days` calendar days ending today, both ends whole days.
pub fn last_n_days(days: u32, now: DateTime<Utc>) -> DateRange {
    let today = now.date_naive();
    let first = today - Duration::days(i64::from(days.max(1)) - 1);
    DateRange {
        start: start_of_day(first),
        end: end_of_day(today),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    // Wednesday
    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, 14, 15, 30, 0).unwrap()
    }

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_week_range_spans_monday_to_sunday() {
        let range = week_range(now());
        assert_eq!(range.start, start_of_day(day(2026, 1, 12)));
        assert_eq!(range.end.date_naive(), day(2026, 1, 18));
        assert_eq!(range.days(), 7);
    }

    #[test]
    fn test_last_week_and_last_month() {
        let range = from_message("Summarize last week please", now());
        assert_eq!(range.start.date_naive(), day(2026, 1, 5));
        assert_eq!(range.end.date_naive(), day(2026, 1, 11));

        let range = from_message("上个月的工作日志", now());
        assert_eq!(range.start, start_of_day(day(2025, 12, 1)));
        assert_eq!(range.end.date_naive(), day(2025, 12, 31));
    }

    #[test]
    fn test_month_range_handles_february() {
        let range = month_range(Utc.with_ymd_and_hms(2028, 2, 10, 0, 0, 0).unwrap());
        assert_eq!(range.end.date_naive(), day(2028, 2, 29));
    }

    #[test]
    fn test_last_n_days() {
        let range = from_message("show me the last 3 days", now());
        assert_eq!(range.start.date_naive(), day(2026, 1, 12));
        assert_eq!(range.end.date_naive(), day(2026, 1, 14));

        assert_eq!(
            RangeKeyword::detect("最近7天的提交"),
            Some(RangeKeyword::LastDays(7))
        );
        assert_eq!(RangeKeyword::detect("last 0 days"), None);
    }

    #[test]
    fn test_keywords_and_default() {
        assert_eq!(RangeKeyword::detect("今天做了什么"), Some(RangeKeyword::Today));
        assert_eq!(RangeKeyword::detect("This Month"), Some(RangeKeyword::ThisMonth));
        assert_eq!(RangeKeyword::detect("hello"), None);
        assert_eq!(from_message("hello", now()), week_range(now()));
    }

    #[test]
    fn test_range_validation() {
        let today = today_range(now());
        assert!(DateRange::new(today.start, today.end).is_ok());
        assert!(DateRange::new(today.end, today.start).is_err());
        assert!(today.contains(&now()));
    }
}
