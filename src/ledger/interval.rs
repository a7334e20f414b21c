use std::{fmt, str::FromStr};

use chrono::{Datelike, Days, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::errors::LedgerError;

const MAX_EVERY: u32 = 1000;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum TimeUnit {
    Day,
    Week,
    Month,
    Year,
}

/// Recurrence period of a payment schedule, e.g. every week or every 2 months.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct Interval {
    pub every: u32,
    pub unit: TimeUnit,
}

impl Interval {
    pub const fn new(every: u32, unit: TimeUnit) -> Self {
        Self { every, unit }
    }

    pub const fn daily() -> Self {
        Self::new(1, TimeUnit::Day)
    }

    pub const fn weekly() -> Self {
        Self::new(1, TimeUnit::Week)
    }

    pub const fn monthly() -> Self {
        Self::new(1, TimeUnit::Month)
    }

    pub const fn yearly() -> Self {
        Self::new(1, TimeUnit::Year)
    }

    /// Zero-length and absurdly long periods are rejected when a schedule is configured.
    pub fn is_supported(&self) -> bool {
        (1..=MAX_EVERY).contains(&self.every)
    }

    /// Returns the next occurrence after `from`.
    ///
    /// Month and year steps keep the day of month when the target month has it and
    /// clamp to the target month's last day otherwise (31 Jan + 1 month = 28/29 Feb).
    /// Results past the calendar range saturate at `NaiveDate::MAX`, so the result is
    /// strictly later than `from` except at the end of the calendar. Schedules whose
    /// first step would saturate are rejected when they are created.
    pub fn advance(&self, from: NaiveDate) -> NaiveDate {
        let every = self.every as u64;
        let next = match self.unit {
            TimeUnit::Day => from.checked_add_days(Days::new(every)),
            TimeUnit::Week => from.checked_add_days(Days::new(every * 7)),
            TimeUnit::Month => shift_month(from, self.every),
            TimeUnit::Year => shift_month(from, self.every.saturating_mul(12)),
        };
        next.unwrap_or(NaiveDate::MAX)
    }

    pub fn label(&self) -> String {
        match (self.every, &self.unit) {
            (1, TimeUnit::Day) => "Daily".into(),
            (1, TimeUnit::Week) => "Weekly".into(),
            (1, TimeUnit::Month) => "Monthly".into(),
            (1, TimeUnit::Year) => "Yearly".into(),
            (n, unit) => format!("Every {} {:?}{}", n, unit, if n > 1 { "s" } else { "" }),
        }
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}

impl FromStr for Interval {
    type Err = LedgerError;

    /// Accepts `weekly`, `week`, or a count with a unit suffix such as `2w` or `3m`.
    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let value = raw.trim().to_ascii_lowercase();
        let named = match value.as_str() {
            "daily" | "day" => Some(Interval::daily()),
            "weekly" | "week" => Some(Interval::weekly()),
            "monthly" | "month" => Some(Interval::monthly()),
            "yearly" | "year" => Some(Interval::yearly()),
            _ => None,
        };
        if let Some(interval) = named {
            return Ok(interval);
        }

        let invalid = || LedgerError::InvalidInput(format!("unrecognised interval `{}`", raw));
        let split = value.len().checked_sub(1).ok_or_else(invalid)?;
        if !value.is_char_boundary(split) {
            return Err(invalid());
        }
        let (count, suffix) = value.split_at(split);
        let unit = match suffix {
            "d" => TimeUnit::Day,
            "w" => TimeUnit::Week,
            "m" => TimeUnit::Month,
            "y" => TimeUnit::Year,
            _ => return Err(invalid()),
        };
        let every = count.parse::<u32>().map_err(|_| invalid())?;
        Ok(Interval::new(every, unit))
    }
}

fn shift_month(date: NaiveDate, months: u32) -> Option<NaiveDate> {
    let month_index = date.month0() as i64 + months as i64;
    let year = date.year() as i64 + month_index.div_euclid(12);
    let year = i32::try_from(year).ok()?;
    let month = (month_index.rem_euclid(12) + 1) as u32;
    let day = date.day().min(days_in_month(year, month)?);
    NaiveDate::from_ymd_opt(year, month, day)
}

fn days_in_month(year: i32, month: u32) -> Option<u32> {
    let (next_year, next_month) = if month == 12 {
        (year.checked_add(1)?, 1)
    } else {
        (year, month + 1)
    };
    let first_next = NaiveDate::from_ymd_opt(next_year, next_month, 1)?;
    first_next.pred_opt().map(|last| last.day())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn week_adds_seven_days() {
        assert_eq!(Interval::weekly().advance(date(2010, 4, 3)), date(2010, 4, 10));
        assert_eq!(
            Interval::new(2, TimeUnit::Week).advance(date(2010, 12, 27)),
            date(2011, 1, 10)
        );
    }

    #[test]
    fn month_keeps_day_of_month() {
        assert_eq!(Interval::monthly().advance(date(2025, 1, 15)), date(2025, 2, 15));
        assert_eq!(Interval::monthly().advance(date(2025, 12, 5)), date(2026, 1, 5));
    }

    #[test]
    fn month_end_clamps_to_last_day() {
        assert_eq!(Interval::monthly().advance(date(2025, 1, 31)), date(2025, 2, 28));
        assert_eq!(Interval::monthly().advance(date(2024, 1, 31)), date(2024, 2, 29));
        assert_eq!(Interval::monthly().advance(date(2025, 3, 31)), date(2025, 4, 30));
        assert_eq!(Interval::yearly().advance(date(2024, 2, 29)), date(2025, 2, 28));
    }

    #[test]
    fn advance_is_strictly_increasing_for_supported_intervals() {
        let start = date(2023, 1, 29);
        for unit in [TimeUnit::Day, TimeUnit::Week, TimeUnit::Month, TimeUnit::Year] {
            for every in [1, 2, 7, 12] {
                let interval = Interval::new(every, unit);
                let mut current = start;
                for _ in 0..40 {
                    let next = interval.advance(current);
                    assert!(next > current, "{interval:?} did not advance from {current}");
                    current = next;
                }
            }
        }
    }

    #[test]
    fn advance_saturates_at_calendar_end() {
        assert_eq!(Interval::daily().advance(NaiveDate::MAX), NaiveDate::MAX);
        assert_eq!(Interval::yearly().advance(NaiveDate::MAX), NaiveDate::MAX);
    }

    #[test]
    fn zero_interval_is_unsupported() {
        assert!(!Interval::new(0, TimeUnit::Week).is_supported());
        assert!(!Interval::new(MAX_EVERY + 1, TimeUnit::Day).is_supported());
        assert!(Interval::weekly().is_supported());
    }

    #[test]
    fn parses_named_and_suffixed_forms() {
        assert_eq!("Weekly".parse::<Interval>().unwrap(), Interval::weekly());
        assert_eq!("month".parse::<Interval>().unwrap(), Interval::monthly());
        assert_eq!(
            "2w".parse::<Interval>().unwrap(),
            Interval::new(2, TimeUnit::Week)
        );
        assert_eq!(
            "3m".parse::<Interval>().unwrap(),
            Interval::new(3, TimeUnit::Month)
        );
        assert!("fortnightly".parse::<Interval>().is_err());
        assert!("".parse::<Interval>().is_err());
        assert!("xw".parse::<Interval>().is_err());
    }

    #[test]
    fn labels() {
        assert_eq!(Interval::weekly().label(), "Weekly");
        assert_eq!(Interval::new(2, TimeUnit::Week).label(), "Every 2 Weeks");
    }
}
