use crate::error::{ForecastError, Result};
use chrono::NaiveDate;

pub fn is_leap_year(year: i32) -> bool {
    (year % 4 == 0 && year % 100 != 0) || year % 400 == 0
}

pub fn days_in_month(year: i32, month: u32) -> u32 {
    match month {
        1 | 3 | 5 | 7 | 8 | 10 | 12 => 31,
        4 | 6 | 9 | 11 => 30,
        2 if is_leap_year(year) => 29,
        _ => 28,
    }
}

/// Builds a date from parts the caller has already range-checked.
pub(crate) fn ymd(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day)
        .expect("month in 1..=12 and day within days_in_month")
}

pub fn last_day_of_month(year: i32, month: u32) -> NaiveDate {
    ymd(year, month, days_in_month(year, month))
}

/// Shifts a (year, 1-based month) pair by `delta` months, rolling years in both directions.
pub fn add_months(year: i32, month: u32, delta: i32) -> (i32, u32) {
    let index = year * 12 + (month as i32 - 1) + delta;
    (index.div_euclid(12), index.rem_euclid(12) as u32 + 1)
}

/// Parses a "YYYY-MM" label into (year, month).
pub fn parse_month_label(label: &str) -> Result<(i32, u32)> {
    let invalid = || ForecastError::InvalidMonthLabel(label.to_string());

    let (year, month) = label.trim().split_once('-').ok_or_else(invalid)?;
    if year.len() != 4 || month.len() != 2 {
        return Err(invalid());
    }

    let year: i32 = year.parse().map_err(|_| invalid())?;
    let month: u32 = month.parse().map_err(|_| invalid())?;
    if !(1..=12).contains(&month) {
        return Err(invalid());
    }

    Ok((year, month))
}

/// Rounds a fractional cent amount half-up, the way the ledger has always rounded projections.
pub fn round_cents(value: f64) -> i64 {
    (value + 0.5).floor() as i64
}
