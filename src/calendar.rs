//! Date math for competency months.
//!
//! A competency month `M` with closing day `D` runs from day `D` of calendar month `M`
//! through day `D - 1` of calendar month `M + 1`. A closing day of 1 is the plain
//! calendar month.
//!
//! Example: closing day 10, February 2026 runs from 2026-02-10 to 2026-03-09.

use crate::error::{ForecastError, Result};
use crate::utils::{add_months, days_in_month, parse_month_label, ymd};
use chrono::{Datelike, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Day of the month on which a new competency period begins (1..=28).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct ClosingDay(u32);

impl ClosingDay {
    pub const CALENDAR: ClosingDay = ClosingDay(1);

    pub fn new(day: u32) -> Result<Self> {
        if !(1..=28).contains(&day) {
            return Err(ForecastError::InvalidClosingDay(day));
        }
        Ok(Self(day))
    }

    pub fn get(self) -> u32 {
        self.0
    }

    pub fn is_calendar(self) -> bool {
        self.0 <= 1
    }
}

impl Default for ClosingDay {
    fn default() -> Self {
        Self::CALENDAR
    }
}

impl TryFrom<u32> for ClosingDay {
    type Error = ForecastError;

    fn try_from(value: u32) -> Result<Self> {
        Self::new(value)
    }
}

impl From<ClosingDay> for u32 {
    fn from(value: ClosingDay) -> Self {
        value.0
    }
}

/// A `{year, month}` pair naming a competency period. Months are 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CompetencyMonth {
    year: i32,
    month: u32,
}

impl CompetencyMonth {
    pub fn new(year: i32, month: u32) -> Result<Self> {
        if !(1..=12).contains(&month) {
            return Err(ForecastError::InvalidMonth(month));
        }
        Ok(Self { year, month })
    }

    /// The calendar month containing `date`, ignoring any closing day.
    pub fn of_date(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    pub fn year(self) -> i32 {
        self.year
    }

    pub fn month(self) -> u32 {
        self.month
    }

    pub fn offset(self, months: i32) -> Self {
        let (year, month) = add_months(self.year, self.month, months);
        Self { year, month }
    }

    pub fn next(self) -> Self {
        self.offset(1)
    }

    pub fn previous(self) -> Self {
        self.offset(-1)
    }

    /// Signed number of months from `self` to `other`.
    pub fn months_until(self, other: CompetencyMonth) -> i32 {
        (other.year - self.year) * 12 + other.month as i32 - self.month as i32
    }

    pub fn label(self) -> String {
        competency_label(self)
    }
}

impl fmt::Display for CompetencyMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl FromStr for CompetencyMonth {
    type Err = ForecastError;

    fn from_str(s: &str) -> Result<Self> {
        let (year, month) = parse_month_label(s)?;
        Self::new(year, month)
    }
}

impl TryFrom<String> for CompetencyMonth {
    type Error = ForecastError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<CompetencyMonth> for String {
    fn from(value: CompetencyMonth) -> Self {
        value.to_string()
    }
}

/// Inclusive calendar-date bounds of a competency period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompetencyRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl CompetencyRange {
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    pub fn days(&self) -> impl Iterator<Item = NaiveDate> {
        let end = self.end;
        self.start.iter_days().take_while(move |d| *d <= end)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompetencyDay {
    pub date: NaiveDate,
    pub day_of_month: u32,
    pub weekday: Weekday,
    pub is_weekend: bool,
    pub is_today: bool,
    /// Strictly before the reference date.
    pub is_past: bool,
    /// Calendar month (1-based) the date belongs to, which differs from the
    /// competency month for the tail of a shifted period.
    pub calendar_month: u32,
}

pub fn competency_range(month: CompetencyMonth, closing_day: ClosingDay) -> CompetencyRange {
    if closing_day.is_calendar() {
        return CompetencyRange {
            start: ymd(month.year, month.month, 1),
            end: ymd(month.year, month.month, days_in_month(month.year, month.month)),
        };
    }

    let day = closing_day.get();
    let next = month.next();
    CompetencyRange {
        start: ymd(month.year, month.month, day),
        end: ymd(next.year, next.month, day - 1),
    }
}

/// The competency month `today` belongs to.
///
/// On or after the closing day we are in the competency of the current calendar
/// month; before it we are still in the previous one.
pub fn current_competency_month(closing_day: ClosingDay, today: NaiveDate) -> CompetencyMonth {
    let month = CompetencyMonth::of_date(today);
    if closing_day.is_calendar() || today.day() >= closing_day.get() {
        month
    } else {
        month.previous()
    }
}

pub fn competency_day_count(month: CompetencyMonth, closing_day: ClosingDay) -> u32 {
    let range = competency_range(month, closing_day);
    ((range.end - range.start).num_days() + 1) as u32
}

/// Days from the period start through `today`, inclusive. Zero before the period starts.
pub fn elapsed_days(month: CompetencyMonth, closing_day: ClosingDay, today: NaiveDate) -> u32 {
    let range = competency_range(month, closing_day);
    let elapsed = (today - range.start).num_days() + 1;
    elapsed.max(0) as u32
}

/// Places a recurring item's day-of-month inside the competency period.
///
/// Returns `None` when the day does not exist in the target calendar month
/// (day 31 in April, day 30 in February); the day is never clamped.
pub fn recurring_date_in_competency(
    day_of_month: u32,
    month: CompetencyMonth,
    closing_day: ClosingDay,
) -> Option<NaiveDate> {
    if day_of_month == 0 {
        return None;
    }

    let target = if closing_day.is_calendar() || day_of_month >= closing_day.get() {
        month
    } else {
        month.next()
    };

    if day_of_month > days_in_month(target.year, target.month) {
        return None;
    }
    Some(ymd(target.year, target.month, day_of_month))
}

pub fn competency_days(
    month: CompetencyMonth,
    closing_day: ClosingDay,
    today: NaiveDate,
) -> Vec<CompetencyDay> {
    competency_range(month, closing_day)
        .days()
        .map(|date| {
            let weekday = date.weekday();
            CompetencyDay {
                date,
                day_of_month: date.day(),
                weekday,
                is_weekend: matches!(weekday, Weekday::Sat | Weekday::Sun),
                is_today: date == today,
                is_past: date < today,
                calendar_month: date.month(),
            }
        })
        .collect()
}

/// Canonical "YYYY-MM" key matched against recurring `start_month`/`end_month` bounds.
pub fn competency_label(month: CompetencyMonth) -> String {
    month.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn month(y: i32, m: u32) -> CompetencyMonth {
        CompetencyMonth::new(y, m).unwrap()
    }

    fn closing(d: u32) -> ClosingDay {
        ClosingDay::new(d).unwrap()
    }

    #[test]
    fn test_closing_day_bounds() {
        assert!(ClosingDay::new(0).is_err());
        assert!(ClosingDay::new(29).is_err());
        assert!(ClosingDay::new(31).is_err());
        assert_eq!(ClosingDay::new(28).unwrap().get(), 28);
        assert!(ClosingDay::default().is_calendar());

        let parsed: std::result::Result<ClosingDay, _> = serde_json::from_str("30");
        assert!(parsed.is_err());
        let parsed: ClosingDay = serde_json::from_str("10").unwrap();
        assert_eq!(parsed.get(), 10);
    }

    #[test]
    fn test_calendar_range_matches_calendar_month() {
        for m in 1..=12 {
            let range = competency_range(month(2026, m), ClosingDay::CALENDAR);
            assert_eq!(range.start, date(2026, m, 1));
            assert_eq!(range.end, crate::utils::last_day_of_month(2026, m));
        }

        let december = competency_range(month(2025, 12), ClosingDay::CALENDAR);
        assert_eq!(december.end, date(2025, 12, 31));
        assert_eq!(
            competency_range(month(2025, 12).next(), ClosingDay::CALENDAR).start,
            date(2026, 1, 1)
        );
    }

    #[test]
    fn test_shifted_range() {
        let range = competency_range(month(2026, 2), closing(10));
        assert_eq!(range.start, date(2026, 2, 10));
        assert_eq!(range.end, date(2026, 3, 9));

        let december = competency_range(month(2025, 12), closing(25));
        assert_eq!(december.start, date(2025, 12, 25));
        assert_eq!(december.end, date(2026, 1, 24));
    }

    #[test]
    fn test_current_competency_month() {
        assert_eq!(
            current_competency_month(ClosingDay::CALENDAR, date(2026, 3, 1)),
            month(2026, 3)
        );
        assert_eq!(
            current_competency_month(closing(10), date(2026, 3, 10)),
            month(2026, 3)
        );
        assert_eq!(
            current_competency_month(closing(10), date(2026, 3, 9)),
            month(2026, 2)
        );
        assert_eq!(
            current_competency_month(closing(10), date(2026, 1, 5)),
            month(2025, 12)
        );
    }

    #[test]
    fn test_day_counts() {
        assert_eq!(competency_day_count(month(2026, 2), ClosingDay::CALENDAR), 28);
        assert_eq!(competency_day_count(month(2024, 2), ClosingDay::CALENDAR), 29);
        assert_eq!(competency_day_count(month(2026, 2), closing(10)), 28);
        assert_eq!(competency_day_count(month(2026, 1), closing(10)), 31);
        assert_eq!(competency_day_count(month(2026, 3), ClosingDay::CALENDAR), 31);
    }

    #[test]
    fn test_elapsed_days_is_monotonic_and_floored() {
        let m = month(2026, 2);
        let cd = closing(10);

        assert_eq!(elapsed_days(m, cd, date(2026, 1, 20)), 0);
        assert_eq!(elapsed_days(m, cd, date(2026, 2, 9)), 0);
        assert_eq!(elapsed_days(m, cd, date(2026, 2, 10)), 1);

        let mut previous = 0;
        for day in competency_range(m, cd).days() {
            let elapsed = elapsed_days(m, cd, day);
            assert!(elapsed >= previous);
            previous = elapsed;
        }
        assert_eq!(previous, competency_day_count(m, cd));
    }

    #[test]
    fn test_recurring_date_shifted_period() {
        // Days on or after the closing day stay in the head month; February has no 31st.
        assert_eq!(
            recurring_date_in_competency(31, month(2026, 2), closing(10)),
            None
        );
        assert_eq!(
            recurring_date_in_competency(31, month(2026, 1), closing(10)),
            Some(date(2026, 1, 31))
        );
        assert_eq!(
            recurring_date_in_competency(15, month(2026, 2), closing(10)),
            Some(date(2026, 2, 15))
        );
        assert_eq!(
            recurring_date_in_competency(5, month(2026, 2), closing(10)),
            Some(date(2026, 3, 5))
        );
        assert_eq!(
            recurring_date_in_competency(31, month(2026, 3), closing(10)),
            Some(date(2026, 3, 31))
        );
        // Days before the closing day fall in the tail month.
        assert_eq!(
            recurring_date_in_competency(5, month(2026, 1), closing(10)),
            Some(date(2026, 2, 5))
        );
        assert_eq!(
            recurring_date_in_competency(30, month(2026, 2), closing(10)),
            None
        );
        assert_eq!(
            recurring_date_in_competency(3, month(2025, 12), closing(10)),
            Some(date(2026, 1, 3))
        );
    }

    #[test]
    fn test_recurring_date_calendar_period() {
        assert_eq!(
            recurring_date_in_competency(30, month(2026, 1), ClosingDay::CALENDAR),
            Some(date(2026, 1, 30))
        );
        assert_eq!(
            recurring_date_in_competency(30, month(2026, 2), ClosingDay::CALENDAR),
            None
        );
        assert_eq!(
            recurring_date_in_competency(29, month(2024, 2), ClosingDay::CALENDAR),
            Some(date(2024, 2, 29))
        );
        assert_eq!(
            recurring_date_in_competency(0, month(2024, 2), ClosingDay::CALENDAR),
            None
        );
    }

    #[test]
    fn test_competency_days() {
        let today = date(2026, 2, 12);
        let days = competency_days(month(2026, 2), closing(10), today);

        assert_eq!(days.len(), 28);
        assert_eq!(days.first().unwrap().date, date(2026, 2, 10));
        assert_eq!(days.last().unwrap().date, date(2026, 3, 9));
        assert!(days.windows(2).all(|w| w[0].date < w[1].date));

        let tenth = &days[0];
        assert!(tenth.is_past);
        assert!(!tenth.is_today);
        assert_eq!(tenth.weekday, Weekday::Tue);

        let twelfth = &days[2];
        assert!(twelfth.is_today);
        assert!(!twelfth.is_past);

        let saturday = days.iter().find(|d| d.date == date(2026, 2, 14)).unwrap();
        assert!(saturday.is_weekend);
        assert_eq!(days.last().unwrap().calendar_month, 3);
    }

    #[test]
    fn test_labels() {
        assert_eq!(competency_label(month(2026, 3)), "2026-03");
        assert_eq!(month(2025, 12).next().label(), "2026-01");
        assert_eq!("2026-11".parse::<CompetencyMonth>().unwrap(), month(2026, 11));
        assert!("2026-00".parse::<CompetencyMonth>().is_err());
        assert_eq!(month(2025, 11).months_until(month(2026, 2)), 3);

        let json = serde_json::to_string(&month(2026, 4)).unwrap();
        assert_eq!(json, "\"2026-04\"");
    }
}
