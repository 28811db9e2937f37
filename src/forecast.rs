//! Rolling multi-month projection per category.
//!
//! Each category carries four figures per competency month:
//!
//! - **projected**: best estimate for the whole month, blending what already
//!   happened with what is still expected.
//! - **forecast_full**: what the model predicts for the whole month.
//! - **forecast_to_date**: the model's prediction truncated to the elapsed days,
//!   for a like-for-like comparison against `real` in the current month.
//! - **real**: transactions recorded so far (zero for future months).
//!
//! `Recurring` categories are forecast from their scheduled items;
//! `Historical` categories from their average over the trailing lookback window.

use crate::calendar::{
    competency_day_count, competency_range, current_competency_month, elapsed_days,
    recurring_date_in_competency, ClosingDay, CompetencyMonth,
};
use crate::error::Result;
use crate::schema::{
    Category, FlowType, ForecastSettings, ProjectionStrategy, RecurringTransaction, Transaction,
};
use crate::source::{DateRange, LedgerSource};
use crate::utils::round_cents;
use chrono::{Duration, NaiveDate};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryForecast {
    pub category_id: String,
    pub category_name: String,
    pub flow: FlowType,
    pub strategy: ProjectionStrategy,
    pub projected: i64,
    pub forecast_full: i64,
    pub forecast_to_date: i64,
    pub real: i64,
    /// At least one contributing recurring item is a one-off.
    pub has_pontual: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlowTotals {
    pub income: i64,
    pub expense: i64,
}

impl FlowTotals {
    pub fn add(&mut self, flow: FlowType, amount: i64) {
        match flow {
            FlowType::Receita => self.income += amount,
            FlowType::Despesa => self.expense += amount,
        }
    }

    pub fn saldo(&self) -> i64 {
        self.income - self.expense
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonthForecast {
    pub month: CompetencyMonth,
    pub label: String,
    pub is_current_month: bool,
    /// Sorted by `projected`, largest first.
    pub categories: Vec<CategoryForecast>,
    pub projected: FlowTotals,
    pub forecast: FlowTotals,
    pub forecast_to_date: FlowTotals,
    pub real: FlowTotals,
}

impl MonthForecast {
    pub fn saldo(&self) -> i64 {
        self.projected.saldo()
    }

    /// Forecast-to-date against realized amounts, income categories first.
    pub fn variances(&self) -> Vec<CategoryVariance> {
        let relevant = |c: &&CategoryForecast| c.forecast_to_date != 0 || c.real != 0;
        let income = self
            .categories
            .iter()
            .filter(|c| c.flow == FlowType::Receita)
            .filter(relevant);
        let expense = self
            .categories
            .iter()
            .filter(|c| c.flow == FlowType::Despesa)
            .filter(relevant);

        income
            .chain(expense)
            .map(|c| CategoryVariance {
                category_id: c.category_id.clone(),
                category_name: c.category_name.clone(),
                flow: c.flow,
                expected_to_date: c.forecast_to_date,
                real: c.real,
                difference: c.real - c.forecast_to_date,
            })
            .collect()
    }

    /// Expense categories spending faster than forecast to date, worst ratio first.
    pub fn over_budget(&self) -> Vec<OverBudget> {
        let mut over: Vec<OverBudget> = self
            .categories
            .iter()
            .filter(|c| c.flow == FlowType::Despesa)
            .filter(|c| c.forecast_to_date > 0 && c.real > c.forecast_to_date)
            .map(|c| OverBudget {
                category_id: c.category_id.clone(),
                category_name: c.category_name.clone(),
                expected_to_date: c.forecast_to_date,
                real: c.real,
                ratio: c.real as f64 / c.forecast_to_date as f64,
            })
            .collect();
        over.sort_by(|a, b| b.ratio.total_cmp(&a.ratio));
        over
    }

    pub fn most_over_budget(&self) -> Option<OverBudget> {
        self.over_budget().into_iter().next()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverBudget {
    pub category_id: String,
    pub category_name: String,
    pub expected_to_date: i64,
    pub real: i64,
    /// `real / expected_to_date`, always above 1.
    pub ratio: f64,
}

impl OverBudget {
    pub fn over_percent(&self) -> f64 {
        (self.ratio - 1.0) * 100.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryVariance {
    pub category_id: String,
    pub category_name: String,
    pub flow: FlowType,
    pub expected_to_date: i64,
    pub real: i64,
    /// `real - expected_to_date`.
    pub difference: i64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ForecastResult {
    pub months: Vec<MonthForecast>,
}

impl ForecastResult {
    pub fn current_month(&self) -> Option<&MonthForecast> {
        self.months.iter().find(|m| m.is_current_month)
    }
}

/// Per-category averages over the lookback window.
///
/// The divisor is the number of distinct competency months in which the
/// category had at least one transaction, not the window length, so sparse
/// categories are not diluted.
#[derive(Debug, Clone, Default)]
pub struct HistoricalAverages {
    totals: HashMap<String, i64>,
    months: HashMap<String, BTreeSet<CompetencyMonth>>,
}

impl HistoricalAverages {
    pub fn from_transactions<'a>(
        transactions: impl IntoIterator<Item = &'a Transaction>,
        closing_day: ClosingDay,
    ) -> Self {
        let mut averages = Self::default();
        for txn in transactions {
            *averages.totals.entry(txn.category_id.clone()).or_insert(0) += txn.amount_cents;
            averages
                .months
                .entry(txn.category_id.clone())
                .or_default()
                .insert(current_competency_month(closing_day, txn.date));
        }
        averages
    }

    pub fn months_with_data(&self, category_id: &str) -> usize {
        self.months.get(category_id).map_or(0, BTreeSet::len)
    }

    pub fn total(&self, category_id: &str) -> i64 {
        self.totals.get(category_id).copied().unwrap_or(0)
    }

    pub fn monthly_average(&self, category_id: &str) -> Option<f64> {
        match self.months_with_data(category_id) {
            0 => None,
            months => Some(self.total(category_id) as f64 / months as f64),
        }
    }
}

/// The `lookback_months` competency periods immediately before `current`.
pub fn lookback_range(
    current: CompetencyMonth,
    closing_day: ClosingDay,
    lookback_months: u32,
) -> DateRange {
    let first = current.offset(-(lookback_months as i32));
    let start = competency_range(first, closing_day).start;
    let end = competency_range(current, closing_day).start - Duration::days(1);
    DateRange::new(start, end)
}

/// Everything one forecast computation reads from the ledger.
#[derive(Debug, Clone, Default)]
pub struct ForecastInputs {
    pub categories: Vec<Category>,
    pub recurring: Vec<RecurringTransaction>,
    /// Transactions inside the lookback window.
    pub historical: Vec<Transaction>,
    /// Transactions from the current period's start through the reference date.
    pub current: Vec<Transaction>,
}

/// Period facts shared by every category of the current month.
struct CurrentPeriod {
    month: CompetencyMonth,
    today: NaiveDate,
    day_count: u32,
    elapsed: u32,
    real: HashMap<String, i64>,
}

pub struct ForecastEngine {
    settings: ForecastSettings,
}

impl ForecastEngine {
    pub fn new(settings: ForecastSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &ForecastSettings {
        &self.settings
    }

    pub async fn calculate<S>(&self, source: &S, today: NaiveDate) -> Result<ForecastResult>
    where
        S: LedgerSource + ?Sized,
    {
        self.settings.validate()?;

        let closing_day = self.settings.closing_day;
        let current = current_competency_month(closing_day, today);
        let lookback = lookback_range(current, closing_day, self.settings.lookback_months);
        let to_date = DateRange::new(competency_range(current, closing_day).start, today);
        let include_current = self.settings.include_current_month;

        info!(
            "Calculating forecast from {} for {} months ahead (current month included: {})",
            current, self.settings.months_ahead, include_current
        );

        let (categories, recurring, historical, current_transactions) = futures::try_join!(
            source.categories(),
            source.recurring(true),
            source.transactions(lookback),
            async {
                if include_current {
                    source.transactions(to_date).await
                } else {
                    Ok(Vec::new())
                }
            },
        )?;

        debug!(
            "Fetched {} categories, {} recurring items, {} historical and {} current transactions",
            categories.len(),
            recurring.len(),
            historical.len(),
            current_transactions.len()
        );

        let inputs = ForecastInputs {
            categories,
            recurring,
            historical,
            current: current_transactions,
        };
        Ok(self.build(today, &inputs))
    }

    /// Pure part of the computation over already-fetched records.
    pub fn build(&self, today: NaiveDate, inputs: &ForecastInputs) -> ForecastResult {
        let closing_day = self.settings.closing_day;
        let month = current_competency_month(closing_day, today);
        let range = competency_range(month, closing_day);
        let lookback = lookback_range(month, closing_day, self.settings.lookback_months);

        let averages = HistoricalAverages::from_transactions(
            inputs.historical.iter().filter(|t| lookback.contains(t.date)),
            closing_day,
        );

        let mut real = HashMap::new();
        for txn in inputs
            .current
            .iter()
            .filter(|t| range.start <= t.date && t.date <= today)
        {
            *real.entry(txn.category_id.clone()).or_insert(0) += txn.amount_cents;
        }

        let current = CurrentPeriod {
            month,
            today,
            day_count: competency_day_count(month, closing_day),
            elapsed: elapsed_days(month, closing_day, today),
            real,
        };

        let first = if self.settings.include_current_month { 0 } else { 1 };
        let months = (first..=self.settings.months_ahead as i32)
            .map(|offset| self.month_forecast(month.offset(offset), &current, &averages, inputs))
            .collect();

        ForecastResult { months }
    }

    fn month_forecast(
        &self,
        target: CompetencyMonth,
        current: &CurrentPeriod,
        averages: &HistoricalAverages,
        inputs: &ForecastInputs,
    ) -> MonthForecast {
        let is_current_month = target == current.month;
        let label = target.label();

        let mut categories: Vec<CategoryForecast> = inputs
            .categories
            .iter()
            .map(|category| match category.strategy {
                ProjectionStrategy::Recurring => {
                    self.recurring_forecast(category, target, &label, current, &inputs.recurring)
                }
                ProjectionStrategy::Historical => {
                    historical_forecast(category, is_current_month, current, averages)
                }
            })
            .filter(|c| c.projected != 0 || c.forecast_full != 0 || c.real != 0)
            .collect();

        categories.sort_by(|a, b| b.projected.cmp(&a.projected));

        let mut projected = FlowTotals::default();
        let mut forecast = FlowTotals::default();
        let mut forecast_to_date = FlowTotals::default();
        let mut real = FlowTotals::default();
        for c in &categories {
            projected.add(c.flow, c.projected);
            forecast.add(c.flow, c.forecast_full);
            forecast_to_date.add(c.flow, c.forecast_to_date);
            real.add(c.flow, c.real);
        }

        debug!(
            "{}: {} categories, projected saldo {}",
            label,
            categories.len(),
            projected.saldo()
        );

        MonthForecast {
            month: target,
            label,
            is_current_month,
            categories,
            projected,
            forecast,
            forecast_to_date,
            real,
        }
    }

    fn recurring_forecast(
        &self,
        category: &Category,
        target: CompetencyMonth,
        label: &str,
        current: &CurrentPeriod,
        recurring: &[RecurringTransaction],
    ) -> CategoryForecast {
        let scheduled: Vec<(NaiveDate, &RecurringTransaction)> = recurring
            .iter()
            .filter(|r| r.is_active && r.category_id == category.id && r.applies_to(label))
            .filter_map(|r| {
                recurring_date_in_competency(r.day_of_month, target, self.settings.closing_day)
                    .map(|date| (date, r))
            })
            .collect();

        let has_pontual = scheduled.iter().any(|(_, r)| r.is_pontual());
        let forecast_full: i64 = scheduled.iter().map(|(_, r)| r.amount_cents).sum();

        let (projected, forecast_to_date, real) = if target == current.month {
            let (due, pending): (Vec<_>, Vec<_>) =
                scheduled.iter().partition(|(date, _)| *date <= current.today);
            let due: i64 = due.iter().map(|(_, r)| r.amount_cents).sum();
            let pending: i64 = pending.iter().map(|(_, r)| r.amount_cents).sum();
            let real = current.real.get(&category.id).copied().unwrap_or(0);
            (real + pending, due, real)
        } else {
            (forecast_full, 0, 0)
        };

        CategoryForecast {
            category_id: category.id.clone(),
            category_name: category.name.clone(),
            flow: category.flow,
            strategy: category.strategy,
            projected,
            forecast_full,
            forecast_to_date,
            real,
            has_pontual,
        }
    }
}

fn historical_forecast(
    category: &Category,
    is_current_month: bool,
    current: &CurrentPeriod,
    averages: &HistoricalAverages,
) -> CategoryForecast {
    let average = averages.monthly_average(&category.id);
    let forecast_full = average.map_or(0, round_cents);

    let (projected, forecast_to_date, real) = if is_current_month {
        let real = current.real.get(&category.id).copied().unwrap_or(0);
        match average {
            Some(average) => {
                let daily = average / current.day_count as f64;
                let remaining = current.day_count.saturating_sub(current.elapsed);
                (
                    real + round_cents(daily * remaining as f64),
                    round_cents(daily * current.elapsed as f64),
                    real,
                )
            }
            None => (real, 0, real),
        }
    } else {
        // Flat carry-forward of the average.
        (forecast_full, 0, 0)
    };

    CategoryForecast {
        category_id: category.id.clone(),
        category_name: category.name.clone(),
        flow: category.flow,
        strategy: category.strategy,
        projected,
        forecast_full,
        forecast_to_date,
        real,
        has_pontual: false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn category(id: &str, flow: FlowType, strategy: ProjectionStrategy) -> Category {
        Category {
            id: id.to_string(),
            name: id.to_uppercase(),
            flow,
            strategy,
        }
    }

    fn txn(category_id: &str, flow: FlowType, amount_cents: i64, date: NaiveDate) -> Transaction {
        Transaction {
            id: format!("{}-{}-{}", category_id, date, amount_cents),
            account_id: "acc".to_string(),
            category_id: category_id.to_string(),
            flow,
            amount_cents,
            description: String::new(),
            date,
        }
    }

    fn recurring(
        id: &str,
        category_id: &str,
        flow: FlowType,
        amount_cents: i64,
        day: u32,
    ) -> RecurringTransaction {
        RecurringTransaction {
            id: id.to_string(),
            account_id: "acc".to_string(),
            category_id: category_id.to_string(),
            flow,
            amount_cents,
            description: String::new(),
            day_of_month: day,
            is_active: true,
            start_month: None,
            end_month: None,
        }
    }

    fn engine(closing_day: u32, months_ahead: u32, include_current_month: bool) -> ForecastEngine {
        ForecastEngine::new(ForecastSettings {
            closing_day: ClosingDay::new(closing_day).unwrap(),
            months_ahead,
            include_current_month,
            ..Default::default()
        })
    }

    fn find<'a>(month: &'a MonthForecast, id: &str) -> &'a CategoryForecast {
        month
            .categories
            .iter()
            .find(|c| c.category_id == id)
            .unwrap()
    }

    #[test]
    fn test_historical_current_month_blend() {
        let inputs = ForecastInputs {
            categories: vec![category("food", FlowType::Despesa, ProjectionStrategy::Historical)],
            historical: vec![
                txn("food", FlowType::Despesa, 4_000, date(2026, 2, 3)),
                txn("food", FlowType::Despesa, 5_000, date(2026, 2, 20)),
            ],
            ..Default::default()
        };

        let result = engine(1, 0, true).build(date(2026, 3, 15), &inputs);
        assert_eq!(result.months.len(), 1);

        let march = &result.months[0];
        assert!(march.is_current_month);
        let food = find(march, "food");
        assert_eq!(food.forecast_full, 9_000);
        assert_eq!(food.forecast_to_date, 4_355);
        assert_eq!(food.projected, 4_645);
        assert_eq!(food.real, 0);
    }

    #[test]
    fn test_historical_average_divides_by_months_with_data() {
        let inputs = ForecastInputs {
            categories: vec![category("fuel", FlowType::Despesa, ProjectionStrategy::Historical)],
            historical: vec![
                txn("fuel", FlowType::Despesa, 12_000, date(2025, 12, 4)),
                txn("fuel", FlowType::Despesa, 8_000, date(2025, 12, 22)),
                txn("fuel", FlowType::Despesa, 10_000, date(2026, 2, 14)),
            ],
            ..Default::default()
        };

        let result = engine(1, 2, true).build(date(2026, 3, 15), &inputs);
        assert_eq!(find(&result.months[0], "fuel").forecast_full, 15_000);
        for future in &result.months[1..] {
            let fuel = find(future, "fuel");
            assert_eq!(fuel.projected, 15_000);
            assert_eq!(fuel.forecast_full, 15_000);
            assert_eq!(fuel.real, 0);
        }
    }

    #[test]
    fn test_historical_buckets_by_competency_month() {
        let closing_day = ClosingDay::new(10).unwrap();
        let averages = HistoricalAverages::from_transactions(
            &[
                txn("food", FlowType::Despesa, 2_000, date(2026, 1, 5)),
                txn("food", FlowType::Despesa, 4_000, date(2026, 1, 12)),
            ],
            closing_day,
        );
        // Same calendar month, two competency months.
        assert_eq!(averages.months_with_data("food"), 2);
        assert_eq!(averages.monthly_average("food"), Some(3_000.0));
        assert_eq!(averages.monthly_average("missing"), None);
    }

    #[test]
    fn test_lookback_window_follows_closing_day() {
        let current = CompetencyMonth::new(2026, 3).unwrap();

        let calendar = lookback_range(current, ClosingDay::CALENDAR, 3);
        assert_eq!(calendar.start, date(2025, 12, 1));
        assert_eq!(calendar.end, date(2026, 2, 28));

        let shifted = lookback_range(current, ClosingDay::new(10).unwrap(), 3);
        assert_eq!(shifted.start, date(2025, 12, 10));
        assert_eq!(shifted.end, date(2026, 3, 9));
    }

    #[test]
    fn test_history_outside_window_is_ignored() {
        let inputs = ForecastInputs {
            categories: vec![category("food", FlowType::Despesa, ProjectionStrategy::Historical)],
            historical: vec![
                txn("food", FlowType::Despesa, 90_000, date(2025, 11, 30)),
                txn("food", FlowType::Despesa, 3_000, date(2026, 1, 10)),
            ],
            ..Default::default()
        };

        let result = engine(1, 1, false).build(date(2026, 3, 15), &inputs);
        assert_eq!(find(&result.months[0], "food").forecast_full, 3_000);
    }

    #[test]
    fn test_recurring_current_month_splits_due_and_pending() {
        let inputs = ForecastInputs {
            categories: vec![category("salary", FlowType::Receita, ProjectionStrategy::Recurring)],
            recurring: vec![
                recurring("r1", "salary", FlowType::Receita, 500_000, 5),
                recurring("r2", "salary", FlowType::Receita, 100_000, 25),
            ],
            current: vec![txn("salary", FlowType::Receita, 480_000, date(2026, 3, 6))],
            ..Default::default()
        };

        let result = engine(1, 1, true).build(date(2026, 3, 15), &inputs);
        let march = find(&result.months[0], "salary");
        assert_eq!(march.real, 480_000);
        assert_eq!(march.forecast_to_date, 500_000);
        assert_eq!(march.forecast_full, 600_000);
        assert_eq!(march.projected, 580_000);
        assert!(!march.has_pontual);

        let april = find(&result.months[1], "salary");
        assert_eq!(april.projected, 600_000);
        assert_eq!(april.forecast_full, 600_000);
        assert_eq!(april.forecast_to_date, 0);
    }

    #[test]
    fn test_pontual_item_only_counts_in_its_month() {
        let mut one_off = recurring("r1", "bonus", FlowType::Receita, 200_000, 20);
        one_off.start_month = Some("2026-03".to_string());
        one_off.end_month = Some("2026-03".to_string());

        let inputs = ForecastInputs {
            categories: vec![category("bonus", FlowType::Receita, ProjectionStrategy::Recurring)],
            recurring: vec![one_off],
            ..Default::default()
        };

        let result = engine(1, 2, true).build(date(2026, 3, 15), &inputs);
        let march = find(&result.months[0], "bonus");
        assert!(march.has_pontual);
        assert_eq!(march.forecast_full, 200_000);
        assert_eq!(march.projected, 200_000);

        assert!(result.months[1].categories.is_empty());
        assert!(result.months[2].categories.is_empty());

        let february = engine(1, 0, true).build(date(2026, 2, 15), &inputs);
        assert!(february.months[0].categories.is_empty());
    }

    #[test]
    fn test_missing_day_is_skipped_for_that_month() {
        let inputs = ForecastInputs {
            categories: vec![category("rent", FlowType::Despesa, ProjectionStrategy::Recurring)],
            recurring: vec![recurring("r1", "rent", FlowType::Despesa, 50_000, 31)],
            ..Default::default()
        };

        let result = engine(1, 2, false).build(date(2026, 3, 15), &inputs);
        // April has 30 days, May has 31.
        assert_eq!(result.months[0].label, "2026-04");
        assert!(result.months[0].categories.is_empty());
        assert_eq!(find(&result.months[1], "rent").forecast_full, 50_000);
    }

    #[test]
    fn test_window_start_and_roll_ups() {
        let inputs = ForecastInputs {
            categories: vec![
                category("salary", FlowType::Receita, ProjectionStrategy::Recurring),
                category("rent", FlowType::Despesa, ProjectionStrategy::Recurring),
                category("gym", FlowType::Despesa, ProjectionStrategy::Recurring),
                category("unused", FlowType::Despesa, ProjectionStrategy::Historical),
            ],
            recurring: vec![
                recurring("r1", "salary", FlowType::Receita, 500_000, 5),
                recurring("r2", "rent", FlowType::Despesa, 150_000, 10),
                recurring("r3", "gym", FlowType::Despesa, 10_000, 12),
            ],
            ..Default::default()
        };

        let result = engine(1, 3, false).build(date(2026, 3, 15), &inputs);
        let labels: Vec<&str> = result.months.iter().map(|m| m.label.as_str()).collect();
        assert_eq!(labels, vec!["2026-04", "2026-05", "2026-06"]);
        assert!(result.current_month().is_none());

        let april = &result.months[0];
        let order: Vec<&str> = april.categories.iter().map(|c| c.category_id.as_str()).collect();
        assert_eq!(order, vec!["salary", "rent", "gym"]);
        assert_eq!(april.projected.income, 500_000);
        assert_eq!(april.projected.expense, 160_000);
        assert_eq!(april.saldo(), 340_000);
        assert_eq!(april.forecast.saldo(), 340_000);
        assert_eq!(april.real, FlowTotals::default());
    }

    #[test]
    fn test_variances_compare_to_date_figures() {
        let inputs = ForecastInputs {
            categories: vec![
                category("salary", FlowType::Receita, ProjectionStrategy::Recurring),
                category("food", FlowType::Despesa, ProjectionStrategy::Historical),
            ],
            recurring: vec![recurring("r1", "salary", FlowType::Receita, 500_000, 5)],
            historical: vec![txn("food", FlowType::Despesa, 31_000, date(2026, 2, 10))],
            current: vec![
                txn("salary", FlowType::Receita, 500_000, date(2026, 3, 5)),
                txn("food", FlowType::Despesa, 20_000, date(2026, 3, 8)),
            ],
        };

        let result = engine(1, 0, true).build(date(2026, 3, 15), &inputs);
        let march = result.current_month().unwrap();
        let variances = march.variances();

        assert_eq!(variances.len(), 2);
        assert_eq!(variances[0].category_id, "salary");
        assert_eq!(variances[0].difference, 0);
        assert_eq!(variances[1].category_id, "food");
        assert_eq!(variances[1].expected_to_date, 15_000);
        assert_eq!(variances[1].difference, 5_000);

        assert_eq!(march.real.saldo(), 480_000);
        assert_eq!(march.forecast_to_date.saldo(), 485_000);
    }

    #[test]
    fn test_over_budget_ranks_expenses_by_ratio() {
        let inputs = ForecastInputs {
            categories: vec![
                category("salary", FlowType::Receita, ProjectionStrategy::Recurring),
                category("food", FlowType::Despesa, ProjectionStrategy::Historical),
                category("fuel", FlowType::Despesa, ProjectionStrategy::Historical),
                category("gym", FlowType::Despesa, ProjectionStrategy::Recurring),
            ],
            recurring: vec![
                recurring("r1", "salary", FlowType::Receita, 500_000, 5),
                recurring("r2", "gym", FlowType::Despesa, 10_000, 12),
            ],
            historical: vec![
                txn("food", FlowType::Despesa, 31_000, date(2026, 2, 10)),
                txn("fuel", FlowType::Despesa, 62_000, date(2026, 2, 11)),
            ],
            current: vec![
                txn("salary", FlowType::Receita, 900_000, date(2026, 3, 5)),
                txn("food", FlowType::Despesa, 20_000, date(2026, 3, 8)),
                txn("fuel", FlowType::Despesa, 10_000, date(2026, 3, 9)),
                txn("gym", FlowType::Despesa, 15_000, date(2026, 3, 12)),
            ],
        };

        let result = engine(1, 0, true).build(date(2026, 3, 15), &inputs);
        let march = result.current_month().unwrap();
        let over = march.over_budget();

        let ids: Vec<&str> = over.iter().map(|o| o.category_id.as_str()).collect();
        assert_eq!(ids, vec!["gym", "food"]);
        assert!((over[0].over_percent() - 50.0).abs() < 1e-9);
        assert_eq!(over[1].expected_to_date, 15_000);
        assert_eq!(march.most_over_budget().unwrap().category_id, "gym");
    }

    #[test]
    fn test_nothing_over_budget_without_expectations() {
        let inputs = ForecastInputs {
            categories: vec![category("food", FlowType::Despesa, ProjectionStrategy::Historical)],
            current: vec![txn("food", FlowType::Despesa, 20_000, date(2026, 3, 8))],
            ..Default::default()
        };

        let result = engine(1, 0, true).build(date(2026, 3, 15), &inputs);
        assert!(result.current_month().unwrap().most_over_budget().is_none());
    }
}
