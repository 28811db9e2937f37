//! Dashboard indicators derived from a month's totals and the account balances.
//!
//! Every ratio is `None` when its denominator is missing or zero, so callers can
//! tell "no data" apart from a real zero.

use crate::forecast::MonthForecast;
use crate::schema::{Account, FlowType, ProjectionStrategy, Transaction};
use crate::utils::round_cents;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct KpiInputs {
    pub total_income: i64,
    pub total_expense: i64,
    pub total_balance: i64,
    pub avg_monthly_expense: i64,
    /// None when no account is flagged as emergency reserve.
    pub reserve_balance: Option<i64>,
    pub reserve_target_months: u32,
    pub forecast_expense: Option<i64>,
    pub recurring_expense: Option<i64>,
}

impl KpiInputs {
    /// Realized totals of `month` against its forecast, plus balances from `accounts`.
    pub fn from_month(
        month: &MonthForecast,
        accounts: &[Account],
        avg_monthly_expense: i64,
        reserve_target_months: u32,
    ) -> Self {
        let recurring_expense: i64 = month
            .categories
            .iter()
            .filter(|c| c.flow == FlowType::Despesa && c.strategy == ProjectionStrategy::Recurring)
            .map(|c| c.forecast_full)
            .sum();

        Self {
            total_income: month.real.income,
            total_expense: month.real.expense,
            total_balance: accounts.iter().map(|a| a.balance_cents).sum(),
            avg_monthly_expense,
            reserve_balance: reserve_balance(accounts),
            reserve_target_months,
            forecast_expense: Some(month.forecast.expense),
            recurring_expense: Some(recurring_expense),
        }
    }
}

pub fn reserve_balance(accounts: &[Account]) -> Option<i64> {
    let mut reserve = accounts.iter().filter(|a| a.is_emergency_reserve).peekable();
    reserve.peek()?;
    Some(reserve.map(|a| a.balance_cents).sum())
}

/// Expense total spread evenly over `months`, whether or not each month had data.
pub fn average_monthly_expense(transactions: &[Transaction], months: u32) -> i64 {
    if months == 0 {
        return 0;
    }
    let total: i64 = transactions
        .iter()
        .filter(|t| t.flow == FlowType::Despesa)
        .map(|t| t.amount_cents)
        .sum();
    round_cents(total as f64 / months as f64)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KpiLevel {
    Good,
    Warning,
    Alert,
}

fn higher_is_better(value: Option<f64>, good: f64, warning: f64) -> Option<KpiLevel> {
    value.map(|v| {
        if v >= good {
            KpiLevel::Good
        } else if v >= warning {
            KpiLevel::Warning
        } else {
            KpiLevel::Alert
        }
    })
}

fn lower_is_better(value: Option<f64>, good: f64, warning: f64) -> Option<KpiLevel> {
    value.map(|v| {
        if v <= good {
            KpiLevel::Good
        } else if v <= warning {
            KpiLevel::Warning
        } else {
            KpiLevel::Alert
        }
    })
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct FinancialKpis {
    /// Percent of income left after expenses.
    pub savings_rate: Option<f64>,
    /// Months the total balance covers at the average expense.
    pub runway_months: Option<f64>,
    pub reserve_months: Option<f64>,
    /// Reserve months as a percent of the target.
    pub reserve_percent: Option<f64>,
    /// Absolute distance between realized and forecast expense, in percent of the forecast.
    pub budget_deviation: Option<f64>,
    /// Recurring expense as a percent of income.
    pub fixed_expense_share: Option<f64>,
}

impl FinancialKpis {
    pub fn compute(inputs: &KpiInputs) -> Self {
        let income = inputs.total_income as f64;
        let expense = inputs.total_expense as f64;
        let avg_expense = inputs.avg_monthly_expense as f64;

        let savings_rate =
            (inputs.total_income > 0).then(|| (income - expense) / income * 100.0);
        let runway_months = (inputs.avg_monthly_expense > 0)
            .then(|| inputs.total_balance as f64 / avg_expense);
        let reserve_months = inputs
            .reserve_balance
            .filter(|_| inputs.avg_monthly_expense > 0)
            .map(|reserve| reserve as f64 / avg_expense);
        let reserve_percent = reserve_months
            .filter(|_| inputs.reserve_target_months > 0)
            .map(|months| months / inputs.reserve_target_months as f64 * 100.0);
        let budget_deviation = inputs
            .forecast_expense
            .filter(|forecast| *forecast > 0)
            .map(|forecast| (expense - forecast as f64).abs() / forecast as f64 * 100.0);
        let fixed_expense_share = inputs
            .recurring_expense
            .filter(|_| inputs.total_income > 0)
            .map(|fixed| fixed as f64 / income * 100.0);

        Self {
            savings_rate,
            runway_months,
            reserve_months,
            reserve_percent,
            budget_deviation,
            fixed_expense_share,
        }
    }

    pub fn savings_level(&self) -> Option<KpiLevel> {
        higher_is_better(self.savings_rate, 20.0, 10.0)
    }

    pub fn runway_level(&self) -> Option<KpiLevel> {
        higher_is_better(self.runway_months, 6.0, 3.0)
    }

    pub fn reserve_level(&self) -> Option<KpiLevel> {
        higher_is_better(self.reserve_percent, 100.0, 50.0)
    }

    pub fn budget_level(&self) -> Option<KpiLevel> {
        lower_is_better(self.budget_deviation, 10.0, 25.0)
    }

    pub fn fixed_expense_level(&self) -> Option<KpiLevel> {
        lower_is_better(self.fixed_expense_share, 50.0, 70.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InsightSeverity {
    Alert,
    Warning,
    Positive,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "id", rename_all = "kebab-case")]
pub enum Insight {
    NegativeSavings { deficit: i64 },
    LowSavings { savings_rate: f64 },
    NoReserve,
    LowReserve { months: f64 },
    ShortRunway { months: f64 },
    CategoryOverBudget { category_name: String, over_percent: f64 },
    NoInvestments,
    GreatSavings { savings_rate: f64 },
}

impl Insight {
    pub fn severity(&self) -> InsightSeverity {
        match self {
            Insight::NegativeSavings { .. }
            | Insight::ShortRunway { .. }
            | Insight::CategoryOverBudget { .. } => InsightSeverity::Alert,
            Insight::LowSavings { .. }
            | Insight::NoReserve
            | Insight::LowReserve { .. }
            | Insight::NoInvestments => InsightSeverity::Warning,
            Insight::GreatSavings { .. } => InsightSeverity::Positive,
        }
    }
}

/// Observations worth surfacing, most pressing first.
pub fn insights(
    inputs: &KpiInputs,
    kpis: &FinancialKpis,
    month: Option<&MonthForecast>,
    has_investments: bool,
) -> Vec<Insight> {
    let mut found = Vec::new();

    if inputs.total_expense > inputs.total_income && inputs.total_income > 0 {
        found.push(Insight::NegativeSavings {
            deficit: inputs.total_expense - inputs.total_income,
        });
    }
    if let Some(rate) = kpis.savings_rate.filter(|r| (0.0..10.0).contains(r)) {
        found.push(Insight::LowSavings { savings_rate: rate });
    }
    match kpis.reserve_months {
        None => found.push(Insight::NoReserve),
        Some(months) if months < 3.0 => found.push(Insight::LowReserve { months }),
        Some(_) => {}
    }
    if let Some(months) = kpis.runway_months.filter(|m| *m < 3.0) {
        found.push(Insight::ShortRunway { months });
    }
    if let Some(worst) = month.and_then(MonthForecast::most_over_budget) {
        found.push(Insight::CategoryOverBudget {
            over_percent: worst.over_percent(),
            category_name: worst.category_name,
        });
    }
    if !has_investments {
        found.push(Insight::NoInvestments);
    }
    if let Some(rate) = kpis.savings_rate.filter(|r| *r >= 30.0) {
        found.push(Insight::GreatSavings { savings_rate: rate });
    }

    found
}

/// KPIs for the current competency month together with what they were computed from.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KpiReport {
    pub inputs: KpiInputs,
    pub kpis: FinancialKpis,
    pub month: Option<MonthForecast>,
}

impl KpiReport {
    pub fn new(inputs: KpiInputs, month: Option<MonthForecast>) -> Self {
        let kpis = FinancialKpis::compute(&inputs);
        Self {
            inputs,
            kpis,
            month,
        }
    }

    pub fn insights(&self, has_investments: bool) -> Vec<Insight> {
        insights(&self.inputs, &self.kpis, self.month.as_ref(), has_investments)
    }
}
