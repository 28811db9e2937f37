//! Investment positions rebuilt from contribution, withdrawal and statement entries.

use crate::calendar::CompetencyMonth;
use crate::indicators::monthly_real_return;
use crate::schema::{InvestmentEntry, InvestmentEntryKind};
use crate::utils::last_day_of_month;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Balance of one investment on `up_to`.
///
/// The latest statement (`Saldo`) on or before the date wins. Without one, the
/// balance is contributions minus withdrawals, never below zero.
pub fn investment_balance<'a>(
    entries: impl IntoIterator<Item = &'a InvestmentEntry>,
    up_to: NaiveDate,
) -> i64 {
    let known: Vec<&InvestmentEntry> = entries.into_iter().filter(|e| e.date <= up_to).collect();

    // Same-day statements: the first one recorded wins.
    let statement = known
        .iter()
        .copied()
        .filter(|e| e.kind == InvestmentEntryKind::Saldo)
        .fold(None::<&InvestmentEntry>, |latest, e| match latest {
            Some(l) if l.date >= e.date => Some(l),
            _ => Some(e),
        });
    if let Some(statement) = statement {
        return statement.amount_cents;
    }

    let net: i64 = known
        .iter()
        .map(|e| match e.kind {
            InvestmentEntryKind::Aporte => e.amount_cents,
            InvestmentEntryKind::Resgate => -e.amount_cents,
            InvestmentEntryKind::Saldo => 0,
        })
        .sum();
    net.max(0)
}

/// Sum of every investment's balance on `up_to`.
pub fn portfolio_balance(entries: &[InvestmentEntry], up_to: NaiveDate) -> i64 {
    let mut by_investment: BTreeMap<&str, Vec<&InvestmentEntry>> = BTreeMap::new();
    for entry in entries {
        by_investment
            .entry(entry.investment_id.as_str())
            .or_default()
            .push(entry);
    }
    by_investment
        .values()
        .map(|group| investment_balance(group.iter().copied(), up_to))
        .sum()
}

/// Portfolio balance on the last day of a calendar month.
pub fn month_end_balance(entries: &[InvestmentEntry], month: CompetencyMonth) -> i64 {
    portfolio_balance(entries, last_day_of_month(month.year(), month.month()))
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyReturn {
    pub balance: i64,
    pub previous_balance: i64,
    pub change: i64,
    /// None when the previous month closed at zero.
    pub nominal_percent: Option<f64>,
    /// Nominal return deflated by the yearly inflation, when it is known.
    pub real_percent: Option<f64>,
}

/// Month-over-month change of the portfolio, between calendar month ends.
pub fn monthly_return(
    entries: &[InvestmentEntry],
    month: CompetencyMonth,
    inflation_12m: Option<f64>,
) -> MonthlyReturn {
    let balance = month_end_balance(entries, month);
    let previous_balance = month_end_balance(entries, month.previous());

    let nominal_percent =
        (previous_balance > 0).then(|| (balance as f64 / previous_balance as f64 - 1.0) * 100.0);
    let real_percent = match (nominal_percent, inflation_12m) {
        (Some(nominal), Some(inflation)) if nominal != 0.0 => {
            monthly_real_return(nominal, inflation)
        }
        _ => None,
    };

    MonthlyReturn {
        balance,
        previous_balance,
        change: balance - previous_balance,
        nominal_percent,
        real_percent,
    }
}
