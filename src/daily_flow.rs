//! Day-by-day ledger for one competency period.
//!
//! Days before the reference date carry realized transactions; the reference
//! date and every later day carry the recurring items planned for them. The
//! running balance is reconstructed from the accounts' present total.

use crate::calendar::{
    competency_days, competency_range, current_competency_month, recurring_date_in_competency,
    ClosingDay, CompetencyMonth,
};
use crate::error::Result;
use crate::recurrence::normalize_description;
use crate::schema::{Category, FlowType, RecurringTransaction, Transaction};
use crate::source::{DateRange, LedgerSource};
use chrono::{NaiveDate, Weekday};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PeriodPosition {
    Past,
    Current,
    Future,
}

pub fn period_position(
    month: CompetencyMonth,
    closing_day: ClosingDay,
    today: NaiveDate,
) -> PeriodPosition {
    let current = current_competency_month(closing_day, today);
    match month.cmp(&current) {
        std::cmp::Ordering::Less => PeriodPosition::Past,
        std::cmp::Ordering::Equal => PeriodPosition::Current,
        std::cmp::Ordering::Greater => PeriodPosition::Future,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntrySource {
    Real,
    Planned,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryAmount {
    /// Unsigned magnitude; the category's flow gives the direction.
    pub amount: i64,
    pub source: EntrySource,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DayColumn {
    pub date: NaiveDate,
    pub day_of_month: u32,
    pub weekday: Weekday,
    pub is_weekend: bool,
    pub is_today: bool,
    pub is_past: bool,
    pub opening_balance: i64,
    pub closing_balance: i64,
    pub by_category: BTreeMap<String, CategoryAmount>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlowCategory {
    pub id: String,
    pub name: String,
    pub flow: FlowType,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DailyFlow {
    pub month: CompetencyMonth,
    pub position: PeriodPosition,
    /// Balance at the start of the period's first day.
    pub opening_balance: i64,
    pub days: Vec<DayColumn>,
    pub income_categories: Vec<FlowCategory>,
    pub expense_categories: Vec<FlowCategory>,
    pub total_inflows: Vec<i64>,
    pub total_outflows: Vec<i64>,
}

impl DailyFlow {
    pub fn closing_balance(&self) -> i64 {
        self.days
            .last()
            .map(|d| d.closing_balance)
            .unwrap_or(self.opening_balance)
    }

    pub fn net_flow(&self) -> i64 {
        self.total_inflows.iter().sum::<i64>() - self.total_outflows.iter().sum::<i64>()
    }

    pub fn is_empty(&self) -> bool {
        self.income_categories.is_empty() && self.expense_categories.is_empty()
    }
}

/// Everything one daily-flow computation reads from the ledger.
#[derive(Debug, Clone, Default)]
pub struct DailyFlowInputs {
    /// Sum of all account balances right now.
    pub total_balance: i64,
    /// Transactions dated inside the requested period.
    pub period_transactions: Vec<Transaction>,
    pub recurring: Vec<RecurringTransaction>,
    pub categories: Vec<Category>,
    /// Transactions from the period start through the reference date.
    /// Only read when the requested period is in the past.
    pub since_start_transactions: Vec<Transaction>,
}

pub struct DailyFlowCalculator {
    closing_day: ClosingDay,
}

impl DailyFlowCalculator {
    pub fn new(closing_day: ClosingDay) -> Self {
        Self { closing_day }
    }

    pub async fn calculate<S>(
        &self,
        source: &S,
        month: CompetencyMonth,
        today: NaiveDate,
    ) -> Result<DailyFlow>
    where
        S: LedgerSource + ?Sized,
    {
        let range = competency_range(month, self.closing_day);
        let position = period_position(month, self.closing_day, today);

        info!(
            "Calculating daily flow for {} ({:?}, {} to {})",
            month, position, range.start, range.end
        );

        let since_start = DateRange::new(range.start, today);
        let (accounts, period_transactions, recurring, categories, since_start_transactions) =
            futures::try_join!(
                source.accounts(),
                source.transactions(range.into()),
                source.recurring(true),
                source.categories(),
                async {
                    if position == PeriodPosition::Past {
                        source.transactions(since_start).await
                    } else {
                        Ok(Vec::new())
                    }
                },
            )?;

        debug!(
            "Fetched {} accounts, {} period transactions, {} recurring items, {} categories",
            accounts.len(),
            period_transactions.len(),
            recurring.len(),
            categories.len()
        );

        let inputs = DailyFlowInputs {
            total_balance: accounts.iter().map(|a| a.balance_cents).sum(),
            period_transactions,
            recurring,
            categories,
            since_start_transactions,
        };

        Ok(self.build(month, today, &inputs))
    }

    /// Pure part of the computation over already-fetched records.
    pub fn build(
        &self,
        month: CompetencyMonth,
        today: NaiveDate,
        inputs: &DailyFlowInputs,
    ) -> DailyFlow {
        let position = period_position(month, self.closing_day, today);
        let opening_balance = self.opening_balance(month, today, position, inputs);
        let label = month.label();

        let mut real_by_date: HashMap<NaiveDate, BTreeMap<&str, i64>> = HashMap::new();
        for txn in &inputs.period_transactions {
            *real_by_date
                .entry(txn.date)
                .or_default()
                .entry(txn.category_id.as_str())
                .or_insert(0) += txn.signed_amount();
        }

        let mut planned_by_date: HashMap<NaiveDate, BTreeMap<&str, i64>> = HashMap::new();
        for item in active_in(&inputs.recurring, &label) {
            if let Some(date) =
                recurring_date_in_competency(item.day_of_month, month, self.closing_day)
            {
                *planned_by_date
                    .entry(date)
                    .or_default()
                    .entry(item.category_id.as_str())
                    .or_insert(0) += item.signed_amount();
            }
        }

        let calendar = competency_days(month, self.closing_day, today);
        let mut days = Vec::with_capacity(calendar.len());
        let mut total_inflows = Vec::with_capacity(calendar.len());
        let mut total_outflows = Vec::with_capacity(calendar.len());
        let mut categories_with_data: BTreeSet<&str> = BTreeSet::new();
        let mut running = opening_balance;

        for day in calendar {
            let (movements, source) = if day.is_past {
                (real_by_date.get(&day.date), EntrySource::Real)
            } else {
                (planned_by_date.get(&day.date), EntrySource::Planned)
            };

            let mut by_category = BTreeMap::new();
            let mut inflow = 0;
            let mut outflow = 0;

            for (&category_id, &signed) in movements.into_iter().flatten() {
                if signed == 0 {
                    continue;
                }
                if signed > 0 {
                    inflow += signed;
                } else {
                    outflow -= signed;
                }
                categories_with_data.insert(category_id);
                by_category.insert(
                    category_id.to_string(),
                    CategoryAmount {
                        amount: signed.abs(),
                        source,
                    },
                );
            }

            let opening = running;
            running += inflow - outflow;

            days.push(DayColumn {
                date: day.date,
                day_of_month: day.day_of_month,
                weekday: day.weekday,
                is_weekend: day.is_weekend,
                is_today: day.is_today,
                is_past: day.is_past,
                opening_balance: opening,
                closing_balance: running,
                by_category,
            });
            total_inflows.push(inflow);
            total_outflows.push(outflow);
        }

        let (income_categories, expense_categories) =
            split_categories(&inputs.categories, &categories_with_data);

        debug!(
            "Daily flow for {}: opening {}, closing {}, {} income / {} expense categories",
            month,
            opening_balance,
            running,
            income_categories.len(),
            expense_categories.len()
        );

        DailyFlow {
            month,
            position,
            opening_balance,
            days,
            income_categories,
            expense_categories,
            total_inflows,
            total_outflows,
        }
    }

    fn opening_balance(
        &self,
        month: CompetencyMonth,
        today: NaiveDate,
        position: PeriodPosition,
        inputs: &DailyFlowInputs,
    ) -> i64 {
        match position {
            // Reverse out what already happened in this period.
            PeriodPosition::Current => {
                inputs.total_balance - net(inputs.period_transactions.iter())
            }
            PeriodPosition::Past => {
                inputs.total_balance - net(inputs.since_start_transactions.iter())
            }
            PeriodPosition::Future => {
                let current = current_competency_month(self.closing_day, today);
                let current_end = competency_range(current, self.closing_day).end;

                let rest_of_current: i64 = self
                    .scheduled(&inputs.recurring, current)
                    .filter(|(date, _)| today <= *date && *date <= current_end)
                    .map(|(_, item)| item.signed_amount())
                    .sum();

                let between: i64 = (1..current.months_until(month))
                    .map(|offset| {
                        self.scheduled(&inputs.recurring, current.offset(offset))
                            .map(|(_, item)| item.signed_amount())
                            .sum::<i64>()
                    })
                    .sum();

                inputs.total_balance + rest_of_current + between
            }
        }
    }

    /// Active recurring items applicable to `month`, with the date they fall on.
    fn scheduled<'a>(
        &self,
        recurring: &'a [RecurringTransaction],
        month: CompetencyMonth,
    ) -> impl Iterator<Item = (NaiveDate, &'a RecurringTransaction)> + 'a {
        let label = month.label();
        let closing_day = self.closing_day;
        recurring
            .iter()
            .filter(move |r| r.is_active && r.applies_to(&label))
            .filter_map(move |r| {
                recurring_date_in_competency(r.day_of_month, month, closing_day).map(|d| (d, r))
            })
    }
}

fn active_in<'a>(
    recurring: &'a [RecurringTransaction],
    label: &'a str,
) -> impl Iterator<Item = &'a RecurringTransaction> + 'a {
    recurring
        .iter()
        .filter(move |r| r.is_active && r.applies_to(label))
}

fn net<'a>(transactions: impl Iterator<Item = &'a Transaction>) -> i64 {
    transactions.map(Transaction::signed_amount).sum()
}

fn split_categories(
    categories: &[Category],
    with_data: &BTreeSet<&str>,
) -> (Vec<FlowCategory>, Vec<FlowCategory>) {
    let mut income = Vec::new();
    let mut expense = Vec::new();

    for category in categories
        .iter()
        .filter(|c| with_data.contains(c.id.as_str()))
    {
        let entry = FlowCategory {
            id: category.id.clone(),
            name: category.name.clone(),
            flow: category.flow,
        };
        match category.flow {
            FlowType::Receita => income.push(entry),
            FlowType::Despesa => expense.push(entry),
        }
    }

    // Alphabetical ignoring case and accents, so "Água" sits next to "Aluguel".
    let by_name = |c: &FlowCategory| {
        (normalize_description(&c.name), c.name.clone(), c.id.clone())
    };
    income.sort_by_cached_key(by_name);
    expense.sort_by_cached_key(by_name);
    (income, expense)
}
