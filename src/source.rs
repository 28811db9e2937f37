//! Read-only access to the ledger records the engines compute from.
//!
//! The storage backend is owned by the surrounding application; the engines only
//! need the four record sets below and issue no writes.

use crate::calendar::CompetencyRange;
use crate::error::Result;
use crate::schema::{Account, Category, RecurringTransaction, Transaction};
use async_trait::async_trait;
use chrono::NaiveDate;

/// Inclusive filter on a transaction's date column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

impl From<CompetencyRange> for DateRange {
    fn from(range: CompetencyRange) -> Self {
        Self::new(range.start, range.end)
    }
}

#[async_trait]
pub trait LedgerSource: Send + Sync {
    async fn accounts(&self) -> Result<Vec<Account>>;

    async fn categories(&self) -> Result<Vec<Category>>;

    /// Transactions dated inside `range`, ordered by date ascending.
    async fn transactions(&self, range: DateRange) -> Result<Vec<Transaction>>;

    /// Recurring items; only those flagged active when `active_only` is set.
    async fn recurring(&self, active_only: bool) -> Result<Vec<RecurringTransaction>>;
}

/// A `LedgerSource` over owned snapshots of each record set.
#[derive(Debug, Clone, Default)]
pub struct InMemoryLedger {
    pub accounts: Vec<Account>,
    pub categories: Vec<Category>,
    pub transactions: Vec<Transaction>,
    pub recurring: Vec<RecurringTransaction>,
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_accounts(mut self, accounts: Vec<Account>) -> Self {
        self.accounts = accounts;
        self
    }

    pub fn with_categories(mut self, categories: Vec<Category>) -> Self {
        self.categories = categories;
        self
    }

    pub fn with_transactions(mut self, transactions: Vec<Transaction>) -> Self {
        self.transactions = transactions;
        self
    }

    pub fn with_recurring(mut self, recurring: Vec<RecurringTransaction>) -> Self {
        self.recurring = recurring;
        self
    }
}

#[async_trait]
impl LedgerSource for InMemoryLedger {
    async fn accounts(&self) -> Result<Vec<Account>> {
        Ok(self.accounts.clone())
    }

    async fn categories(&self) -> Result<Vec<Category>> {
        Ok(self.categories.clone())
    }

    async fn transactions(&self, range: DateRange) -> Result<Vec<Transaction>> {
        let mut rows: Vec<Transaction> = self
            .transactions
            .iter()
            .filter(|t| range.contains(t.date))
            .cloned()
            .collect();
        rows.sort_by_key(|t| t.date);
        Ok(rows)
    }

    async fn recurring(&self, active_only: bool) -> Result<Vec<RecurringTransaction>> {
        Ok(self
            .recurring
            .iter()
            .filter(|r| !active_only || r.is_active)
            .cloned()
            .collect())
    }
}
