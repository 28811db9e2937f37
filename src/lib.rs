//! # Competency Forecast
//!
//! Personal cash-flow planning over *competency months*: accounting periods that
//! start on a user-chosen closing day instead of the 1st of the calendar month.
//!
//! ## Core Concepts
//!
//! - **Competency Month**: A period labelled "YYYY-MM" running from the closing day of
//!   that month to the day before the closing day of the next one
//! - **Daily Flow**: Day-by-day balances for one period, real entries before today and
//!   planned recurring entries from today on
//! - **Forecast**: Per-category projections for the coming periods, either from the
//!   recurring schedule or from historical monthly averages
//! - **Recurrence Detection**: Suggestions for recurring items the user has not
//!   registered yet, mined from transaction history
//! - **KPIs**: Savings rate, runway, reserve coverage and budget deviation for the
//!   current period, with prioritized insights
//!
//! All amounts are integer cents. "Today" is always an explicit argument.
//!
//! ## Example
//!
//! ```rust,ignore
//! use competency_forecast::*;
//! use chrono::NaiveDate;
//!
//! let ledger = InMemoryLedger::new()
//!     .with_accounts(vec![Account {
//!         id: "acc-1".to_string(),
//!         name: "Conta Corrente".to_string(),
//!         kind: AccountKind::Banco,
//!         balance_cents: 1_000_000,
//!         is_emergency_reserve: false,
//!     }])
//!     .with_categories(categories)
//!     .with_transactions(transactions)
//!     .with_recurring(recurring);
//!
//! let settings = ForecastSettings {
//!     closing_day: ClosingDay::new(25)?,
//!     months_ahead: 6,
//!     ..Default::default()
//! };
//! let planner = Planner::new(ledger, settings)?;
//!
//! let today = NaiveDate::from_ymd_opt(2026, 3, 15).unwrap();
//! let month = planner.current_month(today);
//! let flow = planner.daily_flow(month, today).await?;
//! let forecast = planner.forecast(today).await?;
//! let suggestions = planner.suggest_recurrences(today).await?;
//! let report = planner.kpis(today).await?;
//! ```

pub mod calendar;
pub mod daily_flow;
pub mod error;
pub mod forecast;
pub mod indicators;
pub mod investments;
pub mod kpis;
pub mod recurrence;
pub mod rules;
pub mod schema;
pub mod source;
pub mod utils;

pub use calendar::{
    competency_day_count, competency_days, competency_label, competency_range,
    current_competency_month, elapsed_days, recurring_date_in_competency, ClosingDay,
    CompetencyDay, CompetencyMonth, CompetencyRange,
};
pub use daily_flow::{
    period_position, CategoryAmount, DailyFlow, DailyFlowCalculator, DailyFlowInputs, DayColumn,
    EntrySource, FlowCategory, PeriodPosition,
};
pub use error::{ForecastError, Result};
pub use forecast::{
    lookback_range, CategoryForecast, CategoryVariance, FlowTotals, ForecastEngine,
    ForecastInputs, ForecastResult, HistoricalAverages, MonthForecast, OverBudget,
};
pub use indicators::{
    accumulate_monthly_rates, monthly_real_return, parse_series, real_return, TtlCache,
};
pub use investments::{
    investment_balance, month_end_balance, monthly_return, portfolio_balance, MonthlyReturn,
};
pub use kpis::{
    average_monthly_expense, insights, reserve_balance, FinancialKpis, Insight, InsightSeverity,
    KpiInputs, KpiLevel, KpiReport,
};
pub use recurrence::{
    detect_recurrences, normalize_description, DetectionOptions, RecurrenceDetector,
    RecurrenceSuggestion,
};
pub use rules::CategoryRules;
pub use schema::*;
pub use source::{DateRange, InMemoryLedger, LedgerSource};
pub use utils::*;

use chrono::NaiveDate;
use log::info;

/// Entry point tying a ledger source to one set of forecast settings.
pub struct Planner<S> {
    source: S,
    settings: ForecastSettings,
}

impl<S: LedgerSource> Planner<S> {
    pub fn new(source: S, settings: ForecastSettings) -> Result<Self> {
        settings.validate()?;
        info!(
            "Planner ready (closing day {}, {} months ahead)",
            settings.closing_day.get(),
            settings.months_ahead
        );
        Ok(Self { source, settings })
    }

    pub fn settings(&self) -> &ForecastSettings {
        &self.settings
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn current_month(&self, today: NaiveDate) -> CompetencyMonth {
        current_competency_month(self.settings.closing_day, today)
    }

    pub async fn daily_flow(&self, month: CompetencyMonth, today: NaiveDate) -> Result<DailyFlow> {
        DailyFlowCalculator::new(self.settings.closing_day)
            .calculate(&self.source, month, today)
            .await
    }

    pub async fn forecast(&self, today: NaiveDate) -> Result<ForecastResult> {
        ForecastEngine::new(self.settings.clone())
            .calculate(&self.source, today)
            .await
    }

    pub async fn suggest_recurrences(&self, today: NaiveDate) -> Result<Vec<RecurrenceSuggestion>> {
        RecurrenceDetector::new(self.settings.clone())
            .suggest(&self.source, today)
            .await
    }

    /// Indicators for the current competency month, averaging expenses over the lookback window.
    pub async fn kpis(&self, today: NaiveDate) -> Result<KpiReport> {
        let closing_day = self.settings.closing_day;
        let lookback = lookback_range(
            self.current_month(today),
            closing_day,
            self.settings.lookback_months,
        );
        let engine = ForecastEngine::new(ForecastSettings {
            months_ahead: 0,
            include_current_month: true,
            ..self.settings.clone()
        });

        let (forecast, accounts, history) = futures::try_join!(
            engine.calculate(&self.source, today),
            self.source.accounts(),
            self.source.transactions(lookback),
        )?;

        let avg_expense = average_monthly_expense(&history, self.settings.lookback_months);
        let month = forecast.current_month().cloned();
        let inputs = match &month {
            Some(month) => KpiInputs::from_month(
                month,
                &accounts,
                avg_expense,
                self.settings.reserve_target_months,
            ),
            None => KpiInputs::default(),
        };
        Ok(KpiReport::new(inputs, month))
    }
}
