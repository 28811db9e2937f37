use crate::calendar::ClosingDay;
use crate::error::{ForecastError, Result};
use chrono::NaiveDate;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum FlowType {
    #[schemars(description = "Income: money entering the accounts")]
    Receita,

    #[schemars(description = "Expense: money leaving the accounts")]
    Despesa,
}

impl FlowType {
    /// +1 for income, -1 for expense.
    pub fn sign(self) -> i64 {
        match self {
            FlowType::Receita => 1,
            FlowType::Despesa => -1,
        }
    }

    pub fn signed(self, amount_cents: i64) -> i64 {
        self.sign() * amount_cents
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum ProjectionStrategy {
    #[default]
    #[schemars(
        description = "Projected from the active recurring items scheduled for the category. Use for fixed entries like salary, rent or subscriptions."
    )]
    Recurring,

    #[schemars(
        description = "Projected from the category's average over the trailing lookback window. Use for variable spending like groceries or fuel."
    )]
    Historical,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum AccountKind {
    Banco,
    Cartao,
    Carteira,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct Account {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: AccountKind,
    #[schemars(description = "Current balance in cents. Can be negative for credit cards.")]
    pub balance_cents: i64,
    #[serde(default)]
    #[schemars(description = "Whether the balance counts towards the emergency reserve")]
    pub is_emergency_reserve: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
pub struct Category {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub flow: FlowType,
    #[serde(rename = "projection_type", default)]
    #[schemars(description = "Fixed per category; selects the algorithm that forecasts it")]
    pub strategy: ProjectionStrategy,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
pub struct Transaction {
    pub id: String,
    pub account_id: String,
    pub category_id: String,
    #[serde(rename = "type")]
    pub flow: FlowType,
    #[schemars(description = "Unsigned magnitude in cents; direction comes from `type`")]
    pub amount_cents: i64,
    #[serde(default)]
    pub description: String,
    #[schemars(description = "Calendar date in YYYY-MM-DD format")]
    pub date: NaiveDate,
}

impl Transaction {
    pub fn signed_amount(&self) -> i64 {
        self.flow.signed(self.amount_cents)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
pub struct RecurringTransaction {
    pub id: String,
    pub account_id: String,
    pub category_id: String,
    #[serde(rename = "type")]
    pub flow: FlowType,
    pub amount_cents: i64,
    #[serde(default)]
    pub description: String,
    #[schemars(
        description = "Day of month (1-31) the entry is due. Days that do not exist in a given month are skipped for that month, never clamped."
    )]
    pub day_of_month: u32,
    pub is_active: bool,
    #[serde(default)]
    #[schemars(description = "First competency month (YYYY-MM) the entry applies to, inclusive")]
    pub start_month: Option<String>,
    #[serde(default)]
    #[schemars(description = "Last competency month (YYYY-MM) the entry applies to, inclusive")]
    pub end_month: Option<String>,
}

impl RecurringTransaction {
    /// A one-off ("pontual") entry scheduled through the recurring mechanism.
    pub fn is_pontual(&self) -> bool {
        matches!((&self.start_month, &self.end_month), (Some(start), Some(end)) if start == end)
    }

    /// Whether the `start_month`/`end_month` bounds include the competency `label`.
    ///
    /// Labels are zero-padded "YYYY-MM", so lexical order is chronological order.
    pub fn applies_to(&self, label: &str) -> bool {
        if let Some(start) = self.start_month.as_deref() {
            if label < start {
                return false;
            }
        }
        if let Some(end) = self.end_month.as_deref() {
            if label > end {
                return false;
            }
        }
        true
    }

    pub fn signed_amount(&self) -> i64 {
        self.flow.signed(self.amount_cents)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum InvestmentEntryKind {
    #[schemars(description = "Contribution into the investment")]
    Aporte,
    #[schemars(description = "Withdrawal from the investment")]
    Resgate,
    #[schemars(description = "Statement balance; supersedes contributions and withdrawals up to its date")]
    Saldo,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
pub struct InvestmentEntry {
    pub id: String,
    pub investment_id: String,
    #[serde(rename = "type")]
    pub kind: InvestmentEntryKind,
    pub amount_cents: i64,
    pub date: NaiveDate,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, JsonSchema)]
pub struct CategoryRule {
    #[schemars(description = "Substring matched against statement descriptions, ignoring case and accents")]
    pub pattern: String,
    pub category_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct ForecastSettings {
    #[schemars(
        with = "u32",
        description = "Day of month (1-28) on which a competency period begins. 1 means calendar months."
    )]
    pub closing_day: ClosingDay,

    #[schemars(description = "Number of competency months to project after the current one")]
    pub months_ahead: u32,

    #[schemars(description = "Whether the current competency month is part of the projection window")]
    pub include_current_month: bool,

    #[schemars(
        description = "Competency months before the current one used for historical averages and recurrence detection"
    )]
    pub lookback_months: u32,

    #[schemars(description = "Maximum number of recurrence suggestions returned")]
    pub suggestion_limit: usize,

    #[schemars(
        description = "Maximum relative deviation from the group mean for entries to count as the same recurring charge (0.10 = 10%)"
    )]
    pub amount_tolerance: f64,

    #[schemars(description = "Months of average expense the emergency reserve should cover")]
    pub reserve_target_months: u32,
}

impl Default for ForecastSettings {
    fn default() -> Self {
        Self {
            closing_day: ClosingDay::CALENDAR,
            months_ahead: 3,
            include_current_month: false,
            lookback_months: 3,
            suggestion_limit: 5,
            amount_tolerance: 0.10,
            reserve_target_months: 6,
        }
    }
}

impl ForecastSettings {
    pub fn validate(&self) -> Result<()> {
        if self.lookback_months == 0 {
            return Err(ForecastError::InvalidSettings(
                "lookback_months must be at least 1".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.amount_tolerance) {
            return Err(ForecastError::InvalidSettings(format!(
                "amount_tolerance {} must be between 0.0 and 1.0",
                self.amount_tolerance
            )));
        }
        Ok(())
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let settings: Self = serde_json::from_str(json)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn generate_json_schema() -> schemars::schema::RootSchema {
        schemars::schema_for!(ForecastSettings)
    }

    pub fn schema_as_json() -> std::result::Result<String, serde_json::Error> {
        let schema = Self::generate_json_schema();
        serde_json::to_string_pretty(&schema)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn recurring(start: Option<&str>, end: Option<&str>) -> RecurringTransaction {
        RecurringTransaction {
            id: "r1".to_string(),
            account_id: "acc".to_string(),
            category_id: "rent".to_string(),
            flow: FlowType::Despesa,
            amount_cents: 150_000,
            description: "Aluguel".to_string(),
            day_of_month: 5,
            is_active: true,
            start_month: start.map(str::to_string),
            end_month: end.map(str::to_string),
        }
    }

    #[test]
    fn test_recurring_bounds() {
        let open = recurring(None, None);
        assert!(open.applies_to("1999-01"));
        assert!(!open.is_pontual());

        let bounded = recurring(Some("2026-02"), Some("2026-05"));
        assert!(!bounded.applies_to("2026-01"));
        assert!(bounded.applies_to("2026-02"));
        assert!(bounded.applies_to("2026-05"));
        assert!(!bounded.applies_to("2026-06"));

        let one_off = recurring(Some("2026-03"), Some("2026-03"));
        assert!(one_off.is_pontual());
        assert!(one_off.applies_to("2026-03"));
        assert!(!one_off.applies_to("2026-04"));

        assert!(!recurring(Some("2026-03"), None).is_pontual());
    }

    #[test]
    fn test_signed_amounts() {
        assert_eq!(FlowType::Receita.signed(500), 500);
        assert_eq!(FlowType::Despesa.signed(500), -500);
        assert_eq!(recurring(None, None).signed_amount(), -150_000);
    }

    #[test]
    fn test_record_wire_names() {
        let json = r#"{
            "id": "c1",
            "name": "Mercado",
            "type": "despesa",
            "projection_type": "historical"
        }"#;
        let category: Category = serde_json::from_str(json).unwrap();
        assert_eq!(category.flow, FlowType::Despesa);
        assert_eq!(category.strategy, ProjectionStrategy::Historical);

        let json = r#"{
            "id": "t1",
            "account_id": "a1",
            "category_id": "c1",
            "type": "receita",
            "amount_cents": 1500,
            "date": "2026-03-15"
        }"#;
        let txn: Transaction = serde_json::from_str(json).unwrap();
        assert_eq!(txn.signed_amount(), 1500);
        assert_eq!(txn.description, "");
    }

    #[test]
    fn test_settings_defaults_and_validation() {
        let settings = ForecastSettings::from_json(r#"{"closing_day": 10}"#).unwrap();
        assert_eq!(settings.closing_day.get(), 10);
        assert_eq!(settings.months_ahead, 3);
        assert!(!settings.include_current_month);
        assert_eq!(settings.lookback_months, 3);

        assert!(ForecastSettings::from_json(r#"{"closing_day": 31}"#).is_err());
        assert!(ForecastSettings::from_json(r#"{"lookback_months": 0}"#).is_err());
        assert!(ForecastSettings::from_json(r#"{"amount_tolerance": 1.5}"#).is_err());
    }

    #[test]
    fn test_schema_generation() {
        let schema_json = ForecastSettings::schema_as_json().unwrap();
        assert!(schema_json.contains("closing_day"));
        assert!(schema_json.contains("months_ahead"));
        assert!(schema_json.contains("lookback_months"));
    }
}
