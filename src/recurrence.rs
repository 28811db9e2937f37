//! Suggests recurring items the user has not modelled yet, from transaction history.

use crate::calendar::{current_competency_month, CompetencyMonth};
use crate::error::Result;
use crate::forecast::lookback_range;
use crate::schema::{FlowType, ForecastSettings, RecurringTransaction, Transaction};
use crate::source::{DateRange, LedgerSource};
use crate::utils::round_cents;
use chrono::{Datelike, NaiveDate};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap, HashSet};
use unicode_normalization::UnicodeNormalization;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecurrenceSuggestion {
    /// Description as first seen, before normalization.
    pub description: String,
    pub avg_amount_cents: i64,
    pub flow: FlowType,
    pub occurrences: usize,
    pub estimated_day: u32,
}

/// Lowercases, strips combining accents and collapses whitespace.
pub fn normalize_description(description: &str) -> String {
    let folded: String = description
        .to_lowercase()
        .nfd()
        .filter(|c| !('\u{0300}'..='\u{036f}').contains(c))
        .collect();
    folded.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DetectionOptions {
    /// Maximum relative deviation of any entry from the group mean.
    pub tolerance: f64,
    pub limit: usize,
}

impl Default for DetectionOptions {
    fn default() -> Self {
        Self {
            tolerance: 0.10,
            limit: 5,
        }
    }
}

impl From<&ForecastSettings> for DetectionOptions {
    fn from(settings: &ForecastSettings) -> Self {
        Self {
            tolerance: settings.amount_tolerance,
            limit: settings.suggestion_limit,
        }
    }
}

struct Group<'a> {
    key: String,
    original: &'a str,
    flow: FlowType,
    entries: Vec<(i64, NaiveDate)>,
}

pub fn detect_recurrences(
    transactions: &[Transaction],
    existing: &[RecurringTransaction],
    options: &DetectionOptions,
) -> Vec<RecurrenceSuggestion> {
    let mut groups: Vec<Group> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for txn in transactions {
        let key = normalize_description(&txn.description);
        let slot = *index.entry(key.clone()).or_insert_with(|| {
            groups.push(Group {
                key,
                original: &txn.description,
                flow: txn.flow,
                entries: Vec::new(),
            });
            groups.len() - 1
        });
        groups[slot].entries.push((txn.amount_cents, txn.date));
    }

    let known: HashSet<String> = existing
        .iter()
        .map(|r| normalize_description(&r.description))
        .collect();

    let mut suggestions: Vec<RecurrenceSuggestion> = groups
        .iter()
        .filter(|g| !known.contains(&g.key))
        .filter_map(|g| evaluate(g, options))
        .collect();

    debug!(
        "{} description groups, {} recurrence candidates",
        groups.len(),
        suggestions.len()
    );

    suggestions.sort_by(|a, b| b.occurrences.cmp(&a.occurrences));
    suggestions.truncate(options.limit);
    suggestions
}

fn evaluate(group: &Group, options: &DetectionOptions) -> Option<RecurrenceSuggestion> {
    let months: BTreeSet<CompetencyMonth> = group
        .entries
        .iter()
        .map(|(_, date)| CompetencyMonth::of_date(*date))
        .collect();
    if months.len() < 2 {
        return None;
    }

    let total: i64 = group.entries.iter().map(|(amount, _)| amount).sum();
    let average = total as f64 / group.entries.len() as f64;
    if average <= 0.0 {
        return None;
    }

    let consistent = group
        .entries
        .iter()
        .all(|(amount, _)| (*amount as f64 - average).abs() / average <= options.tolerance);
    if !consistent {
        return None;
    }

    Some(RecurrenceSuggestion {
        description: group.original.to_string(),
        avg_amount_cents: round_cents(average),
        flow: group.flow,
        occurrences: group.entries.len(),
        estimated_day: most_frequent_day(&group.entries),
    })
}

/// Mode of the day-of-month; ties go to the day seen first.
fn most_frequent_day(entries: &[(i64, NaiveDate)]) -> u32 {
    let mut counts: Vec<(u32, usize)> = Vec::new();
    for (_, date) in entries {
        match counts.iter_mut().find(|(day, _)| *day == date.day()) {
            Some((_, count)) => *count += 1,
            None => counts.push((date.day(), 1)),
        }
    }

    let mut best = (1, 0);
    for (day, count) in counts {
        if count > best.1 {
            best = (day, count);
        }
    }
    best.0
}

pub struct RecurrenceDetector {
    settings: ForecastSettings,
}

impl RecurrenceDetector {
    pub fn new(settings: ForecastSettings) -> Self {
        Self { settings }
    }

    /// Scans the lookback window plus the current period to date.
    pub async fn suggest<S>(&self, source: &S, today: NaiveDate) -> Result<Vec<RecurrenceSuggestion>>
    where
        S: LedgerSource + ?Sized,
    {
        self.settings.validate()?;

        let closing_day = self.settings.closing_day;
        let current = current_competency_month(closing_day, today);
        let window = DateRange::new(
            lookback_range(current, closing_day, self.settings.lookback_months).start,
            today,
        );

        info!(
            "Detecting recurrences between {} and {}",
            window.start, window.end
        );

        let (transactions, existing) =
            futures::try_join!(source.transactions(window), source.recurring(false))?;

        Ok(detect_recurrences(
            &transactions,
            &existing,
            &DetectionOptions::from(&self.settings),
        ))
    }
}
