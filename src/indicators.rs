//! Inflation indicator used to express investment returns in real terms.
//!
//! The monthly IPCA series is published by the Brazilian central bank; twelve
//! monthly rates are compounded into a yearly figure and cached for a while.

use crate::error::{ForecastError, Result};
use log::debug;
use serde::Deserialize;
use std::future::Future;
use std::time::{Duration, Instant};

#[cfg(feature = "bcb")]
pub const IPCA_12_MONTHS_URL: &str =
    "https://api.bcb.gov.br/dados/serie/bcdata.sgs.13522/dados/ultimos/12?formato=json";

/// Single-value cache that expires `ttl` after the last successful insert.
#[derive(Debug, Clone)]
pub struct TtlCache<T> {
    ttl: Duration,
    entry: Option<(Instant, T)>,
}

impl<T: Clone> TtlCache<T> {
    pub fn new(ttl: Duration) -> Self {
        Self { ttl, entry: None }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn get(&self, now: Instant) -> Option<T> {
        match &self.entry {
            Some((stored_at, value)) if now.saturating_duration_since(*stored_at) < self.ttl => {
                Some(value.clone())
            }
            _ => None,
        }
    }

    pub fn insert(&mut self, now: Instant, value: T) {
        self.entry = Some((now, value));
    }

    pub fn invalidate(&mut self) {
        self.entry = None;
    }

    /// Returns the cached value, or runs `fetch` and caches its result.
    /// A failed fetch leaves the cache untouched so the next call retries.
    pub async fn get_or_try_insert_with<F, Fut>(&mut self, now: Instant, fetch: F) -> Result<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        if let Some(value) = self.get(now) {
            return Ok(value);
        }
        debug!("Indicator cache miss, fetching");
        let value = fetch().await?;
        self.insert(now, value.clone());
        Ok(value)
    }
}

#[derive(Debug, Clone, Deserialize)]
struct SeriesPoint {
    #[allow(dead_code)]
    data: Option<String>,
    valor: String,
}

/// Monthly percentages from a central-bank series payload, oldest first.
pub fn parse_series(json: &str) -> Result<Vec<f64>> {
    let points: Vec<SeriesPoint> = serde_json::from_str(json)?;
    points
        .iter()
        .map(|p| {
            p.valor.trim().replace(',', ".").parse::<f64>().map_err(|_| {
                ForecastError::IndicatorError(format!("Non-numeric series value '{}'", p.valor))
            })
        })
        .collect()
}

/// Compounds monthly percentage rates into a single percentage.
pub fn accumulate_monthly_rates(monthly: &[f64]) -> f64 {
    let factor = monthly
        .iter()
        .fold(1.0, |acc, rate| acc * (1.0 + rate / 100.0));
    (factor - 1.0) * 100.0
}

/// Nominal return deflated by inflation, both in percent.
pub fn real_return(nominal: f64, inflation: f64) -> f64 {
    ((1.0 + nominal / 100.0) / (1.0 + inflation / 100.0) - 1.0) * 100.0
}

/// One month's nominal return deflated by a twelfth of the yearly inflation.
pub fn monthly_real_return(nominal_monthly: f64, inflation_12m: f64) -> Option<f64> {
    let monthly_inflation = inflation_12m / 12.0;
    if 1.0 + monthly_inflation / 100.0 <= 0.0 {
        return None;
    }
    Some(real_return(nominal_monthly, monthly_inflation))
}

#[cfg(feature = "bcb")]
pub async fn fetch_ipca_12_months(client: &reqwest::Client) -> Result<f64> {
    let res = client.get(IPCA_12_MONTHS_URL).send().await?;
    let status = res.status();
    if !status.is_success() {
        let body = res.text().await?;
        return Err(ForecastError::IndicatorError(format!(
            "IPCA request failed (status {}): {}",
            status, body
        )));
    }

    let body = res.text().await?;
    let monthly = parse_series(&body)?;
    if monthly.is_empty() {
        return Err(ForecastError::IndicatorError(
            "IPCA series came back empty".to_string(),
        ));
    }

    let accumulated = accumulate_monthly_rates(&monthly);
    debug!("IPCA over {} months: {:.4}%", monthly.len(), accumulated);
    Ok(accumulated)
}

/// Fetches the yearly IPCA through `cache`, hitting the network at most once per TTL.
#[cfg(feature = "bcb")]
pub async fn cached_ipca_12_months(
    cache: &mut TtlCache<f64>,
    client: &reqwest::Client,
    now: Instant,
) -> Result<f64> {
    cache
        .get_or_try_insert_with(now, || fetch_ipca_12_months(client))
        .await
}
