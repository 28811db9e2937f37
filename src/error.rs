use thiserror::Error;

#[derive(Error, Debug)]
pub enum ForecastError {
    #[error("Invalid closing day {0}: must be between 1 and 28")]
    InvalidClosingDay(u32),

    #[error("Invalid month {0}: must be between 1 and 12")]
    InvalidMonth(u32),

    #[error("Invalid competency label '{0}': expected YYYY-MM")]
    InvalidMonthLabel(String),

    #[error("Invalid settings: {0}")]
    InvalidSettings(String),

    #[error("Ledger source failed: {0}")]
    Source(String),

    #[error("Indicator payload error: {0}")]
    IndicatorError(String),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[cfg(feature = "bcb")]
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

pub type Result<T> = std::result::Result<T, ForecastError>;
