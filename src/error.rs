use thiserror::Error;

#[derive(Error, Debug)]
pub enum SalesAnalyticsError {
    #[error("Configuration error: a custom time frame requires a date")]
    MissingCustomDate,

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid filter: {0}")]
    InvalidFilter(String),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, SalesAnalyticsError>;
