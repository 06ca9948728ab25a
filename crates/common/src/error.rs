use thiserror::Error;

use crate::{DateTimeInterval, Pair};

#[derive(Debug, Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("No candles for market '{market}', pair {pair} in interval {interval}")]
    NoCandles {
        market: String,
        pair: Pair,
        interval: DateTimeInterval,
    },

    #[error("Insufficient balance of {currency}")]
    InsufficientBalance { currency: String },

    #[error("Market error: {0}")]
    Market(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Whether a tick that failed with this error may be skipped while the
    /// run carries on. Anything else terminates the run.
    pub fn is_tick_recoverable(&self) -> bool {
        matches!(
            self,
            Error::NoCandles { .. } | Error::InsufficientBalance { .. } | Error::Market(_)
        )
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
