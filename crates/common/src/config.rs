use crate::{Error, Result};

/// Process configuration loaded from environment variables at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// TOML file describing the strategy run to replay.
    pub strategy_run_path: String,
    /// JSON array of candles loaded into the in-memory candle storage.
    pub candles_path: String,
    /// Where to write the resulting order history, if anywhere.
    pub orders_output_path: Option<String>,
}

impl Config {
    /// Load configuration from environment variables.
    /// Loads `.env` if present.
    pub fn from_env() -> Result<Self> {
        let _ = dotenvy::dotenv(); // ignore error if .env not present

        Ok(Config {
            strategy_run_path: required_env("STRATEGY_RUN_PATH")?,
            candles_path: required_env("CANDLES_PATH")?,
            orders_output_path: optional_env("ORDERS_OUTPUT_PATH"),
        })
    }
}

fn required_env(key: &str) -> Result<String> {
    std::env::var(key).map_err(|_| {
        Error::Config(format!(
            "Required environment variable '{key}' is not set. Check your .env file."
        ))
    })
}

fn optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.is_empty())
}
