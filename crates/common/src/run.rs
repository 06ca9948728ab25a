use std::collections::HashMap;
use std::str::FromStr;

use chrono::Duration;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{DateTimeInterval, Error, Pair, Result};

/// Free-form configuration table, interpreted by whoever consumes it.
pub type Params = HashMap<String, toml::Value>;

/// Reference to a market implementation by name and providing plugin.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MarketRef {
    pub market_name: String,
    pub plugin_name: String,
    #[serde(default)]
    pub configuration: Params,
}

/// Everything needed to replay a strategy over historical candles.
///
/// Example run file:
/// ```toml
/// strategy_name = "double_crossover"
/// pair = "USD_BTC"
/// candle_storage_name = "memory"
/// order_storage_name = "memory"
///
/// [interval]
/// since = "2017-07-02T00:00:00Z"
/// till = "2017-07-03T00:00:00Z"
///
/// [[markets]]
/// market_name = "bittrex"
/// plugin_name = "coinrat_mock"
///
/// [markets.configuration.balances]
/// USD = "1000"
///
/// [strategy_configuration]
/// long_average_interval = 3600
/// short_average_interval = 900
/// delay = 60
/// ```
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StrategyRun {
    pub strategy_name: String,
    pub pair: Pair,
    pub markets: Vec<MarketRef>,
    pub candle_storage_name: String,
    pub order_storage_name: String,
    pub interval: DateTimeInterval,
    #[serde(default)]
    pub strategy_configuration: Params,
}

impl StrategyRun {
    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    pub fn load(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }
}

/// Read a whole number of seconds, falling back to `default` when absent.
pub fn param_seconds(params: &Params, key: &str, default: i64) -> Result<Duration> {
    let seconds = match params.get(key) {
        None => default,
        Some(value) => value.as_integer().ok_or_else(|| {
            Error::Config(format!("'{key}' must be a number of seconds, got {value}"))
        })?,
    };
    Duration::try_seconds(seconds)
        .ok_or_else(|| Error::Config(format!("'{key}' of {seconds} seconds is out of range")))
}

/// Read an optional decimal value.
pub fn param_decimal(params: &Params, key: &str) -> Result<Option<Decimal>> {
    params.get(key).map(|v| decimal_value(key, v)).transpose()
}

/// Convert a TOML string, integer or float into a decimal.
/// Strings are preferred since they keep every digit as written.
pub fn decimal_value(key: &str, value: &toml::Value) -> Result<Decimal> {
    let invalid = || Error::Config(format!("'{key}' must be a decimal number, got {value}"));
    match value {
        toml::Value::String(s) => Decimal::from_str(s.trim()).map_err(|_| invalid()),
        toml::Value::Integer(i) => Ok(Decimal::from(*i)),
        toml::Value::Float(f) => Decimal::try_from(*f).map_err(|_| invalid()),
        _ => Err(invalid()),
    }
}
