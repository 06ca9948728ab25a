use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// A tradeable combination of two currencies, written `BASE_MARKET`
/// (e.g. `USD_BTC`).
///
/// The base currency is what is paid with; the market currency is the asset
/// being bought or sold.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Pair {
    pub base_currency: String,
    pub market_currency: String,
}

impl Pair {
    pub fn new(base_currency: impl Into<String>, market_currency: impl Into<String>) -> Self {
        Self {
            base_currency: base_currency.into(),
            market_currency: market_currency.into(),
        }
    }
}

impl fmt::Display for Pair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.base_currency, self.market_currency)
    }
}

impl FromStr for Pair {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.split_once('_') {
            Some((base, market))
                if !base.is_empty() && !market.is_empty() && !market.contains('_') =>
            {
                Ok(Pair::new(base, market))
            }
            _ => Err(Error::Config(format!(
                "pair must look like 'USD_BTC', got '{s}'"
            ))),
        }
    }
}

impl TryFrom<String> for Pair {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<Pair> for String {
    fn from(pair: Pair) -> Self {
        pair.to_string()
    }
}

/// Time range with optional bounds. Both bounds are inclusive; a missing
/// bound leaves that side open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawInterval")]
pub struct DateTimeInterval {
    pub since: Option<DateTime<Utc>>,
    pub till: Option<DateTime<Utc>>,
}

#[derive(Deserialize)]
struct RawInterval {
    since: Option<DateTime<Utc>>,
    till: Option<DateTime<Utc>>,
}

impl TryFrom<RawInterval> for DateTimeInterval {
    type Error = Error;

    fn try_from(raw: RawInterval) -> Result<Self> {
        DateTimeInterval::new(raw.since, raw.till)
    }
}

impl DateTimeInterval {
    pub fn new(since: Option<DateTime<Utc>>, till: Option<DateTime<Utc>>) -> Result<Self> {
        if let (Some(since), Some(till)) = (since, till) {
            if since > till {
                return Err(Error::Config(format!(
                    "interval start {since} is after its end {till}"
                )));
            }
        }
        Ok(Self { since, till })
    }

    pub fn closed(since: DateTime<Utc>, till: DateTime<Utc>) -> Result<Self> {
        Self::new(Some(since), Some(till))
    }

    pub fn unbounded() -> Self {
        Self {
            since: None,
            till: None,
        }
    }

    pub fn is_closed(&self) -> bool {
        self.since.is_some() && self.till.is_some()
    }

    pub fn contains(&self, time: DateTime<Utc>) -> bool {
        self.since.map_or(true, |since| since <= time) && self.till.map_or(true, |till| time <= till)
    }
}

impl fmt::Display for DateTimeInterval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let bound = |b: Option<DateTime<Utc>>| b.map_or_else(|| "*".to_string(), |t| t.to_rfc3339());
        write!(f, "[{}, {}]", bound(self.since), bound(self.till))
    }
}

/// OHLC column a storage can aggregate over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CandleField {
    Open,
    High,
    Low,
    Close,
}

impl fmt::Display for CandleField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CandleField::Open => write!(f, "open"),
            CandleField::High => write!(f, "high"),
            CandleField::Low => write!(f, "low"),
            CandleField::Close => write!(f, "close"),
        }
    }
}

/// One-minute OHLC sample. `time` is the start of the bucket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candle {
    pub market_name: String,
    pub pair: Pair,
    pub time: DateTime<Utc>,
    pub open: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    pub close: Decimal,
}

impl Candle {
    pub fn field(&self, field: CandleField) -> Decimal {
        match field {
            CandleField::Open => self.open,
            CandleField::High => self.high,
            CandleField::Low => self.low,
            CandleField::Close => self.close,
        }
    }

    /// OHLC average, used as the simulated current price.
    pub fn average_price(&self) -> Result<Decimal> {
        self.open
            .checked_add(self.high)
            .and_then(|sum| sum.checked_add(self.low))
            .and_then(|sum| sum.checked_add(self.close))
            .map(|sum| sum / Decimal::from(4))
            .ok_or_else(|| {
                Error::Market(format!(
                    "average price of {} candle at {} overflows",
                    self.pair, self.time
                ))
            })
    }
}

/// Crossover decision emitted by a signal detector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Signal {
    Buy,
    Sell,
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Signal::Buy => write!(f, "BUY"),
            Signal::Sell => write!(f, "SELL"),
        }
    }
}

/// Side of a trade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OrderSide {
    Buy,
    Sell,
}

impl fmt::Display for OrderSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrderSide::Buy => write!(f, "BUY"),
            OrderSide::Sell => write!(f, "SELL"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OrderType {
    Limit,
}

/// An order placed on a market.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: String,
    pub market_name: String,
    pub pair: Pair,
    pub side: OrderSide,
    pub order_type: OrderType,
    pub quantity: Decimal,
    pub rate: Decimal,
    pub created_at: DateTime<Utc>,
}

/// Available amount of one currency on a market.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Balance {
    pub currency: String,
    pub available: Decimal,
}

impl Balance {
    pub fn new(currency: impl Into<String>, available: Decimal) -> Self {
        Self {
            currency: currency.into(),
            available,
        }
    }
}
