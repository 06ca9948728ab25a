use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use crate::{Candle, CandleField, DateTimeInterval, Order, Pair, Result};

/// Read/write access to stored one-minute candles.
///
/// Interval bounds are inclusive on both ends. Aggregating queries fail with
/// `Error::NoCandles` when nothing matches; they never fall back to zero,
/// since a spurious zero price reads as a crossover.
#[async_trait]
pub trait CandleStorage: Send + Sync {
    fn name(&self) -> &str;

    async fn write_candle(&self, candle: Candle) -> Result<()>;

    async fn write_candles(&self, candles: Vec<Candle>) -> Result<()>;

    /// Candles of a market and pair inside the interval, oldest first.
    async fn find_by(
        &self,
        market_name: &str,
        pair: &Pair,
        interval: DateTimeInterval,
    ) -> Result<Vec<Candle>>;

    /// Arithmetic mean of `field` over the candles inside the interval.
    async fn mean(
        &self,
        market_name: &str,
        pair: &Pair,
        field: CandleField,
        interval: DateTimeInterval,
    ) -> Result<Decimal>;

    /// Most recent candle whose time is at or before `at_or_before`.
    async fn get_last_candle(
        &self,
        market_name: &str,
        pair: &Pair,
        at_or_before: DateTime<Utc>,
    ) -> Result<Candle>;
}

/// Persistence for orders placed by strategies.
#[async_trait]
pub trait OrderStorage: Send + Sync {
    fn name(&self) -> &str;

    async fn save_order(&self, order: &Order) -> Result<()>;

    /// Orders of a market and pair created inside the interval, oldest first.
    async fn find_by(
        &self,
        market_name: &str,
        pair: &Pair,
        interval: DateTimeInterval,
    ) -> Result<Vec<Order>>;
}
