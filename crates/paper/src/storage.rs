use std::collections::{BTreeMap, HashMap};
use std::ops::Bound;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use tokio::sync::RwLock;
use tracing::debug;

use common::{
    Candle, CandleField, CandleStorage, DateTimeInterval, Error, Order, OrderStorage, Pair, Result,
};

type SeriesKey = (String, Pair);
type Series = BTreeMap<DateTime<Utc>, Candle>;

/// Candle storage kept in memory, one time-ordered series per market and pair.
///
/// Writing a candle for a market, pair and minute that is already stored
/// replaces it, the way a time-series database overwrites a point.
pub struct MemoryCandleStorage {
    name: String,
    series: RwLock<HashMap<SeriesKey, Series>>,
}

impl MemoryCandleStorage {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            series: RwLock::new(HashMap::new()),
        }
    }

    pub async fn len(&self) -> usize {
        self.series.read().await.values().map(BTreeMap::len).sum()
    }

    pub async fn is_empty(&self) -> bool {
        self.series.read().await.values().all(BTreeMap::is_empty)
    }
}

fn series_key(market_name: &str, pair: &Pair) -> SeriesKey {
    (market_name.to_string(), pair.clone())
}

/// Candles of one series inside the interval, oldest first.
fn in_interval(candles: &Series, interval: DateTimeInterval) -> impl Iterator<Item = &Candle> {
    let reversed = matches!((interval.since, interval.till), (Some(since), Some(till)) if since > till);
    let bounds = (
        interval.since.map_or(Bound::Unbounded, Bound::Included),
        interval.till.map_or(Bound::Unbounded, Bound::Included),
    );
    (!reversed)
        .then(|| candles.range(bounds))
        .into_iter()
        .flatten()
        .map(|(_, candle)| candle)
}

fn no_candles(market_name: &str, pair: &Pair, interval: DateTimeInterval) -> Error {
    Error::NoCandles {
        market: market_name.to_string(),
        pair: pair.clone(),
        interval,
    }
}

#[async_trait]
impl CandleStorage for MemoryCandleStorage {
    fn name(&self) -> &str {
        &self.name
    }

    async fn write_candle(&self, candle: Candle) -> Result<()> {
        self.write_candles(vec![candle]).await
    }

    async fn write_candles(&self, candles: Vec<Candle>) -> Result<()> {
        if candles.is_empty() {
            return Ok(());
        }
        let written = candles.len();
        let mut series = self.series.write().await;
        for candle in candles {
            series
                .entry(series_key(&candle.market_name, &candle.pair))
                .or_default()
                .insert(candle.time, candle);
        }
        debug!(storage = %self.name, written, series = series.len(), "Candles written");
        Ok(())
    }

    async fn find_by(
        &self,
        market_name: &str,
        pair: &Pair,
        interval: DateTimeInterval,
    ) -> Result<Vec<Candle>> {
        let series = self.series.read().await;
        Ok(series
            .get(&series_key(market_name, pair))
            .map(|candles| in_interval(candles, interval).cloned().collect())
            .unwrap_or_default())
    }

    async fn mean(
        &self,
        market_name: &str,
        pair: &Pair,
        field: CandleField,
        interval: DateTimeInterval,
    ) -> Result<Decimal> {
        let series = self.series.read().await;
        let candles = series
            .get(&series_key(market_name, pair))
            .ok_or_else(|| no_candles(market_name, pair, interval))?;

        let mut sum = Decimal::ZERO;
        let mut count = 0u32;
        for candle in in_interval(candles, interval) {
            sum = sum.checked_add(candle.field(field)).ok_or_else(|| {
                Error::Storage(format!(
                    "{field} sum overflows for {pair} on '{market_name}' in {interval}"
                ))
            })?;
            count += 1;
        }

        if count == 0 {
            return Err(no_candles(market_name, pair, interval));
        }
        Ok(sum / Decimal::from(count))
    }

    async fn get_last_candle(
        &self,
        market_name: &str,
        pair: &Pair,
        at_or_before: DateTime<Utc>,
    ) -> Result<Candle> {
        let series = self.series.read().await;
        series
            .get(&series_key(market_name, pair))
            .and_then(|candles| candles.range(..=at_or_before).next_back())
            .map(|(_, c)| c.clone())
            .ok_or_else(|| {
                no_candles(
                    market_name,
                    pair,
                    DateTimeInterval {
                        since: None,
                        till: Some(at_or_before),
                    },
                )
            })
    }
}

/// Order storage kept in memory, in insertion order.
pub struct MemoryOrderStorage {
    name: String,
    orders: RwLock<Vec<Order>>,
}

impl MemoryOrderStorage {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            orders: RwLock::new(Vec::new()),
        }
    }
}

#[async_trait]
impl OrderStorage for MemoryOrderStorage {
    fn name(&self) -> &str {
        &self.name
    }

    async fn save_order(&self, order: &Order) -> Result<()> {
        self.orders.write().await.push(order.clone());
        Ok(())
    }

    async fn find_by(
        &self,
        market_name: &str,
        pair: &Pair,
        interval: DateTimeInterval,
    ) -> Result<Vec<Order>> {
        let mut orders: Vec<Order> = self
            .orders
            .read()
            .await
            .iter()
            .filter(|o| {
                o.market_name == market_name && &o.pair == pair && interval.contains(o.created_at)
            })
            .cloned()
            .collect();
        orders.sort_by_key(|o| o.created_at);
        Ok(orders)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use common::{OrderSide, OrderType};
    use rust_decimal_macros::dec;

    const MARKET: &str = "dummy_market";

    fn usd_btc() -> Pair {
        Pair::new("USD", "BTC")
    }

    fn at(minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2017, 7, 2, 0, minute, 0).unwrap()
    }

    fn candle(minute: u32, close: Decimal) -> Candle {
        Candle {
            market_name: MARKET.into(),
            pair: usd_btc(),
            time: at(minute),
            open: dec!(8000),
            high: dec!(8100),
            low: dec!(8200),
            close,
        }
    }

    fn interval(from: u32, to: u32) -> DateTimeInterval {
        DateTimeInterval::closed(at(from), at(to)).unwrap()
    }

    #[tokio::test]
    async fn mean_golden_values() {
        let storage = MemoryCandleStorage::new("memory");
        storage
            .write_candles(vec![candle(10, dec!(8000)), candle(20, dec!(8300))])
            .await
            .unwrap();

        for (expected, (from, to)) in [(dec!(8000), (0, 15)), (dec!(8300), (15, 30)), (dec!(8150), (0, 30))] {
            let mean = storage
                .mean(MARKET, &usd_btc(), CandleField::Close, interval(from, to))
                .await
                .unwrap();
            assert_eq!(mean, expected, "mean over [{from}, {to}]");
        }
    }

    #[tokio::test]
    async fn mean_bounds_are_inclusive() {
        let storage = MemoryCandleStorage::new("memory");
        storage
            .write_candles(vec![candle(10, dec!(8000)), candle(20, dec!(8300))])
            .await
            .unwrap();
        let mean = storage
            .mean(MARKET, &usd_btc(), CandleField::Close, interval(10, 20))
            .await
            .unwrap();
        assert_eq!(mean, dec!(8150));
    }

    #[tokio::test]
    async fn mean_without_data_fails_instead_of_returning_zero() {
        let storage = MemoryCandleStorage::new("memory");
        let err = storage
            .mean(MARKET, &usd_btc(), CandleField::Close, interval(0, 30))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::NoCandles { .. }));
    }

    #[tokio::test]
    async fn mean_ignores_other_markets_and_pairs() {
        let storage = MemoryCandleStorage::new("memory");
        let mut other_pair = candle(10, dec!(1));
        other_pair.pair = Pair::new("USD", "ETH");
        let mut other_market = candle(10, dec!(1));
        other_market.market_name = "bittrex".into();
        storage
            .write_candles(vec![other_pair, other_market, candle(12, dec!(8000))])
            .await
            .unwrap();

        let mean = storage
            .mean(MARKET, &usd_btc(), CandleField::Close, interval(0, 30))
            .await
            .unwrap();
        assert_eq!(mean, dec!(8000));
    }

    #[tokio::test]
    async fn writing_zero_candles_is_a_no_op() {
        let storage = MemoryCandleStorage::new("memory");
        storage.write_candles(Vec::new()).await.unwrap();
        assert!(storage.is_empty().await);
    }

    #[tokio::test]
    async fn rewriting_a_minute_replaces_the_candle() {
        let storage = MemoryCandleStorage::new("memory");
        storage.write_candle(candle(1, dec!(8300))).await.unwrap();
        storage.write_candle(candle(1, dec!(8400))).await.unwrap();

        assert_eq!(storage.len().await, 1);
        let found = storage
            .find_by(MARKET, &usd_btc(), DateTimeInterval::unbounded())
            .await
            .unwrap();
        assert_eq!(found[0].close, dec!(8400));
    }

    #[tokio::test]
    async fn out_of_order_writes_across_series_stay_separate_and_sorted() {
        let storage = MemoryCandleStorage::new("memory");
        let eth = |minute: u32, close: Decimal| Candle {
            pair: Pair::new("USD", "ETH"),
            ..candle(minute, close)
        };
        storage
            .write_candles(vec![
                candle(9, dec!(8090)),
                eth(4, dec!(300)),
                candle(3, dec!(8030)),
                eth(1, dec!(310)),
                candle(6, dec!(8060)),
                eth(4, dec!(320)),
            ])
            .await
            .unwrap();

        assert_eq!(storage.len().await, 5);

        let btc = storage
            .find_by(MARKET, &usd_btc(), DateTimeInterval::unbounded())
            .await
            .unwrap();
        let times: Vec<_> = btc.iter().map(|c| c.time).collect();
        assert_eq!(times, vec![at(3), at(6), at(9)]);

        let eth_closes: Vec<_> = storage
            .find_by(MARKET, &Pair::new("USD", "ETH"), DateTimeInterval::unbounded())
            .await
            .unwrap()
            .iter()
            .map(|c| c.close)
            .collect();
        assert_eq!(eth_closes, vec![dec!(310), dec!(320)]);

        let last = storage.get_last_candle(MARKET, &usd_btc(), at(8)).await.unwrap();
        assert_eq!(last.close, dec!(8060));
        let mean = storage
            .mean(MARKET, &usd_btc(), CandleField::Close, interval(3, 6))
            .await
            .unwrap();
        assert_eq!(mean, dec!(8045));
    }

    #[tokio::test]
    async fn overflowing_mean_is_a_storage_error() {
        let storage = MemoryCandleStorage::new("memory");
        storage
            .write_candles(vec![candle(1, Decimal::MAX), candle(2, Decimal::MAX)])
            .await
            .unwrap();
        let err = storage
            .mean(MARKET, &usd_btc(), CandleField::Close, interval(0, 5))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Storage(_)));
    }

    #[tokio::test]
    async fn last_candle_is_the_latest_at_or_before() {
        let storage = MemoryCandleStorage::new("memory");
        storage
            .write_candles(vec![candle(2, dec!(8300)), candle(1, dec!(8300)), candle(5, dec!(8300))])
            .await
            .unwrap();

        let last = storage.get_last_candle(MARKET, &usd_btc(), at(4)).await.unwrap();
        assert_eq!(last.time, at(2));
        let exact = storage.get_last_candle(MARKET, &usd_btc(), at(5)).await.unwrap();
        assert_eq!(exact.time, at(5));

        let err = storage.get_last_candle(MARKET, &usd_btc(), at(0)).await.unwrap_err();
        assert!(matches!(err, Error::NoCandles { .. }));
    }

    #[tokio::test]
    async fn orders_are_found_by_market_pair_and_time() {
        let storage = MemoryOrderStorage::new("memory");
        let order = |minute: u32, market: &str| Order {
            id: format!("{market}-{minute}"),
            market_name: market.into(),
            pair: usd_btc(),
            side: OrderSide::Buy,
            order_type: OrderType::Limit,
            quantity: dec!(1),
            rate: dec!(8000),
            created_at: at(minute),
        };
        storage.save_order(&order(20, MARKET)).await.unwrap();
        storage.save_order(&order(5, MARKET)).await.unwrap();
        storage.save_order(&order(7, "bittrex")).await.unwrap();

        let found = storage.find_by(MARKET, &usd_btc(), interval(0, 30)).await.unwrap();
        let ids: Vec<_> = found.iter().map(|o| o.id.as_str()).collect();
        assert_eq!(ids, vec!["dummy_market-5", "dummy_market-20"]);
    }
}
