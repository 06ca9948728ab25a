use std::sync::Arc;

use async_trait::async_trait;
use chrono::Duration;
use tracing::info;

use common::{CandleStorage, Clock, Market, Order, OrderStorage, Pair, Result, Signal};

use crate::config::DoubleCrossoverConfig;
use crate::indicators::CrossoverDetector;
use crate::Strategy;

pub const DOUBLE_CROSSOVER_STRATEGY: &str = "double_crossover";

/// Trades a pair on crossings of two moving averages of the close price.
///
/// BUY spends the whole base-currency balance, SELL sells the whole
/// market-currency balance. Every placed order is written to order storage.
pub struct DoubleCrossoverStrategy {
    pair: Pair,
    detector: CrossoverDetector,
    delay: Duration,
    candle_storage: Arc<dyn CandleStorage>,
    order_storage: Arc<dyn OrderStorage>,
    clock: Arc<dyn Clock>,
}

impl DoubleCrossoverStrategy {
    pub fn new(
        pair: Pair,
        config: DoubleCrossoverConfig,
        candle_storage: Arc<dyn CandleStorage>,
        order_storage: Arc<dyn OrderStorage>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self> {
        Ok(Self {
            pair,
            detector: CrossoverDetector::new(config.long_average_interval, config.short_average_interval)?,
            delay: config.delay,
            candle_storage,
            order_storage,
            clock,
        })
    }

    async fn react(&self, signal: Signal, market: &dyn Market) -> Result<Order> {
        let order = match signal {
            Signal::Buy => market.buy_max_available(&self.pair).await?,
            Signal::Sell => market.sell_max_available(&self.pair).await?,
        };
        self.order_storage.save_order(&order).await?;
        Ok(order)
    }
}

#[async_trait]
impl Strategy for DoubleCrossoverStrategy {
    fn name(&self) -> &str {
        DOUBLE_CROSSOVER_STRATEGY
    }

    fn pair(&self) -> &Pair {
        &self.pair
    }

    fn clock(&self) -> &dyn Clock {
        self.clock.as_ref()
    }

    fn tick_delay(&self) -> Duration {
        self.delay
    }

    async fn tick(&mut self, market: &dyn Market) -> Result<Option<Order>> {
        let now = self.clock.now();
        let signal = self
            .detector
            .check(self.candle_storage.as_ref(), market.name(), &self.pair, now)
            .await?;

        let Some(signal) = signal else {
            return Ok(None);
        };
        info!(pair = %self.pair, market = %market.name(), at = %now, %signal, "Crossover signal");

        let order = self.react(signal, market).await?;
        info!(
            id = %order.id,
            side = %order.side,
            qty = %order.quantity,
            rate = %order.rate,
            "Order placed"
        );
        Ok(Some(order))
    }
}
