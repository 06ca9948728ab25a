use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tracing::info;

use common::{
    Balance, CandleStorage, Clock, Error, FrozenClock, Market, MarketRef, Order, OrderStorage,
    Pair, Registry, Result, SimulatedMarket, StrategyRun,
};
use paper::PaperMarket;
use strategy::{Strategy, StrategyContext, StrategyRegistry};

use crate::tick::{settle, RunSummary};

/// Result of replaying a strategy over a historical interval.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplayReport {
    pub ticks: u64,
    pub skipped_ticks: u64,
    /// Orders placed during the replay, in tick order.
    pub orders: Vec<Order>,
    /// Balances of the simulated market after the last tick.
    pub balances: Vec<Balance>,
}

/// Backtests strategies against stored candles.
///
/// Same tick path as a live run, but time comes from a frozen clock that
/// starts at the run interval's beginning and is advanced by the strategy's
/// tick delay after every tick, and the market is the simulated one with its
/// price taken from the latest candle.
pub struct Replayer {
    candle_storages: Registry<dyn CandleStorage>,
    order_storages: Registry<dyn OrderStorage>,
    strategies: StrategyRegistry,
}

impl Replayer {
    pub fn new(
        candle_storages: Registry<dyn CandleStorage>,
        order_storages: Registry<dyn OrderStorage>,
        strategies: StrategyRegistry,
    ) -> Self {
        Self {
            candle_storages,
            order_storages,
            strategies,
        }
    }

    pub async fn run(&self, run: &StrategyRun) -> Result<ReplayReport> {
        let (since, till) = closed_interval(run)?;
        let market_ref = simulation_market(run)?;

        let candle_storage = self.candle_storages.get(&run.candle_storage_name)?;
        let order_storage = self.order_storages.get(&run.order_storage_name)?;

        let clock = Arc::new(FrozenClock::new(since));
        let market = PaperMarket::from_configuration(
            market_ref.market_name.clone(),
            clock.clone(),
            &market_ref.configuration,
        )?;
        let mut strategy = self.strategies.build(
            &run.strategy_name,
            StrategyContext {
                pair: run.pair.clone(),
                candle_storage: candle_storage.clone(),
                order_storage,
                clock: clock.clone(),
                configuration: run.strategy_configuration.clone(),
            },
        )?;

        let delay = strategy.tick_delay();
        if delay <= Duration::zero() {
            return Err(Error::Config(format!(
                "replay needs a positive delay between ticks, got {delay}"
            )));
        }

        info!(
            strategy = %run.strategy_name,
            pair = %run.pair,
            market = %market.name(),
            interval = %run.interval,
            step = %delay,
            "Replay started"
        );

        let mut summary = RunSummary::default();
        while clock.now() < till {
            let tick_at = clock.now();
            let result = replay_tick(
                candle_storage.as_ref(),
                &market,
                strategy.as_mut(),
                &run.pair,
                tick_at,
            )
            .await;
            summary.record(settle(tick_at, result)?);
            clock.advance(delay)?;
        }

        let report = ReplayReport {
            ticks: summary.ticks,
            skipped_ticks: summary.skipped_ticks(),
            orders: summary.orders,
            balances: market.balances().await,
        };
        info!(
            ticks = report.ticks,
            skipped = report.skipped_ticks,
            orders = report.orders.len(),
            "Replay finished"
        );
        Ok(report)
    }
}

fn closed_interval(run: &StrategyRun) -> Result<(DateTime<Utc>, DateTime<Utc>)> {
    match (run.interval.since, run.interval.till) {
        (Some(since), Some(till)) => Ok((since, till)),
        _ => Err(Error::Config(format!(
            "Strategy replayer cannot run simulation for non-closed interval {}",
            run.interval
        ))),
    }
}

fn simulation_market(run: &StrategyRun) -> Result<&MarketRef> {
    let market_ref = match run.markets.as_slice() {
        [market_ref] => market_ref,
        [] => return Err(Error::Config("strategy run has no market".to_string())),
        _ => {
            return Err(Error::Config(format!(
                "replay supports a single market, {} given",
                run.markets.len()
            )))
        }
    };
    if market_ref.plugin_name != paper::PLUGIN_NAME {
        return Err(Error::Config(format!(
            "Market plugin must be \"{}\" for simulations, \"{}\" given.",
            paper::PLUGIN_NAME,
            market_ref.plugin_name
        )));
    }
    Ok(market_ref)
}

/// Price the simulated market from the latest candle, then tick.
async fn replay_tick(
    candle_storage: &dyn CandleStorage,
    market: &PaperMarket,
    strategy: &mut dyn Strategy,
    pair: &Pair,
    tick_at: DateTime<Utc>,
) -> Result<Option<Order>> {
    let candle = candle_storage.get_last_candle(market.name(), pair, tick_at).await?;
    market.set_mock_current_price(pair, candle.average_price()?).await;
    strategy.tick(market).await
}
