use std::sync::Arc;

use tokio::sync::watch;
use tracing::info;

use common::{Clock, Error, Market, Result};
use strategy::Strategy;

use crate::tick::{settle, RunSummary};

/// Lifecycle of a runner. `Stopped` is terminal; a stopped runner is
/// consumed and a fresh strategy needs a new runner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunnerState {
    Running,
    Stopped,
}

/// Cloneable handle that asks a running runner to stop.
///
/// The request is honoured before the next tick starts or while the runner
/// is sleeping between ticks. A tick in progress always completes.
#[derive(Clone)]
pub struct StopHandle {
    tx: Arc<watch::Sender<bool>>,
}

impl StopHandle {
    pub fn stop(&self) {
        self.tx.send_replace(true);
    }

    pub fn is_stopped(&self) -> bool {
        *self.tx.borrow()
    }
}

/// Drives a strategy live: tick, react, sleep, repeat.
///
/// Tick times come from the strategy's own clock, so skipped-tick logs carry
/// the same timestamp the decision was made at.
pub struct StrategyRunner {
    strategy: Box<dyn Strategy>,
    market: Arc<dyn Market>,
    stop_tx: Arc<watch::Sender<bool>>,
    stop_rx: watch::Receiver<bool>,
}

impl StrategyRunner {
    pub fn new(strategy: Box<dyn Strategy>, market: Arc<dyn Market>) -> Self {
        let (stop_tx, stop_rx) = watch::channel(false);
        Self {
            strategy,
            market,
            stop_tx: Arc::new(stop_tx),
            stop_rx,
        }
    }

    pub fn stop_handle(&self) -> StopHandle {
        StopHandle {
            tx: self.stop_tx.clone(),
        }
    }

    /// Run until `number_of_runs` ticks have been evaluated, or forever when
    /// `None`, or until stopped through a `StopHandle`.
    pub async fn run(mut self, number_of_runs: Option<u64>) -> Result<RunSummary> {
        let delay = self.strategy.tick_delay().to_std().map_err(|_| {
            Error::Config(format!(
                "delay between ticks must not be negative, got {}",
                self.strategy.tick_delay()
            ))
        })?;
        info!(
            strategy = %self.strategy.name(),
            pair = %self.strategy.pair(),
            market = %self.market.name(),
            runs = ?number_of_runs,
            "Strategy runner started"
        );

        let mut remaining = number_of_runs;
        let mut summary = RunSummary::default();
        let mut state = RunnerState::Running;

        while state == RunnerState::Running {
            if *self.stop_rx.borrow_and_update() || remaining == Some(0) {
                state = RunnerState::Stopped;
                continue;
            }

            let tick_at = self.strategy.clock().now();
            let result = self.strategy.tick(self.market.as_ref()).await;
            summary.record(settle(tick_at, result)?);

            if let Some(n) = remaining.as_mut() {
                *n -= 1;
                if *n == 0 {
                    state = RunnerState::Stopped;
                    continue;
                }
            }

            tokio::select! {
                _ = tokio::time::sleep(delay) => {}
                _ = self.stop_rx.changed() => {}
            }
        }

        info!(
            ticks = summary.ticks,
            skipped = summary.skipped_ticks(),
            orders = summary.orders.len(),
            "Strategy runner stopped"
        );
        Ok(summary)
    }
}
