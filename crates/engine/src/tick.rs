use chrono::{DateTime, Utc};
use tracing::warn;

use common::{Order, Result};

/// What a single tick amounted to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickOutcome {
    /// Evaluated without a signal.
    Idle,
    /// A signal was acted upon and this order placed.
    Ordered(Order),
    /// Failed with a recoverable error and was skipped.
    Skipped { at: DateTime<Utc> },
}

/// Tally of ticks shared by live runs and replays.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub ticks: u64,
    /// Clock time of every skipped tick.
    pub skipped_at: Vec<DateTime<Utc>>,
    pub orders: Vec<Order>,
}

impl RunSummary {
    pub fn record(&mut self, outcome: TickOutcome) {
        self.ticks += 1;
        match outcome {
            TickOutcome::Idle => {}
            TickOutcome::Ordered(order) => self.orders.push(order),
            TickOutcome::Skipped { at } => self.skipped_at.push(at),
        }
    }

    pub fn skipped_ticks(&self) -> u64 {
        self.skipped_at.len() as u64
    }
}

/// The tick loop boundary: the only place tick errors are swallowed.
///
/// Recoverable errors are logged with the tick time and turn into
/// `Skipped`; anything else propagates and ends the run.
pub fn settle(tick_at: DateTime<Utc>, result: Result<Option<Order>>) -> Result<TickOutcome> {
    match result {
        Ok(Some(order)) => Ok(TickOutcome::Ordered(order)),
        Ok(None) => Ok(TickOutcome::Idle),
        Err(e) if e.is_tick_recoverable() => {
            warn!(at = %tick_at.to_rfc3339(), error = %e, "Exception during tick, skipping");
            Ok(TickOutcome::Skipped { at: tick_at })
        }
        Err(e) => Err(e),
    }
}
