pub mod config;
pub mod double_crossover;
pub mod indicators;
pub mod registry;

pub use config::DoubleCrossoverConfig;
pub use double_crossover::{DoubleCrossoverStrategy, DOUBLE_CROSSOVER_STRATEGY};
pub use indicators::CrossoverDetector;
pub use registry::{StrategyBuilder, StrategyContext, StrategyRegistry};

use async_trait::async_trait;
use chrono::Duration;

use common::{Clock, Market, Order, Pair, Result};

/// All strategy implementations must satisfy this trait.
///
/// A strategy reads time only from the clock it was built with, so the same
/// instance behaves identically under a live and a simulated clock.
#[async_trait]
pub trait Strategy: Send {
    /// Name the strategy is registered under.
    fn name(&self) -> &str;

    /// The pair this strategy trades.
    fn pair(&self) -> &Pair;

    /// The clock every decision of this strategy is timed by.
    fn clock(&self) -> &dyn Clock;

    /// Pause between ticks in live runs; simulated time step in replays.
    fn tick_delay(&self) -> Duration;

    /// Evaluate once at the clock's current time and react to any signal.
    /// Returns the order placed on `market`, if one was.
    async fn tick(&mut self, market: &dyn Market) -> Result<Option<Order>>;
}
