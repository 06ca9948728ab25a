use chrono::Duration;

use common::run::{param_seconds, Params};
use common::{Error, Result};

/// Settings of the double crossover strategy, read from a run's
/// `strategy_configuration` table. All values are whole seconds.
///
/// ```toml
/// [strategy_configuration]
/// long_average_interval = 3600
/// short_average_interval = 900
/// delay = 30
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DoubleCrossoverConfig {
    pub long_average_interval: Duration,
    pub short_average_interval: Duration,
    /// Pause between ticks (live) or simulated time step (replay).
    pub delay: Duration,
}

impl DoubleCrossoverConfig {
    const DEFAULT_LONG_SECS: i64 = 60 * 60;
    const DEFAULT_SHORT_SECS: i64 = 15 * 60;
    const DEFAULT_DELAY_SECS: i64 = 30;

    pub fn from_params(params: &Params) -> Result<Self> {
        let config = Self {
            long_average_interval: param_seconds(params, "long_average_interval", Self::DEFAULT_LONG_SECS)?,
            short_average_interval: param_seconds(params, "short_average_interval", Self::DEFAULT_SHORT_SECS)?,
            delay: param_seconds(params, "delay", Self::DEFAULT_DELAY_SECS)?,
        };
        if config.delay <= Duration::zero() {
            return Err(Error::Config(format!(
                "delay between ticks must be positive, got {}",
                config.delay
            )));
        }
        Ok(config)
    }
}

impl Default for DoubleCrossoverConfig {
    fn default() -> Self {
        Self {
            long_average_interval: Duration::seconds(Self::DEFAULT_LONG_SECS),
            short_average_interval: Duration::seconds(Self::DEFAULT_SHORT_SECS),
            delay: Duration::seconds(Self::DEFAULT_DELAY_SECS),
        }
    }
}
