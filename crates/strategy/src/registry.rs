use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::info;

use common::run::Params;
use common::{CandleStorage, Clock, Error, OrderStorage, Pair, Result};

use crate::config::DoubleCrossoverConfig;
use crate::double_crossover::{DoubleCrossoverStrategy, DOUBLE_CROSSOVER_STRATEGY};
use crate::Strategy;

/// Everything a strategy is built from.
pub struct StrategyContext {
    pub pair: Pair,
    pub candle_storage: Arc<dyn CandleStorage>,
    pub order_storage: Arc<dyn OrderStorage>,
    pub clock: Arc<dyn Clock>,
    pub configuration: Params,
}

pub type StrategyBuilder = fn(StrategyContext) -> Result<Box<dyn Strategy>>;

/// Strategy implementations available by name.
///
/// Constructed explicitly and handed to whatever needs to build strategies;
/// there is no process-wide registry.
pub struct StrategyRegistry {
    builders: BTreeMap<String, StrategyBuilder>,
}

impl StrategyRegistry {
    pub fn empty() -> Self {
        Self {
            builders: BTreeMap::new(),
        }
    }

    /// Registry with every strategy shipped in this crate.
    pub fn with_defaults() -> Self {
        let mut registry = Self::empty();
        registry.register(DOUBLE_CROSSOVER_STRATEGY, build_double_crossover);
        registry
    }

    pub fn register(&mut self, name: impl Into<String>, builder: StrategyBuilder) {
        let name = name.into();
        info!(name = %name, "Registered strategy");
        self.builders.insert(name, builder);
    }

    pub fn available(&self) -> impl Iterator<Item = &str> {
        self.builders.keys().map(String::as_str)
    }

    pub fn build(&self, name: &str, context: StrategyContext) -> Result<Box<dyn Strategy>> {
        let builder = self.builders.get(name).ok_or_else(|| {
            Error::Config(format!(
                "Strategy '{name}' is not provided by any plugin, available: [{}]",
                self.available().collect::<Vec<_>>().join(", ")
            ))
        })?;
        builder(context)
    }
}

impl Default for StrategyRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

fn build_double_crossover(context: StrategyContext) -> Result<Box<dyn Strategy>> {
    let config = DoubleCrossoverConfig::from_params(&context.configuration)?;
    Ok(Box::new(DoubleCrossoverStrategy::new(
        context.pair,
        config,
        context.candle_storage,
        context.order_storage,
        context.clock,
    )?))
}
