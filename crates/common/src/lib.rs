pub mod clock;
pub mod config;
pub mod error;
pub mod market;
pub mod registry;
pub mod run;
pub mod storage;
pub mod types;

pub use clock::{Clock, FrozenClock, SystemClock};
pub use config::Config;
pub use error::{Error, Result};
pub use market::{Market, SimulatedMarket};
pub use registry::Registry;
pub use run::{MarketRef, StrategyRun};
pub use storage::{CandleStorage, OrderStorage};
pub use types::*;
