pub mod replayer;
pub mod runner;
pub mod tick;

pub use replayer::{ReplayReport, Replayer};
pub use runner::{RunnerState, StopHandle, StrategyRunner};
pub use tick::{RunSummary, TickOutcome};
