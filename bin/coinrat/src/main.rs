use std::sync::Arc;

use anyhow::Context;
use tracing::info;
use tracing_subscriber::EnvFilter;

use common::{Candle, CandleStorage, Config, OrderStorage, Registry, StrategyRun};
use engine::Replayer;
use paper::{MemoryCandleStorage, MemoryOrderStorage};
use strategy::StrategyRegistry;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // ── Logging ──────────────────────────────────────────────────────────────
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // ── Config ────────────────────────────────────────────────────────────────
    let cfg = Config::from_env()?;
    let run = StrategyRun::load(&cfg.strategy_run_path)
        .with_context(|| format!("Failed to load strategy run at '{}'", cfg.strategy_run_path))?;
    info!(strategy = %run.strategy_name, pair = %run.pair, interval = %run.interval, "Coinrat replay starting");

    // ── Storages ──────────────────────────────────────────────────────────────
    let candles = load_candles(&cfg.candles_path)?;
    let candle_storage = Arc::new(MemoryCandleStorage::new(run.candle_storage_name.clone()));
    let loaded = candles.len();
    candle_storage.write_candles(candles).await?;
    info!(candles = loaded, storage = %run.candle_storage_name, "Candles loaded");

    let order_storage = Arc::new(MemoryOrderStorage::new(run.order_storage_name.clone()));

    let mut candle_storages: Registry<dyn CandleStorage> = Registry::new("candle storage");
    candle_storages.register(run.candle_storage_name.clone(), candle_storage);
    let mut order_storages: Registry<dyn OrderStorage> = Registry::new("order storage");
    order_storages.register(run.order_storage_name.clone(), order_storage);

    // ── Replay ────────────────────────────────────────────────────────────────
    let replayer = Replayer::new(candle_storages, order_storages, StrategyRegistry::with_defaults());
    let report = replayer.run(&run).await?;

    for balance in &report.balances {
        info!(currency = %balance.currency, available = %balance.available, "Final balance");
    }

    if let Some(path) = &cfg.orders_output_path {
        let json = serde_json::to_string_pretty(&report.orders)?;
        std::fs::write(path, json).with_context(|| format!("Failed to write orders to '{path}'"))?;
        info!(orders = report.orders.len(), path = %path, "Order history written");
    }

    Ok(())
}

fn load_candles(path: &str) -> anyhow::Result<Vec<Candle>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read candles at '{path}'"))?;
    serde_json::from_str(&content).with_context(|| format!("Failed to parse candles at '{path}'"))
}
