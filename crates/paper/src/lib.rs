pub mod storage;

pub use storage::{MemoryCandleStorage, MemoryOrderStorage};

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use rust_decimal::Decimal;
use tokio::sync::RwLock;
use tracing::{debug, info};
use uuid::Uuid;

use common::run::{decimal_value, param_decimal, Params};
use common::{
    Balance, Candle, Clock, Error, Market, Order, OrderSide, OrderType, Pair, Result,
    SimulatedMarket,
};

/// Plugin name the replayer requires for its market.
pub const PLUGIN_NAME: &str = "coinrat_mock";

/// 0.25 %, the fee charged by the exchange the simulation stands in for.
pub const DEFAULT_TRANSACTION_FEE: Decimal = Decimal::from_parts(25, 0, 0, false, 4);

/// Simulated market for backtests.
///
/// Prices are injected through `set_mock_current_price`; orders fill
/// immediately at that price and settle against in-memory balances.
/// Nothing is ever sent to a real exchange.
pub struct PaperMarket {
    name: String,
    clock: Arc<dyn Clock>,
    transaction_fee: Decimal,
    /// Available amount per currency.
    balances: RwLock<BTreeMap<String, Decimal>>,
    /// Injected current price per pair.
    prices: RwLock<HashMap<Pair, Decimal>>,
    /// Sequence for deterministic order ids.
    next_order: AtomicU64,
}

impl PaperMarket {
    pub fn new(name: impl Into<String>, clock: Arc<dyn Clock>, transaction_fee: Decimal) -> Result<Self> {
        if transaction_fee < Decimal::ZERO || transaction_fee >= Decimal::ONE {
            return Err(Error::Config(format!(
                "transaction fee must be in [0, 1), got {transaction_fee}"
            )));
        }
        Ok(Self {
            name: name.into(),
            clock,
            transaction_fee,
            balances: RwLock::new(BTreeMap::new()),
            prices: RwLock::new(HashMap::new()),
            next_order: AtomicU64::new(1),
        })
    }

    /// Build from a market reference's free-form configuration:
    /// an optional `transaction_fee` and a `balances` table.
    pub fn from_configuration(
        name: impl Into<String>,
        clock: Arc<dyn Clock>,
        configuration: &Params,
    ) -> Result<Self> {
        let fee = param_decimal(configuration, "transaction_fee")?.unwrap_or(DEFAULT_TRANSACTION_FEE);
        let mut market = Self::new(name, clock, fee)?;

        let mut balances = BTreeMap::new();
        match configuration.get("balances") {
            None => {}
            Some(toml::Value::Table(table)) => {
                for (currency, amount) in table {
                    balances.insert(currency.clone(), decimal_value(currency, amount)?);
                }
            }
            Some(other) => {
                return Err(Error::Config(format!(
                    "'balances' must be a table of currency amounts, got {other}"
                )))
            }
        }
        info!(market = %market.name, fee = %fee, ?balances, "PaperMarket initialized");
        *market.balances.get_mut() = balances;

        Ok(market)
    }

    pub fn with_balance(mut self, currency: impl Into<String>, amount: Decimal) -> Self {
        self.balances.get_mut().insert(currency.into(), amount);
        self
    }

    async fn current_price(&self, pair: &Pair) -> Result<Decimal> {
        let price = self.prices.read().await.get(pair).copied().ok_or_else(|| {
            Error::Market(format!(
                "PaperMarket '{}' has no price for pair {pair}. Set it before trading.",
                self.name
            ))
        })?;
        if price <= Decimal::ZERO {
            return Err(Error::Market(format!("non-positive price {price} for {pair}")));
        }
        Ok(price)
    }

    fn next_order_id(&self) -> String {
        Uuid::from_u128(u128::from(self.next_order.fetch_add(1, Ordering::Relaxed))).to_string()
    }

    fn limit_order(&self, pair: &Pair, side: OrderSide, quantity: Decimal, rate: Decimal) -> Order {
        Order {
            id: self.next_order_id(),
            market_name: self.name.clone(),
            pair: pair.clone(),
            side,
            order_type: OrderType::Limit,
            quantity,
            rate,
            created_at: self.clock.now(),
        }
    }

    fn overflow(&self, pair: &Pair) -> Error {
        Error::Market(format!("order amount overflow on {} for {pair}", self.name))
    }
}

#[async_trait]
impl Market for PaperMarket {
    fn name(&self) -> &str {
        &self.name
    }

    fn transaction_fee(&self) -> Decimal {
        self.transaction_fee
    }

    async fn get_balance(&self, currency: &str) -> Result<Balance> {
        let available = self
            .balances
            .read()
            .await
            .get(currency)
            .copied()
            .unwrap_or(Decimal::ZERO);
        Ok(Balance::new(currency, available))
    }

    async fn get_last_ticker(&self, pair: &Pair) -> Result<Candle> {
        let price = self.current_price(pair).await?;
        Ok(Candle {
            market_name: self.name.clone(),
            pair: pair.clone(),
            time: self.clock.now(),
            open: price,
            high: price,
            low: price,
            close: price,
        })
    }

    async fn buy_max_available(&self, pair: &Pair) -> Result<Order> {
        let price = self.current_price(pair).await?;
        let mut balances = self.balances.write().await;

        let spend = balances.get(&pair.base_currency).copied().unwrap_or(Decimal::ZERO);
        if spend <= Decimal::ZERO {
            return Err(Error::InsufficientBalance {
                currency: pair.base_currency.clone(),
            });
        }

        let quantity = spend
            .checked_div(price)
            .and_then(|q| q.checked_mul(Decimal::ONE - self.transaction_fee))
            .ok_or_else(|| self.overflow(pair))?;
        let held = balances.get(&pair.market_currency).copied().unwrap_or(Decimal::ZERO);
        let new_held = held.checked_add(quantity).ok_or_else(|| self.overflow(pair))?;

        balances.insert(pair.base_currency.clone(), Decimal::ZERO);
        balances.insert(pair.market_currency.clone(), new_held);

        let order = self.limit_order(pair, OrderSide::Buy, quantity, price);
        debug!(pair = %pair, price = %price, qty = %quantity, spent = %spend, "Paper buy filled");
        Ok(order)
    }

    async fn sell_max_available(&self, pair: &Pair) -> Result<Order> {
        let price = self.current_price(pair).await?;
        let mut balances = self.balances.write().await;

        let quantity = balances.get(&pair.market_currency).copied().unwrap_or(Decimal::ZERO);
        if quantity <= Decimal::ZERO {
            return Err(Error::InsufficientBalance {
                currency: pair.market_currency.clone(),
            });
        }

        let proceeds = quantity
            .checked_mul(price)
            .and_then(|p| p.checked_mul(Decimal::ONE - self.transaction_fee))
            .ok_or_else(|| self.overflow(pair))?;
        let held = balances.get(&pair.base_currency).copied().unwrap_or(Decimal::ZERO);
        let new_held = held.checked_add(proceeds).ok_or_else(|| self.overflow(pair))?;

        balances.insert(pair.market_currency.clone(), Decimal::ZERO);
        balances.insert(pair.base_currency.clone(), new_held);

        let order = self.limit_order(pair, OrderSide::Sell, quantity, price);
        debug!(pair = %pair, price = %price, qty = %quantity, proceeds = %proceeds, "Paper sell filled");
        Ok(order)
    }
}

#[async_trait]
impl SimulatedMarket for PaperMarket {
    async fn set_mock_current_price(&self, pair: &Pair, price: Decimal) {
        self.prices.write().await.insert(pair.clone(), price);
    }

    async fn balances(&self) -> Vec<Balance> {
        self.balances
            .read()
            .await
            .iter()
            .map(|(currency, available)| Balance::new(currency.clone(), *available))
            .collect()
    }
}
