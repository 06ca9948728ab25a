use async_trait::async_trait;
use rust_decimal::Decimal;

use crate::{Balance, Candle, Order, Pair, Result};

/// Abstraction over a market a strategy trades on.
///
/// A live exchange adapter implements this directly. The simulation market
/// used by the replayer additionally implements `SimulatedMarket`.
#[async_trait]
pub trait Market: Send + Sync {
    fn name(&self) -> &str;

    /// Fraction of every trade taken as a fee (e.g. 0.0025).
    fn transaction_fee(&self) -> Decimal;

    async fn get_balance(&self, currency: &str) -> Result<Balance>;

    /// Latest one-minute candle for the pair.
    async fn get_last_ticker(&self, pair: &Pair) -> Result<Candle>;

    /// Spend the whole base-currency balance on the market currency.
    async fn buy_max_available(&self, pair: &Pair) -> Result<Order>;

    /// Sell the whole market-currency balance for the base currency.
    async fn sell_max_available(&self, pair: &Pair) -> Result<Order>;
}

/// A market whose current price is injected instead of queried.
#[async_trait]
pub trait SimulatedMarket: Market {
    async fn set_mock_current_price(&self, pair: &Pair, price: Decimal);

    /// Snapshot of all balances, ordered by currency.
    async fn balances(&self) -> Vec<Balance>;
}
