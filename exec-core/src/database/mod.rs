//! Execution database: the key/value view of accounts, orders, positions,
//! and strategy state.
//!
//! Two implementations share one contract:
//! - [`InMemoryExecutionDatabase`] - authoritative in single-process
//!   deployments, no I/O
//! - [`RedisExecutionDatabase`] - persistent variant with per-record JSON
//!   serialization and bounded write retries
//!
//! The engine is the sole writer. Reads from other threads are served by
//! copy-on-read snapshots (lookups return clones).

pub mod memory;
pub mod redis;

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;

use crate::accounts::Account;
use crate::error::DatabaseResult;
use crate::orders::{AccountId, ClientOrderId, Order, PositionId, StrategyId};
use crate::positions::Position;

pub use self::memory::InMemoryExecutionDatabase;
pub use self::redis::{RedisExecutionDatabase, RetryConfig};

/// Uniform contract over the execution state store.
///
/// `add_*` operations fail with `AlreadyExists` when the key is present;
/// `update_*` operations fail with `NotFound` when it is absent. Strategy
/// state is an upsert (there is no separate add). Secondary indices
/// (orders-by-strategy, positions-by-strategy, working orders, open
/// positions) are maintained by every add/update.
#[async_trait]
pub trait ExecutionDatabase: Send + Sync {
    // === Bulk loads ===

    async fn load_accounts(&self) -> DatabaseResult<HashMap<AccountId, Account>>;

    async fn load_orders(&self) -> DatabaseResult<HashMap<ClientOrderId, Order>>;

    async fn load_positions(&self) -> DatabaseResult<HashMap<PositionId, Position>>;

    // === Single-record lookups ===

    async fn load_account(&self, account_id: &AccountId) -> DatabaseResult<Option<Account>>;

    async fn load_order(&self, client_order_id: &ClientOrderId) -> DatabaseResult<Option<Order>>;

    async fn load_position(&self, position_id: &PositionId) -> DatabaseResult<Option<Position>>;

    /// Opaque persisted strategy state, keyed by name.
    async fn load_strategy(
        &self,
        strategy_id: &StrategyId,
    ) -> DatabaseResult<HashMap<String, Vec<u8>>>;

    // === Writes ===

    async fn add_account(&self, account: &Account) -> DatabaseResult<()>;

    async fn add_order(&self, order: &Order) -> DatabaseResult<()>;

    async fn add_position(&self, position: &Position) -> DatabaseResult<()>;

    async fn update_account(&self, account: &Account) -> DatabaseResult<()>;

    async fn update_order(&self, order: &Order) -> DatabaseResult<()>;

    async fn update_position(&self, position: &Position) -> DatabaseResult<()>;

    /// Replace the persisted strategy state wholesale.
    async fn update_strategy(
        &self,
        strategy_id: &StrategyId,
        state: &HashMap<String, Vec<u8>>,
    ) -> DatabaseResult<()>;

    async fn delete_strategy(&self, strategy_id: &StrategyId) -> DatabaseResult<()>;

    // === Index reads ===

    async fn load_orders_for_strategy(
        &self,
        strategy_id: &StrategyId,
    ) -> DatabaseResult<Vec<Order>>;

    async fn load_positions_for_strategy(
        &self,
        strategy_id: &StrategyId,
    ) -> DatabaseResult<Vec<Position>>;

    /// Client order IDs of all non-terminal orders.
    async fn load_working_order_ids(&self) -> DatabaseResult<HashSet<ClientOrderId>>;

    /// Position IDs of all non-flat positions.
    async fn load_open_position_ids(&self) -> DatabaseResult<HashSet<PositionId>>;

    // === Maintenance ===

    /// Remove all records. Test and recovery use only.
    async fn flush(&self) -> DatabaseResult<()>;
}
