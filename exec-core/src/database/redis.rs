//! Redis-backed execution database.
//!
//! Records are serialized with `serde_json` and stored one key per record:
//!
//! ```text
//! Trader-{trader_id}:Accounts:{account_id}
//! Trader-{trader_id}:Orders:{cl_ord_id}
//! Trader-{trader_id}:Positions:{position_id}
//! Trader-{trader_id}:Strategies:{strategy_id}:State   (hash of name -> bytes)
//! Trader-{trader_id}:Index:OrdersWorking              (set of cl_ord_id)
//! Trader-{trader_id}:Index:PositionsOpen              (set of position_id)
//! ```
//!
//! Writes retry transient store errors with bounded exponential backoff and
//! surface [`DatabaseError::Unavailable`] on exhaustion; the engine treats
//! that as fatal for the affected operation only.

use std::collections::{HashMap, HashSet};
use std::time::Duration;

use async_trait::async_trait;
use redis::{Client as RedisClient, Commands, Connection, ErrorKind, RedisError, RedisResult};
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::accounts::Account;
use crate::error::{DatabaseError, DatabaseResult};
use crate::orders::{AccountId, ClientOrderId, Order, PositionId, StrategyId, TraderId};
use crate::positions::Position;

use super::ExecutionDatabase;

/// Bounded retry policy for store writes.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Maximum attempts per operation
    pub max_attempts: u32,
    /// Backoff before the second attempt; doubles per retry
    pub initial_backoff: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff: Duration::from_millis(50),
        }
    }
}

/// Key layout under a single trader namespace.
#[derive(Debug, Clone)]
struct KeySpace {
    trader_id: TraderId,
}

impl KeySpace {
    fn account(&self, account_id: &AccountId) -> String {
        format!("Trader-{}:Accounts:{}", self.trader_id, account_id)
    }

    fn order(&self, client_order_id: &ClientOrderId) -> String {
        format!("Trader-{}:Orders:{}", self.trader_id, client_order_id)
    }

    fn position(&self, position_id: &PositionId) -> String {
        format!("Trader-{}:Positions:{}", self.trader_id, position_id)
    }

    fn strategy(&self, strategy_id: &StrategyId) -> String {
        format!("Trader-{}:Strategies:{}:State", self.trader_id, strategy_id)
    }

    fn accounts_pattern(&self) -> String {
        format!("Trader-{}:Accounts:*", self.trader_id)
    }

    fn orders_pattern(&self) -> String {
        format!("Trader-{}:Orders:*", self.trader_id)
    }

    fn positions_pattern(&self) -> String {
        format!("Trader-{}:Positions:*", self.trader_id)
    }

    fn all_pattern(&self) -> String {
        format!("Trader-{}:*", self.trader_id)
    }

    fn orders_working(&self) -> String {
        format!("Trader-{}:Index:OrdersWorking", self.trader_id)
    }

    fn positions_open(&self) -> String {
        format!("Trader-{}:Index:PositionsOpen", self.trader_id)
    }
}

fn is_transient(err: &RedisError) -> bool {
    err.is_io_error()
        || err.is_timeout()
        || err.is_connection_dropped()
        || matches!(err.kind(), ErrorKind::TryAgain | ErrorKind::BusyLoadingError)
}

/// Redis-backed execution database with per-record JSON serialization.
pub struct RedisExecutionDatabase {
    #[allow(dead_code)] // Keep client alive to maintain connection
    client: RedisClient,
    connection: Mutex<Connection>,
    keys: KeySpace,
    retry: RetryConfig,
}

impl RedisExecutionDatabase {
    /// Connect to the store.
    pub fn connect(
        redis_url: &str,
        trader_id: TraderId,
        retry: RetryConfig,
    ) -> DatabaseResult<Self> {
        let client = RedisClient::open(redis_url)
            .map_err(|e| DatabaseError::Connection(e.to_string()))?;
        let connection = client
            .get_connection()
            .map_err(|e| DatabaseError::Connection(e.to_string()))?;
        debug!(url = redis_url, trader_id = %trader_id, "connected execution database");
        Ok(Self {
            client,
            connection: Mutex::new(connection),
            keys: KeySpace { trader_id },
            retry,
        })
    }

    /// Run a store operation with bounded exponential backoff on transient
    /// errors.
    async fn with_retry<T>(
        &self,
        op: &'static str,
        mut f: impl FnMut(&mut Connection) -> RedisResult<T>,
    ) -> DatabaseResult<T> {
        let mut backoff = self.retry.initial_backoff;
        let mut attempt = 1;
        loop {
            let result = {
                let mut conn = self.connection.lock().await;
                f(&mut conn)
            };
            match result {
                Ok(value) => return Ok(value),
                Err(e) if is_transient(&e) => {
                    if attempt >= self.retry.max_attempts {
                        return Err(DatabaseError::Unavailable {
                            attempts: attempt,
                            reason: e.to_string(),
                        });
                    }
                    warn!(op, attempt, error = %e, "transient store error, retrying");
                    tokio::time::sleep(backoff).await;
                    backoff *= 2;
                    attempt += 1;
                }
                Err(e) => return Err(DatabaseError::Connection(e.to_string())),
            }
        }
    }

    async fn load_all_json(&self, op: &'static str, pattern: String) -> DatabaseResult<Vec<String>> {
        self.with_retry(op, move |conn| {
            let keys: Vec<String> = conn.keys(&pattern)?;
            let mut records = Vec::with_capacity(keys.len());
            for key in keys {
                let json: String = conn.get(&key)?;
                records.push(json);
            }
            Ok(records)
        })
        .await
    }

    /// Write a record, optionally refreshing its index-set membership.
    async fn put_record(
        &self,
        op: &'static str,
        key: String,
        json: String,
        index: Option<(String, String, bool)>,
        must_exist: bool,
    ) -> DatabaseResult<bool> {
        self.with_retry(op, move |conn| {
            let exists: bool = conn.exists(&key)?;
            if exists != must_exist {
                return Ok(false);
            }
            let _: () = conn.set(&key, &json)?;
            if let Some((index_key, member, in_index)) = &index {
                if *in_index {
                    let _: () = conn.sadd(index_key, member)?;
                } else {
                    let _: () = conn.srem(index_key, member)?;
                }
            }
            Ok(true)
        })
        .await
    }
}

#[async_trait]
impl ExecutionDatabase for RedisExecutionDatabase {
    async fn load_accounts(&self) -> DatabaseResult<HashMap<AccountId, Account>> {
        let records = self
            .load_all_json("load_accounts", self.keys.accounts_pattern())
            .await?;
        let mut accounts = HashMap::with_capacity(records.len());
        for json in records {
            let account: Account = serde_json::from_str(&json)?;
            accounts.insert(account.account_id.clone(), account);
        }
        Ok(accounts)
    }

    async fn load_orders(&self) -> DatabaseResult<HashMap<ClientOrderId, Order>> {
        let records = self
            .load_all_json("load_orders", self.keys.orders_pattern())
            .await?;
        let mut orders = HashMap::with_capacity(records.len());
        for json in records {
            let order: Order = serde_json::from_str(&json)?;
            orders.insert(order.client_order_id.clone(), order);
        }
        Ok(orders)
    }

    async fn load_positions(&self) -> DatabaseResult<HashMap<PositionId, Position>> {
        let records = self
            .load_all_json("load_positions", self.keys.positions_pattern())
            .await?;
        let mut positions = HashMap::with_capacity(records.len());
        for json in records {
            let position: Position = serde_json::from_str(&json)?;
            positions.insert(position.position_id.clone(), position);
        }
        Ok(positions)
    }

    async fn load_account(&self, account_id: &AccountId) -> DatabaseResult<Option<Account>> {
        let key = self.keys.account(account_id);
        let json: Option<String> = self
            .with_retry("load_account", move |conn| conn.get(&key))
            .await?;
        json.map(|j| serde_json::from_str(&j))
            .transpose()
            .map_err(Into::into)
    }

    async fn load_order(&self, client_order_id: &ClientOrderId) -> DatabaseResult<Option<Order>> {
        let key = self.keys.order(client_order_id);
        let json: Option<String> = self
            .with_retry("load_order", move |conn| conn.get(&key))
            .await?;
        json.map(|j| serde_json::from_str(&j))
            .transpose()
            .map_err(Into::into)
    }

    async fn load_position(&self, position_id: &PositionId) -> DatabaseResult<Option<Position>> {
        let key = self.keys.position(position_id);
        let json: Option<String> = self
            .with_retry("load_position", move |conn| conn.get(&key))
            .await?;
        json.map(|j| serde_json::from_str(&j))
            .transpose()
            .map_err(Into::into)
    }

    async fn load_strategy(
        &self,
        strategy_id: &StrategyId,
    ) -> DatabaseResult<HashMap<String, Vec<u8>>> {
        let key = self.keys.strategy(strategy_id);
        self.with_retry("load_strategy", move |conn| conn.hgetall(&key))
            .await
    }

    async fn add_account(&self, account: &Account) -> DatabaseResult<()> {
        let key = self.keys.account(&account.account_id);
        let json = serde_json::to_string(account)?;
        let created = self
            .put_record("add_account", key, json, None, false)
            .await?;
        if !created {
            return Err(DatabaseError::already_exists(
                "Account",
                account.account_id.as_str(),
            ));
        }
        Ok(())
    }

    async fn add_order(&self, order: &Order) -> DatabaseResult<()> {
        let key = self.keys.order(&order.client_order_id);
        let json = serde_json::to_string(order)?;
        let index = Some((
            self.keys.orders_working(),
            order.client_order_id.to_string(),
            !order.is_closed(),
        ));
        let created = self.put_record("add_order", key, json, index, false).await?;
        if !created {
            return Err(DatabaseError::already_exists(
                "Order",
                order.client_order_id.as_str(),
            ));
        }
        Ok(())
    }

    async fn add_position(&self, position: &Position) -> DatabaseResult<()> {
        let key = self.keys.position(&position.position_id);
        let json = serde_json::to_string(position)?;
        let index = Some((
            self.keys.positions_open(),
            position.position_id.to_string(),
            !position.is_flat(),
        ));
        let created = self
            .put_record("add_position", key, json, index, false)
            .await?;
        if !created {
            return Err(DatabaseError::already_exists(
                "Position",
                position.position_id.as_str(),
            ));
        }
        Ok(())
    }

    async fn update_account(&self, account: &Account) -> DatabaseResult<()> {
        let key = self.keys.account(&account.account_id);
        let json = serde_json::to_string(account)?;
        let updated = self
            .put_record("update_account", key, json, None, true)
            .await?;
        if !updated {
            return Err(DatabaseError::not_found(
                "Account",
                account.account_id.as_str(),
            ));
        }
        Ok(())
    }

    async fn update_order(&self, order: &Order) -> DatabaseResult<()> {
        let key = self.keys.order(&order.client_order_id);
        let json = serde_json::to_string(order)?;
        let index = Some((
            self.keys.orders_working(),
            order.client_order_id.to_string(),
            !order.is_closed(),
        ));
        let updated = self
            .put_record("update_order", key, json, index, true)
            .await?;
        if !updated {
            return Err(DatabaseError::not_found(
                "Order",
                order.client_order_id.as_str(),
            ));
        }
        Ok(())
    }

    async fn update_position(&self, position: &Position) -> DatabaseResult<()> {
        let key = self.keys.position(&position.position_id);
        let json = serde_json::to_string(position)?;
        let index = Some((
            self.keys.positions_open(),
            position.position_id.to_string(),
            !position.is_flat(),
        ));
        let updated = self
            .put_record("update_position", key, json, index, true)
            .await?;
        if !updated {
            return Err(DatabaseError::not_found(
                "Position",
                position.position_id.as_str(),
            ));
        }
        Ok(())
    }

    async fn update_strategy(
        &self,
        strategy_id: &StrategyId,
        state: &HashMap<String, Vec<u8>>,
    ) -> DatabaseResult<()> {
        let key = self.keys.strategy(strategy_id);
        let state = state.clone();
        self.with_retry("update_strategy", move |conn| {
            let _: () = conn.del(&key)?;
            for (name, bytes) in &state {
                let _: () = conn.hset(&key, name, bytes.as_slice())?;
            }
            Ok(())
        })
        .await
    }

    async fn delete_strategy(&self, strategy_id: &StrategyId) -> DatabaseResult<()> {
        let key = self.keys.strategy(strategy_id);
        self.with_retry("delete_strategy", move |conn| conn.del(&key))
            .await
    }

    async fn load_orders_for_strategy(
        &self,
        strategy_id: &StrategyId,
    ) -> DatabaseResult<Vec<Order>> {
        let orders = self.load_orders().await?;
        Ok(orders
            .into_values()
            .filter(|o| &o.strategy_id == strategy_id)
            .collect())
    }

    async fn load_positions_for_strategy(
        &self,
        strategy_id: &StrategyId,
    ) -> DatabaseResult<Vec<Position>> {
        let positions = self.load_positions().await?;
        Ok(positions
            .into_values()
            .filter(|p| &p.strategy_id == strategy_id)
            .collect())
    }

    async fn load_working_order_ids(&self) -> DatabaseResult<HashSet<ClientOrderId>> {
        let key = self.keys.orders_working();
        let members: Vec<String> = self
            .with_retry("load_working_order_ids", move |conn| conn.smembers(&key))
            .await?;
        members
            .into_iter()
            .map(|m| {
                ClientOrderId::new(m).map_err(|e| DatabaseError::Serialization(e.to_string()))
            })
            .collect()
    }

    async fn load_open_position_ids(&self) -> DatabaseResult<HashSet<PositionId>> {
        let key = self.keys.positions_open();
        let members: Vec<String> = self
            .with_retry("load_open_position_ids", move |conn| conn.smembers(&key))
            .await?;
        members
            .into_iter()
            .map(|m| PositionId::new(m).map_err(|e| DatabaseError::Serialization(e.to_string())))
            .collect()
    }

    async fn flush(&self) -> DatabaseResult<()> {
        let pattern = self.keys.all_pattern();
        self.with_retry("flush", move |conn| {
            let keys: Vec<String> = conn.keys(&pattern)?;
            if !keys.is_empty() {
                let _: () = conn.del(&keys)?;
            }
            Ok(())
        })
        .await
    }
}
