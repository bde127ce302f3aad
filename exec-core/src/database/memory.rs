//! In-memory execution database.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::accounts::Account;
use crate::error::{DatabaseError, DatabaseResult};
use crate::orders::{AccountId, ClientOrderId, Order, PositionId, StrategyId};
use crate::positions::Position;

use super::ExecutionDatabase;

#[derive(Debug, Default)]
struct MemoryStore {
    accounts: HashMap<AccountId, Account>,
    orders: HashMap<ClientOrderId, Order>,
    positions: HashMap<PositionId, Position>,
    strategies: HashMap<StrategyId, HashMap<String, Vec<u8>>>,
    orders_by_strategy: HashMap<StrategyId, HashSet<ClientOrderId>>,
    positions_by_strategy: HashMap<StrategyId, HashSet<PositionId>>,
    orders_working: HashSet<ClientOrderId>,
    positions_open: HashSet<PositionId>,
}

impl MemoryStore {
    fn refresh_order_indices(&mut self, order: &Order) {
        self.orders_by_strategy
            .entry(order.strategy_id.clone())
            .or_default()
            .insert(order.client_order_id.clone());
        if order.is_closed() {
            self.orders_working.remove(&order.client_order_id);
        } else {
            self.orders_working.insert(order.client_order_id.clone());
        }
    }

    fn refresh_position_indices(&mut self, position: &Position) {
        self.positions_by_strategy
            .entry(position.strategy_id.clone())
            .or_default()
            .insert(position.position_id.clone());
        if position.is_flat() {
            self.positions_open.remove(&position.position_id);
        } else {
            self.positions_open.insert(position.position_id.clone());
        }
    }
}

/// In-memory execution database.
///
/// Authoritative in single-process deployments. All lookups return clones of
/// the stored records, so readers never observe in-place mutation.
#[derive(Debug, Default)]
pub struct InMemoryExecutionDatabase {
    inner: RwLock<MemoryStore>,
}

impl InMemoryExecutionDatabase {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ExecutionDatabase for InMemoryExecutionDatabase {
    async fn load_accounts(&self) -> DatabaseResult<HashMap<AccountId, Account>> {
        Ok(self.inner.read().await.accounts.clone())
    }

    async fn load_orders(&self) -> DatabaseResult<HashMap<ClientOrderId, Order>> {
        Ok(self.inner.read().await.orders.clone())
    }

    async fn load_positions(&self) -> DatabaseResult<HashMap<PositionId, Position>> {
        Ok(self.inner.read().await.positions.clone())
    }

    async fn load_account(&self, account_id: &AccountId) -> DatabaseResult<Option<Account>> {
        Ok(self.inner.read().await.accounts.get(account_id).cloned())
    }

    async fn load_order(&self, client_order_id: &ClientOrderId) -> DatabaseResult<Option<Order>> {
        Ok(self.inner.read().await.orders.get(client_order_id).cloned())
    }

    async fn load_position(&self, position_id: &PositionId) -> DatabaseResult<Option<Position>> {
        Ok(self.inner.read().await.positions.get(position_id).cloned())
    }

    async fn load_strategy(
        &self,
        strategy_id: &StrategyId,
    ) -> DatabaseResult<HashMap<String, Vec<u8>>> {
        Ok(self
            .inner
            .read()
            .await
            .strategies
            .get(strategy_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn add_account(&self, account: &Account) -> DatabaseResult<()> {
        let mut store = self.inner.write().await;
        if store.accounts.contains_key(&account.account_id) {
            return Err(DatabaseError::already_exists(
                "Account",
                account.account_id.as_str(),
            ));
        }
        store
            .accounts
            .insert(account.account_id.clone(), account.clone());
        Ok(())
    }

    async fn add_order(&self, order: &Order) -> DatabaseResult<()> {
        let mut store = self.inner.write().await;
        if store.orders.contains_key(&order.client_order_id) {
            return Err(DatabaseError::already_exists(
                "Order",
                order.client_order_id.as_str(),
            ));
        }
        store
            .orders
            .insert(order.client_order_id.clone(), order.clone());
        store.refresh_order_indices(order);
        Ok(())
    }

    async fn add_position(&self, position: &Position) -> DatabaseResult<()> {
        let mut store = self.inner.write().await;
        if store.positions.contains_key(&position.position_id) {
            return Err(DatabaseError::already_exists(
                "Position",
                position.position_id.as_str(),
            ));
        }
        store
            .positions
            .insert(position.position_id.clone(), position.clone());
        store.refresh_position_indices(position);
        Ok(())
    }

    async fn update_account(&self, account: &Account) -> DatabaseResult<()> {
        let mut store = self.inner.write().await;
        if !store.accounts.contains_key(&account.account_id) {
            return Err(DatabaseError::not_found(
                "Account",
                account.account_id.as_str(),
            ));
        }
        store
            .accounts
            .insert(account.account_id.clone(), account.clone());
        Ok(())
    }

    async fn update_order(&self, order: &Order) -> DatabaseResult<()> {
        let mut store = self.inner.write().await;
        if !store.orders.contains_key(&order.client_order_id) {
            return Err(DatabaseError::not_found(
                "Order",
                order.client_order_id.as_str(),
            ));
        }
        store
            .orders
            .insert(order.client_order_id.clone(), order.clone());
        store.refresh_order_indices(order);
        Ok(())
    }

    async fn update_position(&self, position: &Position) -> DatabaseResult<()> {
        let mut store = self.inner.write().await;
        if !store.positions.contains_key(&position.position_id) {
            return Err(DatabaseError::not_found(
                "Position",
                position.position_id.as_str(),
            ));
        }
        store
            .positions
            .insert(position.position_id.clone(), position.clone());
        store.refresh_position_indices(position);
        Ok(())
    }

    async fn update_strategy(
        &self,
        strategy_id: &StrategyId,
        state: &HashMap<String, Vec<u8>>,
    ) -> DatabaseResult<()> {
        let mut store = self.inner.write().await;
        store.strategies.insert(strategy_id.clone(), state.clone());
        Ok(())
    }

    async fn delete_strategy(&self, strategy_id: &StrategyId) -> DatabaseResult<()> {
        let mut store = self.inner.write().await;
        store.strategies.remove(strategy_id);
        Ok(())
    }

    async fn load_orders_for_strategy(
        &self,
        strategy_id: &StrategyId,
    ) -> DatabaseResult<Vec<Order>> {
        let store = self.inner.read().await;
        Ok(store
            .orders_by_strategy
            .get(strategy_id)
            .map(|ids| {
                ids.iter()
                    .filter_map(|id| store.orders.get(id).cloned())
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn load_positions_for_strategy(
        &self,
        strategy_id: &StrategyId,
    ) -> DatabaseResult<Vec<Position>> {
        let store = self.inner.read().await;
        Ok(store
            .positions_by_strategy
            .get(strategy_id)
            .map(|ids| {
                ids.iter()
                    .filter_map(|id| store.positions.get(id).cloned())
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn load_working_order_ids(&self) -> DatabaseResult<HashSet<ClientOrderId>> {
        Ok(self.inner.read().await.orders_working.clone())
    }

    async fn load_open_position_ids(&self) -> DatabaseResult<HashSet<PositionId>> {
        Ok(self.inner.read().await.positions_open.clone())
    }

    async fn flush(&self) -> DatabaseResult<()> {
        let mut store = self.inner.write().await;
        *store = MemoryStore::default();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orders::{
        InstrumentId, OrderCancelled, OrderSide, OrderSubmitted, Quantity, StrategyId,
    };
    use chrono::{TimeZone, Utc};
    use rust_decimal_macros::dec;

    fn order(cl: &str, strategy: &str) -> Order {
        Order::market(
            InstrumentId::new("BTCUSDT", "BINANCE").unwrap(),
            OrderSide::Buy,
            Quantity::from_decimal(dec!(1)).unwrap(),
        )
        .with_strategy_id(StrategyId::new(strategy).unwrap())
        .with_client_order_id(ClientOrderId::new(cl).unwrap())
        .with_ts_init(Utc.with_ymd_and_hms(2026, 2, 1, 12, 0, 0).unwrap())
        .build()
        .unwrap()
    }

    #[tokio::test]
    async fn test_add_then_load_round_trip() {
        let db = InMemoryExecutionDatabase::new();
        let order = order("O-1", "S-1");
        db.add_order(&order).await.unwrap();

        let loaded = db.load_order(&order.client_order_id).await.unwrap();
        assert_eq!(loaded, Some(order));
    }

    #[tokio::test]
    async fn test_add_duplicate_fails() {
        let db = InMemoryExecutionDatabase::new();
        let order = order("O-1", "S-1");
        db.add_order(&order).await.unwrap();
        assert!(matches!(
            db.add_order(&order).await,
            Err(DatabaseError::AlreadyExists { .. })
        ));
    }

    #[tokio::test]
    async fn test_update_missing_fails() {
        let db = InMemoryExecutionDatabase::new();
        let order = order("O-1", "S-1");
        assert!(matches!(
            db.update_order(&order).await,
            Err(DatabaseError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_working_index_tracks_terminal_transition() {
        let db = InMemoryExecutionDatabase::new();
        let mut order = order("O-1", "S-1");
        db.add_order(&order).await.unwrap();
        assert!(db
            .load_working_order_ids()
            .await
            .unwrap()
            .contains(&order.client_order_id));

        let now = Utc.with_ymd_and_hms(2026, 2, 1, 12, 0, 1).unwrap();
        order
            .apply(
                &OrderSubmitted::new(
                    order.client_order_id.clone(),
                    AccountId::new("ACC-1").unwrap(),
                    now,
                )
                .into(),
            )
            .unwrap();
        db.update_order(&order).await.unwrap();
        assert!(db
            .load_working_order_ids()
            .await
            .unwrap()
            .contains(&order.client_order_id));

        order
            .apply(
                &OrderCancelled::new(
                    order.client_order_id.clone(),
                    None,
                    AccountId::new("ACC-1").unwrap(),
                    now,
                )
                .into(),
            )
            .unwrap();
        db.update_order(&order).await.unwrap();
        assert!(!db
            .load_working_order_ids()
            .await
            .unwrap()
            .contains(&order.client_order_id));

        // The record itself is retained for audit
        assert!(db.load_order(&order.client_order_id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_orders_by_strategy_index() {
        let db = InMemoryExecutionDatabase::new();
        db.add_order(&order("O-1", "S-1")).await.unwrap();
        db.add_order(&order("O-2", "S-1")).await.unwrap();
        db.add_order(&order("O-3", "S-2")).await.unwrap();

        let s1 = db
            .load_orders_for_strategy(&StrategyId::new("S-1").unwrap())
            .await
            .unwrap();
        assert_eq!(s1.len(), 2);
        let s3 = db
            .load_orders_for_strategy(&StrategyId::new("S-3").unwrap())
            .await
            .unwrap();
        assert!(s3.is_empty());
    }

    #[tokio::test]
    async fn test_strategy_state_round_trip() {
        let db = InMemoryExecutionDatabase::new();
        let strategy_id = StrategyId::new("S-1").unwrap();

        let mut state = HashMap::new();
        state.insert("window".to_string(), b"60".to_vec());
        db.update_strategy(&strategy_id, &state).await.unwrap();
        assert_eq!(db.load_strategy(&strategy_id).await.unwrap(), state);

        db.delete_strategy(&strategy_id).await.unwrap();
        assert!(db.load_strategy(&strategy_id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_flush_removes_everything() {
        let db = InMemoryExecutionDatabase::new();
        db.add_order(&order("O-1", "S-1")).await.unwrap();
        db.flush().await.unwrap();
        assert!(db.load_orders().await.unwrap().is_empty());
        assert!(db.load_working_order_ids().await.unwrap().is_empty());
    }
}
