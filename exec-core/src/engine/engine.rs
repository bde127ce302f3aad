//! The execution engine.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::accounts::{Account, AccountState};
use crate::database::ExecutionDatabase;
use crate::error::{DatabaseError, ValidationError};
use crate::orders::{
    AccountId, ClientOrderId, InstrumentId, Order, OrderCommandTimeout, OrderDenied,
    OrderEventAny, OrderError, OrderFilled, OrderStatus, OrderSubmitted, PositionId, StrategyId,
    TimeInForce, TraderId,
};
use crate::positions::{Position, PositionError};

use super::client::{ClientError, ExecutionClient};
use super::clock::Clock;
use super::commands::{
    AmendOrder, CancelOrder, FlattenPosition, SubmitOrder, TradingCommand,
};
use super::{ExecutionEvent, StrategySubscriber};

/// Errors surfaced on the command path.
///
/// Event-path failures (orphan events, state-machine refusals) are logged
/// with context and the event dropped; they never stall the stream.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("order not found: {0}")]
    UnknownOrder(ClientOrderId),

    #[error("order {0} is closed")]
    OrderClosed(ClientOrderId),

    #[error("no open position for strategy {strategy_id} in {instrument_id}")]
    NoOpenPosition {
        strategy_id: StrategyId,
        instrument_id: InstrumentId,
    },

    #[error(transparent)]
    Order(#[from] OrderError),

    #[error(transparent)]
    Position(#[from] PositionError),

    #[error(transparent)]
    Database(#[from] DatabaseError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Venue(#[from] ClientError),
}

/// Configuration for the execution engine.
#[derive(Debug, Clone)]
pub struct ExecutionEngineConfig {
    /// How long an outgoing command may stay unacknowledged before the
    /// engine emits a synthetic `OrderCommandTimeout`
    pub command_timeout: Duration,
    /// Cadence of the timeout sweep in the run loop
    pub timeout_sweep_interval: std::time::Duration,
}

impl Default for ExecutionEngineConfig {
    fn default() -> Self {
        Self {
            command_timeout: Duration::seconds(5),
            timeout_sweep_interval: std::time::Duration::from_millis(500),
        }
    }
}

/// An outgoing command awaiting its acknowledging venue event.
#[derive(Debug, Clone)]
struct InflightCommand {
    strategy_id: StrategyId,
    kind: &'static str,
    deadline: DateTime<Utc>,
}

/// Single-writer engine applying venue events to orders, positions, and
/// accounts, and routing strategy commands to the execution client.
///
/// Per-order event application follows arrival order on the event channel;
/// the engine never reorders. Commands from one strategy are applied in
/// submission order. No ordering is promised across strategies.
pub struct ExecutionEngine {
    config: ExecutionEngineConfig,
    trader_id: TraderId,
    account_id: AccountId,
    clock: Arc<dyn Clock>,
    database: Arc<dyn ExecutionDatabase>,
    client: Arc<dyn ExecutionClient>,
    subscribers: HashMap<StrategyId, Box<dyn StrategySubscriber>>,
    /// Open position per (strategy, instrument); rebuilt by `load_state`
    open_positions: HashMap<(StrategyId, InstrumentId), PositionId>,
    /// Cancels issued while the target order was still in-flight
    pending_cancels: HashMap<ClientOrderId, CancelOrder>,
    inflight: HashMap<ClientOrderId, InflightCommand>,
    position_seq: u64,
}

impl ExecutionEngine {
    pub fn new(
        trader_id: TraderId,
        account_id: AccountId,
        config: ExecutionEngineConfig,
        clock: Arc<dyn Clock>,
        database: Arc<dyn ExecutionDatabase>,
        client: Arc<dyn ExecutionClient>,
    ) -> Self {
        Self {
            config,
            trader_id,
            account_id,
            clock,
            database,
            client,
            subscribers: HashMap::new(),
            open_positions: HashMap::new(),
            pending_cancels: HashMap::new(),
            inflight: HashMap::new(),
            position_seq: 0,
        }
    }

    /// The database this engine owns.
    pub fn database(&self) -> &Arc<dyn ExecutionDatabase> {
        &self.database
    }

    /// Register the event sink for a strategy. The latest registration for a
    /// strategy wins.
    pub fn register_subscriber(
        &mut self,
        strategy_id: StrategyId,
        subscriber: Box<dyn StrategySubscriber>,
    ) {
        self.subscribers.insert(strategy_id, subscriber);
    }

    /// Rebuild the open-position index from the database.
    ///
    /// Run once on start when the engine fronts a persistent database.
    pub async fn load_state(&mut self) -> Result<(), EngineError> {
        self.open_positions.clear();
        let open_ids = self.database.load_open_position_ids().await?;
        for position_id in open_ids {
            if let Some(position) = self.database.load_position(&position_id).await? {
                self.open_positions.insert(
                    (position.strategy_id.clone(), position.instrument_id.clone()),
                    position_id,
                );
            }
        }
        info!(
            trader_id = %self.trader_id,
            open_positions = self.open_positions.len(),
            "engine state loaded"
        );
        Ok(())
    }

    /// Consume commands and venue events until both channels close.
    ///
    /// All state mutation happens on this task. Venue events are biased over
    /// commands so reconciliation never falls behind submissions.
    pub async fn run(
        mut self,
        mut command_rx: mpsc::UnboundedReceiver<TradingCommand>,
        mut event_rx: mpsc::UnboundedReceiver<ExecutionEvent>,
    ) {
        let mut sweep = tokio::time::interval(self.config.timeout_sweep_interval);
        sweep.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        info!(trader_id = %self.trader_id, "execution engine started");
        loop {
            tokio::select! {
                biased;
                maybe_event = event_rx.recv() => match maybe_event {
                    Some(event) => {
                        if let Err(e) = self.process(event).await {
                            error!(error = %e, "event processing failed");
                        }
                    }
                    None => break,
                },
                maybe_command = command_rx.recv() => match maybe_command {
                    Some(command) => {
                        let kind = command.kind();
                        if let Err(e) = self.execute(command).await {
                            warn!(command = kind, error = %e, "command failed");
                        }
                    }
                    None => break,
                },
                _ = sweep.tick() => self.check_timeouts().await,
            }
        }
        info!(trader_id = %self.trader_id, "execution engine stopped");
    }

    // === Command ingress ===

    /// Validate, record, and forward a strategy command.
    pub async fn execute(&mut self, command: TradingCommand) -> Result<(), EngineError> {
        match command {
            TradingCommand::Submit(cmd) => self.submit_order(cmd).await,
            TradingCommand::Cancel(cmd) => self.cancel_order(cmd).await,
            TradingCommand::Amend(cmd) => self.amend_order(cmd).await,
            TradingCommand::Flatten(cmd) => self.flatten_position(cmd).await,
        }
    }

    async fn submit_order(&mut self, command: SubmitOrder) -> Result<(), EngineError> {
        let mut order = command.order.clone();
        let strategy_id = order.strategy_id.clone();

        if order.status != OrderStatus::Initialized {
            self.deny(&order, "order already submitted");
            return Err(EngineError::OrderClosed(order.client_order_id.clone()));
        }
        if self
            .database
            .load_order(&order.client_order_id)
            .await?
            .is_some()
        {
            self.deny(&order, "duplicate client order id");
            return Err(DatabaseError::already_exists("Order", order.client_order_id.as_str()).into());
        }

        let submitted: OrderEventAny = OrderSubmitted::new(
            order.client_order_id.clone(),
            self.account_id.clone(),
            self.clock.utc_now(),
        )
        .into();
        order.apply(&submitted)?;
        self.database.add_order(&order).await?;

        self.track_inflight(
            order.client_order_id.clone(),
            strategy_id.clone(),
            "SUBMIT_ORDER",
        );
        self.client.send(&TradingCommand::Submit(command)).await?;
        self.publish(&strategy_id, &ExecutionEvent::Order(submitted));
        Ok(())
    }

    async fn cancel_order(&mut self, command: CancelOrder) -> Result<(), EngineError> {
        let order = self
            .database
            .load_order(&command.client_order_id)
            .await?
            .ok_or_else(|| EngineError::UnknownOrder(command.client_order_id.clone()))?;
        if order.is_closed() {
            return Err(EngineError::OrderClosed(command.client_order_id.clone()));
        }

        if order.status == OrderStatus::Submitted {
            // Venue has not acknowledged yet: queue the cancel, it is emitted
            // on OrderAccepted and discarded on OrderRejected
            debug!(client_order_id = %command.client_order_id, "cancel queued behind venue ack");
            self.pending_cancels
                .insert(command.client_order_id.clone(), command);
            return Ok(());
        }

        self.track_inflight(
            command.client_order_id.clone(),
            command.strategy_id.clone(),
            "CANCEL_ORDER",
        );
        self.client.send(&TradingCommand::Cancel(command)).await?;
        Ok(())
    }

    async fn amend_order(&mut self, command: AmendOrder) -> Result<(), EngineError> {
        let order = self
            .database
            .load_order(&command.client_order_id)
            .await?
            .ok_or_else(|| EngineError::UnknownOrder(command.client_order_id.clone()))?;
        if order.is_closed() {
            return Err(EngineError::OrderClosed(command.client_order_id.clone()));
        }
        if !order.order_type.supports_amendment() {
            return Err(OrderError::AmendNotSupported {
                order_id: order.client_order_id.clone(),
                order_type: order.order_type,
            }
            .into());
        }
        if let Some(quantity) = command.quantity {
            if quantity < order.filled_qty {
                return Err(OrderError::QuantityBelowFilled {
                    order_id: order.client_order_id.clone(),
                    quantity,
                    filled_qty: order.filled_qty,
                }
                .into());
            }
        }

        self.track_inflight(
            command.client_order_id.clone(),
            command.strategy_id.clone(),
            "AMEND_ORDER",
        );
        self.client.send(&TradingCommand::Amend(command)).await?;
        Ok(())
    }

    async fn flatten_position(&mut self, command: FlattenPosition) -> Result<(), EngineError> {
        let key = (command.strategy_id.clone(), command.instrument_id.clone());
        let position_id =
            self.open_positions
                .get(&key)
                .cloned()
                .ok_or_else(|| EngineError::NoOpenPosition {
                    strategy_id: command.strategy_id.clone(),
                    instrument_id: command.instrument_id.clone(),
                })?;
        let position = self
            .database
            .load_position(&position_id)
            .await?
            .ok_or_else(|| {
                EngineError::Database(DatabaseError::not_found("Position", position_id.as_str()))
            })?;
        let entry_side = position
            .side
            .entry_side()
            .ok_or_else(|| EngineError::NoOpenPosition {
                strategy_id: command.strategy_id.clone(),
                instrument_id: command.instrument_id.clone(),
            })?;

        let now = self.clock.utc_now();
        let order = Order::market(
            command.instrument_id.clone(),
            entry_side.opposite(),
            position.quantity,
        )
        .with_strategy_id(command.strategy_id.clone())
        .with_time_in_force(TimeInForce::IOC)
        .with_ts_init(now)
        .build()?;
        info!(
            position_id = %position_id,
            client_order_id = %order.client_order_id,
            "flattening position"
        );
        self.submit_order(SubmitOrder::new(order, now)).await
    }

    // === Event ingress ===

    /// Apply one venue event: locate or create the target entity, run it
    /// through the state machine, persist, then publish to subscribers.
    pub async fn process(&mut self, event: ExecutionEvent) -> Result<(), EngineError> {
        match event {
            ExecutionEvent::Order(event) => self.process_order_event(event).await,
            ExecutionEvent::Account(state) => self.process_account_state(state).await,
            ExecutionEvent::CommandTimeout(timeout) => {
                // Engine-origin notification; nothing to apply
                let strategy_id = timeout.strategy_id.clone();
                self.publish(&strategy_id, &ExecutionEvent::CommandTimeout(timeout));
                Ok(())
            }
        }
    }

    async fn process_order_event(&mut self, event: OrderEventAny) -> Result<(), EngineError> {
        let client_order_id = event.client_order_id().clone();
        let mut order = match self.database.load_order(&client_order_id).await? {
            Some(order) => order,
            None => {
                if let OrderEventAny::Initialized(init) = &event {
                    let order = Order::from_initialized(init);
                    self.database.add_order(&order).await?;
                    let strategy_id = order.strategy_id.clone();
                    self.publish(&strategy_id, &ExecutionEvent::Order(event));
                    return Ok(());
                }
                warn!(
                    client_order_id = %client_order_id,
                    kind = event.kind(),
                    "orphan event dropped"
                );
                return Ok(());
            }
        };

        // Any venue response for this order resolves its outstanding command
        self.inflight.remove(&client_order_id);

        if let Err(e) = order.apply(&event) {
            error!(
                client_order_id = %client_order_id,
                kind = event.kind(),
                status = %order.status,
                error = %e,
                "event refused by state machine, dropped"
            );
            return Ok(());
        }

        self.database.update_order(&order).await?;

        match &event {
            OrderEventAny::Accepted(_) => {
                if let Some(cancel) = self.pending_cancels.remove(&client_order_id) {
                    debug!(client_order_id = %client_order_id, "emitting queued cancel");
                    self.track_inflight(
                        client_order_id.clone(),
                        cancel.strategy_id.clone(),
                        "CANCEL_ORDER",
                    );
                    self.client.send(&TradingCommand::Cancel(cancel)).await?;
                }
            }
            OrderEventAny::Rejected(_) => {
                if self.pending_cancels.remove(&client_order_id).is_some() {
                    debug!(
                        client_order_id = %client_order_id,
                        "queued cancel discarded, order rejected"
                    );
                }
            }
            OrderEventAny::Filled(fill) => {
                self.apply_fill_to_position(fill).await?;
            }
            _ => {}
        }

        let strategy_id = order.strategy_id.clone();
        self.publish(&strategy_id, &ExecutionEvent::Order(event));
        Ok(())
    }

    async fn apply_fill_to_position(&mut self, fill: &OrderFilled) -> Result<(), EngineError> {
        let key = (fill.strategy_id.clone(), fill.instrument_id.clone());
        match self.open_positions.get(&key).cloned() {
            Some(position_id) => {
                let mut position =
                    self.database
                        .load_position(&position_id)
                        .await?
                        .ok_or_else(|| {
                            EngineError::Database(DatabaseError::not_found(
                                "Position",
                                position_id.as_str(),
                            ))
                        })?;
                if let Err(e) = position.apply_fill(fill) {
                    error!(
                        position_id = %position_id,
                        trade_id = %fill.trade_id,
                        error = %e,
                        "fill refused by position, dropped"
                    );
                    return Ok(());
                }
                self.database.update_position(&position).await?;
                if position.is_flat() {
                    self.open_positions.remove(&key);
                }
            }
            None => {
                let position_id = self.next_position_id(&fill.instrument_id);
                let position = Position::open(position_id.clone(), fill)?;
                self.database.add_position(&position).await?;
                debug!(position_id = %position_id, side = %position.side, "position opened");
                if position.is_open() {
                    self.open_positions.insert(key, position_id);
                }
            }
        }
        Ok(())
    }

    async fn process_account_state(&mut self, state: AccountState) -> Result<(), EngineError> {
        match self.database.load_account(&state.account_id).await? {
            Some(mut account) => {
                account.apply_state(&state);
                self.database.update_account(&account).await?;
            }
            None => {
                let account = Account::from_state(&state);
                self.database.add_account(&account).await?;
                info!(account_id = %account.account_id, "account created");
            }
        }
        self.publish_all(&ExecutionEvent::Account(state));
        Ok(())
    }

    // === Timeouts ===

    /// Emit synthetic `OrderCommandTimeout`s for commands whose deadline has
    /// passed. Order state is never speculatively mutated.
    pub async fn check_timeouts(&mut self) {
        let now = self.clock.utc_now();
        let expired: Vec<(ClientOrderId, InflightCommand)> = self
            .inflight
            .iter()
            .filter(|(_, command)| command.deadline <= now)
            .map(|(id, command)| (id.clone(), command.clone()))
            .collect();
        for (client_order_id, command) in expired {
            self.inflight.remove(&client_order_id);
            warn!(
                client_order_id = %client_order_id,
                command = command.kind,
                "command unresolved past timeout"
            );
            let timeout = OrderCommandTimeout::new(
                client_order_id,
                command.strategy_id.clone(),
                command.kind,
                now,
            );
            self.publish(
                &command.strategy_id,
                &ExecutionEvent::CommandTimeout(timeout),
            );
        }
    }

    // === Internals ===

    fn track_inflight(
        &mut self,
        client_order_id: ClientOrderId,
        strategy_id: StrategyId,
        kind: &'static str,
    ) {
        let deadline = self.clock.utc_now() + self.config.command_timeout;
        self.inflight.insert(
            client_order_id,
            InflightCommand {
                strategy_id,
                kind,
                deadline,
            },
        );
    }

    fn next_position_id(&mut self, instrument_id: &InstrumentId) -> PositionId {
        self.position_seq += 1;
        PositionId::new(format!(
            "P-{}-{}-{}",
            self.trader_id, instrument_id.symbol, self.position_seq
        ))
        .unwrap_or_else(|_| PositionId::generate())
    }

    /// Report a refused submission to the originating strategy without
    /// touching persisted state.
    fn deny(&mut self, order: &Order, reason: &str) {
        warn!(client_order_id = %order.client_order_id, reason, "order denied");
        let denied = OrderDenied::new(
            order.client_order_id.clone(),
            reason,
            self.clock.utc_now(),
        );
        let strategy_id = order.strategy_id.clone();
        self.publish(&strategy_id, &ExecutionEvent::Order(denied.into()));
    }

    fn publish(&mut self, strategy_id: &StrategyId, event: &ExecutionEvent) {
        if let Some(subscriber) = self.subscribers.get_mut(strategy_id) {
            subscriber.on_event(event);
        }
    }

    fn publish_all(&mut self, event: &ExecutionEvent) {
        for subscriber in self.subscribers.values_mut() {
            subscriber.on_event(event);
        }
    }
}
