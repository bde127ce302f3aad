//! Shared fixtures for end-to-end engine scenarios.
//!
//! `TestVenue` stands in for the execution client: it records every command
//! the engine forwards and acknowledges immediately, leaving the test script
//! to play the venue's event stream back into the engine.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use rust_decimal::Decimal;

use exec_core::database::{ExecutionDatabase, InMemoryExecutionDatabase};
use exec_core::engine::{
    ClientError, CommandAck, ExecutionClient, ExecutionEngine, ExecutionEngineConfig,
    ExecutionEvent, StrategySubscriber, TestClock, TradingCommand,
};
use exec_core::orders::{
    AccountId, ClientOrderId, InstrumentId, OrderAccepted, OrderEventAny, OrderFilled, OrderSide,
    OrderSubmitted, Price, Quantity, StrategyId, TradeId, TraderId, VenueOrderId,
};

/// Scripted venue: records outbound commands, acknowledges instantly.
#[derive(Default)]
pub struct TestVenue {
    commands: Mutex<Vec<TradingCommand>>,
}

impl TestVenue {
    pub fn commands(&self) -> Vec<TradingCommand> {
        self.commands.lock().unwrap().clone()
    }
}

#[async_trait]
impl ExecutionClient for TestVenue {
    async fn connect(&self) -> Result<(), ClientError> {
        Ok(())
    }

    async fn disconnect(&self) -> Result<(), ClientError> {
        Ok(())
    }

    async fn dispose(&self) -> Result<(), ClientError> {
        Ok(())
    }

    async fn send(&self, command: &TradingCommand) -> Result<CommandAck, ClientError> {
        self.commands.lock().unwrap().push(command.clone());
        Ok(CommandAck {
            command_id: command.command_id(),
            ts_ack: Utc::now(),
        })
    }
}

/// Strategy subscriber that collects every published event.
#[derive(Clone, Default)]
pub struct CollectingStrategy {
    events: Arc<Mutex<Vec<ExecutionEvent>>>,
}

impl CollectingStrategy {
    pub fn events(&self) -> Vec<ExecutionEvent> {
        self.events.lock().unwrap().clone()
    }

    /// Kind names of all collected events, in publish order.
    pub fn kinds(&self) -> Vec<String> {
        self.events()
            .iter()
            .map(|event| match event {
                ExecutionEvent::Order(order_event) => order_event.kind().to_string(),
                ExecutionEvent::Account(_) => "AccountState".to_string(),
                ExecutionEvent::CommandTimeout(_) => "CommandTimeout".to_string(),
            })
            .collect()
    }
}

impl StrategySubscriber for CollectingStrategy {
    fn on_event(&mut self, event: &ExecutionEvent) {
        self.events.lock().unwrap().push(event.clone());
    }
}

/// Everything a scenario needs, wired together.
pub struct Fixture {
    pub engine: ExecutionEngine,
    pub database: Arc<dyn ExecutionDatabase>,
    pub venue: Arc<TestVenue>,
    pub strategy: CollectingStrategy,
    pub clock: Arc<TestClock>,
}

impl Fixture {
    pub fn new() -> Self {
        let clock = Arc::new(TestClock::new(epoch()));
        let venue = Arc::new(TestVenue::default());
        let database: Arc<dyn ExecutionDatabase> = Arc::new(InMemoryExecutionDatabase::new());
        let mut engine = ExecutionEngine::new(
            trader(),
            account(),
            ExecutionEngineConfig::default(),
            clock.clone(),
            database.clone(),
            venue.clone(),
        );
        let strategy = CollectingStrategy::default();
        engine.register_subscriber(strategy_id(), Box::new(strategy.clone()));
        Self {
            engine,
            database,
            venue,
            strategy,
            clock,
        }
    }
}

impl Default for Fixture {
    fn default() -> Self {
        Self::new()
    }
}

// === Canonical test identities ===

pub fn epoch() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 2, 1, 12, 0, 0).unwrap()
}

pub fn trader() -> TraderId {
    TraderId::new("TRADER-001").unwrap()
}

pub fn account() -> AccountId {
    AccountId::new("ACC-1").unwrap()
}

pub fn strategy_id() -> StrategyId {
    StrategyId::new("S-1").unwrap()
}

pub fn instrument() -> InstrumentId {
    InstrumentId::new("BTCUSDT", "BINANCE").unwrap()
}

pub fn cl(id: &str) -> ClientOrderId {
    ClientOrderId::new(id).unwrap()
}

pub fn qty(value: Decimal) -> Quantity {
    Quantity::from_decimal(value).unwrap()
}

pub fn px(value: Decimal) -> Price {
    Price::from_decimal(value).unwrap()
}

// === Venue event builders ===

pub fn submitted_event(order_id: &str, at: DateTime<Utc>) -> ExecutionEvent {
    ExecutionEvent::Order(OrderEventAny::from(OrderSubmitted::new(
        cl(order_id),
        account(),
        at,
    )))
}

pub fn accepted_event(order_id: &str, venue_id: &str, at: DateTime<Utc>) -> ExecutionEvent {
    ExecutionEvent::Order(OrderEventAny::from(OrderAccepted::new(
        cl(order_id),
        VenueOrderId::new(venue_id).unwrap(),
        account(),
        at,
    )))
}

pub fn fill_event(
    order_id: &str,
    trade_id: &str,
    side: OrderSide,
    quantity: Decimal,
    price: Decimal,
    at: DateTime<Utc>,
) -> ExecutionEvent {
    ExecutionEvent::Order(OrderEventAny::from(OrderFilled::new(
        cl(order_id),
        VenueOrderId::new("V-1").unwrap(),
        account(),
        instrument(),
        TradeId::new(trade_id).unwrap(),
        strategy_id(),
        side,
        qty(quantity),
        px(price),
        at,
    )))
}
