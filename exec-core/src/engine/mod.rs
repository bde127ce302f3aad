//! Execution engine: the single writer of orders, positions, and accounts.
//!
//! Strategies deliver [`TradingCommand`]s through a thread-safe `mpsc`
//! channel; the execution client delivers venue events the same way. The
//! engine consumes both on one task ([`ExecutionEngine::run`]), so all state
//! mutation is single-writer by construction. Strategy callbacks run
//! synchronously on the engine task and must not block.

pub mod client;
pub mod clock;
pub mod commands;
pub mod engine;

use serde::{Deserialize, Serialize};

use crate::accounts::AccountState;
use crate::orders::{OrderCommandTimeout, OrderEventAny};

pub use client::{ClientError, CommandAck, ExecutionClient};
pub use clock::{Clock, SystemClock, TestClock};
pub use commands::{
    AmendOrder, CancelOrder, CommandId, FlattenPosition, SubmitOrder, TradingCommand,
};
pub use engine::{EngineError, ExecutionEngine, ExecutionEngineConfig};

/// Everything the engine applies and publishes.
///
/// `Order` and `Account` arrive from the execution client;
/// `CommandTimeout` is synthesized by the engine itself and only ever flows
/// outward to subscribers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "channel")]
pub enum ExecutionEvent {
    Order(OrderEventAny),
    Account(AccountState),
    CommandTimeout(OrderCommandTimeout),
}

/// Strategy-side event sink.
///
/// Invoked synchronously on the engine task for each applied event tagged
/// with the strategy's `strategy_id` (account events are broadcast to all
/// subscribers). Implementations must return quickly; long-running work
/// belongs on a strategy-owned worker.
pub trait StrategySubscriber: Send {
    fn on_event(&mut self, event: &ExecutionEvent);
}
