//! Trading commands flowing from strategies into the engine.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::orders::{ClientOrderId, InstrumentId, Order, Price, Quantity, StrategyId};

/// Unique identifier correlating a command with its acknowledgement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CommandId(pub Uuid);

impl CommandId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for CommandId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for CommandId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Submit a new order to the venue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmitOrder {
    pub command_id: CommandId,
    pub order: Order,
    pub ts_init: DateTime<Utc>,
}

impl SubmitOrder {
    pub fn new(order: Order, ts_init: DateTime<Utc>) -> Self {
        Self {
            command_id: CommandId::new(),
            order,
            ts_init,
        }
    }
}

/// Cancel a previously submitted order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CancelOrder {
    pub command_id: CommandId,
    pub strategy_id: StrategyId,
    pub client_order_id: ClientOrderId,
    pub ts_init: DateTime<Utc>,
}

impl CancelOrder {
    pub fn new(
        strategy_id: StrategyId,
        client_order_id: ClientOrderId,
        ts_init: DateTime<Utc>,
    ) -> Self {
        Self {
            command_id: CommandId::new(),
            strategy_id,
            client_order_id,
            ts_init,
        }
    }
}

/// Amend the quantity and/or working price of an order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AmendOrder {
    pub command_id: CommandId,
    pub strategy_id: StrategyId,
    pub client_order_id: ClientOrderId,
    /// New total quantity, if amending quantity
    pub quantity: Option<Quantity>,
    /// New working price, if amending price
    pub price: Option<Price>,
    pub ts_init: DateTime<Utc>,
}

impl AmendOrder {
    pub fn new(
        strategy_id: StrategyId,
        client_order_id: ClientOrderId,
        quantity: Option<Quantity>,
        price: Option<Price>,
        ts_init: DateTime<Utc>,
    ) -> Self {
        Self {
            command_id: CommandId::new(),
            strategy_id,
            client_order_id,
            quantity,
            price,
            ts_init,
        }
    }
}

/// Close the open position for `(strategy_id, instrument)` with an opposing
/// market order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlattenPosition {
    pub command_id: CommandId,
    pub strategy_id: StrategyId,
    pub instrument_id: InstrumentId,
    pub ts_init: DateTime<Utc>,
}

impl FlattenPosition {
    pub fn new(
        strategy_id: StrategyId,
        instrument_id: InstrumentId,
        ts_init: DateTime<Utc>,
    ) -> Self {
        Self {
            command_id: CommandId::new(),
            strategy_id,
            instrument_id,
            ts_init,
        }
    }
}

/// Tagged sum over all strategy commands.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum TradingCommand {
    Submit(SubmitOrder),
    Cancel(CancelOrder),
    Amend(AmendOrder),
    Flatten(FlattenPosition),
}

impl TradingCommand {
    /// Correlation ID of the command
    pub fn command_id(&self) -> CommandId {
        match self {
            TradingCommand::Submit(c) => c.command_id,
            TradingCommand::Cancel(c) => c.command_id,
            TradingCommand::Amend(c) => c.command_id,
            TradingCommand::Flatten(c) => c.command_id,
        }
    }

    /// Strategy that issued the command
    pub fn strategy_id(&self) -> &StrategyId {
        match self {
            TradingCommand::Submit(c) => &c.order.strategy_id,
            TradingCommand::Cancel(c) => &c.strategy_id,
            TradingCommand::Amend(c) => &c.strategy_id,
            TradingCommand::Flatten(c) => &c.strategy_id,
        }
    }

    /// Short kind name for logs and timeout notifications
    pub fn kind(&self) -> &'static str {
        match self {
            TradingCommand::Submit(_) => "SUBMIT_ORDER",
            TradingCommand::Cancel(_) => "CANCEL_ORDER",
            TradingCommand::Amend(_) => "AMEND_ORDER",
            TradingCommand::Flatten(_) => "FLATTEN_POSITION",
        }
    }
}

impl From<SubmitOrder> for TradingCommand {
    fn from(c: SubmitOrder) -> Self {
        TradingCommand::Submit(c)
    }
}

impl From<CancelOrder> for TradingCommand {
    fn from(c: CancelOrder) -> Self {
        TradingCommand::Cancel(c)
    }
}

impl From<AmendOrder> for TradingCommand {
    fn from(c: AmendOrder) -> Self {
        TradingCommand::Amend(c)
    }
}

impl From<FlattenPosition> for TradingCommand {
    fn from(c: FlattenPosition) -> Self {
        TradingCommand::Flatten(c)
    }
}
