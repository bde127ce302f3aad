//! Order management: value types, identifiers, lifecycle events, and the
//! order entity itself.
//!
//! # Overview
//!
//! - [`types`] - enums, fixed-precision values, and identifier newtypes
//! - [`events`] - one struct per lifecycle event plus [`OrderEventAny`]
//! - [`order`] - the [`Order`] entity and its event-driven state machine
//!
//! Orders are created by an [`OrderInitialized`] event and mutated only by
//! [`Order::apply`]; the execution engine is the sole caller of `apply` at
//! runtime.

pub mod events;
pub mod order;
pub mod types;

pub use events::{
    EventId, OrderAccepted, OrderAmended, OrderCancelled, OrderCommandTimeout, OrderDenied,
    OrderEventAny, OrderExpired, OrderFilled, OrderInitialized, OrderRejected, OrderSubmitted,
    OrderWorking,
};
pub use order::{Order, OrderBuilder, OrderError};
pub use types::{
    AccountId, ClientOrderId, InstrumentId, LiquiditySide, OrderSide, OrderStatus, OrderType,
    PositionId, PositionSide, Price, Quantity, StrategyId, TimeInForce, TradeId, TraderId,
    VenueOrderId,
};
