//! Order lifecycle events.
//!
//! Each significant state change is reported by the venue (or synthesized by
//! the engine) as an event. Events drive the order state machine exclusively;
//! nothing mutates an order except [`Order::apply`](super::Order::apply).
//!
//! Event flow:
//! ```text
//! OrderInitialized
//!       ↓
//! OrderSubmitted (or OrderDenied)
//!       ↓
//! OrderAccepted (or OrderRejected)
//!       ↓
//! OrderWorking / OrderAmended
//!       ↓
//! OrderFilled (or OrderCancelled / OrderExpired)
//! ```

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use super::types::{
    AccountId, ClientOrderId, InstrumentId, LiquiditySide, OrderSide, OrderType, Price, Quantity,
    StrategyId, TimeInForce, TradeId, VenueOrderId,
};

/// Unique identifier for an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EventId(pub Uuid);

impl EventId {
    /// Generate a new unique event ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for EventId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Event recording the creation of an order by a strategy.
///
/// This is the only event that creates an order; `ts_init` on the resulting
/// order is this event's timestamp and `init_id` is its `event_id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderInitialized {
    pub event_id: EventId,
    pub client_order_id: ClientOrderId,
    pub strategy_id: StrategyId,
    pub instrument_id: InstrumentId,
    pub order_side: OrderSide,
    pub order_type: OrderType,
    pub quantity: Quantity,
    pub price: Option<Price>,
    pub trigger_price: Option<Price>,
    pub time_in_force: TimeInForce,
    pub expire_time: Option<DateTime<Utc>>,
    pub ts_event: DateTime<Utc>,
    pub ts_init: DateTime<Utc>,
}

impl OrderInitialized {
    /// Create a new OrderInitialized event
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        client_order_id: ClientOrderId,
        strategy_id: StrategyId,
        instrument_id: InstrumentId,
        order_side: OrderSide,
        order_type: OrderType,
        quantity: Quantity,
        price: Option<Price>,
        trigger_price: Option<Price>,
        time_in_force: TimeInForce,
        expire_time: Option<DateTime<Utc>>,
        ts_event: DateTime<Utc>,
    ) -> Self {
        Self {
            event_id: EventId::new(),
            client_order_id,
            strategy_id,
            instrument_id,
            order_side,
            order_type,
            quantity,
            price,
            trigger_price,
            time_in_force,
            expire_time,
            ts_event,
            ts_init: ts_event,
        }
    }
}

/// Event recording that an order was denied before reaching the venue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderDenied {
    pub event_id: EventId,
    pub client_order_id: ClientOrderId,
    pub reason: String,
    pub ts_event: DateTime<Utc>,
}

impl OrderDenied {
    pub fn new(
        client_order_id: ClientOrderId,
        reason: impl Into<String>,
        ts_event: DateTime<Utc>,
    ) -> Self {
        Self {
            event_id: EventId::new(),
            client_order_id,
            reason: reason.into(),
            ts_event,
        }
    }
}

/// Event recording submission of an order to the venue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderSubmitted {
    pub event_id: EventId,
    pub client_order_id: ClientOrderId,
    pub account_id: AccountId,
    pub ts_event: DateTime<Utc>,
}

impl OrderSubmitted {
    pub fn new(
        client_order_id: ClientOrderId,
        account_id: AccountId,
        ts_event: DateTime<Utc>,
    ) -> Self {
        Self {
            event_id: EventId::new(),
            client_order_id,
            account_id,
            ts_event,
        }
    }
}

/// Event recording acceptance of an order by the venue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderAccepted {
    pub event_id: EventId,
    pub client_order_id: ClientOrderId,
    pub venue_order_id: VenueOrderId,
    pub account_id: AccountId,
    pub ts_event: DateTime<Utc>,
}

impl OrderAccepted {
    pub fn new(
        client_order_id: ClientOrderId,
        venue_order_id: VenueOrderId,
        account_id: AccountId,
        ts_event: DateTime<Utc>,
    ) -> Self {
        Self {
            event_id: EventId::new(),
            client_order_id,
            venue_order_id,
            account_id,
            ts_event,
        }
    }
}

/// Event recording rejection of an order by the venue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderRejected {
    pub event_id: EventId,
    pub client_order_id: ClientOrderId,
    pub account_id: AccountId,
    pub reason: String,
    pub ts_event: DateTime<Utc>,
}

impl OrderRejected {
    pub fn new(
        client_order_id: ClientOrderId,
        account_id: AccountId,
        reason: impl Into<String>,
        ts_event: DateTime<Utc>,
    ) -> Self {
        Self {
            event_id: EventId::new(),
            client_order_id,
            account_id,
            reason: reason.into(),
            ts_event,
        }
    }
}

/// Event recording that an order is resting/working at the venue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderWorking {
    pub event_id: EventId,
    pub client_order_id: ClientOrderId,
    pub venue_order_id: Option<VenueOrderId>,
    pub account_id: AccountId,
    /// Price the order is working at, where the venue reports one
    pub price: Option<Price>,
    pub ts_event: DateTime<Utc>,
}

impl OrderWorking {
    pub fn new(
        client_order_id: ClientOrderId,
        venue_order_id: Option<VenueOrderId>,
        account_id: AccountId,
        price: Option<Price>,
        ts_event: DateTime<Utc>,
    ) -> Self {
        Self {
            event_id: EventId::new(),
            client_order_id,
            venue_order_id,
            account_id,
            price,
            ts_event,
        }
    }
}

/// Event recording a venue-confirmed amendment of quantity and/or price.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderAmended {
    pub event_id: EventId,
    pub client_order_id: ClientOrderId,
    pub venue_order_id: Option<VenueOrderId>,
    pub account_id: AccountId,
    /// New total quantity, if amended
    pub quantity: Option<Quantity>,
    /// New working price, if amended
    pub price: Option<Price>,
    pub ts_event: DateTime<Utc>,
}

impl OrderAmended {
    pub fn new(
        client_order_id: ClientOrderId,
        venue_order_id: Option<VenueOrderId>,
        account_id: AccountId,
        quantity: Option<Quantity>,
        price: Option<Price>,
        ts_event: DateTime<Utc>,
    ) -> Self {
        Self {
            event_id: EventId::new(),
            client_order_id,
            venue_order_id,
            account_id,
            quantity,
            price,
            ts_event,
        }
    }
}

/// Event recording cancellation of an order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderCancelled {
    pub event_id: EventId,
    pub client_order_id: ClientOrderId,
    pub venue_order_id: Option<VenueOrderId>,
    pub account_id: AccountId,
    pub ts_event: DateTime<Utc>,
}

impl OrderCancelled {
    pub fn new(
        client_order_id: ClientOrderId,
        venue_order_id: Option<VenueOrderId>,
        account_id: AccountId,
        ts_event: DateTime<Utc>,
    ) -> Self {
        Self {
            event_id: EventId::new(),
            client_order_id,
            venue_order_id,
            account_id,
            ts_event,
        }
    }
}

/// Event recording expiry of an order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderExpired {
    pub event_id: EventId,
    pub client_order_id: ClientOrderId,
    pub venue_order_id: Option<VenueOrderId>,
    pub account_id: AccountId,
    pub ts_event: DateTime<Utc>,
}

impl OrderExpired {
    pub fn new(
        client_order_id: ClientOrderId,
        venue_order_id: Option<VenueOrderId>,
        account_id: AccountId,
        ts_event: DateTime<Utc>,
    ) -> Self {
        Self {
            event_id: EventId::new(),
            client_order_id,
            venue_order_id,
            account_id,
            ts_event,
        }
    }
}

/// Event recording a fill (partial or complete) on an order.
///
/// Fill application is idempotent on `trade_id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderFilled {
    pub event_id: EventId,
    pub client_order_id: ClientOrderId,
    pub venue_order_id: VenueOrderId,
    pub account_id: AccountId,
    pub instrument_id: InstrumentId,
    pub trade_id: TradeId,
    pub strategy_id: StrategyId,
    pub order_side: OrderSide,
    /// Quantity filled in this execution
    pub last_qty: Quantity,
    /// Price of this execution
    pub last_px: Price,
    /// Commission charged for this fill
    pub commission: Decimal,
    /// Currency of the commission
    pub commission_currency: String,
    /// Whether this fill was maker or taker
    pub liquidity_side: LiquiditySide,
    pub ts_event: DateTime<Utc>,
}

impl OrderFilled {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        client_order_id: ClientOrderId,
        venue_order_id: VenueOrderId,
        account_id: AccountId,
        instrument_id: InstrumentId,
        trade_id: TradeId,
        strategy_id: StrategyId,
        order_side: OrderSide,
        last_qty: Quantity,
        last_px: Price,
        ts_event: DateTime<Utc>,
    ) -> Self {
        Self {
            event_id: EventId::new(),
            client_order_id,
            venue_order_id,
            account_id,
            instrument_id,
            trade_id,
            strategy_id,
            order_side,
            last_qty,
            last_px,
            commission: Decimal::ZERO,
            commission_currency: "USDT".to_string(),
            liquidity_side: LiquiditySide::None,
            ts_event,
        }
    }

    /// Set the commission for this fill
    pub fn with_commission(mut self, commission: Decimal, currency: impl Into<String>) -> Self {
        self.commission = commission;
        self.commission_currency = currency.into();
        self
    }

    /// Set the liquidity side for this fill
    pub fn with_liquidity_side(mut self, side: LiquiditySide) -> Self {
        self.liquidity_side = side;
        self
    }

    /// Notional value of this fill
    pub fn notional(&self) -> Decimal {
        self.last_qty.as_decimal() * self.last_px.as_decimal()
    }
}

/// Engine-synthesized notification that a command received no acknowledging
/// venue event within its timeout.
///
/// Never applied to an order; published to the originating strategy only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderCommandTimeout {
    pub event_id: EventId,
    pub client_order_id: ClientOrderId,
    pub strategy_id: StrategyId,
    /// Name of the unacknowledged command (e.g. "SUBMIT_ORDER")
    pub command: String,
    pub ts_event: DateTime<Utc>,
}

impl OrderCommandTimeout {
    pub fn new(
        client_order_id: ClientOrderId,
        strategy_id: StrategyId,
        command: impl Into<String>,
        ts_event: DateTime<Utc>,
    ) -> Self {
        Self {
            event_id: EventId::new(),
            client_order_id,
            strategy_id,
            command: command.into(),
            ts_event,
        }
    }
}

/// Tagged sum over all order events for unified handling.
///
/// The serialized form is the wire-neutral envelope: the tag is the event
/// kind, the remaining fields the kind-specific payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum OrderEventAny {
    Initialized(OrderInitialized),
    Denied(OrderDenied),
    Submitted(OrderSubmitted),
    Accepted(OrderAccepted),
    Rejected(OrderRejected),
    Working(OrderWorking),
    Amended(OrderAmended),
    Cancelled(OrderCancelled),
    Expired(OrderExpired),
    Filled(OrderFilled),
}

impl OrderEventAny {
    /// Get the event ID
    pub fn event_id(&self) -> EventId {
        match self {
            OrderEventAny::Initialized(e) => e.event_id,
            OrderEventAny::Denied(e) => e.event_id,
            OrderEventAny::Submitted(e) => e.event_id,
            OrderEventAny::Accepted(e) => e.event_id,
            OrderEventAny::Rejected(e) => e.event_id,
            OrderEventAny::Working(e) => e.event_id,
            OrderEventAny::Amended(e) => e.event_id,
            OrderEventAny::Cancelled(e) => e.event_id,
            OrderEventAny::Expired(e) => e.event_id,
            OrderEventAny::Filled(e) => e.event_id,
        }
    }

    /// Get the client order ID this event targets
    pub fn client_order_id(&self) -> &ClientOrderId {
        match self {
            OrderEventAny::Initialized(e) => &e.client_order_id,
            OrderEventAny::Denied(e) => &e.client_order_id,
            OrderEventAny::Submitted(e) => &e.client_order_id,
            OrderEventAny::Accepted(e) => &e.client_order_id,
            OrderEventAny::Rejected(e) => &e.client_order_id,
            OrderEventAny::Working(e) => &e.client_order_id,
            OrderEventAny::Amended(e) => &e.client_order_id,
            OrderEventAny::Cancelled(e) => &e.client_order_id,
            OrderEventAny::Expired(e) => &e.client_order_id,
            OrderEventAny::Filled(e) => &e.client_order_id,
        }
    }

    /// Get the event timestamp
    pub fn ts_event(&self) -> DateTime<Utc> {
        match self {
            OrderEventAny::Initialized(e) => e.ts_event,
            OrderEventAny::Denied(e) => e.ts_event,
            OrderEventAny::Submitted(e) => e.ts_event,
            OrderEventAny::Accepted(e) => e.ts_event,
            OrderEventAny::Rejected(e) => e.ts_event,
            OrderEventAny::Working(e) => e.ts_event,
            OrderEventAny::Amended(e) => e.ts_event,
            OrderEventAny::Cancelled(e) => e.ts_event,
            OrderEventAny::Expired(e) => e.ts_event,
            OrderEventAny::Filled(e) => e.ts_event,
        }
    }

    /// Short kind name, as carried on the wire envelope
    pub fn kind(&self) -> &'static str {
        match self {
            OrderEventAny::Initialized(_) => "Initialized",
            OrderEventAny::Denied(_) => "Denied",
            OrderEventAny::Submitted(_) => "Submitted",
            OrderEventAny::Accepted(_) => "Accepted",
            OrderEventAny::Rejected(_) => "Rejected",
            OrderEventAny::Working(_) => "Working",
            OrderEventAny::Amended(_) => "Amended",
            OrderEventAny::Cancelled(_) => "Cancelled",
            OrderEventAny::Expired(_) => "Expired",
            OrderEventAny::Filled(_) => "Filled",
        }
    }

    /// Returns true if this event moves an order to a terminal state.
    ///
    /// A fill is only terminal when it completes the order, which this
    /// event alone cannot determine, so fills report false here.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            OrderEventAny::Denied(_)
                | OrderEventAny::Rejected(_)
                | OrderEventAny::Cancelled(_)
                | OrderEventAny::Expired(_)
        )
    }
}

impl From<OrderInitialized> for OrderEventAny {
    fn from(e: OrderInitialized) -> Self {
        OrderEventAny::Initialized(e)
    }
}

impl From<OrderDenied> for OrderEventAny {
    fn from(e: OrderDenied) -> Self {
        OrderEventAny::Denied(e)
    }
}

impl From<OrderSubmitted> for OrderEventAny {
    fn from(e: OrderSubmitted) -> Self {
        OrderEventAny::Submitted(e)
    }
}

impl From<OrderAccepted> for OrderEventAny {
    fn from(e: OrderAccepted) -> Self {
        OrderEventAny::Accepted(e)
    }
}

impl From<OrderRejected> for OrderEventAny {
    fn from(e: OrderRejected) -> Self {
        OrderEventAny::Rejected(e)
    }
}

impl From<OrderWorking> for OrderEventAny {
    fn from(e: OrderWorking) -> Self {
        OrderEventAny::Working(e)
    }
}

impl From<OrderAmended> for OrderEventAny {
    fn from(e: OrderAmended) -> Self {
        OrderEventAny::Amended(e)
    }
}

impl From<OrderCancelled> for OrderEventAny {
    fn from(e: OrderCancelled) -> Self {
        OrderEventAny::Cancelled(e)
    }
}

impl From<OrderExpired> for OrderEventAny {
    fn from(e: OrderExpired) -> Self {
        OrderEventAny::Expired(e)
    }
}

impl From<OrderFilled> for OrderEventAny {
    fn from(e: OrderFilled) -> Self {
        OrderEventAny::Filled(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;

    fn ts() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 2, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_event_id_uniqueness() {
        assert_ne!(EventId::new(), EventId::new());
    }

    #[test]
    fn test_accepted_event_accessors() {
        let event = OrderAccepted::new(
            ClientOrderId::new("O-1").unwrap(),
            VenueOrderId::new("V-1").unwrap(),
            AccountId::new("ACC-1").unwrap(),
            ts(),
        );
        let any: OrderEventAny = event.clone().into();
        assert_eq!(any.client_order_id().as_str(), "O-1");
        assert_eq!(any.ts_event(), ts());
        assert_eq!(any.kind(), "Accepted");
        assert!(!any.is_terminal());
    }

    #[test]
    fn test_terminal_events() {
        let cancelled = OrderEventAny::from(OrderCancelled::new(
            ClientOrderId::new("O-2").unwrap(),
            None,
            AccountId::new("ACC-1").unwrap(),
            ts(),
        ));
        assert!(cancelled.is_terminal());

        let rejected = OrderEventAny::from(OrderRejected::new(
            ClientOrderId::new("O-3").unwrap(),
            AccountId::new("ACC-1").unwrap(),
            "insufficient margin",
            ts(),
        ));
        assert!(rejected.is_terminal());
    }

    #[test]
    fn test_fill_notional() {
        let fill = OrderFilled::new(
            ClientOrderId::new("O-4").unwrap(),
            VenueOrderId::new("V-4").unwrap(),
            AccountId::new("ACC-1").unwrap(),
            InstrumentId::new("BTCUSDT", "BINANCE").unwrap(),
            TradeId::new("T-1").unwrap(),
            StrategyId::new("S-1").unwrap(),
            OrderSide::Buy,
            Quantity::new(dec!(2), 0).unwrap(),
            Price::new(dec!(10.50), 2).unwrap(),
            ts(),
        );
        assert_eq!(fill.notional(), dec!(21.00));
    }

    #[test]
    fn test_event_envelope_round_trip() {
        let event: OrderEventAny = OrderFilled::new(
            ClientOrderId::new("O-5").unwrap(),
            VenueOrderId::new("V-5").unwrap(),
            AccountId::new("ACC-1").unwrap(),
            InstrumentId::new("ETHUSDT", "BINANCE").unwrap(),
            TradeId::new("T-9").unwrap(),
            StrategyId::new("S-1").unwrap(),
            OrderSide::Sell,
            Quantity::new(dec!(1.5), 1).unwrap(),
            Price::new(dec!(2500.00), 2).unwrap(),
            ts(),
        )
        .with_liquidity_side(LiquiditySide::Taker)
        .into();

        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"type\":\"Filled\""));
        let back: OrderEventAny = serde_json::from_str(&json).unwrap();
        assert_eq!(back, event);
    }
}
