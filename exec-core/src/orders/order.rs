//! Order entity and builder.
//!
//! An `Order` is created by an [`OrderInitialized`] event and thereafter
//! driven exclusively by events through [`Order::apply`]. State transitions
//! are validated against [`OrderStatus::can_transition_to`]; an illegal event
//! leaves the order untouched and surfaces an error for the engine to log.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::ValidationError;

use super::events::{EventId, OrderAmended, OrderEventAny, OrderFilled, OrderInitialized};
use super::types::{
    AccountId, ClientOrderId, InstrumentId, OrderSide, OrderStatus, OrderType, Price, Quantity,
    StrategyId, TimeInForce, TradeId, VenueOrderId,
};

/// A trading order with full lifecycle tracking.
///
/// Invariants maintained across every event application:
/// - `0 <= filled_qty <= quantity`
/// - `avg_px` is `Some` iff `filled_qty > 0`
/// - a duplicate `event_id` or duplicate fill `trade_id` is a no-op
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    // === Identifiers ===
    /// Client-assigned order ID (unique within the trader)
    pub client_order_id: ClientOrderId,
    /// Venue-assigned order ID (set on acceptance)
    pub venue_order_id: Option<VenueOrderId>,
    /// Account the order was submitted against (set on submission)
    pub account_id: Option<AccountId>,
    /// Instrument being traded
    pub instrument_id: InstrumentId,
    /// Strategy that created this order
    pub strategy_id: StrategyId,

    // === Order specification ===
    /// Buy or Sell
    pub side: OrderSide,
    /// Order type (Market, Limit, Stop)
    pub order_type: OrderType,
    /// Total quantity ordered
    pub quantity: Quantity,
    /// Limit/working price (required for Limit)
    pub price: Option<Price>,
    /// Trigger price (required for Stop)
    pub trigger_price: Option<Price>,
    /// Time in force
    pub time_in_force: TimeInForce,
    /// Expiration time (for GTD orders)
    pub expire_time: Option<DateTime<Utc>>,

    // === Execution state ===
    /// Current order status
    pub status: OrderStatus,
    /// Quantity filled so far
    pub filled_qty: Quantity,
    /// Average fill price (fill-quantity-weighted); `None` until first fill
    pub avg_px: Option<Price>,
    /// Last fill price
    pub last_px: Option<Price>,
    /// Last fill quantity
    pub last_qty: Option<Quantity>,

    // === Audit ===
    /// Execution IDs of all applied fills, in application order
    pub execution_ids: Vec<TradeId>,
    /// Event ID of the initializing event
    pub init_id: EventId,
    /// When the order was initialized
    pub ts_init: DateTime<Utc>,
    /// Event timestamp of the last applied event
    pub ts_last: DateTime<Utc>,
    /// Event IDs of all applied events, for duplicate suppression
    pub event_ids: Vec<EventId>,
}

impl Order {
    /// Create an order from its initializing event.
    pub fn from_initialized(event: &OrderInitialized) -> Self {
        Self {
            client_order_id: event.client_order_id.clone(),
            venue_order_id: None,
            account_id: None,
            instrument_id: event.instrument_id.clone(),
            strategy_id: event.strategy_id.clone(),
            side: event.order_side,
            order_type: event.order_type,
            quantity: event.quantity,
            price: event.price,
            trigger_price: event.trigger_price,
            time_in_force: event.time_in_force,
            expire_time: event.expire_time,
            status: OrderStatus::Initialized,
            filled_qty: Quantity::zero(event.quantity.precision()),
            avg_px: None,
            last_px: None,
            last_qty: None,
            execution_ids: Vec::new(),
            init_id: event.event_id,
            ts_init: event.ts_init,
            ts_last: event.ts_event,
            event_ids: vec![event.event_id],
        }
    }

    /// Create a new market order builder
    pub fn market(instrument_id: InstrumentId, side: OrderSide, quantity: Quantity) -> OrderBuilder {
        OrderBuilder::new(OrderType::Market, instrument_id, side, quantity)
    }

    /// Create a new limit order builder
    pub fn limit(
        instrument_id: InstrumentId,
        side: OrderSide,
        quantity: Quantity,
        price: Price,
    ) -> OrderBuilder {
        OrderBuilder::new(OrderType::Limit, instrument_id, side, quantity).with_price(price)
    }

    /// Create a new stop order builder
    pub fn stop(
        instrument_id: InstrumentId,
        side: OrderSide,
        quantity: Quantity,
        trigger_price: Price,
    ) -> OrderBuilder {
        OrderBuilder::new(OrderType::Stop, instrument_id, side, quantity)
            .with_trigger_price(trigger_price)
    }

    // === State queries ===

    /// Returns true if the order is in a terminal state
    pub fn is_closed(&self) -> bool {
        self.status.is_terminal()
    }

    /// Returns true if the order is acknowledged and not terminal
    pub fn is_working(&self) -> bool {
        self.status.is_working()
    }

    /// Returns true if the order is awaiting a venue acknowledgement
    pub fn is_inflight(&self) -> bool {
        self.status.is_inflight()
    }

    /// Returns true if the order has fills but is not complete
    pub fn is_partially_filled(&self) -> bool {
        self.status == OrderStatus::PartiallyFilled
    }

    /// Returns true if the order is completely filled
    pub fn is_filled(&self) -> bool {
        self.status == OrderStatus::Filled
    }

    /// Quantity remaining to fill
    pub fn leaves_qty(&self) -> Quantity {
        self.quantity
            .try_sub(&self.filled_qty)
            .unwrap_or_else(|_| Quantity::zero(self.quantity.precision()))
    }

    /// Get the symbol (convenience method)
    pub fn symbol(&self) -> &str {
        &self.instrument_id.symbol
    }

    /// Get the venue (convenience method)
    pub fn venue(&self) -> &str {
        &self.instrument_id.venue
    }

    // === Event application ===

    /// Apply an event to the order.
    ///
    /// Duplicate events (same `event_id`) and duplicate fills (same
    /// `trade_id`) are no-ops returning success. An event whose type is not
    /// legal from the current state fails with
    /// [`OrderError::InvalidStateTransition`] without mutating the order.
    pub fn apply(&mut self, event: &OrderEventAny) -> Result<(), OrderError> {
        if self.event_ids.contains(&event.event_id()) {
            return Ok(());
        }

        match event {
            OrderEventAny::Initialized(_) => {
                // Orders are created from this event; a second one is illegal
                return Err(self.invalid_transition(OrderStatus::Initialized));
            }
            OrderEventAny::Submitted(e) => {
                self.transition_to(OrderStatus::Submitted)?;
                self.account_id = Some(e.account_id.clone());
            }
            OrderEventAny::Denied(_) => {
                self.transition_to(OrderStatus::Denied)?;
            }
            OrderEventAny::Accepted(e) => {
                self.transition_to(OrderStatus::Accepted)?;
                self.venue_order_id = Some(e.venue_order_id.clone());
            }
            OrderEventAny::Rejected(_) => {
                self.transition_to(OrderStatus::Rejected)?;
            }
            OrderEventAny::Working(e) => {
                self.transition_to(OrderStatus::Working)?;
                if let Some(price) = e.price {
                    self.price = Some(price);
                }
                if let Some(venue_order_id) = &e.venue_order_id {
                    self.venue_order_id = Some(venue_order_id.clone());
                }
            }
            OrderEventAny::Amended(e) => {
                self.apply_amended(e)?;
            }
            OrderEventAny::Cancelled(_) => {
                self.transition_to(OrderStatus::Cancelled)?;
            }
            OrderEventAny::Expired(_) => {
                self.transition_to(OrderStatus::Expired)?;
            }
            OrderEventAny::Filled(e) => {
                // A duplicate execution ID is a successful no-op, but the
                // carrying event is still recorded for duplicate suppression
                self.apply_filled(e)?;
            }
        }

        self.event_ids.push(event.event_id());
        self.ts_last = event.ts_event();
        Ok(())
    }

    fn apply_amended(&mut self, event: &OrderAmended) -> Result<(), OrderError> {
        if !self.order_type.supports_amendment() {
            return Err(OrderError::AmendNotSupported {
                order_id: self.client_order_id.clone(),
                order_type: self.order_type,
            });
        }
        if !self.status.can_transition_to(OrderStatus::Amended) {
            return Err(self.invalid_transition(OrderStatus::Amended));
        }
        if let Some(quantity) = event.quantity {
            if quantity < self.filled_qty {
                return Err(OrderError::QuantityBelowFilled {
                    order_id: self.client_order_id.clone(),
                    quantity,
                    filled_qty: self.filled_qty,
                });
            }
            self.quantity = quantity;
        }
        if let Some(price) = event.price {
            self.price = Some(price);
        }
        self.status = OrderStatus::Amended;
        Ok(())
    }

    fn apply_filled(&mut self, event: &OrderFilled) -> Result<(), OrderError> {
        if self.execution_ids.contains(&event.trade_id) {
            return Ok(());
        }
        if !event.last_qty.is_positive() {
            return Err(OrderError::Validation(
                ValidationError::QuantityNonPositive(event.last_qty.to_string()),
            ));
        }

        let total_filled = self.filled_qty.try_add(&event.last_qty)?;
        let target = if total_filled == self.quantity {
            OrderStatus::Filled
        } else {
            OrderStatus::PartiallyFilled
        };
        if !self.status.can_transition_to(target) {
            return Err(self.invalid_transition(target));
        }
        if total_filled > self.quantity {
            return Err(OrderError::OverFill {
                order_id: self.client_order_id.clone(),
                fill_qty: event.last_qty,
                leaves_qty: self.leaves_qty(),
            });
        }

        // Fill-quantity-weighted average over all applied fills
        let fill_px = event.last_px.as_decimal();
        let fill_qty = event.last_qty.as_decimal();
        let avg = match self.avg_px {
            Some(current) => {
                (current.as_decimal() * self.filled_qty.as_decimal() + fill_px * fill_qty)
                    / total_filled.as_decimal()
            }
            None => fill_px,
        };
        self.avg_px = Some(Price::new(avg, event.last_px.precision())?);

        self.filled_qty = total_filled;
        self.last_px = Some(event.last_px);
        self.last_qty = Some(event.last_qty);
        self.execution_ids.push(event.trade_id.clone());
        self.venue_order_id = Some(event.venue_order_id.clone());
        self.status = target;
        Ok(())
    }

    fn transition_to(&mut self, target: OrderStatus) -> Result<(), OrderError> {
        if !self.status.can_transition_to(target) {
            return Err(self.invalid_transition(target));
        }
        self.status = target;
        Ok(())
    }

    fn invalid_transition(&self, target: OrderStatus) -> OrderError {
        OrderError::InvalidStateTransition {
            from: self.status,
            to: target,
            order_id: self.client_order_id.clone(),
        }
    }
}

impl fmt::Display for Order {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Order({} {} {} {} @ {} status={} filled={}/{})",
            self.client_order_id,
            self.side,
            self.order_type,
            self.instrument_id,
            self.price
                .map(|p| p.to_string())
                .unwrap_or_else(|| "MARKET".to_string()),
            self.status,
            self.filled_qty,
            self.quantity,
        )
    }
}

/// Builder for constructing orders with validation.
#[derive(Debug)]
pub struct OrderBuilder {
    order_type: OrderType,
    instrument_id: InstrumentId,
    side: OrderSide,
    quantity: Quantity,
    price: Option<Price>,
    trigger_price: Option<Price>,
    time_in_force: TimeInForce,
    expire_time: Option<DateTime<Utc>>,
    client_order_id: Option<ClientOrderId>,
    strategy_id: Option<StrategyId>,
    ts_init: Option<DateTime<Utc>>,
}

impl OrderBuilder {
    /// Create a new order builder
    pub fn new(
        order_type: OrderType,
        instrument_id: InstrumentId,
        side: OrderSide,
        quantity: Quantity,
    ) -> Self {
        Self {
            order_type,
            instrument_id,
            side,
            quantity,
            price: None,
            trigger_price: None,
            time_in_force: TimeInForce::GTC,
            expire_time: None,
            client_order_id: None,
            strategy_id: None,
            ts_init: None,
        }
    }

    /// Set the limit price
    pub fn with_price(mut self, price: Price) -> Self {
        self.price = Some(price);
        self
    }

    /// Set the trigger price
    pub fn with_trigger_price(mut self, trigger_price: Price) -> Self {
        self.trigger_price = Some(trigger_price);
        self
    }

    /// Set the time in force
    pub fn with_time_in_force(mut self, tif: TimeInForce) -> Self {
        self.time_in_force = tif;
        self
    }

    /// Set the expiry time (switches the order to GTD)
    pub fn with_expire_time(mut self, expire_time: DateTime<Utc>) -> Self {
        self.expire_time = Some(expire_time);
        self.time_in_force = TimeInForce::GTD;
        self
    }

    /// Set a specific client order ID (otherwise auto-generated)
    pub fn with_client_order_id(mut self, id: ClientOrderId) -> Self {
        self.client_order_id = Some(id);
        self
    }

    /// Set the strategy ID (required)
    pub fn with_strategy_id(mut self, id: StrategyId) -> Self {
        self.strategy_id = Some(id);
        self
    }

    /// Set the initialization timestamp (defaults to now)
    pub fn with_ts_init(mut self, ts_init: DateTime<Utc>) -> Self {
        self.ts_init = Some(ts_init);
        self
    }

    /// Validate inputs and build the initializing event.
    pub fn build_initialized(self) -> Result<OrderInitialized, OrderError> {
        if !self.quantity.is_positive() {
            return Err(OrderError::Validation(
                ValidationError::QuantityNonPositive(self.quantity.to_string()),
            ));
        }
        if self.order_type.requires_price() && self.price.is_none() {
            return Err(OrderError::MissingPrice {
                order_type: self.order_type,
            });
        }
        if self.order_type.requires_trigger_price() && self.trigger_price.is_none() {
            return Err(OrderError::MissingTriggerPrice {
                order_type: self.order_type,
            });
        }
        if self.time_in_force.requires_expire_time() && self.expire_time.is_none() {
            return Err(OrderError::MissingExpireTime);
        }
        if self.order_type == OrderType::Market && !self.time_in_force.valid_for_market() {
            return Err(OrderError::Validation(ValidationError::TimeInForceInvalid {
                tif: self.time_in_force.to_string(),
                order_type: self.order_type.to_string(),
            }));
        }
        let strategy_id = self
            .strategy_id
            .ok_or(OrderError::Validation(ValidationError::Required {
                field: "strategy_id",
            }))?;

        let ts_init = self.ts_init.unwrap_or_else(Utc::now);
        Ok(OrderInitialized::new(
            self.client_order_id.unwrap_or_else(ClientOrderId::generate),
            strategy_id,
            self.instrument_id,
            self.side,
            self.order_type,
            self.quantity,
            self.price,
            self.trigger_price,
            self.time_in_force,
            self.expire_time,
            ts_init,
        ))
    }

    /// Validate and build the order
    pub fn build(self) -> Result<Order, OrderError> {
        Ok(Order::from_initialized(&self.build_initialized()?))
    }
}

/// Errors from order construction and event application.
#[derive(Debug, Clone, thiserror::Error)]
pub enum OrderError {
    #[error("invalid state transition {from} -> {to} for order {order_id}")]
    InvalidStateTransition {
        from: OrderStatus,
        to: OrderStatus,
        order_id: ClientOrderId,
    },

    #[error("order {order_id} is {order_type}; amendment not supported")]
    AmendNotSupported {
        order_id: ClientOrderId,
        order_type: OrderType,
    },

    #[error("cannot amend order {order_id} to {quantity}, already filled {filled_qty}")]
    QuantityBelowFilled {
        order_id: ClientOrderId,
        quantity: Quantity,
        filled_qty: Quantity,
    },

    #[error("over-fill on order {order_id}: fill_qty={fill_qty} > leaves_qty={leaves_qty}")]
    OverFill {
        order_id: ClientOrderId,
        fill_qty: Quantity,
        leaves_qty: Quantity,
    },

    #[error("{order_type} order requires a limit price")]
    MissingPrice { order_type: OrderType },

    #[error("{order_type} order requires a trigger price")]
    MissingTriggerPrice { order_type: OrderType },

    #[error("GTD orders require an expire_time")]
    MissingExpireTime,

    #[error(transparent)]
    Validation(#[from] ValidationError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orders::events::{
        OrderAccepted, OrderCancelled, OrderSubmitted, OrderWorking,
    };
    use chrono::TimeZone;
    use rust_decimal_macros::dec;

    fn ts() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 2, 1, 12, 0, 0).unwrap()
    }

    fn qty(v: rust_decimal::Decimal) -> Quantity {
        Quantity::from_decimal(v).unwrap()
    }

    fn px(v: rust_decimal::Decimal) -> Price {
        Price::from_decimal(v).unwrap()
    }

    fn instrument() -> InstrumentId {
        InstrumentId::new("BTCUSDT", "BINANCE").unwrap()
    }

    fn market_order(cl: &str, quantity: rust_decimal::Decimal) -> Order {
        Order::market(instrument(), OrderSide::Buy, qty(quantity))
            .with_strategy_id(StrategyId::new("S-1").unwrap())
            .with_client_order_id(ClientOrderId::new(cl).unwrap())
            .with_ts_init(ts())
            .build()
            .unwrap()
    }

    fn accept(order: &mut Order) {
        order
            .apply(
                &OrderSubmitted::new(
                    order.client_order_id.clone(),
                    AccountId::new("ACC-1").unwrap(),
                    ts(),
                )
                .into(),
            )
            .unwrap();
        order
            .apply(
                &OrderAccepted::new(
                    order.client_order_id.clone(),
                    VenueOrderId::new("V-1").unwrap(),
                    AccountId::new("ACC-1").unwrap(),
                    ts(),
                )
                .into(),
            )
            .unwrap();
    }

    fn fill(order: &Order, trade: &str, quantity: rust_decimal::Decimal, price: rust_decimal::Decimal) -> OrderFilled {
        OrderFilled::new(
            order.client_order_id.clone(),
            VenueOrderId::new("V-1").unwrap(),
            AccountId::new("ACC-1").unwrap(),
            order.instrument_id.clone(),
            TradeId::new(trade).unwrap(),
            order.strategy_id.clone(),
            order.side,
            qty(quantity),
            px(price),
            ts(),
        )
    }

    #[test]
    fn test_market_order_creation() {
        let order = market_order("O-1", dec!(100));
        assert_eq!(order.order_type, OrderType::Market);
        assert_eq!(order.status, OrderStatus::Initialized);
        assert_eq!(order.filled_qty, Quantity::zero(0));
        assert!(order.avg_px.is_none());
        assert_eq!(order.leaves_qty(), qty(dec!(100)));
    }

    #[test]
    fn test_market_order_rejects_gtd() {
        let result = Order::market(instrument(), OrderSide::Buy, qty(dec!(1)))
            .with_strategy_id(StrategyId::new("S-1").unwrap())
            .with_expire_time(ts())
            .build();
        assert!(matches!(
            result,
            Err(OrderError::Validation(ValidationError::TimeInForceInvalid { .. }))
        ));
    }

    #[test]
    fn test_limit_requires_price() {
        let result = OrderBuilder::new(OrderType::Limit, instrument(), OrderSide::Buy, qty(dec!(1)))
            .with_strategy_id(StrategyId::new("S-1").unwrap())
            .build();
        assert!(matches!(result, Err(OrderError::MissingPrice { .. })));
    }

    #[test]
    fn test_zero_quantity_rejected() {
        let result = Order::market(instrument(), OrderSide::Buy, Quantity::zero(0))
            .with_strategy_id(StrategyId::new("S-1").unwrap())
            .build();
        assert!(matches!(
            result,
            Err(OrderError::Validation(ValidationError::QuantityNonPositive(_)))
        ));
    }

    #[test]
    fn test_lifecycle_submitted_accepted_filled() {
        let mut order = market_order("O-2", dec!(100));
        accept(&mut order);
        assert_eq!(order.status, OrderStatus::Accepted);
        assert_eq!(order.venue_order_id, Some(VenueOrderId::new("V-1").unwrap()));

        order
            .apply(&fill(&order, "T-1", dec!(100), dec!(10.00)).into())
            .unwrap();
        assert_eq!(order.status, OrderStatus::Filled);
        assert_eq!(order.filled_qty, qty(dec!(100)));
        assert_eq!(order.avg_px, Some(px(dec!(10.00))));
        assert!(order.is_closed());
    }

    #[test]
    fn test_partial_then_complete_weighted_average() {
        let mut order = market_order("O-3", dec!(100));
        accept(&mut order);

        order
            .apply(&fill(&order, "T-1", dec!(40), dec!(10.00)).into())
            .unwrap();
        assert_eq!(order.status, OrderStatus::PartiallyFilled);
        assert_eq!(order.avg_px, Some(px(dec!(10.00))));
        assert_eq!(order.leaves_qty(), qty(dec!(60)));

        order
            .apply(&fill(&order, "T-2", dec!(60), dec!(10.50)).into())
            .unwrap();
        assert_eq!(order.status, OrderStatus::Filled);
        // (40*10.00 + 60*10.50) / 100 = 10.30
        assert_eq!(order.avg_px, Some(px(dec!(10.30))));
    }

    #[test]
    fn test_duplicate_execution_id_is_noop() {
        let mut order = market_order("O-4", dec!(100));
        accept(&mut order);

        let event = fill(&order, "T-X", dec!(30), dec!(10.00));
        order.apply(&event.clone().into()).unwrap();
        assert_eq!(order.filled_qty, qty(dec!(30)));

        // Re-delivered fill with the same execution ID but a fresh event ID
        let mut replay = event;
        replay.event_id = EventId::new();
        order.apply(&replay.into()).unwrap();
        assert_eq!(order.filled_qty, qty(dec!(30)));
        assert_eq!(order.execution_ids.len(), 1);
    }

    #[test]
    fn test_duplicate_event_id_is_noop() {
        let mut order = market_order("O-5", dec!(100));
        let submitted = OrderSubmitted::new(
            order.client_order_id.clone(),
            AccountId::new("ACC-1").unwrap(),
            ts(),
        );
        order.apply(&submitted.clone().into()).unwrap();
        assert_eq!(order.status, OrderStatus::Submitted);

        // Exact same event again: suppressed, not an invalid transition
        order.apply(&submitted.into()).unwrap();
        assert_eq!(order.status, OrderStatus::Submitted);
        assert_eq!(order.event_ids.len(), 2); // init + submitted
    }

    #[test]
    fn test_overfill_refused() {
        let mut order = market_order("O-6", dec!(100));
        accept(&mut order);
        let result = order.apply(&fill(&order, "T-1", dec!(150), dec!(10.00)).into());
        assert!(matches!(result, Err(OrderError::OverFill { .. })));
        assert_eq!(order.filled_qty, Quantity::zero(0));
    }

    #[test]
    fn test_amend_market_rejected() {
        let mut order = market_order("O-7", dec!(100));
        accept(&mut order);
        let amend = OrderAmended::new(
            order.client_order_id.clone(),
            order.venue_order_id.clone(),
            AccountId::new("ACC-1").unwrap(),
            Some(qty(dec!(50))),
            None,
            ts(),
        );
        let before = order.clone();
        let result = order.apply(&amend.into());
        assert!(matches!(result, Err(OrderError::AmendNotSupported { .. })));
        assert_eq!(order, before);
    }

    #[test]
    fn test_amend_quantity_and_price() {
        let mut order = Order::limit(instrument(), OrderSide::Buy, qty(dec!(100)), px(dec!(10.00)))
            .with_strategy_id(StrategyId::new("S-1").unwrap())
            .with_client_order_id(ClientOrderId::new("O-8").unwrap())
            .with_ts_init(ts())
            .build()
            .unwrap();
        accept(&mut order);
        order
            .apply(
                &OrderWorking::new(
                    order.client_order_id.clone(),
                    order.venue_order_id.clone(),
                    AccountId::new("ACC-1").unwrap(),
                    None,
                    ts(),
                )
                .into(),
            )
            .unwrap();

        let amend = OrderAmended::new(
            order.client_order_id.clone(),
            order.venue_order_id.clone(),
            AccountId::new("ACC-1").unwrap(),
            Some(qty(dec!(80))),
            Some(px(dec!(9.50))),
            ts(),
        );
        order.apply(&amend.into()).unwrap();
        assert_eq!(order.status, OrderStatus::Amended);
        assert_eq!(order.quantity, qty(dec!(80)));
        assert_eq!(order.price, Some(px(dec!(9.50))));
    }

    #[test]
    fn test_amend_below_filled_rejected() {
        let mut order = Order::limit(instrument(), OrderSide::Buy, qty(dec!(100)), px(dec!(10.00)))
            .with_strategy_id(StrategyId::new("S-1").unwrap())
            .with_client_order_id(ClientOrderId::new("O-9").unwrap())
            .with_ts_init(ts())
            .build()
            .unwrap();
        accept(&mut order);
        order
            .apply(&fill(&order, "T-1", dec!(40), dec!(10.00)).into())
            .unwrap();

        let amend = OrderAmended::new(
            order.client_order_id.clone(),
            order.venue_order_id.clone(),
            AccountId::new("ACC-1").unwrap(),
            Some(qty(dec!(30))),
            None,
            ts(),
        );
        let result = order.apply(&amend.into());
        assert!(matches!(result, Err(OrderError::QuantityBelowFilled { .. })));
        assert_eq!(order.quantity, qty(dec!(100)));
    }

    #[test]
    fn test_terminal_refuses_further_events() {
        let mut order = market_order("O-10", dec!(10));
        accept(&mut order);
        order
            .apply(&fill(&order, "T-1", dec!(10), dec!(10.00)).into())
            .unwrap();
        assert!(order.is_closed());

        let cancel = OrderCancelled::new(
            order.client_order_id.clone(),
            order.venue_order_id.clone(),
            AccountId::new("ACC-1").unwrap(),
            ts(),
        );
        let result = order.apply(&cancel.into());
        assert!(matches!(
            result,
            Err(OrderError::InvalidStateTransition { from: OrderStatus::Filled, .. })
        ));
    }

    #[test]
    fn test_fill_invariants_hold() {
        let mut order = market_order("O-11", dec!(100));
        accept(&mut order);
        assert!(order.avg_px.is_none());
        assert!(order.filled_qty.is_zero());

        order
            .apply(&fill(&order, "T-1", dec!(25), dec!(9.00)).into())
            .unwrap();
        assert!(order.avg_px.is_some());
        assert!(order.filled_qty <= order.quantity);
    }
}
