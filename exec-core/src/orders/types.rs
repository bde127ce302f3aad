//! Core order types, value objects, and identifiers.
//!
//! This module defines the fundamental types used throughout the execution
//! core:
//! - `OrderSide` - Buy or Sell
//! - `OrderType` - Market, Limit, Stop
//! - `OrderStatus` - Full lifecycle from Initialized to terminal states
//! - `TimeInForce` - Order duration policies (GTC, IOC, FOK, GTD, DAY)
//! - `Quantity` / `Price` - fixed-precision decimal values
//! - Identifier newtypes (`ClientOrderId`, `VenueOrderId`, `TradeId`, ...)

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

use crate::error::ValidationError;

/// Order side indicating buy or sell direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderSide {
    /// Buy order - acquire the base asset
    Buy,
    /// Sell order - dispose of the base asset
    Sell,
}

impl OrderSide {
    /// Returns the opposite side
    pub fn opposite(&self) -> Self {
        match self {
            OrderSide::Buy => OrderSide::Sell,
            OrderSide::Sell => OrderSide::Buy,
        }
    }

    /// Signed direction: +1 for buys, -1 for sells
    pub fn sign(&self) -> Decimal {
        match self {
            OrderSide::Buy => Decimal::ONE,
            OrderSide::Sell => -Decimal::ONE,
        }
    }

    /// Returns true if this is a buy order
    pub fn is_buy(&self) -> bool {
        matches!(self, OrderSide::Buy)
    }

    /// Returns true if this is a sell order
    pub fn is_sell(&self) -> bool {
        matches!(self, OrderSide::Sell)
    }
}

impl fmt::Display for OrderSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrderSide::Buy => write!(f, "BUY"),
            OrderSide::Sell => write!(f, "SELL"),
        }
    }
}

/// Order type determining execution behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderType {
    /// Market order - execute immediately at best available price
    Market,
    /// Limit order - execute at specified price or better
    Limit,
    /// Stop order - becomes market order when trigger price is reached
    Stop,
}

impl OrderType {
    /// Returns true if this order type requires a limit price
    pub fn requires_price(&self) -> bool {
        matches!(self, OrderType::Limit)
    }

    /// Returns true if this order type requires a trigger price
    pub fn requires_trigger_price(&self) -> bool {
        matches!(self, OrderType::Stop)
    }

    /// Returns true if in-flight quantity/price amendment is supported
    pub fn supports_amendment(&self) -> bool {
        !matches!(self, OrderType::Market)
    }
}

impl fmt::Display for OrderType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrderType::Market => write!(f, "MARKET"),
            OrderType::Limit => write!(f, "LIMIT"),
            OrderType::Stop => write!(f, "STOP"),
        }
    }
}

/// Order status representing the current state in the order lifecycle.
///
/// State transitions:
/// ```text
/// Initialized → Submitted → Accepted → Working ─┬→ PartiallyFilled → Filled
///                    │            │      ↑↓     ├→ Cancelled
///                    │            │    Amended  ├→ Expired
///                    │            └→ Rejected   └→ Rejected
///                    └→ Denied
/// ```
///
/// Fills are also legal directly from `Accepted` (venues that never report a
/// working status) and from `Amended`; amendment is legal from
/// `PartiallyFilled` as well as `Working`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    /// Order has been initialized but not yet submitted
    Initialized,
    /// Order has been submitted to the venue
    Submitted,
    /// Order has been denied submission (terminal state)
    Denied,
    /// Order has been accepted by the venue
    Accepted,
    /// Order has been rejected by the venue (terminal state)
    Rejected,
    /// Order is resting/working at the venue
    Working,
    /// Order quantity or price has been amended at the venue
    Amended,
    /// Order has been partially filled (0 < filled_qty < quantity)
    PartiallyFilled,
    /// Order has been completely filled (terminal state)
    Filled,
    /// Order has been cancelled (terminal state)
    Cancelled,
    /// Order has expired (terminal state)
    Expired,
}

impl OrderStatus {
    /// Returns true if the order is in a terminal state
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            OrderStatus::Filled
                | OrderStatus::Cancelled
                | OrderStatus::Rejected
                | OrderStatus::Expired
                | OrderStatus::Denied
        )
    }

    /// Returns true if the order is acknowledged by the venue and not terminal
    pub fn is_working(&self) -> bool {
        matches!(
            self,
            OrderStatus::Accepted
                | OrderStatus::Working
                | OrderStatus::Amended
                | OrderStatus::PartiallyFilled
        )
    }

    /// Returns true if the order is in-flight (submitted, awaiting venue ack)
    pub fn is_inflight(&self) -> bool {
        matches!(self, OrderStatus::Submitted)
    }

    /// Returns true if a fill may be applied from this state
    pub fn is_fillable(&self) -> bool {
        matches!(
            self,
            OrderStatus::Accepted
                | OrderStatus::Working
                | OrderStatus::Amended
                | OrderStatus::PartiallyFilled
        )
    }

    /// Returns true if the order can be cancelled
    pub fn is_cancelable(&self) -> bool {
        matches!(
            self,
            OrderStatus::Submitted
                | OrderStatus::Accepted
                | OrderStatus::Working
                | OrderStatus::Amended
                | OrderStatus::PartiallyFilled
        )
    }

    /// Returns true if the order can be amended
    pub fn is_modifiable(&self) -> bool {
        matches!(
            self,
            OrderStatus::Working | OrderStatus::PartiallyFilled
        )
    }

    /// Check if transition from current status to target status is valid
    pub fn can_transition_to(&self, target: OrderStatus) -> bool {
        match self {
            OrderStatus::Initialized => {
                matches!(target, OrderStatus::Submitted | OrderStatus::Denied)
            }
            OrderStatus::Submitted => matches!(
                target,
                OrderStatus::Accepted | OrderStatus::Rejected | OrderStatus::Denied
            ),
            OrderStatus::Accepted => matches!(
                target,
                OrderStatus::Working
                    | OrderStatus::PartiallyFilled
                    | OrderStatus::Filled
                    | OrderStatus::Cancelled
                    | OrderStatus::Expired
                    | OrderStatus::Rejected
            ),
            OrderStatus::Working => matches!(
                target,
                OrderStatus::Amended
                    | OrderStatus::PartiallyFilled
                    | OrderStatus::Filled
                    | OrderStatus::Cancelled
                    | OrderStatus::Expired
                    | OrderStatus::Rejected
            ),
            OrderStatus::Amended => matches!(
                target,
                OrderStatus::Working
                    | OrderStatus::PartiallyFilled
                    | OrderStatus::Filled
                    | OrderStatus::Cancelled
                    | OrderStatus::Expired
                    | OrderStatus::Rejected
            ),
            OrderStatus::PartiallyFilled => matches!(
                target,
                OrderStatus::Amended
                    | OrderStatus::PartiallyFilled
                    | OrderStatus::Filled
                    | OrderStatus::Cancelled
                    | OrderStatus::Expired
                    | OrderStatus::Rejected
            ),
            // Terminal states cannot transition
            OrderStatus::Filled
            | OrderStatus::Cancelled
            | OrderStatus::Rejected
            | OrderStatus::Expired
            | OrderStatus::Denied => false,
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrderStatus::Initialized => write!(f, "INITIALIZED"),
            OrderStatus::Submitted => write!(f, "SUBMITTED"),
            OrderStatus::Denied => write!(f, "DENIED"),
            OrderStatus::Accepted => write!(f, "ACCEPTED"),
            OrderStatus::Rejected => write!(f, "REJECTED"),
            OrderStatus::Working => write!(f, "WORKING"),
            OrderStatus::Amended => write!(f, "AMENDED"),
            OrderStatus::PartiallyFilled => write!(f, "PARTIALLY_FILLED"),
            OrderStatus::Filled => write!(f, "FILLED"),
            OrderStatus::Cancelled => write!(f, "CANCELLED"),
            OrderStatus::Expired => write!(f, "EXPIRED"),
        }
    }
}

/// Time-in-force specifying how long an order remains active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TimeInForce {
    /// Good-Till-Cancelled - remains active until filled or explicitly cancelled
    #[default]
    GTC,
    /// Immediate-Or-Cancel - fill immediately (partially ok), cancel remainder
    IOC,
    /// Fill-Or-Kill - fill entire quantity immediately or cancel entire order
    FOK,
    /// Good-Till-Date - remains active until specified expiry time
    GTD,
    /// Day order - expires at end of trading day
    Day,
}

impl TimeInForce {
    /// Returns true if this TIF is permitted on market orders
    pub fn valid_for_market(&self) -> bool {
        matches!(self, TimeInForce::GTC | TimeInForce::IOC | TimeInForce::FOK)
    }

    /// Returns true if this TIF requires an expiry timestamp
    pub fn requires_expire_time(&self) -> bool {
        matches!(self, TimeInForce::GTD)
    }
}

impl fmt::Display for TimeInForce {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimeInForce::GTC => write!(f, "GTC"),
            TimeInForce::IOC => write!(f, "IOC"),
            TimeInForce::FOK => write!(f, "FOK"),
            TimeInForce::GTD => write!(f, "GTD"),
            TimeInForce::Day => write!(f, "DAY"),
        }
    }
}

/// Position side for position-related operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PositionSide {
    /// No position
    #[default]
    Flat,
    /// Long position (bought)
    Long,
    /// Short position (sold)
    Short,
}

impl PositionSide {
    /// Signed direction: +1 long, -1 short, 0 flat
    pub fn sign(&self) -> Decimal {
        match self {
            PositionSide::Flat => Decimal::ZERO,
            PositionSide::Long => Decimal::ONE,
            PositionSide::Short => -Decimal::ONE,
        }
    }

    /// Order side that grows a position on this side
    pub fn entry_side(&self) -> Option<OrderSide> {
        match self {
            PositionSide::Flat => None,
            PositionSide::Long => Some(OrderSide::Buy),
            PositionSide::Short => Some(OrderSide::Sell),
        }
    }
}

impl fmt::Display for PositionSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PositionSide::Flat => write!(f, "FLAT"),
            PositionSide::Long => write!(f, "LONG"),
            PositionSide::Short => write!(f, "SHORT"),
        }
    }
}

/// Liquidity side indicating whether a fill provided or took liquidity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LiquiditySide {
    /// No liquidity information
    #[default]
    None,
    /// Fill was a maker (provided liquidity)
    Maker,
    /// Fill was a taker (took liquidity)
    Taker,
}

impl fmt::Display for LiquiditySide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LiquiditySide::None => write!(f, "NONE"),
            LiquiditySide::Maker => write!(f, "MAKER"),
            LiquiditySide::Taker => write!(f, "TAKER"),
        }
    }
}

/// Quantity with fixed decimal precision.
///
/// Quantities are non-negative. Equality and ordering are numeric (the
/// canonical integer representation), independent of the display scale, so
/// `1.10` and `1.1` compare equal. Arithmetic across differing precisions
/// fails with [`ValidationError::PrecisionMismatch`].
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Quantity {
    /// The raw quantity value
    raw: Decimal,
    /// Precision (number of decimal places)
    precision: u8,
}

impl Quantity {
    /// Create a new Quantity with explicit precision.
    ///
    /// Fails if the value is negative.
    pub fn new(raw: Decimal, precision: u8) -> Result<Self, ValidationError> {
        if raw.is_sign_negative() && !raw.is_zero() {
            return Err(ValidationError::QuantityNonPositive(raw.to_string()));
        }
        Ok(Self { raw, precision })
    }

    /// Create a Quantity from a Decimal, inferring precision from its scale
    pub fn from_decimal(value: Decimal) -> Result<Self, ValidationError> {
        Self::new(value, value.scale() as u8)
    }

    /// Create zero quantity with given precision
    pub fn zero(precision: u8) -> Self {
        Self {
            raw: Decimal::ZERO,
            precision,
        }
    }

    /// Returns true if quantity is zero
    pub fn is_zero(&self) -> bool {
        self.raw.is_zero()
    }

    /// Returns true if quantity is strictly positive
    pub fn is_positive(&self) -> bool {
        !self.raw.is_zero()
    }

    /// Returns the raw Decimal value
    pub fn as_decimal(&self) -> Decimal {
        self.raw
    }

    /// Returns the precision (number of decimal places)
    pub fn precision(&self) -> u8 {
        self.precision
    }

    /// Checked addition; both operands must carry the same precision
    pub fn try_add(&self, other: &Quantity) -> Result<Quantity, ValidationError> {
        self.check_precision(other)?;
        Quantity::new(self.raw + other.raw, self.precision)
    }

    /// Checked subtraction; fails on precision mismatch or negative result
    pub fn try_sub(&self, other: &Quantity) -> Result<Quantity, ValidationError> {
        self.check_precision(other)?;
        Quantity::new(self.raw - other.raw, self.precision)
    }

    fn check_precision(&self, other: &Quantity) -> Result<(), ValidationError> {
        if self.precision != other.precision {
            return Err(ValidationError::PrecisionMismatch {
                lhs: self.raw.to_string(),
                lhs_precision: self.precision,
                rhs: other.raw.to_string(),
                rhs_precision: other.precision,
            });
        }
        Ok(())
    }
}

impl PartialEq for Quantity {
    fn eq(&self, other: &Self) -> bool {
        self.raw == other.raw
    }
}

impl Eq for Quantity {}

impl PartialOrd for Quantity {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Quantity {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.raw.cmp(&other.raw)
    }
}

impl Hash for Quantity {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.raw.normalize().hash(state);
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.raw)
    }
}

/// Price with fixed decimal precision.
///
/// Prices are non-negative and share the comparison and arithmetic semantics
/// of [`Quantity`].
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Price {
    /// The raw price value
    raw: Decimal,
    /// Precision (number of decimal places)
    precision: u8,
}

impl Price {
    /// Create a new Price with explicit precision.
    ///
    /// Fails if the value is negative.
    pub fn new(raw: Decimal, precision: u8) -> Result<Self, ValidationError> {
        if raw.is_sign_negative() && !raw.is_zero() {
            return Err(ValidationError::PriceNegative(raw.to_string()));
        }
        Ok(Self { raw, precision })
    }

    /// Create a Price from a Decimal, inferring precision from its scale
    pub fn from_decimal(value: Decimal) -> Result<Self, ValidationError> {
        Self::new(value, value.scale() as u8)
    }

    /// Returns true if price is zero
    pub fn is_zero(&self) -> bool {
        self.raw.is_zero()
    }

    /// Returns the raw Decimal value
    pub fn as_decimal(&self) -> Decimal {
        self.raw
    }

    /// Returns the precision (number of decimal places)
    pub fn precision(&self) -> u8 {
        self.precision
    }

    /// Checked addition; both operands must carry the same precision
    pub fn try_add(&self, other: &Price) -> Result<Price, ValidationError> {
        self.check_precision(other)?;
        Price::new(self.raw + other.raw, self.precision)
    }

    /// Checked subtraction; fails on precision mismatch or negative result
    pub fn try_sub(&self, other: &Price) -> Result<Price, ValidationError> {
        self.check_precision(other)?;
        Price::new(self.raw - other.raw, self.precision)
    }

    fn check_precision(&self, other: &Price) -> Result<(), ValidationError> {
        if self.precision != other.precision {
            return Err(ValidationError::PrecisionMismatch {
                lhs: self.raw.to_string(),
                lhs_precision: self.precision,
                rhs: other.raw.to_string(),
                rhs_precision: other.precision,
            });
        }
        Ok(())
    }
}

impl PartialEq for Price {
    fn eq(&self, other: &Self) -> bool {
        self.raw == other.raw
    }
}

impl Eq for Price {}

impl PartialOrd for Price {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Price {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.raw.cmp(&other.raw)
    }
}

impl Hash for Price {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.raw.normalize().hash(state);
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.raw)
    }
}

/// Validate an identifier value: non-empty, no control characters.
fn validate_identifier(value: &str, field: &'static str) -> Result<(), ValidationError> {
    if value.is_empty() {
        return Err(ValidationError::required(field));
    }
    if value.chars().any(|c| c.is_control()) {
        return Err(ValidationError::invalid_chars(field));
    }
    Ok(())
}

macro_rules! identifier {
    ($(#[$meta:meta])* $name:ident, $field:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub struct $name(String);

        impl $name {
            /// Create a new identifier, validating the value.
            pub fn new(value: impl Into<String>) -> Result<Self, ValidationError> {
                let value = value.into();
                validate_identifier(&value, $field)?;
                Ok(Self(value))
            }

            /// Get the inner string value
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

identifier!(
    /// Identifier for the trading node owning all persisted state.
    TraderId,
    "trader_id"
);

identifier!(
    /// Identifier for the strategy that created an order.
    StrategyId,
    "strategy_id"
);

identifier!(
    /// Client-assigned order identifier (unique within the trader).
    ClientOrderId,
    "client_order_id"
);

identifier!(
    /// Venue-assigned order identifier (set after acceptance).
    VenueOrderId,
    "venue_order_id"
);

identifier!(
    /// Identifier for a single fill/execution reported by the venue.
    TradeId,
    "trade_id"
);

identifier!(
    /// Engine-assigned identifier for a position.
    PositionId,
    "position_id"
);

identifier!(
    /// Identifier for a trading account at a venue.
    AccountId,
    "account_id"
);

impl ClientOrderId {
    /// Generate a new unique ClientOrderId using UUID
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }
}

impl TradeId {
    /// Generate a new unique TradeId using UUID
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }
}

impl PositionId {
    /// Generate a new unique PositionId using UUID
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }
}

/// Instrument identifier combining a symbol and the venue it trades on.
///
/// Format: `{symbol}.{venue}` (e.g., "BTCUSDT.BINANCE")
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct InstrumentId {
    /// The symbol (e.g., "BTCUSDT")
    pub symbol: String,
    /// The venue/exchange (e.g., "BINANCE")
    pub venue: String,
}

impl InstrumentId {
    /// Create a new InstrumentId, validating both components.
    pub fn new(
        symbol: impl Into<String>,
        venue: impl Into<String>,
    ) -> Result<Self, ValidationError> {
        let symbol = symbol.into();
        let venue = venue.into();
        validate_identifier(&symbol, "symbol")?;
        validate_identifier(&venue, "venue")?;
        Ok(Self { symbol, venue })
    }
}

impl FromStr for InstrumentId {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once('.') {
            Some((symbol, venue)) => Self::new(symbol, venue),
            None => Err(ValidationError::InvalidCharacters {
                field: "instrument_id",
            }),
        }
    }
}

impl fmt::Display for InstrumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.symbol, self.venue)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_order_side_opposite() {
        assert_eq!(OrderSide::Buy.opposite(), OrderSide::Sell);
        assert_eq!(OrderSide::Sell.opposite(), OrderSide::Buy);
        assert_eq!(OrderSide::Buy.sign(), dec!(1));
        assert_eq!(OrderSide::Sell.sign(), dec!(-1));
    }

    #[test]
    fn test_order_type_requirements() {
        assert!(!OrderType::Market.requires_price());
        assert!(OrderType::Limit.requires_price());
        assert!(OrderType::Stop.requires_trigger_price());

        assert!(!OrderType::Market.supports_amendment());
        assert!(OrderType::Limit.supports_amendment());
    }

    #[test]
    fn test_order_status_terminal() {
        assert!(OrderStatus::Filled.is_terminal());
        assert!(OrderStatus::Cancelled.is_terminal());
        assert!(OrderStatus::Rejected.is_terminal());
        assert!(OrderStatus::Expired.is_terminal());
        assert!(OrderStatus::Denied.is_terminal());

        assert!(!OrderStatus::Working.is_terminal());
        assert!(!OrderStatus::PartiallyFilled.is_terminal());
    }

    #[test]
    fn test_order_status_transitions() {
        assert!(OrderStatus::Initialized.can_transition_to(OrderStatus::Submitted));
        assert!(OrderStatus::Submitted.can_transition_to(OrderStatus::Accepted));
        assert!(OrderStatus::Submitted.can_transition_to(OrderStatus::Denied));
        assert!(OrderStatus::Accepted.can_transition_to(OrderStatus::Working));
        assert!(OrderStatus::Accepted.can_transition_to(OrderStatus::Rejected));
        assert!(OrderStatus::Accepted.can_transition_to(OrderStatus::Filled));
        assert!(OrderStatus::Working.can_transition_to(OrderStatus::Amended));
        assert!(OrderStatus::Amended.can_transition_to(OrderStatus::Working));
        assert!(OrderStatus::PartiallyFilled.can_transition_to(OrderStatus::Filled));

        // Invalid transitions
        assert!(!OrderStatus::Filled.can_transition_to(OrderStatus::Cancelled));
        assert!(!OrderStatus::Rejected.can_transition_to(OrderStatus::Accepted));
        assert!(!OrderStatus::Initialized.can_transition_to(OrderStatus::Accepted));
        assert!(!OrderStatus::Working.can_transition_to(OrderStatus::Submitted));
    }

    #[test]
    fn test_time_in_force_market_validity() {
        assert!(TimeInForce::GTC.valid_for_market());
        assert!(TimeInForce::IOC.valid_for_market());
        assert!(TimeInForce::FOK.valid_for_market());
        assert!(!TimeInForce::GTD.valid_for_market());
        assert!(!TimeInForce::Day.valid_for_market());
    }

    #[test]
    fn test_quantity_rejects_negative() {
        assert!(Quantity::new(dec!(-1), 0).is_err());
        assert!(Quantity::new(dec!(0), 0).is_ok());
        assert!(Quantity::new(dec!(1.5), 1).is_ok());
    }

    #[test]
    fn test_quantity_canonical_equality() {
        let a = Quantity::new(dec!(1.10), 2).unwrap();
        let b = Quantity::new(dec!(1.1), 1).unwrap();
        assert_eq!(a, b);
        assert!(a <= b && b <= a);
    }

    #[test]
    fn test_quantity_precision_mismatch() {
        let a = Quantity::new(dec!(1.10), 2).unwrap();
        let b = Quantity::new(dec!(1.1), 1).unwrap();
        let err = a.try_add(&b).unwrap_err();
        assert!(matches!(err, ValidationError::PrecisionMismatch { .. }));
    }

    #[test]
    fn test_quantity_arithmetic() {
        let a = Quantity::new(dec!(1.50), 2).unwrap();
        let b = Quantity::new(dec!(0.25), 2).unwrap();
        assert_eq!(a.try_add(&b).unwrap(), Quantity::new(dec!(1.75), 2).unwrap());
        assert_eq!(a.try_sub(&b).unwrap(), Quantity::new(dec!(1.25), 2).unwrap());

        // Subtraction below zero is refused
        assert!(b.try_sub(&a).is_err());
    }

    #[test]
    fn test_price_rejects_negative() {
        assert!(Price::new(dec!(-0.01), 2).is_err());
        assert!(Price::new(dec!(10.00), 2).is_ok());
    }

    #[test]
    fn test_identifier_validation() {
        assert!(ClientOrderId::new("O-20260801-001").is_ok());
        assert!(ClientOrderId::new("").is_err());
        assert!(StrategyId::new("ema\ncross").is_err());
        assert!(TraderId::new("TRADER-001").is_ok());
    }

    #[test]
    fn test_identifier_generate() {
        let a = ClientOrderId::generate();
        let b = ClientOrderId::generate();
        assert!(!a.as_str().is_empty());
        assert_ne!(a, b);
    }

    #[test]
    fn test_instrument_id() {
        let id = InstrumentId::new("BTCUSDT", "BINANCE").unwrap();
        assert_eq!(id.symbol, "BTCUSDT");
        assert_eq!(id.venue, "BINANCE");
        assert_eq!(format!("{id}"), "BTCUSDT.BINANCE");

        let parsed: InstrumentId = "ETHUSDT.KRAKEN".parse().unwrap();
        assert_eq!(parsed.symbol, "ETHUSDT");
        assert_eq!(parsed.venue, "KRAKEN");

        assert!("NODOTHERE".parse::<InstrumentId>().is_err());
        assert!(InstrumentId::new("", "BINANCE").is_err());
    }
}
