//! Position entity.
//!
//! A `Position` accumulates the fills for one `(strategy_id, symbol)` pair.
//! It is opened by the engine on the first fill with no open position, mutated
//! only by the engine, and retained after it goes flat.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::ValidationError;
use crate::orders::{
    InstrumentId, OrderFilled, OrderSide, PositionId, PositionSide, Quantity, StrategyId, TradeId,
};

/// Errors from position event application.
#[derive(Debug, Clone, thiserror::Error)]
pub enum PositionError {
    #[error("fill instrument {fill} does not match position instrument {position}")]
    InstrumentMismatch {
        fill: InstrumentId,
        position: InstrumentId,
    },

    #[error(transparent)]
    Validation(#[from] ValidationError),
}

/// A netted position for one `(strategy_id, symbol)` pair.
///
/// Invariants maintained across every fill application:
/// - `quantity >= 0`
/// - `side == FLAT` iff `quantity == 0`
/// - `buy_qty - sell_qty` equals the current signed quantity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    /// Engine-assigned position identifier
    pub position_id: PositionId,
    /// Instrument of all fills in this position
    pub instrument_id: InstrumentId,
    /// Strategy owning this position
    pub strategy_id: StrategyId,
    /// Current side (FLAT when quantity is zero)
    pub side: PositionSide,
    /// Current open quantity (always non-negative)
    pub quantity: Quantity,
    /// Quantity-weighted average open price of the current side
    pub avg_open_px: Decimal,
    /// Realized PnL accumulated over all closing fills
    pub realized_pnl: Decimal,
    /// Total bought quantity over the position's lifetime
    pub buy_qty: Decimal,
    /// Total sold quantity over the position's lifetime
    pub sell_qty: Decimal,
    /// Execution IDs of all applied fills, in application order
    pub trade_ids: Vec<TradeId>,
    /// When the current side was opened
    pub ts_opened: DateTime<Utc>,
    /// When the position went flat (unset while open)
    pub ts_closed: Option<DateTime<Utc>>,
    /// Event timestamp of the last applied fill
    pub ts_last: DateTime<Utc>,
}

impl Position {
    /// Open a new position from its first fill.
    pub fn open(position_id: PositionId, fill: &OrderFilled) -> Result<Self, PositionError> {
        let mut position = Self {
            position_id,
            instrument_id: fill.instrument_id.clone(),
            strategy_id: fill.strategy_id.clone(),
            side: PositionSide::Flat,
            quantity: Quantity::zero(fill.last_qty.precision()),
            avg_open_px: Decimal::ZERO,
            realized_pnl: Decimal::ZERO,
            buy_qty: Decimal::ZERO,
            sell_qty: Decimal::ZERO,
            trade_ids: Vec::new(),
            ts_opened: fill.ts_event,
            ts_closed: None,
            ts_last: fill.ts_event,
        };
        position.apply_fill(fill)?;
        Ok(position)
    }

    /// Returns true if the position has open quantity
    pub fn is_open(&self) -> bool {
        !matches!(self.side, PositionSide::Flat)
    }

    /// Returns true if the position is flat
    pub fn is_flat(&self) -> bool {
        matches!(self.side, PositionSide::Flat)
    }

    /// Signed open quantity: positive long, negative short, zero flat
    pub fn signed_qty(&self) -> Decimal {
        self.quantity.as_decimal() * self.side.sign()
    }

    /// Unrealized PnL of the open quantity against a mark price
    pub fn unrealized_pnl(&self, mark_px: Decimal) -> Decimal {
        (mark_px - self.avg_open_px) * self.quantity.as_decimal() * self.side.sign()
    }

    /// Apply a fill to the position.
    ///
    /// A duplicate execution ID is a no-op returning success. Application is
    /// monotone: each fill either grows the current side (weighted-average
    /// entry), reduces it (realizing PnL on the closed portion), flips it, or
    /// flattens it.
    pub fn apply_fill(&mut self, fill: &OrderFilled) -> Result<(), PositionError> {
        if fill.instrument_id != self.instrument_id {
            return Err(PositionError::InstrumentMismatch {
                fill: fill.instrument_id.clone(),
                position: self.instrument_id.clone(),
            });
        }
        if self.trade_ids.contains(&fill.trade_id) {
            return Ok(());
        }
        if !fill.last_qty.is_positive() {
            return Err(PositionError::Validation(
                ValidationError::QuantityNonPositive(fill.last_qty.to_string()),
            ));
        }

        let fill_qty = fill.last_qty.as_decimal();
        let fill_px = fill.last_px.as_decimal();

        match (self.side, fill.order_side) {
            (PositionSide::Flat, side) => {
                // Opening fill
                self.side = match side {
                    OrderSide::Buy => PositionSide::Long,
                    OrderSide::Sell => PositionSide::Short,
                };
                self.quantity = fill.last_qty;
                self.avg_open_px = fill_px;
                self.ts_opened = fill.ts_event;
                self.ts_closed = None;
            }
            (PositionSide::Long, OrderSide::Buy) | (PositionSide::Short, OrderSide::Sell) => {
                // Same direction: grow with quantity-weighted entry price
                let open_qty = self.quantity.as_decimal();
                let total = open_qty + fill_qty;
                self.avg_open_px = (self.avg_open_px * open_qty + fill_px * fill_qty) / total;
                self.quantity = self.quantity.try_add(&fill.last_qty)?;
            }
            (PositionSide::Long, OrderSide::Sell) | (PositionSide::Short, OrderSide::Buy) => {
                // Opposing direction: realize PnL on the closed portion
                let open_qty = self.quantity.as_decimal();
                let closed_qty = open_qty.min(fill_qty);
                self.realized_pnl += (fill_px - self.avg_open_px) * closed_qty * self.side.sign();

                if fill_qty > open_qty {
                    // Flip: the residual opens the opposing side
                    self.side = match self.side {
                        PositionSide::Long => PositionSide::Short,
                        PositionSide::Short => PositionSide::Long,
                        PositionSide::Flat => unreachable!("opposing fill on flat position"),
                    };
                    self.quantity =
                        Quantity::new(fill_qty - open_qty, fill.last_qty.precision())?;
                    self.avg_open_px = fill_px;
                    self.ts_opened = fill.ts_event;
                    self.ts_closed = None;
                } else {
                    self.quantity = self.quantity.try_sub(&fill.last_qty)?;
                    if self.quantity.is_zero() {
                        self.side = PositionSide::Flat;
                        self.ts_closed = Some(fill.ts_event);
                    }
                }
            }
        }

        match fill.order_side {
            OrderSide::Buy => self.buy_qty += fill_qty,
            OrderSide::Sell => self.sell_qty += fill_qty,
        }
        self.trade_ids.push(fill.trade_id.clone());
        self.ts_last = fill.ts_event;
        Ok(())
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Position({} {} {} {} @ {} pnl={})",
            self.position_id,
            self.side,
            self.quantity,
            self.instrument_id,
            self.avg_open_px,
            self.realized_pnl,
        )
    }
}
