//! Account value types.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Account type at the venue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AccountType {
    /// Spot/cash account
    #[default]
    Cash,
    /// Margin account
    Margin,
}

impl fmt::Display for AccountType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AccountType::Cash => write!(f, "CASH"),
            AccountType::Margin => write!(f, "MARGIN"),
        }
    }
}

/// Balance information for a single currency.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountBalance {
    /// Currency of this balance
    pub currency: String,
    /// Total balance in the account
    pub total: Decimal,
    /// Available balance for trading (total - locked)
    pub free: Decimal,
    /// Locked balance (in open orders, margin)
    pub locked: Decimal,
}

impl AccountBalance {
    /// Create a new account balance with nothing locked
    pub fn new(currency: impl Into<String>, total: Decimal) -> Self {
        Self {
            currency: currency.into(),
            total,
            free: total,
            locked: Decimal::ZERO,
        }
    }

    /// Create a balance with a locked portion
    pub fn with_locked(currency: impl Into<String>, total: Decimal, locked: Decimal) -> Self {
        Self {
            currency: currency.into(),
            total,
            free: total - locked,
            locked,
        }
    }
}

impl fmt::Display for AccountBalance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} total={} free={} locked={}",
            self.currency, self.total, self.free, self.locked
        )
    }
}

/// Margin requirement snapshot for a single currency.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarginBalance {
    /// Currency of the margin amounts
    pub currency: String,
    /// Initial margin requirement
    pub initial: Decimal,
    /// Maintenance margin requirement
    pub maintenance: Decimal,
}

impl MarginBalance {
    pub fn new(currency: impl Into<String>, initial: Decimal, maintenance: Decimal) -> Self {
        Self {
            currency: currency.into(),
            initial,
            maintenance,
        }
    }
}

impl fmt::Display for MarginBalance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} initial={} maintenance={}",
            self.currency, self.initial, self.maintenance
        )
    }
}
