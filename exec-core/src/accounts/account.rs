//! Account entity.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::orders::{AccountId, EventId};

use super::events::AccountState;
use super::types::{AccountBalance, AccountType, MarginBalance};

/// A trading account, created on its first [`AccountState`] event and
/// updated in place thereafter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    /// Unique account identifier
    pub account_id: AccountId,
    /// Account type (Cash, Margin)
    pub account_type: AccountType,
    /// Per-currency balances
    pub balances: HashMap<String, AccountBalance>,
    /// Per-currency margin snapshots
    pub margins: HashMap<String, MarginBalance>,
    /// Event timestamp of the last applied snapshot
    pub ts_last: DateTime<Utc>,
    /// Event IDs of all applied snapshots, for duplicate suppression
    pub event_ids: Vec<EventId>,
}

impl Account {
    /// Create an account from its first state snapshot.
    pub fn from_state(state: &AccountState) -> Self {
        let mut account = Self {
            account_id: state.account_id.clone(),
            account_type: state.account_type,
            balances: HashMap::new(),
            margins: HashMap::new(),
            ts_last: state.ts_event,
            event_ids: Vec::new(),
        };
        account.apply_state(state);
        account
    }

    /// Replace the account snapshot atomically.
    ///
    /// A duplicate event (same `event_id`) is a no-op.
    pub fn apply_state(&mut self, state: &AccountState) {
        if self.event_ids.contains(&state.event_id) {
            return;
        }
        self.account_type = state.account_type;
        self.balances = state
            .balances
            .iter()
            .map(|b| (b.currency.clone(), b.clone()))
            .collect();
        self.margins = state
            .margins
            .iter()
            .map(|m| (m.currency.clone(), m.clone()))
            .collect();
        self.ts_last = state.ts_event;
        self.event_ids.push(state.event_id);
    }

    /// Balance for a currency, if reported
    pub fn balance(&self, currency: &str) -> Option<&AccountBalance> {
        self.balances.get(currency)
    }

    /// Free (unlocked) amount for a currency; zero when unreported
    pub fn free(&self, currency: &str) -> Decimal {
        self.balances
            .get(currency)
            .map(|b| b.free)
            .unwrap_or(Decimal::ZERO)
    }

    /// Margin snapshot for a currency, if reported
    pub fn margin(&self, currency: &str) -> Option<&MarginBalance> {
        self.margins.get(currency)
    }
}
