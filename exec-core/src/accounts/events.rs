//! Account events.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::orders::{AccountId, EventId};

use super::types::{AccountBalance, AccountType, MarginBalance};

/// Snapshot of account balances and margins as reported by the venue.
///
/// Applied atomically: the account's balance and margin maps are replaced
/// wholesale, never merged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountState {
    pub event_id: EventId,
    pub account_id: AccountId,
    pub account_type: AccountType,
    pub balances: Vec<AccountBalance>,
    pub margins: Vec<MarginBalance>,
    pub ts_event: DateTime<Utc>,
}

impl AccountState {
    pub fn new(
        account_id: AccountId,
        account_type: AccountType,
        balances: Vec<AccountBalance>,
        margins: Vec<MarginBalance>,
        ts_event: DateTime<Utc>,
    ) -> Self {
        Self {
            event_id: EventId::new(),
            account_id,
            account_type,
            balances,
            margins,
            ts_event,
        }
    }
}
