//! Account state: per-currency balances and margin snapshots.

pub mod account;
pub mod events;
pub mod types;

pub use account::Account;
pub use events::AccountState;
pub use types::{AccountBalance, AccountType, MarginBalance};
