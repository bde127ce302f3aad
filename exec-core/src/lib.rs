// exec-core: event-driven execution engine and state store.
//
// Venue events flow into the ExecutionEngine, which drives the Order state
// machine, derives Positions from fills, reconciles Accounts, persists
// everything through an ExecutionDatabase (in-memory or Redis), and publishes
// applied events to strategy subscribers.

pub mod accounts;
pub mod database;
pub mod engine;
pub mod error;
pub mod indicators;
pub mod logging;
pub mod orders;
pub mod positions;
