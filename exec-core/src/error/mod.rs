//! Shared error types for the execution core.
//!
//! Component-specific errors (order state machine, engine) live next to
//! their components and wrap these with `#[from]`.

mod common;

pub use common::{DatabaseError, DatabaseResult, ValidationError};
