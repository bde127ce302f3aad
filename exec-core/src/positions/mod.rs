//! Position tracking derived from fill events.

pub mod position;

pub use position::{Position, PositionError};
