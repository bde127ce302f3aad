//! Execution client contract.
//!
//! The execution client is the engine's outbound seam to a venue: commands
//! go out through [`ExecutionClient::send`], and the client delivers venue
//! events - in venue-declared order - into the engine's event channel (the
//! `mpsc` sender handed to the client at wiring time).

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use super::commands::{CommandId, TradingCommand};

/// Errors surfaced by an execution client.
#[derive(Debug, Clone, Error)]
#[non_exhaustive]
pub enum ClientError {
    /// The venue cannot be reached
    #[error("venue unavailable: {0}")]
    VenueUnavailable(String),

    /// The client is not connected
    #[error("client not connected")]
    NotConnected,

    /// The venue refused the command outright
    #[error("command refused: {0}")]
    Refused(String),
}

/// Acknowledgement that a command was handed to the venue.
///
/// This is transport-level only; the trading outcome arrives later as venue
/// events correlated by `cl_ord_id`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandAck {
    pub command_id: CommandId,
    pub ts_ack: DateTime<Utc>,
}

/// Outbound venue connection used by the engine.
#[async_trait]
pub trait ExecutionClient: Send + Sync {
    /// Establish the venue connection.
    async fn connect(&self) -> Result<(), ClientError>;

    /// Tear down the venue connection.
    async fn disconnect(&self) -> Result<(), ClientError>;

    /// Release all client resources. The client must not be used afterwards.
    async fn dispose(&self) -> Result<(), ClientError>;

    /// Submit a command without blocking on the trading outcome.
    async fn send(&self, command: &TradingCommand) -> Result<CommandAck, ClientError>;
}
