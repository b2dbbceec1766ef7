//! Error types for the game client.

use thiserror::Error;

use missionlink_shared::protocol::{FrameError, RejectReason};

/// Client-specific errors
#[derive(Debug, Error)]
pub enum ClientError {
    /// The server refused the connect request
    #[error("connection rejected ({code}): {reason}", code = .0.code(), reason = .0)]
    Rejected(RejectReason),

    /// Connection error
    #[error("Connection error: {0}")]
    ConnectionError(String),

    #[error(transparent)]
    Protocol(#[from] FrameError),

    #[error("invalid server url: {0}")]
    InvalidUrl(String),
}
