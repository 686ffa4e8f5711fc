//! Error types for the chat server
//!
//! Defines application-level errors, framing errors and message send errors.
//! Uses thiserror for ergonomic error definitions.

use thiserror::Error;

/// Application-level errors
///
/// Per-client variants end only that client's session; listener-level
/// `Io` errors returned from `ChatServer` terminate the process.
#[derive(Debug, Error)]
pub enum AppError {
    /// IO error (socket or file)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Nickname file is not a JSON array of strings
    #[error("JSON deserialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// Roster actor is gone (internal channel broken)
    #[error("Channel send error")]
    ChannelSend,

    /// Nickname source contained no names
    #[error("Nickname pool is empty")]
    EmptyNicknamePool,

    /// Inbound stream could not be framed
    #[error("Framing error: {0}")]
    Frame(#[from] FrameError),
}

/// Framing errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FrameError {
    /// Pending partial line grew past the configured limit
    #[error("line exceeds {limit} bytes without a newline")]
    LineTooLong { limit: usize },
}

/// Message send errors
///
/// Occurs when attempting to send messages through closed channels.
#[derive(Debug, Error)]
pub enum SendError {
    /// The receiving end of the channel has been closed
    #[error("Channel closed")]
    ChannelClosed,

    /// The client is not draining its queue fast enough
    #[error("Channel full")]
    ChannelFull,
}
