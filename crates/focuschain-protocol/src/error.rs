//! Error types for the message protocol.

/// Errors raised while encoding or decoding protocol messages.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    #[error("empty message")]
    EmptyMessage,

    #[error("malformed message: {0}")]
    Json(#[from] serde_json::Error),
}
