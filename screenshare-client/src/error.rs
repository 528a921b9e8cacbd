use crate::orchestrator::LinkState;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MediaError {
    #[error("capture denied: {0}")]
    CaptureDenied(String),

    #[error("capture unavailable: {0}")]
    CaptureUnavailable(String),
}

#[derive(Debug, Error)]
pub enum SignalingError {
    #[error("signaling channel is disconnected")]
    Disconnected,

    #[error("failed to encode signal: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Ошибки согласования одного соединения. Закрывают только этот линк.
#[derive(Debug, Error)]
pub enum NegotiationError {
    #[error("{operation} timed out")]
    Timeout { operation: &'static str },

    #[error("{operation} failed: {message}")]
    Transport {
        operation: &'static str,
        message: String,
    },

    #[error("link cannot move from {from:?} to {to:?}")]
    InvalidTransition { from: LinkState, to: LinkState },

    #[error(transparent)]
    Signaling(#[from] SignalingError),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error(transparent)]
    Media(#[from] MediaError),

    #[error("share request was cancelled")]
    Cancelled,

    #[error("session has shut down")]
    Closed,
}
