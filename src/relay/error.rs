//! Relay error taxonomy

use uuid::Uuid;

use crate::ws::protocol::{ErrorPayload, ServerMsg};

/// Reasons an incoming event is rejected. None of them are fatal to the relay.
#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    #[error("Malformed event: {0}")]
    MalformedEvent(String),

    #[error("Unknown participant {0}")]
    UnknownIdentity(Uuid),

    #[error("Participant {bound} tried to act as {claimed}")]
    SpoofedIdentity { bound: Uuid, claimed: String },

    #[error("Relay is not running")]
    Closed,
}

impl RelayError {
    /// Stable code sent to clients in `error` frames
    pub fn code(&self) -> &'static str {
        match self {
            RelayError::MalformedEvent(_) => "malformed_event",
            RelayError::UnknownIdentity(_) => "unknown_identity",
            RelayError::SpoofedIdentity { .. } => "spoofed_identity",
            RelayError::Closed => "relay_closed",
        }
    }

    pub fn to_msg(&self) -> ServerMsg {
        ServerMsg::Error(ErrorPayload {
            code: self.code().to_string(),
            message: self.to_string(),
        })
    }
}
