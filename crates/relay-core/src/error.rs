use thiserror::Error;

#[derive(Debug, Error)]
pub enum RelayError {
    #[error("Configuration error: {0}")]
    Config(String),

    /// Unauthenticated connection sent something other than `auth`.
    #[error("Protocol violation: {0}")]
    ProtocolViolation(String),

    /// Inbound text could not be parsed into a usable frame.
    #[error("Malformed input: {0}")]
    MalformedInput(String),

    /// Known envelope, but no handler for this `type`.
    #[error("Unknown event type: {event_type}")]
    UnknownEventType { event_type: String },

    #[error("Credential validator unreachable: {0}")]
    ValidatorUnreachable(String),

    #[error("Authentication failed: {0}")]
    AuthFailed(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl RelayError {
    /// Short code used in structured log fields.
    pub fn code(&self) -> &'static str {
        match self {
            RelayError::Config(_) => "CONFIG_ERROR",
            RelayError::ProtocolViolation(_) => "PROTOCOL_VIOLATION",
            RelayError::MalformedInput(_) => "MALFORMED_INPUT",
            RelayError::UnknownEventType { .. } => "UNKNOWN_EVENT_TYPE",
            RelayError::ValidatorUnreachable(_) => "VALIDATOR_UNREACHABLE",
            RelayError::AuthFailed(_) => "AUTH_FAILED",
            RelayError::Serialization(_) => "SERIALIZATION_ERROR",
        }
    }
}

pub type Result<T> = std::result::Result<T, RelayError>;
