/// Crate-wide result type for relay operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Typed relay errors. None of them is fatal: the dispatcher logs and moves
/// on to the next event.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Message text does not carry a `<<request-id>>` reference.
    #[error("malformed request reference: {reason}")]
    MalformedReference { reason: &'static str },

    /// No consumer is registered for the request.
    #[error("no channel registered for request {request_id}")]
    NotFound { request_id: String },

    /// The request already has a live consumer.
    #[error("request {request_id} is already registered")]
    DuplicateRequest { request_id: String },

    /// Per-request channels need room for at least one notification.
    #[error("invalid channel capacity: {capacity}")]
    InvalidCapacity { capacity: usize },

    /// The consumer is not draining; the notification was dropped.
    #[error("notification channel for request {request_id} is full")]
    ChannelFull { request_id: String },

    /// The consumer dropped its receiver without unregistering.
    #[error("consumer for request {request_id} is gone")]
    ConsumerClosed { request_id: String },

    /// Callback POST failed (connect, timeout, or non-2xx status).
    #[error("callback delivery failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// JSON serialization failed.
    #[error(transparent)]
    SerdeJson(#[from] serde_json::Error),
}

impl Error {
    #[must_use]
    pub fn not_found(request_id: impl std::fmt::Display) -> Self {
        Self::NotFound {
            request_id: request_id.to_string(),
        }
    }

    #[must_use]
    pub fn duplicate(request_id: impl std::fmt::Display) -> Self {
        Self::DuplicateRequest {
            request_id: request_id.to_string(),
        }
    }

    /// Short label used for log fields and metric labels.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::MalformedReference { .. } => "malformed_reference",
            Self::NotFound { .. } => "not_found",
            Self::DuplicateRequest { .. } => "duplicate_request",
            Self::InvalidCapacity { .. } => "invalid_capacity",
            Self::ChannelFull { .. } => "channel_full",
            Self::ConsumerClosed { .. } => "consumer_closed",
            Self::Transport(_) => "transport",
            Self::SerdeJson(_) => "serde_json",
        }
    }
}
