//! Error types for event validation and routing.

use thiserror::Error;

use crate::types::EventType;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// The payload failed validation; carries the full accumulated list.
    #[error("invalid event: {}", errors.join("; "))]
    Invalid { errors: Vec<String> },
    /// A payload that passed validation but would not deserialize into the
    /// typed model (e.g. a numeric messageId). Kept explicit rather than
    /// panicking on the mismatch.
    #[error("malformed event payload: {context}")]
    Malformed { context: String },
    #[error("No handler found for event type: {0}")]
    NoHandler(EventType),
}

impl Error {
    #[must_use]
    pub fn invalid(errors: Vec<String>) -> Self {
        Self::Invalid { errors }
    }

    #[must_use]
    pub fn malformed(context: impl Into<String>) -> Self {
        Self::Malformed { context: context.into() }
    }
}
