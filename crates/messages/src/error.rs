use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// Payload root is not a shape the pipeline accepts (non-object or
    /// array-rooted). The message text is user-presentable.
    #[error("{0}")]
    Structural(String),

    #[error("Unknown message format - must have \"messages\" array or message \"type\"")]
    UnknownFormat,

    #[error("Unsupported message type")]
    UnsupportedMessageType,

    /// Detection or extraction failed while converting wire to canonical.
    #[error("Message adaptation failed: {0}")]
    AdaptationFailed(String),
}

impl Error {
    #[must_use]
    pub fn structural(message: impl Into<String>) -> Self {
        Self::Structural(message.into())
    }

    #[must_use]
    pub fn adaptation(source: impl std::fmt::Display) -> Self {
        Self::AdaptationFailed(source.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
