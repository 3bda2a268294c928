//! Error types for the core library.

use thiserror::Error;

/// Errors that can occur in core operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Message not found.
    #[error("Message not found: {0}")]
    MessageNotFound(String),

    /// A stored row could not be mapped back to a model.
    #[error("Corrupt stored data for message {0}")]
    CorruptRow(String),

    /// MIME part not found within a message.
    #[error("Part {part} not found in message {message}")]
    PartNotFound {
        /// Owning message ID.
        message: String,
        /// Requested part ID.
        part: String,
    },
}

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;
