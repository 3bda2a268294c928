//! Message model types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single email address with an optional display name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    /// Display name (may be empty).
    pub name: String,
    /// The address itself, e.g. `user@example.com`.
    pub address: String,
}

impl Address {
    /// Create a new address.
    #[must_use]
    pub fn new(name: &str, address: &str) -> Self {
        Self {
            name: name.to_string(),
            address: address.to_string(),
        }
    }
}

impl std::fmt::Display for Address {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.name.is_empty() {
            write!(f, "{}", self.address)
        } else {
            write!(f, "{} <{}>", self.name, self.address)
        }
    }
}

/// Summary of a stored message, used in listings and search results.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageSummary {
    /// Store-assigned unique identifier.
    pub id: String,
    /// Whether the message has been read.
    pub read: bool,
    /// Sender address.
    pub from: Option<Address>,
    /// Recipient addresses.
    pub to: Vec<Address>,
    /// Message subject.
    pub subject: String,
    /// When the message was received.
    pub created: DateTime<Utc>,
    /// Size of the raw message in bytes.
    pub size: i64,
    /// Number of non-inline attachments.
    pub attachments: i64,
}

/// A MIME part of a stored message (attachment or inline resource).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Attachment {
    /// Identifier unique within the owning message, stable across renders.
    pub part_id: String,
    /// Content-ID used by `cid:` references in the HTML body (may be empty).
    pub content_id: String,
    /// MIME content type.
    pub content_type: String,
    /// Original filename (may be empty).
    pub file_name: String,
    /// Size of the part content in bytes.
    pub size: i64,
    /// Raw part content. Not serialized; fetched through the part endpoint.
    #[serde(skip)]
    pub content: Vec<u8>,
}

/// A fully retrieved message, including bodies and parts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    /// Store-assigned unique identifier.
    pub id: String,
    /// Whether the message has been read.
    pub read: bool,
    /// Sender address.
    pub from: Option<Address>,
    /// Recipient addresses.
    pub to: Vec<Address>,
    /// Message subject.
    pub subject: String,
    /// When the message was received.
    pub created: DateTime<Utc>,
    /// Size of the raw message in bytes.
    pub size: i64,
    /// Plain-text body (may be empty).
    pub text: String,
    /// HTML body (may be empty).
    pub html: String,
    /// Inline MIME parts, in MIME order.
    pub inline: Vec<Attachment>,
    /// Attachment MIME parts, in MIME order.
    pub attachments: Vec<Attachment>,
}

/// Aggregate statistics over the whole store.
///
/// Always recomputed by the store; callers must not cache these counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MailboxStats {
    /// Total number of stored messages.
    pub total: i64,
    /// Number of unread messages.
    pub unread: i64,
}

/// A message to be captured into the store.
///
/// The store assigns the message ID and per-part IDs on insert.
#[derive(Debug, Clone, Default)]
pub struct NewMessage {
    /// Sender address.
    pub from: Option<Address>,
    /// Recipient addresses.
    pub to: Vec<Address>,
    /// Message subject.
    pub subject: String,
    /// Received timestamp; defaults to now when `None`.
    pub created: Option<DateTime<Utc>>,
    /// Plain-text body.
    pub text: String,
    /// HTML body.
    pub html: String,
    /// MIME parts beyond the primary bodies.
    pub parts: Vec<NewPart>,
    /// The unparsed original message source.
    pub raw: Vec<u8>,
}

/// A MIME part of a [`NewMessage`].
#[derive(Debug, Clone, Default)]
pub struct NewPart {
    /// Content-ID for `cid:` references (may be empty).
    pub content_id: String,
    /// MIME content type.
    pub content_type: String,
    /// Original filename (may be empty).
    pub file_name: String,
    /// Whether this is an inline part rather than an attachment.
    pub inline: bool,
    /// Raw part content.
    pub content: Vec<u8>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn address_display() {
        let plain = Address::new("", "user@example.com");
        assert_eq!(plain.to_string(), "user@example.com");

        let named = Address::new("Jane Doe", "jane@example.com");
        assert_eq!(named.to_string(), "Jane Doe <jane@example.com>");
    }
}
