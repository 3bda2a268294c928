//! Captured message storage.
//!
//! This module provides:
//! - Models for message summaries, full messages, and MIME parts
//! - The `SQLite`-backed [`MessageStore`] repository
//! - Aggregate mailbox statistics

mod model;
mod repository;

pub use model::{Address, Attachment, MailboxStats, Message, MessageSummary, NewMessage, NewPart};
pub use repository::MessageStore;
