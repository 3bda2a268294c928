//! # mailbin-core
//!
//! Core storage and eventing for the `mailbin` mail-testing server.
//!
//! This crate provides:
//! - Message models (summaries, full messages, MIME parts)
//! - The `SQLite`-backed message store
//! - Aggregate mailbox statistics
//! - A broadcast-based change notifier for connected clients

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

mod error;
pub mod events;
pub mod message;

pub use error::{Error, Result};
pub use events::{Event, EventBroker};
pub use message::{
    Address, Attachment, MailboxStats, Message, MessageStore, MessageSummary, NewMessage, NewPart,
};
