//! Message storage repository.

use chrono::{DateTime, Utc};
use sqlx::Row;
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions, SqliteRow};
use uuid::Uuid;

use super::model::{
    Address, Attachment, MailboxStats, Message, MessageSummary, NewMessage, NewPart,
};
use crate::{Error, Result};

/// Repository for captured message storage and retrieval.
///
/// All mutable message state lives here; API handlers hold no state between
/// requests and re-read from the store every time.
pub struct MessageStore {
    pool: SqlitePool,
}

impl MessageStore {
    /// Create a new store with the given database path.
    ///
    /// Creates the database and tables if they don't exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the database connection fails or schema creation fails.
    pub async fn new(database_path: &str) -> Result<Self> {
        let url = format!("sqlite:{database_path}?mode=rwc");
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect(&url)
            .await?;

        let store = Self { pool };
        store.initialize().await?;
        Ok(store)
    }

    /// Create an in-memory store for testing.
    ///
    /// # Errors
    ///
    /// Returns an error if the database connection fails or schema creation fails.
    pub async fn in_memory() -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await?;

        let store = Self { pool };
        store.initialize().await?;
        Ok(store)
    }

    /// Initialize database schema.
    async fn initialize(&self) -> Result<()> {
        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS messages (
                id TEXT PRIMARY KEY,
                created TEXT NOT NULL,
                is_read INTEGER NOT NULL DEFAULT 0,
                sender_name TEXT NOT NULL DEFAULT '',
                sender_address TEXT NOT NULL DEFAULT '',
                recipients TEXT NOT NULL DEFAULT '[]',
                subject TEXT NOT NULL DEFAULT '',
                size INTEGER NOT NULL DEFAULT 0,
                body_text TEXT NOT NULL DEFAULT '',
                body_html TEXT NOT NULL DEFAULT '',
                raw BLOB NOT NULL,
                search TEXT NOT NULL DEFAULT ''
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS parts (
                message_id TEXT NOT NULL,
                part_id TEXT NOT NULL,
                content_id TEXT NOT NULL DEFAULT '',
                content_type TEXT NOT NULL DEFAULT '',
                file_name TEXT NOT NULL DEFAULT '',
                is_inline INTEGER NOT NULL DEFAULT 0,
                content BLOB NOT NULL,
                PRIMARY KEY (message_id, part_id)
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        // Indexes for efficient lookups
        sqlx::query(r"CREATE INDEX IF NOT EXISTS idx_messages_created ON messages(created)")
            .execute(&self.pool)
            .await?;

        sqlx::query(r"CREATE INDEX IF NOT EXISTS idx_parts_message ON parts(message_id)")
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Store a captured message, assigning its ID and per-part IDs.
    ///
    /// Returns the assigned message ID.
    ///
    /// # Errors
    ///
    /// Returns an error if a database query fails or recipient
    /// serialization fails.
    pub async fn add(&self, message: &NewMessage) -> Result<String> {
        let id = Uuid::new_v4().to_string();
        let created = message.created.unwrap_or_else(Utc::now);
        let recipients = serde_json::to_string(&message.to)?;
        let size = i64::try_from(message.raw.len()).unwrap_or(i64::MAX);
        let (sender_name, sender_address) = message
            .from
            .as_ref()
            .map_or((String::new(), String::new()), |from| {
                (from.name.clone(), from.address.clone())
            });

        sqlx::query(
            r"
            INSERT INTO messages
                (id, created, is_read, sender_name, sender_address, recipients,
                 subject, size, body_text, body_html, raw, search)
            VALUES (?, ?, 0, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ",
        )
        .bind(&id)
        .bind(created.to_rfc3339())
        .bind(&sender_name)
        .bind(&sender_address)
        .bind(&recipients)
        .bind(&message.subject)
        .bind(size)
        .bind(&message.text)
        .bind(&message.html)
        .bind(&message.raw)
        .bind(search_blob(message))
        .execute(&self.pool)
        .await?;

        for (index, part) in message.parts.iter().enumerate() {
            self.add_part(&id, &(index + 1).to_string(), part).await?;
        }

        tracing::debug!(%id, subject = %message.subject, "stored message");
        Ok(id)
    }

    async fn add_part(&self, message_id: &str, part_id: &str, part: &NewPart) -> Result<()> {
        sqlx::query(
            r"
            INSERT INTO parts
                (message_id, part_id, content_id, content_type, file_name, is_inline, content)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            ",
        )
        .bind(message_id)
        .bind(part_id)
        .bind(&part.content_id)
        .bind(&part.content_type)
        .bind(&part.file_name)
        .bind(part.inline)
        .bind(&part.content)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// List message summaries, newest first.
    ///
    /// An out-of-range `start` yields an empty list, not an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list(&self, start: i64, limit: i64) -> Result<Vec<MessageSummary>> {
        let rows = sqlx::query(
            r"
            SELECT m.id, m.is_read, m.sender_name, m.sender_address, m.recipients,
                   m.subject, m.created, m.size,
                   (SELECT COUNT(*) FROM parts p
                    WHERE p.message_id = m.id AND p.is_inline = 0) AS attachments
            FROM messages m
            ORDER BY m.created DESC, m.rowid DESC
            LIMIT ? OFFSET ?
            ",
        )
        .bind(limit)
        .bind(start)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(summary_from_row).collect()
    }

    /// Search message summaries by free text, newest first.
    ///
    /// Matches against sender, recipients, subject, and the text body.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn search(&self, query: &str) -> Result<Vec<MessageSummary>> {
        let pattern = format!("%{}%", query.to_lowercase());
        let rows = sqlx::query(
            r"
            SELECT m.id, m.is_read, m.sender_name, m.sender_address, m.recipients,
                   m.subject, m.created, m.size,
                   (SELECT COUNT(*) FROM parts p
                    WHERE p.message_id = m.id AND p.is_inline = 0) AS attachments
            FROM messages m
            WHERE m.search LIKE ?
            ORDER BY m.created DESC, m.rowid DESC
            ",
        )
        .bind(&pattern)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(summary_from_row).collect()
    }

    /// Get a full message by ID, including bodies and parts.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MessageNotFound`] if the ID is unknown, or another
    /// error if a database query fails.
    pub async fn get_message(&self, id: &str) -> Result<Message> {
        let row = sqlx::query(
            r"
            SELECT id, is_read, sender_name, sender_address, recipients,
                   subject, created, size, body_text, body_html
            FROM messages
            WHERE id = ?
            ",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| Error::MessageNotFound(id.to_string()))?;

        let created = parse_created(&row.get::<String, _>("created"))
            .ok_or_else(|| Error::CorruptRow(id.to_string()))?;
        let recipients: Vec<Address> = serde_json::from_str(&row.get::<String, _>("recipients"))?;

        let mut message = Message {
            id: row.get("id"),
            read: row.get::<bool, _>("is_read"),
            from: sender_from_parts(&row.get::<String, _>("sender_name"), &row.get::<String, _>("sender_address")),
            to: recipients,
            subject: row.get("subject"),
            created,
            size: row.get("size"),
            text: row.get("body_text"),
            html: row.get("body_html"),
            inline: Vec::new(),
            attachments: Vec::new(),
        };

        let part_rows = sqlx::query(
            r"
            SELECT part_id, content_id, content_type, file_name, is_inline, content
            FROM parts
            WHERE message_id = ?
            ORDER BY rowid
            ",
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await?;

        for row in &part_rows {
            let part = attachment_from_row(row);
            if row.get::<bool, _>("is_inline") {
                message.inline.push(part);
            } else {
                message.attachments.push(part);
            }
        }

        Ok(message)
    }

    /// Get one MIME part of a message by its part ID.
    ///
    /// # Errors
    ///
    /// Returns [`Error::PartNotFound`] if the message or part is unknown, or
    /// another error if the database query fails.
    pub async fn get_attachment_part(&self, id: &str, part_id: &str) -> Result<Attachment> {
        let row = sqlx::query(
            r"
            SELECT part_id, content_id, content_type, file_name, is_inline, content
            FROM parts
            WHERE message_id = ? AND part_id = ?
            ",
        )
        .bind(id)
        .bind(part_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| Error::PartNotFound {
            message: id.to_string(),
            part: part_id.to_string(),
        })?;

        Ok(attachment_from_row(&row))
    }

    /// Get the unparsed original source of a message.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MessageNotFound`] if the ID is unknown, or another
    /// error if the database query fails.
    pub async fn get_raw(&self, id: &str) -> Result<Vec<u8>> {
        let row = sqlx::query(r"SELECT raw FROM messages WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| Error::MessageNotFound(id.to_string()))?;

        Ok(row.get("raw"))
    }

    /// Delete one message and its parts.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MessageNotFound`] if the ID is unknown, or another
    /// error if a database query fails.
    pub async fn delete_one(&self, id: &str) -> Result<()> {
        sqlx::query(r"DELETE FROM parts WHERE message_id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        let result = sqlx::query(r"DELETE FROM messages WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(Error::MessageNotFound(id.to_string()));
        }

        Ok(())
    }

    /// Delete every message in the store.
    ///
    /// # Errors
    ///
    /// Returns an error if a database query fails.
    pub async fn delete_all(&self) -> Result<()> {
        sqlx::query(r"DELETE FROM parts").execute(&self.pool).await?;
        sqlx::query(r"DELETE FROM messages")
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Mark one message as read.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MessageNotFound`] if the ID is unknown, or another
    /// error if the database query fails.
    pub async fn mark_read(&self, id: &str) -> Result<()> {
        self.set_read(id, true).await
    }

    /// Mark one message as unread.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MessageNotFound`] if the ID is unknown, or another
    /// error if the database query fails.
    pub async fn mark_unread(&self, id: &str) -> Result<()> {
        self.set_read(id, false).await
    }

    async fn set_read(&self, id: &str, read: bool) -> Result<()> {
        let result = sqlx::query(r"UPDATE messages SET is_read = ? WHERE id = ?")
            .bind(read)
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(Error::MessageNotFound(id.to_string()));
        }

        Ok(())
    }

    /// Mark every message as read.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn mark_all_read(&self) -> Result<()> {
        sqlx::query(r"UPDATE messages SET is_read = 1")
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Recompute aggregate statistics over the whole store.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn stats(&self) -> Result<MailboxStats> {
        let row = sqlx::query(
            r"
            SELECT COUNT(*) AS total,
                   COALESCE(SUM(CASE WHEN is_read = 0 THEN 1 ELSE 0 END), 0) AS unread
            FROM messages
            ",
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(MailboxStats {
            total: row.get("total"),
            unread: row.get("unread"),
        })
    }
}

/// Build the lowercased text blob searched by [`MessageStore::search`].
fn search_blob(message: &NewMessage) -> String {
    let mut blob = String::new();
    blob.push_str(&message.subject);
    blob.push(' ');
    if let Some(from) = &message.from {
        blob.push_str(&from.to_string());
        blob.push(' ');
    }
    for to in &message.to {
        blob.push_str(&to.to_string());
        blob.push(' ');
    }
    blob.push_str(&message.text);
    blob.to_lowercase()
}

fn sender_from_parts(name: &str, address: &str) -> Option<Address> {
    if name.is_empty() && address.is_empty() {
        None
    } else {
        Some(Address::new(name, address))
    }
}

fn parse_created(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .ok()
        .map(|created| created.with_timezone(&Utc))
}

fn summary_from_row(row: &SqliteRow) -> Result<MessageSummary> {
    let id: String = row.get("id");
    let created = parse_created(&row.get::<String, _>("created"))
        .ok_or_else(|| Error::CorruptRow(id.clone()))?;
    let recipients: Vec<Address> = serde_json::from_str(&row.get::<String, _>("recipients"))?;

    Ok(MessageSummary {
        id,
        read: row.get::<bool, _>("is_read"),
        from: sender_from_parts(
            &row.get::<String, _>("sender_name"),
            &row.get::<String, _>("sender_address"),
        ),
        to: recipients,
        subject: row.get("subject"),
        created,
        size: row.get("size"),
        attachments: row.get("attachments"),
    })
}

fn attachment_from_row(row: &SqliteRow) -> Attachment {
    let content: Vec<u8> = row.get("content");
    Attachment {
        part_id: row.get("part_id"),
        content_id: row.get("content_id"),
        content_type: row.get("content_type"),
        file_name: row.get("file_name"),
        size: i64::try_from(content.len()).unwrap_or(i64::MAX),
        content,
    }
}
