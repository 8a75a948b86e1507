// ABOUTME: Database operations for conversations, messages and per-participant unread counters
// ABOUTME: A send creates the conversation on first contact and bumps the recipient's counter
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 ReviewMyCoach Contributors

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use sqlx::{sqlite::SqliteRow, Row, SqlitePool};
use tracing::debug;

use super::{format_timestamp, new_id, parse_timestamp};
use crate::errors::{AppError, AppResult};
use crate::models::{Conversation, Message};

/// Send body
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SendMessageRequest {
    /// Receiving user
    pub recipient_id: String,
    /// Message text
    pub message: String,
    /// Existing conversation, derived from the pair when absent
    pub conversation_id: Option<String>,
}

/// Messaging database operations
pub struct MessagingManager {
    pool: SqlitePool,
}

impl MessagingManager {
    /// Create a new messaging manager
    #[must_use]
    pub const fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Store a message, creating the conversation on first contact
    ///
    /// Conversation upsert, message insert, last-message update and the
    /// recipient's unread increment commit together.
    ///
    /// # Errors
    ///
    /// Returns `invalid_input` for an empty message or a self-addressed one,
    /// `permission_denied` when an explicit conversation id does not belong
    /// to the pair, and `database` on store failure
    pub async fn send(
        &self,
        sender_id: &str,
        sender_name: &str,
        request: &SendMessageRequest,
    ) -> AppResult<Message> {
        let recipient_id = request.recipient_id.trim();
        let body = request.message.trim();
        if recipient_id.is_empty() || body.is_empty() {
            return Err(AppError::invalid_input(
                "recipientId and message are required",
            ));
        }
        if recipient_id == sender_id {
            return Err(AppError::invalid_input("Cannot send a message to yourself"));
        }

        let conversation_id = Conversation::id_for(sender_id, recipient_id);
        if let Some(requested) = &request.conversation_id {
            if *requested != conversation_id {
                return Err(AppError::permission_denied(
                    "Conversation does not belong to this sender and recipient",
                ));
            }
        }

        let now = Utc::now();
        let now_str = format_timestamp(&now);

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| AppError::database(format!("Failed to begin transaction: {e}")))?;

        let (participant_a, participant_b) = if sender_id <= recipient_id {
            (sender_id, recipient_id)
        } else {
            (recipient_id, sender_id)
        };
        sqlx::query(
            r"
            INSERT OR IGNORE INTO conversations (
                id, participant_a, participant_b, last_message, last_message_at,
                last_message_sender, created_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $5)
            ",
        )
        .bind(&conversation_id)
        .bind(participant_a)
        .bind(participant_b)
        .bind(body)
        .bind(&now_str)
        .bind(sender_id)
        .execute(&mut *tx)
        .await
        .map_err(|e| AppError::database(format!("Failed to create conversation: {e}")))?;

        // Ids containing '_' can encode two different pairs to the same key
        let stored = sqlx::query(
            "SELECT participant_a, participant_b FROM conversations WHERE id = $1",
        )
        .bind(&conversation_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| AppError::database(format!("Failed to read conversation: {e}")))?;
        let stored_a: String = stored.get("participant_a");
        let stored_b: String = stored.get("participant_b");
        if stored_a != participant_a || stored_b != participant_b {
            return Err(AppError::permission_denied(
                "Conversation does not belong to this sender and recipient",
            ));
        }

        for participant in [sender_id, recipient_id] {
            sqlx::query(
                "INSERT OR IGNORE INTO conversation_participants (conversation_id, user_id, unread_count) VALUES ($1, $2, 0)",
            )
            .bind(&conversation_id)
            .bind(participant)
            .execute(&mut *tx)
            .await
            .map_err(|e| AppError::database(format!("Failed to add participant: {e}")))?;
        }

        let message = Message {
            id: new_id(),
            conversation_id: conversation_id.clone(),
            sender_id: sender_id.to_owned(),
            sender_name: sender_name.to_owned(),
            recipient_id: recipient_id.to_owned(),
            message: body.to_owned(),
            read: false,
            created_at: now,
        };

        sqlx::query(
            r"
            INSERT INTO messages (id, conversation_id, sender_id, sender_name, recipient_id, body, is_read, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, 0, $7)
            ",
        )
        .bind(&message.id)
        .bind(&conversation_id)
        .bind(sender_id)
        .bind(sender_name)
        .bind(recipient_id)
        .bind(body)
        .bind(&now_str)
        .execute(&mut *tx)
        .await
        .map_err(|e| AppError::database(format!("Failed to store message: {e}")))?;

        sqlx::query(
            "UPDATE conversations SET last_message = $1, last_message_at = $2, last_message_sender = $3 WHERE id = $4",
        )
        .bind(body)
        .bind(&now_str)
        .bind(sender_id)
        .bind(&conversation_id)
        .execute(&mut *tx)
        .await
        .map_err(|e| AppError::database(format!("Failed to update conversation: {e}")))?;

        sqlx::query(
            "UPDATE conversation_participants SET unread_count = unread_count + 1 WHERE conversation_id = $1 AND user_id = $2",
        )
        .bind(&conversation_id)
        .bind(recipient_id)
        .execute(&mut *tx)
        .await
        .map_err(|e| AppError::database(format!("Failed to update unread count: {e}")))?;

        tx.commit()
            .await
            .map_err(|e| AppError::database(format!("Failed to commit message: {e}")))?;

        debug!(conversation_id = %conversation_id, message_id = %message.id, "Message stored");
        Ok(message)
    }

    /// Get a conversation with its unread counters
    ///
    /// # Errors
    ///
    /// Returns an error if database operation fails
    pub async fn get_conversation(&self, conversation_id: &str) -> AppResult<Option<Conversation>> {
        let row = sqlx::query(
            r"
            SELECT id, participant_a, participant_b, last_message, last_message_at,
                   last_message_sender, created_at
            FROM conversations WHERE id = $1
            ",
        )
        .bind(conversation_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to get conversation: {e}")))?;

        let Some(row) = row else {
            return Ok(None);
        };
        let unread = self.unread_counts(conversation_id).await?;
        row_to_conversation(&row, unread).map(Some)
    }

    /// The last `limit` messages of a conversation, oldest first
    ///
    /// # Errors
    ///
    /// Returns an error if database operation fails
    pub async fn list_messages(&self, conversation_id: &str, limit: u32) -> AppResult<Vec<Message>> {
        let rows = sqlx::query(
            r"
            SELECT id, conversation_id, sender_id, sender_name, recipient_id, body, is_read, created_at
            FROM messages WHERE conversation_id = $1
            ORDER BY created_at DESC, rowid DESC
            LIMIT $2
            ",
        )
        .bind(conversation_id)
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to list messages: {e}")))?;

        let mut messages = rows
            .iter()
            .map(row_to_message)
            .collect::<AppResult<Vec<_>>>()?;
        messages.reverse();
        Ok(messages)
    }

    /// Conversations a user takes part in, most recent activity first
    ///
    /// # Errors
    ///
    /// Returns an error if database operation fails
    pub async fn list_conversations(&self, user_id: &str) -> AppResult<Vec<Conversation>> {
        let rows = sqlx::query(
            r"
            SELECT c.id, c.participant_a, c.participant_b, c.last_message, c.last_message_at,
                   c.last_message_sender, c.created_at
            FROM conversations c
            JOIN conversation_participants p ON p.conversation_id = c.id
            WHERE p.user_id = $1
            ORDER BY c.last_message_at DESC, c.id ASC
            ",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to list conversations: {e}")))?;

        let mut conversations = Vec::with_capacity(rows.len());
        for row in &rows {
            let id: String = row.get("id");
            let unread = self.unread_counts(&id).await?;
            conversations.push(row_to_conversation(row, unread)?);
        }
        Ok(conversations)
    }

    /// Reset a participant's unread counter and flag their messages read
    ///
    /// Returns the number of messages flagged.
    ///
    /// # Errors
    ///
    /// Returns an error if database operation fails
    pub async fn mark_read(&self, conversation_id: &str, user_id: &str) -> AppResult<u64> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| AppError::database(format!("Failed to begin transaction: {e}")))?;

        sqlx::query(
            "UPDATE conversation_participants SET unread_count = 0 WHERE conversation_id = $1 AND user_id = $2",
        )
        .bind(conversation_id)
        .bind(user_id)
        .execute(&mut *tx)
        .await
        .map_err(|e| AppError::database(format!("Failed to reset unread count: {e}")))?;

        let result = sqlx::query(
            "UPDATE messages SET is_read = 1 WHERE conversation_id = $1 AND recipient_id = $2 AND is_read = 0",
        )
        .bind(conversation_id)
        .bind(user_id)
        .execute(&mut *tx)
        .await
        .map_err(|e| AppError::database(format!("Failed to mark messages read: {e}")))?;

        tx.commit()
            .await
            .map_err(|e| AppError::database(format!("Failed to commit read marker: {e}")))?;

        Ok(result.rows_affected())
    }

    /// Number of conversations the user takes part in
    ///
    /// # Errors
    ///
    /// Returns an error if database operation fails
    pub async fn count_conversations(&self, user_id: &str) -> AppResult<u64> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM conversation_participants WHERE user_id = $1")
                .bind(user_id)
                .fetch_one(&self.pool)
                .await
                .map_err(|e| AppError::database(format!("Failed to count conversations: {e}")))?;
        Ok(count.max(0) as u64)
    }

    /// Messages the user sent within `[from, to)`
    ///
    /// # Errors
    ///
    /// Returns an error if database operation fails
    pub async fn count_sent_in_range(
        &self,
        user_id: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> AppResult<u64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM messages WHERE sender_id = $1 AND created_at >= $2 AND created_at < $3",
        )
        .bind(user_id)
        .bind(format_timestamp(&from))
        .bind(format_timestamp(&to))
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to count sent messages: {e}")))?;
        Ok(count.max(0) as u64)
    }

    /// Unread messages addressed to the user
    ///
    /// # Errors
    ///
    /// Returns an error if database operation fails
    pub async fn count_unread(&self, user_id: &str) -> AppResult<u64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM messages WHERE recipient_id = $1 AND is_read = 0",
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to count unread messages: {e}")))?;
        Ok(count.max(0) as u64)
    }

    async fn unread_counts(&self, conversation_id: &str) -> AppResult<HashMap<String, u32>> {
        let rows = sqlx::query(
            "SELECT user_id, unread_count FROM conversation_participants WHERE conversation_id = $1",
        )
        .bind(conversation_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to read unread counts: {e}")))?;

        Ok(rows
            .iter()
            .map(|row| {
                let count: i64 = row.get("unread_count");
                (row.get("user_id"), count.max(0) as u32)
            })
            .collect())
    }
}

fn row_to_conversation(
    row: &SqliteRow,
    unread_count: HashMap<String, u32>,
) -> AppResult<Conversation> {
    let last_message_at_str: String = row.get("last_message_at");
    let created_at_str: String = row.get("created_at");

    Ok(Conversation {
        id: row.get("id"),
        participants: vec![row.get("participant_a"), row.get("participant_b")],
        last_message: row.get("last_message"),
        last_message_at: parse_timestamp(&last_message_at_str)?,
        last_message_sender: row.get("last_message_sender"),
        unread_count,
        created_at: parse_timestamp(&created_at_str)?,
    })
}

fn row_to_message(row: &SqliteRow) -> AppResult<Message> {
    let created_at_str: String = row.get("created_at");

    Ok(Message {
        id: row.get("id"),
        conversation_id: row.get("conversation_id"),
        sender_id: row.get("sender_id"),
        sender_name: row.get("sender_name"),
        recipient_id: row.get("recipient_id"),
        message: row.get("body"),
        read: row.get("is_read"),
        created_at: parse_timestamp(&created_at_str)?,
    })
}
