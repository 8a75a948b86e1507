// ABOUTME: Conversation and message records for user-to-user messaging
// ABOUTME: Conversation ids are derived from the sorted participant pair
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 ReviewMyCoach Contributors

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A two-party conversation with denormalized last-message data
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Conversation {
    /// Deterministic id, see [`Conversation::id_for`]
    pub id: String,
    /// Both participant uids, sorted
    pub participants: Vec<String>,
    /// Body of the most recent message
    pub last_message: String,
    /// Time of the most recent message
    pub last_message_at: DateTime<Utc>,
    /// Sender of the most recent message
    pub last_message_sender: String,
    /// Unread message count per participant uid
    pub unread_count: HashMap<String, u32>,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

impl Conversation {
    /// Conversation id for a pair of users, independent of argument order
    #[must_use]
    pub fn id_for(a: &str, b: &str) -> String {
        if a <= b {
            format!("{a}_{b}")
        } else {
            format!("{b}_{a}")
        }
    }

    /// Whether `user_id` takes part in this conversation
    #[must_use]
    pub fn has_participant(&self, user_id: &str) -> bool {
        self.participants.iter().any(|p| p == user_id)
    }
}

/// A single message
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    /// Record identifier
    pub id: String,
    /// Owning conversation
    pub conversation_id: String,
    /// Sender uid
    pub sender_id: String,
    /// Sender display name at send time
    pub sender_name: String,
    /// Recipient uid
    pub recipient_id: String,
    /// Trimmed message body
    pub message: String,
    /// Whether the recipient has read it
    pub read: bool,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::Conversation;

    #[test]
    fn conversation_id_is_order_independent() {
        assert_eq!(
            Conversation::id_for("alice", "bob"),
            Conversation::id_for("bob", "alice")
        );
        assert_eq!(Conversation::id_for("bob", "alice"), "alice_bob");
    }
}
