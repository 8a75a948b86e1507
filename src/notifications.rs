// ABOUTME: Outbound notification seam for message and job application alerts
// ABOUTME: The default notifier writes structured log events instead of sending email
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 ReviewMyCoach Contributors

use async_trait::async_trait;
use serde::Serialize;
use tracing::{info, warn};

use crate::errors::AppResult;

/// Something a user should hear about outside the app
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Notification {
    /// A message arrived in one of the recipient's conversations
    NewMessage {
        /// Recipient user id
        recipient_id: String,
        /// Recipient address
        recipient_email: String,
        /// Sender display name
        sender_name: String,
        /// Conversation the message belongs to
        conversation_id: String,
        /// First characters of the message
        preview: String,
    },
    /// A coach applied to one of the recipient's job postings
    ApplicationReceived {
        /// Job poster address
        recipient_email: String,
        /// Job title
        job_title: String,
        /// Applying coach's display name
        applicant_name: String,
    },
    /// A job poster accepted or rejected the recipient's application
    ApplicationStatusChanged {
        /// Coach address
        recipient_email: String,
        /// Job title
        job_title: String,
        /// New status
        status: String,
    },
}

/// Delivery channel for notifications
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Deliver one notification
    async fn notify(&self, notification: &Notification) -> AppResult<()>;
}

/// Notifier that only logs
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify(&self, notification: &Notification) -> AppResult<()> {
        match notification {
            Notification::NewMessage {
                recipient_id,
                sender_name,
                conversation_id,
                ..
            } => info!(
                %recipient_id,
                %sender_name,
                %conversation_id,
                "New message notification"
            ),
            Notification::ApplicationReceived {
                job_title,
                applicant_name,
                ..
            } => info!(%job_title, %applicant_name, "Job application notification"),
            Notification::ApplicationStatusChanged {
                job_title, status, ..
            } => info!(%job_title, %status, "Application status notification"),
        }
        Ok(())
    }
}

/// Deliver a notification, logging and swallowing any failure
pub async fn notify_best_effort(notifier: &dyn Notifier, notification: Notification) {
    if let Err(e) = notifier.notify(&notification).await {
        warn!(error = %e, "Notification delivery failed");
    }
}

/// Preview text for a message notification
#[must_use]
pub fn message_preview(message: &str) -> String {
    const PREVIEW_CHARS: usize = 100;
    let mut preview: String = message.chars().take(PREVIEW_CHARS).collect();
    if message.chars().count() > PREVIEW_CHARS {
        preview.push_str("...");
    }
    preview
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn long_messages_are_truncated() {
        assert_eq!(message_preview("hello"), "hello");
        let preview = message_preview(&"a".repeat(150));
        assert_eq!(preview.chars().count(), 103);
        assert!(preview.ends_with("..."));
    }
}
