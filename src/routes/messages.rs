// ABOUTME: Route handlers for direct messaging between students and coaches
// ABOUTME: Lists conversations and messages, sends messages and clears unread counters
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 ReviewMyCoach Contributors

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use serde::{Deserialize, Serialize};
use tracing::info;

use super::{parse_limit, Json};
use crate::{
    auth::{authenticate, WithIdToken},
    database::SendMessageRequest,
    errors::{AppError, AppResult},
    models::{Conversation, Message},
    notifications::{message_preview, notify_best_effort, Notification},
    resources::ServerResources,
};

/// Default number of messages returned
const DEFAULT_MESSAGE_LIMIT: u32 = 50;
/// Largest accepted message `limit`
const MAX_MESSAGE_LIMIT: u32 = 200;

/// Query parameters for `GET /api/messages`
#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct MessagesQuery {
    /// Conversation to read
    pub conversation_id: Option<String>,
    /// User whose conversations to list
    pub user_id: Option<String>,
    /// Maximum messages to return
    pub limit: Option<String>,
    /// Token when no header is sent
    pub id_token: Option<String>,
}

/// Body of `PUT /api/messages`
#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct MarkReadRequest {
    /// Conversation to clear
    pub conversation_id: String,
    /// Reader; must be the caller
    pub user_id: String,
}

/// Messages of one conversation, oldest first
#[derive(Debug, Serialize, Deserialize)]
pub struct MessagesResponse {
    /// Messages
    pub messages: Vec<Message>,
}

/// Conversations of one user, most recent activity first
#[derive(Debug, Serialize, Deserialize)]
pub struct ConversationsResponse {
    /// Conversations
    pub conversations: Vec<Conversation>,
}

/// Response for a sent message
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendMessageResponse {
    /// Always true on 200
    pub success: bool,
    /// New message id
    pub message_id: String,
    /// Conversation the message landed in
    pub conversation_id: String,
    /// Human-readable outcome
    pub message: String,
}

/// Response for a read marker
#[derive(Debug, Serialize, Deserialize)]
pub struct MarkReadResponse {
    /// Always true on 200
    pub success: bool,
    /// Human-readable outcome
    pub message: String,
}

/// Messages routes handler
pub struct MessagesRoutes;

impl MessagesRoutes {
    /// Create all messaging routes
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route(
                "/api/messages",
                get(Self::handle_get)
                    .post(Self::handle_send)
                    .put(Self::handle_mark_read),
            )
            .with_state(resources)
    }

    /// Handle GET /api/messages - one conversation or the caller's inbox
    async fn handle_get(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Query(query): Query<MessagesQuery>,
    ) -> Result<Response, AppError> {
        let identity = authenticate(&resources, &headers, query.id_token.as_deref()).await?;
        let messaging = resources.database.messaging();

        if let Some(conversation_id) = query.conversation_id.as_deref() {
            let conversation = messaging
                .get_conversation(conversation_id)
                .await?
                .ok_or_else(|| AppError::not_found("Conversation not found"))?;
            if !conversation.has_participant(&identity.uid) {
                return Err(AppError::permission_denied("Unauthorized"));
            }

            let limit =
                parse_limit(query.limit.as_deref(), DEFAULT_MESSAGE_LIMIT, MAX_MESSAGE_LIMIT)?;
            let messages = messaging.list_messages(conversation_id, limit).await?;
            return Ok((StatusCode::OK, Json(MessagesResponse { messages })).into_response());
        }

        let user_id = query
            .user_id
            .as_deref()
            .ok_or_else(|| AppError::invalid_input("conversationId or userId is required"))?;
        identity.require_user(user_id)?;

        let conversations = messaging.list_conversations(user_id).await?;
        Ok((StatusCode::OK, Json(ConversationsResponse { conversations })).into_response())
    }

    /// Handle POST /api/messages
    async fn handle_send(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Json(request): Json<WithIdToken<SendMessageRequest>>,
    ) -> Result<Response, AppError> {
        let identity = authenticate(&resources, &headers, request.id_token.as_deref()).await?;
        let body = request.body;
        if body.recipient_id.trim().is_empty() || body.message.trim().is_empty() {
            return Err(AppError::invalid_input("recipientId and message are required"));
        }

        let sender_name = Self::display_name(&resources, &identity.uid)
            .await?
            .ok_or_else(|| AppError::not_found("Sender profile not found"))?;

        let message = resources
            .database
            .messaging()
            .send(&identity.uid, &sender_name, &body)
            .await?;
        info!(
            conversation_id = %message.conversation_id,
            message_id = %message.id,
            "Message sent"
        );

        if let Some(recipient_email) = Self::email(&resources, &message.recipient_id).await {
            notify_best_effort(
                resources.notifier.as_ref(),
                Notification::NewMessage {
                    recipient_id: message.recipient_id.clone(),
                    recipient_email,
                    sender_name,
                    conversation_id: message.conversation_id.clone(),
                    preview: message_preview(&message.message),
                },
            )
            .await;
        }

        let response = SendMessageResponse {
            success: true,
            message_id: message.id,
            conversation_id: message.conversation_id,
            message: "Message sent successfully".to_owned(),
        };
        Ok((StatusCode::OK, Json(response)).into_response())
    }

    /// Handle PUT /api/messages - clear the caller's unread state
    async fn handle_mark_read(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Json(request): Json<WithIdToken<MarkReadRequest>>,
    ) -> Result<Response, AppError> {
        let identity = authenticate(&resources, &headers, request.id_token.as_deref()).await?;
        let body = request.body;
        identity.require_user(&body.user_id)?;
        if body.conversation_id.is_empty() {
            return Err(AppError::missing_field("conversationId is required"));
        }

        let messaging = resources.database.messaging();
        let conversation = messaging
            .get_conversation(&body.conversation_id)
            .await?
            .ok_or_else(|| AppError::not_found("Conversation not found"))?;
        if !conversation.has_participant(&identity.uid) {
            return Err(AppError::permission_denied("Unauthorized"));
        }

        messaging.mark_read(&conversation.id, &identity.uid).await?;
        let response = MarkReadResponse {
            success: true,
            message: "Messages marked as read".to_owned(),
        };
        Ok((StatusCode::OK, Json(response)).into_response())
    }

    /// Coach display name or username, else the user profile's display name
    async fn display_name(resources: &ServerResources, user_id: &str) -> AppResult<Option<String>> {
        if let Some(coach) = resources.database.coaches().get_by_user_id(user_id).await? {
            let name = if coach.display_name.trim().is_empty() {
                coach.username
            } else {
                coach.display_name
            };
            return Ok(Some(name));
        }
        Ok(resources
            .database
            .accounts()
            .get(user_id)
            .await?
            .map(|p| p.display_name))
    }

    /// Contact address for notifications; lookup failures count as no address
    async fn email(resources: &ServerResources, user_id: &str) -> Option<String> {
        let coach_email = resources
            .database
            .coaches()
            .get_by_user_id(user_id)
            .await
            .ok()
            .flatten()
            .and_then(|c| c.email);
        if coach_email.is_some() {
            return coach_email;
        }
        resources
            .database
            .accounts()
            .get(user_id)
            .await
            .ok()
            .flatten()
            .and_then(|p| p.email)
    }
}
