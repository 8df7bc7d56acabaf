use chrono::{serde::ts_milliseconds, DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::mongodb::Id;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
    #[serde(with = "ts_milliseconds")]
    pub timestamp: DateTime<Utc>,
}

/// One stored exchange with the assistant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Conversation {
    pub id: Id,
    pub user_id: Id,
    pub session_id: String,
    pub messages: Vec<ChatMessage>,
    #[serde(with = "ts_milliseconds")]
    pub created_at: DateTime<Utc>,
}

impl Conversation {
    pub fn exchange(user_id: &Id, session_id: String, question: String, answer: String) -> Self {
        let now = Utc::now();
        let message = |role, content| ChatMessage {
            role,
            content,
            timestamp: now,
        };
        Self {
            id: Id::new(),
            user_id: user_id.clone(),
            session_id,
            messages: vec![
                message(ChatRole::User, question),
                message(ChatRole::Assistant, answer),
            ],
            created_at: now,
        }
    }
}
