use serde::{Deserialize, Serialize};

use crate::{
    error::Result,
    model::{api::issue::check_length, mongodb::Id},
};

pub const MAX_CHAT_MESSAGE_LENGTH: usize = 2000;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRequest {
    pub message: String,
    pub session_id: Option<String>,
}

impl ChatRequest {
    pub fn validate(&self) -> Result<()> {
        check_length("Message", &self.message, 1, MAX_CHAT_MESSAGE_LENGTH)
    }

    /// The session this message belongs to, starting a new one if needed.
    pub fn session(&self) -> String {
        self.session_id
            .clone()
            .filter(|id| !id.trim().is_empty())
            .unwrap_or_else(|| Id::new().to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatResponse {
    pub session_id: String,
    pub response: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategorizeRequest {
    pub title: String,
    pub description: String,
}
