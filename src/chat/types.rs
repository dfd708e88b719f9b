//! Chat types

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Author of a chat message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Model,
}

/// One message in a conversation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: Uuid,
    pub role: Role,
    pub text: String,
    /// Placeholder still waiting for its first fragment
    #[serde(default)]
    pub is_loading: bool,
}

impl ChatMessage {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            role: Role::User,
            text: text.into(),
            is_loading: false,
        }
    }

    pub fn model(text: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            role: Role::Model,
            text: text.into(),
            is_loading: false,
        }
    }

    /// Empty model message awaiting a streamed reply
    pub fn placeholder() -> Self {
        Self {
            is_loading: true,
            ..Self::model("")
        }
    }
}

/// Chat backend errors
#[derive(Debug, Error)]
pub enum ChatError {
    /// No API key found in any of the configured environment variables
    #[error("Chat API key is not configured; set one of: {0}")]
    NotConfigured(String),
    /// Transport failure
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    /// Non-success response or error payload from the API
    #[error("API error {status}: {message}")]
    Api { status: u16, message: String },
    /// Response payload could not be decoded
    #[error("Decode error: {0}")]
    Decode(String),
}
