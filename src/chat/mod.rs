//! Streaming chat desk
//!
//! A backend turns one user message into a lazy stream of text fragments;
//! [`ChatDesk`] concatenates them into progressively updated messages.

mod desk;
mod gemini;
mod types;

pub use desk::ChatDesk;
pub use gemini::{GeminiBackend, SseDecoder};
pub use types::{ChatError, ChatMessage, Role};

use async_trait::async_trait;
use futures_util::stream::BoxStream;

/// Finite, non-restartable stream of reply fragments
pub type FragmentStream = BoxStream<'static, Result<String, ChatError>>;

/// Trait for hosted chat backends
#[async_trait]
pub trait ChatBackend: Send + Sync {
    /// Send `message` after the prior `history` and stream the reply
    async fn send_message_stream(
        &self,
        history: &[ChatMessage],
        message: &str,
    ) -> Result<FragmentStream, ChatError>;
}
