//! Conversation state for the chat widget

use super::{ChatBackend, ChatError, ChatMessage};
use crate::config::ChatConfig;
use crate::telemetry::{self, ChatOutcome, LatencyMetric};
use futures_util::StreamExt;
use std::sync::Arc;
use std::time::Instant;

/// A conversation with a streaming backend
///
/// Failed replies are shown with the apology text but are not sent back to
/// the backend as history.
pub struct ChatDesk {
    backend: Arc<dyn ChatBackend>,
    messages: Vec<ChatMessage>,
    history: Vec<ChatMessage>,
    apology: String,
}

impl ChatDesk {
    pub fn new(
        backend: Arc<dyn ChatBackend>,
        welcome: impl Into<String>,
        apology: impl Into<String>,
    ) -> Self {
        Self {
            backend,
            messages: vec![ChatMessage::model(welcome)],
            history: Vec::new(),
            apology: apology.into(),
        }
    }

    pub fn from_config(backend: Arc<dyn ChatBackend>, config: &ChatConfig) -> Self {
        Self::new(
            backend,
            config.welcome_message.clone(),
            config.apology_message.clone(),
        )
    }

    /// Every message shown so far, welcome first
    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    /// Completed turns sent as context with the next message
    pub fn history(&self) -> &[ChatMessage] {
        &self.history
    }

    /// Send a message and stream the reply
    ///
    /// `on_update` sees the reply placeholder once when created and again
    /// after every fragment (or the apology on failure). Blank input is
    /// ignored and returns `None`.
    pub async fn send<F>(&mut self, text: &str, mut on_update: F) -> Option<ChatMessage>
    where
        F: FnMut(&ChatMessage),
    {
        if text.trim().is_empty() {
            return None;
        }

        let user = ChatMessage::user(text);
        self.messages.push(user.clone());
        self.messages.push(ChatMessage::placeholder());
        let reply_idx = self.messages.len() - 1;
        on_update(&self.messages[reply_idx]);

        let started = Instant::now();
        let outcome = self
            .stream_reply(text, reply_idx, started, &mut on_update)
            .await;

        let reply = &mut self.messages[reply_idx];
        reply.is_loading = false;
        match outcome {
            Ok(()) => {
                telemetry::record_chat_outcome(ChatOutcome::Completed);
                tracing::info!(chars = reply.text.len(), "Chat reply completed");
                self.history.push(user);
                self.history.push(reply.clone());
            }
            Err(e) => {
                telemetry::record_chat_outcome(ChatOutcome::Failed);
                tracing::error!(error = %e, "Chat reply failed");
                reply.text = self.apology.clone();
            }
        }
        on_update(reply);

        Some(reply.clone())
    }

    async fn stream_reply<F>(
        &mut self,
        text: &str,
        reply_idx: usize,
        started: Instant,
        on_update: &mut F,
    ) -> Result<(), ChatError>
    where
        F: FnMut(&ChatMessage),
    {
        let mut fragments = self
            .backend
            .send_message_stream(&self.history, text)
            .await?;

        let mut first = true;
        while let Some(fragment) = fragments.next().await {
            let fragment = fragment?;
            if first {
                telemetry::record_latency(LatencyMetric::ChatFirstFragment, started.elapsed());
                first = false;
            }
            let reply = &mut self.messages[reply_idx];
            reply.text.push_str(&fragment);
            reply.is_loading = false;
            on_update(reply);
        }
        Ok(())
    }
}

impl std::fmt::Debug for ChatDesk {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatDesk")
            .field("messages", &self.messages.len())
            .field("history", &self.history.len())
            .finish()
    }
}
