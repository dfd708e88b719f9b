//! Integration tests for the chat desk

use async_trait::async_trait;
use commodity_ticker::chat::{
    ChatBackend, ChatDesk, ChatError, ChatMessage, FragmentStream, GeminiBackend,
};
use commodity_ticker::config::ChatConfig;
use futures_util::StreamExt;
use std::sync::Arc;

struct Echo;

#[async_trait]
impl ChatBackend for Echo {
    async fn send_message_stream(
        &self,
        _history: &[ChatMessage],
        message: &str,
    ) -> Result<FragmentStream, ChatError> {
        let words: Vec<Result<String, ChatError>> = message
            .split_inclusive(' ')
            .map(|w| Ok(w.to_string()))
            .collect();
        Ok(futures_util::stream::iter(words).boxed())
    }
}

#[tokio::test]
async fn test_desk_streams_reply() {
    let config = ChatConfig::default();
    let mut desk = ChatDesk::from_config(Arc::new(Echo), &config);
    let mut updates = 0;

    let reply = desk
        .send("brent spreads widening", |_| updates += 1)
        .await
        .unwrap();

    assert_eq!(reply.text, "brent spreads widening");
    assert_eq!(updates, 5);
    assert_eq!(desk.messages()[0].text, config.welcome_message);
}

#[tokio::test]
async fn test_unconfigured_backend_apologizes() {
    let config = ChatConfig {
        api_key_env: vec!["COMMODITY_TICKER_IT_NEVER_SET".to_string()],
        ..ChatConfig::default()
    };
    let backend = GeminiBackend::from_config(&config).unwrap();
    let mut desk = ChatDesk::from_config(Arc::new(backend), &config);

    let reply = desk.send("hello", |_| {}).await.unwrap();
    assert_eq!(reply.text, config.apology_message);
    assert!(desk.history().is_empty());
}
