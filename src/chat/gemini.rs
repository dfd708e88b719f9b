//! Gemini streaming backend
//!
//! Posts to `streamGenerateContent` with `alt=sse` and decodes each `data:`
//! event into a text fragment.

use super::{ChatBackend, ChatError, ChatMessage, FragmentStream, Role};
use crate::config::ChatConfig;
use async_trait::async_trait;
use futures_util::StreamExt;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::time::Duration;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a> {
    system_instruction: Content<'a>,
    contents: Vec<Content<'a>>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'static str>,
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
struct GenerationConfig {
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    error: Option<ApiError>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<ResponseContent>,
}

#[derive(Debug, Deserialize)]
struct ResponseContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    #[serde(default)]
    code: u16,
    #[serde(default)]
    message: String,
}

/// Incremental decoder for a server-sent-events body
#[derive(Debug, Default)]
pub struct SseDecoder {
    buf: Vec<u8>,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed raw bytes; returns fragments for every complete line
    pub fn push(&mut self, chunk: &[u8]) -> Vec<Result<String, ChatError>> {
        self.buf.extend_from_slice(chunk);
        let mut out = Vec::new();
        while let Some(pos) = self.buf.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = self.buf.drain(..=pos).collect();
            if let Some(item) = Self::decode_line(&line) {
                out.push(item);
            }
        }
        out
    }

    /// Flush a trailing line without a newline
    pub fn finish(&mut self) -> Vec<Result<String, ChatError>> {
        let line = std::mem::take(&mut self.buf);
        Self::decode_line(&line).into_iter().collect()
    }

    fn decode_line(raw: &[u8]) -> Option<Result<String, ChatError>> {
        let line = String::from_utf8_lossy(raw);
        let line = line.trim_end_matches(['\r', '\n']);
        let payload = line.strip_prefix("data:")?.trim_start();
        if payload.is_empty() || payload == "[DONE]" {
            return None;
        }

        let response: GenerateResponse = match serde_json::from_str(payload) {
            Ok(r) => r,
            Err(e) => return Some(Err(ChatError::Decode(e.to_string()))),
        };
        if let Some(err) = response.error {
            return Some(Err(ChatError::Api {
                status: err.code,
                message: err.message,
            }));
        }

        let text: String = response
            .candidates
            .into_iter()
            .take(1)
            .filter_map(|c| c.content)
            .flat_map(|c| c.parts)
            .filter_map(|p| p.text)
            .collect();
        (!text.is_empty()).then_some(Ok(text))
    }
}

/// Hosted Gemini chat backend
pub struct GeminiBackend {
    client: reqwest::Client,
    api_key: Option<String>,
    key_vars: String,
    model: String,
    base_url: String,
    temperature: f32,
    system_instruction: String,
}

impl GeminiBackend {
    /// Build from configuration, resolving the API key from the environment
    ///
    /// A missing key is reported when a message is sent, not here.
    pub fn from_config(config: &ChatConfig) -> Result<Self, ChatError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;

        let api_key = config.resolve_api_key();
        if api_key.is_none() {
            tracing::warn!(vars = ?config.api_key_env, "No chat API key configured");
        }

        Ok(Self {
            client,
            api_key,
            key_vars: config.api_key_env.join(", "),
            model: config.model.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            temperature: config.temperature,
            system_instruction: config.system_instruction.clone(),
        })
    }

    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/models/{}:streamGenerateContent?alt=sse",
            self.base_url, self.model
        )
    }

    fn build_request<'a>(
        &'a self,
        history: &'a [ChatMessage],
        message: &'a str,
    ) -> GenerateRequest<'a> {
        let mut contents: Vec<Content<'a>> = history
            .iter()
            .map(|m| Content {
                role: Some(match m.role {
                    Role::User => "user",
                    Role::Model => "model",
                }),
                parts: vec![Part { text: &m.text }],
            })
            .collect();
        contents.push(Content {
            role: Some("user"),
            parts: vec![Part { text: message }],
        });

        GenerateRequest {
            system_instruction: Content {
                role: None,
                parts: vec![Part {
                    text: &self.system_instruction,
                }],
            },
            contents,
            generation_config: GenerationConfig {
                temperature: self.temperature,
            },
        }
    }
}

#[async_trait]
impl ChatBackend for GeminiBackend {
    async fn send_message_stream(
        &self,
        history: &[ChatMessage],
        message: &str,
    ) -> Result<FragmentStream, ChatError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| ChatError::NotConfigured(self.key_vars.clone()))?;

        tracing::debug!(model = %self.model, turns = history.len(), "Sending chat message");

        let response = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", api_key)
            .json(&self.build_request(history, message))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ChatError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        let bytes = Box::pin(response.bytes_stream());
        let state = (bytes, SseDecoder::new(), VecDeque::new(), false);
        let stream = futures_util::stream::unfold(
            state,
            |(mut bytes, mut decoder, mut pending, mut done)| async move {
                loop {
                    if let Some(item) = pending.pop_front() {
                        return Some((item, (bytes, decoder, pending, done)));
                    }
                    if done {
                        return None;
                    }
                    match bytes.next().await {
                        Some(Ok(chunk)) => pending.extend(decoder.push(&chunk)),
                        Some(Err(e)) => {
                            done = true;
                            pending.push_back(Err(ChatError::Http(e)));
                        }
                        None => {
                            done = true;
                            pending.extend(decoder.finish());
                        }
                    }
                }
            },
        );

        Ok(stream.boxed())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(items: Vec<Result<String, ChatError>>) -> Vec<String> {
        items.into_iter().map(|r| r.unwrap()).collect()
    }

    #[test]
    fn test_decode_single_event() {
        let mut decoder = SseDecoder::new();
        let out = decoder.push(
            b"data: {\"candidates\":[{\"content\":\
              {\"parts\":[{\"text\":\"Oil \"}],\"role\":\"model\"}}]}\n\n",
        );
        assert_eq!(texts(out), vec!["Oil ".to_string()]);
    }

    #[test]
    fn test_decode_event_split_across_chunks() {
        let mut decoder = SseDecoder::new();
        assert!(decoder
            .push(b"data: {\"candidates\":[{\"content\":{\"parts\":[{\"te")
            .is_empty());
        let out = decoder.push(b"xt\":\"steady\"}]}}]}\r\n");
        assert_eq!(texts(out), vec!["steady".to_string()]);
    }

    #[test]
    fn test_decode_joins_parts() {
        let mut decoder = SseDecoder::new();
        let out = decoder.push(
            b"data: {\"candidates\":[{\"content\":\
              {\"parts\":[{\"text\":\"a\"},{\"text\":\"b\"}]}}]}\n",
        );
        assert_eq!(texts(out), vec!["ab".to_string()]);
    }

    #[test]
    fn test_decode_skips_non_data_and_empty() {
        let mut decoder = SseDecoder::new();
        let out = decoder.push(b": keepalive\nevent: message\n\ndata: {\"candidates\":[]}\n");
        assert!(out.is_empty());
    }

    #[test]
    fn test_decode_error_payload() {
        let mut decoder = SseDecoder::new();
        let out = decoder.push(b"data: {\"error\":{\"code\":503,\"message\":\"overloaded\"}}\n");
        assert!(matches!(
            out.as_slice(),
            [Err(ChatError::Api { status: 503, .. })]
        ));
    }

    #[test]
    fn test_decode_invalid_json() {
        let mut decoder = SseDecoder::new();
        let out = decoder.push(b"data: not json\n");
        assert!(matches!(out.as_slice(), [Err(ChatError::Decode(_))]));
    }

    #[test]
    fn test_finish_flushes_trailing_line() {
        let mut decoder = SseDecoder::new();
        assert!(decoder
            .push(b"data: {\"candidates\":[{\"content\":{\"parts\":[{\"text\":\"end\"}]}}]}")
            .is_empty());
        assert_eq!(texts(decoder.finish()), vec!["end".to_string()]);
    }

    fn backend(config: &ChatConfig) -> GeminiBackend {
        GeminiBackend::from_config(config).unwrap()
    }

    #[test]
    fn test_endpoint() {
        let config = ChatConfig {
            base_url: "https://example.com/v1beta/".to_string(),
            ..ChatConfig::default()
        };
        assert_eq!(
            backend(&config).endpoint(),
            "https://example.com/v1beta/models/gemini-2.5-flash:streamGenerateContent?alt=sse"
        );
    }

    #[test]
    fn test_request_body_includes_history() {
        let config = ChatConfig::default();
        let backend = backend(&config);
        let history = vec![ChatMessage::user("gold?"), ChatMessage::model("firm")];
        let body = serde_json::to_value(backend.build_request(&history, "and oil?")).unwrap();

        assert_eq!(body["contents"].as_array().unwrap().len(), 3);
        assert_eq!(body["contents"][1]["role"], "model");
        assert_eq!(body["contents"][2]["parts"][0]["text"], "and oil?");
        assert!(body["systemInstruction"].get("role").is_none());
        assert!((body["generationConfig"]["temperature"].as_f64().unwrap() - 0.7).abs() < 1e-6);
    }

    #[tokio::test]
    async fn test_missing_key_fails_on_send() {
        let config = ChatConfig {
            api_key_env: vec!["COMMODITY_TICKER_TEST_NEVER_SET".to_string()],
            ..ChatConfig::default()
        };
        let backend = backend(&config);
        assert!(!backend.is_configured());

        let result = backend.send_message_stream(&[], "hello").await;
        assert!(matches!(result, Err(ChatError::NotConfigured(_))));
    }
}
