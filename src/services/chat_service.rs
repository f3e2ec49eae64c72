//! Chat service - Marketplace help assistant backed by a hosted generative model.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::{
    Config, CHAT_API_BASE_URL, CHAT_MAX_OUTPUT_TOKENS, CHAT_TEMPERATURE,
};
use crate::domain::{ChatMessage, ChatPrompt, ChatReply, ModelRole};
use crate::errors::{AppError, AppResult};

const UPSTREAM_FAILURE: &str = "Failed to get response from AI";

#[async_trait]
pub trait ChatService: Send + Sync {
    /// Reply to the last user message of a client-held conversation
    async fn chat(&self, messages: Vec<ChatMessage>) -> AppResult<ChatReply>;
}

#[derive(Debug, Serialize)]
struct Part {
    text: String,
}

#[derive(Debug, Serialize)]
struct Content {
    role: &'static str,
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    max_output_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest {
    contents: Vec<Content>,
    generation_config: GenerationConfig,
}

impl GenerateRequest {
    fn from_prompt(prompt: ChatPrompt) -> Self {
        let mut contents: Vec<Content> = prompt
            .history
            .into_iter()
            .map(|turn| Content {
                role: turn.role.as_str(),
                parts: vec![Part { text: turn.text }],
            })
            .collect();
        contents.push(Content {
            role: ModelRole::User.as_str(),
            parts: vec![Part {
                text: prompt.message,
            }],
        });

        Self {
            contents,
            generation_config: GenerationConfig {
                max_output_tokens: CHAT_MAX_OUTPUT_TOKENS,
                temperature: CHAT_TEMPERATURE,
            },
        }
    }
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    #[serde(default)]
    text: String,
}

#[derive(Debug, Deserialize)]
struct ResponseContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<ResponseContent>,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

impl GenerateResponse {
    /// Text of the first candidate
    fn text(self) -> Option<String> {
        let content = self.candidates.into_iter().next()?.content?;
        let text: String = content.parts.into_iter().map(|p| p.text).collect();
        (!text.is_empty()).then_some(text)
    }
}

pub struct GeminiAssistant {
    client: reqwest::Client,
    api_key: Option<String>,
    model: String,
    base_url: String,
}

impl GeminiAssistant {
    pub fn new(config: &Config) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: config.chat_api_key().map(str::to_string),
            model: config.chat_model.clone(),
            base_url: CHAT_API_BASE_URL.to_string(),
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/models/{}:generateContent", self.base_url, self.model)
    }
}

#[async_trait]
impl ChatService for GeminiAssistant {
    #[tracing::instrument(skip(self, messages), fields(model = %self.model, turns = messages.len()))]
    async fn chat(&self, messages: Vec<ChatMessage>) -> AppResult<ChatReply> {
        let prompt = ChatPrompt::from_messages(&messages)?;

        let api_key = self.api_key.as_deref().ok_or_else(|| {
            AppError::ServiceUnavailable("Chat assistant is not configured".to_string())
        })?;

        let response = self
            .client
            .post(self.endpoint())
            .query(&[("key", api_key)])
            .json(&GenerateRequest::from_prompt(prompt))
            .send()
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "Chat request failed");
                AppError::ServiceUnavailable(UPSTREAM_FAILURE.to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            tracing::error!(status = %status, "Chat model returned an error");
            return Err(AppError::ServiceUnavailable(UPSTREAM_FAILURE.to_string()));
        }

        let body: GenerateResponse = response.json().await.map_err(|e| {
            tracing::error!(error = %e, "Chat response could not be decoded");
            AppError::ServiceUnavailable(UPSTREAM_FAILURE.to_string())
        })?;

        body.text()
            .map(|message| ChatReply { message })
            .ok_or_else(|| AppError::ServiceUnavailable(UPSTREAM_FAILURE.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ChatRole;

    fn message(role: ChatRole, content: &str) -> ChatMessage {
        ChatMessage {
            role,
            content: content.to_string(),
        }
    }

    #[test]
    fn test_request_body_shape() {
        let prompt = ChatPrompt::from_messages(&[
            message(ChatRole::Assistant, "Hi! How can I help?"),
            message(ChatRole::User, "Where do I list items?"),
            message(ChatRole::Assistant, "Use the Sell page."),
            message(ChatRole::User, "And delete them?"),
        ])
        .unwrap();

        let body = serde_json::to_value(GenerateRequest::from_prompt(prompt)).unwrap();
        let contents = body["contents"].as_array().unwrap();
        assert_eq!(contents.len(), 3);
        assert_eq!(contents[0]["role"], "user");
        assert_eq!(contents[1]["role"], "model");
        assert_eq!(contents[2]["parts"][0]["text"], "And delete them?");
        assert_eq!(body["generationConfig"]["maxOutputTokens"], 150);
    }

    #[test]
    fn test_response_text_extraction() {
        let body: GenerateResponse = serde_json::from_value(serde_json::json!({
            "candidates": [{ "content": { "role": "model", "parts": [{ "text": "Use " }, { "text": "Sell." }] } }]
        }))
        .unwrap();
        assert_eq!(body.text().as_deref(), Some("Use Sell."));

        let empty: GenerateResponse = serde_json::from_value(serde_json::json!({})).unwrap();
        assert!(empty.text().is_none());
    }

    #[tokio::test]
    async fn test_missing_key_is_unavailable() {
        let assistant = GeminiAssistant::new(&Config::for_tests());
        let result = assistant
            .chat(vec![message(ChatRole::User, "hello")])
            .await;
        assert!(matches!(result, Err(AppError::ServiceUnavailable(_))));
    }

    #[tokio::test]
    async fn test_malformed_conversation_rejected_before_key_check() {
        let assistant = GeminiAssistant::new(&Config::for_tests());
        assert!(matches!(
            assistant.chat(Vec::new()).await,
            Err(AppError::Validation(_))
        ));
    }
}
