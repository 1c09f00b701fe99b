use std::env;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::SentenceError;

const DEFAULT_BASE_URL: &str = "https://api.groq.com/openai/v1";
const DEFAULT_MODEL: &str = "llama3-8b-8192";

#[derive(Clone)]
pub struct SentenceConfig {
    pub base_url: String,
    pub api_key: String,
    pub model: String,
}

impl SentenceConfig {
    #[must_use]
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: api_key.into(),
            model: DEFAULT_MODEL.into(),
        }
    }

    /// Reads `ENGRAVE_AI_API_KEY`, `ENGRAVE_AI_BASE_URL` and `ENGRAVE_AI_MODEL`.
    ///
    /// Returns `None` when no key is set.
    #[must_use]
    pub fn from_env() -> Option<Self> {
        let api_key = env::var("ENGRAVE_AI_API_KEY").ok()?;
        if api_key.trim().is_empty() {
            return None;
        }
        let base_url = env::var("ENGRAVE_AI_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.into());
        let model = env::var("ENGRAVE_AI_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.into());
        Some(Self {
            base_url,
            api_key,
            model,
        })
    }
}

/// Generates example sentences and translations for new words.
#[derive(Clone)]
pub struct SentenceService {
    client: Client,
    config: Option<SentenceConfig>,
}

impl SentenceService {
    #[must_use]
    pub fn from_env() -> Self {
        Self::new(SentenceConfig::from_env())
    }

    #[must_use]
    pub fn new(config: Option<SentenceConfig>) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    #[must_use]
    pub fn enabled(&self) -> bool {
        self.config.is_some()
    }

    /// A single sentence in `language` that uses `word`.
    ///
    /// # Errors
    ///
    /// See [`SentenceService::generate`].
    pub async fn sentence_for(&self, language: &str, word: &str) -> Result<String, SentenceError> {
        self.generate(&format!(
            "Give me a sentence in '{language}' containing the word '{word}'. \
             Reply with the sentence only."
        ))
        .await
    }

    /// `text` translated from `from` into `to`.
    ///
    /// # Errors
    ///
    /// See [`SentenceService::generate`].
    pub async fn translate(&self, text: &str, from: &str, to: &str) -> Result<String, SentenceError> {
        self.generate(&format!(
            "Translate the following {from} text into {to}. \
             Reply with the translation only.\n\n{text}"
        ))
        .await
    }

    /// Generate text from a prompt.
    ///
    /// # Errors
    ///
    /// Returns `SentenceError` when the service is disabled, the request fails,
    /// or the response is empty.
    pub async fn generate(&self, prompt: &str) -> Result<String, SentenceError> {
        let config = self.config.as_ref().ok_or(SentenceError::Disabled)?;

        let url = format!("{}/chat/completions", config.base_url.trim_end_matches('/'));
        let payload = ChatRequest {
            model: config.model.clone(),
            messages: vec![ChatMessage {
                role: "user",
                content: prompt.to_string(),
            }],
            temperature: 0.2,
        };

        let response = self
            .client
            .post(url)
            .bearer_auth(&config.api_key)
            .json(&payload)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(SentenceError::HttpStatus(response.status()));
        }

        let body: ChatResponse = response.json().await?;
        let content = body
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .map(|text| text.trim().trim_matches('"').trim().to_string())
            .filter(|text| !text.is_empty())
            .ok_or(SentenceError::EmptyResponse)?;

        debug!(model = %config.model, chars = content.len(), "generated text");
        Ok(content)
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessageResponse,
}

#[derive(Debug, Deserialize)]
struct ChatMessageResponse {
    content: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn reply(content: &str) -> ResponseTemplate {
        ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "choices": [{ "message": { "role": "assistant", "content": content } }]
        }))
    }

    #[tokio::test]
    async fn disabled_without_config() {
        let service = SentenceService::new(None);
        assert!(!service.enabled());
        let err = service.sentence_for("Spanish", "perro").await.unwrap_err();
        assert!(matches!(err, SentenceError::Disabled));
    }

    #[tokio::test]
    async fn sentence_is_trimmed_and_unquoted() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(header("authorization", "Bearer key"))
            .respond_with(reply("  \"El perro corre.\"\n"))
            .mount(&server)
            .await;

        let service = SentenceService::new(Some(SentenceConfig::new(server.uri(), "key")));
        let sentence = service.sentence_for("Spanish", "perro").await.unwrap();
        assert_eq!(sentence, "El perro corre.");
    }

    #[tokio::test]
    async fn blank_reply_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(reply("   "))
            .mount(&server)
            .await;

        let service = SentenceService::new(Some(SentenceConfig::new(server.uri(), "key")));
        let err = service.translate("perro", "Spanish", "English").await.unwrap_err();
        assert!(matches!(err, SentenceError::EmptyResponse));
    }

    #[tokio::test]
    async fn http_status_is_reported() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(429))
            .mount(&server)
            .await;

        let service = SentenceService::new(Some(SentenceConfig::new(server.uri(), "key")));
        let err = service.generate("hi").await.unwrap_err();
        assert!(matches!(err, SentenceError::HttpStatus(status) if status.as_u16() == 429));
    }
}
