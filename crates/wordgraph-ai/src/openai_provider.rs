use crate::gateway::InferenceGateway;
use crate::prompts::PromptLibrary;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::warn;
use wordgraph_core::{GatewayConfig, Result, WordGraphError};

/// Inference gateway backed by an OpenAI-compatible chat-completions API.
pub struct OpenAiGateway {
    config: GatewayConfig,
    client: Client,
    prompts: PromptLibrary,
    api_key: String,
}

impl OpenAiGateway {
    /// Creates a new gateway. The API key is resolved from the configured
    /// environment variable; a missing key is a configuration error so the
    /// run aborts before any call is attempted.
    pub fn new(config: GatewayConfig, prompts: PromptLibrary) -> Result<Self> {
        let api_key = std::env::var(&config.api_key_env).unwrap_or_default();
        if api_key.is_empty() {
            return Err(WordGraphError::Configuration(format!(
                "API key is required; set the {} environment variable",
                config.api_key_env
            )));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| WordGraphError::Configuration(format!("cannot build HTTP client: {e}")))?;

        Ok(Self {
            config,
            client,
            prompts,
            api_key,
        })
    }

    /// Sends a chat request with retry, returning the assistant message
    /// content.
    async fn send_chat(&self, model: &str, system: &str, user: &str) -> Result<String> {
        let mut last_error = None;

        for attempt in 0..=self.config.max_retries {
            if attempt > 0 {
                // Exponential backoff: 1s, 2s, 4s
                let delay = Duration::from_secs(2u64.pow(attempt - 1));
                tokio::time::sleep(delay).await;
                warn!(
                    "gateway request failed, retrying (attempt {}/{})",
                    attempt + 1,
                    self.config.max_retries + 1
                );
            }

            match self.try_chat(model, system, user).await {
                Ok(content) => return Ok(content),
                Err(e) => last_error = Some(e),
            }
        }

        Err(last_error
            .unwrap_or_else(|| WordGraphError::Gateway("all retry attempts failed".to_string())))
    }

    async fn try_chat(&self, model: &str, system: &str, user: &str) -> Result<String> {
        let request = ChatRequest {
            model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system,
                },
                ChatMessage {
                    role: "user",
                    content: user,
                },
            ],
            response_format: ResponseFormat {
                format: "json_object",
            },
            temperature: self.config.temperature,
        };

        let response = self
            .client
            .post(format!("{}/chat/completions", self.config.base_url))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| WordGraphError::Gateway(format!("request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown error".to_string());
            return Err(WordGraphError::Gateway(format!(
                "API error ({status}): {body}"
            )));
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| WordGraphError::Parse(format!("malformed completion envelope: {e}")))?;

        parsed
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| WordGraphError::Parse("completion had no choices".to_string()))
    }
}

#[async_trait]
impl InferenceGateway for OpenAiGateway {
    async fn find_connections(
        &self,
        word: &str,
        candidates: &[String],
        max: usize,
    ) -> Result<Vec<String>> {
        let system = self.prompts.links_prompt(max);
        let user = format!(
            "TARGET_WORD:\n{:?}\n\nCANDIDATE_WORDS:\n{}",
            word,
            serde_json::to_string(candidates)?
        );
        let content = self
            .send_chat(&self.config.links_model, &system, &user)
            .await?;
        parse_connections(&content)
    }

    async fn generate_description(&self, word: &str, connections: &[String]) -> Result<String> {
        let user = format!(
            "TARGET_WORD:\n{:?}\n\nREQUIRED_WORDS:\n{}",
            word,
            serde_json::to_string(connections)?
        );
        let content = self
            .send_chat(
                &self.config.description_model,
                self.prompts.description_prompt(),
                &user,
            )
            .await?;
        parse_description(&content)
    }
}

/// Parses a connections payload. Exactly one shape is accepted: a JSON
/// object with a `connections` key holding an array of strings. Anything
/// else fails closed.
pub fn parse_connections(raw: &str) -> Result<Vec<String>> {
    let value: serde_json::Value = serde_json::from_str(raw)
        .map_err(|e| WordGraphError::Parse(format!("connections payload is not JSON: {e}")))?;
    let object = value
        .as_object()
        .ok_or_else(|| WordGraphError::Parse("connections payload is not an object".to_string()))?;
    let list = object
        .get("connections")
        .and_then(|v| v.as_array())
        .ok_or_else(|| {
            WordGraphError::Parse("payload has no \"connections\" array".to_string())
        })?;

    list.iter()
        .map(|item| {
            item.as_str().map(str::to_string).ok_or_else(|| {
                WordGraphError::Parse(format!("connection is not a string: {item}"))
            })
        })
        .collect()
}

/// Parses a description payload: a JSON object with a `description` string.
pub fn parse_description(raw: &str) -> Result<String> {
    let value: serde_json::Value = serde_json::from_str(raw)
        .map_err(|e| WordGraphError::Parse(format!("description payload is not JSON: {e}")))?;
    value
        .as_object()
        .and_then(|object| object.get("description"))
        .and_then(|v| v.as_str())
        .map(str::to_string)
        .ok_or_else(|| {
            WordGraphError::Parse("payload has no \"description\" string".to_string())
        })
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    response_format: ResponseFormat,
    temperature: f32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    format: &'static str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: String,
}
