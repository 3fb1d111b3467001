use crate::{LLMConfig, LLMProvider, LLMResponse, Message, Role, Usage};
use anyhow::{Context, Result};
use async_trait::async_trait;
use rand::Rng;
use serde_json::json;
use std::time::Instant;
use tokio::time::{sleep, Duration};
use tracing::{debug, error, info, warn};

const DEFAULT_BASE_URL: &str = "https://api.anthropic.com";
const API_VERSION: &str = "2023-06-01";

/// Failure of a single attempt, split by whether another attempt can help.
enum AttemptError {
    Retryable(anyhow::Error),
    Fatal(anyhow::Error),
}

pub struct AnthropicClient {
    api_key: String,
    model: String,
    max_tokens: u32,
    temperature: f32,
    base_url: String,
    client: reqwest::Client,
    max_retries: u32,
    base_delay: Duration,
}

impl AnthropicClient {
    pub fn new(config: LLMConfig) -> Result<Self> {
        if config.api_key.trim().is_empty() {
            anyhow::bail!("Anthropic API key is required");
        }

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(120))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            api_key: config.api_key,
            model: config.model,
            max_tokens: config.max_tokens,
            temperature: config.temperature,
            base_url: DEFAULT_BASE_URL.to_string(),
            client,
            max_retries: 3,
            base_delay: Duration::from_secs(1),
        })
    }

    pub fn from_env() -> Result<Self> {
        Self::new(LLMConfig::from_env()?)
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_retry_policy(mut self, max_retries: u32, base_delay: Duration) -> Self {
        self.max_retries = max_retries;
        self.base_delay = base_delay;
        self
    }

    fn jitter(&self) -> Duration {
        let ceiling = (self.base_delay.as_millis() as u64).max(1);
        Duration::from_millis(rand::thread_rng().gen_range(0..ceiling))
    }

    fn request_body(&self, messages: Vec<Message>) -> serde_json::Value {
        let mut system = Vec::new();
        let mut turns = Vec::new();

        for message in messages {
            match message.role {
                Role::System => system.push(message.content),
                Role::User => turns.push(json!({ "role": "user", "content": message.content })),
                Role::Assistant => {
                    turns.push(json!({ "role": "assistant", "content": message.content }))
                }
            }
        }

        let mut body = json!({
            "model": self.model,
            "max_tokens": self.max_tokens,
            "temperature": self.temperature,
            "messages": turns,
        });
        if !system.is_empty() {
            body["system"] = json!(system.join("\n\n"));
        }
        body
    }

    async fn call_api(&self, messages: Vec<Message>) -> Result<LLMResponse> {
        let url = format!("{}/v1/messages", self.base_url);
        let body = self.request_body(messages);

        debug!("Calling Anthropic API with model: {}", self.model);

        let mut attempt = 0;
        loop {
            let start_time = Instant::now();

            match self.perform_api_call(&url, &body).await {
                Ok(response) => {
                    info!(
                        "Anthropic API call successful on attempt {} (took {:?})",
                        attempt + 1,
                        start_time.elapsed()
                    );
                    return Ok(response);
                }
                Err(AttemptError::Fatal(e)) => {
                    error!("Anthropic API call failed: {}", e);
                    return Err(e);
                }
                Err(AttemptError::Retryable(e)) => {
                    attempt += 1;
                    warn!("Anthropic API call failed on attempt {}: {}", attempt, e);

                    if attempt > self.max_retries {
                        error!("All {} retry attempts failed for Anthropic API", self.max_retries);
                        return Err(e);
                    }

                    let jitter = self.jitter();
                    let total_delay = self.base_delay * 2u32.pow(attempt - 1) + jitter;
                    warn!(
                        "Retrying in {:?} (attempt {}/{}, jitter: {:?})",
                        total_delay, attempt, self.max_retries, jitter
                    );
                    sleep(total_delay).await;
                }
            }
        }
    }

    async fn perform_api_call(
        &self,
        url: &str,
        body: &serde_json::Value,
    ) -> std::result::Result<LLMResponse, AttemptError> {
        let response = self
            .client
            .post(url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", API_VERSION)
            .json(body)
            .send()
            .await
            .context("Failed to send request to Anthropic API")
            .map_err(AttemptError::Retryable)?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            let message = service_message(&error_text);

            if status.is_server_error() || status.as_u16() == 429 {
                return Err(AttemptError::Retryable(anyhow::anyhow!(
                    "Anthropic API server error ({}): {}",
                    status,
                    message
                )));
            }
            return Err(AttemptError::Fatal(anyhow::anyhow!(
                "Anthropic API error ({}): {}",
                status,
                message
            )));
        }

        let response_json: serde_json::Value = response
            .json()
            .await
            .context("Failed to parse Anthropic API response")
            .map_err(AttemptError::Fatal)?;

        parse_response(&response_json).map_err(AttemptError::Fatal)
    }
}

/// Prefer `error.message` from a JSON error body, else the raw text.
fn service_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v["error"]["message"].as_str().map(str::to_string))
        .unwrap_or_else(|| body.to_string())
}

fn parse_response(json: &serde_json::Value) -> Result<LLMResponse> {
    let text = json["content"]
        .as_array()
        .and_then(|blocks| {
            blocks
                .iter()
                .find(|b| b["type"] == "text")
                .and_then(|b| b["text"].as_str())
        })
        .context("No text response from model")?;

    let usage = serde_json::from_value::<Usage>(json["usage"].clone()).ok();

    Ok(LLMResponse {
        content: text.to_string(),
        finish_reason: json["stop_reason"].as_str().map(str::to_string),
        usage,
    })
}

#[async_trait]
impl LLMProvider for AnthropicClient {
    async fn generate(&self, prompt: &str) -> Result<LLMResponse> {
        let messages = vec![Message {
            role: Role::User,
            content: prompt.to_string(),
        }];
        self.call_api(messages).await
    }

    async fn generate_with_context(&self, messages: Vec<Message>) -> Result<LLMResponse> {
        self.call_api(messages).await
    }
}
