use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use martley_core::config::{LlmConfig, LlmProvider};
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};

use crate::llm::LlmClient;

const RETRY_BACKOFF: Duration = Duration::from_millis(500);

/// Chat-completions client for any OpenAI-compatible endpoint (OpenAI itself,
/// Ollama, or a gateway in front of Anthropic). Transport failures are
/// retried a configured number of times; HTTP error statuses are not.
pub struct OpenAiCompatClient {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    model: String,
    max_retries: u32,
}

impl OpenAiCompatClient {
    pub fn from_config(config: &LlmConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .context("building http client")?;

        let base_url = config
            .base_url
            .clone()
            .unwrap_or_else(|| default_base_url(config.provider).to_string());

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.as_ref().map(|key| key.expose_secret().to_string()),
            model: config.model.clone(),
            max_retries: config.max_retries,
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/v1/chat/completions", self.base_url)
    }
}

fn default_base_url(provider: LlmProvider) -> &'static str {
    match provider {
        LlmProvider::OpenAi | LlmProvider::Anthropic => "https://api.openai.com",
        LlmProvider::Ollama => "http://localhost:11434",
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatReplyMessage,
}

#[derive(Deserialize)]
struct ChatReplyMessage {
    content: String,
}

#[async_trait]
impl LlmClient for OpenAiCompatClient {
    async fn execute(&self, prompt: &str) -> Result<String> {
        let request = ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage { role: "user", content: prompt }],
        };

        let mut attempt = 0u32;
        let response = loop {
            let mut builder = self.http.post(self.endpoint()).json(&request);
            if let Some(api_key) = &self.api_key {
                builder = builder.bearer_auth(api_key);
            }

            match builder.send().await {
                Ok(response) => break response,
                Err(error) if attempt < self.max_retries => {
                    attempt += 1;
                    tracing::warn!(%error, attempt, "llm transport failure, retrying");
                    tokio::time::sleep(RETRY_BACKOFF).await;
                }
                Err(error) => {
                    return Err(anyhow!(error).context("llm request failed after retries"));
                }
            }
        };

        let response = response.error_for_status().context("llm returned error status")?;
        let completion: ChatResponse =
            response.json().await.context("decoding llm completion")?;
        completion
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| anyhow!("llm completion had no choices"))
    }
}
