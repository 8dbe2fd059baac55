use anyhow::Result;
use async_trait::async_trait;

/// The single capability the session depends on: text in, text out, with no
/// guarantee the reply contains valid JSON.
#[async_trait]
pub trait LlmClient: Send + Sync {
    async fn execute(&self, prompt: &str) -> Result<String>;
}
