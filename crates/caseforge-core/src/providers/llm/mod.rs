//! Completion providers.
//!
//! The pipeline talks to a [`CompletionClient`] that returns one JSON value
//! per call. Calls are blocking from the pipeline's point of view: no
//! timeout, no retry, no cancellation — a transport failure or malformed
//! output aborts the whole generation run.

use crate::prompts::Message;
use async_trait::async_trait;

pub mod openai;
pub mod scripted;

pub use openai::OpenAiClient;
pub use scripted::ScriptedClient;

/// A provider that completes a message list into structured JSON.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    async fn complete(&self, messages: &[Message]) -> anyhow::Result<serde_json::Value>;

    fn provider_name(&self) -> &'static str;
}

/// Extract the first JSON value embedded in free-form model output.
/// Providers that cannot force JSON-only responses still wrap the value in
/// prose now and then.
pub(crate) fn extract_first_json(text: &str) -> anyhow::Result<serde_json::Value> {
    let start = text
        .find('{')
        .or_else(|| text.find('['))
        .ok_or_else(|| anyhow::anyhow!("no JSON start ({{ or [) found in model output"))?;
    serde_json::Deserializer::from_str(&text[start..])
        .into_iter::<serde_json::Value>()
        .next()
        .ok_or_else(|| anyhow::anyhow!("no JSON value found in extracted text"))?
        .map_err(|e| anyhow::anyhow!("invalid JSON in model output: {}", e))
}
