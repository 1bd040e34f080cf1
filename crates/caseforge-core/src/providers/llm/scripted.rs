use super::CompletionClient;
use crate::prompts::Message;
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;

/// Deterministic client that replays a fixed script of responses, one per
/// call, in order. Running past the end of the script is an error, which is
/// what tests want: it means the pipeline made more calls than expected.
#[derive(Debug, Default)]
pub struct ScriptedClient {
    responses: Mutex<VecDeque<serde_json::Value>>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedClient {
    pub fn new(responses: Vec<serde_json::Value>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// First line of each call's first message, for call accounting in tests.
    pub fn call_log(&self) -> Vec<String> {
        self.calls.lock().expect("call log poisoned").clone()
    }

    pub fn calls_made(&self) -> usize {
        self.calls.lock().expect("call log poisoned").len()
    }

    pub fn remaining(&self) -> usize {
        self.responses.lock().expect("script poisoned").len()
    }
}

#[async_trait]
impl CompletionClient for ScriptedClient {
    async fn complete(&self, messages: &[Message]) -> anyhow::Result<serde_json::Value> {
        let head = messages
            .first()
            .map(|m| m.content.lines().next().unwrap_or("").to_string())
            .unwrap_or_default();
        self.calls.lock().expect("call log poisoned").push(head);

        self.responses
            .lock()
            .expect("script poisoned")
            .pop_front()
            .ok_or_else(|| anyhow::anyhow!("scripted client exhausted after all scripted responses"))
    }

    fn provider_name(&self) -> &'static str {
        "scripted"
    }
}
