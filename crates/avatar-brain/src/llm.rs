//! The LLM collaborator.
//!
//! The tree only ever sees [`LlmClient`]; which vendor protocol sits behind it is the host's
//! business. [`KeywordLlm`] answers offline and backs the simulator and the tests.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;

use crate::types::{
    ChatMessage, LlmResponse, LlmSettings, ToolResult, AVAILABLE_ACTIONS, AVAILABLE_EXPRESSIONS,
};

#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("LLM request failed: {0}")]
    Request(String),

    #[error("malformed LLM response: {0}")]
    Malformed(String),
}

#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Sends `message` after `history` and returns the reply.
    async fn send(
        &self,
        history: Vec<ChatMessage>,
        message: String,
        settings: LlmSettings,
    ) -> Result<LlmResponse, LlmError>;
}

pub type SharedLlm = Arc<dyn LlmClient>;

/// Offline client that picks action and expression names out of the message.
///
/// `"please dance and look left, I'm happy"` becomes actions `DANCE, LOOK_LEFT, HAPPY` with
/// emotion `HAPPY`. Multi-word names match with spaces or underscores.
#[derive(Debug, Default)]
pub struct KeywordLlm {
    calls: AtomicU64,
}

impl KeywordLlm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shared() -> SharedLlm {
        Arc::new(Self::new())
    }

    /// Number of requests answered so far.
    pub fn calls(&self) -> u64 {
        self.calls.load(Ordering::Relaxed)
    }

    pub fn interpret(&self, message: &str) -> LlmResponse {
        let words: Vec<String> = message
            .split(|c: char| !c.is_ascii_alphanumeric() && c != '_')
            .filter(|w| !w.is_empty())
            .map(str::to_ascii_uppercase)
            .collect();

        let mut actions = Vec::new();
        let mut emotion = None;
        let mut i = 0;
        while i < words.len() {
            // Two-word names first so "run across" is not read as RUN.
            if let Some(next) = words.get(i + 1) {
                let joined = format!("{}_{}", words[i], next);
                if AVAILABLE_ACTIONS.contains(&joined.as_str()) {
                    actions.push(joined);
                    i += 2;
                    continue;
                }
            }
            let word = words[i].as_str();
            if AVAILABLE_ACTIONS.contains(&word) {
                actions.push(word.to_string());
            }
            if emotion.is_none() && AVAILABLE_EXPRESSIONS.contains(&word) {
                emotion = Some(word.to_string());
            }
            i += 1;
        }

        if actions.is_empty() {
            return LlmResponse {
                text: "Hi! I'm your penguin. Ask me to dance or wave!".to_string(),
                ..LlmResponse::default()
            };
        }

        let call = self.calls.load(Ordering::Relaxed);
        let listed = actions
            .iter()
            .map(|a| a.to_lowercase().replace('_', " "))
            .collect::<Vec<_>>()
            .join(" and ");
        LlmResponse {
            text: format!("Watch me {listed}!"),
            tool_result: Some(ToolResult {
                actions,
                emotion,
                tool_call_id: Some(format!("call_{call}")),
            }),
            raw_tool_calls: None,
        }
    }
}

#[async_trait]
impl LlmClient for KeywordLlm {
    async fn send(
        &self,
        history: Vec<ChatMessage>,
        message: String,
        _settings: LlmSettings,
    ) -> Result<LlmResponse, LlmError> {
        if message.trim().is_empty() {
            return Err(LlmError::Request("empty message".to_string()));
        }
        tracing::debug!(history = history.len(), "keyword llm answering");
        let response = self.interpret(&message);
        self.calls.fetch_add(1, Ordering::Relaxed);
        Ok(response)
    }
}
