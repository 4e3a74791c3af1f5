pub mod error;
pub mod explanation;
pub mod llm;
pub mod prompt;
pub mod relevance;
pub mod schema;

pub use error::{AssistantError, LlmError};
pub use explanation::parse_explanation;
pub use llm::{ChatModel, CompletionRequest, OpenAiClient};
pub use relevance::is_question_relevant;
pub use schema::{AiExplanation, ChatMessage, Role};

use hadith::text::sanitize;
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;

/// Cap for hadith text and explain input.
pub const MAX_TEXT_CHARS: usize = 5000;
pub const MAX_QUESTION_CHARS: usize = 1000;
pub const MAX_HISTORY_MESSAGES: usize = 20;
pub const MAX_HISTORY_CHARS: usize = 2000;

pub struct Assistant {
    model: Arc<dyn ChatModel>,
}

impl Assistant {
    pub fn new(model: Arc<dyn ChatModel>) -> Self {
        Self { model }
    }

    pub fn is_configured(&self) -> bool {
        self.model.is_configured()
    }

    /// Ask the model for a structured explanation of a hadith.
    pub async fn explain(&self, hadith_text: &str) -> Result<AiExplanation, AssistantError> {
        let request = CompletionRequest {
            messages: vec![
                ChatMessage::system(prompt::EXPLAIN_SYSTEM_PROMPT),
                ChatMessage::user(prompt::build_explain_prompt(hadith_text)),
            ],
            temperature: 0.2,
            max_tokens: 1200,
        };

        let reply = self.model.complete(request).await?;
        debug!(reply_chars = reply.chars().count(), "Explanation received");

        parse_explanation(&reply)
    }

    /// Answer a follow-up question about a hadith. The reply is returned as-is.
    pub async fn answer(
        &self,
        hadith_text: &str,
        history: &[ChatMessage],
        question: &str,
    ) -> Result<String, AssistantError> {
        let mut messages = Vec::with_capacity(history.len() + 2);
        messages.push(ChatMessage::system(prompt::build_chat_system_prompt(hadith_text)));
        messages.extend(history.iter().cloned());
        messages.push(ChatMessage::user(question));

        let request = CompletionRequest {
            messages,
            temperature: 0.3,
            max_tokens: 800,
        };

        Ok(self.model.complete(request).await?)
    }
}

/// Keep only user/assistant turns from client-supplied history, sanitized,
/// most recent last, at most [`MAX_HISTORY_MESSAGES`]. Entries with another
/// role or without string content are dropped.
pub fn sanitize_history(history: &[Value]) -> Vec<ChatMessage> {
    let kept: Vec<ChatMessage> = history.iter().filter_map(history_turn).collect();
    if kept.len() < history.len() {
        debug!(dropped = history.len() - kept.len(), "Unusable history entries dropped");
    }

    let skip = kept.len().saturating_sub(MAX_HISTORY_MESSAGES);
    kept.into_iter().skip(skip).collect()
}

fn history_turn(entry: &Value) -> Option<ChatMessage> {
    let role = match entry.get("role")?.as_str()? {
        "user" => Role::User,
        "assistant" => Role::Assistant,
        _ => return None,
    };
    let content = sanitize(entry.get("content")?.as_str()?, MAX_HISTORY_CHARS);
    (!content.is_empty()).then_some(ChatMessage { role, content })
}
