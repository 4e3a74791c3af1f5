use hadith::text::sanitize;
use serde::Deserialize;

use crate::error::AssistantError;
use crate::schema::AiExplanation;

pub const MAX_SUMMARY_CHARS: usize = 500;
pub const MAX_EXPLANATION_CHARS: usize = 5000;
pub const MAX_KEYWORD_CHARS: usize = 50;
pub const MAX_KEYWORDS: usize = 10;

/// Exact shape the model is asked to produce. Every field is required.
#[derive(Deserialize)]
struct ExplanationPayload {
    summary: String,
    explanation: String,
    keywords: Vec<String>,
}

/// Validate a model reply against the explanation schema.
/// The reply must be a single JSON object, optionally inside a Markdown code fence.
pub fn parse_explanation(reply: &str) -> Result<AiExplanation, AssistantError> {
    let body = strip_code_fence(reply);
    if body.is_empty() {
        return Err(AssistantError::MalformedResponse("empty reply".to_string()));
    }

    let payload: ExplanationPayload = serde_json::from_str(body)
        .map_err(|e| AssistantError::MalformedResponse(e.to_string()))?;

    let explanation = AiExplanation {
        summary: sanitize(&payload.summary, MAX_SUMMARY_CHARS),
        explanation: sanitize(&payload.explanation, MAX_EXPLANATION_CHARS),
        keywords: payload
            .keywords
            .iter()
            .map(|k| sanitize(k, MAX_KEYWORD_CHARS))
            .filter(|k| !k.is_empty())
            .take(MAX_KEYWORDS)
            .collect(),
    };

    if explanation.summary.is_empty() && explanation.explanation.is_empty() {
        return Err(AssistantError::MalformedResponse(
            "summary and explanation are both empty".to_string(),
        ));
    }

    Ok(explanation)
}

fn strip_code_fence(reply: &str) -> &str {
    let trimmed = reply.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Drop the info string (```json) up to the first newline
    let rest = match rest.find('\n') {
        Some(idx) => &rest[idx + 1..],
        None => rest,
    };
    rest.trim_end().strip_suffix("```").unwrap_or(rest).trim()
}
