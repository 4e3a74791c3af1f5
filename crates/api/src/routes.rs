use assistant::{AiExplanation, is_question_relevant, sanitize_history};
use axum::extract::rejection::JsonRejection;
use axum::extract::{ConnectInfo, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use hadith::text::sanitize;
use hadith::{HadithResult, SearchQuery};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{info, warn};

use crate::error::{self, ApiError, upstream_status};
use crate::metrics::{MetricsSnapshot, TimedOperation};
use crate::state::AppState;

pub const SEARCH_SOURCE: &str = "fawazahmed0-hadith-api";
const MAX_SESSION_ID_CHARS: usize = 128;

const OFF_TOPIC_ANSWER: &str = "الرجاء طرح أسئلة ذات صلة بالحديث الشريف فقط 🤲\n\nهذا حوار مخصص لشرح ومناقشة الحديث المعروض. يرجى احترام قواعد الحوار وعدم الخروج عن الموضوع.";
const CHAT_CLOSED: &str = "تم إغلاق الدردشة بسبب تكرار الأسئلة غير ذات الصلة. يرجى احترام قواعد الحوار والاقتصار على أسئلة الحديث الشريف فقط.";

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    status: &'static str,
    ai_configured: bool,
}

pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        ai_configured: state.assistant.is_configured(),
    })
}

pub async fn metrics(State(state): State<Arc<AppState>>) -> Json<MetricsSnapshot> {
    Json(state.metrics.snapshot(state.search.cache().stats()))
}

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    q: Option<String>,
    collection: Option<String>,
    limit: Option<String>,
}

#[derive(Serialize)]
pub struct SearchResponse {
    results: Vec<HadithResult>,
    total: usize,
    source: &'static str,
}

pub async fn search(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SearchParams>,
) -> Response {
    let timer = TimedOperation::start();
    let query = SearchQuery {
        q: params.q,
        collection: params.collection,
        // A limit that does not parse falls back to the default
        limit: params.limit.and_then(|l| l.trim().parse().ok()),
    };

    let outcome = state.search.search(&query).await;
    state.metrics.record_search(timer.elapsed());

    match outcome {
        Ok(None) => {
            state.metrics.record_request(true);
            Json(json!({ "results": [] })).into_response()
        }
        Ok(Some(found)) => {
            state.metrics.record_request(true);
            Json(SearchResponse {
                results: found.results,
                total: found.total,
                source: SEARCH_SOURCE,
            })
            .into_response()
        }
        Err(e) => {
            state.metrics.record_request(false);
            warn!(error = %e, "Search failed");
            let (status, message) = match e.upstream_status() {
                Some(code) => (upstream_status(code), format!("Failed to fetch from API: {}", code)),
                None => (StatusCode::BAD_GATEWAY, "Failed to fetch hadiths".to_string()),
            };
            (
                status,
                Json(json!({ "results": [], "total": 0, "error": message })),
            )
                .into_response()
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ExplainRequest {
    #[serde(default)]
    text: Option<String>,
}

pub async fn explain(
    State(state): State<Arc<AppState>>,
    connect: Option<ConnectInfo<SocketAddr>>,
    headers: HeaderMap,
    body: Result<Json<ExplainRequest>, JsonRejection>,
) -> Result<Json<AiExplanation>, ApiError> {
    let timer = TimedOperation::start();
    let result = explain_inner(&state, client_ip(&headers, connect.map(|c| c.0)), body).await;
    state.metrics.record_explain(timer.elapsed());
    state.metrics.record_request(result.is_ok());
    result.map(Json)
}

async fn explain_inner(
    state: &AppState,
    ip: String,
    body: Result<Json<ExplainRequest>, JsonRejection>,
) -> Result<AiExplanation, ApiError> {
    let Json(request) = body.map_err(json_rejection)?;
    let text = sanitize(request.text.as_deref().unwrap_or_default(), assistant::MAX_TEXT_CHARS);
    if text.is_empty() {
        return Err(ApiError::BadRequest(error::MISSING_EXPLAIN_TEXT.to_string()));
    }

    if !state.explain_limiter.check(&ip) {
        state.metrics.record_rate_limited();
        warn!(%ip, "Explain rate limit exceeded");
        return Err(ApiError::TooManyRequests(error::EXPLAIN_RATE_LIMITED.to_string()));
    }

    let explanation = state
        .assistant
        .explain(&text)
        .await
        .map_err(ApiError::from_assistant)?;
    info!(keywords = explanation.keywords.len(), "Explanation served");
    Ok(explanation)
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    #[serde(default)]
    hadith_text: Option<String>,
    #[serde(default)]
    user_question: Option<String>,
    /// Taken as-is; unusable turns are dropped before reaching the model.
    #[serde(default)]
    conversation_history: Option<Value>,
    #[serde(default)]
    session_id: Option<String>,
}

#[derive(Debug, Serialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ChatResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub answer: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub is_off_topic: bool,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub should_close_chat: bool,
}

pub async fn chat(
    State(state): State<Arc<AppState>>,
    connect: Option<ConnectInfo<SocketAddr>>,
    headers: HeaderMap,
    body: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let timer = TimedOperation::start();
    let result = chat_inner(&state, client_ip(&headers, connect.map(|c| c.0)), body).await;
    state.metrics.record_chat(timer.elapsed());
    // Off-topic and closed-chat replies are Ok responses carrying a 400
    state
        .metrics
        .record_request(result.as_ref().is_ok_and(|r| r.status().is_success()));
    result
}

async fn chat_inner(
    state: &AppState,
    ip: String,
    body: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(request) = body.map_err(json_rejection)?;
    let hadith_text = sanitize(request.hadith_text.as_deref().unwrap_or_default(), assistant::MAX_TEXT_CHARS);
    let question = sanitize(
        request.user_question.as_deref().unwrap_or_default(),
        assistant::MAX_QUESTION_CHARS,
    );
    if hadith_text.is_empty() || question.is_empty() {
        return Err(ApiError::BadRequest(error::MISSING_CHAT_FIELDS.to_string()));
    }

    if !state.chat_limiter.check(&ip) {
        state.metrics.record_rate_limited();
        warn!(%ip, "Chat rate limit exceeded");
        return Err(ApiError::TooManyRequests(error::CHAT_RATE_LIMITED.to_string()));
    }

    let session = request
        .session_id
        .as_deref()
        .map(|s| sanitize(s, MAX_SESSION_ID_CHARS))
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| ip.clone());

    if state.off_topic.is_closed(&session) {
        info!(%session, "Message on a closed chat");
        return Ok(closed_chat());
    }

    if !is_question_relevant(&question, &hadith_text) {
        let strike = state.off_topic.record(&session);
        state.metrics.record_off_topic(strike.should_close);
        info!(%session, count = strike.count, closed = strike.should_close, "Off-topic question rejected");

        if strike.should_close {
            return Ok(closed_chat());
        }

        let mut answer = OFF_TOPIC_ANSWER.to_string();
        if strike.count > 1 {
            answer.push_str(&format!(
                "\n\n⚠️ تنبيه: لديك {} محاولات متبقية قبل إغلاق الدردشة.",
                strike.remaining
            ));
        }
        let body = ChatResponse {
            success: false,
            answer: Some(answer),
            is_off_topic: true,
            ..Default::default()
        };
        return Ok((StatusCode::BAD_REQUEST, Json(body)).into_response());
    }

    let history = sanitize_history(
        request
            .conversation_history
            .as_ref()
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or_default(),
    );
    let answer = state
        .assistant
        .answer(&hadith_text, &history, &question)
        .await
        .map_err(ApiError::from_assistant)?;

    let body = ChatResponse {
        success: true,
        answer: Some(answer),
        ..Default::default()
    };
    Ok(Json(body).into_response())
}

fn closed_chat() -> Response {
    let body = ChatResponse {
        success: false,
        error: Some(CHAT_CLOSED.to_string()),
        should_close_chat: true,
        ..Default::default()
    };
    (StatusCode::BAD_REQUEST, Json(body)).into_response()
}

fn json_rejection(rejection: JsonRejection) -> ApiError {
    warn!(error = %rejection, "Rejected request body");
    match rejection {
        JsonRejection::MissingJsonContentType(_) => {
            ApiError::BadRequest(error::JSON_CONTENT_TYPE_REQUIRED.to_string())
        }
        _ => ApiError::BadRequest(error::INVALID_JSON.to_string()),
    }
}

/// First `X-Forwarded-For` entry, then `X-Real-IP`, then the peer address.
pub fn client_ip(headers: &HeaderMap, peer: Option<SocketAddr>) -> String {
    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.split(',').next().unwrap_or_default().trim().to_string())
            .filter(|v| !v.is_empty())
    };

    header("x-forwarded-for")
        .or_else(|| header("x-real-ip"))
        .or_else(|| peer.map(|addr| addr.ip().to_string()))
        .unwrap_or_else(|| "unknown".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_client_ip_prefers_forwarded_for() {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", HeaderValue::from_static("203.0.113.7, 10.0.0.1"));
        headers.insert("x-real-ip", HeaderValue::from_static("198.51.100.2"));
        assert_eq!(client_ip(&headers, None), "203.0.113.7");
    }

    #[test]
    fn test_client_ip_fallbacks() {
        let mut headers = HeaderMap::new();
        headers.insert("x-real-ip", HeaderValue::from_static(" 198.51.100.2 "));
        assert_eq!(client_ip(&headers, None), "198.51.100.2");

        let peer: SocketAddr = "192.0.2.1:5555".parse().unwrap();
        assert_eq!(client_ip(&HeaderMap::new(), Some(peer)), "192.0.2.1");
        assert_eq!(client_ip(&HeaderMap::new(), None), "unknown");
    }

    #[test]
    fn test_chat_response_omits_unset_flags() {
        let body = ChatResponse {
            success: true,
            answer: Some("a".to_string()),
            ..Default::default()
        };
        let value = serde_json::to_value(&body).unwrap();
        assert_eq!(value, json!({ "success": true, "answer": "a" }));
    }
}
