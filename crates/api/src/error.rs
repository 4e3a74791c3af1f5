//! HTTP error responses. Every variant renders as `{"error": message}`;
//! messages are user-facing and never carry internal error text.

use assistant::{AssistantError, LlmError};
use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use tracing::error;

pub const MISSING_EXPLAIN_TEXT: &str = "لم يتم تقديم نص للشرح";
pub const MISSING_CHAT_FIELDS: &str = "يجب توفير نص الحديث والسؤال";
pub const JSON_CONTENT_TYPE_REQUIRED: &str = "يجب أن يكون نوع المحتوى application/json";
pub const INVALID_JSON: &str = "البيانات المرسلة غير صحيحة";
pub const EXPLAIN_RATE_LIMITED: &str = "تم تجاوز حد الطلبات اليومية لميزة الشرح";
pub const CHAT_RATE_LIMITED: &str = "تم تجاوز حد الطلبات اليومية للدردشة";
pub const AI_NOT_CONFIGURED: &str = "مفتاح API OpenAI غير متوفر. يرجى تكوين البيئة بشكل صحيح.";
pub const AI_TIMEOUT: &str = "انتهت مهلة الانتظار. يرجى المحاولة مجدداً";
pub const AI_UNAVAILABLE: &str = "تعذر الاتصال بخدمة الذكاء الاصطناعي. يرجى المحاولة لاحقاً";
pub const AI_MALFORMED: &str = "تعذرت قراءة رد خدمة الذكاء الاصطناعي. يرجى المحاولة مجدداً";

#[derive(Debug)]
pub enum ApiError {
    /// Invalid request (400).
    BadRequest(String),
    /// Per-IP rate limit exceeded (429).
    TooManyRequests(String),
    /// Upstream failure, forwarded status or 502.
    Upstream { status: StatusCode, message: String },
    /// Unexpected server error (500).
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::TooManyRequests(_) => StatusCode::TOO_MANY_REQUESTS,
            ApiError::Upstream { status, .. } => *status,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Map an assistant failure to a response, logging the underlying cause.
    pub fn from_assistant(err: AssistantError) -> Self {
        error!(error = %err, "AI request failed");
        match err {
            AssistantError::Llm(LlmError::MissingApiKey) => {
                ApiError::Internal(AI_NOT_CONFIGURED.to_string())
            }
            AssistantError::Llm(LlmError::Status(code)) => ApiError::Upstream {
                status: upstream_status(code),
                message: format!("خطأ من OpenAI API: {}", code),
            },
            AssistantError::Llm(LlmError::Request(e)) if e.is_timeout() => ApiError::Upstream {
                status: StatusCode::BAD_GATEWAY,
                message: AI_TIMEOUT.to_string(),
            },
            AssistantError::Llm(LlmError::Request(_)) => ApiError::Upstream {
                status: StatusCode::BAD_GATEWAY,
                message: AI_UNAVAILABLE.to_string(),
            },
            AssistantError::Llm(LlmError::InvalidResponse(_)) | AssistantError::MalformedResponse(_) => {
                ApiError::Upstream {
                    status: StatusCode::BAD_GATEWAY,
                    message: AI_MALFORMED.to_string(),
                }
            }
        }
    }
}

/// Forward an upstream error status; anything that is not an error status becomes 502.
pub fn upstream_status(code: u16) -> StatusCode {
    StatusCode::from_u16(code)
        .ok()
        .filter(|s| s.is_client_error() || s.is_server_error())
        .unwrap_or(StatusCode::BAD_GATEWAY)
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match self {
            ApiError::BadRequest(msg)
            | ApiError::TooManyRequests(msg)
            | ApiError::Internal(msg)
            | ApiError::Upstream { message: msg, .. } => msg,
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}
