/// Error Handling Module
///
/// Every layer has its own error enum; `AppError` unifies them at the HTTP
/// edge and decides the status code and the client-facing message. Internal
/// failures are logged with detail and answered with an opaque body.

use actix_web::{error::ResponseError, http::StatusCode, HttpResponse};

use crate::auth::AuthError;
use crate::logger::current_request_id;
use crate::urls::UrlError;
pub use crate::validators::ValidationError;

/// ============================================================================
/// 1. UNIFIED APPLICATION ERROR TYPE
/// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error(transparent)]
    Url(#[from] UrlError),
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Internal errors are never described to the client.
    fn is_internal(&self) -> bool {
        match self {
            AppError::Validation(_) => false,
            AppError::Auth(e) => matches!(
                e,
                AuthError::Store(_)
                    | AuthError::Session(_)
                    | AuthError::Hash(_)
                    | AuthError::Blocking(_)
            ),
            AppError::Url(e) => matches!(e, UrlError::Store(_)),
            AppError::Internal(_) => true,
        }
    }
}

// ============================================================================
// 2. HTTP RESPONSE MAPPING
// ============================================================================

/// Error response structure for HTTP responses
#[derive(Debug, serde::Serialize)]
pub struct ErrorResponse {
    /// Unique error ID for tracking, also present in the logs
    pub error_id: String,
    /// Human-readable error message
    pub message: String,
    /// Error code for client-side handling
    pub code: String,
    /// HTTP status code
    pub status: u16,
    pub timestamp: String,
}

impl ErrorResponse {
    pub fn new(error_id: String, message: String, code: String, status: u16) -> Self {
        Self {
            error_id,
            message,
            code,
            status,
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// Trait for converting errors to HTTP responses with proper logging
pub trait ErrorHandler {
    fn error_response(&self, request_id: &str) -> (StatusCode, ErrorResponse);
    fn log_error(&self, request_id: &str);
}

impl ErrorHandler for AppError {
    fn error_response(&self, request_id: &str) -> (StatusCode, ErrorResponse) {
        let (code, message) = match self {
            AppError::Validation(e) => ("VALIDATION_ERROR", e.to_string()),

            AppError::Auth(e) => match e {
                AuthError::UserExists => ("USER_EXISTS", "User already exists".to_string()),
                AuthError::WrongCredentials => {
                    ("INVALID_CREDENTIALS", "Wrong login or password".to_string())
                }
                AuthError::InvalidSession => {
                    ("INVALID_SESSION", "Invalid or expired session".to_string())
                }
                AuthError::MissingToken => {
                    ("MISSING_TOKEN", "Missing authentication token".to_string())
                }
                AuthError::InvalidToken => {
                    ("TOKEN_INVALID", "Invalid or expired token".to_string())
                }
                _ => ("INTERNAL_ERROR", "Internal server error".to_string()),
            },

            AppError::Url(e) => match e {
                UrlError::AliasExists => ("ALIAS_EXISTS", "Alias already exists".to_string()),
                UrlError::UrlNotFound => ("NOT_FOUND", "Url not found".to_string()),
                UrlError::Store(_) => ("INTERNAL_ERROR", "Internal server error".to_string()),
            },

            AppError::Internal(_) => ("INTERNAL_ERROR", "Internal server error".to_string()),
        };

        let status = ResponseError::status_code(self);
        let error_response = ErrorResponse::new(
            request_id.to_string(),
            message,
            code.to_string(),
            status.as_u16(),
        );

        (status, error_response)
    }

    fn log_error(&self, request_id: &str) {
        if self.is_internal() {
            tracing::error!(request_id = request_id, error = %self, "Internal error");
            return;
        }

        match self {
            AppError::Validation(e) => {
                tracing::warn!(request_id = request_id, error = %e, "Validation error");
            }
            AppError::Auth(AuthError::WrongCredentials) => {
                tracing::warn!(request_id = request_id, "Invalid credentials attempt");
            }
            AppError::Auth(e) => {
                tracing::warn!(request_id = request_id, error = %e, "Authentication error");
            }
            _ => {
                tracing::info!(request_id = request_id, error = %self, "Request rejected");
            }
        }
    }
}

/// The id `LoggerMiddleware` assigned to the current request, or a fresh one
/// when running outside of it.
fn request_id() -> String {
    current_request_id().unwrap_or_else(|| uuid::Uuid::new_v4().to_string())
}

/// Implement ResponseError for Actix-web integration
impl ResponseError for AppError {
    fn error_response(&self) -> HttpResponse {
        let request_id = request_id();
        self.log_error(&request_id);

        let (status, error_response) = <Self as ErrorHandler>::error_response(self, &request_id);

        HttpResponse::build(status).json(error_response)
    }

    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Auth(e) => match e {
                AuthError::UserExists => StatusCode::CONFLICT,
                AuthError::WrongCredentials
                | AuthError::InvalidSession
                | AuthError::MissingToken
                | AuthError::InvalidToken => StatusCode::UNAUTHORIZED,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            },
            AppError::Url(e) => match e {
                UrlError::AliasExists => StatusCode::CONFLICT,
                UrlError::UrlNotFound => StatusCode::NOT_FOUND,
                UrlError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

// ============================================================================
// 3. ERROR CONTEXT ENRICHMENT
// ============================================================================

/// Per-operation context carried by handlers for structured logs.
#[derive(Debug, Clone)]
pub struct ErrorContext {
    pub request_id: String,
    pub user_id: Option<String>,
    pub operation: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

impl ErrorContext {
    pub fn new(operation: impl Into<String>) -> Self {
        Self {
            request_id: request_id(),
            user_id: None,
            operation: operation.into(),
            timestamp: chrono::Utc::now(),
        }
    }

    pub fn with_user_id(mut self, user_id: impl ToString) -> Self {
        self.user_id = Some(user_id.to_string());
        self
    }

    /// Logs `error` with this context attached and hands it back, so it can
    /// sit inside a `map_err`.
    pub fn log_error(&self, error: AppError) -> AppError {
        let context = serde_json::json!({
            "request_id": self.request_id,
            "operation": self.operation,
            "user_id": self.user_id,
            "timestamp": self.timestamp.to_rfc3339(),
        });

        if error.is_internal() {
            tracing::error!(error = %error, context = %context, "Operation failed");
        } else {
            tracing::warn!(error = %error, context = %context, "Operation rejected");
        }
        error
    }
}
