use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::Value;

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

/// Application error kinds. Credential and token failures are terminal for
/// the request; only `StoreUnavailable` is worth a caller retry.
#[derive(Debug)]
pub enum AppError {
    MissingCredentials(&'static str),
    InvalidCredentials,
    TokenExpired(&'static str),
    TokenInvalid(&'static str),
    TokenRevoked,
    NoActiveSession,
    NotFound(String),
    Forbidden(String),
    Conflict(String),
    BadRequest(String),
    Validation(Vec<String>),
    StoreUnavailable(anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message, code, details) = match self {
            AppError::MissingCredentials(msg) => (
                StatusCode::UNAUTHORIZED,
                msg.to_string(),
                "MISSING_CREDENTIALS".to_string(),
                None,
            ),
            AppError::InvalidCredentials => (
                StatusCode::UNAUTHORIZED,
                "Invalid credentials".to_string(),
                "INVALID_CREDENTIALS".to_string(),
                None,
            ),
            AppError::TokenExpired(msg) => (
                StatusCode::FORBIDDEN,
                msg.to_string(),
                "TOKEN_EXPIRED".to_string(),
                None,
            ),
            AppError::TokenInvalid(msg) => (
                StatusCode::FORBIDDEN,
                msg.to_string(),
                "TOKEN_INVALID".to_string(),
                None,
            ),
            AppError::TokenRevoked => (
                StatusCode::FORBIDDEN,
                "Refresh token expired or invalid".to_string(),
                "TOKEN_REVOKED".to_string(),
                None,
            ),
            AppError::NoActiveSession => (
                StatusCode::NOT_FOUND,
                "No active session".to_string(),
                "NO_ACTIVE_SESSION".to_string(),
                None,
            ),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg, "NOT_FOUND".to_string(), None),
            AppError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg, "FORBIDDEN".to_string(), None),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, msg, "CONFLICT".to_string(), None),
            AppError::BadRequest(msg) => (
                StatusCode::BAD_REQUEST,
                msg,
                "BAD_REQUEST".to_string(),
                None,
            ),
            AppError::Validation(errors) => (
                StatusCode::BAD_REQUEST,
                "Validation failed".to_string(),
                "VALIDATION_ERROR".to_string(),
                Some(serde_json::json!({ "errors": errors })),
            ),
            AppError::StoreUnavailable(err) => {
                tracing::error!("Store unavailable: {:?}", err);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Store unavailable".to_string(),
                    "STORE_UNAVAILABLE".to_string(),
                    None,
                )
            }
        };

        let body = Json(ErrorResponse {
            error: error_message,
            code,
            details,
        });

        (status, body).into_response()
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::StoreUnavailable(err)
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => AppError::NotFound("Resource not found".to_string()),
            _ => AppError::StoreUnavailable(err.into()),
        }
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let messages: Vec<String> = errors
            .field_errors()
            .into_iter()
            .flat_map(|(field, errs)| {
                errs.iter()
                    .map(move |e| format!("{}: {}", field, e.code.as_ref()))
            })
            .collect();
        AppError::Validation(messages)
    }
}
