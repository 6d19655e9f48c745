use axum::{http::StatusCode, response::IntoResponse, Json};
use serde::{Deserialize, Serialize};

use crate::JsonResponse;

#[derive(Debug, thiserror::Error)]
pub enum RequestError {
    #[error("{0}")]
    NotFound(&'static str),
    #[error("{0}")]
    NotAuthorized(&'static str),
    #[error("{0}")]
    Forbidden(&'static str),
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    Conflict(&'static str),
    #[error("server error: {0}")]
    ServerError(#[from] anyhow::Error),
    #[error("database error: {0}")]
    DatabaseError(#[from] sqlx::Error),
}

/// Body of every error response.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorMessage {
    pub message: String,
}

impl ErrorMessage {
    pub fn new(message: impl Into<String>) -> ErrorMessage {
        ErrorMessage {
            message: message.into(),
        }
    }
}

/// Envelope used by the newsletter endpoints for success and failure alike.
#[derive(Debug, Serialize, Deserialize)]
pub struct StatusEnvelope {
    pub success: bool,
    pub message: String,
}

impl StatusEnvelope {
    pub fn ok(message: impl Into<String>) -> StatusEnvelope {
        StatusEnvelope {
            success: true,
            message: message.into(),
        }
    }

    pub fn failed(message: impl Into<String>) -> StatusEnvelope {
        StatusEnvelope {
            success: false,
            message: message.into(),
        }
    }
}

impl RequestError {
    pub fn bad_request(message: impl Into<String>) -> RequestError {
        RequestError::BadRequest(message.into())
    }

    pub fn is_unique_violation(&self) -> bool {
        match self {
            RequestError::DatabaseError(sqlx::Error::Database(e)) => {
                e.message().contains("UNIQUE constraint failed")
            }
            _ => false,
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            RequestError::NotFound(_) => StatusCode::NOT_FOUND,
            RequestError::NotAuthorized(_) => StatusCode::UNAUTHORIZED,
            RequestError::Forbidden(_) => StatusCode::FORBIDDEN,
            RequestError::BadRequest(_) => StatusCode::BAD_REQUEST,
            RequestError::Conflict(_) => StatusCode::CONFLICT,
            RequestError::DatabaseError(_) if self.is_unique_violation() => StatusCode::CONFLICT,
            RequestError::ServerError(_) | RequestError::DatabaseError(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Client-facing message. Internal failures are logged here and never leak their detail.
    pub fn public_message(&self) -> String {
        match self {
            RequestError::NotFound(message)
            | RequestError::NotAuthorized(message)
            | RequestError::Forbidden(message)
            | RequestError::Conflict(message) => message.to_string(),
            RequestError::BadRequest(message) => message.clone(),
            RequestError::DatabaseError(_) if self.is_unique_violation() => {
                "Resource already exists".to_string()
            }
            RequestError::DatabaseError(e) => {
                tracing::error!("Database error: {}", e);
                "Internal server error".to_string()
            }
            RequestError::ServerError(e) => {
                tracing::error!("Server error: {:#}", e);
                "Internal server error".to_string()
            }
        }
    }

    pub fn to_json_response(&self) -> JsonResponse<ErrorMessage> {
        (self.status_code(), Json(ErrorMessage::new(self.public_message())))
    }

    pub fn to_status_envelope(&self) -> JsonResponse<StatusEnvelope> {
        (
            self.status_code(),
            Json(StatusEnvelope::failed(self.public_message())),
        )
    }
}

impl IntoResponse for RequestError {
    fn into_response(self) -> axum::response::Response {
        self.to_json_response().into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response_status(err: RequestError) -> StatusCode {
        err.into_response().status()
    }

    #[test]
    fn taxonomy_maps_to_http_status() {
        assert_eq!(
            response_status(RequestError::NotAuthorized("Invalid or expired token")),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            response_status(RequestError::Forbidden("nope")),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            response_status(RequestError::NotFound("Post not found")),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            response_status(RequestError::bad_request("Missing required fields")),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            response_status(RequestError::Conflict("Email is already subscribed")),
            StatusCode::CONFLICT
        );
        assert_eq!(
            response_status(RequestError::ServerError(anyhow::anyhow!("boom"))),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            response_status(RequestError::DatabaseError(sqlx::Error::RowNotFound)),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn internal_errors_hide_their_detail() {
        let err = RequestError::ServerError(anyhow::anyhow!("smtp password rejected"));
        let (_, Json(body)) = err.to_json_response();
        assert_eq!(body.message, "Internal server error");
    }

    #[test]
    fn status_envelope_reports_failure() {
        let (status, Json(body)) =
            RequestError::NotFound("Email is not subscribed").to_status_envelope();
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(!body.success);
        assert_eq!(body.message, "Email is not subscribed");
    }
}
