use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use workmind_core::WorkmindError;

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("unauthorized")]
    Unauthorized,

    #[error("forbidden: {0}")]
    Forbidden(String),

    #[error("duplicate: {0}")]
    Duplicate(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("database error: {0}")]
    Database(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl AuthError {
    pub fn status(&self) -> StatusCode {
        match self {
            AuthError::NotFound(_) => StatusCode::NOT_FOUND,
            AuthError::Unauthorized => StatusCode::UNAUTHORIZED,
            AuthError::Forbidden(_) => StatusCode::FORBIDDEN,
            AuthError::Duplicate(_) => StatusCode::CONFLICT,
            AuthError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            AuthError::Database(_) | AuthError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match self {
            AuthError::Unauthorized => "unauthorized".to_string(),
            AuthError::Database(msg) => {
                tracing::error!("database error: {msg}");
                "internal error".to_string()
            }
            AuthError::NotFound(msg)
            | AuthError::Forbidden(msg)
            | AuthError::Duplicate(msg)
            | AuthError::InvalidInput(msg)
            | AuthError::Internal(msg) => msg,
        };

        let body = serde_json::json!({ "error": message });
        (status, axum::Json(body)).into_response()
    }
}

impl From<rusqlite::Error> for AuthError {
    fn from(e: rusqlite::Error) -> Self {
        AuthError::Database(e.to_string())
    }
}

impl From<WorkmindError> for AuthError {
    fn from(e: WorkmindError) -> Self {
        match e {
            WorkmindError::UnknownRole(_)
            | WorkmindError::UnknownAction(_)
            | WorkmindError::UnknownInvitationStatus(_)
            | WorkmindError::InvalidRecord { .. } => AuthError::InvalidInput(e.to_string()),
            other => AuthError::Internal(other.to_string()),
        }
    }
}
