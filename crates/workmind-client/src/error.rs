use reqwest::StatusCode;
use workmind_core::WorkmindError;

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// Connect failure, timeout or an interrupted body.
    #[error("transport error: {0}")]
    Transport(String),

    #[error("unauthorized")]
    Unauthorized,

    #[error("forbidden: {0}")]
    Forbidden(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("validation error: {0}")]
    Validation(String),

    #[error("server error ({status}): {message}")]
    Server { status: u16, message: String },
}

pub type Result<T> = std::result::Result<T, ClientError>;

impl ClientError {
    /// Maps a non-success response to the taxonomy. `body` is the raw
    /// response text; a `{"error": ...}` body contributes its message.
    pub fn from_status(status: StatusCode, body: &str) -> Self {
        let message = serde_json::from_str::<serde_json::Value>(body)
            .ok()
            .and_then(|v| v.get("error").and_then(|e| e.as_str()).map(String::from))
            .unwrap_or_else(|| body.trim().to_string());

        match status {
            StatusCode::UNAUTHORIZED => ClientError::Unauthorized,
            StatusCode::FORBIDDEN => ClientError::Forbidden(message),
            StatusCode::NOT_FOUND => ClientError::NotFound(message),
            StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => {
                ClientError::Validation(message)
            }
            other => ClientError::Server {
                status: other.as_u16(),
                message,
            },
        }
    }

    pub fn is_transport(&self) -> bool {
        matches!(self, ClientError::Transport(_))
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            ClientError::Validation(format!("malformed response: {e}"))
        } else {
            ClientError::Transport(e.to_string())
        }
    }
}

impl From<WorkmindError> for ClientError {
    fn from(e: WorkmindError) -> Self {
        ClientError::Validation(e.to_string())
    }
}
