use thiserror::Error;

#[derive(Debug, Error)]
pub enum WorkmindError {
    // IO
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // Config
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Configuration file not found at {0}; run `workmind init` first")]
    ConfigNotFound(String),

    // Model
    #[error("Unknown role: {0}")]
    UnknownRole(String),

    #[error("Unknown override action: {0}")]
    UnknownAction(String),

    #[error("Unknown invitation status: {0}")]
    UnknownInvitationStatus(String),

    #[error("Invalid permission record for {name}: {reason}")]
    InvalidRecord { name: String, reason: String },

    // Serialization
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("TOML deserialization error: {0}")]
    TomlDe(String),

    #[error("TOML serialization error: {0}")]
    TomlSer(String),
}

pub type Result<T> = std::result::Result<T, WorkmindError>;
