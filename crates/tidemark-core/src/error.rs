/// Errors that can occur during synchronization and mutation operations.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Network error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Server rejected request ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Malformed server payload: {message}")]
    Malformed { message: String },

    #[error("Validation failed: {message}")]
    Validation { message: String },

    #[error("Feed is owned by the current user and cannot be toggled")]
    OwnedFeed,

    #[error("Unknown {kind}: {id}")]
    UnknownRecord { kind: &'static str, id: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl CoreError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    pub(crate) fn unknown(kind: &'static str, id: impl Into<String>) -> Self {
        Self::UnknownRecord {
            kind,
            id: id.into(),
        }
    }
}
