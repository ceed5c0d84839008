/// Shared error type used across all ClimateCompass crates.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("IO: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// No persisted state exists for the requested conversation.
    /// Callers recover by seeding an empty state.
    #[error("not found: {0}")]
    NotFound(String),

    /// Persisted state exists but cannot be decoded. Escalates to the
    /// caller; never silently reseeded.
    #[error("corrupt state document: {0}")]
    Corrupt(String),

    #[error("provider {provider}: {message}")]
    Provider { provider: String, message: String },

    #[error("timeout: {0}")]
    Timeout(String),

    /// The turn was cancelled at a node boundary. No state was persisted.
    #[error("turn cancelled")]
    Cancelled,

    #[error("config: {0}")]
    Config(String),

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Short machine-readable tag for error-recovery records.
    pub fn kind(&self) -> &'static str {
        match self {
            Error::Io(_) => "io",
            Error::Json(_) => "json",
            Error::NotFound(_) => "not_found",
            Error::Corrupt(_) => "corrupt",
            Error::Provider { .. } => "provider",
            Error::Timeout(_) => "timeout",
            Error::Cancelled => "cancelled",
            Error::Config(_) => "config",
            Error::Other(_) => "other",
        }
    }
}
