//! Error types for staygrid.

use thiserror::Error;

/// Errors that can occur in staygrid operations.
#[derive(Error, Debug)]
pub enum StayGridError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Could not persist configuration: {0}")]
    ConfigWrite(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Failed to fetch feed {url}: {reason}")]
    Fetch { url: String, reason: String },

    #[error("Feed request timed out after {0}s")]
    FetchTimeout(u64),

    #[error("ICS parse error: {0}")]
    IcsParse(String),

    #[error("Unknown platform '{0}'")]
    UnknownPlatform(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl StayGridError {
    /// True for errors caused by the caller's request rather than the system.
    pub fn is_invalid_input(&self) -> bool {
        matches!(
            self,
            StayGridError::InvalidInput(_) | StayGridError::UnknownPlatform(_)
        )
    }
}

/// Result type alias for staygrid operations.
pub type StayGridResult<T> = Result<T, StayGridError>;
