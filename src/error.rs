use crate::retry::ErrorKind;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Google Sheets error: {0}")]
    Sheets(String),

    #[error("Google Drive error: {0}")]
    Drive(String),

    #[error("{context} failed after {attempts} attempt(s): {kind}")]
    Api {
        context: String,
        attempts: u32,
        kind: ErrorKind,
    },

    #[error("OAuth2 authentication error: {0}")]
    Auth(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid cell range: {0}")]
    Range(String),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

impl AppError {
    /// Classified kind of a failed remote call, if this error came from one.
    pub fn api_kind(&self) -> Option<&ErrorKind> {
        match self {
            AppError::Api { kind, .. } => Some(kind),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
