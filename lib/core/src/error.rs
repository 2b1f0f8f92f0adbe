use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid input shape: {0}")]
    InputShape(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("File index unavailable: {0}")]
    IndexUnavailable(String),

    #[error("Record not found: {0}")]
    RecordNotFound(String),

    #[error("Cannot read {path:?}: {reason}")]
    Unreadable { path: PathBuf, reason: String },

    #[error("Operation cancelled")]
    Cancelled,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}
