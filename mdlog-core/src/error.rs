use std::path::PathBuf;
use thiserror::Error;

/// Unified error type for mdlog.
#[derive(Error, Debug)]
pub enum MdlogError {
    #[error("Malformed request body: {0}")]
    Parse(String),

    #[error("Failed to create log directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to append to {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("Config error: {0}")]
    Config(#[from] Box<figment::Error>),

    #[error("Internal: {0}")]
    Internal(String),
}

/// Coarse classification used for logging and metric labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Parse,
    Io,
    Serialization,
    Config,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Parse => "parse",
            ErrorKind::Io => "io",
            ErrorKind::Serialization => "serialization",
            ErrorKind::Config => "config",
        }
    }
}

impl From<figment::Error> for MdlogError {
    fn from(e: figment::Error) -> Self {
        MdlogError::Config(Box::new(e))
    }
}

impl MdlogError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            MdlogError::Parse(_) => ErrorKind::Parse,
            MdlogError::CreateDir { .. } | MdlogError::Write { .. } | MdlogError::Internal(_) => {
                ErrorKind::Io
            }
            MdlogError::Serde(_) => ErrorKind::Serialization,
            MdlogError::Config(_) => ErrorKind::Config,
        }
    }

    /// Map to HTTP status code. Callers never get a distinct client-error
    /// status; every request-time failure is a 500.
    pub fn status_code(&self) -> u16 {
        500
    }

    /// JSON error body sent over the wire. Never carries diagnostics.
    pub fn to_json_body(&self) -> Vec<u8> {
        br#"{"error":"Failed to save log"}"#.to_vec()
    }
}
