use thiserror::Error;

use crate::types::ArticleId;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Article {0} not found locally")]
    NotFoundLocally(ArticleId),

    #[error("Unknown category: {0}")]
    UnknownCategory(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Coarse classification attached to the synchronizer's failure logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Network,
    Parse,
    NotFoundLocally,
    Other,
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Network(_) => ErrorKind::Network,
            Error::Http(e) if e.is_decode() => ErrorKind::Parse,
            Error::Http(_) => ErrorKind::Network,
            Error::Parse(_) | Error::Serialization(_) => ErrorKind::Parse,
            Error::NotFoundLocally(_) => ErrorKind::NotFoundLocally,
            _ => ErrorKind::Other,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
