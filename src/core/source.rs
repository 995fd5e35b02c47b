//! Price source abstraction

use async_trait::async_trait;
use std::fmt::Display;
use thiserror::Error;

use crate::core::quote::{PriceQuote, QuoteSource};

/// Why a source could not produce a quote.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("request timed out")]
    Timeout,
    #[error("transport error: {0}")]
    Transport(String),
    #[error("HTTP error: {0}")]
    HttpStatus(reqwest::StatusCode),
    #[error("no price found in response")]
    NoMatch,
    #[error("bad response: {0}")]
    BadResponse(String),
    #[error("invalid price: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    Transport,
    Parse,
    Validation,
}

impl Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                FailureKind::Transport => "transport",
                FailureKind::Parse => "parse",
                FailureKind::Validation => "validation",
            }
        )
    }
}

impl SourceError {
    pub fn kind(&self) -> FailureKind {
        match self {
            SourceError::Timeout | SourceError::Transport(_) | SourceError::HttpStatus(_) => {
                FailureKind::Transport
            }
            SourceError::NoMatch | SourceError::BadResponse(_) => FailureKind::Parse,
            SourceError::Invalid(_) => FailureKind::Validation,
        }
    }
}

impl From<reqwest::Error> for SourceError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            SourceError::Timeout
        } else if let Some(status) = e.status() {
            SourceError::HttpStatus(status)
        } else if e.is_decode() {
            SourceError::BadResponse(e.to_string())
        } else {
            SourceError::Transport(e.to_string())
        }
    }
}

/// A single external price source.
///
/// `fetch` is total: every fault ends up as a [`SourceError`], nothing is
/// allowed to panic or escape as another error type.
#[async_trait]
pub trait PriceSource: Send + Sync {
    fn kind(&self) -> QuoteSource;

    async fn fetch(&self) -> Result<PriceQuote, SourceError>;
}
