use std::sync::Arc;

use bon::Builder;
use thiserror::Error;

/// Errors raised while talking to a recipe site.
#[derive(Debug, Error, Clone)]
pub enum FetchError {
    #[error("failed to build HTTP client: {0}")]
    BuildClient(#[source] Arc<reqwest::Error>),
    #[error("request error during `{stage}`: {source}")]
    Request {
        stage: &'static str,
        #[source]
        source: Arc<reqwest::Error>,
    },
    #[error("unexpected HTTP status {status} during `{stage}`")]
    HttpStatus { stage: &'static str, status: u16 },
    #[error("failed to read HTTP body during `{stage}`: {source}")]
    Body {
        stage: &'static str,
        #[source]
        source: Arc<reqwest::Error>,
    },
}

impl FetchError {
    pub fn request(stage: &'static str, error: reqwest::Error) -> Self {
        Self::Request {
            stage,
            source: Arc::new(error),
        }
    }

    pub fn body(stage: &'static str, error: reqwest::Error) -> Self {
        Self::Body {
            stage,
            source: Arc::new(error),
        }
    }

    /// Transport errors and throttle/server statuses are worth another
    /// attempt; anything else (404, 410, ...) fails the fetch immediately.
    pub fn is_retryable(&self) -> bool {
        match self {
            FetchError::Request { .. } | FetchError::Body { .. } => true,
            FetchError::HttpStatus { status, .. } => {
                matches!(status, 403 | 408 | 429) || *status >= 500
            }
            FetchError::BuildClient(_) => false,
        }
    }
}

/// Errors raised while mapping a page to a recipe record.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("invalid selector for `{field}`: {message}")]
    Selector {
        field: &'static str,
        message: String,
    },
    #[error("page has no `{field}` element")]
    MissingField { field: &'static str },
}

/// Options for one batch run.
#[derive(Debug, Clone, Builder)]
pub struct ScrapeOptions {
    #[builder(into)]
    pub source: String,
    pub limit: Option<usize>,
}

/// Final counts produced after a batch completes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub processed: usize,
    pub archived: usize,
    pub skipped_duplicate: usize,
    pub failed: usize,
}
