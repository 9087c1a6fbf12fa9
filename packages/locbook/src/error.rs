//! Typed errors for the ingestion pipeline.
//!
//! Every abort path maps to one [`ErrorCategory`], which carries the single
//! user-presentable message for that class of failure. Raw upstream text stays
//! in the `Display` impls and the logs.

use serde::Serialize;
use thiserror::Error;

use gemini_client::GeminiError;

/// Stable, user-presentable failure classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// 429-class from the AI backend
    RateLimited,
    /// 5xx-class from a provider
    UpstreamUnavailable,
    /// 4xx "model/resource missing"
    NotFound,
    /// 4xx malformed prompt or media
    BadRequest,
    /// Timeout or connection failure
    NetworkFailure,
    /// Structured response could not be decoded
    ParseFailure,
    /// Required credential missing
    NotConfigured,
    /// Required field absent after enrichment
    ValidationFailure,
    /// No data source produced anything usable
    ResolveFailed,
    Unknown,
}

impl ErrorCategory {
    /// The one message shown to end users for this category.
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::RateLimited => "Too many requests right now. Please wait a moment and try again.",
            Self::UpstreamUnavailable => {
                "The analysis service is under maintenance. Please try again a little later."
            }
            Self::NotFound => "Couldn't find this place. Please double-check the link.",
            Self::BadRequest => "That link or photo couldn't be read. Please send another one.",
            Self::NetworkFailure => "Couldn't reach the place services. Please try again shortly.",
            Self::ParseFailure => "Couldn't put the analysis of this place into words. Please try again with another link or photo.",
            Self::NotConfigured => "Place analysis isn't available right now.",
            Self::ValidationFailure => {
                "Couldn't work out which place this is. Please send a clearer link or photo."
            }
            Self::ResolveFailed => "Couldn't open this place. Please check the link and try again.",
            Self::Unknown => "Something went wrong. Please try again later.",
        }
    }

    /// Only transient upstream conditions are worth a retry with backoff.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::RateLimited | Self::UpstreamUnavailable)
    }
}

/// Errors fetching pages or images over HTTP.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("invalid URL: {url}")]
    InvalidUrl { url: String },

    #[error("timeout fetching: {url}")]
    Timeout { url: String },

    #[error("HTTP error fetching {url}: {message}")]
    Http { url: String, message: String },
}

/// Errors surfaced by the enrichment engine. Never carries raw upstream text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EnrichmentError {
    #[error("AI backend rate limited")]
    RateLimited,

    #[error("AI backend unavailable (HTTP {status})")]
    UpstreamUnavailable { status: u16 },

    #[error("AI model or resource not found")]
    NotFound,

    #[error("AI backend rejected the request")]
    BadRequest,

    #[error("AI backend unreachable")]
    Network,

    #[error("AI response could not be decoded")]
    ParseFailure,

    #[error("AI backend not configured")]
    NotConfigured,

    #[error("AI backend failed")]
    Unknown,
}

impl EnrichmentError {
    /// Classify a non-2xx HTTP status from an AI backend.
    pub fn from_status(status: u16) -> Self {
        match status {
            429 => Self::RateLimited,
            500..=599 => Self::UpstreamUnavailable { status },
            404 => Self::NotFound,
            400 => Self::BadRequest,
            _ => Self::Unknown,
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::RateLimited => ErrorCategory::RateLimited,
            Self::UpstreamUnavailable { .. } => ErrorCategory::UpstreamUnavailable,
            Self::NotFound => ErrorCategory::NotFound,
            Self::BadRequest => ErrorCategory::BadRequest,
            Self::Network => ErrorCategory::NetworkFailure,
            Self::ParseFailure => ErrorCategory::ParseFailure,
            Self::NotConfigured => ErrorCategory::NotConfigured,
            Self::Unknown => ErrorCategory::Unknown,
        }
    }
}

impl From<&GeminiError> for EnrichmentError {
    fn from(e: &GeminiError) -> Self {
        match e {
            GeminiError::Config(_) => Self::NotConfigured,
            GeminiError::Network(_) | GeminiError::Timeout => Self::Network,
            GeminiError::Api { message, .. } if message.contains("RESOURCE_EXHAUSTED") => {
                Self::RateLimited
            }
            GeminiError::Api { status, .. } => Self::from_status(*status),
            GeminiError::Parse(_) => Self::ParseFailure,
        }
    }
}

/// The resolver could not get anything usable out of any source.
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("no usable data source for {url}")]
    NoUsableSource { url: String },
}

/// Persistence errors.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("record not found: {id}")]
    NotFound { id: String },

    #[error("storage backend error: {0}")]
    Backend(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// Pipeline-level failure. A failure at any stage leaves no partial record.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("resolve failed: {0}")]
    Resolve(#[from] ResolveError),

    #[error("enrichment failed: {0}")]
    Enrichment(#[from] EnrichmentError),

    #[error("required field missing after enrichment: {field}")]
    Validation { field: &'static str },

    #[error("storage error: {0}")]
    Storage(#[from] StoreError),
}

impl IngestError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Resolve(_) => ErrorCategory::ResolveFailed,
            Self::Enrichment(e) => e.category(),
            Self::Validation { .. } => ErrorCategory::ValidationFailure,
            Self::Storage(_) => ErrorCategory::Unknown,
        }
    }

    pub fn user_message(&self) -> &'static str {
        self.category().user_message()
    }

    pub fn is_retryable(&self) -> bool {
        self.category().is_retryable()
    }
}

/// Result type alias for pipeline operations.
pub type Result<T> = std::result::Result<T, IngestError>;
