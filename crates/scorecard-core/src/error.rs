//! Error types shared across the scorecard crates.
//!
//! `ProviderError` lives here rather than in `scorecard-providers` so the
//! report generator and the CLI can downcast and classify chat failures
//! without string matching.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised by the score store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The referenced student id is not on the roster.
    #[error("student {0} does not exist")]
    StudentNotFound(String),

    /// Reading or writing one of the persisted files failed.
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The roster CSV could not be read or written.
    #[error("roster CSV error on {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    /// The score history JSON could not be parsed or serialized.
    #[error("score history JSON error on {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// The score history parsed as JSON but does not have the expected shape.
    #[error("malformed score history in {path}: {message}")]
    MalformedHistory { path: PathBuf, message: String },
}

impl StoreError {
    /// Returns `true` for the "not found" condition.
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::StudentNotFound(_))
    }
}

/// Errors raised while reading an evaluation schema.
#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("invalid schema JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// A subject (or the document root) is not a JSON object.
    #[error("expected an object at `{0}`")]
    ExpectedObject(String),

    /// A category is neither a list of items nor an object of subcategories.
    #[error("expected a list of item names or an object of subcategories at `{0}`")]
    InvalidCategory(String),

    /// A list that should only hold item names holds something else.
    #[error("expected a list of item names at `{0}`")]
    ExpectedItemList(String),
}

/// Errors raised while reading or rendering prompt templates.
#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("invalid templates JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// The template document is not an object of subject → template string.
    #[error("template for `{0}` is not a string")]
    NotAString(String),

    #[error("no prompt template for subject `{0}`")]
    MissingSubject(String),
}

/// Errors that can occur when talking to a chat-completion provider.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// The user prompt was empty; nothing was sent.
    #[error("user prompt must not be empty")]
    EmptyPrompt,

    /// No API key was configured for the provider; nothing was sent.
    #[error("missing API key for provider {0}")]
    MissingCredential(String),

    /// Authentication failed (invalid API key).
    #[error("authentication failed: {0}")]
    AuthenticationFailed(String),

    /// The API returned a non-success status.
    #[error("API error (HTTP {status}): {message}")]
    ApiError { status: u16, message: String },

    /// The request timed out.
    #[error("request timed out after {0}s")]
    Timeout(u64),

    /// A network error occurred.
    #[error("network error: {0}")]
    NetworkError(String),

    /// The call succeeded but the body carries no generated text.
    #[error("response is missing choices[0].message.content; raw body: {body}")]
    ResponseShape { body: String },
}

impl ProviderError {
    /// Returns `true` if the request was rejected before any network call.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            ProviderError::EmptyPrompt | ProviderError::MissingCredential(_)
        )
    }

    /// Returns `true` for network, timeout and HTTP status failures.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            ProviderError::AuthenticationFailed(_)
                | ProviderError::ApiError { .. }
                | ProviderError::Timeout(_)
                | ProviderError::NetworkError(_)
        )
    }
}
