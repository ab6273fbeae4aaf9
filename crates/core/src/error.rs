//! Error types for metagen operations.
//!
//! This module defines the main error type [`MetagenError`] for the fatal
//! parts of a batch (configuration, storage connection, record selection)
//! and [`GenerationError`] for the per-record remote generation boundary.
//!
//! Empty content and unpublished records are not errors: they are reported
//! as [`RecordOutcome`](crate::RecordOutcome) variants by the batch runner.
//!
//! # Example
//!
//! ```rust
//! use metagen_core::{MetagenError, Result};
//!
//! fn table(name: &str) -> Result<&str> {
//!     if name.is_empty() {
//!         return Err(MetagenError::InvalidTableName(name.to_string()));
//!     }
//!     Ok(name)
//! }
//! ```

use thiserror::Error;

/// Main error type for batch setup and storage operations.
///
/// Only connection establishment and record selection are allowed to end a
/// batch early; everything else is absorbed per record.
#[derive(Error, Debug)]
pub enum MetagenError {
    /// The storage connection could not be established.
    ///
    /// Fatal: the batch is aborted before any record is processed.
    #[error("Failed to connect to the content database: {0}")]
    Connection(#[source] sqlx::Error),

    /// A storage query failed.
    ///
    /// Fatal when raised by record selection.
    #[error("Content query failed: {0}")]
    Query(#[source] sqlx::Error),

    /// Table names are interpolated into SQL and must be plain identifiers.
    #[error("Invalid table name: {0:?} (only letters, digits and '_' are allowed)")]
    InvalidTableName(String),

    /// Missing or malformed configuration value.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// The generation endpoint is not a valid URL.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}

impl From<config::ConfigError> for MetagenError {
    fn from(err: config::ConfigError) -> Self {
        MetagenError::ConfigError(err.to_string())
    }
}

/// Result type alias for MetagenError.
pub type Result<T> = std::result::Result<T, MetagenError>;

/// Failure of a single metadata generation call.
///
/// Every variant is treated the same way by the batch runner: the record is
/// counted as an API error and the writer is not called.
#[derive(Error, Debug)]
pub enum GenerationError {
    /// Network, DNS or TLS failure from reqwest.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Request exceeded the configured timeout.
    #[error("Request timed out after {timeout} seconds")]
    Timeout { timeout: u64 },

    /// The service answered with a non-2xx status.
    #[error("Generation service returned {status}: {body}")]
    Status { status: u16, body: String },

    /// The response body is not a chat completion object.
    #[error("Malformed completion response: {0}")]
    MalformedResponse(String),

    /// The completion has no choices.
    #[error("Completion response contains no choices")]
    EmptyChoices,

    /// The first choice carries no message content.
    #[error("Completion choice has no message content")]
    MissingContent,

    /// The message content is not the expected JSON object.
    #[error("Generated payload is not valid metadata JSON: {0}")]
    InvalidPayload(String),

    /// One of the two fields is present but blank.
    #[error("Generated field `{0}` is empty")]
    BlankField(&'static str),
}
