//! Error types for credential broker operations.
//!
//! These errors stay inside the crate's backend layer. The broker converts
//! every one of them into an absent value or a `false` return before it
//! reaches a caller; see [`SecretBroker`](crate::SecretBroker).

use std::time::Duration;
use thiserror::Error;

/// Result type alias using [`BrokerError`].
pub type Result<T> = std::result::Result<T, BrokerError>;

/// Errors that can occur while talking to a secret backend.
#[derive(Debug, Error)]
pub enum BrokerError {
    /// Item or field was not found in the vault.
    #[error("item not found: {0}")]
    NotFound(String),

    /// Required CLI tool is not installed.
    #[error("backend CLI not installed: {0}")]
    BackendNotInstalled(String),

    /// The backend process did not finish within its time limit.
    #[error("{program} timed out after {}s", .timeout.as_secs_f64())]
    Timeout {
        /// Program that was running
        program: String,
        /// Limit that elapsed
        timeout: Duration,
    },

    /// Command exited with a non-zero status.
    #[error("command execution failed: {0}")]
    CommandFailed(String),

    /// Backend output could not be parsed.
    #[error("malformed backend response: {0}")]
    MalformedResponse(#[from] serde_json::Error),

    /// Item name would be misread by the backend CLI.
    #[error("invalid item name: {0}")]
    InvalidItemName(String),

    /// Field name would be misread by the backend CLI.
    #[error("invalid field name: {0}")]
    InvalidFieldName(String),

    /// The user's home directory could not be determined.
    #[error("home directory could not be determined")]
    HomeDirNotFound,

    /// Backend operation failed with context.
    #[error("{backend}: {operation} {item}: {source}")]
    BackendOperation {
        /// Backend name
        backend: String,
        /// Operation name (get, create, ...)
        operation: String,
        /// Item name
        item: String,
        /// Underlying error
        #[source]
        source: Box<BrokerError>,
    },

    /// I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Other error (catch-all).
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl BrokerError {
    /// Creates a backend operation error with context.
    ///
    /// # Example
    ///
    /// ```
    /// use credmux::BrokerError;
    ///
    /// let err = BrokerError::NotFound("clustrix-aws-validation".to_string());
    /// let wrapped = BrokerError::backend_op("onepassword", "get", "clustrix-aws-validation", err);
    ///
    /// assert_eq!(
    ///     wrapped.to_string(),
    ///     "onepassword: get clustrix-aws-validation: item not found: clustrix-aws-validation"
    /// );
    /// ```
    pub fn backend_op(
        backend: impl Into<String>,
        operation: impl Into<String>,
        item: impl Into<String>,
        err: BrokerError,
    ) -> Self {
        Self::BackendOperation {
            backend: backend.into(),
            operation: operation.into(),
            item: item.into(),
            source: Box::new(err),
        }
    }

    /// Returns true when the error means "the item or field does not exist",
    /// looking through any operation context.
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::NotFound(_) => true,
            Self::BackendOperation { source, .. } => source.is_not_found(),
            _ => false,
        }
    }

    /// Returns true when the error is a timeout, looking through any
    /// operation context.
    pub fn is_timeout(&self) -> bool {
        match self {
            Self::Timeout { .. } => true,
            Self::BackendOperation { source, .. } => source.is_timeout(),
            _ => false,
        }
    }
}
