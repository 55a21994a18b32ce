//! Error types for NEO ingestion, storage and reporting.
//!
//! Not-found is never an error here: readers return `Ok(None)` and the
//! HTTP layer maps that to 404.

use thiserror::Error;

type BoxedSource = Box<dyn std::error::Error + Send + Sync>;

/// Error category for structured logging and HTTP status mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// `neo.toml` or environment misconfigured
    ConfigError,
    /// Opening, pooling or querying the SQLite store
    StorageError,
    /// Network failure or non-2xx response from the NeoWs feed
    FeedError,
    /// Feed answered, but without `near_earth_objects` (rate limit, bad key, ...)
    UpstreamPayloadError,
    /// A feed record that does not match the expected shape
    DecodeError,
    /// Chat-completions call for the narrative report failed
    NarrativeError,
    /// Unexpected logic bugs
    InternalError,
}

impl ErrorCategory {
    /// Machine-readable code for logging
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ConfigError => "CONFIG_ERROR",
            Self::StorageError => "STORAGE_ERROR",
            Self::FeedError => "FEED_ERROR",
            Self::UpstreamPayloadError => "UPSTREAM_PAYLOAD_ERROR",
            Self::DecodeError => "DECODE_ERROR",
            Self::NarrativeError => "NARRATIVE_ERROR",
            Self::InternalError => "INTERNAL_ERROR",
        }
    }

    /// Whether the failure originated outside this process
    pub fn is_upstream(self) -> bool {
        matches!(
            self,
            Self::FeedError | Self::UpstreamPayloadError | Self::NarrativeError
        )
    }
}

/// NEO error with category and context
#[derive(Debug, Error)]
pub enum NeoError {
    #[error("config error: {message}")]
    Config {
        message: String,
        #[source]
        source: Option<BoxedSource>,
    },

    #[error("storage error: {message}")]
    Storage {
        message: String,
        #[source]
        source: Option<BoxedSource>,
    },

    #[error("feed error: {message}")]
    Feed {
        message: String,
        #[source]
        source: Option<BoxedSource>,
    },

    /// The raw payload is kept verbatim for diagnostics.
    #[error("upstream feed error: {message}: {payload}")]
    UpstreamPayload { message: String, payload: String },

    #[error("decode error: {message}")]
    Decode {
        message: String,
        #[source]
        source: Option<BoxedSource>,
    },

    #[error("narrative error: {message}")]
    Narrative {
        message: String,
        #[source]
        source: Option<BoxedSource>,
    },

    #[error("internal error: {message}")]
    Internal {
        message: String,
        #[source]
        source: Option<BoxedSource>,
    },
}

impl NeoError {
    /// Prefix the message with `context`, keeping the variant and source.
    pub fn context(mut self, context: impl std::fmt::Display) -> Self {
        match &mut self {
            Self::Config { message, .. }
            | Self::Storage { message, .. }
            | Self::Feed { message, .. }
            | Self::UpstreamPayload { message, .. }
            | Self::Decode { message, .. }
            | Self::Narrative { message, .. }
            | Self::Internal { message, .. } => {
                *message = format!("{context}: {message}");
            }
        }
        self
    }

    /// Get the error category
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Config { .. } => ErrorCategory::ConfigError,
            Self::Storage { .. } => ErrorCategory::StorageError,
            Self::Feed { .. } => ErrorCategory::FeedError,
            Self::UpstreamPayload { .. } => ErrorCategory::UpstreamPayloadError,
            Self::Decode { .. } => ErrorCategory::DecodeError,
            Self::Narrative { .. } => ErrorCategory::NarrativeError,
            Self::Internal { .. } => ErrorCategory::InternalError,
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
            source: None,
        }
    }

    pub fn config_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Config {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
            source: None,
        }
    }

    pub fn storage_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Storage {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    pub fn feed(message: impl Into<String>) -> Self {
        Self::Feed {
            message: message.into(),
            source: None,
        }
    }

    pub fn feed_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Feed {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create an upstream payload error, keeping the raw body for diagnostics
    pub fn upstream_payload(message: impl Into<String>, payload: impl Into<String>) -> Self {
        Self::UpstreamPayload {
            message: message.into(),
            payload: payload.into(),
        }
    }

    pub fn decode_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Decode {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    pub fn narrative(message: impl Into<String>) -> Self {
        Self::Narrative {
            message: message.into(),
            source: None,
        }
    }

    pub fn narrative_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Narrative {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
            source: None,
        }
    }
}

impl From<rusqlite::Error> for NeoError {
    fn from(err: rusqlite::Error) -> Self {
        Self::storage_with_source("sqlite", err)
    }
}

impl From<r2d2::Error> for NeoError {
    fn from(err: r2d2::Error) -> Self {
        Self::storage_with_source("connection pool", err)
    }
}

/// Result type for NEO operations
pub type Result<T> = std::result::Result<T, NeoError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_categories_match_variants() {
        assert_eq!(
            NeoError::config("x").category(),
            ErrorCategory::ConfigError
        );
        assert_eq!(
            NeoError::upstream_payload("missing key", "{}").category(),
            ErrorCategory::UpstreamPayloadError
        );
        assert_eq!(NeoError::internal("x").category().as_str(), "INTERNAL_ERROR");
    }

    #[test]
    fn test_upstream_payload_is_reported_verbatim() {
        let err = NeoError::upstream_payload(
            "response lacks near_earth_objects",
            r#"{"error":{"code":"OVER_RATE_LIMIT"}}"#,
        );
        let rendered = err.to_string();
        assert!(rendered.contains("OVER_RATE_LIMIT"));
        assert!(err.category().is_upstream());
    }

    #[test]
    fn test_context_prefixes_without_rewrapping() {
        let err: NeoError = rusqlite::Error::QueryReturnedNoRows.into();
        let err = err.context("failed to ingest asteroid 7 (2024-01-02)");

        assert_eq!(err.category(), ErrorCategory::StorageError);
        assert_eq!(
            err.to_string(),
            "storage error: failed to ingest asteroid 7 (2024-01-02): sqlite"
        );
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_sqlite_errors_map_to_storage() {
        let err: NeoError = rusqlite::Error::QueryReturnedNoRows.into();
        assert_eq!(err.category(), ErrorCategory::StorageError);
        assert!(!err.category().is_upstream());
    }
}
