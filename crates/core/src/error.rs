//! Unified error types for the enrichment engine.
//!
//! Lookup errors are per-item and get swallowed by the orchestrators;
//! setup errors (config, schema, upstream source) abort a single flow.

use std::time::Duration;
use thiserror::Error;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Unified error type for the enrichment engine.
#[derive(Debug, Error)]
pub enum Error {
    /// The request never produced a response (DNS, connect, TLS, body read).
    #[error("transport error: {0}")]
    Transport(String),

    /// The remote service answered with a non-success status.
    #[error("upstream returned HTTP {status}: {message}")]
    HttpStatus { status: u16, message: String },

    #[error("lookup timed out after {0:?}")]
    Timeout(Duration),

    #[error("decode error: {0}")]
    Decode(String),

    /// A weather window spans both past and future dates.
    #[error("window {start}..={end} straddles {today}; split it before dispatch")]
    StraddlesToday {
        start: chrono::NaiveDate,
        end: chrono::NaiveDate,
        today: chrono::NaiveDate,
    },

    #[error("database error: {0}")]
    Database(String),

    #[error("cache error: {0}")]
    Cache(String),

    /// Upstream entity derivation failed (missing table or column).
    #[error("source error: {0}")]
    Source(String),

    #[error("config error: {0}")]
    Config(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

impl Error {
    pub fn transport(msg: impl Into<String>) -> Self {
        Self::Transport(msg.into())
    }

    pub fn http_status(status: u16, msg: impl Into<String>) -> Self {
        Self::HttpStatus {
            status,
            message: msg.into(),
        }
    }

    pub fn decode(msg: impl Into<String>) -> Self {
        Self::Decode(msg.into())
    }

    pub fn database(msg: impl Into<String>) -> Self {
        Self::Database(msg.into())
    }

    pub fn cache(msg: impl Into<String>) -> Self {
        Self::Cache(msg.into())
    }

    pub fn source(msg: impl Into<String>) -> Self {
        Self::Source(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Whether this error came from talking to the remote lookup service.
    pub fn is_lookup_failure(&self) -> bool {
        matches!(
            self,
            Self::Transport(_)
                | Self::HttpStatus { .. }
                | Self::Timeout(_)
                | Self::Decode(_)
                | Self::StraddlesToday { .. }
        )
    }

    /// Short stable label used in structured logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Transport(_) => "transport",
            Self::HttpStatus { .. } => "http_status",
            Self::Timeout(_) => "timeout",
            Self::Decode(_) => "decode",
            Self::StraddlesToday { .. } => "straddles_today",
            Self::Database(_) => "database",
            Self::Cache(_) => "cache",
            Self::Source(_) => "source",
            Self::Config(_) => "config",
            Self::Serialization(_) => "serialization",
            Self::Internal(_) => "internal",
        }
    }
}
