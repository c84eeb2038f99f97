//! Error types for classic story conversion
//!
//! - Classification failures (unknown or unsupported legacy format)
//! - Cancellation observed at a transfer boundary
//! - Builder programming errors (fatal)
//! - Per-media transfer failures (absorbed, never raised by `convert`)

use crate::classify::LegacyFormat;
use story_graph::BuilderError;

/// Main conversion error type
#[derive(Debug, thiserror::Error)]
pub enum ConvertError {
    /// Input is not a JSON object or lacks the classic `values` payload
    #[error("invalid classic document: {0}")]
    InvalidDocument(String),

    /// Input does not match any known legacy format
    #[error("unrecognized classic format: {tag}")]
    UnrecognizedFormat {
        /// Detected template tag, or `unknown`
        tag: String,
    },

    /// Legacy format is recognized but has no conversion strategy
    #[error("unsupported classic format: {format}")]
    UnsupportedFormat {
        /// The recognized format
        format: LegacyFormat,
    },

    /// Cancellation observed before a transfer started
    #[error("conversion cancelled after {completed} transfer(s)")]
    Cancelled {
        /// Unique transfers finished before the cancellation point
        completed: usize,
    },

    /// Internal builder invariant violated
    #[error("builder invariant violated: {0}")]
    Builder(#[from] BuilderError),

    /// Configuration rejected
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Built-in content pattern failed to compile
    #[error("content pattern error: {0}")]
    Pattern(#[from] regex::Error),
}

impl ConvertError {
    /// Whether the caller cancelled the conversion
    #[inline]
    #[must_use]
    pub fn is_cancellation(&self) -> bool {
        matches!(self, Self::Cancelled { .. })
    }

    /// Whether the input document could not be classified
    #[inline]
    #[must_use]
    pub fn is_classification_failure(&self) -> bool {
        matches!(
            self,
            Self::InvalidDocument(_) | Self::UnrecognizedFormat { .. } | Self::UnsupportedFormat { .. }
        )
    }

    /// Whether the error is a defect in the conversion code
    #[inline]
    #[must_use]
    pub fn is_programming_error(&self) -> bool {
        matches!(self, Self::Builder(_) | Self::Pattern(_))
    }

    /// Whether retrying the same request could succeed
    ///
    /// Only a cancelled run can be retried; every other failure is
    /// deterministic for the same input.
    #[inline]
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        self.is_cancellation()
    }
}

/// Failure reported by an uploader for one media source
#[derive(Debug, Clone, thiserror::Error)]
pub enum TransferError {
    /// Network or connection error
    #[error("network error: {0}")]
    Network(String),

    /// Remote side refused the source or the upload
    #[error("transfer rejected: {status} - {message}")]
    Rejected {
        /// HTTP status code
        status: u16,
        /// Error message from the remote side
        message: String,
    },

    /// Source is not a transferable media file
    #[error("unsupported source: {0}")]
    Unsupported(String),

    /// Uploader gave up waiting
    #[error("transfer timed out after {0}s")]
    Timeout(u64),
}

impl TransferError {
    /// Check if a later attempt could succeed
    #[inline]
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Network(_) | Self::Timeout(_) | Self::Rejected { status: 429 | 500..=599, .. }
        )
    }
}

/// Configuration loading and validation errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File could not be read
    #[error("cannot read config {path}: {source}")]
    Io {
        /// Path that failed
        path: String,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// File is not valid TOML for [`crate::config::ConvertConfig`]
    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),

    /// A value is out of range
    #[error("invalid value for {field}: {reason}")]
    InvalidValue {
        /// Offending field
        field: &'static str,
        /// Why it was rejected
        reason: String,
    },
}
