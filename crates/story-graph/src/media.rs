//! External media references discovered while building
//!
//! The builder records one [`MediaRequest`] per occurrence of an externally
//! hosted image or video. The transfer layer resolves them into
//! [`TransferOutcome`]s keyed by [`normalize_url`], which the builder then
//! folds back into resource data.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of media behind a reference
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    /// Still image
    Image,
    /// Directly hosted video file
    Video,
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Image => f.write_str("image"),
            Self::Video => f.write_str("video"),
        }
    }
}

/// Where a reference was found, passed through to the uploader
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MediaContext {
    /// Media kind
    pub kind: MediaKind,
    /// Human-readable origin, e.g. `section 3 media`
    pub label: String,
}

impl MediaContext {
    /// Image found at `label`
    #[must_use]
    pub fn image(label: impl Into<String>) -> Self {
        Self {
            kind: MediaKind::Image,
            label: label.into(),
        }
    }

    /// Video found at `label`
    #[must_use]
    pub fn video(label: impl Into<String>) -> Self {
        Self {
            kind: MediaKind::Video,
            label: label.into(),
        }
    }
}

/// One occurrence of an external media reference
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaRequest {
    /// Source URL as written in the classic document
    pub url: String,
    /// Context hint for the uploader
    pub context: MediaContext,
}

impl MediaRequest {
    /// Create a request
    #[must_use]
    pub fn new(url: impl Into<String>, context: MediaContext) -> Self {
        Self {
            url: url.into(),
            context,
        }
    }

    /// Dedup key for this request
    #[must_use]
    pub fn key(&self) -> String {
        normalize_url(&self.url)
    }
}

/// Resolution of one unique source URL
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferOutcome {
    /// Normalized source URL
    pub source: String,
    /// Local resource name when the transfer succeeded
    pub resource_name: Option<String>,
    /// Whether the media now lives locally
    pub transferred: bool,
}

impl TransferOutcome {
    /// Successful transfer
    #[must_use]
    pub fn transferred(source: impl Into<String>, resource_name: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            resource_name: Some(resource_name.into()),
            transferred: true,
        }
    }

    /// Reference left pointing at the remote source
    #[must_use]
    pub fn kept_remote(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            resource_name: None,
            transferred: false,
        }
    }
}

/// Canonical form of a source URL used as the dedup key
///
/// Trims whitespace, upgrades protocol-relative and `http` URLs to `https`,
/// lowercases scheme and host, and drops any `#fragment`. Query strings are
/// kept since they usually select a different rendition.
#[must_use]
pub fn normalize_url(raw: &str) -> String {
    let trimmed = raw.trim();
    let without_fragment = trimmed.split('#').next().unwrap_or_default();

    let (scheme, rest) = if let Some(rest) = without_fragment.strip_prefix("//") {
        ("https", rest)
    } else if let Some((scheme, rest)) = without_fragment.split_once("://") {
        let scheme = scheme.to_ascii_lowercase();
        let scheme = if scheme == "http" { "https".to_string() } else { scheme };
        return join(&scheme, rest);
    } else {
        return without_fragment.to_string();
    };

    join(scheme, rest)
}

fn join(scheme: &str, rest: &str) -> String {
    let (host, path) = match rest.find(['/', '?']) {
        Some(idx) => rest.split_at(idx),
        None => (rest, ""),
    };
    format!("{scheme}://{}{path}", host.to_ascii_lowercase())
}
