//! Error types for gitsdk operations.

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Result type for gitsdk operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while resolving or fetching an SDK artifact.
#[derive(Error, Debug)]
pub enum Error {
    /// The requested flavor/architecture combination is not built by CI.
    #[error("Unsupported SDK variant: {0}")]
    UnsupportedVariant(String),

    /// The remote API answered with a non-success status.
    #[error("GET {url} failed: HTTP {status} {reason}")]
    HttpStatus {
        /// The queried URL.
        url: String,
        /// The HTTP status code.
        status: u16,
        /// The canonical status reason, if any.
        reason: String,
    },

    /// The build listing did not contain exactly one matching build.
    #[error("Expected exactly one completed build for definition {definition}, got {count}")]
    BuildCount {
        /// The queried build definition id.
        definition: u32,
        /// The count reported by the service.
        count: u64,
    },

    /// The artifact listing did not contain exactly one artifact with the
    /// expected name.
    #[error("Expected exactly one artifact named '{name}', found {matches} in listing: {listing}")]
    ArtifactListing {
        /// The expected artifact name.
        name: String,
        /// How many artifacts matched.
        matches: usize,
        /// The full listing, for diagnosis.
        listing: String,
    },

    /// Network-level failure, propagated unchanged from the transport.
    #[error(transparent)]
    Transport(#[from] reqwest::Error),

    /// The remote API returned a body that is not the expected JSON shape.
    #[error("Malformed JSON from {url}: {source}")]
    Json {
        /// The queried URL.
        url: String,
        /// The underlying parse error.
        #[source]
        source: serde_json::Error,
    },

    /// A target path exists but is not a directory.
    #[error("Path {} exists and is not a directory", path.display())]
    NotADirectory {
        /// The offending path.
        path: PathBuf,
    },

    /// Archive parsing or entry handling failed.
    #[error("Extraction failed: {0}")]
    Extraction(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Create an unsupported-variant error.
    #[must_use]
    pub fn unsupported_variant(message: impl Into<String>) -> Self {
        Self::UnsupportedVariant(message.into())
    }

    /// Create an HTTP status error.
    #[must_use]
    pub fn http_status(url: impl Into<String>, status: u16, reason: impl Into<String>) -> Self {
        Self::HttpStatus {
            url: url.into(),
            status,
            reason: reason.into(),
        }
    }

    /// Create a build count error.
    #[must_use]
    pub fn build_count(definition: u32, count: u64) -> Self {
        Self::BuildCount { definition, count }
    }

    /// Create an artifact listing error.
    #[must_use]
    pub fn artifact_listing(
        name: impl Into<String>,
        matches: usize,
        listing: impl Into<String>,
    ) -> Self {
        Self::ArtifactListing {
            name: name.into(),
            matches,
            listing: listing.into(),
        }
    }

    /// Create a JSON parse error for a given URL.
    #[must_use]
    pub fn json(url: impl Into<String>, source: serde_json::Error) -> Self {
        Self::Json {
            url: url.into(),
            source,
        }
    }

    /// Create a not-a-directory error.
    #[must_use]
    pub fn not_a_directory(path: &Path) -> Self {
        Self::NotADirectory {
            path: path.to_path_buf(),
        }
    }

    /// Create an extraction error.
    #[must_use]
    pub fn extraction(message: impl Into<String>) -> Self {
        Self::Extraction(message.into())
    }
}
