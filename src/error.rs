//! Error types shared across the crate.
//!
//! Only the catalog and media seams can fail; everything else in the
//! playback core degrades to `None`, an empty list or a no-op.

/// Failures reported by the remote catalog collaborator.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("catalog request failed: {0}")]
    Transport(String),

    #[error("catalog item not found: {0}")]
    NotFound(String),

    #[error("unexpected catalog response: {0}")]
    Decode(String),
}

/// Result type for catalog calls.
pub type CatalogResult<T> = std::result::Result<T, CatalogError>;

/// Failures reported by a live media element.
#[derive(Debug, thiserror::Error)]
pub enum MediaError {
    #[error("failed to load source {uri}: {reason}")]
    Load { uri: String, reason: String },

    /// The environment refused to start playback (e.g. an autoplay policy).
    #[error("playback was rejected: {0}")]
    PlayRejected(String),
}

/// Result type for media element calls.
pub type MediaResult<T> = std::result::Result<T, MediaError>;

/// Configuration loading or validation failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error(transparent)]
    Load(#[from] ::config::ConfigError),

    #[error("invalid setting: {0}")]
    Invalid(String),

    #[error("invalid server url: {0}")]
    Url(#[from] url::ParseError),
}
