//! Crate error types and result alias.

use thiserror::Error;

/// Crate result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised by the resolution and deployment engine.
///
/// Recoverable per-source failures (an unreadable metadata file on one
/// repository, say) are not raised through this type directly; they are
/// accumulated on the operation result and only folded into a
/// [`Error::VersionResolution`] when the overall operation comes up empty.
#[derive(Error, Debug)]
pub enum Error {
    /// Missing or invalid configuration, including absent collaborators
    /// detected at construction time.
    #[error("configuration error: {0}")]
    Config(String),

    /// Validation error (malformed coordinates, bad input)
    #[error("validation error: {0}")]
    Validation(String),

    /// The session is offline and a network operation was requested.
    #[error("the repository system is in offline mode")]
    Offline,

    /// No concrete version could be determined for an artifact. Carries
    /// every tolerated error encountered while consulting metadata.
    #[error("failed to resolve version for {artifact}")]
    VersionResolution {
        artifact: String,
        errors: Vec<Error>,
    },

    /// A deploy operation failed. Wraps the first failing transfer's error.
    #[error("failed to deploy {item}: {source}")]
    Deployment {
        item: String,
        #[source]
        source: Box<Error>,
    },

    /// No connector could be obtained for a remote repository.
    #[error("no connector available for repository {repository}")]
    NoConnector { repository: String },

    /// A metadata file does not exist in the queried repository. Tolerated
    /// during merges (treated as absence of prior state).
    #[error("metadata {path} not found in {repository}")]
    MetadataNotFound { path: String, repository: String },

    /// A metadata file exists but could not be parsed.
    #[error("invalid metadata {path}: {reason}")]
    InvalidMetadata { path: String, reason: String },

    /// A transfer failed for reasons other than the item being absent.
    #[error("transfer of {path} failed: {reason}")]
    Transfer { path: String, reason: String },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Whether this error is a tolerable "no prior state" condition.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::MetadataNotFound { .. })
    }
}
