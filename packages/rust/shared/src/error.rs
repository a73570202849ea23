//! Error types for skeletonize.
//!
//! Every crate in the workspace reports failures through [`SkeletonError`].
//! Errors coming from injected collaborators (build engine, renderer) are
//! kept as their original `source` so hosts can downcast them.

use std::path::PathBuf;
use std::time::Duration;

/// Boxed error produced by an external collaborator.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Top-level error type for all skeletonize operations.
#[derive(Debug, thiserror::Error)]
pub enum SkeletonError {
    /// The build engine reported an unrecoverable failure.
    #[error("build failure: {0}")]
    BuildFailure(#[source] BoxError),

    /// An expected artifact was absent from the in-memory output store.
    #[error("missing build artifact {path:?}")]
    MissingArtifact { path: PathBuf },

    /// An artifact was present but could not be read as text.
    #[error("unreadable build artifact {path:?}: {message}")]
    Artifact { path: PathBuf, message: String },

    /// The template renderer failed to produce markup.
    #[error("render failure: {0}")]
    RenderFailure(#[source] BoxError),

    /// A build + render cycle did not finish in time.
    #[error("skeleton build timed out after {}ms", timeout.as_millis())]
    BuildTimeout { timeout: Duration },

    /// A splice marker does not occur in the document.
    #[error("marker {anchor:?} not found in document")]
    AnchorNotFound { anchor: String },

    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Subprocess bridge error (spawn, protocol, or remote failure).
    #[error("bridge error: {0}")]
    Bridge(String),
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, SkeletonError>;

impl SkeletonError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Wrap an engine error, keeping it as the source.
    pub fn build(err: impl Into<BoxError>) -> Self {
        Self::BuildFailure(err.into())
    }

    /// Wrap a renderer error, keeping it as the source.
    pub fn render(err: impl Into<BoxError>) -> Self {
        Self::RenderFailure(err.into())
    }

    /// Missing-artifact error for the given output path.
    pub fn missing(path: impl Into<PathBuf>) -> Self {
        Self::MissingArtifact { path: path.into() }
    }

    /// Marker-not-found error.
    pub fn anchor_not_found(anchor: impl Into<String>) -> Self {
        Self::AnchorNotFound {
            anchor: anchor.into(),
        }
    }

    /// Wrap a `std::io::Error` with a path for context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
