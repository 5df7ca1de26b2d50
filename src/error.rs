//! Error types for organization mirroring.

use thiserror::Error;

/// The main error type for mirroring operations.
#[derive(Error, Debug)]
pub enum MirrorError {
    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Failed to list repositories of {org}: {message}")]
    List { org: String, message: String },

    #[error("Clone failed for {repo}: {message}")]
    Clone { repo: String, message: String },

    #[error("Pull failed for {repo}: {message}")]
    Pull { repo: String, message: String },

    #[error("GitHub API error: {message}")]
    GitHub { message: String },

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Git error: {0}")]
    Git(#[from] git2::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl MirrorError {
    /// Whether this error belongs to a single repository's clone or update.
    ///
    /// Only these are subject to the fail-fast policy; every other kind
    /// aborts the run.
    pub fn is_repository_error(&self) -> bool {
        matches!(self, Self::Clone { .. } | Self::Pull { .. })
    }

    pub(crate) fn clone_failed(repo: &str, message: impl std::fmt::Display) -> Self {
        Self::Clone {
            repo: repo.to_string(),
            message: message.to_string(),
        }
    }

    pub(crate) fn pull_failed(repo: &str, message: impl std::fmt::Display) -> Self {
        Self::Pull {
            repo: repo.to_string(),
            message: message.to_string(),
        }
    }
}

/// A specialized Result type for mirroring operations.
pub type Result<T> = std::result::Result<T, MirrorError>;
