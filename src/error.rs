use std::path::PathBuf;

use thiserror::Error;

use crate::cli::orchestration::Stage;

/// Unified error type for packager operations
#[derive(Error, Debug)]
pub enum PackagerError {
    #[error("Working tree is not clean ({} uncommitted path(s)): {}", .paths.len(), .paths.join(", "))]
    DirtyRepository { paths: Vec<String> },

    #[error("Empty changelog message")]
    EmptyChangelog,

    #[error("Cannot write version marker to {}: {reason}", .path.display())]
    VersionWrite { path: PathBuf, reason: String },

    #[error("Archive error: {0}")]
    Archive(String),

    #[error("Commit failed: {0}")]
    Commit(String),

    #[error("Tag error: {0}")]
    Tag(String),

    #[error("Push failed: {0}")]
    Push(String),

    #[error("Git operation failed: {0}")]
    Git(#[from] git2::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Version parsing error: {0}")]
    Version(String),

    #[error("Prompt error: {0}")]
    Prompt(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience type alias for Results in packager
pub type Result<T> = std::result::Result<T, PackagerError>;

impl PackagerError {
    /// Create a version write error naming the file that could not be written
    pub fn version_write(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        PackagerError::VersionWrite {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    /// Create a configuration error with context
    pub fn config(msg: impl Into<String>) -> Self {
        PackagerError::Config(msg.into())
    }

    /// Create a version error with context
    pub fn version(msg: impl Into<String>) -> Self {
        PackagerError::Version(msg.into())
    }

    /// Create an archive error with context
    pub fn archive(msg: impl Into<String>) -> Self {
        PackagerError::Archive(msg.into())
    }

    /// Create a commit error with context
    pub fn commit(msg: impl Into<String>) -> Self {
        PackagerError::Commit(msg.into())
    }

    /// Create a tag error with context
    pub fn tag(msg: impl Into<String>) -> Self {
        PackagerError::Tag(msg.into())
    }

    /// Create a push error with context
    pub fn push(msg: impl Into<String>) -> Self {
        PackagerError::Push(msg.into())
    }

    /// Create a prompt error with context
    pub fn prompt(msg: impl Into<String>) -> Self {
        PackagerError::Prompt(msg.into())
    }

    /// Whether the run can be retried without inspecting the working tree first.
    ///
    /// Failures before the version writer touches any file leave nothing behind.
    pub fn is_safe_to_rerun(&self) -> bool {
        matches!(
            self,
            PackagerError::DirtyRepository { .. }
                | PackagerError::EmptyChangelog
                | PackagerError::Config(_)
                | PackagerError::Prompt(_)
        )
    }
}

/// A pipeline run that stopped at `stage`.
///
/// The display already carries the underlying error, so it is not exposed as `source`.
#[derive(Error, Debug)]
#[error("{stage} failed: {error}")]
pub struct PipelineFailure {
    pub stage: Stage,
    pub error: PackagerError,
}

impl PipelineFailure {
    pub fn new(stage: Stage, error: PackagerError) -> Self {
        PipelineFailure { stage, error }
    }
}
