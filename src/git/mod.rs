//! Git operations abstraction layer
//!
//! This module provides a trait-based abstraction over the repository
//! operations a release needs, so the release workflow can run against a
//! real repository or an in-memory fake.
//!
//! # Overview
//!
//! - [repository::Git2Repository]: A real implementation using the `git2` crate
//! - [mock::MockRepository]: A recording fake for testing
//!
//! # Usage
//!
//! ```rust
//! # use packager::git::Repository;
//! # use std::path::Path;
//! # fn example<R: Repository>(repo: &R) -> packager::Result<()> {
//! if repo.dirty_paths()?.is_empty() {
//!     repo.stage_all()?;
//!     repo.commit_from_file(Path::new("/tmp/message.txt"))?;
//!     repo.create_tag("v20240115120000", None)?;
//!     repo.push_tags("origin")?;
//! }
//! # Ok(())
//! # }
//! ```

pub mod mock;
pub mod repository;

pub use mock::MockRepository;
pub use repository::Git2Repository;

use crate::error::Result;
use git2::Oid;
use std::path::{Path, PathBuf};

/// Repository operations used by the release workflow
///
/// All methods return [crate::error::Result<T>]. Implementations map failures
/// to the variant of the step that failed: [crate::error::PackagerError::Commit]
/// for staging and committing, [crate::error::PackagerError::Tag] for tagging,
/// [crate::error::PackagerError::Push] for pushing.
///
/// ## Implementations
///
/// - [Git2Repository](repository::Git2Repository): Real Git implementation using the `git2` crate
/// - [MockRepository](mock::MockRepository): Test implementation recording every call
pub trait Repository {
    /// Root of the working tree
    ///
    /// # Returns
    /// * `Ok(PathBuf)` - Absolute path of the working directory
    /// * `Err` - If the repository is bare
    fn workdir(&self) -> Result<PathBuf>;

    /// Paths with staged, unstaged, or untracked changes
    ///
    /// Ignored files are not reported. An empty list means the working tree is clean.
    fn dirty_paths(&self) -> Result<Vec<String>>;

    /// Stage every change in the working tree, including deletions (`git add -A`)
    fn stage_all(&self) -> Result<()>;

    /// Commit the index on the current branch, reading the message from a file (`git commit -F`)
    ///
    /// # Arguments
    /// * `message_file` - File holding the raw commit message
    ///
    /// # Returns
    /// * `Ok(Oid)` - The new commit
    /// * `Err` - If the file cannot be read or the commit cannot be created
    fn commit_from_file(&self, message_file: &Path) -> Result<Oid>;

    /// Tag the current HEAD commit
    ///
    /// # Arguments
    /// * `name` - Name for the new tag
    /// * `message` - `Some` creates an annotated tag, `None` a lightweight one
    ///
    /// # Returns
    /// * `Ok(())` - Success
    /// * `Err` - If the tag already exists, HEAD is unborn, or Git error occurs
    fn create_tag(&self, name: &str, message: Option<&str>) -> Result<()>;

    /// Get all tags in the repository, sorted alphabetically
    fn list_tags(&self) -> Result<Vec<String>>;

    /// Push every local tag to a remote (`git push --tags`)
    ///
    /// # Arguments
    /// * `remote` - Name of the remote (e.g., "origin")
    ///
    /// # Returns
    /// * `Ok(Vec<String>)` - Names of the tags that were pushed
    /// * `Err` - If the remote doesn't exist or rejects the push
    fn push_tags(&self, remote: &str) -> Result<Vec<String>>;

    /// Message of the HEAD commit, `None` if HEAD is unborn
    fn head_message(&self) -> Result<Option<String>>;
}
