//! Clean working tree check run before anything is written.

use crate::error::{PackagerError, Result};
use crate::git::Repository;

/// Fails with [`PackagerError::DirtyRepository`] if the working tree has any
/// staged, unstaged, or untracked change. Has no side effects.
pub fn ensure_clean<R: Repository>(repo: &R) -> Result<()> {
    let paths = repo.dirty_paths()?;
    if paths.is_empty() {
        tracing::debug!("working tree is clean");
        return Ok(());
    }

    tracing::debug!(count = paths.len(), "working tree has uncommitted changes");
    Err(PackagerError::DirtyRepository { paths })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::git::MockRepository;

    #[test]
    fn test_clean_repository_passes() {
        let repo = MockRepository::new("/work");
        assert!(ensure_clean(&repo).is_ok());
    }

    #[test]
    fn test_dirty_repository_fails_with_paths() {
        let repo = MockRepository::new("/work").with_dirty_paths(&["src/a.py", "new.txt"]);
        match ensure_clean(&repo) {
            Err(PackagerError::DirtyRepository { paths }) => {
                assert_eq!(paths, vec!["src/a.py".to_string(), "new.txt".to_string()]);
            }
            other => panic!("expected DirtyRepository, got {:?}", other),
        }
    }

    #[test]
    fn test_guard_does_not_mutate() {
        let repo = MockRepository::new("/work").with_dirty_paths(&["x"]);
        let _ = ensure_clean(&repo);
        let state = repo.state();
        assert_eq!(state.stage_calls, 0);
        assert!(state.commits.is_empty());
        assert!(state.tags.is_empty());
    }
}
