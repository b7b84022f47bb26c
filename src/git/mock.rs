use crate::error::{PackagerError, Result};
use crate::git::Repository;
use git2::Oid;
use std::cell::RefCell;
use std::fs;
use std::path::{Path, PathBuf};

/// Mock repository for testing without actual git operations
///
/// Records every mutating call so tests can assert on what the release
/// workflow did, and can be told to fail individual steps.
pub struct MockRepository {
    workdir: PathBuf,
    dirty: Vec<String>,
    fail_commit: Option<String>,
    fail_tag: Option<String>,
    fail_push: Option<String>,
    state: RefCell<MockState>,
}

/// Everything the mock has been asked to do
#[derive(Debug, Default, Clone, PartialEq)]
pub struct MockState {
    pub stage_calls: usize,
    /// Message file paths passed to `commit_from_file`
    pub message_files: Vec<PathBuf>,
    /// Contents of those files, read at commit time
    pub commits: Vec<String>,
    /// (name, annotation message)
    pub tags: Vec<(String, Option<String>)>,
    /// (remote, tags pushed)
    pub pushes: Vec<(String, Vec<String>)>,
}

impl MockRepository {
    /// Create a clean mock repository rooted at `workdir`
    pub fn new(workdir: impl Into<PathBuf>) -> Self {
        MockRepository {
            workdir: workdir.into(),
            dirty: Vec::new(),
            fail_commit: None,
            fail_tag: None,
            fail_push: None,
            state: RefCell::new(MockState::default()),
        }
    }

    /// Report these paths as uncommitted changes
    pub fn with_dirty_paths(mut self, paths: &[&str]) -> Self {
        self.dirty = paths.iter().map(|p| p.to_string()).collect();
        self
    }

    /// Make `commit_from_file` fail after recording the call
    pub fn failing_commit(mut self, reason: impl Into<String>) -> Self {
        self.fail_commit = Some(reason.into());
        self
    }

    /// Make `create_tag` fail
    pub fn failing_tag(mut self, reason: impl Into<String>) -> Self {
        self.fail_tag = Some(reason.into());
        self
    }

    /// Make `push_tags` fail
    pub fn failing_push(mut self, reason: impl Into<String>) -> Self {
        self.fail_push = Some(reason.into());
        self
    }

    /// Snapshot of the recorded calls
    pub fn state(&self) -> MockState {
        self.state.borrow().clone()
    }
}

impl Repository for MockRepository {
    fn workdir(&self) -> Result<PathBuf> {
        Ok(self.workdir.clone())
    }

    fn dirty_paths(&self) -> Result<Vec<String>> {
        Ok(self.dirty.clone())
    }

    fn stage_all(&self) -> Result<()> {
        self.state.borrow_mut().stage_calls += 1;
        Ok(())
    }

    fn commit_from_file(&self, message_file: &Path) -> Result<Oid> {
        let mut state = self.state.borrow_mut();
        state.message_files.push(message_file.to_path_buf());

        if let Some(reason) = &self.fail_commit {
            return Err(PackagerError::commit(reason.clone()));
        }

        let message = fs::read_to_string(message_file).map_err(|e| {
            PackagerError::commit(format!("Cannot read message file: {}", e))
        })?;
        state.commits.push(message);

        let n = state.commits.len() as u8;
        Ok(Oid::from_bytes(&[n; 20])?)
    }

    fn create_tag(&self, name: &str, message: Option<&str>) -> Result<()> {
        if let Some(reason) = &self.fail_tag {
            return Err(PackagerError::tag(reason.clone()));
        }

        let mut state = self.state.borrow_mut();
        if state.tags.iter().any(|(existing, _)| existing == name) {
            return Err(PackagerError::tag(format!("Tag '{}' already exists", name)));
        }
        state
            .tags
            .push((name.to_string(), message.map(|m| m.to_string())));
        Ok(())
    }

    fn list_tags(&self) -> Result<Vec<String>> {
        let mut names: Vec<String> = self
            .state
            .borrow()
            .tags
            .iter()
            .map(|(name, _)| name.clone())
            .collect();
        names.sort();
        Ok(names)
    }

    fn push_tags(&self, remote: &str) -> Result<Vec<String>> {
        if let Some(reason) = &self.fail_push {
            return Err(PackagerError::push(reason.clone()));
        }

        let tags = self.list_tags()?;
        self.state
            .borrow_mut()
            .pushes
            .push((remote.to_string(), tags.clone()));
        Ok(tags)
    }

    fn head_message(&self) -> Result<Option<String>> {
        Ok(self.state.borrow().commits.last().cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_mock_repository_clean_by_default() {
        let repo = MockRepository::new("/work/widget");
        assert!(repo.dirty_paths().unwrap().is_empty());
        assert_eq!(repo.workdir().unwrap(), PathBuf::from("/work/widget"));
    }

    #[test]
    fn test_mock_repository_dirty() {
        let repo = MockRepository::new("/work").with_dirty_paths(&["a.txt"]);
        assert_eq!(repo.dirty_paths().unwrap(), vec!["a.txt".to_string()]);
    }

    #[test]
    fn test_mock_repository_records_commit() {
        let dir = TempDir::new().unwrap();
        let msg = dir.path().join("msg");
        fs::write(&msg, "hello").unwrap();

        let repo = MockRepository::new(dir.path());
        repo.commit_from_file(&msg).unwrap();

        let state = repo.state();
        assert_eq!(state.message_files, vec![msg]);
        assert_eq!(state.commits, vec!["hello".to_string()]);
        assert_eq!(repo.head_message().unwrap().as_deref(), Some("hello"));
    }

    #[test]
    fn test_mock_repository_failing_commit_records_path() {
        let repo = MockRepository::new("/work").failing_commit("hook rejected");
        let err = repo.commit_from_file(Path::new("/tmp/msg")).unwrap_err();
        assert!(err.to_string().contains("hook rejected"));
        assert_eq!(repo.state().message_files.len(), 1);
        assert!(repo.state().commits.is_empty());
    }

    #[test]
    fn test_mock_repository_tags_and_push() {
        let repo = MockRepository::new("/work");
        repo.create_tag("v2", None).unwrap();
        repo.create_tag("v1", Some("notes")).unwrap();
        assert!(repo.create_tag("v1", None).is_err());

        let pushed = repo.push_tags("origin").unwrap();
        assert_eq!(pushed, vec!["v1".to_string(), "v2".to_string()]);
        assert_eq!(repo.state().pushes[0].0, "origin");
    }
}
