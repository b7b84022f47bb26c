use crate::error::{PackagerError, Result};
use git2::{
    Cred, CredentialType, ErrorCode, IndexAddOption, Oid, PushOptions, RemoteCallbacks,
    Repository as Git2Repo, StatusOptions,
};
use std::fs;
use std::path::{Path, PathBuf};

/// Credential attempts before giving up; libgit2 keeps asking while a credential is rejected.
const MAX_CREDENTIAL_ATTEMPTS: u32 = 5;

/// Wrapper around git2::Repository with our trait interface
pub struct Git2Repository {
    repo: Git2Repo,
}

impl Git2Repository {
    /// Open or discover a git repository
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let repo = Git2Repo::discover(path)?;

        Ok(Git2Repository { repo })
    }

    /// Create from existing git2::Repository
    pub fn from_git2(repo: Git2Repo) -> Self {
        Git2Repository { repo }
    }

    fn head_commit(&self) -> std::result::Result<Option<git2::Commit<'_>>, git2::Error> {
        match self.repo.head() {
            Ok(head) => Ok(Some(head.peel_to_commit()?)),
            Err(e) if e.code() == ErrorCode::UnbornBranch || e.code() == ErrorCode::NotFound => {
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    /// Callbacks resolving credentials the way the git CLI would.
    ///
    /// Tries SSH keys from ~/.ssh/, then the SSH agent, then the configured
    /// credential helper for plaintext auth, then default credentials.
    fn remote_callbacks(&self) -> RemoteCallbacks<'_> {
        let git_config = self.repo.config().ok();
        let mut attempts = 0;

        let mut callbacks = RemoteCallbacks::new();
        callbacks.credentials(move |url, username_from_url, allowed_types| {
            attempts += 1;
            if attempts > MAX_CREDENTIAL_ATTEMPTS {
                return Err(git2::Error::from_str("no usable credentials for remote"));
            }

            let username = username_from_url.unwrap_or("git");

            if allowed_types.contains(CredentialType::SSH_KEY) {
                if let Some(home) = dirs::home_dir() {
                    for key in ["id_ed25519", "id_rsa", "id_ecdsa"] {
                        let path = home.join(".ssh").join(key);
                        if path.exists() {
                            if let Ok(cred) = Cred::ssh_key(username, None, &path, None) {
                                return Ok(cred);
                            }
                        }
                    }
                }

                if let Ok(cred) = Cred::ssh_key_from_agent(username) {
                    return Ok(cred);
                }
            }

            if allowed_types.contains(CredentialType::USER_PASS_PLAINTEXT) {
                if let Some(config) = git_config.as_ref() {
                    if let Ok(cred) = Cred::credential_helper(config, url, username_from_url) {
                        return Ok(cred);
                    }
                }
            }

            Cred::default()
        });

        callbacks.push_update_reference(|refname, status| match status {
            Some(status) => {
                tracing::warn!(refname, status, "remote rejected reference");
                Err(git2::Error::from_str(&format!(
                    "remote rejected {}: {}",
                    refname, status
                )))
            }
            None => Ok(()),
        });

        callbacks
    }
}

impl super::Repository for Git2Repository {
    fn workdir(&self) -> Result<PathBuf> {
        self.repo
            .workdir()
            .map(Path::to_path_buf)
            .ok_or_else(|| PackagerError::config("Repository has no working directory (bare)"))
    }

    fn dirty_paths(&self) -> Result<Vec<String>> {
        let mut opts = StatusOptions::new();
        opts.include_untracked(true)
            .recurse_untracked_dirs(true)
            .include_ignored(false);

        let statuses = self.repo.statuses(Some(&mut opts))?;

        Ok(statuses
            .iter()
            .map(|entry| String::from_utf8_lossy(entry.path_bytes()).into_owned())
            .collect())
    }

    fn stage_all(&self) -> Result<()> {
        let mut index = self
            .repo
            .index()
            .map_err(|e| PackagerError::commit(format!("Cannot open index: {}", e)))?;

        index
            .add_all(["*"].iter(), IndexAddOption::DEFAULT, None)
            .and_then(|_| index.update_all(["*"].iter(), None))
            .and_then(|_| index.write())
            .map_err(|e| PackagerError::commit(format!("Cannot stage changes: {}", e)))?;

        Ok(())
    }

    fn commit_from_file(&self, message_file: &Path) -> Result<Oid> {
        let raw = fs::read_to_string(message_file).map_err(|e| {
            PackagerError::commit(format!(
                "Cannot read message file {}: {}",
                message_file.display(),
                e
            ))
        })?;

        // `git commit -F` only cleans whitespace; comment lines are kept
        let message = git2::message_prettify(raw, None)
            .map_err(|e| PackagerError::commit(format!("Invalid commit message: {}", e)))?;
        if message.trim().is_empty() {
            return Err(PackagerError::commit("Aborting commit due to empty commit message"));
        }

        let commit = || -> std::result::Result<Oid, git2::Error> {
            let signature = self.repo.signature()?;
            let tree_id = self.repo.index()?.write_tree()?;
            let tree = self.repo.find_tree(tree_id)?;
            let parent = self.head_commit()?;
            let parents: Vec<&git2::Commit<'_>> = parent.iter().collect();

            self.repo.commit(
                Some("HEAD"),
                &signature,
                &signature,
                &message,
                &tree,
                &parents,
            )
        };

        commit().map_err(|e| PackagerError::commit(e.message().to_string()))
    }

    fn create_tag(&self, name: &str, message: Option<&str>) -> Result<()> {
        let head = self
            .head_commit()
            .map_err(|e| PackagerError::tag(format!("Cannot resolve HEAD: {}", e)))?
            .ok_or_else(|| PackagerError::tag("HEAD has no commit to tag"))?;

        let result = match message {
            Some(message) => self
                .repo
                .signature()
                .and_then(|sig| self.repo.tag(name, head.as_object(), &sig, message, false)),
            None => self.repo.tag_lightweight(name, head.as_object(), false),
        };

        result.map_err(|e| PackagerError::tag(format!("Cannot create tag '{}': {}", name, e)))?;

        Ok(())
    }

    fn list_tags(&self) -> Result<Vec<String>> {
        let tags = self.repo.tag_names(None)?;

        let mut names: Vec<String> = tags.iter().flatten().map(|s| s.to_string()).collect();
        names.sort();
        Ok(names)
    }

    fn push_tags(&self, remote: &str) -> Result<Vec<String>> {
        let tags = self.list_tags()?;
        if tags.is_empty() {
            return Ok(tags);
        }

        let mut remote_handle = self
            .repo
            .find_remote(remote)
            .map_err(|e| PackagerError::push(format!("Cannot find remote '{}': {}", remote, e)))?;

        let refspecs: Vec<String> = tags
            .iter()
            .map(|tag| format!("refs/tags/{}:refs/tags/{}", tag, tag))
            .collect();

        let refspec_strs: Vec<&str> = refspecs.iter().map(|s| s.as_str()).collect();

        let mut push_options = PushOptions::new();
        push_options.remote_callbacks(self.remote_callbacks());

        match remote_handle.push(&refspec_strs, Some(&mut push_options)) {
            Ok(()) => Ok(tags),
            Err(e) if e.class() == git2::ErrorClass::Net => Err(PackagerError::push(format!(
                "Network error pushing to '{}': {}",
                remote, e
            ))),
            Err(e) => Err(PackagerError::push(format!(
                "Cannot push tags to '{}': {}",
                remote, e
            ))),
        }
    }

    fn head_message(&self) -> Result<Option<String>> {
        Ok(self
            .head_commit()?
            .map(|commit| commit.message().unwrap_or_default().to_string()))
    }
}
