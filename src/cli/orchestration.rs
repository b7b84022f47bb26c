//! Main release workflow orchestration logic
//!
//! The release is a fixed, forward-only sequence of stages. Each stage must
//! succeed before the next one runs; the first failure stops the run and is
//! reported as a [`PipelineFailure`] naming the stage.
//!
//! ```text
//! Start → GuardChecked → VersionGenerated → ChangelogCollected → FilesVersioned
//!       → Archived → Committed → Tagged → Pushed → Done
//! ```

use std::fmt;
use std::io::Write;
use std::path::{Path, PathBuf};

use git2::Oid;

use crate::archive::{archive_release, Archiver};
use crate::changelog::{collect_message, record_entry, ChangelogSource};
use crate::config::Config;
use crate::domain::{ChangelogEntry, Clock, CommitMessage, TagPattern, Version, VersionGenerator};
use crate::error::{PackagerError, PipelineFailure, Result};
use crate::git::Repository;
use crate::guard;
use crate::ui;
use crate::version_writer::write_version_markers;
use crate::warnings::ReleaseWarning;

/// A step of the release workflow
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Stage {
    Guard,
    Version,
    Changelog,
    VersionMarkers,
    Archive,
    Commit,
    Tag,
    Push,
}

impl Stage {
    /// All stages in execution order
    pub const ALL: [Stage; 8] = [
        Stage::Guard,
        Stage::Version,
        Stage::Changelog,
        Stage::VersionMarkers,
        Stage::Archive,
        Stage::Commit,
        Stage::Tag,
        Stage::Push,
    ];

    /// The workflow state reached once this stage succeeds
    pub fn completes(self) -> ReleaseState {
        match self {
            Stage::Guard => ReleaseState::GuardChecked,
            Stage::Version => ReleaseState::VersionGenerated,
            Stage::Changelog => ReleaseState::ChangelogCollected,
            Stage::VersionMarkers => ReleaseState::FilesVersioned,
            Stage::Archive => ReleaseState::Archived,
            Stage::Commit => ReleaseState::Committed,
            Stage::Tag => ReleaseState::Tagged,
            Stage::Push => ReleaseState::Pushed,
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Guard => "repo guard",
            Stage::Version => "version generation",
            Stage::Changelog => "changelog",
            Stage::VersionMarkers => "version writer",
            Stage::Archive => "archive",
            Stage::Commit => "commit",
            Stage::Tag => "tag",
            Stage::Push => "push",
        };
        write!(f, "{}", name)
    }
}

/// Where a run currently is
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ReleaseState {
    Start,
    GuardChecked,
    VersionGenerated,
    ChangelogCollected,
    FilesVersioned,
    Archived,
    Committed,
    Tagged,
    Pushed,
    Done,
}

/// Collaborators and settings for one release run
///
/// Everything the workflow reads from the outside world comes through here;
/// it never consults the process working directory or environment itself.
pub struct ReleaseContext<'a, R, A, S, C> {
    pub repo: &'a R,
    pub archiver: &'a A,
    pub changelog_source: S,
    pub clock: C,
    pub config: &'a Config,
}

/// Result of a successful release
#[derive(Debug, Clone, PartialEq)]
pub struct Release {
    pub repo_name: String,
    pub version: Version,
    pub tag: String,
    pub commit: Oid,
    pub changelog_message: String,
    /// Versioned archive first, then the fixed-name copy
    pub archives: Vec<PathBuf>,
    pub remote: String,
    pub pushed_tags: Vec<String>,
    pub warnings: Vec<ReleaseWarning>,
}

/// Name used in the versioned archive: the config override, else the working directory's name
pub fn repo_name(config: &Config, root: &Path) -> Result<String> {
    if let Some(name) = config.repo_name.as_ref().filter(|n| !n.trim().is_empty()) {
        return Ok(name.trim().to_string());
    }

    root.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .ok_or_else(|| {
            PackagerError::config(format!(
                "Cannot derive a repository name from {}; set repo_name",
                root.display()
            ))
        })
}

/// Commit the index with `message`, passed to the repository through a temporary file.
///
/// The file is removed whether or not the commit succeeds.
pub fn commit_with_message_file<R: Repository>(repo: &R, message: &CommitMessage) -> Result<Oid> {
    let mut file = tempfile::Builder::new()
        .prefix("packager-commit-")
        .suffix(".txt")
        .tempfile()
        .map_err(|e| PackagerError::commit(format!("Cannot create message file: {}", e)))?;

    let written = file
        .write_all(message.render().as_bytes())
        .and_then(|_| file.flush());

    let committed = match written {
        Ok(()) => repo.commit_from_file(file.path()),
        Err(e) => Err(PackagerError::commit(format!("Cannot write message file: {}", e))),
    };

    let removed = file.close();
    let oid = committed?;
    removed.map_err(|e| PackagerError::commit(format!("Cannot remove message file: {}", e)))?;
    Ok(oid)
}

struct Run {
    state: ReleaseState,
}

impl Run {
    fn step<T>(&mut self, stage: Stage, result: Result<T>) -> std::result::Result<T, PipelineFailure> {
        match result {
            Ok(value) => {
                let next = stage.completes();
                tracing::debug!(from = ?self.state, to = ?next, "stage complete");
                self.state = next;
                Ok(value)
            }
            Err(error) => {
                tracing::error!(%stage, %error, "stage failed");
                Err(PipelineFailure::new(stage, error))
            }
        }
    }
}

fn report(warnings: &[ReleaseWarning]) {
    for warning in warnings {
        ui::display_warning(warning);
    }
}

/// Main release workflow
///
/// Runs every stage in order:
/// 1. Check the working tree is clean
/// 2. Generate the version
/// 3. Collect release notes and record them in the changelog
/// 4. Rewrite version markers
/// 5. Write the versioned and fixed-name archives
/// 6. Stage everything and commit
/// 7. Tag HEAD
/// 8. Push all tags
///
/// # Returns
///
/// The release details, or the stage that failed with its error. Nothing is
/// rolled back on failure.
pub fn run_release_workflow<R, A, S, C>(
    ctx: ReleaseContext<'_, R, A, S, C>,
) -> std::result::Result<Release, PipelineFailure>
where
    R: Repository,
    A: Archiver,
    S: ChangelogSource,
    C: Clock,
{
    let ReleaseContext {
        repo,
        archiver,
        mut changelog_source,
        clock,
        config,
    } = ctx;

    let mut run = Run {
        state: ReleaseState::Start,
    };
    let mut warnings = Vec::new();

    ui::display_status("Checking working tree...");
    let root = run.step(
        Stage::Guard,
        guard::ensure_clean(repo).and_then(|_| repo.workdir()),
    )?;

    // the archive name is `<name>_v<version>`, so both are fixed together
    let (version, name) = run.step(
        Stage::Version,
        repo_name(config, &root).map(|name| (VersionGenerator::new(clock).next_version(), name)),
    )?;
    tracing::info!(%version, repo = %name, "releasing");
    ui::display_status(&format!("Releasing {} v{}", name, version));

    let message = run.step(
        Stage::Changelog,
        collect_message(&mut changelog_source, &version).and_then(|message| {
            ui::display_changelog_message(&message);
            let entry = ChangelogEntry::new(version, message.clone());
            let created = record_entry(config, &root, &entry)?;
            Ok((message, created))
        }),
    )
    .map(|(message, created)| {
        warnings.extend(created);
        message
    })?;

    let written = run.step(
        Stage::VersionMarkers,
        write_version_markers(config, &root, &version),
    )?;
    for path in &written.written {
        ui::display_success(&format!("Updated version in {}", path.display()));
    }
    warnings.extend(written.warnings);

    ui::display_status("Creating archives...");
    let archived = run.step(
        Stage::Archive,
        archive_release(archiver, config, &root, &name, &version),
    )?;
    for archive in &archived.archives {
        ui::display_success(&format!("Wrote {}", archive.display()));
    }
    warnings.extend(archived.warnings);

    let commit_message = CommitMessage::new(config.commit.emblem.clone(), version, message.clone());
    let commit = run.step(
        Stage::Commit,
        repo.stage_all()
            .and_then(|_| commit_with_message_file(repo, &commit_message)),
    )?;
    ui::display_success(&format!("Committed {}", commit_message.subject()));

    let tag = TagPattern::new(config.tag.pattern.clone()).format(&version);
    let annotation = config.tag.annotated.then(|| commit_message.render());
    run.step(Stage::Tag, repo.create_tag(&tag, annotation.as_deref()))?;
    ui::display_success(&format!("Created tag: {}", tag));

    ui::display_status(&format!("Pushing tags to {}...", config.remote));
    let pushed_tags = run.step(Stage::Push, repo.push_tags(&config.remote))?;
    ui::display_success(&format!("Pushed tags to {}", config.remote));

    report(&warnings);
    run.state = ReleaseState::Done;
    tracing::info!(%version, %tag, "release done");

    Ok(Release {
        repo_name: name,
        version,
        tag,
        commit,
        changelog_message: message,
        archives: archived.archives,
        remote: config.remote.clone(),
        pushed_tags,
        warnings,
    })
}
