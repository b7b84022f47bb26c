//! Collects release notes from the operator and records them in the changelog document.

use std::fs;
use std::io;
use std::path::Path;

use crate::config::Config;
use crate::domain::changelog::{insert_entry, ChangelogEntry};
use crate::domain::Version;
use crate::error::{PackagerError, Result};
use crate::ui;
use crate::version_writer::write_atomic;
use crate::warnings::ReleaseWarning;

/// Where release notes come from.
pub trait ChangelogSource {
    /// Returns the raw, untrimmed notes for `version`
    fn read_message(&mut self, version: &Version) -> Result<String>;
}

/// Interactive source: prompts on stdout, reads stdin to end-of-input.
#[derive(Debug, Default)]
pub struct StdinSource;

impl ChangelogSource for StdinSource {
    fn read_message(&mut self, version: &Version) -> Result<String> {
        ui::prompt_changelog_message(&version.to_string())
    }
}

/// Fixed notes, for non-interactive runs and tests.
#[derive(Debug, Clone)]
pub struct ScriptedSource(pub String);

impl ScriptedSource {
    pub fn new(message: impl Into<String>) -> Self {
        ScriptedSource(message.into())
    }
}

impl ChangelogSource for ScriptedSource {
    fn read_message(&mut self, _version: &Version) -> Result<String> {
        Ok(self.0.clone())
    }
}

/// Reads notes from `source`, failing with [`PackagerError::EmptyChangelog`]
/// if nothing but whitespace was entered.
///
/// Returns the notes with surrounding whitespace removed.
pub fn collect_message<S: ChangelogSource>(source: &mut S, version: &Version) -> Result<String> {
    let raw = source.read_message(version)?;
    let message = raw.trim();
    if message.is_empty() {
        return Err(PackagerError::EmptyChangelog);
    }
    Ok(message.to_string())
}

/// Adds `entry` to the changelog document named in `config`.
///
/// The document is created if absent; prior content is kept verbatim.
///
/// # Returns
/// * `Ok(Some(warning))` - The document did not exist and was created
/// * `Ok(None)` - The entry was added to an existing document
/// * `Err` - If the document cannot be read or written
pub fn record_entry(
    config: &Config,
    root: &Path,
    entry: &ChangelogEntry,
) -> Result<Option<ReleaseWarning>> {
    let path = config.resolve(root, &config.changelog.path);

    let (existing, created) = match fs::read_to_string(&path) {
        Ok(content) => (content, false),
        Err(e) if e.kind() == io::ErrorKind::NotFound => (String::new(), true),
        Err(e) => return Err(with_path(&path, e).into()),
    };

    let rendered = entry.render(&config.changelog.heading);
    let updated = insert_entry(
        &existing,
        &rendered,
        &config.changelog.heading,
        config.changelog.order,
    );

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| with_path(&path, e))?;
    }
    write_atomic(&path, updated.as_bytes()).map_err(|e| with_path(&path, e))?;
    tracing::debug!(path = %path.display(), version = %entry.version, "recorded changelog entry");

    Ok(created.then_some(ReleaseWarning::ChangelogCreated { path }))
}

fn with_path(path: &Path, e: io::Error) -> io::Error {
    io::Error::new(e.kind(), format!("{}: {}", path.display(), e))
}
