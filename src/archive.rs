//! Distributable archives.
//!
//! The archive is produced by an external zip program; [`archive_release`]
//! writes it twice, to a versioned path under the dist directory and to a
//! fixed-name path at the repository root.

use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};
use std::process::Command;

use crate::config::Config;
use crate::domain::Version;
use crate::error::{PackagerError, Result};
use crate::warnings::ReleaseWarning;

/// End-of-central-directory record of a zip with no entries.
const EMPTY_ZIP: [u8; 22] = [
    0x50, 0x4b, 0x05, 0x06, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0,
];

/// Produces a zip archive of a directory.
pub trait Archiver {
    /// Archive the full contents of `source_dir` at `destination`, replacing
    /// any existing file. Entry names are relative to `source_dir`.
    fn create_archive(&self, source_dir: &Path, destination: &Path) -> Result<()>;
}

/// Runs an external `zip` program.
#[derive(Debug, Clone)]
pub struct ZipCommand {
    program: String,
}

impl ZipCommand {
    pub fn new(program: impl Into<String>) -> Self {
        ZipCommand {
            program: program.into(),
        }
    }

    /// Whether the program can be started at all
    pub fn is_available(&self) -> bool {
        Command::new(&self.program)
            .arg("-v")
            .output()
            .map(|out| out.status.success())
            .unwrap_or(false)
    }
}

impl Default for ZipCommand {
    fn default() -> Self {
        ZipCommand::new("zip")
    }
}

fn is_empty_dir(dir: &Path) -> io::Result<bool> {
    Ok(fs::read_dir(dir)?.next().is_none())
}

/// Resolves `.` and `..` components without touching the filesystem.
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if matches!(out.components().next_back(), Some(Component::Normal(_))) {
                    out.pop();
                } else {
                    out.push(component);
                }
            }
            other => out.push(other),
        }
    }
    out
}

/// Absolute form of `destination` without requiring the file itself to exist.
fn absolute_destination(destination: &Path) -> Result<PathBuf> {
    let file_name = destination.file_name().ok_or_else(|| {
        PackagerError::archive(format!(
            "Destination {} has no file name",
            destination.display()
        ))
    })?;
    let parent = match destination.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    fs::create_dir_all(parent).map_err(|e| {
        PackagerError::archive(format!("Cannot create {}: {}", parent.display(), e))
    })?;
    let parent = parent.canonicalize().map_err(|e| {
        PackagerError::archive(format!("Cannot resolve {}: {}", parent.display(), e))
    })?;

    Ok(parent.join(file_name))
}

impl Archiver for ZipCommand {
    fn create_archive(&self, source_dir: &Path, destination: &Path) -> Result<()> {
        if !source_dir.is_dir() {
            return Err(PackagerError::archive(format!(
                "Source directory not found: {}",
                source_dir.display()
            )));
        }

        let destination = absolute_destination(destination)?;

        // zip updates an existing archive in place; start from nothing instead
        match fs::remove_file(&destination) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => {
                return Err(PackagerError::archive(format!(
                    "Cannot replace {}: {}",
                    destination.display(),
                    e
                )))
            }
        }

        let empty = is_empty_dir(source_dir).map_err(|e| {
            PackagerError::archive(format!("Cannot read {}: {}", source_dir.display(), e))
        })?;
        if empty {
            // zip refuses to create an archive with nothing in it
            return fs::write(&destination, EMPTY_ZIP).map_err(|e| {
                PackagerError::archive(format!("Cannot write {}: {}", destination.display(), e))
            });
        }

        tracing::debug!(
            program = %self.program,
            source = %source_dir.display(),
            destination = %destination.display(),
            "running zip"
        );

        let output = Command::new(&self.program)
            .args(["-r", "-q", "-X"])
            .arg(&destination)
            .arg(".")
            .current_dir(source_dir)
            .output()
            .map_err(|e| {
                PackagerError::archive(format!("Failed to execute '{}': {}", self.program, e))
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let stdout = String::from_utf8_lossy(&output.stdout);
            return Err(PackagerError::archive(format!(
                "'{}' failed with exit code {}\nStdout: {}\nStderr: {}",
                self.program,
                output.status.code().unwrap_or(-1),
                stdout.trim(),
                stderr.trim()
            )));
        }

        Ok(())
    }
}

/// The two archive paths for a release: `<dist>/<repo>_v<version>.zip` and the fixed name.
pub fn archive_destinations(
    config: &Config,
    root: &Path,
    repo_name: &str,
    version: &Version,
) -> (PathBuf, PathBuf) {
    let dist_dir = config.resolve(root, &config.archive.dist_dir);
    let versioned = dist_dir.join(format!("{}_v{}.zip", repo_name, version));
    let fixed = config.resolve(root, &config.archive.fixed_name);
    (versioned, fixed)
}

/// Archives written by [`archive_release`].
#[derive(Debug, Clone, PartialEq)]
pub struct ArchiveReport {
    pub archives: Vec<PathBuf>,
    pub warnings: Vec<ReleaseWarning>,
}

/// Writes the release archive to both destinations.
///
/// Fails with [`PackagerError::Archive`] if the source directory is missing,
/// contains a destination, or either archive cannot be produced.
pub fn archive_release<A: Archiver>(
    archiver: &A,
    config: &Config,
    root: &Path,
    repo_name: &str,
    version: &Version,
) -> Result<ArchiveReport> {
    let source_dir = config.resolve(root, &config.archive.source_dir);
    let (versioned, fixed) = archive_destinations(config, root, repo_name, version);

    let source = normalize(&source_dir);
    for destination in [&versioned, &fixed] {
        if normalize(destination).starts_with(&source) {
            return Err(PackagerError::archive(format!(
                "Archive destination {} is inside the source directory {}",
                destination.display(),
                source_dir.display()
            )));
        }
    }

    let mut warnings = Vec::new();
    if source_dir.is_dir() && is_empty_dir(&source_dir)? {
        warnings.push(ReleaseWarning::EmptyArchiveSource {
            source_dir: source_dir.clone(),
        });
    }

    if let Some(dist_dir) = versioned.parent() {
        fs::create_dir_all(dist_dir).map_err(|e| {
            PackagerError::archive(format!("Cannot create {}: {}", dist_dir.display(), e))
        })?;
    }

    archiver.create_archive(&source_dir, &versioned)?;
    archiver.create_archive(&source_dir, &fixed)?;

    Ok(ArchiveReport {
        archives: vec![versioned, fixed],
        warnings,
    })
}
