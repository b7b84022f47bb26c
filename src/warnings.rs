use std::fmt;
use std::path::PathBuf;

/// Non-fatal conditions noticed during a release.
/// These are reported to the operator but never abort the run.
#[derive(Debug, Clone, PartialEq)]
pub enum ReleaseWarning {
    /// A version marker pattern matched nothing in its file
    MarkerNotFound { path: PathBuf, pattern: String },
    /// The changelog document did not exist and was created
    ChangelogCreated { path: PathBuf },
    /// The archive source directory has no files
    EmptyArchiveSource { source_dir: PathBuf },
}

impl fmt::Display for ReleaseWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReleaseWarning::MarkerNotFound { path, pattern } => {
                write!(
                    f,
                    "Version marker '{}' not found in {}; file left unchanged",
                    pattern,
                    path.display()
                )
            }
            ReleaseWarning::ChangelogCreated { path } => {
                write!(f, "Changelog {} did not exist and was created", path.display())
            }
            ReleaseWarning::EmptyArchiveSource { source_dir } => {
                write!(
                    f,
                    "Archive source {} is empty; archives will have no entries",
                    source_dir.display()
                )
            }
        }
    }
}
