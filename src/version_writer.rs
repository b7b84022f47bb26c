//! Rewrites version markers in the source tree.
//!
//! Two kinds of marker exist: a plain version file whose whole content is the
//! version, and embedded markers located by a regex with one capture group.
//! Every file is replaced atomically; files already written are not rolled back
//! when a later one fails.

use regex::Regex;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use crate::config::Config;
use crate::domain::Version;
use crate::error::{PackagerError, Result};
use crate::warnings::ReleaseWarning;

/// Files touched by [`write_version_markers`].
#[derive(Debug, Default, Clone, PartialEq)]
pub struct VersionWriteReport {
    pub written: Vec<PathBuf>,
    pub warnings: Vec<ReleaseWarning>,
}

/// Replace `path` with `contents` or leave it untouched.
///
/// Writes a temp file in the same directory, syncs it, then renames it over
/// `path`. Existing permissions are carried over.
pub fn write_atomic(path: &Path, contents: &[u8]) -> io::Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut temp = tempfile::NamedTempFile::new_in(dir)?;
    temp.write_all(contents)?;
    temp.as_file().sync_all()?;

    if let Ok(metadata) = fs::metadata(path) {
        temp.as_file().set_permissions(metadata.permissions())?;
    }

    temp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

/// Replace the first capture group of every match of `pattern` with `version`.
///
/// Returns `None` if the pattern does not match.
pub fn replace_marker(content: &str, pattern: &Regex, version: &str) -> Option<String> {
    let mut out = String::with_capacity(content.len());
    let mut last = 0;
    let mut matched = false;

    for caps in pattern.captures_iter(content) {
        if let Some(group) = caps.get(1) {
            out.push_str(&content[last..group.start()]);
            out.push_str(version);
            last = group.end();
            matched = true;
        }
    }

    if !matched {
        return None;
    }
    out.push_str(&content[last..]);
    Some(out)
}

fn write_version_file(path: &Path, version: &str) -> Result<()> {
    // Keep a trailing newline if the file had one; new files get one
    let newline = match fs::read_to_string(path) {
        Ok(existing) => existing.ends_with('\n'),
        Err(e) if e.kind() == io::ErrorKind::NotFound => true,
        Err(e) => return Err(PackagerError::version_write(path, e)),
    };

    let contents = if newline {
        format!("{}\n", version)
    } else {
        version.to_string()
    };

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| PackagerError::version_write(path, e))?;
    }
    write_atomic(path, contents.as_bytes()).map_err(|e| PackagerError::version_write(path, e))
}

/// Rewrite the version file and every embedded marker named in `config`.
///
/// # Arguments
/// * `config` - Marker locations, relative to `root`
/// * `root` - Repository working directory
/// * `version` - The new release version
///
/// # Returns
/// * `Ok(VersionWriteReport)` - Files rewritten and markers that matched nothing
/// * `Err(PackagerError::VersionWrite)` - Naming the first file that could not be read or written
pub fn write_version_markers(
    config: &Config,
    root: &Path,
    version: &Version,
) -> Result<VersionWriteReport> {
    let version = version.to_string();
    let mut report = VersionWriteReport::default();

    if let Some(file) = &config.version.file {
        let path = config.resolve(root, file);
        write_version_file(&path, &version)?;
        tracing::debug!(path = %path.display(), "wrote version file");
        report.written.push(path);
    }

    for marker in &config.version.markers {
        let path = config.resolve(root, &marker.path);
        let pattern = Regex::new(&marker.pattern)
            .map_err(|e| PackagerError::version_write(&path, format!("invalid pattern: {}", e)))?;

        let content =
            fs::read_to_string(&path).map_err(|e| PackagerError::version_write(&path, e))?;

        match replace_marker(&content, &pattern, &version) {
            Some(updated) => {
                if updated != content {
                    write_atomic(&path, updated.as_bytes())
                        .map_err(|e| PackagerError::version_write(&path, e))?;
                }
                tracing::debug!(path = %path.display(), "rewrote embedded version marker");
                report.written.push(path);
            }
            None => {
                tracing::warn!(path = %path.display(), pattern = %marker.pattern, "marker not found");
                report.warnings.push(ReleaseWarning::MarkerNotFound {
                    path,
                    pattern: marker.pattern.clone(),
                });
            }
        }
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MarkerConfig;
    use tempfile::TempDir;

    fn version() -> Version {
        Version::parse("20240115120000").unwrap()
    }

    fn config_with_marker(pattern: &str) -> Config {
        let mut config = Config::default();
        config.version.markers.push(MarkerConfig {
            path: PathBuf::from("src/__init__.py"),
            pattern: pattern.to_string(),
        });
        config
    }

    #[test]
    fn test_replace_marker_every_match() {
        let re = Regex::new(r"addon_template v(\S+)").unwrap();
        let content = "# addon_template v20.5.4i8\nx = 1\n# addon_template v1\n";
        assert_eq!(
            replace_marker(content, &re, "20240115120000").unwrap(),
            "# addon_template v20240115120000\nx = 1\n# addon_template v20240115120000\n"
        );
    }

    #[test]
    fn test_replace_marker_no_match() {
        let re = Regex::new(r#"__version__ = "([^"]*)""#).unwrap();
        assert_eq!(replace_marker("print('hi')\n", &re, "1"), None);
    }

    #[test]
    fn test_write_atomic_replaces_content() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("VERSION");
        fs::write(&path, "old\n").unwrap();
        write_atomic(&path, b"new\n").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "new\n");
        // no temp files left behind
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[cfg(unix)]
    #[test]
    fn test_write_atomic_keeps_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let path = dir.path().join("run.sh");
        fs::write(&path, "#!/bin/sh\n").unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();

        write_atomic(&path, b"#!/bin/sh\necho hi\n").unwrap();
        let mode = fs::metadata(&path).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode, 0o755);
    }

    #[cfg(unix)]
    #[test]
    fn test_failed_write_leaves_original_intact() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let src = dir.path().join("src");
        fs::create_dir_all(&src).unwrap();
        fs::write(src.join("VERSION"), "19990101000000\n").unwrap();
        fs::set_permissions(&src, fs::Permissions::from_mode(0o555)).unwrap();

        // privileged users can still write into a read-only directory
        if fs::write(src.join(".writable"), "").is_ok() {
            let _ = fs::remove_file(src.join(".writable"));
            fs::set_permissions(&src, fs::Permissions::from_mode(0o755)).unwrap();
            eprintln!("skipping: directory permissions not enforced");
            return;
        }

        let result = write_version_markers(&Config::default(), dir.path(), &version());
        fs::set_permissions(&src, fs::Permissions::from_mode(0o755)).unwrap();

        match result {
            Err(PackagerError::VersionWrite { path, .. }) => {
                assert_eq!(path, src.join("VERSION"));
            }
            other => panic!("expected VersionWrite, got {:?}", other),
        }
        assert_eq!(
            fs::read_to_string(src.join("VERSION")).unwrap(),
            "19990101000000\n"
        );
        let names: Vec<String> = fs::read_dir(&src)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["VERSION".to_string()]);
    }

    #[test]
    fn test_version_file_created_and_overwritten() {
        let dir = TempDir::new().unwrap();
        let config = Config::default();

        let report = write_version_markers(&config, dir.path(), &version()).unwrap();
        let path = dir.path().join("src/VERSION");
        assert_eq!(report.written, vec![path.clone()]);
        assert_eq!(fs::read_to_string(&path).unwrap(), "20240115120000\n");

        fs::write(&path, "19990101000000").unwrap();
        write_version_markers(&config, dir.path(), &version()).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "20240115120000");
    }

    #[test]
    fn test_embedded_marker_rewritten() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("src")).unwrap();
        fs::write(
            dir.path().join("src/__init__.py"),
            "# -*- coding: utf-8 -*-\n#\n# addon_template v20.5.4i8\n#\nimport re\n",
        )
        .unwrap();

        let config = config_with_marker(r"addon_template v(\S+)");
        let report = write_version_markers(&config, dir.path(), &version()).unwrap();

        assert_eq!(report.written.len(), 2);
        assert!(report.warnings.is_empty());
        assert_eq!(
            fs::read_to_string(dir.path().join("src/__init__.py")).unwrap(),
            "# -*- coding: utf-8 -*-\n#\n# addon_template v20240115120000\n#\nimport re\n"
        );
    }

    #[test]
    fn test_unmatched_marker_is_warning() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("src")).unwrap();
        fs::write(dir.path().join("src/__init__.py"), "import re\n").unwrap();

        let config = config_with_marker(r#"__version__ = "([^"]*)""#);
        let report = write_version_markers(&config, dir.path(), &version()).unwrap();

        assert_eq!(report.warnings.len(), 1);
        assert!(matches!(
            report.warnings[0],
            ReleaseWarning::MarkerNotFound { .. }
        ));
        assert_eq!(
            fs::read_to_string(dir.path().join("src/__init__.py")).unwrap(),
            "import re\n"
        );
    }

    #[test]
    fn test_missing_marker_file_names_file() {
        let dir = TempDir::new().unwrap();
        let config = config_with_marker(r"v(\d+)");

        let err = write_version_markers(&config, dir.path(), &version()).unwrap_err();
        match err {
            PackagerError::VersionWrite { path, .. } => {
                assert!(path.ends_with("src/__init__.py"));
            }
            other => panic!("expected VersionWrite, got {:?}", other),
        }
        // the version file ahead of it was still written
        assert!(dir.path().join("src/VERSION").exists());
    }
}
