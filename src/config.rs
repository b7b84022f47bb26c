use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::domain::changelog::ChangelogOrder;
use crate::error::{PackagerError, Result};

/// File name looked up in the repository root.
pub const REPO_CONFIG_FILE: &str = "packager.toml";

/// File name looked up in the user config directory.
pub const USER_CONFIG_FILE: &str = ".packager.toml";

/// Represents the complete configuration for packager.
///
/// Every path is relative to the repository working directory; use
/// [`Config::resolve`] to turn one into an absolute path.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct Config {
    /// Overrides the repository name used in the versioned archive file name.
    #[serde(default)]
    pub repo_name: Option<String>,

    #[serde(default = "default_remote")]
    pub remote: String,

    #[serde(default)]
    pub changelog: ChangelogConfig,

    #[serde(default)]
    pub version: VersionConfig,

    #[serde(default)]
    pub archive: ArchiveConfig,

    #[serde(default)]
    pub tag: TagConfig,

    #[serde(default)]
    pub commit: CommitConfig,
}

fn default_remote() -> String {
    "origin".to_string()
}

fn default_changelog_path() -> PathBuf {
    PathBuf::from("CHANGELOG.md")
}

fn default_changelog_heading() -> String {
    "## v{version}".to_string()
}

/// Where the changelog lives and how entries are laid out.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct ChangelogConfig {
    #[serde(default = "default_changelog_path")]
    pub path: PathBuf,

    #[serde(default)]
    pub order: ChangelogOrder,

    /// Entry heading; `{version}` is replaced with the release version.
    #[serde(default = "default_changelog_heading")]
    pub heading: String,
}

impl Default for ChangelogConfig {
    fn default() -> Self {
        ChangelogConfig {
            path: default_changelog_path(),
            order: ChangelogOrder::default(),
            heading: default_changelog_heading(),
        }
    }
}

fn default_version_file() -> Option<PathBuf> {
    Some(PathBuf::from("src/VERSION"))
}

/// Version marker locations.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct VersionConfig {
    /// Plain file whose whole content is the version.
    #[serde(default = "default_version_file")]
    pub file: Option<PathBuf>,

    /// Embedded markers inside source files.
    #[serde(default)]
    pub markers: Vec<MarkerConfig>,
}

impl Default for VersionConfig {
    fn default() -> Self {
        VersionConfig {
            file: default_version_file(),
            markers: Vec::new(),
        }
    }
}

/// An embedded version marker.
///
/// `pattern` is a regular expression with exactly one capture group; the text
/// matched by that group is replaced with the new version on every match.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct MarkerConfig {
    pub path: PathBuf,
    pub pattern: String,
}

fn default_source_dir() -> PathBuf {
    PathBuf::from("src")
}

fn default_dist_dir() -> PathBuf {
    PathBuf::from("dist")
}

fn default_fixed_name() -> PathBuf {
    PathBuf::from("dist.zip")
}

fn default_zip_program() -> String {
    "zip".to_string()
}

/// Distributable archive settings.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct ArchiveConfig {
    #[serde(default = "default_source_dir")]
    pub source_dir: PathBuf,

    #[serde(default = "default_dist_dir")]
    pub dist_dir: PathBuf,

    #[serde(default = "default_fixed_name")]
    pub fixed_name: PathBuf,

    #[serde(default = "default_zip_program")]
    pub zip_program: String,
}

impl Default for ArchiveConfig {
    fn default() -> Self {
        ArchiveConfig {
            source_dir: default_source_dir(),
            dist_dir: default_dist_dir(),
            fixed_name: default_fixed_name(),
            zip_program: default_zip_program(),
        }
    }
}

fn default_tag_pattern() -> String {
    "v{version}".to_string()
}

/// Release tag settings.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct TagConfig {
    #[serde(default = "default_tag_pattern")]
    pub pattern: String,

    #[serde(default)]
    pub annotated: bool,
}

impl Default for TagConfig {
    fn default() -> Self {
        TagConfig {
            pattern: default_tag_pattern(),
            annotated: false,
        }
    }
}

fn default_emblem() -> String {
    ":bookmark:".to_string()
}

/// Release commit settings.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct CommitConfig {
    #[serde(default = "default_emblem")]
    pub emblem: String,
}

impl Default for CommitConfig {
    fn default() -> Self {
        CommitConfig {
            emblem: default_emblem(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            repo_name: None,
            remote: default_remote(),
            changelog: ChangelogConfig::default(),
            version: VersionConfig::default(),
            archive: ArchiveConfig::default(),
            tag: TagConfig::default(),
            commit: CommitConfig::default(),
        }
    }
}

impl Config {
    /// Resolves a configured path against the repository working directory.
    pub fn resolve(&self, repo_root: &Path, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            repo_root.join(path)
        }
    }

    /// Checks settings that serde cannot express.
    pub fn validate(&self) -> Result<()> {
        if !self.tag.pattern.contains("{version}") {
            return Err(PackagerError::config(format!(
                "tag.pattern '{}' must contain a {{version}} placeholder",
                self.tag.pattern
            )));
        }
        if self.remote.trim().is_empty() {
            return Err(PackagerError::config("remote must not be empty"));
        }
        for marker in &self.version.markers {
            let re = regex::Regex::new(&marker.pattern).map_err(|e| {
                PackagerError::config(format!(
                    "invalid marker pattern for {}: {}",
                    marker.path.display(),
                    e
                ))
            })?;
            // captures_len counts the implicit whole-match group
            if re.captures_len() != 2 {
                return Err(PackagerError::config(format!(
                    "marker pattern '{}' for {} must have exactly one capture group",
                    marker.pattern,
                    marker.path.display()
                )));
            }
        }
        Ok(())
    }
}

/// Loads configuration from file or returns defaults.
///
/// Attempts to load configuration in the following order:
/// 1. Custom path provided as parameter
/// 2. `packager.toml` in the repository root
/// 3. `.packager.toml` in the user config directory
/// 4. Default configuration if no file found
///
/// # Arguments
/// * `config_path` - Optional path to custom configuration file
/// * `repo_root` - Repository working directory
///
/// # Returns
/// * `Ok(Config)` - Loaded and validated configuration
/// * `Err` - If a file exists but cannot be read, parsed, or validated
pub fn load_config(config_path: Option<&Path>, repo_root: &Path) -> Result<Config> {
    let candidate = match config_path {
        Some(path) => Some(path.to_path_buf()),
        None => {
            let repo_config = repo_root.join(REPO_CONFIG_FILE);
            if repo_config.exists() {
                Some(repo_config)
            } else {
                dirs::config_dir()
                    .map(|dir| dir.join(USER_CONFIG_FILE))
                    .filter(|path| path.exists())
            }
        }
    };

    let config = match candidate {
        Some(path) => {
            tracing::debug!(path = %path.display(), "loading config");
            let config_str = fs::read_to_string(&path).map_err(|e| {
                PackagerError::config(format!("cannot read {}: {}", path.display(), e))
            })?;
            toml::from_str(&config_str).map_err(|e| {
                PackagerError::config(format!("cannot parse {}: {}", path.display(), e))
            })?
        }
        None => {
            tracing::debug!("no config file found, using defaults");
            Config::default()
        }
    };

    config.validate()?;
    Ok(config)
}
