use crate::domain::version::Version;

/// Tag naming pattern (e.g., "v{version}", "release-{version}")
#[derive(Debug, Clone)]
pub struct TagPattern {
    pub pattern: String,
}

impl TagPattern {
    /// Create a new tag pattern
    pub fn new(pattern: impl Into<String>) -> Self {
        TagPattern {
            pattern: pattern.into(),
        }
    }

    /// Format a version according to pattern
    /// Example: pattern="v{version}", version=20240115120000 -> "v20240115120000"
    pub fn format(&self, version: &Version) -> String {
        self.pattern.replace("{version}", &version.to_string())
    }
}

impl Default for TagPattern {
    fn default() -> Self {
        TagPattern::new("v{version}")
    }
}
