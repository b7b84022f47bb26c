use crate::domain::version::Version;

/// Release commit message: an emblem line, a blank line, then the changelog text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitMessage {
    pub emblem: String,
    pub version: Version,
    pub body: String,
}

impl CommitMessage {
    /// Create a new commit message
    pub fn new(emblem: impl Into<String>, version: Version, body: impl Into<String>) -> Self {
        CommitMessage {
            emblem: emblem.into(),
            version,
            body: body.into(),
        }
    }

    /// The first line, e.g. `:bookmark: v20240115120000`
    pub fn subject(&self) -> String {
        if self.emblem.is_empty() {
            format!("v{}", self.version)
        } else {
            format!("{} v{}", self.emblem, self.version)
        }
    }

    /// Full message text as written to the message file
    pub fn render(&self) -> String {
        format!("{}\n\n{}", self.subject(), self.body)
    }
}
