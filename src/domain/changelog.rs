use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::domain::version::Version;

/// Where new entries go in the changelog document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ChangelogOrder {
    #[default]
    NewestFirst,
    OldestFirst,
}

/// One release's notes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangelogEntry {
    pub version: Version,
    pub message: String,
}

impl ChangelogEntry {
    pub fn new(version: Version, message: impl Into<String>) -> Self {
        ChangelogEntry {
            version,
            message: message.into(),
        }
    }

    /// Render the entry as a heading line, a blank line, and the message.
    ///
    /// `heading` is a pattern such as `"## v{version}"`.
    pub fn render(&self, heading: &str) -> String {
        format!(
            "{}\n\n{}\n",
            heading.replace("{version}", &self.version.to_string()),
            self.message.trim_end()
        )
    }
}

/// Byte offset of the first line that is an entry heading for `heading`.
///
/// A heading line is the pattern with `{version}` standing for a 14-digit version.
fn first_entry_heading(document: &str, heading: &str) -> Option<usize> {
    let pattern = regex::escape(heading).replace(r"\{version\}", r"\d{14}");
    let re = Regex::new(&format!(r"(?m)^{}[ \t]*\r?$", pattern)).ok()?;
    re.find(document).map(|m| m.start())
}

fn append(document: &str, rendered: &str) -> String {
    let mut out = String::with_capacity(document.len() + rendered.len() + 2);
    out.push_str(document);
    if !document.ends_with('\n') {
        out.push('\n');
    }
    if !document.ends_with("\n\n") {
        out.push('\n');
    }
    out.push_str(rendered);
    out
}

/// Returns `document` with `rendered` added in the given order.
///
/// Newest-first entries go directly above the first existing entry heading
/// matching `heading`, so a title and intro text stay on top. A document with
/// no entries yet gets the entry appended. Existing text is kept byte-for-byte;
/// only separating blank lines are added.
pub fn insert_entry(
    document: &str,
    rendered: &str,
    heading: &str,
    order: ChangelogOrder,
) -> String {
    if document.trim().is_empty() {
        return rendered.to_string();
    }

    match order {
        ChangelogOrder::NewestFirst => match first_entry_heading(document, heading) {
            Some(at) => {
                let (before, entries) = document.split_at(at);
                let mut out = String::with_capacity(document.len() + rendered.len() + 2);
                out.push_str(before);
                if !before.is_empty() && !before.ends_with("\n\n") {
                    out.push('\n');
                }
                out.push_str(rendered);
                out.push('\n');
                out.push_str(entries);
                out
            }
            None => append(document, rendered),
        },
        ChangelogOrder::OldestFirst => append(document, rendered),
    }
}
