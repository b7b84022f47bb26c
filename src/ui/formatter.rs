//! Pure formatting functions for UI output.
//!
//! This module contains all display/formatting logic separated from user interaction.

use console::style;

use crate::cli::orchestration::Release;
use crate::warnings::ReleaseWarning;

/// Format and print an error message in red.
pub fn display_error(message: &str) {
    eprintln!("{} {}", style("ERROR:").red().bold(), message);
}

/// Format and print a success message with green checkmark.
pub fn display_success(message: &str) {
    println!("{} {}", style("✓").green(), message);
}

/// Format and print a status message with yellow arrow.
pub fn display_status(message: &str) {
    println!("{} {}", style("→").yellow(), message);
}

/// Display a release warning to the user.
pub fn display_warning(warning: &ReleaseWarning) {
    eprintln!("{} {}", style("⚠ WARNING:").yellow(), warning);
}

/// Echo the collected changelog message back, indented.
pub fn display_changelog_message(message: &str) {
    println!("\n{}", style("Changelog:").bold());
    for line in message.lines() {
        println!("  {}", line);
    }
    println!();
}

/// Display the outcome of a successful release.
///
/// Shows the version, the tag, both archive paths, and the pushed tag count.
pub fn display_release_summary(release: &Release) {
    println!("\n{}", style("Release summary:").bold());
    println!("  Version:  {}", style(&release.version).green());
    println!("  Tag:      {}", style(&release.tag).green());
    for archive in &release.archives {
        println!("  Archive:  {}", archive.display());
    }
    println!(
        "  Pushed {} tag(s) to {}",
        release.pushed_tags.len(),
        release.remote
    );
    println!("\n{} Dist + commit done!\n", style("✓").green());
}

/// Hint shown when a run fails after it started mutating files.
pub fn display_inspect_hint() {
    eprintln!(
        "{} The working tree may hold partial changes; inspect it with {} before rerunning.",
        style("→").yellow(),
        style("git status").cyan()
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_error() {
        // Visual verification test - output is printed to stderr
        display_error("test error");
    }

    #[test]
    fn test_display_success() {
        // Visual verification test - output is printed to stdout
        display_success("test success");
    }

    #[test]
    fn test_display_changelog_message_multiline() {
        display_changelog_message("- first\n- second");
    }
}
