//! User interface module - interaction (prompts) and formatting.
//!
//! Separates concerns:
//! - `formatter` - Pure formatting functions
//! - This module - Interactive prompts and user input handling

use std::io::{self, Read, Write};

use console::style;

use crate::error::{PackagerError, Result};

pub mod formatter;

// Re-export formatter functions for convenience
pub use formatter::{
    display_changelog_message, display_error, display_inspect_hint, display_release_summary,
    display_status, display_success, display_warning,
};

/// Prompts the operator for release notes on standard input.
///
/// Reads until end-of-input (Ctrl-D, or Ctrl-Z then Enter on Windows), so the
/// message can span several lines.
///
/// # Returns
/// * `Ok(String)` - Everything typed, untrimmed
/// * `Err` - If standard input cannot be read
pub fn prompt_changelog_message(version: &str) -> Result<String> {
    println!(
        "\n{} Enter changelog for v{} (finish with {}):",
        style("?").cyan().bold(),
        version,
        if cfg!(windows) { "Ctrl-Z, Enter" } else { "Ctrl-D" }
    );
    io::stdout().flush()?;

    read_message(io::stdin().lock())
}

/// Reads a whole message from `reader` until end-of-input.
pub fn read_message<R: Read>(mut reader: R) -> Result<String> {
    let mut input = String::new();
    reader
        .read_to_string(&mut input)
        .map_err(|e| PackagerError::prompt(format!("cannot read changelog message: {}", e)))?;
    Ok(input)
}
