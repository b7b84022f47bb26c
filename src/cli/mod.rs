//! Command-line surface: argument parsing and the release workflow it drives

pub mod args;
pub mod orchestration;

pub use args::Args;
pub use orchestration::{run_release_workflow, Release, ReleaseContext, ReleaseState, Stage};
