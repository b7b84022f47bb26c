pub mod archive;
pub mod changelog;
pub mod cli;
pub mod config;
pub mod domain;
pub mod error;
pub mod git;
pub mod guard;
pub mod ui;
pub mod version_writer;
pub mod warnings;

pub use error::{PackagerError, PipelineFailure, Result};
