//! Domain logic - pure release rules independent of git, the filesystem and the zip tool

pub mod changelog;
pub mod commit;
pub mod tag;
pub mod version;

pub use changelog::{ChangelogEntry, ChangelogOrder};
pub use commit::CommitMessage;
pub use tag::TagPattern;
pub use version::{Clock, FixedClock, SystemClock, Version, VersionGenerator};
