use std::path::PathBuf;

/// Command-line arguments. Every flag is optional; a bare `packager` runs the
/// full release in the current directory.
#[derive(clap::Parser, Debug, Clone, PartialEq)]
#[command(
    name = "packager",
    version,
    about = "Version, archive, commit, tag and push a release"
)]
pub struct Args {
    #[arg(
        short = 'C',
        long,
        default_value = ".",
        help = "Repository to release (discovered upwards from this path)"
    )]
    pub repo: PathBuf,

    #[arg(short, long, help = "Custom configuration file path")]
    pub config: Option<PathBuf>,

    #[arg(short, long, help = "Log every step (same as RUST_LOG=debug)")]
    pub verbose: bool,
}
