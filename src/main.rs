use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use packager::archive::ZipCommand;
use packager::changelog::StdinSource;
use packager::cli::{run_release_workflow, Args, ReleaseContext};
use packager::config;
use packager::domain::SystemClock;
use packager::git::{Git2Repository, Repository};
use packager::ui;

/// Exit status for any failed run (255 on Unix).
const FAILURE_EXIT_CODE: i32 = -1;

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn run(args: Args) -> Result<()> {
    let repo = Git2Repository::open(&args.repo)
        .with_context(|| format!("Not in a git repository: {}", args.repo.display()))?;
    let root = repo.workdir()?;

    let config = config::load_config(args.config.as_deref(), &root)?;
    let archiver = ZipCommand::new(config.archive.zip_program.clone());

    let ctx = ReleaseContext {
        repo: &repo,
        archiver: &archiver,
        changelog_source: StdinSource,
        clock: SystemClock,
        config: &config,
    };

    match run_release_workflow(ctx) {
        Ok(release) => {
            ui::display_release_summary(&release);
            Ok(())
        }
        Err(failure) => {
            if !failure.error.is_safe_to_rerun() {
                ui::display_inspect_hint();
            }
            Err(failure.into())
        }
    }
}

fn main() {
    let args = Args::parse();
    init_logging(args.verbose);

    if let Err(e) = run(args) {
        ui::display_error(&format!("{:#}", e));
        std::process::exit(FAILURE_EXIT_CODE);
    }
}
