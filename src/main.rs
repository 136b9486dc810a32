/// snag: block unwanted content at every git hook.
///
/// One pattern policy, resolved from `snag.toml` files (or a legacy
/// `.blocklist`) up the directory tree plus a few environment overrides,
/// is enforced at pre-commit, commit-msg, pre-push and pre-rebase time.
/// `snag audit` runs the same patterns over history that already exists.
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::io::IsTerminal;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use snag::builders::reporter::{ConsoleReporter, Reporter};
use snag::core::engine::DEFAULT_AUDIT_LIMIT;
use snag::utils::{self, ExportFormat, HookTest, Invocation, Status};

const ENV_LOG: &str = "SNAG_LOG";
const ENV_QUIET: &str = "SNAG_QUIET";

#[derive(Parser)]
#[command(name = "snag")]
#[command(about = "Block unwanted patterns in diffs, commit messages, pushes and rebases")]
#[command(version)]
struct Cli {
    /// Use this file as the only pattern source instead of walking for config
    #[arg(long, global = true, value_name = "PATH")]
    blocklist: Option<PathBuf>,

    /// Only print errors
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Debug logging on stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a single hook check
    Check {
        #[command(subcommand)]
        check: CheckCommand,
    },
    /// Scan commit history for diff and msg violations
    Audit {
        /// Revision or range to scan, e.g. main..HEAD
        range: Option<String>,
        /// Number of recent commits to scan when no range is given (0 = all)
        #[arg(long, default_value_t = DEFAULT_AUDIT_LIMIT)]
        limit: usize,
    },
    /// Show where the effective policy comes from
    Config {
        /// Export the resolved policy instead of listing sources
        #[arg(long, value_enum)]
        format: Option<ExportFormat>,
    },
    /// Write a starter snag.toml in the current directory
    Init {
        /// Overwrite an existing snag.toml
        #[arg(long)]
        force: bool,
    },
    /// Install snag scripts into .git/hooks
    Install,
    /// prepare-commit-msg helper: prefix the message with the branch ticket
    Prepare {
        file: PathBuf,
        source: Option<String>,
        sha: Option<String>,
    },
    /// Dry-run the hooks against a temporary repository
    Test {
        /// Run only this hook's check
        #[arg(value_enum)]
        hook: Option<HookTest>,
    },
    /// Print the snag version
    Version,
}

#[derive(Subcommand)]
enum CheckCommand {
    /// Check staged changes (pre-commit)
    Diff,
    /// Check a commit message file (commit-msg)
    Msg { file: PathBuf },
    /// Check unpushed commits (pre-push)
    Push,
    /// Refuse to rebase protected branches (pre-rebase)
    Rebase {
        upstream: Option<String>,
        branch: Option<String>,
    },
    /// Warn when the repo has a policy but no snag hooks (post-checkout)
    Checkout,
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_env(ENV_LOG).unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .without_time(),
        )
        .init();
}

fn run(cli: Cli, quiet: bool) -> Result<Status> {
    let cwd = std::env::current_dir().context("reading current directory")?;
    let inv = Invocation::new(cwd, cli.blocklist, quiet);

    match cli.command {
        Commands::Check { check } => match check {
            CheckCommand::Diff => utils::check_diff(&inv),
            CheckCommand::Msg { file } => utils::check_msg(&inv, &file),
            CheckCommand::Push => utils::check_push(&inv),
            CheckCommand::Rebase { upstream, branch } => {
                tracing::debug!(?upstream, ?branch, "pre-rebase");
                utils::check_rebase(&inv, branch.as_deref())
            }
            CheckCommand::Checkout => utils::check_checkout(&inv),
        },
        Commands::Audit { range, limit } => utils::audit(&inv, range, limit),
        Commands::Config { format } => utils::show_config(&inv, format),
        Commands::Init { force } => utils::init(&inv, force),
        Commands::Install => utils::install(&inv),
        Commands::Prepare { file, source, sha } => {
            tracing::debug!(?source, ?sha, "prepare-commit-msg");
            utils::prepare(&inv, &file, source.as_deref())
        }
        Commands::Test { hook } => utils::self_test(&inv, hook),
        Commands::Version => utils::version(),
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if !std::io::stderr().is_terminal() {
        colored::control::set_override(false);
    }
    let quiet = cli.quiet || std::env::var(ENV_QUIET).is_ok_and(|v| !v.is_empty());

    match run(cli, quiet) {
        Ok(Status::Pass) => ExitCode::SUCCESS,
        Ok(Status::Blocked) => ExitCode::from(1),
        Err(e) => {
            ConsoleReporter::new(quiet).error(&format!("{e:#}"));
            ExitCode::from(2)
        }
    }
}
