use anyhow::{Context, Result, bail};
use clap::ValueEnum;
use std::fs;
use std::path::{Path, PathBuf};

use crate::builders::hooks::{self, HookInstall};
use crate::builders::importer;
use crate::builders::reporter::{ConsoleReporter, Reporter};
use crate::core::config::{
    BLOCKLIST_FILE, ConfigResolver, ENV_ALLOW_REBASE, Environment, ResolvedPolicy, SNAG_TOML,
    load_blocklist,
};
use crate::core::engine::{AuditRange, CheckOutcome, PolicyEngine, check_message_file};
use crate::core::error::SnagError;
use crate::core::git::{Git2Client, GitClient};
use crate::core::version::RUNNING_VERSION;

pub mod selftest;
pub mod ticket;

pub use selftest::{HookTest, self_test};

/// How a command finished when it did not fail outright.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Pass,
    /// A policy matched, or something the user must fix was detected.
    Blocked,
}

/// Output format for `snag config --format`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ExportFormat {
    Json,
    Yaml,
    Toml,
}

/// Per-invocation state shared by every command handler.
pub struct Invocation {
    pub cwd: PathBuf,
    pub blocklist: Option<PathBuf>,
    pub env: Environment,
    pub reporter: ConsoleReporter,
}

impl Invocation {
    pub fn new(cwd: PathBuf, blocklist: Option<PathBuf>, quiet: bool) -> Self {
        Self {
            cwd,
            blocklist,
            env: Environment::from_process(),
            reporter: ConsoleReporter::new(quiet),
        }
    }

    fn resolver(&self) -> ConfigResolver {
        ConfigResolver::new(&self.cwd, self.env.clone()).with_override(self.blocklist.clone())
    }

    fn policy(&self) -> Result<ResolvedPolicy> {
        Ok(self.resolver().resolve()?)
    }

    fn git(&self) -> Result<Git2Client> {
        Ok(Git2Client::discover(&self.cwd)?)
    }

    fn report(&self, outcome: &CheckOutcome) -> Status {
        match outcome {
            CheckOutcome::Pass => Status::Pass,
            CheckOutcome::Blocked(finding) => {
                self.reporter.violation(finding);
                Status::Blocked
            }
        }
    }
}

/// pre-commit: staged diff against diff patterns.
pub fn check_diff(inv: &Invocation) -> Result<Status> {
    let policy = inv.policy()?;
    if policy.diff_patterns().is_empty() {
        return Ok(Status::Pass);
    }
    let git = inv.git()?;
    let outcome = PolicyEngine::new(&policy, &git).check_diff()?;
    Ok(inv.report(&outcome))
}

/// commit-msg: trailer stripping, then the hard check on what remains.
pub fn check_msg(inv: &Invocation, file: &Path) -> Result<Status> {
    let policy = inv.policy()?;
    let check = check_message_file(&policy, file)?;
    if check.removed_trailers > 0 {
        inv.reporter
            .warn(&format!("removed {} trailer line(s)", check.removed_trailers));
    }

    let status = inv.report(&check.outcome);
    if status == Status::Blocked {
        inv.reporter
            .hint("to recover: git commit -eF .git/COMMIT_EDITMSG");
    }
    Ok(status)
}

/// pre-push: every unpushed commit against push patterns.
pub fn check_push(inv: &Invocation) -> Result<Status> {
    let policy = inv.policy()?;
    if policy.push_patterns().is_empty() {
        return Ok(Status::Pass);
    }
    let git = inv.git()?;
    let check = PolicyEngine::new(&policy, &git).check_push()?;

    let status = inv.report(&check.outcome);
    if status == Status::Pass && check.commits_checked > 0 {
        inv.reporter.info(&format!(
            "{} patterns checked against {} commits",
            check.patterns_checked, check.commits_checked
        ));
    }
    Ok(status)
}

/// pre-rebase: refuses protected branches unless `SNAG_ALLOW_REBASE=1`.
///
/// Git passes the upstream first and the branch being rebased second; the
/// branch is absent when rebasing the current one.
pub fn check_rebase(inv: &Invocation, branch: Option<&str>) -> Result<Status> {
    if inv.env.allow_rebase {
        tracing::debug!("{ENV_ALLOW_REBASE}=1, rebase guard skipped");
        return Ok(Status::Pass);
    }

    let policy = inv.policy()?;
    let git = inv.git()?;
    let check = PolicyEngine::new(&policy, &git).check_rebase(branch)?;

    match check.outcome {
        CheckOutcome::Pass => Ok(Status::Pass),
        CheckOutcome::Blocked(_) => {
            inv.reporter.warn(&format!(
                "rebase of protected branch {:?} blocked",
                check.branch
            ));
            inv.reporter.hint(&format!(
                "protected branches: {}",
                policy.branch_patterns().as_slice().join(", ")
            ));
            inv.reporter
                .hint(&format!("to override: {ENV_ALLOW_REBASE}=1 git rebase ..."));
            inv.reporter.bell();
            Ok(Status::Blocked)
        }
    }
}

/// post-checkout: nags when the repo has a policy but no snag hooks.
pub fn check_checkout(inv: &Invocation) -> Result<Status> {
    let policy = inv.policy()?;
    if !policy.has_any_patterns() {
        return Ok(Status::Pass);
    }

    let git = inv.git()?;
    if hooks::hooks_installed(&git.repo_root(), &git.git_dir()) {
        return Ok(Status::Pass);
    }

    inv.reporter
        .warn("this repo has a snag config but snag hooks aren't installed");
    inv.reporter.hint("run: snag install");
    Ok(Status::Blocked)
}

/// Scans recent history (or an explicit range) and reports every violation.
pub fn audit(inv: &Invocation, range: Option<String>, limit: usize) -> Result<Status> {
    let policy = inv.policy()?;
    if policy.diff_patterns().is_empty() && policy.msg_patterns().is_empty() {
        inv.reporter.info("no diff or msg patterns configured");
        return Ok(Status::Pass);
    }

    let git = inv.git()?;
    let range = AuditRange::new(range, limit);
    let report = PolicyEngine::new(&policy, &git).audit(&range)?;
    inv.reporter.print_audit(&report);

    Ok(if report.is_clean() {
        Status::Pass
    } else {
        Status::Blocked
    })
}

/// Shows where the policy comes from, or exports the resolved result.
pub fn show_config(inv: &Invocation, format: Option<ExportFormat>) -> Result<Status> {
    let resolver = inv.resolver();

    let Some(format) = format else {
        let sources = resolver.collect_sources()?;
        inv.reporter.print_sources(&sources);
        return Ok(Status::Pass);
    };

    let policy = resolver.resolve()?;
    let export = policy.export();
    let rendered = match format {
        ExportFormat::Json => serde_json::to_string_pretty(&export)?,
        ExportFormat::Yaml => serde_yaml::to_string(&export)?,
        ExportFormat::Toml => toml::to_string(&export)?,
    };
    print!("{rendered}");
    if !rendered.ends_with('\n') {
        println!();
    }
    Ok(Status::Pass)
}

/// Writes `snag.toml` in `dir`, importing a sibling `.blocklist` when present.
///
/// Returns the path written and how many patterns were imported.
pub fn write_starter_config(dir: &Path, force: bool) -> Result<(PathBuf, usize)> {
    let target = dir.join(SNAG_TOML);
    if target.exists() && !force {
        bail!(
            "{} already exists (use --force to overwrite)",
            target.display()
        );
    }

    let imported = load_blocklist(&dir.join(BLOCKLIST_FILE))?;
    let content = if imported.is_empty() {
        importer::default_snag_toml()
    } else {
        importer::snag_toml_from_blocklist(&imported)
    };

    fs::write(&target, content).with_context(|| format!("writing {}", target.display()))?;
    Ok((target, imported.len()))
}

pub fn init(inv: &Invocation, force: bool) -> Result<Status> {
    let (path, imported) = write_starter_config(&inv.cwd, force)?;
    if imported > 0 {
        inv.reporter.info(&format!(
            "imported {imported} patterns from {BLOCKLIST_FILE} into {}",
            path.display()
        ));
        inv.reporter
            .hint(&format!("{BLOCKLIST_FILE} is ignored once {SNAG_TOML} exists"));
    } else {
        inv.reporter.info(&format!("created {}", path.display()));
    }
    Ok(Status::Pass)
}

pub fn install(inv: &Invocation) -> Result<Status> {
    let git = inv.git()?;
    for (name, result) in hooks::install_git_hooks(&git.git_dir())? {
        match result {
            HookInstall::Installed => inv.reporter.info(&format!("installed {name}")),
            HookInstall::AlreadyInstalled => {
                inv.reporter.info(&format!("{name} already installed"))
            }
            HookInstall::BackedUp => inv.reporter.warn(&format!(
                "existing {name} hook moved to {name}.backup"
            )),
        }
    }
    Ok(Status::Pass)
}

/// prepare-commit-msg: prefixes the message with the ticket from the branch.
pub fn prepare(inv: &Invocation, file: &Path, source: Option<&str>) -> Result<Status> {
    if ticket::skips_source(source) {
        return Ok(Status::Pass);
    }

    let branch = match inv.git()?.current_branch() {
        Ok(branch) => branch,
        Err(SnagError::NotOnBranch) => return Ok(Status::Pass),
        Err(e) => return Err(e.into()),
    };

    let re = ticket::ticket_regex(inv.env.ticket_pattern.as_deref())?;
    let Some(ticket) = ticket::extract_ticket(&branch, &re) else {
        return Ok(Status::Pass);
    };

    let message = fs::read_to_string(file)
        .with_context(|| format!("reading commit message {}", file.display()))?;
    if let Some(updated) = ticket::prefix_message(&message, &ticket) {
        fs::write(file, updated)
            .with_context(|| format!("writing commit message {}", file.display()))?;
        inv.reporter
            .info(&format!("prepended #{ticket} from branch {branch}"));
    }
    Ok(Status::Pass)
}

pub fn version() -> Result<Status> {
    println!("snag version {RUNNING_VERSION}");
    Ok(Status::Pass)
}
