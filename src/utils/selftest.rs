use anyhow::{Context, Result};
use clap::ValueEnum;
use colored::Colorize;
use git2::{Repository, Signature};
use std::fs;
use std::path::Path;

use super::{Invocation, Status};
use crate::builders::patterns::PatternSet;
use crate::builders::reporter::{ConsoleReporter, Reporter};
use crate::core::config::{BLOCKLIST_FILE, Environment};

/// Used when the current directory resolves to no diff, msg or push patterns.
pub const DEMO_PATTERNS: [&str; 3] = ["todo", "fixme", "password"];

/// One hook `snag test` can dry-run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum HookTest {
    Diff,
    Msg,
    Push,
}

impl HookTest {
    const ALL: [HookTest; 3] = [HookTest::Diff, HookTest::Msg, HookTest::Push];

    fn name(self) -> &'static str {
        match self {
            HookTest::Diff => "diff",
            HookTest::Msg => "msg",
            HookTest::Push => "push",
        }
    }
}

/// Dry-runs the hook checks against a throwaway repository seeded with the
/// current patterns and a planted violation for each hook.
///
/// A hook passes when it blocks its violation. `only` limits the run to one
/// hook.
pub fn self_test(inv: &Invocation, only: Option<HookTest>) -> Result<Status> {
    let policy = inv.policy()?;
    let mut patterns: PatternSet = policy
        .diff_patterns()
        .union(policy.msg_patterns())
        .union(&policy.push_patterns());
    if patterns.is_empty() {
        inv.reporter.info("no patterns configured, using demo patterns");
        patterns = DEMO_PATTERNS.into_iter().collect();
    }
    inv.reporter
        .info(&format!("testing with patterns: {}", patterns.as_slice().join(", ")));

    let dir = tempfile::Builder::new()
        .prefix("snag-test-")
        .tempdir()
        .context("creating temp dir")?;
    let repo = Repository::init(dir.path()).context("initializing temp repo")?;
    commit_index(&repo, "initial commit")?;
    fs::write(
        dir.path().join(BLOCKLIST_FILE),
        format!("{}\n", patterns.as_slice().join("\n")),
    )
    .context("writing temp blocklist")?;

    // The checks run against the temp repo only; the caller's SNAG_* overrides
    // stay out of it.
    let sandbox = Invocation {
        cwd: dir.path().to_path_buf(),
        blocklist: None,
        env: Environment::default(),
        reporter: ConsoleReporter::new(inv.reporter.is_quiet()),
    };

    let mut passed = 0;
    let mut total = 0;
    for hook in HookTest::ALL {
        if only.is_some_and(|o| o != hook) {
            continue;
        }
        total += 1;
        inv.reporter.hint(&format!("=== {} ===", hook.name()));

        match run_hook(&sandbox, &repo, hook, patterns.as_slice()) {
            Ok(Status::Blocked) => {
                passed += 1;
                inv.reporter.info(&format!(
                    "{} {} correctly rejected violation",
                    "PASS:".green().bold(),
                    hook.name()
                ));
            }
            Ok(Status::Pass) => inv.reporter.warn(&format!(
                "{} {} did not detect violation",
                "FAIL:".red().bold(),
                hook.name()
            )),
            Err(e) => inv.reporter.warn(&format!(
                "{} {} errored: {e:#}",
                "FAIL:".red().bold(),
                hook.name()
            )),
        }
    }

    inv.reporter.info(&format!("{passed}/{total} checks passed"));
    Ok(if passed == total {
        Status::Pass
    } else {
        Status::Blocked
    })
}

fn run_hook(
    sandbox: &Invocation,
    repo: &Repository,
    hook: HookTest,
    patterns: &[String],
) -> Result<Status> {
    let root = sandbox.cwd.as_path();
    let first = patterns.first().map(String::as_str).unwrap_or_default();
    let last = patterns.last().map(String::as_str).unwrap_or_default();

    match hook {
        HookTest::Diff => {
            stage(repo, root, "bad.txt", &format!("this has a {first} in it\n"))?;
            super::check_diff(sandbox)
        }
        HookTest::Msg => {
            // Body hit blocks; the trailer hit is stripped silently first.
            let trailer = patterns.get(1).map(String::as_str).unwrap_or(first);
            let msg_file = root.join("COMMIT_EDITMSG");
            fs::write(
                &msg_file,
                format!(
                    "Add new feature\n\nThis has a {first} in the body\n\nSigned-off-by: {trailer}@example.com\n"
                ),
            )
            .context("writing commit message")?;
            super::check_msg(sandbox, &msg_file)
        }
        HookTest::Push => {
            stage(repo, root, "clean.txt", "nothing wrong here\n")?;
            commit_index(repo, "clean commit")?;
            stage(repo, root, "bad.txt", &format!("this contains {last}\n"))?;
            commit_index(repo, "add bad file")?;
            super::check_push(sandbox)
        }
    }
}

fn stage(repo: &Repository, root: &Path, name: &str, content: &str) -> Result<()> {
    fs::write(root.join(name), content).with_context(|| format!("writing {name}"))?;
    let mut index = repo.index()?;
    index.add_path(Path::new(name))?;
    index.write()?;
    Ok(())
}

/// Commits whatever is staged on top of `HEAD` (or as the root commit).
fn commit_index(repo: &Repository, message: &str) -> Result<()> {
    let mut index = repo.index()?;
    let tree = repo.find_tree(index.write_tree()?)?;
    let sig = Signature::now("snag-test", "test@snag.dev")?;
    let parent = repo.head().ok().and_then(|h| h.peel_to_commit().ok());
    let parents: Vec<&git2::Commit> = parent.iter().collect();
    repo.commit(Some("HEAD"), &sig, &sig, message, &tree, &parents)
        .with_context(|| format!("committing {message:?}"))?;
    Ok(())
}
