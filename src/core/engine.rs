use anyhow::{Context, Result};
use std::fmt;
use std::fs;
use std::path::Path;

use crate::builders::patterns::{
    PatternMatcher, PatternSet, Phase, is_protected, is_trailer_line, strip_diff_metadata,
    strip_to_added_lines,
};
use crate::core::config::ResolvedPolicy;
use crate::core::git::GitClient;

/// Default number of recent commits `snag audit` scans.
pub const DEFAULT_AUDIT_LIMIT: usize = 50;

/// A pattern matched while checking one phase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    pub phase: Phase,
    pub pattern: String,
}

/// What was being inspected when a violation was found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    StagedDiff,
    CommitMessage,
    MessageOf(String),
    DiffOf(String),
    Branch(String),
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Target::StagedDiff => write!(f, "staged diff"),
            Target::CommitMessage => write!(f, "commit message"),
            Target::MessageOf(sha) => write!(f, "message of {}", short_sha(sha)),
            Target::DiffOf(sha) => write!(f, "diff of {}", short_sha(sha)),
            Target::Branch(name) => write!(f, "branch {name:?}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Finding {
    pub violation: Violation,
    pub target: Target,
}

/// Pass/fail verdict of a single-shot check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckOutcome {
    Pass,
    Blocked(Finding),
}

impl CheckOutcome {
    pub fn is_pass(&self) -> bool {
        matches!(self, CheckOutcome::Pass)
    }

    fn blocked(phase: Phase, pattern: &str, target: Target) -> Self {
        CheckOutcome::Blocked(Finding {
            violation: Violation {
                phase,
                pattern: pattern.to_string(),
            },
            target,
        })
    }
}

/// Result of the commit-message check, including the silent trailer pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageCheck {
    pub removed_trailers: usize,
    pub outcome: CheckOutcome,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PushCheck {
    pub commits_checked: usize,
    pub patterns_checked: usize,
    pub outcome: CheckOutcome,
}

/// Violations found in one commit during an audit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitReport {
    pub sha: String,
    pub subject: String,
    pub violations: Vec<Violation>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuditReport {
    pub commits_scanned: usize,
    /// Only commits with at least one violation, in scan order.
    pub reports: Vec<CommitReport>,
}

impl AuditReport {
    pub fn total_violations(&self) -> usize {
        self.reports.iter().map(|r| r.violations.len()).sum()
    }

    pub fn is_clean(&self) -> bool {
        self.total_violations() == 0
    }
}

/// Which commits `snag audit` looks at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuditRange {
    /// A user-supplied revision or range such as `main..HEAD`.
    Explicit(String),
    /// The most recent N commits; zero means the full history.
    Recent(usize),
}

impl AuditRange {
    pub fn new(explicit: Option<String>, limit: usize) -> Self {
        match explicit {
            Some(range) => AuditRange::Explicit(range),
            None => AuditRange::Recent(limit),
        }
    }
}

/// Outcome of the protected-branch guard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BranchCheck {
    pub branch: String,
    pub outcome: CheckOutcome,
}

pub fn short_sha(sha: &str) -> &str {
    sha.get(..7).unwrap_or(sha)
}

/// Diff text reduced to newly added content lines.
fn added_content(diff: &str) -> String {
    strip_to_added_lines(&strip_diff_metadata(diff))
}

/// Removes trailer lines that match a pattern. Body lines are never touched.
///
/// # Returns
/// The kept lines and how many trailers were dropped.
pub fn strip_matching_trailers<'a>(
    lines: &[&'a str],
    patterns: &PatternSet,
) -> (Vec<&'a str>, usize) {
    let mut kept = Vec::with_capacity(lines.len());
    let mut removed = 0;
    for line in lines {
        if is_trailer_line(line) && patterns.first_match(line).is_some() {
            removed += 1;
            continue;
        }
        kept.push(*line);
    }
    (kept, removed)
}

/// Two-pass commit message check.
///
/// Pass 1 silently drops trailer lines (`Signed-off-by: bot`) that match a
/// msg pattern and rewrites the file without them; this never blocks.
/// Pass 2 matches the remaining text, and any hit there blocks the commit.
pub fn check_message_file(policy: &ResolvedPolicy, path: &Path) -> Result<MessageCheck> {
    let patterns = policy.msg_patterns();
    if patterns.is_empty() {
        return Ok(MessageCheck {
            removed_trailers: 0,
            outcome: CheckOutcome::Pass,
        });
    }

    let data = fs::read_to_string(path)
        .with_context(|| format!("reading commit message {}", path.display()))?;
    let lines: Vec<&str> = data.split('\n').collect();
    let (kept, removed) = strip_matching_trailers(&lines, patterns);
    let body = kept.join("\n");

    if removed > 0 {
        fs::write(path, &body)
            .with_context(|| format!("rewriting commit message {}", path.display()))?;
        tracing::info!(removed, path = %path.display(), "stripped matching trailers");
    }

    let outcome = match patterns.first_match(&body) {
        Some(pattern) => CheckOutcome::blocked(Phase::Msg, pattern, Target::CommitMessage),
        None => CheckOutcome::Pass,
    };
    Ok(MessageCheck {
        removed_trailers: removed,
        outcome,
    })
}

/// Exact match first, then glob.
pub fn check_branch(policy: &ResolvedPolicy, branch: &str) -> CheckOutcome {
    let patterns = policy.branch_patterns();
    if is_protected(branch, patterns.as_slice()) {
        // Report the first pattern that protects it.
        let pattern = patterns
            .iter()
            .find(|p| is_protected(branch, std::slice::from_ref(*p)))
            .map(String::as_str)
            .unwrap_or(branch);
        CheckOutcome::blocked(Phase::Branch, pattern, Target::Branch(branch.to_string()))
    } else {
        CheckOutcome::Pass
    }
}

/// Runs the git-backed checks against one resolved policy.
pub struct PolicyEngine<'a> {
    policy: &'a ResolvedPolicy,
    git: &'a dyn GitClient,
}

impl<'a> PolicyEngine<'a> {
    pub fn new(policy: &'a ResolvedPolicy, git: &'a dyn GitClient) -> Self {
        Self { policy, git }
    }

    /// pre-commit: newly added lines of the staged diff against diff patterns.
    pub fn check_diff(&self) -> Result<CheckOutcome> {
        let patterns = self.policy.diff_patterns();
        if patterns.is_empty() {
            return Ok(CheckOutcome::Pass);
        }

        let diff = self.git.staged_diff()?;
        let content = added_content(&diff);
        Ok(match patterns.first_match(&content) {
            Some(pattern) => CheckOutcome::blocked(Phase::Diff, pattern, Target::StagedDiff),
            None => CheckOutcome::Pass,
        })
    }

    /// pre-push: every unpushed commit, message before diff, stopping at the
    /// first match.
    pub fn check_push(&self) -> Result<PushCheck> {
        let patterns = self.policy.push_patterns();
        if patterns.is_empty() {
            return Ok(PushCheck {
                commits_checked: 0,
                patterns_checked: 0,
                outcome: CheckOutcome::Pass,
            });
        }

        let range = if self.git.has_upstream() {
            "@{upstream}..HEAD"
        } else {
            "HEAD"
        };
        let shas = if self.git.has_head() {
            self.git.rev_list(range)?
        } else {
            Vec::new()
        };
        tracing::debug!(range, commits = shas.len(), "checking unpushed commits");

        for sha in &shas {
            let message = self.git.commit_message(sha)?;
            if let Some(pattern) = patterns.first_match(&message) {
                return Ok(PushCheck {
                    commits_checked: shas.len(),
                    patterns_checked: patterns.len(),
                    outcome: CheckOutcome::blocked(
                        Phase::Push,
                        pattern,
                        Target::MessageOf(sha.clone()),
                    ),
                });
            }

            let diff = self.git.commit_diff(sha)?;
            if let Some(pattern) = patterns.first_match(&added_content(&diff)) {
                return Ok(PushCheck {
                    commits_checked: shas.len(),
                    patterns_checked: patterns.len(),
                    outcome: CheckOutcome::blocked(Phase::Push, pattern, Target::DiffOf(sha.clone())),
                });
            }
        }

        Ok(PushCheck {
            commits_checked: shas.len(),
            patterns_checked: patterns.len(),
            outcome: CheckOutcome::Pass,
        })
    }

    /// Lists the commits an audit covers.
    ///
    /// `HEAD~N..HEAD` fails when history is shorter than N; in that case the
    /// whole history is listed and capped at N.
    pub fn audit_commits(&self, range: &AuditRange) -> Result<Vec<String>> {
        if !self.git.has_head() {
            return Ok(Vec::new());
        }

        let shas = match range {
            AuditRange::Explicit(range) => self.git.rev_list(range)?,
            AuditRange::Recent(0) => self.git.rev_list("HEAD")?,
            AuditRange::Recent(limit) => {
                match self.git.rev_list(&format!("HEAD~{limit}..HEAD")) {
                    Ok(shas) => shas,
                    Err(e) => {
                        tracing::debug!(error = %e, limit, "short history, listing all commits");
                        let mut shas = self.git.rev_list("HEAD")?;
                        shas.truncate(*limit);
                        shas
                    }
                }
            }
        };
        Ok(shas)
    }

    /// History audit: diff and msg patterns checked separately on every
    /// commit, all violations collected.
    pub fn audit(&self, range: &AuditRange) -> Result<AuditReport> {
        let diff_patterns = self.policy.diff_patterns();
        let msg_patterns = self.policy.msg_patterns();
        if diff_patterns.is_empty() && msg_patterns.is_empty() {
            return Ok(AuditReport::default());
        }

        let shas = self.audit_commits(range)?;
        let mut report = AuditReport {
            commits_scanned: shas.len(),
            reports: Vec::new(),
        };

        for sha in shas {
            let commit = self.scan_commit(&sha, diff_patterns, msg_patterns)?;
            if !commit.violations.is_empty() {
                report.reports.push(commit);
            }
        }
        Ok(report)
    }

    fn scan_commit(
        &self,
        sha: &str,
        diff_patterns: &PatternSet,
        msg_patterns: &PatternSet,
    ) -> Result<CommitReport> {
        tracing::debug!(sha = short_sha(sha), "scanning commit");
        let mut report = CommitReport {
            sha: sha.to_string(),
            subject: self.git.commit_subject(sha)?,
            violations: Vec::new(),
        };

        if !msg_patterns.is_empty() {
            let message = self.git.commit_message(sha)?;
            if let Some(pattern) = msg_patterns.first_match(&message) {
                report.violations.push(Violation {
                    phase: Phase::Msg,
                    pattern: pattern.to_string(),
                });
            }
        }

        if !diff_patterns.is_empty() {
            let diff = self.git.commit_diff(sha)?;
            if let Some(pattern) = diff_patterns.first_match(&added_content(&diff)) {
                report.violations.push(Violation {
                    phase: Phase::Diff,
                    pattern: pattern.to_string(),
                });
            }
        }

        Ok(report)
    }

    /// pre-rebase: guards `branch`, or the checked-out branch when `None`.
    pub fn check_rebase(&self, branch: Option<&str>) -> Result<BranchCheck> {
        let branch = match branch.filter(|b| !b.is_empty()) {
            Some(branch) => branch.to_string(),
            None => self.git.current_branch()?,
        };
        let outcome = check_branch(self.policy, &branch);
        Ok(BranchCheck { branch, outcome })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::{SnagError, SnagResult};
    use std::collections::HashMap;
    use std::path::PathBuf;

    /// In-memory git used to drive the checkers without a repository.
    #[derive(Default)]
    struct FakeGit {
        staged: String,
        commits: Vec<(String, String, String)>,
        upstream: bool,
        branch: Option<String>,
        failing_ranges: Vec<String>,
        ranges: Vec<(String, Vec<String>)>,
    }

    impl FakeGit {
        fn commit(mut self, sha: &str, message: &str, diff: &str) -> Self {
            self.commits
                .push((sha.to_string(), message.to_string(), diff.to_string()));
            self
        }

        fn lookup(&self) -> HashMap<&str, (&str, &str)> {
            self.commits
                .iter()
                .map(|(sha, msg, diff)| (sha.as_str(), (msg.as_str(), diff.as_str())))
                .collect()
        }

        fn missing(sha: &str) -> SnagError {
            SnagError::git(format!("git log {sha}"), git2::Error::from_str("unknown revision"))
        }
    }

    impl GitClient for FakeGit {
        fn staged_diff(&self) -> SnagResult<String> {
            Ok(self.staged.clone())
        }

        fn commit_message(&self, sha: &str) -> SnagResult<String> {
            self.lookup()
                .get(sha)
                .map(|(msg, _)| msg.to_string())
                .ok_or_else(|| Self::missing(sha))
        }

        fn commit_subject(&self, sha: &str) -> SnagResult<String> {
            let message = self.commit_message(sha)?;
            Ok(message.lines().next().unwrap_or_default().to_string())
        }

        fn commit_diff(&self, sha: &str) -> SnagResult<String> {
            self.lookup()
                .get(sha)
                .map(|(_, diff)| diff.to_string())
                .ok_or_else(|| Self::missing(sha))
        }

        fn rev_list(&self, range: &str) -> SnagResult<Vec<String>> {
            if self.failing_ranges.iter().any(|r| r == range) {
                return Err(Self::missing(range));
            }
            if let Some((_, shas)) = self.ranges.iter().find(|(r, _)| r == range) {
                return Ok(shas.clone());
            }
            Ok(self.commits.iter().map(|(sha, _, _)| sha.clone()).collect())
        }

        fn has_head(&self) -> bool {
            !self.commits.is_empty()
        }

        fn has_upstream(&self) -> bool {
            self.upstream
        }

        fn current_branch(&self) -> SnagResult<String> {
            self.branch.clone().ok_or(SnagError::NotOnBranch)
        }

        fn repo_root(&self) -> PathBuf {
            PathBuf::from("/repo")
        }

        fn git_dir(&self) -> PathBuf {
            PathBuf::from("/repo/.git")
        }
    }

    fn policy(diff: &[&str], msg: &[&str], push: Option<&[&str]>) -> ResolvedPolicy {
        ResolvedPolicy::from_parts(diff, msg, push, ["main", "master", "release/*"])
    }

    fn added(path: &str, line: &str) -> String {
        format!(
            "diff --git a/{path} b/{path}\nnew file mode 100644\nindex 0000000..1111111\n--- /dev/null\n+++ b/{path}\n@@ -0,0 +1 @@\n+{line}\n"
        )
    }

    fn blocked_pattern(outcome: &CheckOutcome) -> Option<&str> {
        match outcome {
            CheckOutcome::Blocked(finding) => Some(finding.violation.pattern.as_str()),
            CheckOutcome::Pass => None,
        }
    }

    #[test]
    fn test_diff_blocks_added_content() {
        let policy = policy(&["secret"], &[], None);
        let git = FakeGit {
            staged: added("notes.txt", "the secret value"),
            ..Default::default()
        };
        let outcome = PolicyEngine::new(&policy, &git).check_diff().unwrap();
        assert_eq!(blocked_pattern(&outcome), Some("secret"));
    }

    #[test]
    fn test_diff_ignores_filename_in_headers() {
        let policy = policy(&["secret"], &[], None);
        let git = FakeGit {
            staged: added("secret.env", "public value"),
            ..Default::default()
        };
        let outcome = PolicyEngine::new(&policy, &git).check_diff().unwrap();
        assert!(outcome.is_pass());
    }

    #[test]
    fn test_diff_ignores_removed_lines() {
        let policy = policy(&["fixme"], &[], None);
        let git = FakeGit {
            staged: "--- a/x\n+++ b/x\n@@ -1 +1 @@\n-FIXME old\n+fixed\n".to_string(),
            ..Default::default()
        };
        let outcome = PolicyEngine::new(&policy, &git).check_diff().unwrap();
        assert!(outcome.is_pass());
    }

    #[test]
    fn test_strip_matching_trailers_only_touches_trailers() {
        let patterns: PatternSet = ["botname"].into_iter().collect();
        let lines = [
            "Add feature",
            "",
            "mentions botname in prose: yes it does",
            "Signed-off-by: Botname",
            "Reviewed-by: Human",
        ];
        let (kept, removed) = strip_matching_trailers(&lines, &patterns);
        assert_eq!(removed, 1);
        assert_eq!(
            kept,
            vec![
                "Add feature",
                "",
                "mentions botname in prose: yes it does",
                "Reviewed-by: Human",
            ]
        );
    }

    #[test]
    fn test_message_trailer_removed_and_body_still_blocks() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("COMMIT_EDITMSG");
        fs::write(&path, "Add feature\n\nplease FIXME\n\nSigned-off-by: Botname\n").unwrap();

        let policy = policy(&[], &["fixme", "botname"], None);
        let check = check_message_file(&policy, &path).unwrap();

        assert_eq!(check.removed_trailers, 1);
        assert_eq!(blocked_pattern(&check.outcome), Some("fixme"));
        let rewritten = fs::read_to_string(&path).unwrap();
        assert!(!rewritten.contains("Signed-off-by"));
        assert!(rewritten.contains("please FIXME"));
    }

    #[test]
    fn test_message_trailer_only_match_passes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("COMMIT_EDITMSG");
        fs::write(&path, "Add feature\n\nCo-authored-by: Botname <bot@example.com>\n").unwrap();

        let policy = policy(&[], &["botname"], None);
        let check = check_message_file(&policy, &path).unwrap();
        assert!(check.outcome.is_pass());
        assert_eq!(fs::read_to_string(&path).unwrap(), "Add feature\n\n");
    }

    #[test]
    fn test_message_clean_file_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("COMMIT_EDITMSG");
        fs::write(&path, "Add feature\n").unwrap();

        let policy = policy(&[], &["wip"], None);
        let check = check_message_file(&policy, &path).unwrap();
        assert!(check.outcome.is_pass());
        assert_eq!(check.removed_trailers, 0);
    }

    #[test]
    fn test_message_without_patterns_skips_reading() {
        let policy = policy(&["x"], &[], None);
        let check = check_message_file(&policy, Path::new("/no/such/file")).unwrap();
        assert!(check.outcome.is_pass());
    }

    #[test]
    fn test_push_checks_message_before_diff() {
        let policy = policy(&["hack"], &["wip"], None);
        let git = FakeGit::default()
            .commit("aaaaaaaaaa", "clean", &added("a.txt", "fine"))
            .commit("bbbbbbbbbb", "WIP: stuff", &added("b.txt", "hack"));

        let check = PolicyEngine::new(&policy, &git).check_push().unwrap();
        match check.outcome {
            CheckOutcome::Blocked(finding) => {
                assert_eq!(finding.violation.pattern, "wip");
                assert_eq!(finding.violation.phase, Phase::Push);
                assert_eq!(finding.target, Target::MessageOf("bbbbbbbbbb".to_string()));
                assert_eq!(finding.target.to_string(), "message of bbbbbbb");
            }
            CheckOutcome::Pass => panic!("expected a violation"),
        }
    }

    #[test]
    fn test_push_finds_diff_in_second_commit() {
        let policy = policy(&["secret"], &[], None);
        let git = FakeGit::default()
            .commit("c1", "first", &added("a.txt", "fine"))
            .commit("c2", "second", &added("b.txt", "a SECRET"));

        let check = PolicyEngine::new(&policy, &git).check_push().unwrap();
        assert_eq!(blocked_pattern(&check.outcome), Some("secret"));
        assert_eq!(check.commits_checked, 2);
    }

    #[test]
    fn test_push_explicit_empty_blocks_nothing() {
        let policy = policy(&["secret"], &["secret"], Some(&[]));
        let git = FakeGit::default().commit("c1", "secret", &added("a.txt", "secret"));
        let check = PolicyEngine::new(&policy, &git).check_push().unwrap();
        assert!(check.outcome.is_pass());
        assert_eq!(check.commits_checked, 0);
    }

    #[test]
    fn test_audit_collects_all_violations() {
        let policy = policy(&["hack"], &["wip"], None);
        let git = FakeGit::default()
            .commit("c3", "WIP both", &added("c.txt", "hack"))
            .commit("c2", "clean", &added("b.txt", "fine"))
            .commit("c1", "wip msg only", &added("a.txt", "fine"));

        let report = PolicyEngine::new(&policy, &git)
            .audit(&AuditRange::Recent(0))
            .unwrap();
        assert_eq!(report.commits_scanned, 3);
        assert_eq!(report.reports.len(), 2);
        assert_eq!(report.total_violations(), 3);
        assert_eq!(report.reports[0].subject, "WIP both");
        assert_eq!(report.reports[0].violations[0].phase, Phase::Msg);
        assert_eq!(report.reports[0].violations[1].phase, Phase::Diff);
    }

    #[test]
    fn test_audit_keeps_phases_separate() {
        // "wip" is only a msg pattern, so a diff adding "wip" is fine.
        let policy = policy(&[], &["wip"], None);
        let git = FakeGit::default().commit("c1", "clean", &added("a.txt", "wip"));
        let report = PolicyEngine::new(&policy, &git)
            .audit(&AuditRange::Recent(0))
            .unwrap();
        assert!(report.is_clean());
    }

    #[test]
    fn test_audit_short_history_falls_back_and_caps() {
        let policy = policy(&["x"], &[], None);
        let git = FakeGit {
            failing_ranges: vec!["HEAD~2..HEAD".to_string()],
            ..FakeGit::default()
                .commit("c3", "three", "")
                .commit("c2", "two", "")
                .commit("c1", "one", "")
        };

        let engine = PolicyEngine::new(&policy, &git);
        let shas = engine.audit_commits(&AuditRange::Recent(2)).unwrap();
        assert_eq!(shas, vec!["c3", "c2"]);
    }

    #[test]
    fn test_audit_explicit_range_wins_over_limit() {
        let policy = policy(&["hack"], &[], None);
        let git = FakeGit {
            ranges: vec![("c1..c3".to_string(), vec!["c3".to_string(), "c2".to_string()])],
            ..FakeGit::default()
                .commit("c3", "three", &added("c.txt", "fine"))
                .commit("c2", "two", &added("b.txt", "hack"))
                .commit("c1", "one", &added("a.txt", "hack"))
        };

        let engine = PolicyEngine::new(&policy, &git);
        let range = AuditRange::new(Some("c1..c3".to_string()), 1);
        assert_eq!(range, AuditRange::Explicit("c1..c3".to_string()));
        assert_eq!(engine.audit_commits(&range).unwrap(), vec!["c3", "c2"]);

        let report = engine.audit(&range).unwrap();
        assert_eq!(report.commits_scanned, 2);
        assert_eq!(report.reports.len(), 1);
        assert_eq!(report.reports[0].sha, "c2");
    }

    #[test]
    fn test_audit_empty_repo() {
        let policy = policy(&["x"], &[], None);
        let git = FakeGit::default();
        let report = PolicyEngine::new(&policy, &git)
            .audit(&AuditRange::Recent(DEFAULT_AUDIT_LIMIT))
            .unwrap();
        assert_eq!(report.commits_scanned, 0);
    }

    #[test]
    fn test_rebase_guard_exact_and_glob() {
        let policy = policy(&[], &[], None);
        let git = FakeGit {
            branch: Some("main".to_string()),
            ..Default::default()
        };
        let engine = PolicyEngine::new(&policy, &git);

        let current = engine.check_rebase(None).unwrap();
        assert_eq!(current.branch, "main");
        assert_eq!(blocked_pattern(&current.outcome), Some("main"));

        let release = engine.check_rebase(Some("release/2.0")).unwrap();
        assert_eq!(blocked_pattern(&release.outcome), Some("release/*"));

        let feature = engine.check_rebase(Some("feature/x")).unwrap();
        assert!(feature.outcome.is_pass());
    }

    #[test]
    fn test_rebase_detached_head_is_an_error() {
        let policy = policy(&[], &[], None);
        let git = FakeGit::default();
        assert!(PolicyEngine::new(&policy, &git).check_rebase(None).is_err());
    }
}
