use git2::{Oid, Repository, Signature};
use snag::builders::reporter::ConsoleReporter;
use snag::core::config::{ConfigResolver, Environment};
use snag::core::engine::{AuditRange, CheckOutcome, PolicyEngine, Target};
use snag::core::git::{Git2Client, GitClient};
use snag::utils::{self, HookTest, Invocation, Status};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn setup_test_repo() -> (TempDir, Repository) {
    let dir = tempfile::tempdir().unwrap();
    let repo = Repository::init(dir.path()).unwrap();
    (dir, repo)
}

fn invocation(dir: &Path) -> Invocation {
    Invocation {
        cwd: dir.to_path_buf(),
        blocklist: None,
        env: Environment::default(),
        reporter: ConsoleReporter::new(true),
    }
}

fn write_config(dir: &Path, content: &str) {
    fs::write(dir.join("snag.toml"), content).unwrap();
}

fn stage(repo: &Repository, path: &str, content: &str) {
    let root = repo.workdir().unwrap();
    fs::write(root.join(path), content).unwrap();
    let mut index = repo.index().unwrap();
    index.add_path(Path::new(path)).unwrap();
    index.write().unwrap();
}

fn commit_file(repo: &Repository, path: &str, content: &str, message: &str) -> Oid {
    stage(repo, path, content);
    let mut index = repo.index().unwrap();
    let tree_id = index.write_tree().unwrap();
    let tree = repo.find_tree(tree_id).unwrap();
    let sig = Signature::now("Test", "test@example.com").unwrap();

    let parent = repo.head().ok().and_then(|h| h.peel_to_commit().ok());
    let parents: Vec<&git2::Commit> = parent.iter().collect();
    repo.commit(Some("HEAD"), &sig, &sig, message, &tree, &parents)
        .unwrap()
}

#[test]
fn test_staged_diff_end_to_end() {
    let (td, repo) = setup_test_repo();
    let root = td.path();
    write_config(root, "[block]\ndiff = [\"secret\"]\n");
    let inv = invocation(root);

    // 1. Staging a line with the pattern blocks the commit
    stage(&repo, "notes.txt", "the secret value\n");
    assert_eq!(utils::check_diff(&inv).unwrap(), Status::Blocked);

    // 2. Restaging clean content passes
    stage(&repo, "notes.txt", "public value\n");
    assert_eq!(utils::check_diff(&inv).unwrap(), Status::Pass);
}

#[test]
fn test_filename_in_diff_header_does_not_match() {
    let (td, repo) = setup_test_repo();
    let root = td.path();
    write_config(root, "[block]\ndiff = [\"secret\"]\n");

    stage(&repo, "secret.env", "public value\n");
    assert_eq!(utils::check_diff(&invocation(root)).unwrap(), Status::Pass);
}

#[test]
fn test_no_config_is_silent_pass() {
    let (td, repo) = setup_test_repo();
    stage(&repo, "notes.txt", "the secret value\n");
    assert_eq!(
        utils::check_diff(&invocation(td.path())).unwrap(),
        Status::Pass
    );
}

#[test]
fn test_commit_message_trailer_is_stripped() {
    let (td, _repo) = setup_test_repo();
    let root = td.path();
    write_config(root, "[block]\nmsg = [\"generated-by\"]\n");

    let msg_file = root.join("COMMIT_EDITMSG");
    fs::write(&msg_file, "Add feature\n\nGenerated-by: some tool\n").unwrap();

    assert_eq!(
        utils::check_msg(&invocation(root), &msg_file).unwrap(),
        Status::Pass
    );
    assert_eq!(fs::read_to_string(&msg_file).unwrap(), "Add feature\n\n");
}

#[test]
fn test_push_without_upstream_checks_all_commits() {
    let (td, repo) = setup_test_repo();
    let root = td.path();
    write_config(root, "[block]\nmsg = [\"wip\"]\n");

    commit_file(&repo, "a.txt", "one\n", "Initial commit");
    let wip = commit_file(&repo, "b.txt", "two\n", "WIP: tweak");

    let policy = ConfigResolver::new(root, Environment::default())
        .resolve()
        .unwrap();
    let git = Git2Client::discover(root).unwrap();
    let check = PolicyEngine::new(&policy, &git).check_push().unwrap();

    assert_eq!(check.commits_checked, 2);
    match check.outcome {
        CheckOutcome::Blocked(finding) => {
            assert_eq!(finding.violation.pattern, "wip");
            assert_eq!(finding.target, Target::MessageOf(wip.to_string()));
        }
        CheckOutcome::Pass => panic!("expected push to be blocked"),
    }

    assert_eq!(utils::check_push(&invocation(root)).unwrap(), Status::Blocked);
}

#[test]
fn test_explicit_empty_push_list_allows_push() {
    let (td, repo) = setup_test_repo();
    let root = td.path();
    write_config(root, "[block]\nmsg = [\"wip\"]\npush = []\n");

    commit_file(&repo, "a.txt", "one\n", "WIP: tweak");
    assert_eq!(utils::check_push(&invocation(root)).unwrap(), Status::Pass);
}

#[test]
fn test_root_commit_diff_contains_added_lines() {
    let (td, repo) = setup_test_repo();
    let oid = commit_file(&repo, "a.txt", "hello world\n", "Initial commit");

    let git = Git2Client::discover(td.path()).unwrap();
    let diff = git.commit_diff(&oid.to_string()).unwrap();
    assert!(diff.contains("+++ b/a.txt"));
    assert!(diff.contains("+hello world"));
    assert_eq!(git.commit_subject(&oid.to_string()).unwrap(), "Initial commit");
}

#[test]
fn test_audit_short_history() {
    let (td, repo) = setup_test_repo();
    let root = td.path();
    write_config(root, "[block]\ndiff = [\"hack\"]\nmsg = [\"fixme\"]\n");

    commit_file(&repo, "a.txt", "clean\n", "Initial commit");
    commit_file(&repo, "b.txt", "a quick hack\n", "Add b");
    commit_file(&repo, "c.txt", "clean\n", "FIXME later");

    let policy = ConfigResolver::new(root, Environment::default())
        .resolve()
        .unwrap();
    let git = Git2Client::discover(root).unwrap();
    let report = PolicyEngine::new(&policy, &git)
        .audit(&AuditRange::Recent(50))
        .unwrap();

    assert_eq!(report.commits_scanned, 3);
    assert_eq!(report.reports.len(), 2);
    assert_eq!(report.total_violations(), 2);

    assert_eq!(utils::audit(&invocation(root), None, 50).unwrap(), Status::Blocked);
}

#[test]
fn test_rebase_of_default_branch_is_blocked() {
    let (td, repo) = setup_test_repo();
    commit_file(&repo, "a.txt", "one\n", "Initial commit");

    // A fresh repository is on main or master, both protected by default.
    let inv = invocation(td.path());
    assert_eq!(utils::check_rebase(&inv, None).unwrap(), Status::Blocked);
    assert_eq!(
        utils::check_rebase(&inv, Some("feature/x")).unwrap(),
        Status::Pass
    );
}

#[test]
fn test_checkout_warns_until_hooks_installed() {
    let (td, _repo) = setup_test_repo();
    let root = td.path();
    write_config(root, "[block]\ndiff = [\"secret\"]\n");
    let inv = invocation(root);

    assert_eq!(utils::check_checkout(&inv).unwrap(), Status::Blocked);
    assert_eq!(utils::install(&inv).unwrap(), Status::Pass);
    assert_eq!(utils::check_checkout(&inv).unwrap(), Status::Pass);
}

#[test]
fn test_prepare_prefixes_ticket_from_branch() {
    let (td, repo) = setup_test_repo();
    let root = td.path();
    let oid = commit_file(&repo, "a.txt", "one\n", "Initial commit");

    let head = repo.find_commit(oid).unwrap();
    repo.branch("feat/42-demo", &head, false).unwrap();
    repo.set_head("refs/heads/feat/42-demo").unwrap();

    let msg_file = root.join("COMMIT_EDITMSG");
    fs::write(&msg_file, "Add new feature\n").unwrap();
    let inv = invocation(root);

    utils::prepare(&inv, &msg_file, None).unwrap();
    assert_eq!(fs::read_to_string(&msg_file).unwrap(), "#42 Add new feature\n");

    // Running again does not add a second prefix, and amends are skipped.
    utils::prepare(&inv, &msg_file, None).unwrap();
    utils::prepare(&inv, &msg_file, Some("commit")).unwrap();
    assert_eq!(fs::read_to_string(&msg_file).unwrap(), "#42 Add new feature\n");
}

#[test]
fn test_audit_explicit_range_ignores_limit() {
    let (td, repo) = setup_test_repo();
    let root = td.path();
    write_config(root, "[block]\ndiff = [\"hack\"]\n");

    commit_file(&repo, "a.txt", "clean\n", "Initial commit");
    commit_file(&repo, "b.txt", "a quick hack\n", "Add b");
    commit_file(&repo, "c.txt", "clean\n", "Add c");
    let inv = invocation(root);

    // Only the last commit is in range, and it is clean.
    assert_eq!(
        utils::audit(&inv, Some("HEAD~1..HEAD".into()), 50).unwrap(),
        Status::Pass
    );
    assert_eq!(utils::audit(&inv, None, 50).unwrap(), Status::Blocked);

    let policy = ConfigResolver::new(root, Environment::default())
        .resolve()
        .unwrap();
    let git = Git2Client::discover(root).unwrap();
    let report = PolicyEngine::new(&policy, &git)
        .audit(&AuditRange::new(Some("HEAD~2..HEAD".into()), 1))
        .unwrap();
    assert_eq!(report.commits_scanned, 2);
    assert_eq!(report.reports.len(), 1);
}

#[test]
fn test_allow_rebase_lets_protected_branch_through() {
    let (td, repo) = setup_test_repo();
    commit_file(&repo, "a.txt", "one\n", "Initial commit");

    let inv = Invocation {
        env: Environment {
            allow_rebase: true,
            ..Default::default()
        },
        ..invocation(td.path())
    };
    assert_eq!(utils::check_rebase(&inv, None).unwrap(), Status::Pass);
}

#[test]
fn test_self_test_with_demo_patterns() {
    let td = tempfile::tempdir().unwrap();
    assert_eq!(
        utils::self_test(&invocation(td.path()), None).unwrap(),
        Status::Pass
    );
}

#[test]
fn test_self_test_with_configured_patterns() {
    let td = tempfile::tempdir().unwrap();
    write_config(td.path(), "[block]\ndiff = [\"secret\"]\n");
    let inv = invocation(td.path());

    assert_eq!(utils::self_test(&inv, None).unwrap(), Status::Pass);
    assert_eq!(
        utils::self_test(&inv, Some(HookTest::Push)).unwrap(),
        Status::Pass
    );
}
