use git2::{Diff, DiffFormat, ErrorCode, Repository, Sort, Tree};
use std::path::{Path, PathBuf};

use crate::core::error::{SnagError, SnagResult};

/// Trait defining the git queries the policy checks need.
/// Everything is a pull-based read; nothing here writes to the repository.
pub trait GitClient {
    /// Unified diff of the index against `HEAD` (or the empty tree before the
    /// first commit).
    fn staged_diff(&self) -> SnagResult<String>;

    /// Full raw message of a commit.
    fn commit_message(&self, sha: &str) -> SnagResult<String>;

    /// First line of a commit message.
    fn commit_subject(&self, sha: &str) -> SnagResult<String>;

    /// Unified diff a commit introduces relative to its parent.
    fn commit_diff(&self, sha: &str) -> SnagResult<String>;

    /// Commit ids in a revision range (`a..b`) or reachable from a single rev.
    fn rev_list(&self, range: &str) -> SnagResult<Vec<String>>;

    /// Whether `HEAD` resolves to a commit (false in an empty repository).
    fn has_head(&self) -> bool;

    /// Whether the current branch tracks an upstream.
    fn has_upstream(&self) -> bool;

    /// Short name of the checked-out branch.
    fn current_branch(&self) -> SnagResult<String>;

    fn repo_root(&self) -> PathBuf;

    fn git_dir(&self) -> PathBuf;
}

/// Concrete implementation of GitClient using the git2 crate.
pub struct Git2Client {
    repo: Repository,
}

impl Git2Client {
    /// Opens the repository containing `path`, searching parent directories.
    pub fn discover<P: AsRef<Path>>(path: P) -> SnagResult<Self> {
        let repo = Repository::discover(path.as_ref())
            .map_err(|e| SnagError::git("git rev-parse --git-dir", e))?;
        Ok(Self { repo })
    }

    fn find_commit(&self, sha: &str, command: &str) -> SnagResult<git2::Commit<'_>> {
        self.repo
            .revparse_single(sha)
            .and_then(|obj| obj.peel_to_commit())
            .map_err(|e| SnagError::git(format!("{command} {sha}"), e))
    }

    fn head_tree(&self) -> Option<Tree<'_>> {
        self.repo.head().ok().and_then(|head| head.peel_to_tree().ok())
    }
}

/// Renders a diff the way `git diff` prints it, so header lines look exactly
/// like the ones the pattern matcher strips.
fn render_patch(diff: &Diff<'_>) -> Result<String, git2::Error> {
    let mut out = String::new();
    diff.print(DiffFormat::Patch, |_delta, _hunk, line| {
        if let origin @ ('+' | '-' | ' ') = line.origin() {
            out.push(origin);
        }
        out.push_str(&String::from_utf8_lossy(line.content()));
        true
    })?;
    Ok(out)
}

impl GitClient for Git2Client {
    fn staged_diff(&self) -> SnagResult<String> {
        let cmd = "git diff --staged";
        let index = self.repo.index().map_err(|e| SnagError::git(cmd, e))?;
        let head_tree = self.head_tree();
        let diff = self
            .repo
            .diff_tree_to_index(head_tree.as_ref(), Some(&index), None)
            .map_err(|e| SnagError::git(cmd, e))?;
        render_patch(&diff).map_err(|e| SnagError::git(cmd, e))
    }

    fn commit_message(&self, sha: &str) -> SnagResult<String> {
        let commit = self.find_commit(sha, "git log -1 --format=%B")?;
        Ok(String::from_utf8_lossy(commit.message_bytes()).into_owned())
    }

    fn commit_subject(&self, sha: &str) -> SnagResult<String> {
        let commit = self.find_commit(sha, "git log -1 --format=%s")?;
        let subject = match commit.summary() {
            Some(summary) => summary.to_string(),
            None => String::from_utf8_lossy(commit.message_bytes())
                .lines()
                .next()
                .unwrap_or_default()
                .to_string(),
        };
        Ok(subject.trim().to_string())
    }

    fn commit_diff(&self, sha: &str) -> SnagResult<String> {
        let cmd = format!("git diff-tree -p {sha}");
        let commit = self.find_commit(sha, "git diff-tree -p")?;

        // Like diff-tree without -c, merges produce no patch.
        if commit.parent_count() > 1 {
            return Ok(String::new());
        }

        let tree = commit.tree().map_err(|e| SnagError::git(&cmd, e))?;
        let parent_tree = match commit.parent_count() {
            0 => None,
            _ => Some(
                commit
                    .parent(0)
                    .and_then(|p| p.tree())
                    .map_err(|e| SnagError::git(&cmd, e))?,
            ),
        };

        let diff = self
            .repo
            .diff_tree_to_tree(parent_tree.as_ref(), Some(&tree), None)
            .map_err(|e| SnagError::git(&cmd, e))?;
        render_patch(&diff).map_err(|e| SnagError::git(&cmd, e))
    }

    fn rev_list(&self, range: &str) -> SnagResult<Vec<String>> {
        let cmd = format!("git rev-list {range}");
        let git_err = |e| SnagError::git(&cmd, e);

        let mut walk = self.repo.revwalk().map_err(git_err)?;
        walk.set_sorting(Sort::TIME).map_err(git_err)?;

        if range.contains("..") {
            walk.push_range(range).map_err(git_err)?;
        } else {
            let commit = self
                .repo
                .revparse_single(range)
                .and_then(|obj| obj.peel_to_commit())
                .map_err(git_err)?;
            walk.push(commit.id()).map_err(git_err)?;
        }

        walk.map(|oid| oid.map(|id| id.to_string()).map_err(git_err))
            .collect()
    }

    fn has_head(&self) -> bool {
        self.repo
            .head()
            .and_then(|head| head.peel_to_commit())
            .is_ok()
    }

    fn has_upstream(&self) -> bool {
        self.repo.revparse_single("@{upstream}").is_ok()
    }

    fn current_branch(&self) -> SnagResult<String> {
        let cmd = "git symbolic-ref --short HEAD";
        match self.repo.head() {
            Ok(head) => {
                if !head.is_branch() {
                    return Err(SnagError::NotOnBranch);
                }
                head.shorthand()
                    .map(String::from)
                    .ok_or(SnagError::NotOnBranch)
            }
            // Before the first commit HEAD is a symbolic ref to a branch that
            // does not exist yet; the name is still meaningful.
            Err(e) if e.code() == ErrorCode::UnbornBranch => {
                let head = self
                    .repo
                    .find_reference("HEAD")
                    .map_err(|e| SnagError::git(cmd, e))?;
                head.symbolic_target()
                    .and_then(|target| target.strip_prefix("refs/heads/"))
                    .map(String::from)
                    .ok_or(SnagError::NotOnBranch)
            }
            Err(e) => Err(SnagError::git(cmd, e)),
        }
    }

    fn repo_root(&self) -> PathBuf {
        self.repo
            .workdir()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| self.repo.path().to_path_buf())
    }

    fn git_dir(&self) -> PathBuf {
        self.repo.path().to_path_buf()
    }
}
