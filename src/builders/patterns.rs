use glob::{MatchOptions, Pattern};
use serde::{Serialize, Serializer};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

/// The hook moments a pattern set independently governs.
///
/// Each variant owns one list in the resolved policy. The string forms
/// (`diff`, `msg`, `push`, `branch`) are the names used in `snag.toml`,
/// in `SNAG_IGNORE` entries and in diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    /// Staged changes, checked from the `pre-commit` hook.
    Diff,
    /// Commit messages, checked from the `commit-msg` hook.
    Msg,
    /// Every unpushed commit, checked from the `pre-push` hook.
    Push,
    /// Protected branch names, checked from the `pre-rebase` hook.
    Branch,
}

impl Phase {
    pub const ALL: [Phase; 4] = [Phase::Diff, Phase::Msg, Phase::Push, Phase::Branch];

    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Diff => "diff",
            Phase::Msg => "msg",
            Phase::Push => "push",
            Phase::Branch => "branch",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Phase {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "diff" => Ok(Phase::Diff),
            "msg" => Ok(Phase::Msg),
            "push" => Ok(Phase::Push),
            "branch" => Ok(Phase::Branch),
            other => Err(format!("unknown phase: {other}")),
        }
    }
}

/// An insertion-ordered set of patterns.
///
/// The first pattern in list order that matches is the one reported, so the
/// set keeps a `Vec` for order and a `HashSet` for membership instead of
/// relying on hash iteration order.
#[derive(Debug, Clone, Default)]
pub struct PatternSet {
    items: Vec<String>,
    seen: HashSet<String>,
}

impl PatternSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts `pattern` unless it is already present. Returns `true` when the
    /// pattern was new.
    pub fn insert(&mut self, pattern: impl Into<String>) -> bool {
        let pattern = pattern.into();
        if self.seen.contains(&pattern) {
            return false;
        }
        self.seen.insert(pattern.clone());
        self.items.push(pattern);
        true
    }

    pub fn contains(&self, pattern: &str) -> bool {
        self.seen.contains(pattern)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, String> {
        self.items.iter()
    }

    pub fn as_slice(&self) -> &[String] {
        &self.items
    }

    /// Union of `self` followed by `other`, keeping first-occurrence order.
    pub fn union(&self, other: &PatternSet) -> PatternSet {
        self.iter().chain(other.iter()).cloned().collect()
    }
}

impl PartialEq for PatternSet {
    fn eq(&self, other: &Self) -> bool {
        self.items == other.items
    }
}

impl Eq for PatternSet {}

impl<S: Into<String>> FromIterator<S> for PatternSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut set = PatternSet::new();
        set.extend(iter);
        set
    }
}

impl<S: Into<String>> Extend<S> for PatternSet {
    fn extend<I: IntoIterator<Item = S>>(&mut self, iter: I) {
        for pattern in iter {
            self.insert(pattern);
        }
    }
}

impl<'a> IntoIterator for &'a PatternSet {
    type Item = &'a String;
    type IntoIter = std::slice::Iter<'a, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

impl Serialize for PatternSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.items.serialize(serializer)
    }
}

/// The `PatternMatcher` trait lets checkers ask any pattern collection for its
/// first match without caring how the patterns are stored.
pub trait PatternMatcher {
    /// Returns the first pattern, in list order, contained in `text`.
    ///
    /// Patterns are expected to be lowercase already; the haystack is
    /// lowercased once before the scan.
    fn first_match(&self, text: &str) -> Option<&str>;
}

impl PatternMatcher for [String] {
    fn first_match(&self, text: &str) -> Option<&str> {
        match_pattern(text, self)
    }
}

impl PatternMatcher for PatternSet {
    fn first_match(&self, text: &str) -> Option<&str> {
        match_pattern(text, self.as_slice())
    }
}

/// Case-insensitive substring match.
///
/// Lowercases `text` once and scans `patterns` in order, returning the first
/// pattern that is a substring of the lowercased text. An empty pattern list
/// never matches.
///
/// # Arguments
/// * `text`: The haystack (diff, commit message, branch name).
/// * `patterns`: Lowercase patterns in configured order.
///
/// # Returns
/// `Some(pattern)` for the first hit, `None` otherwise.
pub fn match_pattern<'a>(text: &str, patterns: &'a [String]) -> Option<&'a str> {
    if patterns.is_empty() {
        return None;
    }
    let lower = text.to_lowercase();
    patterns
        .iter()
        .find(|p| lower.contains(p.as_str()))
        .map(String::as_str)
}

/// Removes later duplicates, keeping the position of each first occurrence.
pub fn deduplicate<I, S>(patterns: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let set: PatternSet = patterns.into_iter().collect();
    set.items
}

/// Removes unified diff structural lines so only content lines remain.
///
/// File names live in `diff --git`, `---`/`+++`, rename and copy headers; a
/// file named `secret.env` must not trip a `secret` pattern just by being part
/// of the diff.
pub fn strip_diff_metadata(diff: &str) -> String {
    diff.split('\n')
        .filter(|line| !is_diff_metadata(line))
        .collect::<Vec<_>>()
        .join("\n")
}

fn is_diff_metadata(line: &str) -> bool {
    const PREFIXES: &[&str] = &[
        "diff --git ",
        "--- a/",
        "+++ b/",
        "rename from ",
        "rename to ",
        "copy from ",
        "copy to ",
        "index ",
        "@@ ",
        "old mode ",
        "new mode ",
        "new file mode ",
        "deleted file mode ",
        "similarity index ",
        "dissimilarity index ",
        "Binary files ",
    ];

    line == "--- /dev/null"
        || line == "+++ /dev/null"
        || PREFIXES.iter().any(|prefix| line.starts_with(prefix))
}

/// Keeps only `+` lines of metadata-stripped diff content, prefix removed.
///
/// Context and removed lines are dropped: deleting a blocked string must not
/// re-trigger the policy that asked for its removal.
pub fn strip_to_added_lines(content: &str) -> String {
    content
        .split('\n')
        .filter_map(|line| line.strip_prefix('+'))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Reports whether `line` is a git trailer (`Key: Value`).
///
/// Structural test only: no leading whitespace, a `": "` separator, and no
/// space inside the key. `Signed-off-by: X` qualifies, body prose such as
/// `Note that: x` does not.
pub fn is_trailer_line(line: &str) -> bool {
    if line.is_empty() || line.starts_with([' ', '\t']) {
        return false;
    }
    match line.find(": ") {
        Some(idx) if idx >= 1 => !line[..idx].contains(' '),
        _ => false,
    }
}

/// Reports whether `branch` is protected by any of `patterns`.
///
/// Each pattern is tried as an exact name first, then as a glob where `*`
/// does not cross `/` (so `release/*` covers `release/1.0` but not
/// `release/1.0/hotfix`). Malformed globs only ever match exactly.
pub fn is_protected(branch: &str, patterns: &[String]) -> bool {
    let options = MatchOptions {
        case_sensitive: true,
        require_literal_separator: true,
        require_literal_leading_dot: false,
    };

    patterns.iter().any(|p| {
        branch == p
            || Pattern::new(p)
                .map(|glob| glob.matches_with(branch, options))
                .unwrap_or(false)
    })
}
