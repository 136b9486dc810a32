use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::builders::patterns::{PatternSet, Phase};
use crate::core::error::{SnagError, SnagResult};
use crate::core::version::{self, RUNNING_VERSION};

/// Structured policy file, discovered at every directory level.
pub const SNAG_TOML: &str = "snag.toml";
/// Personal, usually gitignored, companion to `snag.toml`. Additive only.
pub const SNAG_LOCAL_TOML: &str = "snag-local.toml";
/// Legacy flat pattern list.
pub const BLOCKLIST_FILE: &str = ".blocklist";

/// Protected branches used when no source names any.
pub const DEFAULT_PROTECTED_BRANCHES: [&str; 2] = ["main", "master"];

pub const ENV_PROTECTED_BRANCHES: &str = "SNAG_PROTECTED_BRANCHES";
pub const ENV_IGNORE: &str = "SNAG_IGNORE";
pub const ENV_BLOCKLIST: &str = "SNAG_BLOCKLIST";
pub const ENV_ALLOW_REBASE: &str = "SNAG_ALLOW_REBASE";
pub const ENV_TICKET_PATTERN: &str = "SNAG_TICKET_PATTERN";

/// Top-level structure of a `snag.toml` file.
///
/// Unknown keys and sections are ignored so older binaries can read newer
/// files (the `min_version` gate is the explicit way to refuse them).
#[derive(Debug, Default, Deserialize)]
pub struct SnagToml {
    pub min_version: Option<String>,
    #[serde(default)]
    pub block: BlockSection,
}

/// The `[block]` section: one pattern list per hook phase.
///
/// `push` distinguishes "key omitted" (`None`, inherit diff + msg) from an
/// explicit empty array (`Some(vec![])`, block nothing on push).
#[derive(Debug, Default, Deserialize)]
pub struct BlockSection {
    #[serde(default)]
    pub diff: Vec<String>,
    #[serde(default)]
    pub msg: Vec<String>,
    #[serde(default)]
    pub push: Option<Vec<String>>,
    #[serde(default)]
    pub branch: Vec<String>,
}

/// Snapshot of the environment variables the resolver consults.
///
/// Captured once per invocation so resolution itself never touches process
/// state.
#[derive(Debug, Clone, Default)]
pub struct Environment {
    pub protected_branches: Option<String>,
    pub ignore: Option<String>,
    pub blocklist: Option<String>,
    /// `SNAG_ALLOW_REBASE=1`: the pre-rebase guard lets everything through.
    pub allow_rebase: bool,
    pub ticket_pattern: Option<String>,
}

impl Environment {
    pub fn from_process() -> Self {
        let read = |key: &str| std::env::var(key).ok().filter(|v| !v.is_empty());
        Self {
            protected_branches: read(ENV_PROTECTED_BRANCHES),
            ignore: read(ENV_IGNORE),
            blocklist: read(ENV_BLOCKLIST),
            allow_rebase: read(ENV_ALLOW_REBASE).is_some_and(|v| v == "1"),
            ticket_pattern: read(ENV_TICKET_PATTERN),
        }
    }
}

/// Where a [`ConfigSource`] came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    Structured,
    Legacy,
    Environment,
    Default,
    Suppression,
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SourceKind::Structured => "toml",
            SourceKind::Legacy => "blocklist",
            SourceKind::Environment => "env",
            SourceKind::Default => "default",
            SourceKind::Suppression => "suppression",
        };
        f.write_str(name)
    }
}

/// One `SNAG_IGNORE` entry: a whole phase, or one pattern within it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Suppression {
    pub phase: Phase,
    pub pattern: Option<String>,
}

impl fmt::Display for Suppression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.pattern {
            Some(pattern) => write!(f, "{}:{}", self.phase, pattern),
            None => write!(f, "{}", self.phase),
        }
    }
}

/// A single contribution to the resolved policy, kept for provenance.
///
/// Values are raw (case as written). Normalization happens once, at the end
/// of resolution.
#[derive(Debug, Clone)]
pub struct ConfigSource {
    pub label: String,
    pub kind: SourceKind,
    pub diff: Vec<String>,
    pub msg: Vec<String>,
    pub push: Option<Vec<String>>,
    pub branch: Vec<String>,
    pub suppressions: Vec<Suppression>,
}

impl ConfigSource {
    fn new(label: impl Into<String>, kind: SourceKind) -> Self {
        Self {
            label: label.into(),
            kind,
            diff: Vec::new(),
            msg: Vec::new(),
            push: None,
            branch: Vec::new(),
            suppressions: Vec::new(),
        }
    }

    fn is_empty(&self) -> bool {
        self.diff.is_empty()
            && self.msg.is_empty()
            && self.push.is_none()
            && self.branch.is_empty()
            && self.suppressions.is_empty()
    }
}

/// The final per-invocation policy: four normalized, deduplicated lists.
///
/// Diff, msg and push patterns are lowercase. Branch patterns keep their case
/// because git branch names are case-sensitive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPolicy {
    diff: PatternSet,
    msg: PatternSet,
    push: Option<PatternSet>,
    branch: PatternSet,
}

impl ResolvedPolicy {
    /// Builds a policy from raw lists, applying the normalization rules.
    pub fn from_parts<D, M, P, B>(diff: D, msg: M, push: Option<P>, branch: B) -> Self
    where
        D: IntoIterator,
        D::Item: AsRef<str>,
        M: IntoIterator,
        M::Item: AsRef<str>,
        P: IntoIterator,
        P::Item: AsRef<str>,
        B: IntoIterator,
        B::Item: AsRef<str>,
    {
        fn lowered<I>(items: I) -> PatternSet
        where
            I: IntoIterator,
            I::Item: AsRef<str>,
        {
            items.into_iter().map(|p| p.as_ref().to_lowercase()).collect()
        }

        Self {
            diff: lowered(diff),
            msg: lowered(msg),
            push: push.map(lowered),
            branch: branch.into_iter().map(|b| b.as_ref().to_string()).collect(),
        }
    }

    pub fn diff_patterns(&self) -> &PatternSet {
        &self.diff
    }

    pub fn msg_patterns(&self) -> &PatternSet {
        &self.msg
    }

    /// The push list as configured; `None` when no source set it.
    pub fn explicit_push_patterns(&self) -> Option<&PatternSet> {
        self.push.as_ref()
    }

    /// Push patterns in effect: the explicit list, or the union of diff and
    /// msg when push was never set.
    pub fn push_patterns(&self) -> PatternSet {
        match &self.push {
            Some(push) => push.clone(),
            None => self.diff.union(&self.msg),
        }
    }

    pub fn branch_patterns(&self) -> &PatternSet {
        &self.branch
    }

    pub fn has_any_patterns(&self) -> bool {
        !self.diff.is_empty()
            || !self.msg.is_empty()
            || self.push.as_ref().is_some_and(|p| !p.is_empty())
            || !self.branch.is_empty()
    }

    /// Serializable view with push resolved to its effective value.
    pub fn export(&self) -> PolicyExport<'_> {
        PolicyExport {
            diff: &self.diff,
            msg: &self.msg,
            push: self.push_patterns(),
            push_inherited: self.push.is_none(),
            branch: &self.branch,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct PolicyExport<'a> {
    pub diff: &'a PatternSet,
    pub msg: &'a PatternSet,
    pub push: PatternSet,
    pub push_inherited: bool,
    pub branch: &'a PatternSet,
}

/// Which file family the directory walk has committed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WalkMode {
    Undecided,
    Structured,
    Legacy,
}

/// Raw lists accumulated while folding sources, before normalization.
#[derive(Debug, Default)]
struct Accumulator {
    diff: Vec<String>,
    msg: Vec<String>,
    push: Option<Vec<String>>,
    branch: Vec<String>,
}

impl Accumulator {
    fn apply(&mut self, source: &ConfigSource) {
        self.diff.extend(source.diff.iter().cloned());
        self.msg.extend(source.msg.iter().cloned());
        self.branch.extend(source.branch.iter().cloned());

        if let Some(push) = &source.push {
            // The first explicit setter makes push "set"; later ones append.
            self.push
                .get_or_insert_with(Vec::new)
                .extend(push.iter().cloned());
        } else if source.kind == SourceKind::Environment
            && let Some(push) = self.push.as_mut()
        {
            // SNAG_BLOCKLIST reaches push only when push is already explicit;
            // otherwise push keeps inheriting diff + msg, which include it.
            push.extend(source.diff.iter().cloned());
        }
    }

    fn suppress(&mut self, suppression: &Suppression) {
        let Suppression { phase, pattern } = suppression;

        if *phase == Phase::Push && self.push.is_none() {
            // Materialize the inherited union so the suppression has
            // something concrete to act on.
            let mut union = self.diff.clone();
            union.extend(self.msg.iter().cloned());
            self.push = Some(union);
        }

        let list = match phase {
            Phase::Diff => &mut self.diff,
            Phase::Msg => &mut self.msg,
            Phase::Branch => &mut self.branch,
            Phase::Push => self.push.get_or_insert_with(Vec::new),
        };

        match pattern {
            None => list.clear(),
            Some(pattern) => {
                let needle = pattern.to_lowercase();
                list.retain(|p| p.to_lowercase() != needle);
            }
        }
    }

    fn into_policy(self) -> ResolvedPolicy {
        ResolvedPolicy::from_parts(self.diff, self.msg, self.push, self.branch)
    }
}

/// Resolves the policy that applies to a starting directory.
///
/// Construct with the directory and an [`Environment`] snapshot, optionally
/// add an explicit `--blocklist` override, then call [`ConfigResolver::resolve`]
/// or [`ConfigResolver::collect_sources`].
#[derive(Debug, Clone)]
pub struct ConfigResolver {
    start_dir: PathBuf,
    override_path: Option<PathBuf>,
    env: Environment,
    running_version: String,
}

impl ConfigResolver {
    pub fn new(start_dir: impl Into<PathBuf>, env: Environment) -> Self {
        Self {
            start_dir: start_dir.into(),
            override_path: None,
            env,
            running_version: RUNNING_VERSION.to_string(),
        }
    }

    pub fn with_override(mut self, path: Option<PathBuf>) -> Self {
        self.override_path = path;
        self
    }

    pub fn with_running_version(mut self, version: impl Into<String>) -> Self {
        self.running_version = version.into();
        self
    }

    /// Produces the final policy. Suppression is applied after every other
    /// source, then all lists are normalized.
    pub fn resolve(&self) -> SnagResult<ResolvedPolicy> {
        let sources = self.collect_sources()?;

        let mut acc = Accumulator::default();
        let mut suppressions = Vec::new();
        for source in &sources {
            if source.kind == SourceKind::Suppression {
                suppressions.extend(source.suppressions.iter());
            } else {
                acc.apply(source);
            }
        }

        // Push entries go last so an inherited push list is materialized
        // from diff and msg after their own suppressions, whatever the
        // entry order.
        suppressions.sort_by_key(|s| s.phase == Phase::Push);
        for suppression in suppressions {
            tracing::debug!(%suppression, "applying suppression");
            acc.suppress(suppression);
        }

        let policy = acc.into_policy();
        tracing::debug!(
            diff = policy.diff.len(),
            msg = policy.msg.len(),
            push_explicit = policy.push.is_some(),
            branch = policy.branch.len(),
            "resolved policy"
        );
        Ok(policy)
    }

    /// Gathers every contributing source in precedence order, with labels.
    pub fn collect_sources(&self) -> SnagResult<Vec<ConfigSource>> {
        let mut sources = match &self.override_path {
            Some(path) => vec![self.override_source(path)?],
            None => self.walk_sources()?,
        };

        if let Some(raw) = &self.env.blocklist {
            let patterns = parse_env_blocklist(raw);
            if !patterns.is_empty() {
                let mut source = ConfigSource::new(ENV_BLOCKLIST, SourceKind::Environment);
                source.msg = patterns.clone();
                source.diff = patterns;
                sources.push(source);
            }
        }

        if let Some(raw) = &self.env.protected_branches {
            let branches = split_list(raw);
            if !branches.is_empty() {
                let mut source =
                    ConfigSource::new(ENV_PROTECTED_BRANCHES, SourceKind::Environment);
                source.branch = branches;
                sources.push(source);
            }
        }

        if sources.iter().all(|s| s.branch.is_empty()) {
            let mut source = ConfigSource::new("defaults", SourceKind::Default);
            source.branch = DEFAULT_PROTECTED_BRANCHES.map(String::from).to_vec();
            sources.push(source);
        }

        if let Some(raw) = &self.env.ignore {
            let suppressions = parse_suppressions(raw);
            if !suppressions.is_empty() {
                let mut source = ConfigSource::new(ENV_IGNORE, SourceKind::Suppression);
                source.suppressions = suppressions;
                sources.push(source);
            }
        }

        Ok(sources)
    }

    /// The `--blocklist` file: one flat list assigned to diff, msg and push,
    /// with push explicitly set even when the file is missing or empty.
    fn override_source(&self, path: &Path) -> SnagResult<ConfigSource> {
        let patterns = load_blocklist(path)?;
        let mut source = ConfigSource::new(display_label(path), SourceKind::Legacy);
        source.diff = patterns.clone();
        source.msg = patterns.clone();
        source.push = Some(patterns);
        Ok(source)
    }

    /// Single-pass walk from the start directory to the filesystem root.
    ///
    /// The first level holding any recognized file fixes the mode; after that
    /// only files of that family are read.
    fn walk_sources(&self) -> SnagResult<Vec<ConfigSource>> {
        let start = std::path::absolute(&self.start_dir).map_err(|source| {
            SnagError::ConfigRead {
                path: self.start_dir.clone(),
                source,
            }
        })?;

        let mut mode = WalkMode::Undecided;
        let mut sources = Vec::new();

        for dir in start.ancestors() {
            let toml_path = dir.join(SNAG_TOML);
            let local_path = dir.join(SNAG_LOCAL_TOML);
            let blocklist_path = dir.join(BLOCKLIST_FILE);

            let has_toml = toml_path.is_file();
            let has_local = local_path.is_file();
            let has_blocklist = blocklist_path.is_file();

            if mode == WalkMode::Undecided {
                if has_toml || has_local {
                    tracing::debug!(dir = %dir.display(), "walk committed to snag.toml mode");
                    mode = WalkMode::Structured;
                } else if has_blocklist {
                    tracing::debug!(dir = %dir.display(), "walk committed to .blocklist mode");
                    mode = WalkMode::Legacy;
                }
            }

            match mode {
                WalkMode::Undecided => {}
                WalkMode::Structured => {
                    for (exists, path) in [(has_toml, &toml_path), (has_local, &local_path)] {
                        if exists {
                            let source = self.toml_source(path)?;
                            if !source.is_empty() {
                                sources.push(source);
                            }
                        }
                    }
                }
                WalkMode::Legacy => {
                    if has_blocklist {
                        let patterns = load_blocklist(&blocklist_path)?;
                        if !patterns.is_empty() {
                            let mut source =
                                ConfigSource::new(display_label(&blocklist_path), SourceKind::Legacy);
                            source.diff = patterns.clone();
                            source.msg = patterns.clone();
                            source.push = Some(patterns);
                            sources.push(source);
                        }
                    }
                }
            }
        }

        Ok(sources)
    }

    fn toml_source(&self, path: &Path) -> SnagResult<ConfigSource> {
        let cfg = load_snag_toml(path)?;
        if let Some(required) = &cfg.min_version {
            version::check_min_version(required, &self.running_version, path)?;
        }

        let mut source = ConfigSource::new(display_label(path), SourceKind::Structured);
        source.diff = cfg.block.diff;
        source.msg = cfg.block.msg;
        source.push = cfg.block.push;
        source.branch = cfg.block.branch;
        Ok(source)
    }
}

/// Convenience wrapper around [`ConfigResolver`].
pub fn resolve(
    start_dir: &Path,
    override_path: Option<&Path>,
    env: &Environment,
) -> SnagResult<ResolvedPolicy> {
    ConfigResolver::new(start_dir, env.clone())
        .with_override(override_path.map(Path::to_path_buf))
        .resolve()
}

/// Parses one `snag.toml`. A missing file is an empty config.
pub fn load_snag_toml(path: &Path) -> SnagResult<SnagToml> {
    let Some(content) = read_optional(path)? else {
        return Ok(SnagToml::default());
    };
    let cfg: SnagToml = toml::from_str(&content).map_err(|source| SnagError::ConfigParse {
        path: path.to_path_buf(),
        source,
    })?;
    tracing::debug!(path = %path.display(), "loaded snag.toml");
    Ok(cfg)
}

/// Reads a legacy blocklist: one pattern per line, blank lines and `#`
/// comments skipped, everything lowercased. A missing file is empty.
pub fn load_blocklist(path: &Path) -> SnagResult<Vec<String>> {
    let Some(content) = read_optional(path)? else {
        return Ok(Vec::new());
    };
    tracing::debug!(path = %path.display(), "loaded blocklist");
    Ok(content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_lowercase)
        .collect())
}

fn read_optional(path: &Path) -> SnagResult<Option<String>> {
    match fs::read_to_string(path) {
        Ok(content) => Ok(Some(content)),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(source) => Err(SnagError::ConfigRead {
            path: path.to_path_buf(),
            source,
        }),
    }
}

fn display_label(path: &Path) -> String {
    std::path::absolute(path)
        .unwrap_or_else(|_| path.to_path_buf())
        .display()
        .to_string()
}

/// Splits a comma-separated list, trimming entries and dropping empty ones.
fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

/// `SNAG_BLOCKLIST`: newline- or colon-separated patterns, `#` comments
/// skipped, lowercased.
fn parse_env_blocklist(raw: &str) -> Vec<String> {
    raw.split(['\n', ':'])
        .map(str::trim)
        .filter(|s| !s.is_empty() && !s.starts_with('#'))
        .map(str::to_lowercase)
        .collect()
}

/// `SNAG_IGNORE`: comma-separated `phase` or `phase:pattern` entries.
/// Entries naming an unknown phase, or with an empty pattern, are skipped.
pub fn parse_suppressions(raw: &str) -> Vec<Suppression> {
    let mut out = Vec::new();
    for entry in split_list(raw) {
        let (phase, pattern) = match entry.split_once(':') {
            Some((phase, pattern)) => (phase, Some(pattern.trim())),
            None => (entry.as_str(), None),
        };

        let phase = match phase.parse::<Phase>() {
            Ok(phase) => phase,
            Err(e) => {
                tracing::warn!(entry = %entry, "{ENV_IGNORE}: {e}");
                continue;
            }
        };

        match pattern {
            Some("") => {
                tracing::warn!(entry = %entry, "{ENV_IGNORE}: empty pattern, entry skipped");
            }
            pattern => out.push(Suppression {
                phase,
                pattern: pattern.map(String::from),
            }),
        }
    }
    out
}
