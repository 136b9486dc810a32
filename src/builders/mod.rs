// This file is the module declaration file for the `builders` module.
// It declares and makes public the leaf building blocks the checks and
// commands are assembled from.

// The `pub mod hooks;` declaration exposes the `hooks` module.
//
// `hooks` module:
// Writes the snag hook scripts into `.git/hooks` (pre-commit, commit-msg,
// pre-push, pre-rebase, prepare-commit-msg), backing up any foreign hook it
// replaces. It also detects whether snag is already wired in, either through
// those scripts or through a lefthook config.
pub mod hooks;

// The `pub mod importer;` declaration exposes the `importer` module.
//
// `importer` module:
// Generates `snag.toml` content for `snag init`, either a starter policy or
// one converted from the patterns of a legacy `.blocklist`.
pub mod importer;

// The `pub mod patterns;` declaration exposes the `patterns` module.
//
// `patterns` module:
// The matching primitives. It defines the hook `Phase`, the ordered
// deduplicating `PatternSet`, case-insensitive substring matching through
// the `PatternMatcher` trait, unified-diff metadata stripping, trailer
// detection and protected-branch glob matching.
pub mod patterns;

// The `pub mod reporter;` declaration exposes the `reporter` module.
//
// `reporter` module:
// Human-readable terminal output. It defines the `Reporter` trait and its
// `ConsoleReporter` implementation, which prints violations, audit reports
// and config provenance.
pub mod reporter;
