// This file is the module declaration file for the `core` module.
// It declares the submodules that hold policy resolution and the git-backed
// checks, and exposes them to the rest of the crate.

// `config` module:
// Resolves the effective policy for a directory. It walks from the start
// directory to the filesystem root reading `snag.toml`, `snag-local.toml` or
// the legacy `.blocklist`, layers the `SNAG_*` environment overrides on top,
// and records every contributing source for `snag config`.
pub mod config;

// `engine` module:
// The policy checkers. Each hook phase (diff, msg, push, rebase) and the
// history audit live here, driven through the `GitClient` trait so they can
// run against a real repository or an in-memory fake.
pub mod engine;

// `error` module:
// Typed errors for configuration and git failures. Policy violations are
// not errors and never appear here.
pub mod error;

// `git` module:
// The `GitClient` trait and its `git2`-backed implementation.
pub mod git;

// `version` module:
// Running version and the `min_version` gate.
pub mod version;
