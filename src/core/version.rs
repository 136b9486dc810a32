use std::path::Path;

use crate::core::error::{SnagError, SnagResult};

/// Version of the running binary, taken from Cargo.toml at compile time.
pub const RUNNING_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Unreleased builds (`dev`, or any pre-release like `0.13.0-dev.1`) skip the
/// `min_version` gate.
pub fn is_development_build(version: &str) -> bool {
    let v = normalize_version(version);
    v == "dev" || v.starts_with("dev+") || v.contains('-')
}

/// Normalize versions for comparison: trims, drops a leading `v`, lowercases.
fn normalize_version(version: &str) -> String {
    version
        .trim()
        .trim_start_matches(['v', 'V'])
        .to_ascii_lowercase()
}

/// Parses `major[.minor[.patch]]`, ignoring build metadata after `+`.
/// Missing components count as zero.
fn parse_version(version: &str) -> Option<[u64; 3]> {
    let normalized = normalize_version(version);
    let core = normalized.split(['+', '-']).next()?;
    if core.is_empty() {
        return None;
    }

    let mut parts = [0u64; 3];
    for (i, component) in core.split('.').enumerate() {
        if i >= parts.len() {
            return None;
        }
        parts[i] = component.parse().ok()?;
    }
    Some(parts)
}

/// Fails when `running` is older than the `required` minimum declared in the
/// config file at `path`.
///
/// Development builds always pass. An unparsable `required` is a config error.
pub fn check_min_version(required: &str, running: &str, path: &Path) -> SnagResult<()> {
    let Some(required_parts) = parse_version(required) else {
        return Err(SnagError::InvalidVersion {
            path: path.to_path_buf(),
            value: required.to_string(),
        });
    };

    if is_development_build(running) {
        tracing::debug!(required, running, "development build, skipping min_version");
        return Ok(());
    }

    // A running version we cannot read is treated like a dev build.
    let Some(running_parts) = parse_version(running) else {
        tracing::warn!(running, "unrecognised running version, skipping min_version");
        return Ok(());
    };

    if running_parts < required_parts {
        return Err(SnagError::VersionTooOld {
            path: path.to_path_buf(),
            required: required.to_string(),
            running: running.to_string(),
        });
    }
    Ok(())
}
