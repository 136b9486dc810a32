use regex::Regex;

use crate::core::config::ENV_TICKET_PATTERN;

/// Matches the number in branch names like `feat/123-login`.
pub const DEFAULT_TICKET_PATTERN: &str = r"(\d+)-";

/// Compiles the ticket pattern, falling back to the default when `custom` is
/// unset, empty, or not a valid regex.
pub fn ticket_regex(custom: Option<&str>) -> Result<Regex, regex::Error> {
    if let Some(pattern) = custom.filter(|p| !p.is_empty()) {
        match Regex::new(pattern) {
            Ok(re) => return Ok(re),
            Err(e) => {
                tracing::warn!(pattern, error = %e, "invalid {ENV_TICKET_PATTERN}, using default")
            }
        }
    }
    Regex::new(DEFAULT_TICKET_PATTERN)
}

/// The first capture group when it matched something, otherwise the whole
/// match.
pub fn extract_ticket(branch: &str, re: &Regex) -> Option<String> {
    let caps = re.captures(branch)?;
    caps.get(1)
        .filter(|m| !m.as_str().is_empty())
        .or_else(|| caps.get(0))
        .map(|m| m.as_str().to_string())
}

/// Prepends `#<ticket> ` to the first line. Returns `None` when the message
/// already mentions the ticket.
pub fn prefix_message(message: &str, ticket: &str) -> Option<String> {
    let prefix = format!("#{ticket}");
    if message.contains(&prefix) {
        return None;
    }
    Some(format!("{prefix} {message}"))
}

/// prepare-commit-msg sources that already carry a finished message.
pub fn skips_source(source: Option<&str>) -> bool {
    matches!(source, Some("merge" | "squash" | "commit"))
}
