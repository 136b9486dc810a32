/// The snag version that introduced `snag.toml`; generated files require it.
pub const MIN_VERSION_FOR_INIT: &str = "0.10.0";

/// Starter `snag.toml` written by `snag init` when there is nothing to import.
pub fn default_snag_toml() -> String {
    format!(
        r#"min_version = "{MIN_VERSION_FOR_INIT}"

[block]
diff = [
  "DO NOT MERGE",
  "DO NOT COMMIT",
  "FIXME",
  "HACK",
]
msg = [
  "DO NOT MERGE",
  "FIXME",
  "WIP",
  "fixup!",
  "squash!",
]
# push: omit to inherit diff + msg patterns as a safety net
branch = ["main", "master"]
"#
    )
}

/// Converts legacy `.blocklist` patterns into an equivalent `snag.toml`.
///
/// The flat list seeds both `diff` and `msg`; `push` is left out so it keeps
/// inheriting their union, which is what the legacy file enforced.
pub fn snag_toml_from_blocklist(patterns: &[String]) -> String {
    let mut out = String::new();
    out.push_str(&format!("min_version = {}\n", quote(MIN_VERSION_FOR_INIT)));
    out.push('\n');
    out.push_str("[block]\n");

    let list: String = patterns
        .iter()
        .map(|p| format!("  {},\n", quote(p)))
        .collect();

    out.push_str(&format!("diff = [\n{list}]\n"));
    out.push_str(&format!("msg = [\n{list}]\n"));
    out.push_str("# push: omit to inherit diff + msg patterns as a safety net\n");
    out.push_str("branch = [\"main\", \"master\"]\n");
    out
}

/// TOML basic-string quoting.
fn quote(value: &str) -> String {
    toml::Value::String(value.to_string()).to_string()
}
