use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

/// Marker line identifying scripts written by `snag install`.
const HOOK_MARKER: &str = "# snag - git hook policy kit";

const PRE_COMMIT_HOOK: &str = r#"#!/bin/sh
# snag - git hook policy kit
# Check staged changes against block patterns

if ! command -v snag > /dev/null 2>&1; then
    echo "Warning: snag not found in PATH"
    exit 0
fi

exec snag check diff
"#;

const COMMIT_MSG_HOOK: &str = r#"#!/bin/sh
# snag - git hook policy kit
# Strip matching trailers, then check the commit message

if ! command -v snag > /dev/null 2>&1; then
    echo "Warning: snag not found in PATH"
    exit 0
fi

exec snag check msg "$1"
"#;

const PRE_PUSH_HOOK: &str = r#"#!/bin/sh
# snag - git hook policy kit
# Check every unpushed commit before it leaves the machine

if ! command -v snag > /dev/null 2>&1; then
    echo "Warning: snag not found in PATH"
    exit 0
fi

exec snag check push
"#;

const PRE_REBASE_HOOK: &str = r#"#!/bin/sh
# snag - git hook policy kit
# Refuse to rebase protected branches (override: SNAG_ALLOW_REBASE=1)

if ! command -v snag > /dev/null 2>&1; then
    echo "Warning: snag not found in PATH"
    exit 0
fi

exec snag check rebase "$@"
"#;

const PREPARE_COMMIT_MSG_HOOK: &str = r#"#!/bin/sh
# snag - git hook policy kit
# Prefix the commit message with the ticket from the branch name

if ! command -v snag > /dev/null 2>&1; then
    exit 0
fi

exec snag prepare "$@"
"#;

/// Hooks `snag install` writes, in install order.
pub const HOOKS: [(&str, &str); 5] = [
    ("pre-commit", PRE_COMMIT_HOOK),
    ("commit-msg", COMMIT_MSG_HOOK),
    ("pre-push", PRE_PUSH_HOOK),
    ("pre-rebase", PRE_REBASE_HOOK),
    ("prepare-commit-msg", PREPARE_COMMIT_MSG_HOOK),
];

/// Hooks whose presence means snag enforcement is wired up.
const ENFORCING_HOOKS: [&str; 3] = ["pre-commit", "commit-msg", "pre-push"];

const LEFTHOOK_CONFIGS: [&str; 2] = ["lefthook.yml", "lefthook-local.yml"];

/// What happened to one hook during install.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HookInstall {
    Installed,
    AlreadyInstalled,
    /// A foreign hook was moved to `<name>.backup` first.
    BackedUp,
}

/// Writes the snag hook scripts into `git_dir/hooks`.
///
/// Existing snag hooks are left alone; anything else is renamed to
/// `<name>.backup` before the snag script is written.
pub fn install_git_hooks(git_dir: &Path) -> Result<Vec<(&'static str, HookInstall)>> {
    let hooks_dir = git_dir.join("hooks");
    fs::create_dir_all(&hooks_dir)
        .with_context(|| format!("creating {}", hooks_dir.display()))?;

    let mut results = Vec::with_capacity(HOOKS.len());
    for (name, content) in HOOKS {
        results.push((name, install_hook(&hooks_dir, name, content)?));
    }
    Ok(results)
}

fn install_hook(hooks_dir: &Path, hook_name: &str, hook_content: &str) -> Result<HookInstall> {
    let hook_path = hooks_dir.join(hook_name);
    let mut status = HookInstall::Installed;

    if hook_path.exists() {
        let existing_content = fs::read_to_string(&hook_path)
            .with_context(|| format!("reading {}", hook_path.display()))?;
        if existing_content.contains(HOOK_MARKER) {
            return Ok(HookInstall::AlreadyInstalled);
        }

        let backup_path = hooks_dir.join(format!("{hook_name}.backup"));
        fs::rename(&hook_path, &backup_path)
            .with_context(|| format!("backing up {}", hook_path.display()))?;
        status = HookInstall::BackedUp;
    }

    fs::write(&hook_path, hook_content)
        .with_context(|| format!("writing {}", hook_path.display()))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let mut perms = fs::metadata(&hook_path)?.permissions();
        perms.set_mode(0o755);
        fs::set_permissions(&hook_path, perms)?;
    }

    tracing::debug!(hook = hook_name, ?status, "hook written");
    Ok(status)
}

/// Reports whether snag enforcement is wired into this repository, either
/// through a lefthook config that mentions snag or through direct hook
/// scripts that call it.
pub fn hooks_installed(repo_root: &Path, git_dir: &Path) -> bool {
    let lefthook = LEFTHOOK_CONFIGS.iter().any(|name| {
        fs::read_to_string(repo_root.join(name))
            .map(|data| data.contains("snag"))
            .unwrap_or(false)
    });
    if lefthook {
        return true;
    }

    ENFORCING_HOOKS.iter().any(|name| {
        fs::read_to_string(git_dir.join("hooks").join(name))
            .map(|data| data.contains("snag"))
            .unwrap_or(false)
    })
}
