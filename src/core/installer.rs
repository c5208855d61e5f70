//! Hook installer.
//!
//! Writes enforcement scripts into `.git/hooks` under strict checks:
//! closed hook-name set, size ceiling, interpreter allow-list, path
//! confinement, and an ownership marker so foreign hooks are never
//! silently destroyed. Replacing a foreign hook requires `force`,
//! explicit consent, and a timestamped backup of the whole hook
//! directory taken before anything destructive happens.

use crate::core::audit;
use crate::core::error::GuardianError;
use crate::core::git;
use crate::core::paths::{self, HookName};
use regex::Regex;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

/// Marker embedded in every installed hook identifying hookguard as the
/// installer. Uninstall refuses to touch files that lack it.
pub const OWNERSHIP_MARKER: &str = "# HOOKGUARD-MANAGED";

/// Ceiling on hook script size. Bounds parse/execution cost and blocks
/// trivially oversized payloads.
pub const MAX_HOOK_SIZE: usize = 16 * 1024;

/// Interpreters an installed hook may declare.
const ALLOWED_INTERPRETERS: [&str; 2] = ["/bin/sh", "/bin/bash"];
const ALLOWED_ENV_INTERPRETERS: [&str; 3] = ["sh", "bash", "python3"];

#[derive(Debug, Clone, Copy, Default)]
pub struct InstallOptions {
    /// Replace an existing hook (after backup).
    pub force: bool,
    /// Skip the interactive confirmation when replacing a foreign hook.
    pub assume_yes: bool,
}

/// Destination path for a hook, validated to be confined to the hook
/// directory.
fn hook_destination(repo_root: &Path, hook: HookName) -> Result<PathBuf, GuardianError> {
    let hooks_dir = git::hooks_dir(repo_root);
    fs::create_dir_all(&hooks_dir)?;

    let file_name = hook.file_name();
    paths::validate_no_traversal(&file_name).inspect_err(|_| {
        let _ = audit::record(repo_root, "path_traversal", &file_name, None);
    })?;

    let candidate = hooks_dir.join(&file_name);
    paths::validate_confined(&candidate, &hooks_dir).inspect_err(|_| {
        let _ = audit::record(repo_root, "path_traversal", &file_name, Some(&candidate));
    })
}

static SHEBANG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^#!\s*(\S+)(?:\s+(\S+))?").expect("static regex"));

/// Validate the script's interpreter declaration against the allow-list.
fn validate_interpreter(content: &str) -> Result<(), GuardianError> {
    let first_line = content.lines().next().unwrap_or_default();
    let caps = SHEBANG
        .captures(first_line)
        .ok_or_else(|| GuardianError::UnsupportedInterpreter(first_line.to_string()))?;

    let interpreter = caps.get(1).map(|m| m.as_str()).unwrap_or_default();
    if ALLOWED_INTERPRETERS.contains(&interpreter) {
        return Ok(());
    }
    if interpreter == "/usr/bin/env" {
        let arg = caps.get(2).map(|m| m.as_str()).unwrap_or_default();
        if ALLOWED_ENV_INTERPRETERS.contains(&arg) {
            return Ok(());
        }
    }
    Err(GuardianError::UnsupportedInterpreter(first_line.to_string()))
}

/// Insert the ownership marker after the shebang line if absent.
fn embed_marker(content: &str) -> String {
    if content.contains(OWNERSHIP_MARKER) {
        return content.to_string();
    }
    match content.split_once('\n') {
        Some((shebang, rest)) => format!("{}\n{}\n{}", shebang, OWNERSHIP_MARKER, rest),
        None => format!("{}\n{}\n", content, OWNERSHIP_MARKER),
    }
}

/// Copy every existing hook file into a timestamped sibling backup
/// directory, preserving permissions. Returns the backup path.
fn backup_hooks(repo_root: &Path) -> Result<PathBuf, GuardianError> {
    let hooks_dir = git::hooks_dir(repo_root);
    let backup_dir = git::git_dir(repo_root).join(format!(
        "hooks.backup-{}",
        audit::now_epoch_z().trim_end_matches('Z')
    ));
    fs::create_dir_all(&backup_dir)?;

    for entry in fs::read_dir(&hooks_dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        let saved = backup_dir.join(entry.file_name());
        // The first snapshot wins. A multi-hook force install re-enters
        // here once per hook within the same second; re-copying would
        // overwrite saved foreign content with an already-replaced hook.
        if saved.exists() {
            continue;
        }
        // fs::copy carries the source permission bits with it.
        fs::copy(entry.path(), &saved)?;
    }
    Ok(backup_dir)
}

fn confirm_replace(path: &Path) -> Result<bool, GuardianError> {
    use std::io::BufRead;
    eprint!(
        "Hook {} was not installed by hookguard. Replace it (a backup will be taken)? [y/N] ",
        path.display()
    );
    let mut line = String::new();
    std::io::stdin().lock().read_line(&mut line)?;
    let answer = line.trim().to_ascii_lowercase();
    Ok(answer == "y" || answer == "yes")
}

#[cfg(unix)]
fn set_executable(path: &Path) -> Result<(), GuardianError> {
    use std::os::unix::fs::PermissionsExt;
    let mut perms = fs::metadata(path)?.permissions();
    perms.set_mode(0o755);
    fs::set_permissions(path, perms)?;
    Ok(())
}

#[cfg(not(unix))]
fn set_executable(_path: &Path) -> Result<(), GuardianError> {
    Ok(())
}

/// Install an enforcement script at the hook's lifecycle point.
///
/// Without `force` the destination is created exclusively, so the
/// exists-check and the write are a single atomic operation. With
/// `force`, a foreign hook requires consent and every existing hook is
/// backed up before the replacement lands via rename.
pub fn install(
    repo_root: &Path,
    hook: HookName,
    content: &str,
    opts: &InstallOptions,
) -> Result<(), GuardianError> {
    if !git::is_git_repository(repo_root) {
        return Err(GuardianError::Validation(format!(
            "{} is not a git repository",
            repo_root.display()
        )));
    }
    if content.trim().is_empty() {
        return Err(GuardianError::Validation(
            "hook content must not be empty".to_string(),
        ));
    }
    if content.len() > MAX_HOOK_SIZE {
        return Err(GuardianError::OversizedHook {
            actual: content.len(),
            limit: MAX_HOOK_SIZE,
        });
    }
    validate_interpreter(content)?;

    let destination = hook_destination(repo_root, hook)?;
    let body = embed_marker(content);

    if !opts.force {
        let mut file = fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&destination)
            .map_err(|e| match e.kind() {
                std::io::ErrorKind::AlreadyExists => {
                    GuardianError::HookExists(destination.display().to_string())
                }
                _ => GuardianError::Io(e),
            })?;
        // A write failure must not leave a partial hook claiming the
        // lifecycle point.
        if let Err(e) = file.write_all(body.as_bytes()) {
            drop(file);
            let _ = fs::remove_file(&destination);
            return Err(e.into());
        }
        drop(file);
        set_executable(&destination)?;
        return Ok(());
    }

    if destination.exists() {
        let existing = fs::read_to_string(&destination).unwrap_or_default();
        if !existing.contains(OWNERSHIP_MARKER) {
            if !opts.assume_yes && !confirm_replace(&destination)? {
                return Err(GuardianError::Validation(format!(
                    "replacement of {} declined",
                    destination.display()
                )));
            }
            let backup = backup_hooks(repo_root)?;
            let _ = audit::record(
                repo_root,
                "foreign_hook_replaced",
                &format!("backup at {}", backup.display()),
                Some(&destination),
            );
        }
    }

    // Stage the new script next to the destination, then rename into
    // place so a concurrent hook invocation never observes a torn file.
    let staging = destination.with_extension("hookguard.tmp");
    let mut file = fs::File::create(&staging)?;
    file.write_all(body.as_bytes())?;
    drop(file);
    set_executable(&staging)?;
    fs::rename(&staging, &destination)?;
    Ok(())
}

/// Remove a hookguard-owned hook. Refuses foreign hooks.
pub fn uninstall(repo_root: &Path, hook: HookName) -> Result<bool, GuardianError> {
    if !git::is_git_repository(repo_root) {
        return Err(GuardianError::Validation(format!(
            "{} is not a git repository",
            repo_root.display()
        )));
    }

    let path = git::hooks_dir(repo_root).join(hook.file_name());
    if !path.exists() {
        return Ok(false);
    }

    let content = fs::read_to_string(&path).unwrap_or_default();
    if !content.contains(OWNERSHIP_MARKER) {
        let _ = audit::record(
            repo_root,
            "not_owned_uninstall",
            hook.as_str(),
            Some(&path),
        );
        return Err(GuardianError::NotOwned(path.display().to_string()));
    }

    fs::remove_file(&path)?;
    Ok(true)
}

/// Whether a hookguard-owned script occupies the lifecycle point.
pub fn is_installed(repo_root: &Path, hook: HookName) -> bool {
    let path = git::hooks_dir(repo_root).join(hook.file_name());
    match fs::read_to_string(&path) {
        Ok(content) => content.contains(OWNERSHIP_MARKER),
        Err(_) => false,
    }
}

/// All lifecycle points currently occupied by hookguard scripts.
pub fn installed_hooks(repo_root: &Path) -> Vec<HookName> {
    HookName::ALL
        .into_iter()
        .filter(|hook| is_installed(repo_root, *hook))
        .collect()
}

/// The enforcement script installed at a lifecycle point. It re-invokes
/// the hookguard binary so the stage logic stays in one place.
pub fn hook_script(hook: HookName) -> String {
    format!(
        r#"#!/bin/sh
{marker}
# Installed by hookguard. Edit .hookguard.toml instead of this file;
# `hookguard uninstall` removes it cleanly.
exec hookguard run {stage} "$@"
"#,
        marker = OWNERSHIP_MARKER,
        stage = hook.as_str()
    )
}
