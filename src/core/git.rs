//! Git subprocess helpers: repository detection and commit reversal.

use crate::core::error::GuardianError;
use std::path::{Path, PathBuf};

/// A directory counts as a repository when its control-metadata
/// directory exists. Worktrees (where `.git` is a file) are out of
/// scope for hook installation.
pub fn is_git_repository(repo_root: &Path) -> bool {
    repo_root.join(".git").is_dir()
}

pub fn git_dir(repo_root: &Path) -> PathBuf {
    repo_root.join(".git")
}

pub fn hooks_dir(repo_root: &Path) -> PathBuf {
    git_dir(repo_root).join("hooks")
}

pub fn run_git(repo_root: &Path, args: &[&str]) -> Result<String, GuardianError> {
    let output = std::process::Command::new("git")
        .args(args)
        .current_dir(repo_root)
        .output()
        .map_err(|e| GuardianError::Validation(format!("git failed to start: {}", e)))?;

    if !output.status.success() {
        return Err(GuardianError::Validation(format!(
            "git {} failed: {}",
            args.first().unwrap_or(&""),
            String::from_utf8_lossy(&output.stderr).trim()
        )));
    }

    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
}

/// Whether HEAD has a parent commit, i.e. a soft reset target exists.
pub fn head_has_parent(repo_root: &Path) -> bool {
    run_git(repo_root, &["rev-parse", "--verify", "--quiet", "HEAD~1"]).is_ok()
}

/// Reverse the most recent commit while keeping the working tree and
/// index intact. The staged changes survive so the user can redo the
/// commit through the validation pipeline.
pub fn soft_reset_last_commit(repo_root: &Path) -> Result<String, GuardianError> {
    if !is_git_repository(repo_root) {
        return Err(GuardianError::Validation(format!(
            "{} is not a git repository",
            repo_root.display()
        )));
    }
    run_git(repo_root, &["reset", "--soft", "HEAD~1"])
}

/// Reverse a root commit, which has no parent to reset to: delete the
/// branch ref HEAD points at. The index and working tree are untouched.
pub fn delete_head_ref(repo_root: &Path) -> Result<(), GuardianError> {
    let head_ref = run_git(repo_root, &["symbolic-ref", "HEAD"])?;
    run_git(repo_root, &["update-ref", "-d", &head_ref])?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn repository_detection_requires_git_dir() {
        let tmp = tempfile::tempdir().unwrap();
        assert!(!is_git_repository(tmp.path()));
        fs::create_dir_all(tmp.path().join(".git")).unwrap();
        assert!(is_git_repository(tmp.path()));
    }

    #[test]
    fn soft_reset_refuses_non_repository() {
        let tmp = tempfile::tempdir().unwrap();
        assert!(soft_reset_last_commit(tmp.path()).is_err());
    }
}
