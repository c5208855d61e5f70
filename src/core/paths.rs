//! Path confinement and hook-name validation.
//!
//! Everything that decides whether a filesystem location or hook name is
//! acceptable lives here. Hook names are a closed enum so a "listed but
//! missing" stage cannot exist; path checks canonicalize through symlinks
//! before deciding containment.

use crate::core::error::GuardianError;
use std::fmt;
use std::path::{Component, Path, PathBuf};
use std::str::FromStr;

/// Git lifecycle points hookguard is allowed to occupy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HookName {
    PreCommit,
    PostCommit,
    PrePush,
    PreRebase,
}

impl HookName {
    pub const ALL: [HookName; 4] = [
        HookName::PreCommit,
        HookName::PostCommit,
        HookName::PrePush,
        HookName::PreRebase,
    ];

    /// Stages that carry enforcement logic and are installed by default.
    /// `pre-rebase` is on the allow-list but has no default script.
    pub const ENFORCED: [HookName; 3] = [
        HookName::PreCommit,
        HookName::PostCommit,
        HookName::PrePush,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            HookName::PreCommit => "pre-commit",
            HookName::PostCommit => "post-commit",
            HookName::PrePush => "pre-push",
            HookName::PreRebase => "pre-rebase",
        }
    }

    /// On-disk file name for the hook script (batch extension on Windows).
    pub fn file_name(&self) -> String {
        if cfg!(windows) {
            format!("{}.bat", self.as_str())
        } else {
            self.as_str().to_string()
        }
    }
}

impl fmt::Display for HookName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HookName {
    type Err = GuardianError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        validate_hook_name(s)
    }
}

/// Resolve a raw string to a member of the hook allow-list.
pub fn validate_hook_name(name: &str) -> Result<HookName, GuardianError> {
    for hook in HookName::ALL {
        if hook.as_str() == name {
            return Ok(hook);
        }
    }
    Err(GuardianError::InvalidHookName(name.to_string()))
}

/// Cheap pre-filter: reject raw strings containing parent-directory
/// segments before any filesystem access. Not the sole defense —
/// `validate_confined` re-checks after canonicalization.
pub fn validate_no_traversal(raw: &str) -> Result<(), GuardianError> {
    let has_parent = Path::new(raw)
        .components()
        .any(|c| matches!(c, Component::ParentDir));
    if has_parent || raw.contains("..") {
        return Err(GuardianError::PathTraversal(raw.to_string()));
    }
    Ok(())
}

/// Verify that `candidate` resolves (following symlinks) to a strict
/// descendant of `containing_dir`. Returns the resolved candidate path.
///
/// The candidate may not exist yet; in that case its parent directory
/// is canonicalized and the final component re-joined.
pub fn validate_confined(
    candidate: &Path,
    containing_dir: &Path,
) -> Result<PathBuf, GuardianError> {
    let container = containing_dir
        .canonicalize()
        .map_err(|_| GuardianError::PathTraversal(containing_dir.display().to_string()))?;

    let resolved = if candidate.exists() {
        candidate
            .canonicalize()
            .map_err(|_| GuardianError::PathTraversal(candidate.display().to_string()))?
    } else {
        let parent = candidate
            .parent()
            .ok_or_else(|| GuardianError::PathTraversal(candidate.display().to_string()))?;
        let file_name = candidate
            .file_name()
            .ok_or_else(|| GuardianError::PathTraversal(candidate.display().to_string()))?;
        parent
            .canonicalize()
            .map_err(|_| GuardianError::PathTraversal(candidate.display().to_string()))?
            .join(file_name)
    };

    if resolved == container || !resolved.starts_with(&container) {
        return Err(GuardianError::PathTraversal(resolved.display().to_string()));
    }
    Ok(resolved)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hook_name_round_trip() {
        for hook in HookName::ALL {
            assert_eq!(validate_hook_name(hook.as_str()).unwrap(), hook);
        }
    }

    #[test]
    fn hook_name_rejects_unknown() {
        for bad in ["malicious-hook", "post-checkout", "", "hook; rm -rf /"] {
            assert!(matches!(
                validate_hook_name(bad),
                Err(GuardianError::InvalidHookName(_))
            ));
        }
    }

    #[test]
    fn traversal_prefilter_rejects_parent_segments() {
        assert!(validate_no_traversal("../../../etc/passwd").is_err());
        assert!(validate_no_traversal("hooks/../escape").is_err());
        assert!(validate_no_traversal("pre-commit").is_ok());
    }

    #[test]
    fn confinement_rejects_escapes() {
        let tmp = tempfile::tempdir().unwrap();
        let inside = tmp.path().join("hooks");
        std::fs::create_dir_all(&inside).unwrap();

        let ok = validate_confined(&inside.join("pre-commit"), &inside);
        assert!(ok.is_ok());

        let escape = inside.join("..").join("outside");
        assert!(validate_confined(&escape, &inside).is_err());

        // The container itself is not a strict descendant.
        assert!(validate_confined(&inside, &inside).is_err());
    }
}
