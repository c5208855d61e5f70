//! Single-use validation token.
//!
//! The issuer phase (pre-commit) writes the token as its final act; the
//! verifier phase (post-commit) consumes it. Absence of a token at
//! verification time means the issuer never ran, i.e. the commit
//! bypassed validation. A corrupted or insecurely-permissioned token is
//! treated as absent — the protocol always fails toward "bypass".

use crate::core::audit;
use crate::core::error::GuardianError;
use crate::core::git;
use std::fs;
use std::path::{Path, PathBuf};

pub const TOKEN_FILE: &str = "HOOKGUARD_TOKEN";

/// Entropy carried by a token: 32 bytes, 256 bits.
const TOKEN_BYTES: usize = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenState {
    /// A well-formed token existed and has been consumed.
    Present,
    /// No usable token: missing, empty, or insecure. Treated as bypass.
    Absent,
}

pub fn token_path(repo_root: &Path) -> PathBuf {
    git::git_dir(repo_root).join(TOKEN_FILE)
}

/// Generate a fresh 256-bit token, hex-encoded.
pub fn generate() -> Result<String, GuardianError> {
    let mut bytes = [0u8; TOKEN_BYTES];
    getrandom::getrandom(&mut bytes)
        .map_err(|e| GuardianError::Validation(format!("token generation failed: {}", e)))?;
    Ok(hex::encode(bytes))
}

/// Persist a token with owner-only permissions. The token lands via an
/// atomic rename so a concurrently running verifier never reads a torn
/// write. Overwrites any stale token from an aborted earlier attempt.
pub fn store(repo_root: &Path, token: &str) -> Result<(), GuardianError> {
    if !git::is_git_repository(repo_root) {
        return Err(GuardianError::Validation(format!(
            "{} is not a git repository",
            repo_root.display()
        )));
    }
    if token.trim().is_empty() {
        return Err(GuardianError::Validation(
            "token must not be empty".to_string(),
        ));
    }

    let destination = token_path(repo_root);
    let staging = destination.with_extension("tmp");

    {
        let mut opts = fs::OpenOptions::new();
        opts.write(true).create(true).truncate(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            opts.mode(0o600);
        }
        use std::io::Write;
        let mut file = opts.open(&staging)?;
        file.write_all(token.as_bytes())?;
        file.sync_all()?;
    }

    fs::rename(&staging, &destination)?;
    Ok(())
}

#[cfg(unix)]
fn permissions_are_owner_only(path: &Path) -> Result<bool, GuardianError> {
    use std::os::unix::fs::PermissionsExt;
    let mode = fs::metadata(path)?.permissions().mode();
    Ok(mode & 0o077 == 0)
}

#[cfg(not(unix))]
fn permissions_are_owner_only(_path: &Path) -> Result<bool, GuardianError> {
    Ok(true)
}

/// Read and delete the token (single use). Returns `Absent` for a
/// missing, empty, non-UTF-8, unreadable, or group/other-accessible
/// token file; every corrupt case is audit-logged. The protocol never
/// fails toward "pass": any defect in an existing token file means
/// bypass, so the verifier still reverts the commit.
pub fn consume(repo_root: &Path) -> Result<TokenState, GuardianError> {
    if !git::is_git_repository(repo_root) {
        return Err(GuardianError::Validation(format!(
            "{} is not a git repository",
            repo_root.display()
        )));
    }

    let path = token_path(repo_root);
    if !path.exists() {
        return Ok(TokenState::Absent);
    }

    // A metadata failure counts as insecure, not as a crash.
    let secure = permissions_are_owner_only(&path).unwrap_or(false);

    let bytes = match fs::read(&path) {
        Ok(bytes) => bytes,
        Err(_) => {
            let _ = fs::remove_file(&path);
            let _ = audit::record(
                repo_root,
                "token_corrupt",
                "token file exists but is unreadable",
                Some(&path),
            );
            return Ok(TokenState::Absent);
        }
    };
    fs::remove_file(&path)?;

    if !secure {
        let _ = audit::record(
            repo_root,
            "token_corrupt",
            "token file permissions allow group/other access",
            Some(&path),
        );
        return Ok(TokenState::Absent);
    }

    let content = match String::from_utf8(bytes) {
        Ok(content) => content,
        Err(_) => {
            let _ = audit::record(
                repo_root,
                "token_corrupt",
                "token file is not valid UTF-8",
                Some(&path),
            );
            return Ok(TokenState::Absent);
        }
    };
    if content.trim().is_empty() {
        let _ = audit::record(
            repo_root,
            "token_corrupt",
            "token file empty or whitespace",
            Some(&path),
        );
        return Ok(TokenState::Absent);
    }

    Ok(TokenState::Present)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokens_are_unique_hex_and_long_enough() {
        let a = generate().unwrap();
        let b = generate().unwrap();
        assert_ne!(a, b);
        assert_eq!(a.len(), TOKEN_BYTES * 2);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
        assert!(!a.contains(char::is_whitespace));
    }

    #[test]
    fn store_requires_repository_and_content() {
        let tmp = tempfile::tempdir().unwrap();
        assert!(store(tmp.path(), "abc").is_err());

        std::fs::create_dir_all(tmp.path().join(".git")).unwrap();
        assert!(store(tmp.path(), "").is_err());
        assert!(store(tmp.path(), "abc123").is_ok());
        assert!(token_path(tmp.path()).exists());
    }

    #[cfg(unix)]
    #[test]
    fn stored_token_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;
        let tmp = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(tmp.path().join(".git")).unwrap();
        store(tmp.path(), &generate().unwrap()).unwrap();

        let mode = std::fs::metadata(token_path(tmp.path()))
            .unwrap()
            .permissions()
            .mode();
        assert_eq!(mode & 0o777, 0o600);
    }
}
