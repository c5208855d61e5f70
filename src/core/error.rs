use std::io;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum GuardianError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("path traversal rejected: {0}")]
    PathTraversal(String),
    #[error("invalid hook name '{0}' (allowed: pre-commit, post-commit, pre-push, pre-rebase)")]
    InvalidHookName(String),
    #[error("hook already installed at {0} (re-run with --force to replace it)")]
    HookExists(String),
    #[error("hook at {0} was not installed by hookguard and will not be touched")]
    NotOwned(String),
    #[error("hook content is {actual} bytes, above the {limit} byte ceiling")]
    OversizedHook { actual: usize, limit: usize },
    #[error("hook interpreter '{0}' is not on the allow-list")]
    UnsupportedInterpreter(String),
    #[error(
        "settings integrity check failed for {0}: the file changed since it was sealed. \
         Review the edit, then run `hookguard reseal` to accept it."
    )]
    Integrity(String),
    #[error("'{name}' timed out after {secs}s")]
    SubprocessTimeout { name: String, secs: u64 },
    #[error("validation error: {0}")]
    Validation(String),
}
