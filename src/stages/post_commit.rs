//! Verifier phase: consumes the token the issuer left behind. If no
//! usable token exists the commit was created without the pre-commit
//! phase (e.g. `git commit --no-verify`) and is reversed on the spot,
//! keeping the working tree and index intact so the user can redo it
//! through the pipeline.

use crate::core::audit;
use crate::core::error::GuardianError;
use crate::core::git;
use crate::core::token::{self, TokenState};
use colored::Colorize;
use std::path::Path;

pub fn run(repo_root: &Path) -> Result<i32, GuardianError> {
    match token::consume(repo_root)? {
        TokenState::Present => Ok(0),
        TokenState::Absent => {
            let _ = audit::record(
                repo_root,
                "bypass_detected",
                "post-commit found no validation token",
                Some(&token::token_path(repo_root)),
            );

            eprintln!(
                "{}",
                "🚨 BYPASS DETECTED: this commit skipped the validation pipeline"
                    .bright_red()
                    .bold()
            );
            eprintln!("   (likely `git commit --no-verify`)");

            match revert_commit(repo_root) {
                Ok(()) => {
                    eprintln!("   The commit has been reverted; your changes remain staged.");
                    eprintln!(
                        "💡 Redo it without the bypass flag: {}",
                        "git commit".bright_white()
                    );
                }
                Err(err) => {
                    eprintln!("   Automatic reversal failed: {}", err);
                    eprintln!("💡 Revert manually: {}", "git reset --soft HEAD~1".bright_white());
                }
            }
            Ok(1)
        }
    }
}

/// Reverse the just-created commit. A root commit has no parent to
/// reset to, so its branch ref is deleted instead.
fn revert_commit(repo_root: &Path) -> Result<(), GuardianError> {
    if git::head_has_parent(repo_root) {
        git::soft_reset_last_commit(repo_root)?;
    } else {
        git::delete_head_ref(repo_root)?;
    }
    Ok(())
}
