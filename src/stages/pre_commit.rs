//! Issuer phase: runs the pre-commit validation pipeline and, only
//! after every check passed, issues the single-use token the verifier
//! phase will look for. A token is never written before or during
//! validation, so an aborted attempt leaves nothing behind that a
//! later commit could replay.

use crate::core::config::Config;
use crate::core::error::GuardianError;
use crate::core::paths::HookName;
use crate::core::token;
use crate::stages::run_stage_validators;
use colored::Colorize;
use std::path::Path;

pub fn run(repo_root: &Path) -> Result<i32, GuardianError> {
    let config = Config::load_for_repo(repo_root)?;

    println!("{}", "hookguard: pre-commit validation".bright_white());
    let all_passed = run_stage_validators(repo_root, &config, HookName::PreCommit)?;

    if !all_passed {
        println!(
            "{} validation failed; commit blocked",
            "✗".bright_red()
        );
        return Ok(1);
    }

    // The commit is cleared. Issuing the token is the final act, after
    // every validation succeeded.
    let value = token::generate()?;
    token::store(repo_root, &value)?;
    println!("{} all validations passed", "✓".bright_green());
    Ok(0)
}
