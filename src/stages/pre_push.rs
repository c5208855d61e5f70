//! Pre-push phase: runs the configured pre-push validators (the test
//! suite, by default) before the push is allowed. No token is involved;
//! the anti-bypass handshake protects commits, not pushes.

use crate::core::config::Config;
use crate::core::error::GuardianError;
use crate::core::paths::HookName;
use crate::stages::run_stage_validators;
use colored::Colorize;
use std::path::Path;

pub fn run(repo_root: &Path) -> Result<i32, GuardianError> {
    let config = Config::load_for_repo(repo_root)?;

    println!("{}", "hookguard: pre-push validation".bright_white());
    let all_passed = run_stage_validators(repo_root, &config, HookName::PrePush)?;

    if all_passed {
        println!("{} push allowed", "✓".bright_green());
        Ok(0)
    } else {
        println!("{} validation failed; push blocked", "✗".bright_red());
        Ok(1)
    }
}
