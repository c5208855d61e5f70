//! Lifecycle stage entry points.
//!
//! Each installed hook re-invokes the binary with `hookguard run
//! <stage>`; this module maps the stage to its enforcement logic. The
//! set of stages is the closed [`HookName`] enum, so a hook script can
//! never name a stage that has no implementation.

pub mod post_commit;
pub mod pre_commit;
pub mod pre_push;

use crate::core::config::{self, Config};
use crate::core::error::GuardianError;
use crate::core::output;
use crate::core::paths::HookName;
use crate::core::runner;
use colored::Colorize;
use std::path::Path;

/// Run the enforcement logic for a stage. Returns the hook's exit code.
pub fn run_stage(repo_root: &Path, stage: HookName) -> Result<i32, GuardianError> {
    match stage {
        HookName::PreCommit => pre_commit::run(repo_root),
        HookName::PostCommit => post_commit::run(repo_root),
        HookName::PrePush => pre_push::run(repo_root),
        // Allow-listed so it may be occupied, but carries no logic yet.
        HookName::PreRebase => Ok(0),
    }
}

/// Run every enabled validator for a stage, reporting each outcome.
/// Returns true only when all of them passed. The skip variable is
/// honored for non-protected validators only; a timeout or an
/// unstartable command counts as a failure, not a crash.
pub(crate) fn run_stage_validators(
    repo_root: &Path,
    config: &Config,
    stage: HookName,
) -> Result<bool, GuardianError> {
    let validators = config.stage_validators(stage)?;
    if validators.is_empty() {
        return Ok(true);
    }

    let mut all_passed = true;
    for (name, validator) in &validators {
        if config::skip_requested(name) {
            if validator.protected {
                println!(
                    "{} {} is protected; {} ignored",
                    "!".bright_yellow(),
                    name.bright_white(),
                    config::SKIP_ENV
                );
            } else {
                println!(
                    "{} {} skipped ({} set)",
                    "-".bright_black(),
                    name.bright_white(),
                    config::SKIP_ENV
                );
                continue;
            }
        }

        match runner::run_validator(repo_root, name, validator) {
            Ok(outcome) if outcome.passed => {
                println!("{} {}", "✓".bright_green(), name.bright_white());
            }
            Ok(outcome) => {
                println!("{} {}", "✗".bright_red(), name.bright_white());
                let tail = output::tail_lines(&outcome.output, 20);
                if !tail.trim().is_empty() {
                    println!("{}", tail);
                }
                all_passed = false;
            }
            Err(err @ GuardianError::SubprocessTimeout { .. }) => {
                println!("{} {} ({})", "✗".bright_red(), name.bright_white(), err);
                all_passed = false;
            }
            Err(err @ GuardianError::Validation(_)) => {
                println!("{} {} ({})", "✗".bright_red(), name.bright_white(), err);
                all_passed = false;
            }
            Err(err) => return Err(err),
        }
    }
    Ok(all_passed)
}
