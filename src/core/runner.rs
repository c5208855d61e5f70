//! Bounded validator execution.
//!
//! Validators are arbitrary configured argv vectors run directly (no
//! shell). Every run is bounded by the validator's timeout so a hung
//! tool cannot stall the user's commit; a timeout counts as a
//! validation failure, not a crash.

use crate::core::config::ValidatorConfig;
use crate::core::error::GuardianError;
use std::io::Read;
use std::path::Path;
use std::process::{Command, Stdio};
use std::time::Duration;
use wait_timeout::ChildExt;

#[derive(Debug)]
pub struct ValidatorOutcome {
    pub passed: bool,
    /// Combined tail of stdout/stderr for the failure report.
    pub output: String,
}

fn drain_pipe<R: Read + Send + 'static>(pipe: Option<R>) -> std::thread::JoinHandle<Vec<u8>> {
    std::thread::spawn(move || {
        let mut buf = Vec::new();
        if let Some(mut pipe) = pipe {
            let _ = pipe.read_to_end(&mut buf);
        }
        buf
    })
}

/// Run one validator in the repository root. Returns `Ok` with the
/// pass/fail outcome for normal completion; a timeout or an
/// unspawnable command surfaces as `Err`.
pub fn run_validator(
    repo_root: &Path,
    name: &str,
    validator: &ValidatorConfig,
) -> Result<ValidatorOutcome, GuardianError> {
    let Some(program) = validator.command.first() else {
        return Err(GuardianError::Validation(format!(
            "validator '{}' has no command configured",
            name
        )));
    };

    let mut child = Command::new(program)
        .args(&validator.command[1..])
        .current_dir(repo_root)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| {
            GuardianError::Validation(format!(
                "validator '{}' could not start '{}': {} (is it installed?)",
                name, program, e
            ))
        })?;

    // Reader threads keep the pipes drained while we wait, so a chatty
    // validator cannot deadlock against a full pipe buffer.
    let stdout_thread = drain_pipe(child.stdout.take());
    let stderr_thread = drain_pipe(child.stderr.take());

    let timeout = Duration::from_secs(validator.timeout_secs);
    let status = match child.wait_timeout(timeout)? {
        Some(status) => status,
        None => {
            let _ = child.kill();
            let _ = child.wait();
            let _ = stdout_thread.join();
            let _ = stderr_thread.join();
            return Err(GuardianError::SubprocessTimeout {
                name: name.to_string(),
                secs: validator.timeout_secs,
            });
        }
    };

    let stdout = stdout_thread.join().unwrap_or_default();
    let stderr = stderr_thread.join().unwrap_or_default();

    let mut output = String::from_utf8_lossy(&stdout).into_owned();
    if !stderr.is_empty() {
        if !output.is_empty() {
            output.push('\n');
        }
        output.push_str(&String::from_utf8_lossy(&stderr));
    }

    Ok(ValidatorOutcome {
        passed: status.success(),
        output,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn validator(command: &[&str], timeout_secs: u64) -> ValidatorConfig {
        ValidatorConfig {
            enabled: true,
            command: command.iter().map(|s| s.to_string()).collect(),
            timeout_secs,
            protected: false,
        }
    }

    #[test]
    fn passing_command_reports_success() {
        let tmp = tempfile::tempdir().unwrap();
        let outcome =
            run_validator(tmp.path(), "ok", &validator(&["true"], 10)).unwrap();
        assert!(outcome.passed);
    }

    #[test]
    fn failing_command_reports_failure_with_output() {
        let tmp = tempfile::tempdir().unwrap();
        let outcome = run_validator(
            tmp.path(),
            "fail",
            &validator(&["sh", "-c", "echo broken >&2; exit 3"], 10),
        )
        .unwrap();
        assert!(!outcome.passed);
        assert!(outcome.output.contains("broken"));
    }

    #[test]
    fn hung_command_times_out() {
        let tmp = tempfile::tempdir().unwrap();
        let result = run_validator(tmp.path(), "hang", &validator(&["sleep", "30"], 1));
        assert!(matches!(
            result,
            Err(GuardianError::SubprocessTimeout { secs: 1, .. })
        ));
    }

    #[test]
    fn missing_binary_is_a_clear_error() {
        let tmp = tempfile::tempdir().unwrap();
        let result = run_validator(
            tmp.path(),
            "ghost",
            &validator(&["hookguard-no-such-binary"], 10),
        );
        let message = result.err().unwrap().to_string();
        assert!(message.contains("is it installed?"));
    }
}
