//! Forensic security event log.
//!
//! Security-relevant failures (traversal attempts, integrity mismatches,
//! bypass detections) are appended as JSONL to `.git/hookguard.events.jsonl`
//! so they survive the short-lived hook process that observed them.
//! Events never contain token material.

use serde::{Deserialize, Serialize};
use std::path::Path;
use ulid::Ulid;

pub const EVENTS_FILE: &str = "hookguard.events.jsonl";

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct SecurityEvent {
    pub ts: String,
    pub event_id: String,
    pub kind: String,
    pub detail: String,
    pub path: Option<String>,
}

/// Returns unix-epoch seconds with `Z` suffix (e.g. `1771220592Z`).
pub fn now_epoch_z() -> String {
    use std::time::{SystemTime, UNIX_EPOCH};
    let secs = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs();
    format!("{}Z", secs)
}

/// Append one event to the repository's forensic log. Best-effort: a
/// failure to record must never mask the error being reported, so the
/// result is advisory and callers may discard it.
pub fn record(repo_root: &Path, kind: &str, detail: &str, path: Option<&Path>) -> std::io::Result<()> {
    use std::fs::OpenOptions;
    use std::io::Write;

    let git_dir = repo_root.join(".git");
    if !git_dir.is_dir() {
        return Ok(());
    }

    let ev = SecurityEvent {
        ts: now_epoch_z(),
        event_id: Ulid::new().to_string(),
        kind: kind.to_string(),
        detail: detail.to_string(),
        path: path.map(|p| p.display().to_string()),
    };

    let mut f = OpenOptions::new()
        .create(true)
        .append(true)
        .open(git_dir.join(EVENTS_FILE))?;
    writeln!(f, "{}", serde_json::to_string(&ev).unwrap_or_default())?;
    Ok(())
}
