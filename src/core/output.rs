//! Compact output rendering for hook and CLI surfaces.
//!
//! Hook output interrupts a commit, so failure reports are bounded:
//! enough of a validator's output to act on, never an unbounded dump.

/// Keep at most the last `max_lines` lines of a validator's output.
/// The tail carries the actionable part for most tools.
pub fn tail_lines(output: &str, max_lines: usize) -> String {
    let lines: Vec<&str> = output.lines().collect();
    let skipped = lines.len().saturating_sub(max_lines);
    let tail = lines[skipped..].join("\n");
    if skipped > 0 {
        format!("... ({} earlier lines omitted)\n{}", skipped, tail)
    } else {
        tail
    }
}
