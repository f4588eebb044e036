//! Applying parsed hunks to old content

use super::hunk::{Hunk, LineTag};
use crate::types::SyncError;

/// Apply the selected hunks to `old`.
///
/// `select` receives the hunk index and the hunk; unselected hunks leave the old lines
/// in place. With every hunk selected, the hunks of `diff(A, B)` turn A into B byte
/// for byte, including CRLF endings and a missing final newline.
///
/// # Errors
/// Returns `SyncError::Validation` when a hunk does not match the old content
/// (overlapping ranges, out-of-bounds start, or differing context).
pub fn apply_hunks<F>(old: &str, hunks: &[Hunk], mut select: F) -> Result<String, SyncError>
where
    F: FnMut(usize, &Hunk) -> bool,
{
    let old_lines: Vec<&str> = old.split_inclusive('\n').collect();
    let mut out = String::with_capacity(old.len());
    let mut cursor = 0usize;

    for (index, hunk) in hunks.iter().enumerate() {
        if !select(index, hunk) {
            continue;
        }

        let start = if hunk.old_count == 0 {
            hunk.old_start
        } else {
            hunk.old_start.checked_sub(1).ok_or_else(|| mismatch(index, "start line 0"))?
        };
        if start < cursor || start > old_lines.len() {
            return Err(mismatch(index, "start outside of the remaining content"));
        }

        for line in &old_lines[cursor..start] {
            out.push_str(line);
        }
        cursor = start;

        for line in &hunk.lines {
            match line.tag {
                LineTag::Context | LineTag::Removed => {
                    let existing = old_lines
                        .get(cursor)
                        .ok_or_else(|| mismatch(index, "hunk runs past the end"))?;
                    if existing.strip_suffix('\n').unwrap_or(existing) != line.content {
                        return Err(mismatch(index, "content differs"));
                    }
                    if line.tag == LineTag::Context {
                        out.push_str(existing);
                    }
                    cursor += 1;
                }
                LineTag::Added => {
                    out.push_str(&line.content);
                    if !line.no_newline {
                        out.push('\n');
                    }
                }
            }
        }
    }

    for line in &old_lines[cursor..] {
        out.push_str(line);
    }

    Ok(out)
}

fn mismatch(index: usize, detail: &str) -> SyncError {
    SyncError::Validation(format!("Hunk {} does not apply: {}", index + 1, detail))
}
