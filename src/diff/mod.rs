//! Line-based diffing: unified diff generation, hunk parsing, hunk application and
//! review aids

pub mod hints;
pub mod hunk;
pub mod patch;
pub mod side_by_side;
pub mod unified;

pub use hints::ChangeHints;
pub use hunk::{parse_hunks, Hunk, HunkLine, LineTag};
pub use patch::apply_hunks;
pub use side_by_side::{side_by_side, Row};
pub use unified::{diff_files, diff_text, DiffKind, FileDiff};
