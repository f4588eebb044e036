//! Terminal output: progress bars and interactive prompts

mod progress;
mod prompt;

pub use progress::ProgressReporter;
pub use prompt::{parse_choice, style_diff_line, TerminalPrompt};
