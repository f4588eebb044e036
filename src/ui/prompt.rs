//! Interactive terminal prompt for reviews and overwrite confirmation

use crate::diff::{Hunk, LineTag};
use crate::executor::OverwritePolicy;
use crate::labels::LabelTarget;
use crate::review::{DecisionSource, FileRequest, HunkRequest, ReviewChoice};
use crate::types::SyncError;
use console::{style, Term};
use std::io::{self, BufRead};
use std::path::Path;

/// Map a typed answer to a review choice
pub fn parse_choice(input: &str) -> Option<ReviewChoice> {
    match input.trim().to_lowercase().as_str() {
        "a" | "accept" | "approve" => Some(ReviewChoice::Approve),
        "r" | "reject" => Some(ReviewChoice::Reject),
        "s" | "skip" => Some(ReviewChoice::Skip),
        "v" | "view" => Some(ReviewChoice::ViewContext),
        "q" | "quit" => Some(ReviewChoice::Quit),
        _ => None,
    }
}

fn is_yes(answer: Option<&str>) -> bool {
    matches!(
        answer.map(|a| a.trim().to_lowercase()).as_deref(),
        Some("y") | Some("yes")
    )
}

/// Colour one line of a unified diff
pub fn style_diff_line(line: &str) -> String {
    if line.starts_with("+++") || line.starts_with("---") {
        style(line).bold().to_string()
    } else if line.starts_with('+') {
        style(line).green().to_string()
    } else if line.starts_with('-') {
        style(line).red().to_string()
    } else if line.starts_with("@@") {
        style(line).cyan().to_string()
    } else {
        line.to_string()
    }
}

/// Reads answers line by line; end of input counts as quit.
pub struct TerminalPrompt<R> {
    term: Term,
    input: R,
}

impl TerminalPrompt<io::StdinLock<'static>> {
    pub fn stdin() -> Self {
        Self::with_input(Term::stdout(), io::stdin().lock())
    }
}

impl<R: BufRead> TerminalPrompt<R> {
    pub fn with_input(term: Term, input: R) -> Self {
        Self { term, input }
    }

    /// Print `prompt` and read one line; `None` on end of input
    fn ask(&mut self, prompt: &str) -> Result<Option<String>, SyncError> {
        self.term.write_str(prompt)?;
        self.term.flush()?;

        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            self.term.write_line("")?;
            return Ok(None);
        }
        Ok(Some(line))
    }

    fn ask_choice(&mut self, prompt: &str) -> Result<ReviewChoice, SyncError> {
        loop {
            let Some(answer) = self.ask(prompt)? else {
                return Ok(ReviewChoice::Quit);
            };
            match parse_choice(&answer) {
                Some(choice) => return Ok(choice),
                None => self
                    .term
                    .write_line(&format!("{}", style("Invalid choice").red()))?,
            }
        }
    }

    fn render_hunk(&self, hunk: &Hunk) -> Result<(), SyncError> {
        self.term
            .write_line(&format!("{}", style(hunk.header()).cyan()))?;
        for line in &hunk.lines {
            let text = format!("{}{}", line.tag.marker(), line.content.trim_end_matches('\r'));
            let rendered = match line.tag {
                LineTag::Added => style(text).green().to_string(),
                LineTag::Removed => style(text).red().to_string(),
                LineTag::Context => text,
            };
            self.term.write_line(&rendered)?;
        }
        Ok(())
    }
}

impl<R: BufRead> DecisionSource for TerminalPrompt<R> {
    fn choose_hunk(&mut self, request: &HunkRequest<'_>) -> Result<ReviewChoice, SyncError> {
        self.term.write_line("")?;
        self.term.write_line(&format!(
            "{} {} [{}] change block {}/{}  {} / {}",
            style("→").cyan(),
            style(request.path).bold(),
            request.label,
            request.index + 1,
            request.total,
            style(format!("+{}", request.hunk.added())).green(),
            style(format!("-{}", request.hunk.removed())).red()
        ))?;
        self.render_hunk(request.hunk)?;

        self.ask_choice("[a]ccept  [r]eject  [s]kip  [v]iew full diff  [q]uit: ")
    }

    fn show_context(&mut self, request: &HunkRequest<'_>) -> Result<(), SyncError> {
        self.term.write_line("")?;
        for line in request.diff_text.lines() {
            self.term.write_line(&style_diff_line(line.trim_end_matches('\r')))?;
        }
        Ok(())
    }

    fn choose_file(&mut self, request: &FileRequest<'_>) -> Result<ReviewChoice, SyncError> {
        let changes = if request.binary {
            style("binary".to_string()).yellow().to_string()
        } else {
            format!(
                "{} / {}",
                style(format!("+{}", request.added)).green(),
                style(format!("-{}", request.removed)).red()
            )
        };
        self.term.write_line(&format!(
            "{} [{}] {} ({}/{})  {}",
            style("→").cyan(),
            style(request.label).bold(),
            request.path,
            request.position + 1,
            request.total,
            changes
        ))?;

        self.ask_choice("  [a]ccept  [r]eject  [v]iew hunks  [s]kip  [q]uit: ")
    }

    fn confirm_apply(&mut self, approved: usize) -> Result<bool, SyncError> {
        self.term.write_line("")?;
        let answer = self.ask(&format!(
            "Apply the {} approved change(s) now? (y/n): ",
            approved
        ))?;
        Ok(is_yes(answer.as_deref()))
    }
}

impl<R: BufRead> OverwritePolicy for TerminalPrompt<R> {
    fn confirm_overwrite(&mut self, target: &LabelTarget, dest: &Path) -> Result<bool, SyncError> {
        self.term.write_line(&format!(
            "{} [{}] folder already exists: {}",
            style("!").yellow(),
            target.label,
            dest.display()
        ))?;
        let answer = self.ask("Overwrite? (y/n): ")?;
        Ok(is_yes(answer.as_deref()))
    }
}
