//! Unified diff hunk parsing

use serde::Serialize;
use std::fmt;

/// Role of a line inside a hunk
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum LineTag {
    Context,
    Added,
    Removed,
}

impl LineTag {
    fn from_marker(marker: u8) -> Option<Self> {
        match marker {
            b' ' => Some(LineTag::Context),
            b'+' => Some(LineTag::Added),
            b'-' => Some(LineTag::Removed),
            _ => None,
        }
    }

    pub fn marker(self) -> char {
        match self {
            LineTag::Context => ' ',
            LineTag::Added => '+',
            LineTag::Removed => '-',
        }
    }
}

/// One line of a hunk body
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HunkLine {
    pub tag: LineTag,
    /// Line text without the tag marker and without the trailing `\n`.
    /// A `\r` from CRLF content is kept.
    pub content: String,
    /// Set by a following `\ No newline at end of file` marker
    pub no_newline: bool,
}

/// A contiguous block of a unified diff
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Hunk {
    pub old_start: usize,
    pub old_count: usize,
    pub new_start: usize,
    pub new_count: usize,
    /// Text after the closing `@@`, usually the enclosing function
    pub section: Option<String>,
    pub lines: Vec<HunkLine>,
}

impl Hunk {
    pub fn added(&self) -> usize {
        self.count(LineTag::Added)
    }

    pub fn removed(&self) -> usize {
        self.count(LineTag::Removed)
    }

    fn count(&self, tag: LineTag) -> usize {
        self.lines.iter().filter(|l| l.tag == tag).count()
    }

    /// The `@@ -a,b +c,d @@` header line
    pub fn header(&self) -> String {
        let mut header = format!(
            "@@ -{} +{} @@",
            format_range(self.old_start, self.old_count),
            format_range(self.new_start, self.new_count)
        );
        if let Some(section) = &self.section {
            header.push(' ');
            header.push_str(section);
        }
        header
    }
}

impl fmt::Display for Hunk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.header())?;
        for line in &self.lines {
            writeln!(f, "{}{}", line.tag.marker(), line.content.trim_end_matches('\r'))?;
            if line.no_newline {
                writeln!(f, "\\ No newline at end of file")?;
            }
        }
        Ok(())
    }
}

fn format_range(start: usize, count: usize) -> String {
    if count == 1 {
        start.to_string()
    } else {
        format!("{},{}", start, count)
    }
}

/// Parse every hunk of a unified diff.
///
/// Body lines are taken while the hunk's old/new line budgets last, so `---`/`+++`
/// file headers of a following file section are never read as removed or added
/// lines. Text without any `@@` header yields an empty list.
pub fn parse_hunks(diff_text: &str) -> Vec<Hunk> {
    let mut hunks = Vec::new();
    let mut lines = diff_text.split('\n').peekable();

    while let Some(line) = lines.next() {
        let Some(mut hunk) = parse_header(line) else {
            continue;
        };

        let mut old_left = hunk.old_count;
        let mut new_left = hunk.new_count;

        while old_left > 0 || new_left > 0 {
            let Some(body) = lines.peek() else {
                break;
            };

            if body.starts_with('\\') {
                mark_no_newline(&mut hunk);
                lines.next();
                continue;
            }

            // Some tools strip the single space of an empty context line.
            let (tag, content) = match body.as_bytes().first() {
                None => (LineTag::Context, ""),
                Some(&marker) => match LineTag::from_marker(marker) {
                    Some(tag) => (tag, &body[1..]),
                    None => break,
                },
            };

            let fits = match tag {
                LineTag::Context => old_left > 0 && new_left > 0,
                LineTag::Removed => old_left > 0,
                LineTag::Added => new_left > 0,
            };
            if !fits {
                break;
            }

            match tag {
                LineTag::Context => {
                    old_left -= 1;
                    new_left -= 1;
                }
                LineTag::Removed => old_left -= 1,
                LineTag::Added => new_left -= 1,
            }

            hunk.lines.push(HunkLine {
                tag,
                content: content.to_string(),
                no_newline: false,
            });
            lines.next();
        }

        if lines.peek().map(|l| l.starts_with('\\')).unwrap_or(false) {
            mark_no_newline(&mut hunk);
            lines.next();
        }

        hunks.push(hunk);
    }

    hunks
}

fn mark_no_newline(hunk: &mut Hunk) {
    if let Some(last) = hunk.lines.last_mut() {
        last.no_newline = true;
    }
}

/// Parse `@@ -old_start[,old_count] +new_start[,new_count] @@ [section]`
fn parse_header(line: &str) -> Option<Hunk> {
    let rest = line.strip_prefix("@@ ")?;
    let close = rest.find(" @@")?;
    let ranges = &rest[..close];
    let section = rest[close + 3..].trim();

    let mut parts = ranges.split(' ');
    let (old_start, old_count) = parse_range(parts.next()?.strip_prefix('-')?)?;
    let (new_start, new_count) = parse_range(parts.next()?.strip_prefix('+')?)?;

    Some(Hunk {
        old_start,
        old_count,
        new_start,
        new_count,
        section: (!section.is_empty()).then(|| section.to_string()),
        lines: Vec::new(),
    })
}

/// Parse a range like "start,count" or "start" (count defaults to 1).
fn parse_range(s: &str) -> Option<(usize, usize)> {
    match s.split_once(',') {
        Some((start, count)) => Some((start.parse().ok()?, count.parse().ok()?)),
        None => Some((s.parse().ok()?, 1)),
    }
}
