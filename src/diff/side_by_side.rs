//! Two-column rows for an OLD | NEW view of parsed hunks

use super::hunk::{Hunk, LineTag};

/// One row of a side-by-side view
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Row<'a> {
    /// `@@` header opening a hunk
    Hunk(String),
    /// Unchanged line, shown in both columns
    Same(&'a str),
    /// Removed line on the left, added line on the right; either side may be empty
    Changed {
        old: Option<&'a str>,
        new: Option<&'a str>,
    },
}

/// Rows for every hunk.
///
/// A run of removed lines is paired with the run of added lines that follows it, so an
/// edited line lands on a single row.
pub fn side_by_side(hunks: &[Hunk]) -> Vec<Row<'_>> {
    let mut rows = Vec::new();

    for hunk in hunks {
        rows.push(Row::Hunk(hunk.header()));
        let mut removed: Vec<&str> = Vec::new();
        let mut added: Vec<&str> = Vec::new();

        for line in &hunk.lines {
            let text = line.content.as_str();
            match line.tag {
                LineTag::Removed => {
                    if !added.is_empty() {
                        pair_runs(&mut rows, &mut removed, &mut added);
                    }
                    removed.push(text);
                }
                LineTag::Added => added.push(text),
                LineTag::Context => {
                    pair_runs(&mut rows, &mut removed, &mut added);
                    rows.push(Row::Same(text));
                }
            }
        }
        pair_runs(&mut rows, &mut removed, &mut added);
    }

    rows
}

fn pair_runs<'a>(rows: &mut Vec<Row<'a>>, removed: &mut Vec<&'a str>, added: &mut Vec<&'a str>) {
    for i in 0..removed.len().max(added.len()) {
        rows.push(Row::Changed {
            old: removed.get(i).copied(),
            new: added.get(i).copied(),
        });
    }
    removed.clear();
    added.clear();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diff::{diff_text, parse_hunks};

    #[test]
    fn test_edited_line_shares_a_row() {
        let hunks = parse_hunks(&diff_text("a\nb\nc\n", "a\nB\nc\n", "f", 1).text);
        let rows = side_by_side(&hunks);

        assert_eq!(
            rows,
            vec![
                Row::Hunk("@@ -1,3 +1,3 @@".to_string()),
                Row::Same("a"),
                Row::Changed {
                    old: Some("b"),
                    new: Some("B")
                },
                Row::Same("c"),
            ]
        );
    }

    #[test]
    fn test_uneven_runs_leave_empty_cells() {
        let hunks = parse_hunks(&diff_text("a\nz\n", "a\nx\ny\nz\n", "f", 1).text);
        let rows = side_by_side(&hunks);

        assert!(rows.contains(&Row::Changed {
            old: None,
            new: Some("x")
        }));
        assert!(rows.contains(&Row::Changed {
            old: None,
            new: Some("y")
        }));
    }
}
