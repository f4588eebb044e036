//! Keyword hints about what the changed lines of a diff touch

use super::hunk::{Hunk, LineTag};

/// Kinds of change spotted in the added and removed lines
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ChangeHints {
    pub imports: bool,
    pub functions: bool,
    pub styles: bool,
}

impl ChangeHints {
    /// Context lines are ignored; only lines the diff adds or removes count.
    pub fn from_hunks(hunks: &[Hunk]) -> Self {
        hunks
            .iter()
            .flat_map(|h| &h.lines)
            .filter(|line| line.tag != LineTag::Context)
            .fold(Self::default(), |hints, line| hints.with_line(&line.content))
    }

    fn with_line(self, line: &str) -> Self {
        let code = line.trim_start();
        Self {
            imports: self.imports
                || code.starts_with("import ")
                || code.starts_with("import{")
                || code.contains("require("),
            functions: self.functions || code.contains("function") || code.contains("=>"),
            styles: self.styles || code.contains("className") || code.contains("style"),
        }
    }

    pub fn is_empty(&self) -> bool {
        !(self.imports || self.functions || self.styles)
    }

    pub fn descriptions(&self) -> Vec<&'static str> {
        let mut found = Vec::new();
        if self.imports {
            found.push("Import changes");
        }
        if self.functions {
            found.push("Function changes");
        }
        if self.styles {
            found.push("Style changes");
        }
        found
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diff::{diff_text, parse_hunks};

    fn hints(old: &str, new: &str) -> ChangeHints {
        ChangeHints::from_hunks(&parse_hunks(&diff_text(old, new, "f.tsx", 1).text))
    }

    #[test]
    fn test_import_and_style_changes() {
        let found = hints(
            "import { a } from './a';\n\nconst x = 1;\n",
            "import { a, b } from './a';\n\nconst x = 1;\n",
        );
        assert_eq!(
            found,
            ChangeHints {
                imports: true,
                functions: false,
                styles: false
            }
        );

        let found = hints("<div className=\"a\" />\n", "<div className=\"b\" />\n");
        assert!(found.styles);
        assert_eq!(found.descriptions(), vec!["Style changes"]);
    }

    #[test]
    fn test_context_lines_do_not_count() {
        let found = hints(
            "const f = () => 1;\nlet a = 1;\n",
            "const f = () => 1;\nlet a = 2;\n",
        );
        assert!(found.is_empty());
    }

    #[test]
    fn test_arrow_function_is_function_change() {
        let found = hints("let a = 1;\n", "const f = (x) => x;\n");
        assert!(found.functions);
        assert!(!found.imports);
    }
}
