//! Core data types shared by every pipeline stage.

use smallvec::SmallVec;

use crate::collaborators::Directive;

/// Most parts carry zero or one directive; inline storage avoids a heap
/// allocation for the common case (mirrors the teacher crate's small
/// bounded-depth collections).
pub type Directives = SmallVec<[Directive; 1]>;

/// A physical line's classification, produced by the labeler.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum LineKind {
    Text,
    Src,
    Want,
}

/// One classified physical line. `raw` is the original line text, prompt
/// prefix (if any) intact.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct LabeledLine {
    pub kind: LineKind,
    pub raw: String,
}

/// A run-length-compressed group, as produced by the grouper: either a pure
/// text run or a `(source-run, want-run)` pair.
#[derive(Clone, PartialEq, Eq, Debug)]
pub enum Group {
    Text(Vec<String>),
    Block { src: Vec<String>, want: Vec<String> },
}

/// One item of a parsed docstring: either narrative text or an executable
/// [`Part`], in the order they appeared in the original docstring.
#[derive(Clone, PartialEq, Debug)]
pub enum Emitted {
    Text(String),
    Part(Part),
}

/// One executable code block plus its expected output, as emitted by the
/// packager.
#[derive(Clone, PartialEq, Debug)]
pub struct Part {
    /// Source lines with the 4-character prompt prefix removed.
    pub exec_lines: Vec<String>,
    /// Source lines with the prompt prefix preserved, for error display.
    pub orig_lines: Vec<String>,
    /// Expected output lines, if this part carries a want.
    pub want_lines: Option<Vec<String>>,
    /// 0-based index of this part's first line within the (already
    /// left-stripped) input docstring.
    pub line_offset: usize,
    /// Directives that caused this part's split, or that appear inline
    /// within its source.
    pub directives: Directives,
    /// True iff the last statement in `exec_lines` is a bare expression and
    /// `want_lines` is non-empty: the executor should compare the
    /// expression's value, not just stdout, against `want`.
    pub use_eval: bool,
    /// 0-based indices within `exec_lines` where each top-level statement in
    /// this part begins.
    pub ps1_linenos: Vec<usize>,
}

impl Part {
    /// Joined source, one statement's lines separated by newlines.
    pub fn source(&self) -> String {
        self.exec_lines.join("\n")
    }

    /// Joined expected output, or `None` if this part has no want.
    pub fn want(&self) -> Option<String> {
        self.want_lines.as_ref().map(|lines| lines.join("\n"))
    }

    /// Total physical line count: source lines plus want lines.
    pub fn n_lines(&self) -> usize {
        self.exec_lines.len() + self.want_lines.as_ref().map_or(0, Vec::len)
    }

    /// Human-readable rendering of this part.
    ///
    /// Each source line is prefixed `">>> "`; want lines are prefixed with
    /// equivalent spacing. When `linenos` is set, a zero-padded line number
    /// precedes each source line, starting at `startline + line_offset` and
    /// incrementing by one per physical line; want lines get spaces of equal
    /// width instead. The padding width is `n_digits` when given, else
    /// `ceil(log10(startline + n_lines))` (matching the original's
    /// `format_src(..., n_digits=None, ...)`, which auto-computes the width
    /// only when the caller doesn't supply one). When `colored` is set, the
    /// whole rendering is passed through a terminal colorizer.
    pub fn format(
        &self,
        linenos: bool,
        want: bool,
        startline: usize,
        n_digits: Option<usize>,
        colored: bool,
    ) -> String {
        let n_digits = n_digits.unwrap_or_else(|| digit_width(startline + self.n_lines()));
        let mut out = String::new();
        let mut lineno = startline + self.line_offset;

        for line in &self.orig_lines {
            if linenos {
                out.push_str(&format!("{lineno:0width$} ", width = n_digits));
                lineno += 1;
            }
            out.push_str(line);
            out.push('\n');
        }

        if want {
            if let Some(want_lines) = &self.want_lines {
                for line in want_lines {
                    if linenos {
                        out.push_str(&" ".repeat(n_digits + 1));
                        lineno += 1;
                    }
                    out.push_str(line);
                    out.push('\n');
                }
            }
        }

        if colored {
            colorize(&out)
        } else {
            out
        }
    }
}

/// Number of digits needed to print the largest line number this part will
/// display, i.e. `ceil(log10(n))` per spec.md §6.2 (mirrors the original's
/// `math.ceil(math.log(endline, 10))`). `n` is exclusive, so an exact power
/// of ten (e.g. `n == 10`) needs only as many digits as `n - 1` does.
fn digit_width(n: usize) -> usize {
    if n <= 1 {
        1
    } else {
        (n as f64).log10().ceil() as usize
    }
}

fn colorize(text: &str) -> String {
    use colored::Colorize;
    text.lines()
        .map(|line| {
            if line.trim_start().starts_with(">>> ") || line.trim_start().contains(">>> ") {
                line.green().to_string()
            } else {
                line.normal().to_string()
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn digit_width_at_exact_powers_of_ten() {
        assert_eq!(digit_width(1), 1);
        assert_eq!(digit_width(9), 1);
        assert_eq!(digit_width(10), 1);
        assert_eq!(digit_width(11), 2);
        assert_eq!(digit_width(99), 2);
        assert_eq!(digit_width(100), 2);
        assert_eq!(digit_width(101), 3);
    }

    #[test]
    fn format_auto_width_matches_nine_line_part() {
        let part = Part {
            exec_lines: vec!["pass".to_string()],
            orig_lines: vec![">>> pass".to_string()],
            want_lines: None,
            line_offset: 0,
            directives: Directives::new(),
            use_eval: false,
            ps1_linenos: vec![0],
        };
        // startline(1) + n_lines(1) == 2, well under 10: single-digit width.
        let rendered = part.format(true, false, 1, None, false);
        assert!(rendered.starts_with("1 "));
    }

    #[test]
    fn format_n_digits_override_widens_padding() {
        let part = Part {
            exec_lines: vec!["pass".to_string()],
            orig_lines: vec![">>> pass".to_string()],
            want_lines: None,
            line_offset: 0,
            directives: Directives::new(),
            use_eval: false,
            ps1_linenos: vec![0],
        };
        let rendered = part.format(true, false, 1, Some(3), false);
        assert!(rendered.starts_with("001 "));
    }
}
