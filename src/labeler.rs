//! Stage 1: classify every physical line as `TEXT`, `SRC`, or `WANT`.
//!
//! The indentation/prefix rules alone cannot tell an un-prompted
//! continuation of a multi-line statement from the start of a want block, so
//! whenever the state machine is about to classify a line inside an active
//! `SRC` run, it first asks the [`BalanceOracle`] whether the statement
//! accumulated so far is already syntactically complete. If not, it pulls
//! further physical lines directly — bypassing the ordinary per-line
//! transition — until the oracle is satisfied or the input is exhausted.

use crate::collaborators::BalanceOracle;
use crate::error::{BalanceError, DoctestParseError};
use crate::model::{LabeledLine, LineKind};

pub fn label(docstring: &str, oracle: &dyn BalanceOracle) -> Result<Vec<LabeledLine>, DoctestParseError> {
    label_with_marker(docstring, oracle, None)
}

/// As [`label`], but an additional `want_marker` line (when set) is treated
/// exactly like the bare `"..."` output-ellipsis sentinel (§6.3; see
/// SPEC_FULL.md §B.1).
pub fn label_with_marker(
    docstring: &str,
    oracle: &dyn BalanceOracle,
    want_marker: Option<&str>,
) -> Result<Vec<LabeledLine>, DoctestParseError> {
    let lines: Vec<&str> = docstring.lines().collect();
    let mut out: Vec<LabeledLine> = Vec::with_capacity(lines.len());
    let mut state = LineKind::Text;
    let mut state_indent = 0usize;
    let mut run_start = 0usize;
    let mut i = 0usize;

    while i < lines.len() {
        let raw = lines[i];
        let indent = indent_of(raw);
        let trimmed = raw.trim();

        let mut next = match state {
            LineKind::Text => {
                if trimmed.starts_with(">>> ") {
                    state_indent = indent;
                    LineKind::Src
                } else {
                    LineKind::Text
                }
            }
            LineKind::Src => {
                if trimmed.is_empty() || indent < state_indent {
                    LineKind::Text
                } else {
                    let body = body_at(raw, state_indent);
                    if body.starts_with(">>> ") || body.starts_with("... ") {
                        LineKind::Src
                    } else {
                        LineKind::Want
                    }
                }
            }
            LineKind::Want => {
                if trimmed.is_empty() {
                    LineKind::Text
                } else if trimmed.starts_with(">>> ") {
                    state_indent = indent;
                    LineKind::Src
                } else if indent < state_indent {
                    LineKind::Text
                } else {
                    LineKind::Want
                }
            }
        };

        // Output-ellipsis sentinel: a bare "..." inside an active source
        // region is the want marker, not a continuation, even though it
        // would otherwise satisfy the SRC->SRC prefix test below.
        if state == LineKind::Src && next == LineKind::Src {
            let body = body_at(raw, state_indent).trim();
            if body == "..." || want_marker.is_some_and(|m| body == m) {
                next = LineKind::Want;
            }
        }

        if next == LineKind::Text {
            state_indent = 0;
        }
        if next == LineKind::Src && state != LineKind::Src {
            run_start = out.len();
        }

        if next != state {
            log::trace!("labeler: line {i} {state:?} -> {next:?} (indent={indent})");
        }
        state = next;
        out.push(LabeledLine { kind: state, raw: raw.to_string() });
        i += 1;

        if state == LineKind::Src {
            i = consume_until_balanced(&lines, i, state_indent, run_start, &mut out, oracle, docstring)?;
        }
    }

    Ok(out)
}

fn consume_until_balanced(
    lines: &[&str],
    mut i: usize,
    state_indent: usize,
    run_start: usize,
    out: &mut Vec<LabeledLine>,
    oracle: &dyn BalanceOracle,
    docstring: &str,
) -> Result<usize, DoctestParseError> {
    loop {
        let tail: Vec<String> = out[run_start..]
            .iter()
            .filter(|l| l.kind == LineKind::Src)
            .map(|l| exec_of(&l.raw, state_indent))
            .collect();

        let balanced = oracle.is_balanced(&tail).map_err(|cause| DoctestParseError::Unbalanced {
            line: run_start,
            cause,
            docstring: docstring.to_string(),
            info: None,
        })?;

        log::trace!("labeler: oracle on lines {run_start}..{i} -> balanced={balanced}");
        if balanced {
            return Ok(i);
        }

        if i >= lines.len() {
            return Err(DoctestParseError::Unbalanced {
                line: run_start,
                cause: BalanceError("input exhausted before statement balanced".into()),
                docstring: docstring.to_string(),
                info: None,
            });
        }

        let raw = lines[i];
        let trimmed = raw.trim();
        let body = body_at(raw, state_indent);
        if !(trimmed.is_empty() || body.starts_with(">>> ") || body.starts_with("... ")) {
            return Err(DoctestParseError::InconsistentContinuation {
                line: i,
                docstring: docstring.to_string(),
                info: None,
            });
        }

        out.push(LabeledLine { kind: LineKind::Src, raw: raw.to_string() });
        i += 1;
    }
}

fn indent_of(raw: &str) -> usize {
    raw.chars().take_while(|c| *c == ' ').count()
}

fn body_at(raw: &str, col: usize) -> &str {
    match raw.char_indices().nth(col) {
        Some((byte_idx, _)) => &raw[byte_idx..],
        None => "",
    }
}

fn exec_of(raw: &str, state_indent: usize) -> String {
    let body = body_at(raw, state_indent);
    if body.starts_with(">>> ") || body.starts_with("... ") {
        body[4..].to_string()
    } else {
        String::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collaborators::heuristic::HeuristicOracle;

    fn kinds(docstring: &str) -> Vec<LineKind> {
        label(docstring, &HeuristicOracle).unwrap().into_iter().map(|l| l.kind).collect()
    }

    #[test]
    fn simple_two_statement() {
        let doc = ">>> x = 1\n>>> print(x)\n1\n";
        assert_eq!(kinds(doc), vec![LineKind::Src, LineKind::Src, LineKind::Want]);
    }

    #[test]
    fn multi_line_bracket_statement() {
        let doc = ">>> x = [1, 2,\n>>> 3, 4]\n>>> print(len(x))\n4\n";
        let labeled = label(doc, &HeuristicOracle).unwrap();
        assert_eq!(
            labeled.iter().map(|l| l.kind).collect::<Vec<_>>(),
            vec![LineKind::Src, LineKind::Src, LineKind::Src, LineKind::Want]
        );
    }

    #[test]
    fn text_surrounds_block() {
        let doc = "prelude\n\n    >>> 1 + 1\n    2\n\npostlude\n";
        assert_eq!(
            kinds(doc),
            vec![
                LineKind::Text,
                LineKind::Text,
                LineKind::Src,
                LineKind::Want,
                LineKind::Text,
                LineKind::Text,
            ]
        );
    }

    #[test]
    fn unterminated_statement_errors() {
        let doc = ">>> x = [1, 2,\n";
        let err = label(doc, &HeuristicOracle).unwrap_err();
        assert!(matches!(err, DoctestParseError::Unbalanced { .. }));
    }

    #[test]
    fn output_ellipsis_sentinel_is_want() {
        // "... " alone would otherwise satisfy the PS2-continuation prefix
        // test and be classified SRC; the sentinel exception forces WANT.
        let doc = ">>> print('a')\n... \n";
        assert_eq!(kinds(doc), vec![LineKind::Src, LineKind::Want]);
    }
}
