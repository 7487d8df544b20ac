//! Stage 3: turn one `(source-run, want-run)` group into one or more
//! [`Part`]s, splitting at statement boundaries, directive boundaries, and
//! (when a want is present) the boundary of a trailing bare expression.

use std::collections::BTreeMap;

use crate::collaborators::{AstParser, BalanceOracle, Directive, DirectiveExtractor, NodeKind};
use crate::error::DoctestParseError;
use crate::model::Part;
use crate::options::ParserOptions;

pub fn package(
    src: &[String],
    want: &[String],
    base_lineno: usize,
    oracle: &dyn BalanceOracle,
    directives: &dyn DirectiveExtractor,
    ast: &dyn AstParser,
    options: &ParserOptions,
    docstring: &str,
) -> Result<Vec<Part>, DoctestParseError> {
    // Step 1: indent strip, relative to the first source line.
    let line_indent = src[0].chars().take_while(|c| *c == ' ').count();
    let src: Vec<String> = src.iter().map(|l| strip_indent(l, line_indent)).collect();
    let want: Vec<String> = want.iter().map(|l| strip_indent(l, line_indent)).collect();

    // Step 2: prefix strip (the four-character ">>> "/"... " prompt).
    let is_ps1: Vec<bool> = src.iter().map(|l| l.starts_with(">>> ")).collect();
    let exec_lines: Vec<String> = src.iter().map(|l| l.get(4..).unwrap_or("").to_string()).collect();
    let orig_lines = src;

    // Step 3: statement segmentation.
    let (ps1_linenos, splits_at_final, eval_final) = segment(&exec_lines, &is_ps1, oracle, ast, docstring)?;

    // Step 4: directive-driven splits.
    let mut hard_breaks: BTreeMap<usize, Vec<Directive>> = BTreeMap::new();
    for (k, &i) in ps1_linenos.iter().enumerate() {
        let found = directives.extract(&exec_lines[i]).map_err(|cause| DoctestParseError::Syntax {
            cause: crate::error::AstError(cause.0),
            docstring: docstring.to_string(),
            info: None,
        })?;
        if !found.is_empty() {
            log::debug!("packager: directive hard-break at exec line {i}: {found:?}");
            hard_breaks.insert(i, found);
            // A directive-bearing line stands alone: the next statement
            // starts a fresh Part even if it carries no directive of its
            // own.
            if let Some(&next) = ps1_linenos.get(k + 1) {
                hard_breaks.entry(next).or_default();
            }
        }
    }
    for pair in ps1_linenos.windows(2) {
        let (i, j) = (pair[0], pair[1]);
        if hard_breaks.contains_key(&i) {
            continue;
        }
        let block = exec_lines[i..j].join("\n");
        let found = directives.extract(&block).map_err(|cause| DoctestParseError::Syntax {
            cause: crate::error::AstError(cause.0),
            docstring: docstring.to_string(),
            info: None,
        })?;
        if !found.is_empty() {
            log::debug!("packager: block directive hard-break at exec lines {i}..{j}: {found:?}");
            hard_breaks.insert(i, found);
            hard_breaks.entry(j).or_default();
        }
    }

    // Step 5: emission — choose the Part boundaries.
    let mut ranges: Vec<(usize, usize)> = if options.simulate_repl {
        windows_with_end(&ps1_linenos, exec_lines.len())
    } else if !hard_breaks.is_empty() {
        let mut boundaries: Vec<usize> = hard_breaks.keys().copied().collect();
        if boundaries.first() != Some(&0) {
            boundaries.insert(0, 0);
        }
        boundaries.push(exec_lines.len());
        boundaries.dedup();
        boundaries.windows(2).map(|w| (w[0], w[1])).collect()
    } else {
        vec![(0, exec_lines.len())]
    };

    if splits_at_final && !want.is_empty() {
        if let Some(&last_ps1) = ps1_linenos.last() {
            if let Some(&(last_start, last_end)) = ranges.last() {
                if last_start != last_ps1 {
                    ranges.pop();
                    ranges.push((last_start, last_ps1));
                    ranges.push((last_ps1, last_end));
                }
            }
        }
    }

    // Step 6: construct Parts.
    let n_ranges = ranges.len();
    let mut parts = Vec::with_capacity(n_ranges);
    for (idx, (start, end)) in ranges.into_iter().enumerate() {
        let is_last = idx + 1 == n_ranges;
        let want_lines = if is_last && !want.is_empty() { Some(want.clone()) } else { None };
        let use_eval = is_last && eval_final && want_lines.is_some();
        let directives_here: crate::model::Directives =
            hard_breaks.get(&start).cloned().unwrap_or_default().into_iter().collect();
        let ps1_here: Vec<usize> = ps1_linenos.iter().filter(|&&p| p >= start && p < end).map(|&p| p - start).collect();

        parts.push(Part {
            exec_lines: exec_lines[start..end].to_vec(),
            orig_lines: orig_lines[start..end].to_vec(),
            want_lines,
            line_offset: base_lineno + start,
            directives: directives_here,
            use_eval,
            ps1_linenos: ps1_here,
        });
    }

    Ok(parts)
}

fn windows_with_end(ps1_linenos: &[usize], end: usize) -> Vec<(usize, usize)> {
    if ps1_linenos.is_empty() {
        return vec![(0, end)];
    }
    let mut bounds = ps1_linenos.to_vec();
    bounds.push(end);
    bounds.windows(2).map(|w| (w[0], w[1])).collect()
}

fn strip_indent(line: &str, n: usize) -> String {
    match line.char_indices().nth(n) {
        Some((byte_idx, _)) => line[byte_idx..].to_string(),
        None => String::new(),
    }
}

/// Returns the PS1 boundary indices within `exec_lines`, whether the final
/// top-level node is any expression-statement (drives the physical split —
/// `splits_at_final`), and whether it's specifically a non-call bare
/// expression (drives `use_eval` — `eval_final`).
fn segment(
    exec_lines: &[String],
    is_ps1: &[bool],
    oracle: &dyn BalanceOracle,
    ast: &dyn AstParser,
    docstring: &str,
) -> Result<(Vec<usize>, bool, bool), DoctestParseError> {
    let working_copy: Vec<String> = exec_lines
        .iter()
        .map(|l| if l.starts_with('#') { "_._ = None".to_string() } else { l.clone() })
        .collect();
    let joined = working_copy.join("\n");

    let nodes = ast.top_level_nodes(&joined).map_err(|cause| DoctestParseError::Syntax {
        cause,
        docstring: docstring.to_string(),
        info: None,
    })?;

    if nodes.is_empty() {
        return Ok((Vec::new(), false, false));
    }

    let last_kind = nodes.last().map(|n| n.kind);
    let splits_at_final = matches!(last_kind, Some(NodeKind::Expression) | Some(NodeKind::Call));
    let eval_final = matches!(last_kind, Some(NodeKind::Expression));

    // Multi-line-string correction: walk candidates in reverse, shrinking the
    // right boundary `b` each time a candidate is corrected, since the AST
    // reports a multi-line string's terminal line rather than its start.
    let candidates: Vec<usize> = nodes.iter().map(|n| n.start_line_1based - 1).collect();
    let mut corrected = Vec::with_capacity(candidates.len());
    let mut b = exec_lines.len();
    for &a0 in candidates.iter().rev() {
        let mut a = a0.min(b.saturating_sub(1));
        while a > 0 && !oracle.is_balanced(&exec_lines[a..b]).map_err(|cause| DoctestParseError::Unbalanced {
            line: a,
            cause,
            docstring: docstring.to_string(),
            info: None,
        })? {
            a -= 1;
        }
        if a != a0 {
            log::trace!("packager: multi-line-string correction moved candidate {a0} -> {a}");
        }
        corrected.push(a);
        b = a;
    }
    corrected.reverse();
    corrected.dedup();

    // PS2 exclusion: an index whose original line wasn't prompt-PS1 cannot
    // start a logical block.
    let ps1_linenos: Vec<usize> = corrected.into_iter().filter(|&i| is_ps1.get(i).copied().unwrap_or(false)).collect();

    Ok((ps1_linenos, splits_at_final, eval_final))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collaborators::heuristic::{HeuristicAstParser, HeuristicDirectiveExtractor, HeuristicOracle};

    fn run(src: &[&str], want: &[&str]) -> Vec<Part> {
        let src: Vec<String> = src.iter().map(|s| s.to_string()).collect();
        let want: Vec<String> = want.iter().map(|s| s.to_string()).collect();
        package(
            &src,
            &want,
            0,
            &HeuristicOracle,
            &HeuristicDirectiveExtractor,
            &HeuristicAstParser,
            &ParserOptions::default(),
            "",
        )
        .unwrap()
    }

    #[test]
    fn two_statements_no_directives() {
        // The trailing `print(x)` is a call expression-statement: it still
        // isolates into its own Part (splits_at_final), but doesn't set
        // use_eval since a call's return value isn't what `want` compares.
        let parts = run(&[">>> x = 1", ">>> print(x)"], &["1"]);
        assert_eq!(parts.len(), 2);
        assert_eq!(parts[0].exec_lines, vec!["x = 1".to_string()]);
        assert!(parts[0].want_lines.is_none());
        assert_eq!(parts[1].exec_lines, vec!["print(x)".to_string()]);
        assert_eq!(parts[1].want_lines, Some(vec!["1".to_string()]));
        assert!(!parts[1].use_eval);
    }

    #[test]
    fn bare_expression_uses_eval() {
        let parts = run(&[">>> 2 + 2"], &["4"]);
        assert_eq!(parts.len(), 1);
        assert!(parts[0].use_eval);
        assert_eq!(parts[0].want_lines, Some(vec!["4".to_string()]));
    }

    #[test]
    fn directive_mid_block_splits_three_parts() {
        let parts = run(&[">>> a = 1", ">>> # doctest: +SKIP", ">>> b = 2"], &[]);
        assert_eq!(parts.len(), 3);
        assert!(parts[0].directives.is_empty());
        assert_eq!(parts[1].directives.len(), 1);
        assert!(parts[2].directives.is_empty());
        assert!(parts.iter().all(|p| p.want_lines.is_none()));
    }
}
