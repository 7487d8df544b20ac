//! A dependency-free reference implementation of the three collaborator
//! traits, tuned for Python-flavored doctests. It tracks bracket nesting,
//! quoting (including triple-quoted strings) and trailing backslash
//! continuations rather than running a real grammar, so it is adequate for
//! tests and simple callers but is not a substitute for a real AST parser —
//! swap in one for production use.

use crate::collaborators::{AstNode, AstParser, BalanceOracle, Directive, DirectiveExtractor, DirectiveScope, NodeKind, Polarity};
use crate::error::{AstError, BalanceError, DirectiveError};

#[derive(Clone, Copy, Debug, Default)]
pub struct HeuristicOracle;

impl BalanceOracle for HeuristicOracle {
    fn is_balanced(&self, lines: &[String]) -> Result<bool, BalanceError> {
        Ok(scan_depth(lines) == Some(Depth::default()))
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct HeuristicAstParser;

impl AstParser for HeuristicAstParser {
    fn top_level_nodes(&self, text: &str) -> Result<Vec<AstNode>, AstError> {
        let lines: Vec<String> = text.lines().map(str::to_owned).collect();
        let mut nodes = Vec::new();
        let mut depth = Depth::default();
        let mut cursor = 0usize;

        for (idx, line) in lines.iter().enumerate() {
            let at_top_level = depth.is_zero() && !line.starts_with(char::is_whitespace);
            if at_top_level && idx > cursor {
                let stmt = &lines[cursor..idx];
                if !stmt.iter().all(|l| l.trim().is_empty()) {
                    nodes.push(node_for(stmt, cursor));
                }
                cursor = idx;
            }
            depth = step_depth(depth, line).ok_or_else(|| {
                AstError(format!("unterminated string or bracket at line {}", idx + 1))
            })?;
        }
        if cursor < lines.len() {
            let stmt = &lines[cursor..];
            if !stmt.iter().all(|l| l.trim().is_empty()) {
                nodes.push(node_for(stmt, cursor));
            }
        }
        if !depth.is_zero() {
            return Err(AstError("unterminated string or bracket at end of input".into()));
        }
        Ok(nodes)
    }
}

fn node_for(stmt: &[String], start: usize) -> AstNode {
    let first_nonblank = stmt.iter().find(|l| !l.trim().is_empty()).map(String::as_str).unwrap_or("");
    let joined = stmt.iter().map(|l| l.trim()).collect::<Vec<_>>().join(" ");
    let kind = classify(first_nonblank, &joined);
    AstNode { start_line_1based: start + 1, kind }
}

const STATEMENT_KEYWORDS: &[&str] = &[
    "if ", "elif ", "else:", "for ", "while ", "def ", "class ", "return", "import ", "from ",
    "with ", "try:", "except", "finally:", "assert ", "del ", "global ", "nonlocal ", "pass",
    "break", "continue", "raise", "yield", "async ", "lambda ", "#",
];

/// Classifies a top-level statement. `is_expression_statement` (not a
/// keyword-led statement, not an assignment) decides whether the statement is
/// an expression-statement at all — this drives trailing-expression
/// isolation regardless of whether it's a call. Within that, `ends_in_call`
/// narrows `Expression` down to `Call`: a trailing call already produces its
/// own captured output, so its return value isn't what `want` compares, and
/// it must not set `use_eval`.
fn classify(first_line: &str, joined: &str) -> NodeKind {
    if !is_expression_statement(first_line) {
        return NodeKind::Other;
    }
    if ends_in_call(joined.trim()) {
        NodeKind::Call
    } else {
        NodeKind::Expression
    }
}

fn is_expression_statement(first_line: &str) -> bool {
    let trimmed = first_line.trim_start();
    if STATEMENT_KEYWORDS.iter().any(|kw| trimmed.starts_with(kw)) {
        return false;
    }
    !contains_top_level_assignment(trimmed)
}

/// True if `text` ends in a call `<callee>(...)`/`<callee>[...]`, i.e. the
/// character immediately before the matching opening bracket is part of an
/// identifier/attribute/subscript chain rather than being the start of a
/// bare parenthesized/listed expression.
fn ends_in_call(text: &str) -> bool {
    let bytes = text.as_bytes();
    let Some(&last) = bytes.last() else { return false };
    if last != b')' && last != b']' {
        return false;
    }
    let open = if last == b')' { b'(' } else { b'[' };
    let close = last;
    let mut depth = 0i32;
    let mut i = bytes.len();
    while i > 0 {
        i -= 1;
        match bytes[i] {
            b if b == close => depth += 1,
            b if b == open => {
                depth -= 1;
                if depth == 0 {
                    return i > 0 && is_callee_char(bytes[i - 1]);
                }
            }
            _ => {}
        }
    }
    false
}

fn is_callee_char(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_' || b == b'.' || b == b']' || b == b')'
}

fn contains_top_level_assignment(line: &str) -> bool {
    let bytes = line.as_bytes();
    let mut depth = 0i32;
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'(' | b'[' | b'{' => depth += 1,
            b')' | b']' | b'}' => depth -= 1,
            b'=' if depth == 0 => {
                let prev = i.checked_sub(1).map(|p| bytes[p]);
                let next = bytes.get(i + 1).copied();
                let is_comparison = matches!(next, Some(b'=')) || matches!(prev, Some(b'!' | b'<' | b'>' | b'='));
                if !is_comparison {
                    return true;
                }
            }
            _ => {}
        }
        i += 1;
    }
    false
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
struct Depth {
    brackets: i32,
    triple_quote: Option<char>,
}

impl Depth {
    fn is_zero(&self) -> bool {
        self.brackets == 0 && self.triple_quote.is_none()
    }
}

fn scan_depth(lines: &[String]) -> Option<Depth> {
    let mut depth = Depth::default();
    for line in lines {
        depth = step_depth(depth, line)?;
    }
    Some(depth)
}

fn step_depth(mut depth: Depth, line: &str) -> Option<Depth> {
    let chars: Vec<char> = line.chars().collect();
    let mut i = 0;
    while i < chars.len() {
        if let Some(q) = depth.triple_quote {
            if chars[i..].starts_with(&[q, q, q]) {
                depth.triple_quote = None;
                i += 3;
                continue;
            }
            i += 1;
            continue;
        }
        match chars[i] {
            '#' => break,
            '\'' | '"' if chars[i..].starts_with(&[chars[i], chars[i], chars[i]]) => {
                depth.triple_quote = Some(chars[i]);
                i += 3;
            }
            '\'' | '"' => {
                let quote = chars[i];
                i += 1;
                while i < chars.len() && chars[i] != quote {
                    if chars[i] == '\\' {
                        i += 1;
                    }
                    i += 1;
                }
                i += 1;
            }
            '(' | '[' | '{' => {
                depth.brackets += 1;
                i += 1;
            }
            ')' | ']' | '}' => {
                depth.brackets -= 1;
                if depth.brackets < 0 {
                    return None;
                }
                i += 1;
            }
            _ => i += 1,
        }
    }
    if depth.triple_quote.is_none() && line.trim_end().ends_with('\\') && depth.brackets == 0 {
        depth.brackets += 1;
        return Some(depth);
    }
    Some(depth)
}

/// Recognizes `# doctest: +NAME` / `# doctest: -NAME` style comments.
#[derive(Clone, Copy, Debug, Default)]
pub struct HeuristicDirectiveExtractor;

fn comment_body(line: &str, hash: usize) -> &str {
    line[hash + 1..].trim_start()
}

impl DirectiveExtractor for HeuristicDirectiveExtractor {
    fn extract(&self, text: &str) -> Result<Vec<Directive>, DirectiveError> {
        let mut out = Vec::new();
        for line in text.lines() {
            let Some(hash) = line.find('#') else { continue };
            let comment = comment_body(line, hash);
            let Some(rest) = comment.strip_prefix("xdoctest:").or_else(|| comment.strip_prefix("doctest:")) else {
                continue;
            };
            for token in rest.split(',') {
                let token = token.trim();
                let Some((sign, name)) = token.split_at_checked(1) else { continue };
                let polarity = match sign {
                    "+" => Polarity::Enable,
                    "-" => Polarity::Disable,
                    _ => continue,
                };
                if name.trim().is_empty() {
                    continue;
                }
                let scope = if line.trim_start().starts_with('#') {
                    DirectiveScope::Block
                } else {
                    DirectiveScope::Inline
                };
                out.push(Directive { name: name.trim().to_string(), polarity, scope });
            }
        }
        Ok(out)
    }
}
