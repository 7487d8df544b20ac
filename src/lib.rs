//! Parses a docstring into an ordered sequence of narrative text and
//! executable doctest [`Part`]s.
//!
//! The pipeline is three stages — [`labeler`] classifies every physical line
//! as text, source, or expected output; [`grouper`] run-length-compresses the
//! classified lines into text runs and `(source, want)` pairs; [`packager`]
//! turns each pair into one or more [`Part`]s, splitting at statement and
//! directive boundaries. The pipeline is generic over three collaborators —
//! [`collaborators::BalanceOracle`], [`collaborators::DirectiveExtractor`],
//! and [`collaborators::AstParser`] — so a caller can plug in a real grammar
//! for whatever scripting language its doctests are written in; the
//! [`collaborators::heuristic`] module supplies a dependency-free default.
//!
//! # Example
//! ```rust
//! let emitted = doctest_parser::parse(">>> 2 + 2\n4\n").unwrap();
//! assert_eq!(emitted.len(), 1);
//! let part = emitted[0].as_part().unwrap();
//! assert_eq!(part.exec_lines, vec!["2 + 2".to_string()]);
//! assert!(part.use_eval);
//! ```

pub mod collaborators;
pub mod error;
pub mod grouper;
pub mod labeler;
pub mod model;
pub mod options;
pub mod packager;

pub use collaborators::{
    AstNode, AstParser, BalanceOracle, Directive, DirectiveExtractor, DirectiveScope, NodeKind,
    Polarity,
};
pub use error::{AstError, BalanceError, DirectiveError, DoctestParseError, Marker};
pub use model::{Emitted, Group, LabeledLine, LineKind, Part};
pub use options::ParserOptions;

use collaborators::heuristic::{HeuristicAstParser, HeuristicDirectiveExtractor, HeuristicOracle};
use model::Group as ModelGroup;

impl Emitted {
    /// Borrows the inner [`Part`], or `None` if this item is narrative text.
    pub fn as_part(&self) -> Option<&Part> {
        match self {
            Emitted::Part(part) => Some(part),
            Emitted::Text(_) => None,
        }
    }

    /// Borrows the inner text, or `None` if this item is an executable part.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Emitted::Text(text) => Some(text),
            Emitted::Part(_) => None,
        }
    }
}

/// Parses `docstring` with the bundled [`collaborators::heuristic`]
/// implementations and default [`ParserOptions`].
///
/// This is a convenience entrypoint for callers who don't need a real
/// host-language grammar. Production use should construct a [`Parser`] with
/// collaborators backed by an actual parser for the doctests' scripting
/// language.
pub fn parse(docstring: &str) -> Result<Vec<Emitted>, DoctestParseError> {
    let oracle = HeuristicOracle;
    let directives = HeuristicDirectiveExtractor;
    let ast = HeuristicAstParser;
    Parser::new(&oracle, &directives, &ast).parse(docstring)
}

/// A configured doctest parser: three collaborator implementations plus
/// [`ParserOptions`], reused across any number of [`Parser::parse`] calls.
pub struct Parser<'c> {
    oracle: &'c dyn BalanceOracle,
    directives: &'c dyn DirectiveExtractor,
    ast: &'c dyn AstParser,
    options: ParserOptions,
}

impl<'c> Parser<'c> {
    pub fn new(
        oracle: &'c dyn BalanceOracle,
        directives: &'c dyn DirectiveExtractor,
        ast: &'c dyn AstParser,
    ) -> Self {
        Self { oracle, directives, ast, options: ParserOptions::default() }
    }

    pub fn with_options(mut self, options: ParserOptions) -> Self {
        self.options = options;
        self
    }

    /// Parses `docstring`, producing narrative text and executable [`Part`]s
    /// in the order they appear.
    pub fn parse(&self, docstring: &str) -> Result<Vec<Emitted>, DoctestParseError> {
        self.parse_with_info(docstring, None)
    }

    /// As [`Parser::parse`], attaching `info` as caller context on any
    /// [`DoctestParseError`] this call raises (§6.2).
    pub fn parse_with_info(
        &self,
        docstring: &str,
        info: Option<&str>,
    ) -> Result<Vec<Emitted>, DoctestParseError> {
        let normalized = normalize_docstring(docstring);
        self.run(&normalized, info).map_err(|err| err.with_info(info.map(str::to_string)))
    }

    fn run(&self, normalized: &str, info: Option<&str>) -> Result<Vec<Emitted>, DoctestParseError> {
        let want_marker = self.options.want_marker.as_deref();
        let labeled = labeler::label_with_marker(normalized, self.oracle, want_marker)?;
        log::debug!("parse: labeled {} lines", labeled.len());

        let groups = grouper::group(&labeled);
        log::debug!("parse: grouped into {} groups", groups.len());

        let mut out = Vec::with_capacity(groups.len());
        let mut base_lineno = 0usize;

        for group in groups {
            match group {
                ModelGroup::Text(lines) => {
                    base_lineno += lines.len();
                    if !lines.is_empty() {
                        let mut text = String::new();
                        for line in &lines {
                            text.push_str(line);
                            text.push('\n');
                        }
                        out.push(Emitted::Text(text));
                    }
                }
                ModelGroup::Block { src, want } => {
                    let group_len = src.len() + want.len();
                    if src.is_empty() {
                        // Defensive: the labeler never emits a WANT run with
                        // no preceding SRC run, but the grouper's fallback
                        // arm (model.rs) can still construct one.
                        base_lineno += group_len;
                        continue;
                    }

                    let parts = packager::package(
                        &src,
                        &want,
                        base_lineno,
                        self.oracle,
                        self.directives,
                        self.ast,
                        &self.options,
                        normalized,
                    )
                    .map_err(|err| err.with_info(info.map(str::to_string)))?;

                    log::debug!(
                        "parse: packaged group at line {base_lineno} into {} part(s)",
                        parts.len()
                    );
                    out.extend(parts.into_iter().map(Emitted::Part));
                    base_lineno += group_len;
                }
            }
        }

        Ok(out)
    }
}

/// Expands tabs and strips the docstring's minimum common indentation.
///
/// Mirrors the original implementation's preprocessing (SPEC_FULL.md §B.2):
/// a single leading blank line is dropped before common indentation is
/// measured, so a docstring opened with `"""\n    >>> ...` indents the same
/// as one opened `""">>> ...`. Tabs expand to the next multiple of 8 columns,
/// matching Python's `str.expandtabs()` default.
fn normalize_docstring(docstring: &str) -> String {
    let expanded = expand_tabs(docstring);
    let mut lines: Vec<&str> = expanded.split('\n').collect();

    if lines.first().is_some_and(|l| l.trim().is_empty()) && lines.len() > 1 {
        lines.remove(0);
    }

    let common_indent = lines
        .iter()
        .filter(|l| !l.trim().is_empty())
        .map(|l| l.chars().take_while(|c| *c == ' ').count())
        .min()
        .unwrap_or(0);

    lines
        .into_iter()
        .map(|l| {
            if l.trim().is_empty() {
                String::new()
            } else {
                l.chars().skip(common_indent).collect()
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn expand_tabs(text: &str) -> String {
    if !text.contains('\t') {
        return text.to_string();
    }
    let mut out = String::with_capacity(text.len());
    for line in text.split('\n') {
        let mut col = 0usize;
        for ch in line.chars() {
            if ch == '\t' {
                let spaces = 8 - (col % 8);
                out.push_str(&" ".repeat(spaces));
                col += spaces;
            } else {
                out.push(ch);
                col += 1;
            }
        }
        out.push('\n');
    }
    out.pop();
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scenario_a_two_assignments_then_print() {
        let emitted = parse(">>> x = 1\n>>> print(x)\n1\n").unwrap();
        assert_eq!(emitted.len(), 2);
        let p1 = emitted[0].as_part().unwrap();
        assert_eq!(p1.exec_lines, vec!["x = 1".to_string()]);
        assert!(p1.want_lines.is_none());
        let p2 = emitted[1].as_part().unwrap();
        assert_eq!(p2.exec_lines, vec!["print(x)".to_string()]);
        assert_eq!(p2.want_lines, Some(vec!["1".to_string()]));
        assert!(!p2.use_eval);
    }

    #[test]
    fn scenario_b_bare_expression_uses_eval() {
        let emitted = parse(">>> 2 + 2\n4\n").unwrap();
        assert_eq!(emitted.len(), 1);
        let part = emitted[0].as_part().unwrap();
        assert_eq!(part.want_lines, Some(vec!["4".to_string()]));
        assert!(part.use_eval);
    }

    #[test]
    fn scenario_c_multiline_bracket_statement() {
        let doc = ">>> x = [1, 2,\n>>> 3, 4]\n>>> print(len(x))\n4\n";
        let emitted = parse(doc).unwrap();
        assert_eq!(emitted.len(), 2);
        let p1 = emitted[0].as_part().unwrap();
        assert_eq!(p1.exec_lines, vec!["x = [1, 2,".to_string(), "3, 4]".to_string()]);
        assert!(p1.want_lines.is_none());
        let p2 = emitted[1].as_part().unwrap();
        assert_eq!(p2.exec_lines, vec!["print(len(x))".to_string()]);
        assert_eq!(p2.want_lines, Some(vec!["4".to_string()]));
    }

    #[test]
    fn scenario_e_text_surrounded_block() {
        let doc = "prelude\n\n    >>> 1 + 1\n    2\n\npostlude\n";
        let emitted = parse(doc).unwrap();
        assert_eq!(emitted.len(), 3);
        assert_eq!(emitted[0].as_text().unwrap(), "prelude\n\n");
        let part = emitted[1].as_part().unwrap();
        assert_eq!(part.exec_lines, vec!["1 + 1".to_string()]);
        assert_eq!(part.want_lines, Some(vec!["2".to_string()]));
        assert_eq!(emitted[2].as_text().unwrap(), "\npostlude\n");
    }

    #[test]
    fn scenario_f_directive_mid_block() {
        let doc = ">>> a = 1\n>>> # xdoctest: +SKIP\n>>> b = 2\n";
        let emitted = parse(doc).unwrap();
        assert_eq!(emitted.len(), 3);
        assert!(emitted[0].as_part().unwrap().directives.is_empty());
        assert_eq!(emitted[1].as_part().unwrap().directives.len(), 1);
        assert!(emitted[2].as_part().unwrap().directives.is_empty());
    }

    #[test]
    fn empty_input_is_empty_output() {
        assert_eq!(parse("").unwrap(), Vec::new());
    }

    #[test]
    fn text_only_input_round_trips() {
        let emitted = parse("just some narrative text\nno code here\n").unwrap();
        assert_eq!(emitted.len(), 1);
        assert_eq!(emitted[0].as_text().unwrap(), "just some narrative text\nno code here\n");
    }

    #[test]
    fn source_without_want_is_normal() {
        let emitted = parse(">>> x = 1\n>>> y = 2\n").unwrap();
        assert_eq!(emitted.len(), 1);
        let part = emitted[0].as_part().unwrap();
        assert!(part.want_lines.is_none());
        assert_eq!(part.exec_lines.len(), 2);
    }

    #[test]
    fn line_offsets_are_non_decreasing() {
        let doc = "intro\n>>> a = 1\n1\nmiddle\n>>> b = 2\n2\n";
        let emitted = parse(doc).unwrap();
        let offsets: Vec<usize> =
            emitted.iter().filter_map(Emitted::as_part).map(|p| p.line_offset).collect();
        assert!(offsets.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn unbalanced_statement_is_a_parse_error() {
        let err = parse(">>> x = [1, 2,\n").unwrap_err();
        assert!(matches!(err, DoctestParseError::Unbalanced { .. }));
    }

    #[test]
    fn info_context_is_attached_to_errors() {
        let oracle = HeuristicOracle;
        let directives = HeuristicDirectiveExtractor;
        let ast = HeuristicAstParser;
        let parser = Parser::new(&oracle, &directives, &ast);
        let err = parser.parse_with_info(">>> x = [1, 2,\n", Some("mymodule.myfunc")).unwrap_err();
        assert_eq!(err.info(), Some("mymodule.myfunc"));
    }

    #[test]
    fn common_indent_and_tabs_are_normalized() {
        let doc = "\t>>> 1 + 1\n\t2\n";
        let emitted = parse(doc).unwrap();
        let part = emitted[0].as_part().unwrap();
        assert_eq!(part.exec_lines, vec!["1 + 1".to_string()]);
        assert_eq!(part.want_lines, Some(vec!["2".to_string()]));
    }

    #[test]
    fn simulate_repl_emits_one_part_per_statement() {
        let oracle = HeuristicOracle;
        let directives = HeuristicDirectiveExtractor;
        let ast = HeuristicAstParser;
        let parser = Parser::new(&oracle, &directives, &ast)
            .with_options(ParserOptions::new().with_simulate_repl(true));
        let emitted = parser.parse(">>> x = 1\n>>> print(x)\n1\n").unwrap();
        assert_eq!(emitted.len(), 2);
        assert!(emitted[0].as_part().unwrap().want_lines.is_none());
        assert_eq!(emitted[1].as_part().unwrap().want_lines, Some(vec!["1".to_string()]));
    }

    #[test]
    fn want_marker_acts_like_ellipsis_sentinel() {
        // "... DONE" would otherwise satisfy the PS2-continuation prefix
        // test and be classified SRC, same as the bare "..." sentinel; the
        // configured marker reroutes it to WANT instead.
        let oracle = HeuristicOracle;
        let directives = HeuristicDirectiveExtractor;
        let ast = HeuristicAstParser;
        let parser = Parser::new(&oracle, &directives, &ast)
            .with_options(ParserOptions::new().with_want_marker("... DONE"));
        let emitted = parser.parse(">>> print('a')\n... DONE\n").unwrap();
        assert_eq!(emitted.len(), 1);
        let part = emitted[0].as_part().unwrap();
        assert_eq!(part.want_lines, Some(vec!["... DONE".to_string()]));
    }
}
