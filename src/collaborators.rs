//! External collaborators the parser consults but does not implement.
//!
//! Per the design this crate ports, three concerns are deliberately kept
//! outside the parser proper: whether a run of lines forms a syntactically
//! complete statement, what directives a fragment of source carries, and
//! where the host language's AST places its top-level statement boundaries.
//! The parser is generic over these (see [`Parser`](crate::Parser)) so a
//! caller can plug in a real grammar for whatever scripting language its
//! doctests are written in. The [`heuristic`] submodule supplies a
//! dependency-free default good enough to drive the unit and integration
//! tests in this crate.

pub mod heuristic;

use crate::error::{AstError, BalanceError, DirectiveError};

/// Reports whether a run of raw source lines forms one or more syntactically
/// complete top-level statements.
pub trait BalanceOracle {
    fn is_balanced(&self, lines: &[String]) -> Result<bool, BalanceError>;
}

/// Extracts directive tokens embedded in a fragment of source.
pub trait DirectiveExtractor {
    fn extract(&self, text: &str) -> Result<Vec<Directive>, DirectiveError>;
}

/// Reports the host language's top-level AST node boundaries for a joined
/// block of source.
pub trait AstParser {
    fn top_level_nodes(&self, text: &str) -> Result<Vec<AstNode>, AstError>;
}

/// A single directive token: a name, a polarity, and whether it applies to
/// the line it's found on or the whole surrounding block. The parser is
/// oblivious to directive semantics; it only uses a directive's presence to
/// decide where to split.
#[derive(Clone, PartialEq, Eq, Debug, serde::Serialize, serde::Deserialize)]
pub struct Directive {
    pub name: String,
    pub polarity: Polarity,
    pub scope: DirectiveScope,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, serde::Serialize, serde::Deserialize)]
pub enum Polarity {
    Enable,
    Disable,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, serde::Serialize, serde::Deserialize)]
pub enum DirectiveScope {
    Inline,
    Block,
}

/// One top-level AST node, as reported by an [`AstParser`].
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct AstNode {
    /// 1-based line the node starts on, exactly as a host-language AST dump
    /// would report it (§6.1).
    pub start_line_1based: usize,
    pub kind: NodeKind,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum NodeKind {
    /// A bare, non-call expression statement — eligible for `use_eval`.
    Expression,
    /// A call expression statement (e.g. `print(x)`). Still a top-level
    /// expression-statement for the purpose of trailing-expression isolation,
    /// but never eligible for `use_eval`: its return value isn't what `want`
    /// compares against, since the call already produced its own output.
    Call,
    Other,
}
