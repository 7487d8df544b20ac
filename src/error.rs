//! Error types for the doctest parser and its collaborators.

use thiserror::Error;

/// A 0-based line position inside a docstring, used for error reporting.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub struct Marker {
    pub line: usize,
}

impl Marker {
    #[inline]
    pub fn at(line: usize) -> Self {
        Self { line }
    }
}

/// Error raised by a [`crate::collaborators::BalanceOracle`] implementation.
#[derive(Debug, Error)]
#[error("balance oracle failed: {0}")]
pub struct BalanceError(pub String);

/// Error raised by a [`crate::collaborators::DirectiveExtractor`] implementation.
#[derive(Debug, Error)]
#[error("directive extraction failed: {0}")]
pub struct DirectiveError(pub String);

/// Error raised by a [`crate::collaborators::AstParser`] implementation.
#[derive(Debug, Error)]
#[error("syntax error: {0}")]
pub struct AstError(pub String);

/// The single error surface exposed by [`crate::parse`].
///
/// Every variant carries the original docstring and any caller-supplied
/// `info` context, so a caller can re-render the failure without re-parsing.
#[derive(Debug, Error)]
pub enum DoctestParseError {
    #[error("unbalanced statement starting at line {line}")]
    Unbalanced {
        line: usize,
        #[source]
        cause: BalanceError,
        docstring: String,
        info: Option<String>,
    },

    #[error("inconsistent continuation indent at line {line}")]
    InconsistentContinuation {
        line: usize,
        docstring: String,
        info: Option<String>,
    },

    #[error("syntax error while parsing source block")]
    Syntax {
        #[source]
        cause: AstError,
        docstring: String,
        info: Option<String>,
    },
}

impl DoctestParseError {
    pub fn docstring(&self) -> &str {
        match self {
            Self::Unbalanced { docstring, .. }
            | Self::InconsistentContinuation { docstring, .. }
            | Self::Syntax { docstring, .. } => docstring,
        }
    }

    pub fn info(&self) -> Option<&str> {
        match self {
            Self::Unbalanced { info, .. }
            | Self::InconsistentContinuation { info, .. }
            | Self::Syntax { info, .. } => info.as_deref(),
        }
    }

    /// Attaches caller-supplied context, overwriting whatever was set when
    /// the error was first constructed deep in the pipeline.
    pub fn with_info(mut self, new_info: Option<String>) -> Self {
        match &mut self {
            Self::Unbalanced { info, .. }
            | Self::InconsistentContinuation { info, .. }
            | Self::Syntax { info, .. } => *info = new_info,
        }
        self
    }
}
