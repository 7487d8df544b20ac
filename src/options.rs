//! Parser configuration, following the `ScannerConfig` pattern used
//! elsewhere in this codebase for small, `Default`-able option structs.

/// Options controlling how a docstring is packaged into [`crate::Part`]s.
#[derive(Clone, Debug, Default)]
pub struct ParserOptions {
    /// When `true`, emit one Part per top-level statement (as if simulating
    /// an interactive REPL session) instead of grouping statements by their
    /// nearest trailing want (§4.3 step 5).
    pub simulate_repl: bool,

    /// An alternate single-line marker that, like the bare `"..."`
    /// output-ellipsis sentinel, forces the line it appears on to be
    /// classified `WANT` rather than re-evaluated as source. `None` leaves
    /// the grammar exactly as specified (§6.3).
    pub want_marker: Option<String>,

    /// Opaque passthrough recorded on every emitted `Part`; this parser does
    /// not interpret it. Lets a caller thread an execution-context hint
    /// through without widening the parser's own contract.
    pub global_exec_context: bool,
}

impl ParserOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_simulate_repl(mut self, simulate_repl: bool) -> Self {
        self.simulate_repl = simulate_repl;
        self
    }

    pub fn with_want_marker(mut self, marker: impl Into<String>) -> Self {
        self.want_marker = Some(marker.into());
        self
    }
}
