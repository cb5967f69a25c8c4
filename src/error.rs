//! Error types for setup and solving.

use thiserror::Error;

/// Fatal errors raised by [`crate::solver::setup`]. None of these are retryable;
/// the caller must fix the inputs.
#[derive(Debug, Error)]
pub enum SetupError {
    #[error("input graphs mix directed and undirected edges")]
    MixedDirectedness,

    #[error("node attribute `{attr}` is missing from the example graph")]
    MissingColorAttribute { attr: String },

    #[error("template #{template_index} has no isomorphism into the example graph")]
    NoIsomorphism { template_index: usize },

    #[error("no output-graph node is covered by any template isomorphism")]
    EmptyCoverage,

    #[error("at least one template graph is required")]
    NoTemplates,
}

/// The outcome of a single [`crate::solver::SolverState::run`] call.
///
/// A contradiction is not a Rust `Err` — per the design, it is a normal,
/// typed outcome that the driver may recover from with `reset` + `run`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome<N> {
    Success,
    Contradiction { at_node: N, step: usize },
}

impl<N> RunOutcome<N> {
    pub fn is_success(&self) -> bool {
        matches!(self, RunOutcome::Success)
    }
}
