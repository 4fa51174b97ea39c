use tracing::{Level, Span};

use super::RunId;

/// Root span for one load → evaluate → save cycle.
pub fn root_span(name: &'static str, run_id: &RunId) -> Span {
    tracing::span!(Level::INFO, "run", name = name, run_id = %run_id)
}

/// Child span for a phase of the run (inherits `run_id` from the root).
pub fn child_span(name: &'static str) -> Span {
    tracing::span!(Level::INFO, "phase", name = name)
}
