//! Counters over the history of a context.

use std::time::Duration;

use crate::generic::luby::Luby;

/// Counters over the history of a context.
pub struct Counters {
    /// A count of every conflict seen.
    pub total_conflicts: usize,

    /// A count of conflicts seen since the last restart.
    pub fresh_conflicts: u32,

    /// A count of every decision made.
    pub total_decisions: usize,

    /// A count of iterations of the solve loop.
    pub total_iterations: usize,

    /// A count of restarts.
    pub restarts: usize,

    /// A count of models found.
    pub models_found: usize,

    /// A count of literals derived by the aggregate propagator.
    pub aggregate_propagations: usize,

    /// A count of non-empty unfounded sets found.
    pub unfounded_sets: usize,

    /// The luby sequence used for scheduling restarts.
    pub luby: Luby,

    /// Time spent in the current solve.
    pub time: Duration,
}

impl Default for Counters {
    fn default() -> Self {
        Counters {
            total_conflicts: 0,
            fresh_conflicts: 0,
            total_decisions: 0,
            total_iterations: 0,
            restarts: 0,
            models_found: 0,
            aggregate_propagations: 0,
            unfounded_sets: 0,
            luby: Luby::default(),
            time: Duration::from_secs(0),
        }
    }
}
