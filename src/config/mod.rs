/*!
Configuration of a context.

All configuration for a context is contained within [Config], owned by the context and consulted
by reference — there is no global, mutable, mode state.

The weight backend is selected at compile time via the `bigint` feature, see
[structures::weight](crate::structures::weight).
Verbosity is delegated to the [log] facade.
*/

use std::time::Duration;

/// The semantics applied to inductive definitions.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DefinitionSemantics {
    /// A unique three-valued model, consistent with the greatest unfounded set.
    WellFounded,

    /// A two-valued model in which every true defined atom has an external justification.
    Stable,
}

/// The strategy used to search for unfounded sets.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UnfoundedStrategy {
    /// Breadth-first from the atom which lost support.
    Bfs,

    /// Cycle sources are reordered by a recency heuristic before each search.
    Adaptive,
}

/// The primary configuration structure.
#[derive(Clone, Debug)]
pub struct Config {
    /// The semantics applied to inductive definitions.
    pub semantics: DefinitionSemantics,

    /// The strategy used to search for unfounded sets.
    pub ufs_strategy: UnfoundedStrategy,

    /// Fire every lazy grounding residual at the end of parsing, regardless of watched values.
    pub expand_lazy_immediately: bool,

    /// Sets larger than this threshold are candidates for the partially watched scheme.
    pub partial_watch_threshold: usize,

    /// The probability of assigning positive polarity to an atom when freely choosing a value.
    pub polarity_lean: f64,

    /// The probability of making a random decision in place of taking the most active atom.
    pub random_decision_bias: f64,

    /// Default to the last value of an atom when choosing a value for the atom.
    pub phase_saving: bool,

    /// Permit (luby scheduled) restarts.
    pub restarts: bool,

    /// The `u` value to multiply the luby sequence by when determining whether to restart.
    pub luby_u: u32,

    /// An optional time limit for a solve.
    pub time_limit: Option<Duration>,

    /// The initial activity bump for atoms involved in a conflict.
    pub atom_bump: f64,

    /// The decay factor applied to atom activity after each conflict.
    pub atom_decay: f64,
}

impl Default for Config {
    /// The default context is (roughly) configured to provide quick, deterministic, results on a
    /// library of tests.
    fn default() -> Self {
        Config {
            semantics: DefinitionSemantics::Stable,
            ufs_strategy: UnfoundedStrategy::Bfs,
            expand_lazy_immediately: false,
            partial_watch_threshold: 16,
            polarity_lean: 0.0,
            random_decision_bias: 0.0,
            phase_saving: true,
            restarts: true,
            luby_u: 128,
            time_limit: None,
            atom_bump: 1.0,
            atom_decay: 1.0 / 0.95,
        }
    }
}
