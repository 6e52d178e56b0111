/*!
Miscellaneous items related to [logging](log).

Calls to the log macro are made throughout the library.
These are intended to provide useful information for extending the library and/or fixing issues.

Note, no log implementation is provided.
For more details, see [log].
*/

/// Targets to be used within a [log]! macro.
pub mod targets {
    /// Logs related to [BCP](crate::procedures::bcp).
    pub const PROPAGATION: &str = "propagation";

    /// Logs related to [analysis](crate::procedures::analysis).
    pub const ANALYSIS: &str = "analysis";

    /// Logs related to the [clause database](crate::db::clause).
    pub const CLAUSE_DB: &str = "clause_db";

    /// Logs related to a valuation.
    pub const VALUATION: &str = "valuation";

    /// Logs related to [backjumping](crate::procedures::backjump).
    pub const BACKJUMP: &str = "backjump";

    /// Logs related to the [aggregate propagator](crate::propagators::aggregate).
    pub const AGGREGATE: &str = "aggregate";

    /// Logs related to the [definition propagator](crate::propagators::definition).
    pub const DEFINITION: &str = "definition";

    /// Logs related to unfounded set search.
    pub const UNFOUNDED: &str = "unfounded";

    /// Logs related to [lazy grounding residuals](crate::propagators::residual).
    pub const RESIDUAL: &str = "residual";

    /// Logs related to theory finalization.
    pub const FINALIZE: &str = "finalize";
}
