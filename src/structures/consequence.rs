/*!
Sources of assignments.

Each assignment on the trail pairs an atom-value bind — represented as a literal — with a source
noting the direct ancestor of the assignment.
The source is consulted during conflict analysis: a clause key is resolved against directly, while
an aggregate source leads to a request for the aggregate propagator to materialize an explanation
clause on demand.
*/

use crate::db::ClauseKey;

/// The immediate reason why an atom-value bind holds.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[allow(clippy::upper_case_acronyms)]
pub enum AssignmentSource {
    /// No assignment has been made — the default for a fresh atom.
    None,

    /// A decision.
    Decision,

    /// An original (unit) clause.
    Original,

    /// An addition (unit) clause.
    Addition,

    /// A consequence of boolean constraint propagation.
    ///
    /// Loop formulas and lazily added clauses propagate through this source too, as each is
    /// materialized in the clause database before use.
    BCP(ClauseKey),

    /// A consequence derived by the aggregate propagator.
    ///
    /// The propagator holds a reason record for the atom, from which an explanation clause is
    /// built on request.
    Aggregate,
}
