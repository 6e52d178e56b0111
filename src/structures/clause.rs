/*!
Clauses, disjunctions of literals.

The canonical representation of a clause is a vector of literals, [CClause].
Clauses stored in the clause database carry a note of their [source](ClauseSource).
*/

use crate::structures::literal::CLiteral;

/// The canonical representation of a clause.
pub type CClause = Vec<CLiteral>;

/// The origin of a clause.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ClauseSource {
    /// Added during the parsing phase.
    Original,

    /// Derived by resolution during conflict analysis.
    Resolution,

    /// Part of the completion of an inductive definition.
    Completion,

    /// A loop formula, ruling out a self-supporting cycle.
    LoopFormula,

    /// A conflict clause materialized by the aggregate propagator.
    Aggregate,

    /// A clause blocking a found model during enumeration.
    Blocking,

    /// A clause tightening a minimization objective.
    Objective,

    /// A clause supplied by a lazy grounding callback during search.
    Grounding,
}

/// A string representation of a clause, for logs.
pub fn clause_string(clause: &[CLiteral]) -> String {
    let mut string = String::new();
    for literal in clause {
        string.push_str(&format!("{literal} "));
    }
    string.push('0');
    string
}
