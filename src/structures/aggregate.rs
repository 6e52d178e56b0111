/*!
The public shape of aggregate constraints.

An aggregate is a numeric predicate over a set of weighted literals, compared against a bound, and
(optionally) reifying a boolean head: `head ⟷ fold(set) ▷ bound`.

The structures here are those given to the context during parsing — the aggregate propagator
builds its own typed sets from these, see [propagators::aggregate](crate::propagators::aggregate).
*/

use crate::structures::{literal::CLiteral, weight::Weight};

/// An external identifier for a weighted set.
pub type SetId = u32;

/// The fold applied to a weighted set.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AggKind {
    /// The sum of the weights of true literals.
    Sum,

    /// The count of true literals.
    Card,

    /// The product of the weights of true literals.
    Prod,

    /// The minimum weight among true literals.
    ///
    /// Normalized at finalization to a [Max](AggKind::Max) over negated weights.
    Min,

    /// The maximum weight among true literals.
    Max,
}

impl std::fmt::Display for AggKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sum => write!(f, "sum"),
            Self::Card => write!(f, "card"),
            Self::Prod => write!(f, "prod"),
            Self::Min => write!(f, "min"),
            Self::Max => write!(f, "max"),
        }
    }
}

/// The sense of an aggregate bound.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AggSign {
    /// The fold is at most the bound (an upper bound).
    AtMost,

    /// The fold is at least the bound (a lower bound).
    AtLeast,
}

/// How the head of an aggregate relates to the constraint.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AggSemantics {
    /// The head is a defined atom: equivalence, participating in unfounded set reasoning.
    Definitional,

    /// The head holds exactly when the constraint holds.
    Equivalence,

    /// The head implies the constraint, and nothing follows from a false head.
    Implication,
}

/// A literal paired with a weight.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WeightedLiteral {
    /// The literal.
    pub literal: CLiteral,

    /// The weight the literal contributes when true.
    pub weight: Weight,
}

impl WeightedLiteral {
    /// A fresh weighted literal.
    pub fn new(literal: CLiteral, weight: Weight) -> Self {
        WeightedLiteral { literal, weight }
    }
}

impl std::fmt::Display for WeightedLiteral {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}={}", self.literal, self.weight)
    }
}

/// A minimization objective.
///
/// After each model the objective is tightened and search resumes — the last model found is
/// optimal.
#[derive(Clone, Debug)]
pub enum MinimizeObjective {
    /// Minimize the set of true literals among those given, under subset inclusion.
    Subset(Vec<CLiteral>),

    /// Minimize the given literals lexicographically, earlier literals weighing more.
    OrderedList(Vec<CLiteral>),

    /// Prefer the given literal false.
    SingleLiteral(CLiteral),

    /// Minimize the fold of the identified set.
    Aggregate {
        /// The set to fold.
        set: SetId,

        /// The fold to minimize.
        kind: AggKind,
    },
}
