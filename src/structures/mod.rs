/*!
The abstract elements of an extended formula, and their representations.

- [Atoms](atom), to which truth values are assigned.
- [Literals](literal), atoms paired with a polarity.
- [Clauses](clause), disjunctions of literals.
- [Weights](weight), the arithmetic domain of aggregates.
- [Aggregates](aggregate), numeric predicates over sets of weighted literals.
- [Consequences](consequence), the sources of assignments.
*/

pub mod aggregate;
pub mod atom;
pub mod clause;
pub mod consequence;
pub mod literal;
pub mod weight;
