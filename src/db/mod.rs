/*!
The databases of the context.

- The [atom database](atom) holds the valuation, together with the level, trail position, and
  source of each assignment.
- The [clause database](clause) holds the formula, original and derived.
- The [trail](trail) logs assignments in order, with per-level indices.
- The [watches](watches) record which clauses are watching which literals.
*/

use crate::{structures::literal::CLiteral, types::err};

pub mod atom;
pub mod clause;
pub mod trail;
pub mod watches;

/// A decision level — the number of decisions made prior to the assignments of the level.
pub type LevelIndex = u32;

/// The index to a stored clause.
pub type FormulaIndex = u32;

/// A key to access a clause stored in the clause database.
///
/// Non-unit clauses are stored in indexed structures, distinguished by whether the clause was
/// part of the original formula or an addition (learned, completion, loop formula, etc.).
/// Unit clauses are not stored — the key carries the literal itself.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ClauseKey {
    /// The key to a unit clause contains the (unit) clause.
    Unit(CLiteral),

    /// The key to an original clause.
    Original(FormulaIndex),

    /// The key to an addition.
    Addition(FormulaIndex),
}

impl ClauseKey {
    /// Extracts the index from a key.
    pub fn index(&self) -> usize {
        match self {
            Self::Unit(literal) => literal.atom() as usize,
            Self::Original(index) | Self::Addition(index) => *index as usize,
        }
    }

    /// True if the key identifies a stored, non-unit, clause.
    pub fn stored(&self) -> bool {
        !matches!(self, Self::Unit(_))
    }
}

impl std::fmt::Display for ClauseKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unit(literal) => write!(f, "Unit({literal})"),
            Self::Original(index) => write!(f, "Original({index})"),
            Self::Addition(index) => write!(f, "Addition({index})"),
        }
    }
}

/// Errors from key resolution, folded into the general error type.
pub(crate) fn missing_clause_error(key: &ClauseKey) -> err::ErrorKind {
    log::error!(target: crate::misc::log::targets::CLAUSE_DB, "Missing clause for {key}.");
    err::ErrorKind::BCP(err::BCPError::CorruptWatch)
}
