/*!
Error types used in the library.

- Most of these are very unlikely to occur during use.
- Some of these are internally expected --- e.g. BCP errors are used to control the flow of a
  solve, and a conflict is a value returned along the propagation path, never a panic.
- Others are external --- e.g. a request to add a product aggregate over a set containing a zero
  weight returns a [ParseError], and the context may continue to be used.

Names of the error enums --- for the most part --- overlap with the corresponding areas of the
library, and so throughout the library `err::{self}` is often used to prefix use of the types.
*/

use crate::{db::ClauseKey, structures::atom::Atom, structures::aggregate::SetId};

/// A union of varied error kinds.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ErrorKind {
    /// An error during conflict analysis.
    Analysis(AnalysisError),

    /// An error when building a context.
    Build(BuildError),

    /// An error related to boolean constraint propagation.
    BCP(BCPError),

    /// An error related to structural input (sets, aggregates, rules).
    Parse(ParseError),

    /// An error in the aggregate propagator.
    Aggregate(AggError),

    /// An error in the definition propagator.
    Definition(DefinitionError),

    /// An error related to the state of the context.
    State(StateError),

    /// Weight arithmetic exceeded the fixed-width backend.
    Overflow,

    /// An error related to backjumping.
    Backjump,

    /// There are no more fresh atoms.
    AtomsExhausted,

    /// A fundamental conflict has been observed (and recorded).
    FundamentalConflict,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Overflow => write!(
                f,
                "Aggregate weight arithmetic overflowed the 64-bit backend — the `bigint` feature avoids this."
            ),
            _ => write!(f, "{self:?}"),
        }
    }
}

/// An error during conflict analysis.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum AnalysisError {
    /// Somehow resolution resolved to an empty clause.
    EmptyResolution,

    /// Resolution failed to terminate with an asserting clause.
    NoAssertion,

    /// A reason was requested for a literal with no recorded reason.
    MissingReason,
}

impl From<AnalysisError> for ErrorKind {
    fn from(e: AnalysisError) -> Self {
        ErrorKind::Analysis(e)
    }
}

/// Noted errors during boolean constraint propagation.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum BCPError {
    /// A conflict was found.
    /// This is expected from time to time, and a learning opportunity.
    Conflict(ClauseKey),

    /// Some corruption in the watched literals of a clause.
    /// This is unexpected.
    CorruptWatch,
}

impl From<BCPError> for ErrorKind {
    fn from(e: BCPError) -> Self {
        ErrorKind::BCP(e)
    }
}

/// Noted errors when building a context.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum BuildError {
    /// A clear instance of an unsatisfiable clause.
    Unsatisfiable,
}

impl From<BuildError> for ErrorKind {
    fn from(e: BuildError) -> Self {
        ErrorKind::Build(e)
    }
}

/// Errors related to structural input — sets, aggregates, rules, and objectives.
///
/// These are surfaced immediately to the caller, before any search takes place.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ParseError {
    /// A set with the given id has already been added.
    DuplicateSetId(SetId),

    /// An aggregate referenced a set which has not been added.
    UnknownSetId(SetId),

    /// Sets may not be empty.
    EmptySet,

    /// Set weights may not be negative.
    NegativeWeight,

    /// A product aggregate over a set containing a zero weight.
    ZeroProductWeight,

    /// A product aggregate over a set containing a literal in both polarities.
    BothPolaritiesInProduct,

    /// Aggregates sharing a set must share the type of the set.
    KindMismatch(SetId),

    /// The head of a definitional aggregate must be a positive literal.
    NegativeDefinedHead,

    /// The atom is defined both by rules and by a definitional aggregate.
    MultipleDefinitions(Atom),

    /// A recursive aggregate with a shape unfounded set reasoning does not cover.
    ///
    /// Definitional aggregates inside a positive cycle are restricted to lower-bound sum and
    /// cardinality constraints, which are monotone.
    UnsupportedRecursiveAggregate(Atom),

    /// A second minimization objective was given.
    MultipleObjectives,
}

impl From<ParseError> for ErrorKind {
    fn from(e: ParseError) -> Self {
        ErrorKind::Parse(e)
    }
}

/// Errors in the aggregate propagator.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum AggError {
    /// An explanation was requested for a literal the propagator has no reason for.
    MissingReason,

    /// A set index failed to resolve.
    MissingSet,

    /// Some corruption in a watched-literal pool.
    CorruptWatch,
}

impl From<AggError> for ErrorKind {
    fn from(e: AggError) -> Self {
        ErrorKind::Aggregate(e)
    }
}

/// Errors in the definition propagator.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum DefinitionError {
    /// A defined atom was expected to carry definition information.
    MissingDefinition,

    /// A source pointer referenced a rule which does not define its head.
    CorruptSource,
}

impl From<DefinitionError> for ErrorKind {
    fn from(e: DefinitionError) -> Self {
        ErrorKind::Definition(e)
    }
}

/// Errors due to the state of the context.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StateError {
    /// The theory has been frozen by `finish_parsing`, and the operation belongs to parsing.
    TheoryFrozen,

    /// The operation requires a frozen theory.
    ParsingIncomplete,

    /// Resetting the residual state after a completed search is not (yet) implemented.
    NotYetImplemented,
}

impl From<StateError> for ErrorKind {
    fn from(e: StateError) -> Self {
        ErrorKind::State(e)
    }
}
