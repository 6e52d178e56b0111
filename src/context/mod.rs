/*!
The context — to which constraints are added, and within which solves take place.

Strictly, a [GenericContext] and a [Context].

The generic context is parameterized to a source of randomness, and the canonical [Context] fixes
this to [MinimalPCG32](crate::generic::random::MinimalPCG32) so a context can be built from a
configuration alone.

The context owns every database and propagator: the clause database, the atom database, the
trail, the clause watches, the aggregate propagator, the definition propagator, and the lazy
grounding residuals.
Components reference each other by stable integer handles — atom indices, clause keys, set
indices — rather than by pointer, and destruction is batched when the context is dropped.

# Example
```rust
# use stoat_sat::context::Context;
# use stoat_sat::config::Config;
# use stoat_sat::reports::Report;
# use stoat_sat::structures::literal::CLiteral;
let mut ctx = Context::from_config(Config::default());

let p = ctx.fresh_atom().unwrap();
let q = ctx.fresh_atom().unwrap();

ctx.add_clause(vec![CLiteral::new(p, true), CLiteral::new(q, true)]).unwrap();
ctx.add_clause(vec![CLiteral::new(p, false)]).unwrap();

assert!(ctx.solve().is_ok());
assert_eq!(ctx.report(), Report::Satisfiable);
assert_eq!(ctx.value_of(p), Some(false));
assert_eq!(ctx.value_of(q), Some(true));
```
*/

mod counters;
pub use counters::Counters;

use rand::SeedableRng;

use crate::{
    config::Config,
    db::{
        ClauseKey,
        atom::{AtomDB, ValuationStatus},
        clause::ClauseDB,
        trail::Trail,
        watches::ClauseWatches,
    },
    generic::random::MinimalPCG32,
    misc::log::targets::{self},
    procedures::{analysis::AnalysisBuffer, optimize::ObjectiveState},
    propagators::{aggregate::Aggregates, definition::Definitions, residual::Residuals},
    reports::Report,
    structures::{atom::Atom, consequence::AssignmentSource, literal::CLiteral},
};

/// The state of a context.
#[derive(Debug, PartialEq, Eq)]
pub enum ContextState {
    /// The context allows for configuration.
    Configuration,

    /// The context allows input.
    Input,

    /// The database is known to be consistent, e.g. with a complete valuation.
    Satisfiable,

    /// The database is known to be inconsistent, e.g. with an unsatisfiable clause identified.
    Unsatisfiable(ClauseKey),

    /// The consistency of the database is unknown.
    Solving,
}

impl std::fmt::Display for ContextState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Configuration => write!(f, "Configuration"),
            Self::Input => write!(f, "Input"),
            Self::Satisfiable => write!(f, "Satisfiable"),
            Self::Unsatisfiable(_) => write!(f, "Unsatisfiable"),
            Self::Solving => write!(f, "Solving"),
        }
    }
}

/// A generic context, parameterized to a source of randomness.
///
/// Requires a source of [rng](rand::Rng) which (also) implements [Default] — the default is used
/// to take temporary ownership of the rng where required to appease the borrow checker.
pub struct GenericContext<R: rand::Rng + std::default::Default> {
    /// The configuration of the context.
    pub config: Config,

    /// Counters related to the context and solves within it.
    pub counters: Counters,

    /// The clause database.
    pub clause_db: ClauseDB,

    /// The atom database.
    pub atom_db: AtomDB,

    /// The trail of assignments.
    pub trail: Trail,

    /// Watch lists for clause propagation.
    pub watches: ClauseWatches,

    /// The aggregate propagator.
    pub aggregates: Aggregates,

    /// The definition propagator.
    pub definitions: Definitions,

    /// Lazy grounding residuals.
    pub residuals: Residuals,

    /// The minimization objective, if any.
    pub objective: Option<ObjectiveState>,

    /// Scratch space for conflict analysis, reused across conflicts.
    pub analysis: AnalysisBuffer,

    /// The state of the context.
    pub state: ContextState,

    /// The source of rng.
    pub rng: R,

    /// An optional callback checked at decision boundaries — a return of true interrupts the
    /// solve, leaving the trail consistent.
    pub callback_terminate: Option<Box<dyn FnMut() -> bool>>,
}

/// A context which uses [MinimalPCG32] as the source of randomness.
pub type Context = GenericContext<MinimalPCG32>;

impl Context {
    /// Creates a context from some given configuration.
    pub fn from_config(config: Config) -> Self {
        Self {
            counters: Counters::default(),
            clause_db: ClauseDB::default(),
            atom_db: AtomDB::new(config.atom_bump, config.atom_decay),
            trail: Trail::default(),
            watches: ClauseWatches::default(),
            aggregates: Aggregates::default(),
            definitions: Definitions::default(),
            residuals: Residuals::default(),
            objective: None,
            analysis: AnalysisBuffer::default(),
            state: ContextState::Configuration,
            rng: MinimalPCG32::from_seed(0_u64.to_le_bytes()),
            callback_terminate: None,

            config,
        }
    }
}

impl<R: rand::Rng + std::default::Default> GenericContext<R> {
    /// A report on the state of the context.
    pub fn report(&self) -> Report {
        match self.state {
            ContextState::Satisfiable => Report::Satisfiable,
            ContextState::Unsatisfiable(_) => Report::Unsatisfiable,
            _ => Report::Unknown,
        }
    }

    /// The value of the atom on the current valuation, if any.
    pub fn value_of(&self, atom: Atom) -> Option<bool> {
        self.atom_db.value_of(atom)
    }

    /// An iterator over every atom-value pair of the current valuation.
    pub fn valuation(&self) -> impl Iterator<Item = (Atom, Option<bool>)> + '_ {
        self.atom_db.valuation()
    }

    /// Sets a callback checked at decision boundaries — a return of true interrupts the solve.
    pub fn set_callback_terminate(&mut self, callback: Box<dyn FnMut() -> bool>) {
        self.callback_terminate = Some(callback);
    }

    /// Checks the termination callback, if one is set.
    pub fn check_callback_terminate(&mut self) -> bool {
        match &mut self.callback_terminate {
            Some(callback) => callback(),
            None => false,
        }
    }

    /// Records an assignment: the valuation is updated and, if the atom was unvalued, the
    /// literal is written to the trail.
    ///
    /// The returned status is that of the valuation update — on
    /// [Conflict](ValuationStatus::Conflict) nothing is recorded, and it is for the caller to
    /// raise the conflict.
    pub fn record_assignment(
        &mut self,
        literal: CLiteral,
        source: AssignmentSource,
    ) -> ValuationStatus {
        let level = self.trail.level();
        let position = self.trail.next_position();

        let status = self.atom_db.set_value(literal, level, position, source);

        if status == ValuationStatus::Set {
            log::trace!(target: targets::VALUATION, "{literal} at level {level} from {source:?}.");
            self.trail.write_literal(literal);
        }

        status
    }

    /// Notes a conflict against the given clause, fixing the state of the context.
    pub fn note_conflict(&mut self, key: ClauseKey) {
        self.state = ContextState::Unsatisfiable(key);
    }

    /// The maximum decision level among the literals of the stored clause.
    ///
    /// # Soundness
    /// Intended for clauses unsatisfiable on the current valuation — unvalued literals are
    /// ignored.
    pub fn clause_max_level(&self, key: &ClauseKey) -> Result<crate::db::LevelIndex, crate::types::err::ErrorKind> {
        if let ClauseKey::Unit(literal) = key {
            return Ok(self.atom_db.level_of(literal.atom()).unwrap_or(0));
        }

        let clause = self.clause_db.get(key)?;
        let mut max = 0;
        for literal in clause.literals() {
            if let Some(level) = self.atom_db.level_of(literal.atom()) {
                if level > max {
                    max = level;
                }
            }
        }
        Ok(max)
    }
}
