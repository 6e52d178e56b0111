/*!
Lazy grounding residuals.

A *residual* watches a single atom for an event — the atom acquiring a particular value, or
becoming relevant to a decision — and, when fired, invokes an external grounding command to
extend the theory, then unregisters.

The command is handed nothing but the atom and its value, and answers with a list of
[theory additions](TheoryAddition) for the engine to apply:
- A clause is applied at the current level — if it conflicts with the valuation the usual
  conflict machinery runs, so an addition holds at the level it is added or triggers an
  immediate backtrack.
- Rules, sets, and aggregates force a backjump to the root level and an incremental
  re-finalization, as their indexes and watches are built against a frozen theory.

Residual status is re-checked after each propagation round, and the
[expand_lazy_immediately](crate::config::Config::expand_lazy_immediately) option fires every
residual at the end of parsing instead.
*/

use crate::structures::{
    aggregate::{AggKind, AggSemantics, AggSign, SetId, WeightedLiteral},
    atom::Atom,
    clause::CClause,
    literal::CLiteral,
    weight::Weight,
};

/// The event a residual watches for.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WatchedValue {
    /// The atom valued true.
    True,

    /// The atom valued false.
    False,

    /// The atom about to be decided on, whatever the value.
    Decidable,
}

/// An extension of the theory, returned by a grounding command.
pub enum TheoryAddition {
    /// A clause.
    Clause(CClause),

    /// A rule of an inductive definition.
    Rule {
        /// The defined atom.
        head: Atom,

        /// The body literals.
        body: Vec<CLiteral>,

        /// Whether the body is a conjunction (a disjunction otherwise).
        conjunctive: bool,
    },

    /// A weighted set.
    Set {
        /// The external identifier of the set.
        id: SetId,

        /// The weighted literals of the set.
        literals: Vec<WeightedLiteral>,
    },

    /// An aggregate constraint over a previously added set.
    Aggregate {
        /// The reified head.
        head: CLiteral,

        /// The set folded over.
        set: SetId,

        /// The bound.
        bound: Weight,

        /// The sense of the bound.
        sign: AggSign,

        /// The fold.
        kind: AggKind,

        /// The relation of head to constraint.
        semantics: AggSemantics,
    },
}

/// An external command, invoked when the residual it guards fires.
pub trait LazyGroundingCommand {
    /// Extends the theory for the atom having acquired the given value (`None` for a
    /// [Decidable](WatchedValue::Decidable) firing).
    fn ground(&mut self, atom: Atom, value: Option<bool>) -> Vec<TheoryAddition>;
}

/// A registered residual.
pub struct Residual {
    /// The watched atom.
    pub atom: Atom,

    /// The event watched for.
    pub watched: WatchedValue,

    /// The command to invoke.
    pub command: Box<dyn LazyGroundingCommand>,
}

/// The registered residuals of a context.
#[derive(Default)]
pub struct Residuals {
    /// Registered residuals — fired entries are taken, leaving a gap.
    entries: Vec<Option<Residual>>,

    /// The index of the first trail assignment not yet checked against the residuals.
    trail_cursor: usize,
}

impl Residuals {
    /// Registers a residual.
    pub fn register(&mut self, atom: Atom, watched: WatchedValue, command: Box<dyn LazyGroundingCommand>) {
        self.entries.push(Some(Residual {
            atom,
            watched,
            command,
        }));
    }

    /// True if no residuals remain.
    pub fn is_empty(&self) -> bool {
        self.entries.iter().all(Option::is_none)
    }

    /// Takes every remaining residual, for immediate expansion.
    pub(crate) fn take_all(&mut self) -> Vec<Residual> {
        self.entries.iter_mut().filter_map(Option::take).collect()
    }

    /// Takes the residuals fired by trail assignments not yet checked.
    pub(crate) fn take_fired(&mut self, trail: &[CLiteral]) -> Vec<Residual> {
        let mut fired = Vec::new();

        while self.trail_cursor < trail.len() {
            let literal = trail[self.trail_cursor];
            self.trail_cursor += 1;

            for entry in self.entries.iter_mut() {
                let matches = match entry {
                    Some(residual) if residual.atom == literal.atom() => match residual.watched {
                        WatchedValue::True => literal.polarity(),
                        WatchedValue::False => !literal.polarity(),
                        WatchedValue::Decidable => false,
                    },
                    _ => false,
                };
                if matches {
                    fired.push(entry.take().expect("matched above"));
                }
            }
        }

        fired
    }

    /// Takes the residuals watching the atom for a decision.
    pub(crate) fn take_decidable(&mut self, atom: Atom) -> Vec<Residual> {
        let mut fired = Vec::new();
        for entry in self.entries.iter_mut() {
            let matches = matches!(
                entry,
                Some(residual) if residual.atom == atom && residual.watched == WatchedValue::Decidable
            );
            if matches {
                fired.push(entry.take().expect("matched above"));
            }
        }
        fired
    }

    /// True if some residual watches the atom for a decision.
    pub(crate) fn watches_decidable(&self, atom: Atom) -> bool {
        self.entries.iter().any(|entry| {
            matches!(
                entry,
                Some(residual) if residual.atom == atom && residual.watched == WatchedValue::Decidable
            )
        })
    }

    /// Restores the cursor to the remaining trail.
    pub(crate) fn backtrack(&mut self, trail_length: usize) {
        self.trail_cursor = std::cmp::min(self.trail_cursor, trail_length);
    }
}
