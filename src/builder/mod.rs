/*!
Building a theory within a context.

# Basic methods

- [fresh_atom](GenericContext::fresh_atom), to obtain a fresh atom.
- [add_clause](GenericContext::add_clause), to add a clause.
- [add_rule](GenericContext::add_rule), to add a rule of an inductive definition.
- [add_set](GenericContext::add_set) and [add_aggregate](GenericContext::add_aggregate), to
  constrain folds of weighted sets.
- [add_minimize](GenericContext::add_minimize), for an objective.
- [register_lazy_residual](GenericContext::register_lazy_residual), for on-demand grounding.

Additions happen during a *parsing* phase.
Once every constraint is present [finish_parsing](GenericContext::finish_parsing) freezes the
theory: sets are reduced and watched, definitions completed and partitioned, and the root
propagation fixpoint run — which may already settle satisfiability.
[solve](crate::procedures::solve) calls `finish_parsing` itself if required.

# Example

```rust
# use stoat_sat::{config::Config, context::Context, reports::Report};
# use stoat_sat::structures::aggregate::{AggKind, AggSemantics, AggSign, WeightedLiteral};
# use stoat_sat::structures::literal::CLiteral;
let mut ctx = Context::from_config(Config::default());

let atoms: Vec<_> = (0..4).map(|_| ctx.fresh_atom().unwrap()).collect();
let h = ctx.fresh_atom().unwrap();

let set = atoms
    .iter()
    .map(|atom| WeightedLiteral::new(CLiteral::new(*atom, true), 1))
    .collect();
ctx.add_set(0, set).unwrap();
ctx.add_aggregate(
    CLiteral::new(h, true),
    0,
    2,
    AggSign::AtLeast,
    AggKind::Card,
    AggSemantics::Equivalence,
).unwrap();
ctx.add_clause(vec![CLiteral::new(h, true)]).unwrap();

assert!(ctx.solve().is_ok());
assert_eq!(ctx.report(), Report::Satisfiable);
```
*/

use crate::{
    context::{ContextState, GenericContext},
    db::ClauseKey,
    misc::log::targets::{self},
    procedures::{addition::SearchAddition, optimize::ObjectiveState, propagate::FixpointOk},
    propagators::residual::{LazyGroundingCommand, Residual, TheoryAddition, WatchedValue},
    structures::{
        aggregate::{AggKind, AggSemantics, AggSign, MinimizeObjective, SetId, WeightedLiteral},
        atom::Atom,
        clause::{CClause, ClauseSource},
        consequence::AssignmentSource,
        literal::CLiteral,
        weight::Weight,
    },
    types::err::{self, ErrorKind},
};

pub use crate::procedures::addition::ClauseOk;

/// The outcome of freezing the theory.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FinishOk {
    /// The theory may be satisfiable — search is required.
    SatPossible,

    /// The theory is unsatisfiable, noticed without a decision.
    Unsat,
}

impl<R: rand::Rng + std::default::Default> GenericContext<R> {
    /// Expands the context to include a fresh atom.
    pub fn fresh_atom(&mut self) -> Result<Atom, ErrorKind> {
        let atom = self.atom_db.fresh_atom()?;
        self.watches.grow_to(self.atom_db.atom_count());
        self.aggregates.grow_to(self.atom_db.atom_count());
        Ok(atom)
    }

    /// Expands the context to include every atom up to and including the given atom.
    pub fn ensure_atom(&mut self, atom: Atom) -> Result<(), ErrorKind> {
        while self.atom_db.atom_count() <= atom as usize {
            self.fresh_atom()?;
        }
        Ok(())
    }

    /// Notes the parse phase continues, or errs if it is over.
    fn parse_phase(&mut self) -> Result<(), ErrorKind> {
        match self.state {
            ContextState::Configuration | ContextState::Input => {
                self.state = ContextState::Input;
                Ok(())
            }
            _ => Err(err::StateError::TheoryFrozen.into()),
        }
    }

    /// Adds a clause to the context.
    ///
    /// An immediate conflict — an empty clause, or a unit conflicting with a proven literal —
    /// fixes the context unsatisfiable and surfaces as a
    /// [fundamental conflict](ErrorKind::FundamentalConflict).
    pub fn add_clause(&mut self, clause: impl Into<CClause>) -> Result<ClauseOk, ErrorKind> {
        self.parse_phase()?;
        let clause = clause.into();
        for literal in &clause {
            self.ensure_atom(literal.atom())?;
        }
        self.add_clause_internal(clause, ClauseSource::Original)
    }

    /// Adds a rule `head ← body` to the inductive definitions, with a conjunctive or
    /// disjunctive reading of the body.
    pub fn add_rule(
        &mut self,
        head: Atom,
        body: Vec<CLiteral>,
        conjunctive: bool,
    ) -> Result<(), ErrorKind> {
        self.parse_phase()?;
        self.ensure_atom(head)?;
        for literal in &body {
            self.ensure_atom(literal.atom())?;
        }
        self.definitions.add_rule(head, body, conjunctive)
    }

    /// Adds a weighted set under the given identifier.
    ///
    /// Weights must be non-negative, the set non-empty, and the identifier fresh.
    pub fn add_set(
        &mut self,
        id: SetId,
        literals: Vec<WeightedLiteral>,
    ) -> Result<(), ErrorKind> {
        self.parse_phase()?;
        for wl in &literals {
            self.ensure_atom(wl.literal.atom())?;
        }
        self.aggregates.add_set(id, literals)?;
        Ok(())
    }

    /// Adds an aggregate over a previously added set: `head ⟷ fold(set) ▷ bound`, with the
    /// relation of head to constraint fixed by the semantics.
    ///
    /// Product aggregates reject sets with a zero weight, and a definitional head must be a
    /// positive literal.
    pub fn add_aggregate(
        &mut self,
        head: CLiteral,
        set: SetId,
        bound: Weight,
        sign: AggSign,
        kind: AggKind,
        semantics: AggSemantics,
    ) -> Result<(), ErrorKind> {
        self.parse_phase()?;
        self.ensure_atom(head.atom())?;

        let (si, ai) = self
            .aggregates
            .attach_aggregate(head, set, bound, sign, kind, semantics, false)?;

        if semantics == AggSemantics::Definitional {
            self.definitions.note_aggregate_head(head.atom(), si, ai)?;
        }

        Ok(())
    }

    /// Fixes the minimization objective.
    pub fn add_minimize(&mut self, objective: MinimizeObjective) -> Result<(), ErrorKind> {
        self.parse_phase()?;
        if self.objective.is_some() {
            return Err(err::ParseError::MultipleObjectives.into());
        }

        match &objective {
            MinimizeObjective::Subset(literals) | MinimizeObjective::OrderedList(literals) => {
                for literal in literals.clone() {
                    self.ensure_atom(literal.atom())?;
                }
            }
            MinimizeObjective::SingleLiteral(literal) => self.ensure_atom(literal.atom())?,
            MinimizeObjective::Aggregate { .. } => {}
        }

        self.objective = Some(ObjectiveState::new(objective));
        Ok(())
    }

    /// Registers a lazy grounding residual on the atom.
    pub fn register_lazy_residual(
        &mut self,
        atom: Atom,
        watched: WatchedValue,
        command: Box<dyn LazyGroundingCommand>,
    ) -> Result<(), ErrorKind> {
        self.ensure_atom(atom)?;
        self.residuals.register(atom, watched, command);
        Ok(())
    }

    /// Freezes the theory and runs the root propagation fixpoint.
    ///
    /// Unsatisfiability noticed along the way is reported as [FinishOk::Unsat], not an error.
    pub fn finish_parsing(&mut self) -> Result<FinishOk, ErrorKind> {
        match self.state {
            ContextState::Configuration | ContextState::Input => {}
            _ => return Err(err::StateError::TheoryFrozen.into()),
        }

        match self.finish_parsing_inner() {
            Ok(()) => Ok(FinishOk::SatPossible),

            Err(ErrorKind::FundamentalConflict) => Ok(FinishOk::Unsat),

            Err(ErrorKind::BCP(err::BCPError::Conflict(key))) => {
                self.note_conflict(key);
                Ok(FinishOk::Unsat)
            }

            Err(e) => Err(e),
        }
    }

    fn finish_parsing_inner(&mut self) -> Result<(), ErrorKind> {
        if self.config.expand_lazy_immediately && !self.residuals.is_empty() {
            log::info!(target: targets::RESIDUAL, "Expanding every residual.");
            let fired = self.residuals.take_all();
            if let Some(key) = self.apply_residuals(fired)? {
                self.note_conflict(key);
                return Err(ErrorKind::FundamentalConflict);
            }
        }

        self.prepare_objective()?;

        {
            let mut aggregates = std::mem::take(&mut self.aggregates);
            let result = aggregates.finalize(self);
            self.aggregates = aggregates;
            result?;
        }
        {
            let mut definitions = std::mem::take(&mut self.definitions);
            let result = definitions.finalize(self);
            self.definitions = definitions;
            result?;
        }

        match self.propagation_fixpoint()? {
            FixpointOk::Quiescent => Ok(()),
            FixpointOk::Conflict(key) => {
                self.note_conflict(key);
                Err(ErrorKind::FundamentalConflict)
            }
        }
    }

    /// Invokes the commands of fired residuals and applies their extensions.
    pub(crate) fn apply_residuals(
        &mut self,
        fired: Vec<Residual>,
    ) -> Result<Option<ClauseKey>, ErrorKind> {
        if fired.is_empty() {
            return Ok(None);
        }

        let mut additions: Vec<TheoryAddition> = Vec::new();
        for mut residual in fired {
            let value = self.atom_db.value_of(residual.atom);
            log::info!(target: targets::RESIDUAL, "Firing residual on {} at {value:?}.", residual.atom);
            additions.extend(residual.command.ground(residual.atom, value));
        }

        self.apply_theory_additions(additions)
    }

    /// Applies extensions of the theory, mid-search or during parsing.
    ///
    /// Structural extensions — rules, sets, aggregates — force a backjump to the root and, when
    /// the theory is frozen, an incremental re-finalization.
    /// Clauses are applied at the level reached, with the first conflict returned.
    pub(crate) fn apply_theory_additions(
        &mut self,
        additions: Vec<TheoryAddition>,
    ) -> Result<Option<ClauseKey>, ErrorKind> {
        if additions.is_empty() {
            return Ok(None);
        }

        // Every referenced atom is ensured up front.
        let mut limit: Option<Atom> = None;
        let mut note = |atom: Atom| {
            if Some(atom) > limit {
                limit = Some(atom);
            }
        };
        for addition in &additions {
            match addition {
                TheoryAddition::Clause(clause) => {
                    clause.iter().for_each(|l| note(l.atom()));
                }
                TheoryAddition::Rule { head, body, .. } => {
                    note(*head);
                    body.iter().for_each(|l| note(l.atom()));
                }
                TheoryAddition::Set { literals, .. } => {
                    literals.iter().for_each(|wl| note(wl.literal.atom()));
                }
                TheoryAddition::Aggregate { head, .. } => note(head.atom()),
            }
        }
        if let Some(limit) = limit {
            self.ensure_atom(limit)?;
        }

        let structural = additions
            .iter()
            .any(|addition| !matches!(addition, TheoryAddition::Clause(_)));
        let frozen = self.aggregates.is_finalized();

        if structural && self.trail.decision_is_made() {
            self.backjump(0);
        }

        let mut clauses: Vec<CClause> = Vec::new();
        for addition in additions {
            match addition {
                TheoryAddition::Clause(clause) => clauses.push(clause),

                TheoryAddition::Rule {
                    head,
                    body,
                    conjunctive,
                } => self.definitions.add_rule(head, body, conjunctive)?,

                TheoryAddition::Set { id, literals } => {
                    self.aggregates.add_set(id, literals)?;
                }

                TheoryAddition::Aggregate {
                    head,
                    set,
                    bound,
                    sign,
                    kind,
                    semantics,
                } => {
                    let (si, ai) = self
                        .aggregates
                        .attach_aggregate(head, set, bound, sign, kind, semantics, false)?;
                    if semantics == AggSemantics::Definitional {
                        self.definitions.note_aggregate_head(head.atom(), si, ai)?;
                    }
                }
            }
        }

        if structural && frozen {
            {
                let mut aggregates = std::mem::take(&mut self.aggregates);
                let result = aggregates.finalize(self);
                self.aggregates = aggregates;
                match result {
                    Err(ErrorKind::BCP(err::BCPError::Conflict(key))) => {
                        return Ok(Some(key));
                    }
                    other => other?,
                }
            }
            {
                let mut definitions = std::mem::take(&mut self.definitions);
                let result = definitions.finalize(self);
                self.definitions = definitions;
                result?;
            }
        }

        let mut conflict: Option<ClauseKey> = None;
        let frozen_now = self.aggregates.is_finalized();

        for clause in clauses {
            match frozen_now {
                false => {
                    self.add_clause_internal(clause, ClauseSource::Grounding)?;
                }
                true => match self.add_clause_during_search(clause, ClauseSource::Grounding)? {
                    SearchAddition::Conflict(key) => {
                        if conflict.is_none() {
                            conflict = Some(key);
                        }
                    }
                    SearchAddition::Asserting { key, literal } => {
                        if conflict.is_none() {
                            let _ = self.record_assignment(literal, AssignmentSource::BCP(key));
                        }
                    }
                    _ => {}
                },
            }
        }

        Ok(conflict)
    }
}
