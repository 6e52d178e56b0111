/*!
Adding clauses to the context, at the root or during search.

Two paths are kept apart:
- [add_clause_internal](GenericContext::add_clause_internal) serves the parse phase and
  finalization: the context is at the root level, falsified literals may be dropped outright,
  and a conflict is fundamental.
- [add_clause_during_search](GenericContext::add_clause_during_search) serves loop formulas,
  blocking clauses, objective tightenings, and lazy grounding: the clause lands against a
  partial valuation and the caller is told whether it is quiet, asserting, or conflicting.
  A unit addition which cannot hold at the current level triggers an immediate backjump to the
  root, per the safety condition on search-time additions.
*/

use crate::{
    context::{ContextState, GenericContext},
    db::{ClauseKey, atom::ValuationStatus},
    misc::log::targets::{self},
    structures::{
        clause::{CClause, ClauseSource},
        consequence::AssignmentSource,
        literal::CLiteral,
    },
    types::err::ErrorKind,
};

/// Ok results when adding a clause to the context during parsing.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ClauseOk {
    /// The clause was stored.
    Added,

    /// The clause was a unit, recorded on the trail.
    Unit,

    /// The clause was a tautology, or already satisfied at the root (and so was not stored).
    Tautology,
}

/// The outcome of adding a clause during search.
pub enum SearchAddition {
    /// The clause was stored, quietly.
    Stored(ClauseKey),

    /// The clause was stored and asserts the literal — recording the assignment is left to the
    /// caller, against the returned key.
    Asserting {
        /// The key of the stored clause.
        key: ClauseKey,

        /// The asserted literal.
        literal: CLiteral,
    },

    /// The clause was stored and is unsatisfiable on the current valuation.
    Conflict(ClauseKey),

    /// A unit clause, recorded on the trail (after a backjump to the root, if required).
    Recorded,

    /// A tautology, skipped.
    Tautology,
}

/// Removes duplicate literals; true if the clause is a tautology.
fn normalize(clause: &mut CClause) -> bool {
    clause.sort_unstable();
    clause.dedup();
    clause
        .windows(2)
        .any(|pair| pair[0].atom() == pair[1].atom())
}

impl<R: rand::Rng + std::default::Default> GenericContext<R> {
    /// Adds a clause at the root level.
    ///
    /// Literals false at the root are dropped, and a clause with a literal true at the root is
    /// skipped.
    /// An empty or conflicting result fixes the state of the context and surfaces as a
    /// [fundamental conflict](ErrorKind::FundamentalConflict).
    pub(crate) fn add_clause_internal(
        &mut self,
        clause: CClause,
        source: ClauseSource,
    ) -> Result<ClauseOk, ErrorKind> {
        let mut clause = clause;
        if normalize(&mut clause) {
            return Ok(ClauseOk::Tautology);
        }

        if clause.iter().any(|literal| self.atom_db.is_true(*literal)) {
            return Ok(ClauseOk::Tautology);
        }
        clause.retain(|literal| !self.atom_db.is_false(*literal));

        match clause.len() {
            0 => {
                log::info!(target: targets::CLAUSE_DB, "An unsatisfiable clause was added.");
                self.state = ContextState::Unsatisfiable(ClauseKey::Original(0));
                Err(ErrorKind::FundamentalConflict)
            }

            1 => {
                let literal = clause[0];
                let assignment_source = match source {
                    ClauseSource::Original => AssignmentSource::Original,
                    _ => AssignmentSource::Addition,
                };
                match self.record_assignment(literal, assignment_source) {
                    ValuationStatus::Set | ValuationStatus::Same => Ok(ClauseOk::Unit),
                    ValuationStatus::Conflict => {
                        self.state = ContextState::Unsatisfiable(ClauseKey::Unit(literal));
                        Err(ErrorKind::FundamentalConflict)
                    }
                }
            }

            _ => {
                self.clause_db
                    .store(clause, source, &self.atom_db, &mut self.watches)?;
                Ok(ClauseOk::Added)
            }
        }
    }

    /// Adds a clause against a partial valuation, reporting its status.
    pub(crate) fn add_clause_during_search(
        &mut self,
        clause: CClause,
        source: ClauseSource,
    ) -> Result<SearchAddition, ErrorKind> {
        let mut clause = clause;
        if normalize(&mut clause) {
            return Ok(SearchAddition::Tautology);
        }

        if clause.len() == 1 {
            let literal = clause[0];
            match self.atom_db.value_of_literal(literal) {
                Some(true) => return Ok(SearchAddition::Recorded),

                None | Some(false) => {
                    // An addition must hold at the level it is added — so, first, return to a
                    // level at which it can.
                    if self.atom_db.value_of_literal(literal) == Some(false) {
                        match self.atom_db.level_of(literal.atom()) {
                            Some(0) | None => {
                                self.state =
                                    ContextState::Unsatisfiable(ClauseKey::Unit(literal));
                                return Err(ErrorKind::FundamentalConflict);
                            }
                            Some(_) => self.backjump(0),
                        }
                    } else if self.trail.decision_is_made() {
                        self.backjump(0);
                    }

                    match self.record_assignment(literal, AssignmentSource::Addition) {
                        ValuationStatus::Set | ValuationStatus::Same => {
                            return Ok(SearchAddition::Recorded);
                        }
                        ValuationStatus::Conflict => {
                            self.state = ContextState::Unsatisfiable(ClauseKey::Unit(literal));
                            return Err(ErrorKind::FundamentalConflict);
                        }
                    }
                }
            }
        }

        let mut unvalued = 0;
        let mut candidate = None;
        let mut satisfied = false;
        for literal in &clause {
            match self.atom_db.value_of_literal(*literal) {
                None => {
                    unvalued += 1;
                    candidate = Some(*literal);
                }
                Some(true) => satisfied = true,
                Some(false) => {}
            }
        }

        let key = self
            .clause_db
            .store(clause, source, &self.atom_db, &mut self.watches)?;
        log::trace!(target: targets::CLAUSE_DB, "Search addition {key}.");

        if satisfied {
            return Ok(SearchAddition::Stored(key));
        }
        match (unvalued, candidate) {
            (0, _) => Ok(SearchAddition::Conflict(key)),
            (1, Some(literal)) => Ok(SearchAddition::Asserting { key, literal }),
            _ => Ok(SearchAddition::Stored(key)),
        }
    }
}
