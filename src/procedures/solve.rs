/*!
Determines the satisfiability of the theory in a context.

# Overview

The loop per decision, to a first approximation:

1. Pick an unassigned atom via the heuristic and assign it at a fresh level.
2. Run clause propagation, and each theory propagator, to a shared fixpoint.
3. On conflict: analyse to an asserting clause, learn it, backjump, reassign.
4. On a total assignment: let each propagator verify the assignment — the definition propagator
   may still invalidate it — then report satisfiable, or tighten the objective and continue.

```none
          +---------------+
  +-------| make_decision |
  |       +---------------+
  |               ⌃
  |               | quiescent, on a partial valuation
  |               |
  |               |                  +-----> satisfiable, if the valuation is total and verified
  ⌄   +----------------------+      |
--+-->| propagation_fixpoint |------+
  ⌃   +----------------------+      |
  |               |                  +-----> unsatisfiable, if a conflict is fundamental
  |               | conflict
  |               ⌄
  |   +----------------------+
  +---| analysis, backjump   |
      +----------------------+
```

Two details specific to the theory coordination:

- *The conflict-clause invariant*: every clause handed to analysis contains a literal of the
  current decision level.
  A theory may report a conflict whose entailment rested only on older literals — incomplete
  propagation — in which case the engine first backtracks to the maximum level of the clause.
- *Verification of total assignments*: the boolean fixpoint does not itself witness the
  foundedness of inductive definitions, so a total assignment is checked before it is reported.

Interrupts (the termination callback, the time limit) are polled at decision boundaries and
surface as an [Unknown](Report::Unknown) report, with the trail left consistent.

# Model enumeration

After a model, [next_model](GenericContext::next_model) blocks the decisions of the model —
a clause over the negation of each — and resumes the search.
An exhausted enumeration is reported as [Report::Exhausted].
*/

use crate::{
    context::{ContextState, GenericContext},
    db::atom::ValuationStatus,
    misc::log::targets::{self},
    procedures::{
        analysis::AnalysisResult,
        decision::DecisionOk,
        optimize::TightenOk,
        propagate::FixpointOk,
    },
    reports::Report,
    structures::{
        clause::ClauseSource,
        consequence::AssignmentSource,
        literal::CLiteral,
    },
    types::err::{self, ErrorKind},
};

/// The continuation chosen after a conflict.
enum ConflictOk {
    /// Analysis learnt a clause and the search continues.
    Continue,

    /// The conflict is fundamental.
    Unsatisfiable,
}

impl<R: rand::Rng + std::default::Default> GenericContext<R> {
    /// Determines the satisfiability of the theory, unless interrupted.
    pub fn solve(&mut self) -> Result<Report, ErrorKind> {
        match self.state {
            ContextState::Satisfiable | ContextState::Unsatisfiable(_) => {
                return Ok(self.report());
            }

            ContextState::Configuration | ContextState::Input => {
                use crate::builder::FinishOk;
                match self.finish_parsing() {
                    Ok(FinishOk::SatPossible) => {}
                    Ok(FinishOk::Unsat) => return Ok(self.report()),
                    Err(e) => return Err(e),
                }
                self.state = ContextState::Solving;
            }

            ContextState::Solving => {}
        }

        let timer = std::time::Instant::now();

        'solve_loop: loop {
            self.counters.total_iterations += 1;

            self.counters.time = timer.elapsed();
            if let Some(limit) = self.config.time_limit {
                if self.counters.time > limit {
                    return Ok(Report::Unknown);
                }
            }
            if self.check_callback_terminate() {
                return Ok(Report::Unknown);
            }

            let fixpoint = match self.propagation_fixpoint() {
                Ok(fixpoint) => fixpoint,
                // Lazy grounding may fix the context unsatisfiable directly, e.g. through a unit
                // conflicting at the root.
                Err(ErrorKind::FundamentalConflict) => break 'solve_loop,
                Err(e) => return Err(e),
            };

            match fixpoint {
                FixpointOk::Conflict(key) => {
                    match self.handle_conflict(key)? {
                        ConflictOk::Unsatisfiable => break 'solve_loop,
                        ConflictOk::Continue => {}
                    }

                    self.consider_restart();
                }

                FixpointOk::Quiescent => match self.make_decision() {
                    DecisionOk::Literal(decision) => {
                        self.trail.push_fresh_level();
                        match self.record_assignment(decision, AssignmentSource::Decision) {
                            ValuationStatus::Set => {}
                            _ => return Err(err::ErrorKind::FundamentalConflict),
                        }
                    }

                    DecisionOk::Residual(atom) => {
                        let fired = self.residuals.take_decidable(atom);
                        match self.apply_residuals(fired) {
                            Ok(None) => {}
                            Ok(Some(key)) => match self.handle_conflict(key)? {
                                ConflictOk::Unsatisfiable => break 'solve_loop,
                                ConflictOk::Continue => {}
                            },
                            Err(ErrorKind::FundamentalConflict) => break 'solve_loop,
                            Err(e) => return Err(e),
                        }
                    }

                    DecisionOk::Exhausted => {
                        // The valuation is total — let the theory check it.
                        if let Some(key) = self.full_assignment_check()? {
                            match self.handle_conflict(key)? {
                                ConflictOk::Unsatisfiable => break 'solve_loop,
                                ConflictOk::Continue => continue 'solve_loop,
                            }
                        }

                        self.counters.models_found += 1;
                        log::info!("Model {} found.", self.counters.models_found);

                        if self.objective.is_some() {
                            match self.note_model_and_tighten()? {
                                TightenOk::Improvable => continue 'solve_loop,
                                TightenOk::Optimal => {
                                    self.state = ContextState::Satisfiable;
                                    break 'solve_loop;
                                }
                            }
                        }

                        self.state = ContextState::Satisfiable;
                        break 'solve_loop;
                    }
                },
            }
        }

        // An objective with a model behind it answers satisfiable, whatever closed the search.
        if let Some(objective) = &self.objective {
            if objective.best_model.is_some() {
                self.state = ContextState::Satisfiable;
            }
        }

        Ok(self.report())
    }

    /// Handles a conflict: fundamental conflicts close the search, and otherwise analysis
    /// learns an asserting clause, backjumps, and queues the asserted literal.
    fn handle_conflict(&mut self, key: crate::db::ClauseKey) -> Result<ConflictOk, ErrorKind> {
        self.counters.total_conflicts += 1;
        self.counters.fresh_conflicts += 1;

        if !self.trail.decision_is_made() {
            self.note_conflict(key);
            return Ok(ConflictOk::Unsatisfiable);
        }

        // The conflict-clause invariant: analysis requires a literal of the current level, and
        // an incomplete theory propagation may surface later than its entailment.
        let conflict_level = self.clause_max_level(&key)?;
        if conflict_level == 0 {
            self.note_conflict(key);
            return Ok(ConflictOk::Unsatisfiable);
        }
        if conflict_level < self.trail.level() {
            log::trace!(target: targets::BACKJUMP, "Backtracking below an incomplete propagation.");
            self.backjump(conflict_level);
        }

        match self.conflict_analysis(&key)? {
            AnalysisResult::UnitClause { literal } => {
                match self.record_assignment(literal, AssignmentSource::Addition) {
                    ValuationStatus::Conflict => {
                        self.note_conflict(crate::db::ClauseKey::Unit(literal));
                        Ok(ConflictOk::Unsatisfiable)
                    }
                    _ => Ok(ConflictOk::Continue),
                }
            }

            AnalysisResult::AssertingClause { key, literal } => {
                match self.record_assignment(literal, AssignmentSource::BCP(key)) {
                    ValuationStatus::Conflict => {
                        self.note_conflict(key);
                        Ok(ConflictOk::Unsatisfiable)
                    }
                    _ => Ok(ConflictOk::Continue),
                }
            }
        }
    }

    /// Restarts per the luby schedule, if enabled.
    fn consider_restart(&mut self) {
        if !self.config.restarts {
            return;
        }

        let interval = self.config.luby_u.saturating_mul(self.counters.luby.current());
        if self.counters.fresh_conflicts >= interval {
            self.counters.luby.next();
            self.backjump(0);
            self.counters.fresh_conflicts = 0;
            self.counters.restarts += 1;
            log::trace!("Restart {}.", self.counters.restarts);
        }
    }

    /// Resumes the search for a further model, blocking the decisions of the current model.
    ///
    /// Models are enumerated by decision: two models differing only in propagated values of
    /// undecided atoms are not distinguished.
    pub fn next_model(&mut self) -> Result<Report, ErrorKind> {
        match self.state {
            ContextState::Satisfiable => {}
            ContextState::Unsatisfiable(_) => return Ok(Report::Exhausted),
            _ => return Err(err::StateError::ParsingIncomplete.into()),
        }

        let decisions: Vec<CLiteral> = self.trail.decisions().collect();
        if decisions.is_empty() {
            // The model was forced, and is unique.
            return Ok(Report::Exhausted);
        }

        let blocking: Vec<CLiteral> = decisions
            .iter()
            .map(|decision| decision.negate())
            .collect();

        self.state = ContextState::Solving;
        self.backjump(0);
        match self.add_clause_during_search(blocking, ClauseSource::Blocking) {
            Ok(_) => {}
            Err(ErrorKind::FundamentalConflict) => return Ok(Report::Exhausted),
            Err(e) => return Err(e),
        }

        match self.solve()? {
            Report::Unsatisfiable => Ok(Report::Exhausted),
            report => Ok(report),
        }
    }
}
