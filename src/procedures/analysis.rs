/*!
Analysis of an unsatisfiable clause.

Takes a key to a clause unsatisfiable on the current valuation and, by resolution against the
reasons of current-level assignments, produces an asserting clause over the first unique
implication point — a clause with exactly one literal of the current decision level.

Resolution walks the trail backwards.
A counter tracks how many literals of the derived clause sit at the current level; while more
than one remains, the most recent such assignment is resolved against its reason:
- A clause key, resolved against the stored clause.
- An aggregate source, resolved against an explanation clause the aggregate propagator
  [materializes on demand](crate::propagators::aggregate::explain) — valid here, as analysis
  precedes the backjump and so examines the valuation the derivation was made against.

A cheap minimization pass then drops any literal whose (stored) reason is covered by the
remaining clause, and scratch space is reused across conflicts — analysis allocates only for the
clause it returns.

# Soundness

Analysis requires some decision to have been made, and requires the conflict clause to contain a
literal of the current decision level — the coordinator backjumps to the maximum level of the
clause before calling analysis when a theory reports a conflict whose entailment predates the
current level.
*/

use crate::{
    context::GenericContext,
    db::ClauseKey,
    misc::log::targets::{self},
    structures::{
        atom::Atom,
        clause::{CClause, ClauseSource},
        consequence::AssignmentSource,
        literal::CLiteral,
    },
    types::err::{self, ErrorKind},
};

/// Scratch space for conflict analysis, reused across conflicts.
#[derive(Default)]
pub struct AnalysisBuffer {
    /// Atoms noted during the current analysis.
    seen: Vec<bool>,

    /// The atoms marked in `seen`, for cheap clearing.
    to_clear: Vec<Atom>,

    /// The clause under construction — index 0 is reserved for the asserting literal.
    clause: CClause,

    /// A copy of the literals of the clause under resolution.
    reason: CClause,
}

impl AnalysisBuffer {
    fn prepare(&mut self, atom_count: usize) {
        if self.seen.len() < atom_count {
            self.seen.resize(atom_count, false);
        }
        self.clause.clear();
        self.reason.clear();
    }

    fn clear_marks(&mut self) {
        for atom in self.to_clear.drain(..) {
            self.seen[atom as usize] = false;
        }
    }
}

/// Possible 'Ok' results from conflict analysis.
pub enum AnalysisResult {
    /// The result of analysis is a unit clause, recorded by the caller after the (performed)
    /// backjump to the root.
    UnitClause {
        /// The literal of the clause.
        literal: CLiteral,
    },

    /// The result of analysis is a (non-unit) asserting clause, stored, with the backjump to
    /// its asserting level performed.
    AssertingClause {
        /// The key of the stored clause.
        key: ClauseKey,

        /// The literal asserted by the clause.
        literal: CLiteral,
    },
}

impl<R: rand::Rng + std::default::Default> GenericContext<R> {
    /// Analyses the conflict of the clause behind `key`, learning an asserting clause and
    /// backjumping to the level at which it asserts.
    ///
    /// For documentation see [procedures::analysis](crate::procedures::analysis).
    pub fn conflict_analysis(&mut self, key: &ClauseKey) -> Result<AnalysisResult, ErrorKind> {
        let current = self.trail.level();
        log::info!(target: targets::ANALYSIS, "Analysis of {key} at level {current}.");

        // Taken to appease the borrow checker — restored before return.
        let mut buffer = std::mem::take(&mut self.analysis);
        buffer.prepare(self.atom_db.atom_count());
        buffer.clause.push(CLiteral::new(0, false)); // Placeholder for the asserting literal.

        let mut on_current_level: usize = 0;

        buffer.reason.clear();
        buffer
            .reason
            .extend_from_slice(self.clause_db.get(key)?.literals());
        let mut pivot: Option<Atom> = None;

        let mut index = self.trail.assignments.len();
        // Every current-level assignment sits at or above the start of the level, bounding the
        // walk.
        let floor = self.trail.level_indices.last().copied().unwrap_or(0);

        let uip = 'resolution: loop {
            // Note each fresh literal of the clause under resolution.
            for position in 0..buffer.reason.len() {
                let literal = buffer.reason[position];
                let atom = literal.atom();
                if Some(atom) == pivot || buffer.seen[atom as usize] {
                    continue;
                }
                match self.atom_db.level_of(atom) {
                    Some(0) => continue,
                    None => {
                        self.analysis = buffer;
                        return Err(err::AnalysisError::NoAssertion.into());
                    }
                    Some(level) => {
                        buffer.seen[atom as usize] = true;
                        buffer.to_clear.push(atom);
                        match level == current {
                            true => on_current_level += 1,
                            false => buffer.clause.push(literal),
                        }
                    }
                }
            }

            if on_current_level == 0 {
                self.analysis = buffer;
                return Err(err::AnalysisError::NoAssertion.into());
            }

            // The most recent current-level assignment noted for resolution.
            let literal = 'walk: loop {
                if index == floor {
                    self.analysis = buffer;
                    return Err(err::AnalysisError::NoAssertion.into());
                }
                index -= 1;
                let literal = self.trail.assignments[index];
                if buffer.seen[literal.atom() as usize] {
                    break 'walk literal;
                }
            };

            if on_current_level == 1 {
                break 'resolution literal;
            }

            on_current_level -= 1;
            let atom = literal.atom();
            pivot = Some(atom);

            buffer.reason.clear();
            match self.atom_db.source_of(atom) {
                AssignmentSource::BCP(reason_key) => {
                    buffer
                        .reason
                        .extend_from_slice(self.clause_db.get(&reason_key)?.literals());
                }

                AssignmentSource::Aggregate => {
                    let explanation = self.aggregate_explanation(literal)?;
                    log::trace!(target: targets::ANALYSIS, "Aggregate explanation for {literal}: {:?}.", explanation);
                    buffer.reason.extend(explanation.into_iter().skip(1));
                }

                source => {
                    log::error!(target: targets::ANALYSIS, "Resolution against {source:?} for {literal}.");
                    self.analysis = buffer;
                    return Err(err::AnalysisError::MissingReason.into());
                }
            }
        };

        buffer.clause[0] = uip.negate();

        // A literal whose stored reason is covered by the remaining clause is redundant.
        let mut position = 1;
        let mut length = buffer.clause.len();
        while position < length {
            let literal = buffer.clause[position];
            let redundant = match self.atom_db.source_of(literal.atom()) {
                AssignmentSource::BCP(reason_key) => match self.clause_db.get(&reason_key) {
                    Err(_) => false,
                    Ok(reason) => reason.literals().iter().all(|other| {
                        other.atom() == literal.atom()
                            || buffer.seen[other.atom() as usize]
                            || self.atom_db.level_of(other.atom()) == Some(0)
                    }),
                },
                _ => false,
            };
            match redundant {
                true => {
                    buffer.clause.swap_remove(position);
                    length -= 1;
                }
                false => position += 1,
            }
        }

        // Activity, over every atom the analysis touched.
        for atom in &buffer.to_clear {
            self.atom_db.bump_activity(*atom);
        }
        self.atom_db.decay_activity();

        let clause = buffer.clause.clone();
        buffer.clear_marks();
        self.analysis = buffer;

        log::info!(target: targets::ANALYSIS, "Learnt clause of {} literals.", clause.len());

        match clause.len() {
            1 => {
                self.backjump(0);
                Ok(AnalysisResult::UnitClause { literal: clause[0] })
            }

            _ => {
                let asserted = clause[0];
                let target = self.non_chronological_backjump_level(&clause)?;
                self.backjump(target);

                let key = self.clause_db.store(
                    clause,
                    ClauseSource::Resolution,
                    &self.atom_db,
                    &mut self.watches,
                )?;

                Ok(AnalysisResult::AssertingClause {
                    key,
                    literal: asserted,
                })
            }
        }
    }
}
