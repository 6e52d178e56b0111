/*!
Minimization objectives.

An objective is tightened after each model, and search resumes — when no better model exists the
last model found is optimal, held as a snapshot on the objective.

Two families of objective:
- *Clausal* — subset-minimality and single-literal preference — tighten with an invalidation
  clause: at least one literal true in the model must fall.
- *Aggregate-backed* — an explicit aggregate objective, or an ordered list rendered as a sum
  over power-of-two weights — carry a surrogate aggregate, fully watched, whose head is fixed
  true and whose upper bound is stiffened to one below the value of each model.

Surrogates are installed before the theory is frozen, with a bound no model can exceed, so the
first tightening is the first constraint.
*/

use crate::{
    context::GenericContext,
    misc::log::targets::{self},
    structures::{
        aggregate::{AggKind, AggSemantics, AggSign, MinimizeObjective, SetId, WeightedLiteral},
        clause::ClauseSource,
        literal::CLiteral,
        weight::{Weight, WeightOps},
    },
    types::err::{self, ErrorKind},
};

/// A minimization objective, with the best model seen.
pub struct ObjectiveState {
    /// The objective, as given.
    pub objective: MinimizeObjective,

    /// The surrogate aggregate, for aggregate-backed objectives.
    pub surrogate: Option<(usize, usize)>,

    /// The value of the best model, for aggregate-backed objectives.
    pub best_value: Option<Weight>,

    /// A snapshot of the valuation of the best model.
    pub best_model: Option<Vec<Option<bool>>>,
}

impl ObjectiveState {
    /// A fresh state around the objective.
    pub fn new(objective: MinimizeObjective) -> Self {
        ObjectiveState {
            objective,
            surrogate: None,
            best_value: None,
            best_model: None,
        }
    }
}

/// Whether a better model may remain after tightening.
pub enum TightenOk {
    /// The objective was tightened, and the search continues.
    Improvable,

    /// No strictly better model is possible.
    Optimal,
}

/// Set identifiers counting down from the top are reserved for surrogates.
fn surrogate_set_id() -> SetId {
    SetId::MAX
}

/// How a model is to be tightened against.
enum TightenPlan {
    Single(CLiteral),
    Subset(Vec<CLiteral>),
    Surrogate(usize, usize),
    Nothing,
}

impl<R: rand::Rng + std::default::Default> GenericContext<R> {
    /// Prepares the objective for search — called once, before the theory is frozen.
    pub(crate) fn prepare_objective(&mut self) -> Result<(), ErrorKind> {
        let objective = match &self.objective {
            Some(state) => state.objective.clone(),
            None => return Ok(()),
        };

        let surrogate = match objective {
            MinimizeObjective::Subset(_) | MinimizeObjective::SingleLiteral(_) => None,

            MinimizeObjective::OrderedList(literals) => {
                // Lexicographic preference as a sum: earlier literals outweigh every later
                // combination.
                let mut weight = Weight::one();
                let mut wls: Vec<WeightedLiteral> = Vec::with_capacity(literals.len());
                for literal in literals.iter().rev() {
                    wls.push(WeightedLiteral::new(*literal, weight.clone()));
                    weight = weight
                        .mul_checked(&Weight::from_int(2))
                        .ok_or(ErrorKind::Overflow)?;
                }

                let id = surrogate_set_id();
                self.aggregates.add_set(id, wls)?;
                Some(self.install_surrogate(id, AggKind::Sum)?)
            }

            MinimizeObjective::Aggregate { set, kind } => {
                Some(self.install_surrogate(set, kind)?)
            }
        };

        if let Some(state) = &mut self.objective {
            state.surrogate = surrogate;
        }
        Ok(())
    }

    /// Attaches the surrogate aggregate: head fixed true, implication semantics, and an upper
    /// bound no valuation exceeds.
    fn install_surrogate(
        &mut self,
        set: SetId,
        kind: AggKind,
    ) -> Result<(usize, usize), ErrorKind> {
        let si = self
            .aggregates
            .index_of(set)
            .ok_or(ErrorKind::Parse(err::ParseError::UnknownSetId(set)))?;

        // A bound the fold cannot exceed, whatever the valuation.
        let mut slack = match kind {
            AggKind::Prod => Weight::one(),
            _ => Weight::zero(),
        };
        for wl in self.aggregates.sets[si].wls.iter() {
            slack = match kind {
                AggKind::Sum | AggKind::Card => {
                    slack.add_checked(&wl.weight).ok_or(ErrorKind::Overflow)?
                }
                AggKind::Prod => slack.mul_checked(&wl.weight).ok_or(ErrorKind::Overflow)?,
                AggKind::Max | AggKind::Min => std::cmp::max(slack, wl.weight.clone()),
            };
        }

        let head_atom = self.fresh_atom()?;
        let head = CLiteral::new(head_atom, true);

        let indices = self.aggregates.attach_aggregate(
            head,
            set,
            slack,
            AggSign::AtMost,
            kind,
            AggSemantics::Implication,
            true,
        )?;

        self.add_clause_internal(vec![head], ClauseSource::Objective)?;

        Ok(indices)
    }

    /// Notes the current (total) valuation as the best model and tightens the objective.
    pub(crate) fn note_model_and_tighten(&mut self) -> Result<TightenOk, ErrorKind> {
        let snapshot: Vec<Option<bool>> = self.valuation().map(|(_, value)| value).collect();

        let plan = match &self.objective {
            None => TightenPlan::Nothing,
            Some(state) => match (&state.objective, state.surrogate) {
                (_, Some((si, ai))) => TightenPlan::Surrogate(si, ai),
                (MinimizeObjective::SingleLiteral(literal), _) => TightenPlan::Single(*literal),
                (MinimizeObjective::Subset(literals), _) => TightenPlan::Subset(literals.clone()),
                _ => TightenPlan::Nothing,
            },
        };

        match plan {
            TightenPlan::Nothing => Ok(TightenOk::Optimal),

            TightenPlan::Single(literal) => {
                self.store_best(snapshot, None);
                match self.atom_db.value_of_literal(literal) {
                    Some(true) => {
                        self.backjump(0);
                        match self.add_clause_during_search(
                            vec![literal.negate()],
                            ClauseSource::Objective,
                        ) {
                            Ok(_) => Ok(TightenOk::Improvable),
                            Err(ErrorKind::FundamentalConflict) => Ok(TightenOk::Optimal),
                            Err(e) => Err(e),
                        }
                    }
                    _ => Ok(TightenOk::Optimal),
                }
            }

            TightenPlan::Subset(literals) => {
                let invalidation: Vec<CLiteral> = literals
                    .iter()
                    .filter(|literal| self.atom_db.is_true(**literal))
                    .map(|literal| literal.negate())
                    .collect();
                self.store_best(snapshot, None);

                if invalidation.is_empty() {
                    // Nothing to drop — the minimum under inclusion.
                    return Ok(TightenOk::Optimal);
                }

                self.backjump(0);
                match self.add_clause_during_search(invalidation, ClauseSource::Objective) {
                    Ok(_) => Ok(TightenOk::Improvable),
                    Err(ErrorKind::FundamentalConflict) => Ok(TightenOk::Optimal),
                    Err(e) => Err(e),
                }
            }

            TightenPlan::Surrogate(si, ai) => {
                let value = self
                    .aggregates
                    .fold_over_valuation(si, |literal| self.atom_db.value_of_literal(literal))?;
                log::info!(target: targets::AGGREGATE, "Objective value {value}.");

                self.store_best(snapshot, Some(value.clone()));

                let tightened = match value.sub_checked(&Weight::one()) {
                    Some(tightened) => tightened,
                    None => return Ok(TightenOk::Optimal),
                };

                self.backjump(0);
                self.aggregates.tighten_upper(si, ai, tightened);
                Ok(TightenOk::Improvable)
            }
        }
    }

    /// Stores the snapshot (and value) of the best model on the objective.
    fn store_best(&mut self, snapshot: Vec<Option<bool>>, value: Option<Weight>) {
        if let Some(state) = &mut self.objective {
            state.best_model = Some(snapshot);
            if value.is_some() {
                state.best_value = value;
            }
        }
    }

    /// A snapshot of the best model found for the objective, if any.
    pub fn best_model(&self) -> Option<&[Option<bool>]> {
        self.objective
            .as_ref()
            .and_then(|state| state.best_model.as_deref())
    }

    /// The value of the best model found for the objective, if any.
    pub fn best_objective_value(&self) -> Option<&Weight> {
        self.objective
            .as_ref()
            .and_then(|state| state.best_value.as_ref())
    }
}
