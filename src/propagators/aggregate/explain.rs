/*!
Explanation of aggregate propagations.

An explanation clause for a derived literal *p* is built on demand from the [reason](super::AggReason)
recorded at derivation time: the negation of each antecedent, together with *p* as the asserting
literal.

The antecedents are a minimal witness of the numeric situation which forced the bound:
- On a [certain](super::ExplBasis::Certain) basis, set literals which became true are selected
  greedily in trail-time order, stopping the moment the refolded certain value crosses the
  recorded threshold.
- On a [possible](super::ExplBasis::Possible) basis, set literals which became false are selected
  the same way, against the refolded possible value.
- For max aggregates culprits are selected by weight against the threshold, per the kind's
  extremal propagation.

If the head was an antecedent, the (false) form of the head joins the clause.

Selection replays the prefix of the set's propagation stack recorded in the reason, so an
explanation is valid whenever the derivation has not been undone — in particular throughout the
conflict analysis which requests it.
Partially watched sets keep no stack, and culprits are instead gathered from the valuation in
assignment-position order.
*/

use crate::{
    db::atom::AtomDB,
    structures::{aggregate::AggKind, clause::CClause, weight::Weight},
    types::err::{self, ErrorKind},
};

use super::{
    AggReason, Aggregates, ExplBasis,
    set::{PropRole, Scheme},
};

impl<R: rand::Rng + std::default::Default> crate::context::GenericContext<R> {
    /// The explanation clause for a literal derived by the aggregate propagator: the literal
    /// first, antecedent negations after.
    pub(crate) fn aggregate_explanation(
        &self,
        literal: crate::structures::literal::CLiteral,
    ) -> Result<CClause, ErrorKind> {
        let reason = match &self.aggregates.reasons[literal.atom() as usize] {
            Some(reason) if reason.literal == literal => reason,
            _ => return Err(err::AggError::MissingReason.into()),
        };
        self.aggregates.explanation_clause(reason, &self.atom_db)
    }
}

impl Aggregates {
    /// The explanation clause for a recorded reason: the derived literal first, antecedent
    /// negations after.
    ///
    /// Every literal but the first is false on the current valuation.
    pub(crate) fn explanation_clause(
        &self,
        reason: &AggReason,
        atom_db: &AtomDB,
    ) -> Result<CClause, ErrorKind> {
        let set = &self.sets[reason.set];
        let agg = &set.aggs[reason.agg];

        let mut clause = vec![reason.literal];

        if reason.head_involved {
            match atom_db.value_of_literal(agg.head) {
                Some(true) => clause.push(agg.head.negate()),
                Some(false) => clause.push(agg.head),
                None => return Err(err::AggError::MissingReason.into()),
            }
        }

        match &set.scheme {
            Scheme::Partial(pw) => {
                super::partial::culprits(set, pw, reason, atom_db, &mut clause);
            }

            Scheme::Fully => match set.kind {
                AggKind::Max | AggKind::Min => self.extremal_culprits(reason, &mut clause),
                _ => self.fold_culprits(reason, &mut clause)?,
            },
        }

        // The head may itself belong to the set, so guard against a duplicate antecedent.
        let mut seen = std::collections::HashSet::with_capacity(clause.len());
        clause.retain(|literal| seen.insert(*literal));

        Ok(clause)
    }

    /// Culprits for sums, counts, and products: a stack prefix refolded until the threshold is
    /// crossed.
    ///
    /// For a head-involved reason — a set literal forced by the head — the derivation rested on
    /// what the propagated literal's weight would do to the counter, so the weight is re-applied
    /// through the fold when testing the threshold.
    fn fold_culprits(
        &self,
        reason: &AggReason,
        clause: &mut CClause,
    ) -> Result<(), ErrorKind> {
        let set = &self.sets[reason.set];

        let propagated_weight = match reason.head_involved {
            true => set.weight_of_atom(reason.literal.atom()).cloned(),
            false => None,
        };

        match reason.basis {
            ExplBasis::HeadOnly => {}

            ExplBasis::Certain => {
                let forced = |fold: &Weight| -> Result<bool, ErrorKind> {
                    let with = match &propagated_weight {
                        Some(weight) => set.fold_with(fold, weight)?,
                        None => fold.clone(),
                    };
                    Ok(certain_forced(&with, reason))
                };

                let mut fold = set.empty_value.clone();
                if forced(&fold)? {
                    return Ok(());
                }
                for info in set.stack.iter().take(reason.stack_bound) {
                    if info.role != PropRole::PosInSet {
                        continue;
                    }
                    let wl = &set.wls[info.wl];
                    fold = set.fold_with(&fold, &wl.weight)?;
                    clause.push(wl.literal.negate());
                    if forced(&fold)? {
                        break;
                    }
                }
            }

            ExplBasis::Possible => {
                let forced = |fold: &Weight| -> Result<bool, ErrorKind> {
                    let without = match &propagated_weight {
                        Some(weight) => set.fold_without(fold, weight)?,
                        None => fold.clone(),
                    };
                    Ok(possible_forced(&without, reason))
                };

                let mut fold = set.initial_possible.clone();
                if forced(&fold)? {
                    return Ok(());
                }
                for info in set.stack.iter().take(reason.stack_bound) {
                    if info.role != PropRole::NegInSet {
                        continue;
                    }
                    let wl = &set.wls[info.wl];
                    fold = set.fold_without(&fold, &wl.weight)?;
                    clause.push(wl.literal);
                    if forced(&fold)? {
                        break;
                    }
                }
            }
        }

        Ok(())
    }

    /// Culprits for max aggregates: falsified (or satisfied) literals selected by weight
    /// against the threshold.
    fn extremal_culprits(&self, reason: &AggReason, clause: &mut CClause) {
        let set = &self.sets[reason.set];

        let heavy_enough = |weight: &Weight| match reason.strict {
            true => weight > &reason.threshold,
            false => weight >= &reason.threshold,
        };

        match reason.basis {
            ExplBasis::HeadOnly => {}

            // A single true literal over the threshold witnesses the certain extremum.
            ExplBasis::Certain => {
                for info in set.stack.iter().take(reason.stack_bound) {
                    if info.role == PropRole::PosInSet && heavy_enough(&set.wls[info.wl].weight) {
                        clause.push(set.wls[info.wl].literal.negate());
                        break;
                    }
                }
            }

            // Every falsified literal over the threshold constrains the possible extremum.
            ExplBasis::Possible => {
                for info in set.stack.iter().take(reason.stack_bound) {
                    if info.role == PropRole::NegInSet && heavy_enough(&set.wls[info.wl].weight) {
                        clause.push(set.wls[info.wl].literal);
                    }
                }
            }
        }
    }
}

/// True when the certain fold has crossed the recorded threshold.
fn certain_forced(fold: &Weight, reason: &AggReason) -> bool {
    match reason.strict {
        true => fold > &reason.threshold,
        false => fold >= &reason.threshold,
    }
}

/// True when the possible fold has sunk to the recorded threshold.
fn possible_forced(fold: &Weight, reason: &AggReason) -> bool {
    match reason.strict {
        true => fold < &reason.threshold,
        false => fold <= &reason.threshold,
    }
}
