/*!
Evaluation of a fully watched set.

With `cbc` and `cbp` maintained incrementally by the watch dispatch, evaluation is a pass over
the aggregates of a pending set:

- A bound certainly violated forces the head false; a bound certainly satisfied forces the head
  true (unless the head only implies the constraint).
- A valued head forces set literals whose value would decide the constraint the wrong way:
  + head true, upper bound *b*: an unvalued literal whose addition pushes `cbc` over *b* is
    false.
  + head true, lower bound *b*: an unvalued literal whose removal drops `cbp` below *b* is true.
  + head false (with equivalence): the symmetric rules against the negated constraint.

Max aggregates are evaluated by selecting extremal literals rather than by running totals: with
an upper bound every too-heavy literal is forced false, and with a lower bound a unique heavy
enough candidate is forced true.

Each rule records the threshold at which the bound became forced, for later replay by the
[explanation builder](super::explain).
*/

use crate::{
    context::GenericContext,
    db::ClauseKey,
    structures::{
        aggregate::{AggKind, AggSemantics},
        weight::{Weight, WeightOps},
    },
    types::err::ErrorKind,
};

use super::{Aggregates, Derivation, ExplBasis};

/// Evaluates every aggregate of the set, deriving heads, set literals, or a conflict.
pub(crate) fn evaluate<R: rand::Rng + std::default::Default>(
    aggregates: &mut Aggregates,
    si: usize,
    ctx: &mut GenericContext<R>,
) -> Result<Option<ClauseKey>, ErrorKind> {
    let mut derivations: Vec<Derivation> = Vec::new();

    {
        let set = &aggregates.sets[si];
        let max_kind = matches!(set.kind, AggKind::Max | AggKind::Min);

        for (ai, agg) in set.aggs.iter().enumerate() {
            let head_value = ctx.atom_db.value_of_literal(agg.head);

            // Head from bounds.
            //
            // For max aggregates the threshold flag selects culprits by weight — exclusive when
            // set, inclusive otherwise — rather than a stop condition on a running fold.
            let mut violated = false;

            if let Some(lo) = &agg.bounds.lower {
                if &set.cbp < lo {
                    violated = true;
                    derivations.push(Derivation {
                        literal: agg.head.negate(),
                        agg: ai,
                        basis: ExplBasis::Possible,
                        head_involved: false,
                        threshold: lo.clone(),
                        strict: !max_kind,
                    });
                }
            }
            if let Some(up) = &agg.bounds.upper {
                if &set.cbc > up {
                    violated = true;
                    derivations.push(Derivation {
                        literal: agg.head.negate(),
                        agg: ai,
                        basis: ExplBasis::Certain,
                        head_involved: false,
                        threshold: up.clone(),
                        strict: true,
                    });
                }
            }

            if !violated && agg.semantics != AggSemantics::Implication {
                let lower_holds = agg.bounds.lower.as_ref().is_none_or(|lo| &set.cbc >= lo);
                let upper_holds = agg.bounds.upper.as_ref().is_none_or(|up| &set.cbp <= up);
                if lower_holds && upper_holds {
                    // With a single bound in play the basis follows the bound present.
                    let (basis, threshold, strict) = match (&agg.bounds.lower, &agg.bounds.upper)
                    {
                        (Some(lo), _) => (ExplBasis::Certain, lo.clone(), false),
                        (_, Some(up)) => (ExplBasis::Possible, up.clone(), max_kind),
                        (None, None) => (ExplBasis::HeadOnly, Weight::zero(), false),
                    };
                    derivations.push(Derivation {
                        literal: agg.head,
                        agg: ai,
                        basis,
                        head_involved: false,
                        threshold,
                        strict,
                    });
                }
            }

            // Set literals from the head.
            match head_value {
                None => {}

                Some(true) => {
                    body_rules(set, ai, true, &ctx.atom_db, &mut derivations)?;
                }

                Some(false) => {
                    if agg.semantics != AggSemantics::Implication {
                        body_rules(set, ai, false, &ctx.atom_db, &mut derivations)?;
                    }
                }
            }
        }
    }

    aggregates.apply_derivations(si, derivations, ctx)
}

/// Derivations of set literals given the constraint of aggregate `ai` must hold
/// (`constraint_holds`) or must fail.
fn body_rules(
    set: &super::set::TypedSet,
    ai: usize,
    constraint_holds: bool,
    atom_db: &crate::db::atom::AtomDB,
    derivations: &mut Vec<Derivation>,
) -> Result<(), ErrorKind> {
    let agg = &set.aggs[ai];

    // The negation of a doubly bounded constraint is a disjunction, from which no single
    // literal follows.
    if !constraint_holds && agg.bounds.lower.is_some() && agg.bounds.upper.is_some() {
        return Ok(());
    }

    // Under the fold's monotonicity a failing lower bound is an upper bound one below, and a
    // failing upper bound is a lower bound one above.
    let (lower, upper) = match constraint_holds {
        true => (agg.bounds.lower.clone(), agg.bounds.upper.clone()),
        false => (
            agg.bounds
                .upper
                .as_ref()
                .map(|up| up.add_checked(&Weight::one()).ok_or(ErrorKind::Overflow))
                .transpose()?,
            agg.bounds
                .lower
                .as_ref()
                .map(|lo| lo.sub_checked(&Weight::one()).ok_or(ErrorKind::Overflow))
                .transpose()?,
        ),
    };

    let max_kind = matches!(set.kind, AggKind::Max | AggKind::Min);

    if let Some(lo) = &lower {
        match max_kind {
            false => {
                // An unvalued literal whose removal drops cbp below the bound is true.
                //
                // A head-involved threshold is the bound itself — the explanation walker
                // re-applies the propagated weight through the fold of the set.
                for wl in set.wls.iter() {
                    if atom_db.value_of_literal(wl.literal).is_some() {
                        continue;
                    }
                    let without = set.fold_without(&set.cbp, &wl.weight)?;
                    if &without < lo {
                        derivations.push(Derivation {
                            literal: wl.literal,
                            agg: ai,
                            basis: ExplBasis::Possible,
                            head_involved: true,
                            threshold: lo.clone(),
                            strict: true,
                        });
                    }
                }
            }
            true => {
                // A unique unvalued candidate heavy enough for the bound is true — with none the
                // bound is unreachable, noticed as cbp sinks below it.
                if &set.cbc < lo {
                    let mut candidates = set
                        .wls
                        .iter()
                        .filter(|wl| &wl.weight >= lo && !atom_db.is_false(wl.literal));
                    if let (Some(wl), None) = (candidates.next(), candidates.next()) {
                        if atom_db.is_unknown(wl.literal) {
                            derivations.push(Derivation {
                                literal: wl.literal,
                                agg: ai,
                                basis: ExplBasis::Possible,
                                head_involved: true,
                                threshold: lo.clone(),
                                strict: false,
                            });
                        }
                    }
                }
            }
        }
    }

    if let Some(up) = &upper {
        match max_kind {
            false => {
                // An unvalued literal whose addition pushes cbc over the bound is false.
                for wl in set.wls.iter() {
                    if atom_db.value_of_literal(wl.literal).is_some() {
                        continue;
                    }
                    let with = set.fold_with(&set.cbc, &wl.weight)?;
                    if &with > up {
                        derivations.push(Derivation {
                            literal: wl.literal.negate(),
                            agg: ai,
                            basis: ExplBasis::Certain,
                            head_involved: true,
                            threshold: up.clone(),
                            strict: true,
                        });
                    }
                }
            }
            true => {
                // Every unvalued literal heavier than the bound is false, on the head alone.
                for wl in set.wls.iter() {
                    if atom_db.is_unknown(wl.literal) && &wl.weight > up {
                        derivations.push(Derivation {
                            literal: wl.literal.negate(),
                            agg: ai,
                            basis: ExplBasis::HeadOnly,
                            head_involved: true,
                            threshold: Weight::zero(),
                            strict: false,
                        });
                    }
                }
            }
        }
    }

    Ok(())
}

