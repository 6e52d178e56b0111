/*!
The partially watched scheme, for large cardinality sets.

For a set of *n* literals constrained by `head ⟷ count ≥ b`, two witness pools are watched in
place of the full set:

- The *support* pool: `b + 1` literals not conflicting with the valuation.
  While the pool is full the count can still reach *b* with room to spare, and no propagation is
  possible.
- The *truth* pool: `n − b + 2` literals not satisfied by the valuation.
  While the pool is full fewer than `b − 1` literals are true, and no propagation is possible.

When a watched literal fires, a replacement is scanned for among the unwatched literals; the swap
is recorded in a per-set log, and unwound — not rediscovered by scanning — on backtrack.
Only when no replacement exists does the propagator recount the set and apply the propagation
rules:

- Fewer than *b* literals non-false: the head is false.
- Exactly *b* non-false and the head true: every unvalued literal of the set is true.
- At least *b* literals true: the head is true.
- Exactly *b − 1* true and the head false: every unvalued literal of the set is false.

Watch entries are registered once per literal and checked for pool membership when fired, so a
stale entry — one swapped out, or unwound by backtracking — costs a lookup and nothing more.

No propagation stack is kept for a partially watched set: explanations gather culprits from the
valuation, in assignment-position order, up to the count the rule required.
*/

use crate::{
    context::GenericContext,
    db::{ClauseKey, LevelIndex, atom::AtomDB},
    misc::log::targets::{self},
    structures::{
        aggregate::AggSemantics,
        clause::CClause,
        literal::CLiteral,
        weight::{Weight, WeightOps},
    },
    types::err::ErrorKind,
};

use super::{AggReason, Aggregates, Derivation, DynWatch, ExplBasis, set::Scheme, set::TypedSet};

/// A recorded pool swap, for reversal on backtrack.
pub struct PwSwap {
    /// The level the swap was made at.
    pub level: LevelIndex,

    /// True if the swap was in the support pool.
    pub support: bool,

    /// The pool slot swapped.
    pub slot: usize,

    /// The index previously in the slot.
    pub previous: usize,
}

/// The state of a partially watched set.
pub struct PwState {
    /// The cardinality bound, as a count.
    pub bound: usize,

    /// The support pool: indices of watched literals not conflicting with the valuation.
    pub support_pool: Vec<usize>,

    /// The truth pool: indices of watched literals not satisfied by the valuation.
    pub truth_pool: Vec<usize>,

    /// Support pool membership, per set literal.
    pub in_support: Vec<bool>,

    /// Truth pool membership, per set literal.
    pub in_truth: Vec<bool>,

    /// Whether a support watch entry has been registered, per set literal.
    pub support_registered: Vec<bool>,

    /// Whether a truth watch entry has been registered, per set literal.
    pub truth_registered: Vec<bool>,

    /// Swaps made, in order.
    pub swap_log: Vec<PwSwap>,
}

impl PwState {
    /// Unwinds swaps made above `level`.
    pub fn backtrack(&mut self, level: LevelIndex) {
        while let Some(last) = self.swap_log.last() {
            if last.level <= level {
                break;
            }
            let swap = self.swap_log.pop().expect("a swap was just seen");
            let (pool, membership) = match swap.support {
                true => (&mut self.support_pool, &mut self.in_support),
                false => (&mut self.truth_pool, &mut self.in_truth),
            };
            membership[pool[swap.slot]] = false;
            membership[swap.previous] = true;
            pool[swap.slot] = swap.previous;
        }
    }
}

/// The bound as a count, clamped to `n + 2`.
fn bound_as_count(bound: &Weight, n: usize) -> usize {
    let mut count = 0;
    let mut weight = Weight::zero();
    while &weight < bound && count <= n + 1 {
        weight = match weight.add_checked(&Weight::one()) {
            Some(weight) => weight,
            None => return count,
        };
        count += 1;
    }
    count
}

/// Installs the partially watched scheme for the (finalized) set.
pub(crate) fn install(aggregates: &mut Aggregates, si: usize, atom_db: &AtomDB) {
    let n = aggregates.sets[si].wls.len();
    let bound = match &aggregates.sets[si].aggs[0].bounds.lower {
        Some(lower) => bound_as_count(lower, n),
        None => 0,
    };

    let support_target = std::cmp::min(bound + 1, n);
    let truth_target = std::cmp::min(n.saturating_sub(bound) + 2, n);

    let mut state = PwState {
        bound,
        support_pool: Vec::with_capacity(support_target),
        truth_pool: Vec::with_capacity(truth_target),
        in_support: vec![false; n],
        in_truth: vec![false; n],
        support_registered: vec![false; n],
        truth_registered: vec![false; n],
        swap_log: Vec::default(),
    };

    let mut registrations: Vec<(CLiteral, DynWatch)> = Vec::new();

    for (wi, wl) in aggregates.sets[si].wls.iter().enumerate() {
        if state.support_pool.len() < support_target && !atom_db.is_false(wl.literal) {
            state.support_pool.push(wi);
            state.in_support[wi] = true;
            state.support_registered[wi] = true;
            registrations.push((
                wl.literal.negate(),
                DynWatch {
                    set: si,
                    wl: wi,
                    lower: true,
                },
            ));
        }
        if state.truth_pool.len() < truth_target && !atom_db.is_true(wl.literal) {
            state.truth_pool.push(wi);
            state.in_truth[wi] = true;
            state.truth_registered[wi] = true;
            registrations.push((
                wl.literal,
                DynWatch {
                    set: si,
                    wl: wi,
                    lower: false,
                },
            ));
        }
    }

    for (fire_on, watch) in registrations {
        aggregates.register_dynamic_watch(fire_on, watch);
    }

    log::trace!(target: targets::AGGREGATE, "Set {} partially watched with bound {bound}.", aggregates.sets[si].id);
    aggregates.sets[si].scheme = Scheme::Partial(state);
}

/// The outcome of attending to a fired dynamic watch.
enum FiredOutcome {
    /// The entry was stale, or the pool was repaired by a swap.
    Settled,

    /// A swap was made and the replacement requires a watch entry.
    Register(CLiteral, DynWatch),

    /// No replacement exists — the set requires a recount.
    Boundary,
}

/// Attends to a fired dynamic watch: a stale entry is ignored, a replacement swapped in, or the
/// set recounted and its propagation rules applied.
pub(crate) fn dynamic_event<R: rand::Rng + std::default::Default>(
    aggregates: &mut Aggregates,
    watch: DynWatch,
    ctx: &mut GenericContext<R>,
) -> Result<Option<ClauseKey>, ErrorKind> {
    let DynWatch {
        set: si,
        wl,
        lower: support,
    } = watch;

    let outcome = {
        let level = ctx.trail.level();
        let atom_db = &ctx.atom_db;
        let set = &mut aggregates.sets[si];
        let literal = set.wls[wl].literal;
        let wls = &set.wls;
        let Scheme::Partial(pw) = &mut set.scheme else {
            return Ok(None);
        };

        let (member, fired) = match support {
            true => (pw.in_support[wl], atom_db.is_false(literal)),
            false => (pw.in_truth[wl], atom_db.is_true(literal)),
        };

        if !member || !fired {
            FiredOutcome::Settled
        } else {
            let replacement = (0..wls.len()).find(|&r| match support {
                true => !pw.in_support[r] && !atom_db.is_false(wls[r].literal),
                false => !pw.in_truth[r] && !atom_db.is_true(wls[r].literal),
            });

            match replacement {
                None => FiredOutcome::Boundary,

                Some(r) => {
                    let (pool, membership, registered) = match support {
                        true => (
                            &mut pw.support_pool,
                            &mut pw.in_support,
                            &mut pw.support_registered,
                        ),
                        false => (
                            &mut pw.truth_pool,
                            &mut pw.in_truth,
                            &mut pw.truth_registered,
                        ),
                    };

                    let slot = pool
                        .iter()
                        .position(|&index| index == wl)
                        .expect("membership was checked");

                    pool[slot] = r;
                    membership[wl] = false;
                    membership[r] = true;

                    let fresh = !registered[r];
                    registered[r] = true;

                    pw.swap_log.push(PwSwap {
                        level,
                        support,
                        slot,
                        previous: wl,
                    });

                    match fresh {
                        false => FiredOutcome::Settled,
                        true => {
                            let fire_on = match support {
                                true => wls[r].literal.negate(),
                                false => wls[r].literal,
                            };
                            FiredOutcome::Register(
                                fire_on,
                                DynWatch {
                                    set: si,
                                    wl: r,
                                    lower: support,
                                },
                            )
                        }
                    }
                }
            }
        }
    };

    match outcome {
        FiredOutcome::Settled => Ok(None),

        FiredOutcome::Register(fire_on, watch) => {
            aggregates.register_dynamic_watch(fire_on, watch);
            Ok(None)
        }

        FiredOutcome::Boundary => evaluate(aggregates, si, ctx),
    }
}

/// Recounts the set and applies the propagation rules.
///
/// Also serves head events and the initial evaluation at finalization, where a pool may be
/// underfull from the start.
pub(crate) fn evaluate<R: rand::Rng + std::default::Default>(
    aggregates: &mut Aggregates,
    si: usize,
    ctx: &mut GenericContext<R>,
) -> Result<Option<ClauseKey>, ErrorKind> {
    let mut derivations: Vec<Derivation> = Vec::new();

    {
        let set = &aggregates.sets[si];
        let Scheme::Partial(pw) = &set.scheme else {
            return Ok(None);
        };
        let bound = pw.bound;
        let agg = &set.aggs[0];

        let mut nonfalse = 0;
        let mut trues = 0;
        for wl in &set.wls {
            match ctx.atom_db.value_of_literal(wl.literal) {
                Some(true) => {
                    trues += 1;
                    nonfalse += 1;
                }
                None => nonfalse += 1,
                Some(false) => {}
            }
        }

        let head_value = ctx.atom_db.value_of_literal(agg.head);

        if trues >= bound && agg.semantics != AggSemantics::Implication {
            derivations.push(Derivation {
                literal: agg.head,
                agg: 0,
                basis: ExplBasis::Certain,
                head_involved: false,
                threshold: Weight::zero(),
                strict: false,
            });
        }

        if nonfalse < bound {
            derivations.push(Derivation {
                literal: agg.head.negate(),
                agg: 0,
                basis: ExplBasis::Possible,
                head_involved: false,
                threshold: Weight::zero(),
                strict: false,
            });
        }

        if head_value == Some(true) && nonfalse == bound {
            for wl in &set.wls {
                if ctx.atom_db.is_unknown(wl.literal) {
                    derivations.push(Derivation {
                        literal: wl.literal,
                        agg: 0,
                        basis: ExplBasis::Possible,
                        head_involved: true,
                        threshold: Weight::zero(),
                        strict: false,
                    });
                }
            }
        }

        if head_value == Some(false)
            && agg.semantics != AggSemantics::Implication
            && bound > 0
            && trues == bound - 1
        {
            for wl in &set.wls {
                if ctx.atom_db.is_unknown(wl.literal) {
                    derivations.push(Derivation {
                        literal: wl.literal.negate(),
                        agg: 0,
                        basis: ExplBasis::Certain,
                        head_involved: true,
                        threshold: Weight::zero(),
                        strict: false,
                    });
                }
            }
        }
    }

    aggregates.apply_derivations(si, derivations, ctx)
}

/// Explanation culprits for a partially watched derivation: assigned set literals in
/// assignment-position order, up to the count the rule required.
pub(crate) fn culprits(
    set: &TypedSet,
    pw: &PwState,
    reason: &AggReason,
    atom_db: &AtomDB,
    clause: &mut CClause,
) {
    let n = set.wls.len();
    let bound = pw.bound;

    let (want_true, target) = match reason.basis {
        ExplBasis::HeadOnly => return,

        // True literals witness the count reached the bound (or its head-false reduction).
        ExplBasis::Certain => (
            true,
            match reason.head_involved {
                true => bound.saturating_sub(1),
                false => bound,
            },
        ),

        // False literals witness the count cannot exceed the bound (or its head-true tightening).
        ExplBasis::Possible => (
            false,
            match reason.head_involved {
                true => n.saturating_sub(bound),
                false => n.saturating_sub(bound) + 1,
            },
        ),
    };

    let mut assigned: Vec<(usize, CLiteral)> = set
        .wls
        .iter()
        .filter(|wl| atom_db.value_of_literal(wl.literal) == Some(want_true))
        .filter_map(|wl| {
            atom_db
                .position_of(wl.literal.atom())
                .map(|position| (position, wl.literal))
        })
        .collect();
    assigned.sort_unstable_by_key(|(position, _)| *position);

    for (_, literal) in assigned.into_iter().take(target) {
        match want_true {
            true => clause.push(literal.negate()),
            false => clause.push(literal),
        }
    }
}
