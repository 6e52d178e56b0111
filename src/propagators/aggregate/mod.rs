/*!
The aggregate propagator.

Maintains every typed weighted set, the aggregates over them, and the watch structures which tie
set literals and heads to the trail.

# Watches

Three kinds of watch are kept, per literal:
- *Static* watches, for fully watched sets: checked on every assignment of the literal, never
  moved.
- *Dynamic* watches, for partially watched sets: a small pool of witnesses, with a fired watch
  possibly swapped for a replacement — see [partial].
- *Head* watches, mapping the atom of a head to the sets reifying it.

# Propagation

The propagator observes the trail through a cursor.
[propagate_at_end_of_queue](Aggregates::propagate_at_end_of_queue) drains fresh assignments —
each updating counters or pools and marking the touched sets pending — and then evaluates every
pending set against its aggregates, deriving heads from bounds, set literals from heads, or a
conflict.
Derived assignments land on the trail, and so are observed by every other propagator in turn.

# Reasons and explanations

Each derivation records an [AggReason] for its atom: the set, the aggregate, the numeric basis
([certain](ExplBasis::Certain) or [possible](ExplBasis::Possible)), whether the head was an
antecedent, and enough of the numeric picture — a threshold and a prefix of the set's propagation
stack — for [an explanation clause to be built on demand](crate::procedures::analysis) during
conflict analysis.
*/

pub mod explain;
pub mod fully;
pub mod justify;
pub mod partial;
pub mod set;

use std::collections::HashMap;

use crate::{
    context::GenericContext,
    db::{ClauseKey, atom::ValuationStatus},
    misc::log::targets::{self},
    structures::{
        aggregate::{AggKind, AggSemantics, AggSign, SetId, WeightedLiteral},
        atom::Atom,
        clause::ClauseSource,
        consequence::AssignmentSource,
        literal::CLiteral,
        weight::{Weight, WeightOps},
    },
    types::err::{self, ErrorKind},
};

use set::{Agg, AggBounds, PropInfo, PropRole, Scheme, TypedSet};

/// A static watch: an index into a set, fired when the watched polarity arrives.
#[derive(Clone, Copy)]
pub struct SetWatch {
    /// The watched set.
    pub set: usize,

    /// The index of the weighted literal within the set.
    pub wl: usize,

    /// True if the event is the set literal becoming true.
    pub pos: bool,
}

/// A dynamic watch of a partially watched set.
#[derive(Clone, Copy)]
pub struct DynWatch {
    /// The watched set.
    pub set: usize,

    /// The index of the weighted literal within the set.
    pub wl: usize,

    /// True if the watch belongs to the lower (support) pool.
    pub lower: bool,
}

/// The numeric basis of a derivation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExplBasis {
    /// The derivation rests on the currently best certain value.
    Certain,

    /// The derivation rests on the currently best possible value.
    Possible,

    /// The derivation rests on the head alone.
    HeadOnly,
}

/// The reason behind a derivation of the aggregate propagator.
#[derive(Clone, Debug)]
pub struct AggReason {
    /// The set concerned.
    pub set: usize,

    /// The aggregate concerned.
    pub agg: usize,

    /// The derived literal.
    pub literal: CLiteral,

    /// The numeric basis of the derivation.
    pub basis: ExplBasis,

    /// True if the value of the head was an antecedent.
    pub head_involved: bool,

    /// The length of the set's propagation stack at the moment of derivation.
    pub stack_bound: usize,

    /// The fold value at which the bound became forced.
    pub threshold: Weight,

    /// Whether crossing the threshold is strict.
    pub strict: bool,
}

/// A derivation prepared during the evaluation of a set.
pub(crate) struct Derivation {
    pub literal: CLiteral,
    pub agg: usize,
    pub basis: ExplBasis,
    pub head_involved: bool,
    pub threshold: Weight,
    pub strict: bool,
}

/// The aggregate propagator.
#[derive(Default)]
pub struct Aggregates {
    /// Every typed set, constrained or not.
    pub sets: Vec<TypedSet>,

    /// External set identifiers to indices of `sets`.
    set_index: HashMap<SetId, usize>,

    /// Static watches, indexed by literal.
    static_watches: Vec<Vec<SetWatch>>,

    /// Dynamic watches, indexed by literal.
    dynamic_watches: Vec<Vec<DynWatch>>,

    /// Sets reifying a head on the atom, indexed by atom.
    head_watches: HashMap<Atom, Vec<usize>>,

    /// The reason for each atom valued by the propagator.
    pub reasons: Vec<Option<AggReason>>,

    /// The index of the first trail assignment not yet observed.
    trail_cursor: usize,

    /// Sets awaiting evaluation.
    pending: Vec<usize>,

    /// Pending membership, per set.
    pending_flags: Vec<bool>,

    /// Sets below this index have been finalized — lazy grounding may append further sets,
    /// finalized by a later pass.
    finalized_sets: usize,

    /// True once watches are installed and propagation may begin.
    finalized: bool,
}

impl Aggregates {
    /// The internal index of the set with external identifier `id`, if any.
    pub fn index_of(&self, id: SetId) -> Option<usize> {
        self.set_index.get(&id).copied()
    }

    /// Records a fresh set — parse phase only.
    pub fn add_set(
        &mut self,
        id: SetId,
        wls: Vec<WeightedLiteral>,
    ) -> Result<usize, ErrorKind> {
        if self.set_index.contains_key(&id) {
            return Err(err::ParseError::DuplicateSetId(id).into());
        }
        if wls.is_empty() {
            return Err(err::ParseError::EmptySet.into());
        }
        if wls.iter().any(|wl| wl.weight.negative()) {
            return Err(err::ParseError::NegativeWeight.into());
        }

        let index = self.sets.len();
        // The kind is fixed by the first aggregate over the set.
        self.sets.push(TypedSet::new(id, AggKind::Sum, wls));
        self.set_index.insert(id, index);
        Ok(index)
    }

    /// Attaches an aggregate to a set — parse phase only.
    #[allow(clippy::too_many_arguments)]
    pub fn attach_aggregate(
        &mut self,
        head: CLiteral,
        id: SetId,
        bound: Weight,
        sign: AggSign,
        kind: AggKind,
        semantics: AggSemantics,
        optimization: bool,
    ) -> Result<(usize, usize), ErrorKind> {
        let Some(si) = self.index_of(id) else {
            return Err(err::ParseError::UnknownSetId(id).into());
        };

        // A finalized set has its watches installed, and a fresh aggregate over it would go
        // unwatched — lazy extension is limited to sets of the same batch.
        if self.finalized && si < self.finalized_sets {
            return Err(err::StateError::NotYetImplemented.into());
        }

        if kind == AggKind::Prod && self.sets[si].wls.iter().any(|wl| wl.weight.zero_valued()) {
            return Err(err::ParseError::ZeroProductWeight.into());
        }

        if semantics == AggSemantics::Definitional && !head.polarity() {
            return Err(err::ParseError::NegativeDefinedHead.into());
        }

        let set = &mut self.sets[si];
        match set.aggs.is_empty() {
            true => set.kind = kind,
            false => {
                if set.kind != kind {
                    return Err(err::ParseError::KindMismatch(id).into());
                }
            }
        }

        let bounds = match sign {
            AggSign::AtLeast => AggBounds {
                lower: Some(bound),
                upper: None,
            },
            AggSign::AtMost => AggBounds {
                lower: None,
                upper: Some(bound),
            },
        };

        set.aggs.push(Agg {
            head,
            bounds,
            semantics,
            optimization,
        });

        Ok((si, set.aggs.len() - 1))
    }

    /// Grows the per-literal and per-atom structures to cover `atom_count` atoms.
    pub fn grow_to(&mut self, atom_count: usize) {
        let literal_count = 2 * atom_count;
        if self.static_watches.len() < literal_count {
            self.static_watches.resize_with(literal_count, Vec::default);
            self.dynamic_watches.resize_with(literal_count, Vec::default);
        }
        if self.reasons.len() < atom_count {
            self.reasons.resize(atom_count, None);
        }
    }

    /// True once watches are installed and propagation may begin.
    pub(crate) fn is_finalized(&self) -> bool {
        self.finalized
    }

    /// Freezes the theory: sets are reduced, bounds normalized, counters initialized, schemes
    /// chosen, and watches installed.
    ///
    /// Trivially decided aggregates are valued at the root as part of the pass.
    /// Re-runnable — only sets appended since the last pass are finalized, so lazy grounding
    /// may extend the theory at the root mid-search.
    pub(crate) fn finalize<R: rand::Rng + std::default::Default>(
        &mut self,
        ctx: &mut GenericContext<R>,
    ) -> Result<(), ErrorKind> {
        self.grow_to(ctx.atom_db.atom_count());
        self.pending_flags.resize(self.sets.len(), false);

        for si in self.finalized_sets..self.sets.len() {
            if self.sets[si].aggs.is_empty() {
                log::trace!(target: targets::FINALIZE, "Set {} is unconstrained.", self.sets[si].id);
                continue;
            }

            let offset = self.sets[si].reduce()?;
            if !offset.zero_valued() {
                for agg in &mut self.sets[si].aggs {
                    if let Some(lower) = &agg.bounds.lower {
                        agg.bounds.lower =
                            Some(lower.sub_checked(&offset).ok_or(ErrorKind::Overflow)?);
                    }
                    if let Some(upper) = &agg.bounds.upper {
                        agg.bounds.upper =
                            Some(upper.sub_checked(&offset).ok_or(ErrorKind::Overflow)?);
                    }
                }
            }

            if self.sets[si].kind == AggKind::Min {
                self.normalize_min(si)?;
            }

            if self.sets[si].wls.is_empty() {
                if let Some(key) = self.decide_empty_set(si, ctx)? {
                    return Err(err::BCPError::Conflict(key).into());
                }
                continue;
            }

            if self.sets[si].kind == AggKind::Max {
                self.clamp_max_bounds(si)?;
            }

            self.sets[si].finalize_counters()?;

            let partial = self.partial_watch_candidate(si, ctx.config.partial_watch_threshold);
            match partial {
                true => partial::install(self, si, &ctx.atom_db),
                false => {
                    self.install_static_watches(si);
                    self.ingest_valuation(si, &ctx.atom_db)?;
                }
            }

            for agg in &self.sets[si].aggs {
                self.head_watches
                    .entry(agg.head.atom())
                    .or_default()
                    .push(si);
            }

            self.mark_pending(si);
        }

        self.finalized_sets = self.sets.len();
        self.finalized = true;
        log::info!(target: targets::FINALIZE, "{} sets finalized.", self.finalized_sets);
        Ok(())
    }

    /// Folds assignments the trail cursor has already passed into the counters and stack of a
    /// fresh set, in trail order — later assignments arrive through the usual drain.
    fn ingest_valuation(
        &mut self,
        si: usize,
        atom_db: &crate::db::atom::AtomDB,
    ) -> Result<(), ErrorKind> {
        let mut events: Vec<(usize, usize, bool)> = Vec::new();
        for (wi, wl) in self.sets[si].wls.iter().enumerate() {
            if let Some(value) = atom_db.value_of_literal(wl.literal) {
                let position = atom_db.position_of(wl.literal.atom()).unwrap_or(0);
                if position < self.trail_cursor {
                    events.push((position, wi, value));
                }
            }
        }
        events.sort_unstable_by_key(|(position, _, _)| *position);

        let set = &mut self.sets[si];
        for (time, wl, value) in events {
            match value {
                true => {
                    set.stack.push(PropInfo {
                        role: PropRole::PosInSet,
                        wl,
                        time,
                    });
                    set.add_to_certain(wl)?;
                }
                false => {
                    set.stack.push(PropInfo {
                        role: PropRole::NegInSet,
                        wl,
                        time,
                    });
                    set.remove_from_possible(wl, |l| !atom_db.is_false(l))?;
                }
            }
        }
        Ok(())
    }

    /// Rewrites a min set as a max set over negated weights, with flipped bounds.
    fn normalize_min(&mut self, si: usize) -> Result<(), ErrorKind> {
        let set = &mut self.sets[si];
        for wl in &mut set.wls {
            wl.weight = Weight::zero()
                .sub_checked(&wl.weight)
                .ok_or(ErrorKind::Overflow)?;
        }
        set.wls.sort_by(|a, b| a.weight.cmp(&b.weight));
        for agg in &mut set.aggs {
            let lower = agg.bounds.lower.take();
            let upper = agg.bounds.upper.take();
            if let Some(lo) = lower {
                agg.bounds.upper =
                    Some(Weight::zero().sub_checked(&lo).ok_or(ErrorKind::Overflow)?);
            }
            if let Some(up) = upper {
                agg.bounds.lower =
                    Some(Weight::zero().sub_checked(&up).ok_or(ErrorKind::Overflow)?);
            }
        }
        set.kind = AggKind::Max;
        Ok(())
    }

    /// Values the heads of aggregates over a set which reduction emptied.
    fn decide_empty_set<R: rand::Rng + std::default::Default>(
        &mut self,
        si: usize,
        ctx: &mut GenericContext<R>,
    ) -> Result<Option<ClauseKey>, ErrorKind> {
        let empty = match self.sets[si].kind {
            AggKind::Sum | AggKind::Card => Weight::zero(),
            AggKind::Prod => Weight::one(),
            // Max and min sets are never emptied by reduction.
            AggKind::Max | AggKind::Min => return Ok(None),
        };

        for ai in 0..self.sets[si].aggs.len() {
            let agg = &self.sets[si].aggs[ai];
            let holds = agg.bounds.lower.as_ref().is_none_or(|lo| &empty >= lo)
                && agg.bounds.upper.as_ref().is_none_or(|up| &empty <= up);

            let literal = match holds {
                true => {
                    if agg.semantics == AggSemantics::Implication {
                        continue;
                    }
                    agg.head
                }
                false => agg.head.negate(),
            };

            match ctx.record_assignment(literal, AssignmentSource::Original) {
                ValuationStatus::Set | ValuationStatus::Same => {}
                ValuationStatus::Conflict => {
                    let key = ctx.clause_db.store(
                        vec![literal],
                        ClauseSource::Aggregate,
                        &ctx.atom_db,
                        &mut ctx.watches,
                    )?;
                    return Ok(Some(key));
                }
            }
        }
        Ok(None)
    }

    /// Clamps the bounds of max aggregates so the empty stand-in stays consistent.
    ///
    /// A lower bound below the least weight holds exactly when some literal is true, and an
    /// upper bound below the least weight holds exactly when no literal is true.
    fn clamp_max_bounds(&mut self, si: usize) -> Result<(), ErrorKind> {
        let least = self.sets[si].wls[0].weight.clone();
        let sentinel = least.sub_checked(&Weight::one()).ok_or(ErrorKind::Overflow)?;
        for agg in &mut self.sets[si].aggs {
            if let Some(lo) = &agg.bounds.lower {
                if lo < &least {
                    agg.bounds.lower = Some(least.clone());
                }
            }
            if let Some(up) = &agg.bounds.upper {
                if up < &sentinel {
                    agg.bounds.upper = Some(sentinel.clone());
                }
            }
        }
        Ok(())
    }

    /// True if the set qualifies for the partially watched scheme: a large cardinality set with
    /// unit weights and a single, lower-bounded, non-optimization aggregate.
    fn partial_watch_candidate(&self, si: usize, threshold: usize) -> bool {
        let set = &self.sets[si];
        set.kind == AggKind::Card
            && set.wls.len() > threshold
            && set.aggs.len() == 1
            && set.aggs[0].bounds.lower.is_some()
            && set.aggs[0].bounds.upper.is_none()
            && !set.aggs[0].optimization
            && set.wls.iter().all(|wl| wl.weight == Weight::one())
    }

    /// Registers a static watch on each polarity of each literal of the set.
    fn install_static_watches(&mut self, si: usize) {
        for wi in 0..self.sets[si].wls.len() {
            let literal = self.sets[si].wls[wi].literal;
            self.static_watches[literal.index()].push(SetWatch {
                set: si,
                wl: wi,
                pos: true,
            });
            self.static_watches[literal.negate().index()].push(SetWatch {
                set: si,
                wl: wi,
                pos: false,
            });
        }
    }

    /// Registers a dynamic watch, fired when `fire_on` becomes true.
    pub(crate) fn register_dynamic_watch(&mut self, fire_on: CLiteral, watch: DynWatch) {
        self.dynamic_watches[fire_on.index()].push(watch);
    }

    /// Marks a set for evaluation at the end of the queue.
    fn mark_pending(&mut self, si: usize) {
        if self.pending_flags.len() <= si {
            self.pending_flags.resize(si + 1, false);
        }
        if !self.pending_flags[si] {
            self.pending_flags[si] = true;
            self.pending.push(si);
        }
    }

    /// Propagates every consequence of the assignments the propagator has yet to observe.
    ///
    /// Returns the key of a conflict clause — stored, and unsatisfiable on the current
    /// valuation — if the theory conflicts.
    pub(crate) fn propagate_at_end_of_queue<R: rand::Rng + std::default::Default>(
        &mut self,
        ctx: &mut GenericContext<R>,
    ) -> Result<Option<ClauseKey>, ErrorKind> {
        if !self.finalized {
            return Ok(None);
        }

        loop {
            while self.trail_cursor < ctx.trail.assignments.len() {
                let time = self.trail_cursor;
                let literal = ctx.trail.assignments[time];
                self.trail_cursor += 1;

                let level = match ctx.atom_db.level_of(literal.atom()) {
                    Some(level) => level,
                    None => continue,
                };

                // Heads.
                if let Some(hosts) = self.head_watches.get(&literal.atom()) {
                    for si in hosts.clone() {
                        self.sets[si].ensure_frame(level);
                        self.sets[si].stack.push(PropInfo {
                            role: PropRole::HeadProp,
                            wl: 0,
                            time,
                        });
                        self.mark_pending(si);
                    }
                }

                // Static watches.
                for index in 0..self.static_watches[literal.index()].len() {
                    let watch = self.static_watches[literal.index()][index];
                    let set = &mut self.sets[watch.set];
                    set.ensure_frame(level);
                    match watch.pos {
                        true => {
                            set.stack.push(PropInfo {
                                role: PropRole::PosInSet,
                                wl: watch.wl,
                                time,
                            });
                            set.add_to_certain(watch.wl)?;
                        }
                        false => {
                            set.stack.push(PropInfo {
                                role: PropRole::NegInSet,
                                wl: watch.wl,
                                time,
                            });
                            let atom_db = &ctx.atom_db;
                            set.remove_from_possible(watch.wl, |l| !atom_db.is_false(l))?;
                        }
                    }
                    self.mark_pending(watch.set);
                }

                // Dynamic watches.
                let mut index = 0;
                while index < self.dynamic_watches[literal.index()].len() {
                    let watch = self.dynamic_watches[literal.index()][index];
                    index += 1;
                    if let Some(key) = partial::dynamic_event(self, watch, ctx)? {
                        return Ok(Some(key));
                    }
                }
            }

            if self.pending.is_empty() {
                return Ok(None);
            }

            let pending = std::mem::take(&mut self.pending);
            for si in pending {
                self.pending_flags[si] = false;
                let fully_watched = matches!(self.sets[si].scheme, Scheme::Fully);
                let conflict = match fully_watched {
                    true => fully::evaluate(self, si, ctx)?,
                    false => partial::evaluate(self, si, ctx)?,
                };
                if let Some(key) = conflict {
                    return Ok(Some(key));
                }
            }
        }
    }

    /// Applies prepared derivations for a set: reasons are recorded and assignments made, with a
    /// conflict materialized as a stored clause.
    pub(crate) fn apply_derivations<R: rand::Rng + std::default::Default>(
        &mut self,
        si: usize,
        derivations: Vec<Derivation>,
        ctx: &mut GenericContext<R>,
    ) -> Result<Option<ClauseKey>, ErrorKind> {
        for derivation in derivations {
            let Derivation {
                literal,
                agg,
                basis,
                head_involved,
                threshold,
                strict,
            } = derivation;

            if ctx.atom_db.is_true(literal) {
                continue;
            }

            let reason = AggReason {
                set: si,
                agg,
                literal,
                basis,
                head_involved,
                stack_bound: self.sets[si].stack.len(),
                threshold,
                strict,
            };

            if ctx.atom_db.is_false(literal) {
                let clause = self.explanation_clause(&reason, &ctx.atom_db)?;
                log::info!(target: targets::AGGREGATE, "Conflict over set {} on {literal}.", self.sets[si].id);
                let key = ctx.clause_db.store(
                    clause,
                    ClauseSource::Aggregate,
                    &ctx.atom_db,
                    &mut ctx.watches,
                )?;
                return Ok(Some(key));
            }

            log::trace!(target: targets::AGGREGATE, "Derived {literal} from set {}.", self.sets[si].id);
            self.reasons[literal.atom() as usize] = Some(reason);
            ctx.counters.aggregate_propagations += 1;
            match ctx.record_assignment(literal, AssignmentSource::Aggregate) {
                ValuationStatus::Set | ValuationStatus::Same => {}
                // Unreachable: the literal was checked against the valuation above.
                ValuationStatus::Conflict => return Err(err::AggError::CorruptWatch.into()),
            }
        }
        Ok(None)
    }

    /// Revises the upper bound of an optimization aggregate and queues the set for evaluation.
    pub(crate) fn tighten_upper(&mut self, si: usize, ai: usize, bound: Weight) {
        self.sets[si].aggs[ai].bounds.upper = Some(bound);
        self.mark_pending(si);
    }

    /// The fold of the set over a total valuation.
    pub fn fold_over_valuation(
        &self,
        si: usize,
        mut value_of: impl FnMut(CLiteral) -> Option<bool>,
    ) -> Result<Weight, ErrorKind> {
        let set = &self.sets[si];
        let mut fold = set.empty_value.clone();
        for wl in &set.wls {
            if value_of(wl.literal) == Some(true) {
                fold = match set.kind {
                    AggKind::Sum | AggKind::Card => {
                        fold.add_checked(&wl.weight).ok_or(ErrorKind::Overflow)?
                    }
                    AggKind::Prod => fold.mul_checked(&wl.weight).ok_or(ErrorKind::Overflow)?,
                    AggKind::Max | AggKind::Min => std::cmp::max(fold, wl.weight.clone()),
                };
            }
        }
        Ok(fold)
    }

    /// Restores the propagator to the given level: counters and stacks through per-set frames,
    /// pool swaps through the swap logs, and the trail cursor to the remaining trail.
    ///
    /// Every constrained set is queued for re-evaluation — a derivation noticed above the
    /// target may already be implied at the target, and the re-evaluation keeps the propagation
    /// complete at every level.
    pub(crate) fn backtrack(&mut self, level: crate::db::LevelIndex, trail_length: usize) {
        self.trail_cursor = std::cmp::min(self.trail_cursor, trail_length);

        for set in &mut self.sets {
            set.backtrack(level);
            if let Scheme::Partial(pw) = &mut set.scheme {
                pw.backtrack(level);
            }
        }

        if self.finalized {
            for si in 0..self.sets.len() {
                if !self.sets[si].aggs.is_empty() && !self.sets[si].wls.is_empty() {
                    self.mark_pending(si);
                }
            }
        }
    }
}
