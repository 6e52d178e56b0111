/*!
Typed weighted sets and the aggregates over them.

A [TypedSet] owns an ordered sequence of weighted literals — sorted by weight, ascending — and the
[Agg]s which constrain folds of the set.

# Counters

At every point during a solve a fully watched set maintains:
- `cbc`, the *currently best certain* value: the fold over literals currently true.
- `cbp`, the *currently best possible* value: the fold over literals currently true or unvalued.

For sums these are partial sums, for products partial products, for cardinality running counts,
and for max the running extremum.
The two bracket the fold on any completion of the valuation, and every propagation rule is a
comparison of one of the two against a bound.

# Set reduction

Before watches are installed each set is *reduced*: duplicate occurrences of a literal are
combined by the fold's combination rule, and an occurrence of a literal together with its
negation is rewritten according to the type of the set — for sums and counts the lesser weight is
certain and moves into an offset applied to every bound, while products reject the pair.
*/

use crate::{
    db::LevelIndex,
    structures::{
        aggregate::{AggKind, AggSemantics, SetId, WeightedLiteral},
        literal::CLiteral,
        weight::{Weight, WeightOps},
    },
    types::err::{self, ErrorKind},
};

/// The bound(s) of an aggregate: lower, upper, or both.
#[derive(Clone, Debug, Default)]
pub struct AggBounds {
    /// The fold is at least this, if present.
    pub lower: Option<Weight>,

    /// The fold is at most this, if present.
    pub upper: Option<Weight>,
}

/// An aggregate constraint over a typed set.
#[derive(Clone, Debug)]
pub struct Agg {
    /// The reified head.
    pub head: CLiteral,

    /// The bound(s) of the constraint.
    pub bounds: AggBounds,

    /// How the head relates to the constraint.
    pub semantics: AggSemantics,

    /// True for the surrogate aggregate of a minimization objective.
    ///
    /// An optimization aggregate keeps the fully watched scheme, as its bound is revised after
    /// each model.
    pub optimization: bool,
}

/// The role of an entry on a set's propagation stack.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PropRole {
    /// A head of the set acquired a value.
    HeadProp,

    /// A set literal became true.
    PosInSet,

    /// A set literal became false.
    NegInSet,
}

/// An entry on a set's propagation stack.
///
/// The stack records every event the set has observed, in trail order — explanations are built by
/// replaying a prefix of the stack.
#[derive(Clone, Copy, Debug)]
pub struct PropInfo {
    /// The role of the event.
    pub role: PropRole,

    /// The index of the weighted literal concerned — meaningless for [PropRole::HeadProp].
    pub wl: usize,

    /// The trail position of the assignment behind the event.
    pub time: usize,
}

/// Counter values of a set prior to the first event of a level.
///
/// Backtracking a level restores the frame, in time proportional to the propagations of the
/// frame.
#[derive(Clone, Debug)]
pub struct FwFrame {
    /// The level the frame belongs to.
    pub level: LevelIndex,

    /// `cbc` before any event of the level.
    pub cbc: Weight,

    /// `cbp` before any event of the level.
    pub cbp: Weight,

    /// The length of the propagation stack before any event of the level.
    pub stack_len: usize,
}

/// The watching scheme of a set.
pub enum Scheme {
    /// Every literal of the set is watched, and counters are maintained incrementally.
    Fully,

    /// A witness subset is watched — see [partial](crate::propagators::aggregate::partial).
    Partial(super::partial::PwState),
}

/// A weighted set together with the aggregates over it.
pub struct TypedSet {
    /// The external identifier of the set.
    pub id: SetId,

    /// The fold applied to the set.
    ///
    /// [Min](AggKind::Min) is rewritten to [Max](AggKind::Max) during finalization.
    pub kind: AggKind,

    /// The weighted literals of the set, sorted by weight, ascending.
    pub wls: Vec<WeightedLiteral>,

    /// The fold over no literals.
    pub empty_value: Weight,

    /// The fold over every literal — the best possible value before any assignment.
    pub initial_possible: Weight,

    /// The aggregates over the set.
    pub aggs: Vec<Agg>,

    /// The watching scheme.
    pub scheme: Scheme,

    /// The currently best certain value.
    pub cbc: Weight,

    /// The currently best possible value.
    pub cbp: Weight,

    /// Events observed by the set, in trail order.
    pub stack: Vec<PropInfo>,

    /// Per-level snapshots for backtracking.
    pub frames: Vec<FwFrame>,
}

impl TypedSet {
    /// A fresh set over the given literals — counters are placeholders until
    /// [finalize](TypedSet::finalize).
    pub fn new(id: SetId, kind: AggKind, wls: Vec<WeightedLiteral>) -> Self {
        TypedSet {
            id,
            kind,
            wls,
            empty_value: Weight::zero(),
            initial_possible: Weight::zero(),
            aggs: Vec::default(),
            scheme: Scheme::Fully,
            cbc: Weight::zero(),
            cbp: Weight::zero(),
            stack: Vec::default(),
            frames: Vec::default(),
        }
    }

    /// Combines duplicate literals, rewrites both-polarity pairs, and sorts by weight.
    ///
    /// Returns the offset to subtract from every bound over the set — non-zero only when a
    /// sum or count holds a literal in both polarities, in which case the lesser weight is
    /// contributed regardless of the valuation.
    pub fn reduce(&mut self) -> Result<Weight, ErrorKind> {
        let mut offset = Weight::zero();

        // Group by literal, so duplicate and then both-polarity occurrences are adjacent.
        self.wls.sort_by_key(|wl| wl.literal.index());

        let mut reduced: Vec<WeightedLiteral> = Vec::with_capacity(self.wls.len());
        for wl in std::mem::take(&mut self.wls) {
            match reduced.last_mut() {
                Some(last) if last.literal == wl.literal => {
                    last.weight = match self.kind {
                        AggKind::Sum | AggKind::Card => last
                            .weight
                            .add_checked(&wl.weight)
                            .ok_or(ErrorKind::Overflow)?,
                        AggKind::Prod => last
                            .weight
                            .mul_checked(&wl.weight)
                            .ok_or(ErrorKind::Overflow)?,
                        AggKind::Max | AggKind::Min => {
                            std::cmp::max(last.weight.clone(), wl.weight.clone())
                        }
                    };
                }

                Some(last) if last.literal.atom() == wl.literal.atom() => match self.kind {
                    AggKind::Sum | AggKind::Card => {
                        // One of the pair is true on any valuation, so the lesser weight is
                        // certain and the difference rides on the heavier literal.
                        let lesser = std::cmp::min(last.weight.clone(), wl.weight.clone());
                        offset = offset.add_checked(&lesser).ok_or(ErrorKind::Overflow)?;
                        if wl.weight > last.weight {
                            let difference = wl
                                .weight
                                .sub_checked(&last.weight)
                                .ok_or(ErrorKind::Overflow)?;
                            last.literal = wl.literal;
                            last.weight = difference;
                        } else {
                            last.weight = last
                                .weight
                                .sub_checked(&wl.weight)
                                .ok_or(ErrorKind::Overflow)?;
                        }
                    }

                    AggKind::Prod => {
                        return Err(err::ParseError::BothPolaritiesInProduct.into());
                    }

                    // One of the pair is true on any valuation, and the counters notice the
                    // consequences as values arrive, so both are kept.
                    AggKind::Max | AggKind::Min => reduced.push(wl),
                },

                _ => reduced.push(wl),
            }
        }

        // Zero weights contribute nothing to a sum or count.
        if matches!(self.kind, AggKind::Sum | AggKind::Card) {
            reduced.retain(|wl| !wl.weight.zero_valued());
        }

        reduced.sort_by(|a, b| a.weight.cmp(&b.weight));
        self.wls = reduced;

        Ok(offset)
    }

    /// Fixes the empty value and initial counters of the (reduced, non-empty) set.
    pub fn finalize_counters(&mut self) -> Result<(), ErrorKind> {
        self.empty_value = match self.kind {
            AggKind::Sum | AggKind::Card => Weight::zero(),
            AggKind::Prod => Weight::one(),
            // A stand-in for −∞, consistent so long as bounds are clamped to at least this.
            AggKind::Max | AggKind::Min => self.wls[0]
                .weight
                .sub_checked(&Weight::one())
                .ok_or(ErrorKind::Overflow)?,
        };

        self.initial_possible = match self.kind {
            AggKind::Sum | AggKind::Card => {
                let mut total = Weight::zero();
                for wl in &self.wls {
                    total = total.add_checked(&wl.weight).ok_or(ErrorKind::Overflow)?;
                }
                total
            }
            AggKind::Prod => {
                let mut total = Weight::one();
                for wl in &self.wls {
                    total = total.mul_checked(&wl.weight).ok_or(ErrorKind::Overflow)?;
                }
                total
            }
            // Sorted ascending, so the best possible is the last weight.
            AggKind::Max | AggKind::Min => self.wls[self.wls.len() - 1].weight.clone(),
        };

        self.cbc = self.empty_value.clone();
        self.cbp = self.initial_possible.clone();

        Ok(())
    }

    /// Pushes a frame for `level` unless one is already in place.
    pub fn ensure_frame(&mut self, level: LevelIndex) {
        let fresh = match self.frames.last() {
            Some(frame) => frame.level < level,
            None => true,
        };
        if fresh {
            self.frames.push(FwFrame {
                level,
                cbc: self.cbc.clone(),
                cbp: self.cbp.clone(),
                stack_len: self.stack.len(),
            });
        }
    }

    /// The fold with a weight added, per the kind of the set.
    pub fn fold_with(&self, fold: &Weight, weight: &Weight) -> Result<Weight, ErrorKind> {
        match self.kind {
            AggKind::Sum | AggKind::Card => fold.add_checked(weight).ok_or(ErrorKind::Overflow),
            AggKind::Prod => fold.mul_checked(weight).ok_or(ErrorKind::Overflow),
            AggKind::Max | AggKind::Min => Ok(std::cmp::max(fold.clone(), weight.clone())),
        }
    }

    /// The fold with a weight removed, per the kind of the set.
    ///
    /// # Soundness
    /// Not defined for max — the extremum is rediscovered by scanning, see
    /// [remove_from_possible](TypedSet::remove_from_possible).
    pub fn fold_without(&self, fold: &Weight, weight: &Weight) -> Result<Weight, ErrorKind> {
        match self.kind {
            AggKind::Sum | AggKind::Card => fold.sub_checked(weight).ok_or(ErrorKind::Overflow),
            AggKind::Prod => Ok(fold.div_exact(weight)),
            AggKind::Max | AggKind::Min => Ok(fold.clone()),
        }
    }

    /// The weight carried by the atom in the set, if the atom occurs.
    pub fn weight_of_atom(&self, atom: crate::structures::atom::Atom) -> Option<&Weight> {
        self.wls
            .iter()
            .find(|wl| wl.literal.atom() == atom)
            .map(|wl| &wl.weight)
    }

    /// Applies a set literal having become true to `cbc`.
    pub fn add_to_certain(&mut self, wl: usize) -> Result<(), ErrorKind> {
        let weight = &self.wls[wl].weight;
        self.cbc = match self.kind {
            AggKind::Sum | AggKind::Card => {
                self.cbc.add_checked(weight).ok_or(ErrorKind::Overflow)?
            }
            AggKind::Prod => self.cbc.mul_checked(weight).ok_or(ErrorKind::Overflow)?,
            AggKind::Max | AggKind::Min => std::cmp::max(self.cbc.clone(), weight.clone()),
        };
        Ok(())
    }

    /// Applies a set literal having become false to `cbp`.
    ///
    /// For max the extremum is rediscovered by scanning down from the heaviest literal, using
    /// the valuation snapshot provided by `still_possible`.
    pub fn remove_from_possible(
        &mut self,
        wl: usize,
        still_possible: impl Fn(CLiteral) -> bool,
    ) -> Result<(), ErrorKind> {
        match self.kind {
            AggKind::Sum | AggKind::Card => {
                let weight = &self.wls[wl].weight;
                self.cbp = self.cbp.sub_checked(weight).ok_or(ErrorKind::Overflow)?;
            }
            AggKind::Prod => {
                let weight = &self.wls[wl].weight;
                self.cbp = self.cbp.div_exact(weight);
            }
            AggKind::Max | AggKind::Min => {
                if self.wls[wl].weight == self.cbp {
                    let mut best = self.empty_value.clone();
                    for candidate in self.wls.iter().rev() {
                        if still_possible(candidate.literal) {
                            best = candidate.weight.clone();
                            break;
                        }
                    }
                    self.cbp = best;
                }
            }
        }
        Ok(())
    }

    /// Unwinds frames above `level`, restoring the counters and stack.
    pub fn backtrack(&mut self, level: LevelIndex) {
        let mut oldest: Option<FwFrame> = None;
        while let Some(frame) = self.frames.last() {
            if frame.level > level {
                oldest = self.frames.pop();
            } else {
                break;
            }
        }
        if let Some(frame) = oldest {
            self.cbc = frame.cbc;
            self.cbp = frame.cbp;
            self.stack.truncate(frame.stack_len);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::structures::literal::CLiteral;

    fn wl(atom: u32, polarity: bool, weight: i64) -> WeightedLiteral {
        WeightedLiteral::new(CLiteral::new(atom, polarity), Weight::from_int(weight))
    }

    #[test]
    fn duplicate_literals_combine() {
        let mut set = TypedSet::new(0, AggKind::Sum, vec![wl(1, true, 3), wl(1, true, 4), wl(2, true, 1)]);
        let offset = set.reduce().unwrap();
        assert_eq!(offset, Weight::zero());
        assert_eq!(set.wls.len(), 2);
        assert_eq!(set.wls[0].weight, Weight::from_int(1));
        assert_eq!(set.wls[1].weight, Weight::from_int(7));
    }

    #[test]
    fn both_polarities_offset_a_sum() {
        let mut set = TypedSet::new(0, AggKind::Sum, vec![wl(1, true, 3), wl(1, false, 5), wl(2, true, 2)]);
        let offset = set.reduce().unwrap();
        assert_eq!(offset, Weight::from_int(3));
        // The negative occurrence remains, carrying the difference.
        assert_eq!(set.wls.len(), 2);
        let negative = set
            .wls
            .iter()
            .find(|wl| wl.literal == CLiteral::new(1, false))
            .unwrap();
        assert_eq!(negative.weight, Weight::from_int(2));
    }

    #[test]
    fn both_polarities_reject_a_product() {
        let mut set = TypedSet::new(0, AggKind::Prod, vec![wl(1, true, 3), wl(1, false, 5)]);
        assert_eq!(
            set.reduce(),
            Err(ErrorKind::Parse(err::ParseError::BothPolaritiesInProduct))
        );
    }

    #[test]
    fn counters_over_a_sum() {
        let mut set = TypedSet::new(0, AggKind::Sum, vec![wl(1, true, 3), wl(2, true, 5), wl(3, true, 7)]);
        set.reduce().unwrap();
        set.finalize_counters().unwrap();
        assert_eq!(set.cbc, Weight::from_int(0));
        assert_eq!(set.cbp, Weight::from_int(15));

        set.add_to_certain(2).unwrap();
        assert_eq!(set.cbc, Weight::from_int(7));

        set.remove_from_possible(0, |_| true).unwrap();
        assert_eq!(set.cbp, Weight::from_int(12));
    }

    #[test]
    fn frames_restore_counters() {
        let mut set = TypedSet::new(0, AggKind::Sum, vec![wl(1, true, 3), wl(2, true, 5)]);
        set.reduce().unwrap();
        set.finalize_counters().unwrap();

        set.ensure_frame(1);
        set.stack.push(PropInfo { role: PropRole::PosInSet, wl: 0, time: 0 });
        set.add_to_certain(0).unwrap();
        assert_eq!(set.cbc, Weight::from_int(3));

        set.backtrack(0);
        assert_eq!(set.cbc, Weight::from_int(0));
        assert!(set.stack.is_empty());
    }
}
