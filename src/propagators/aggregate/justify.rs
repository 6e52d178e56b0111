/*!
Justification queries for definitional aggregates.

A definitional aggregate defines its head, and when the head sits inside a positive cycle the
definition propagator must know whether the aggregate can *justify* the head — reach its bound —
using only literals whose truth does not circle back through the cycle.

Two queries are exposed, mirrored on the rule side of the definition propagator:
- [can_justify_head](Aggregates::can_justify_head) — whether the bound is reachable over
  *permitted* contributions: a negative literal is always permitted (well-founded negation is
  external), and a positive literal is permitted when the given predicate accepts its atom.
- [find_justification](Aggregates::find_justification) — the permitted literals witnessing
  reachability, gathered greedily from the heaviest down.

Only monotone aggregates — lower-bounded sums and counts — are accepted as recursive
definitions, checked during the finalization of the definition propagator.
*/

use crate::{
    db::atom::AtomDB,
    structures::{
        atom::Atom,
        literal::CLiteral,
        weight::{Weight, WeightOps},
    },
    types::err::{self, ErrorKind},
};

use super::Aggregates;

impl Aggregates {
    /// True if the aggregate is a shape unfounded set reasoning covers: a lower-bounded sum or
    /// count.
    pub fn monotone_recursive(&self, si: usize, ai: usize) -> bool {
        use crate::structures::aggregate::AggKind;
        let set = &self.sets[si];
        matches!(set.kind, AggKind::Sum | AggKind::Card)
            && set.aggs[ai].bounds.lower.is_some()
            && set.aggs[ai].bounds.upper.is_none()
    }

    /// The atoms of positive set literals — the positive dependencies of a definitional head.
    pub fn positive_set_atoms(&self, si: usize) -> impl Iterator<Item = Atom> + '_ {
        self.sets[si]
            .wls
            .iter()
            .filter(|wl| wl.literal.polarity())
            .map(|wl| wl.literal.atom())
    }

    /// The literals of the set, in weight order.
    pub fn set_literals(&self, si: usize) -> impl Iterator<Item = CLiteral> + '_ {
        self.sets[si].wls.iter().map(|wl| wl.literal)
    }

    /// Whether the aggregate can reach its lower bound counting only non-false, permitted,
    /// contributions.
    pub fn can_justify_head(
        &self,
        si: usize,
        ai: usize,
        atom_db: &AtomDB,
        permitted: &dyn Fn(Atom) -> bool,
    ) -> Result<bool, ErrorKind> {
        let set = &self.sets[si];
        let Some(lower) = &set.aggs[ai].bounds.lower else {
            return Err(err::AggError::MissingSet.into());
        };

        let mut achievable = Weight::zero();
        for wl in &set.wls {
            if atom_db.is_false(wl.literal) {
                continue;
            }
            if wl.literal.polarity() && !permitted(wl.literal.atom()) {
                continue;
            }
            achievable = achievable
                .add_checked(&wl.weight)
                .ok_or(ErrorKind::Overflow)?;
            if &achievable >= lower {
                return Ok(true);
            }
        }

        Ok(&achievable >= lower)
    }

    /// A justification for the head: permitted, non-false, literals whose weights reach the
    /// lower bound, gathered from the heaviest down.
    ///
    /// Empty when no justification exists.
    pub fn find_justification(
        &self,
        si: usize,
        ai: usize,
        atom_db: &AtomDB,
        permitted: &dyn Fn(Atom) -> bool,
    ) -> Result<Vec<CLiteral>, ErrorKind> {
        let set = &self.sets[si];
        let Some(lower) = &set.aggs[ai].bounds.lower else {
            return Err(err::AggError::MissingSet.into());
        };

        let mut justification = Vec::new();
        let mut achieved = Weight::zero();

        for wl in set.wls.iter().rev() {
            if &achieved >= lower {
                break;
            }
            if atom_db.is_false(wl.literal) {
                continue;
            }
            if wl.literal.polarity() && !permitted(wl.literal.atom()) {
                continue;
            }
            achieved = achieved
                .add_checked(&wl.weight)
                .ok_or(ErrorKind::Overflow)?;
            justification.push(wl.literal);
        }

        match &achieved >= lower {
            true => Ok(justification),
            false => Ok(Vec::default()),
        }
    }

    /// The currently false positive literals of the set — witnesses for a loop formula over an
    /// unfounded set containing the head.
    pub fn loop_formula_witnesses(&self, si: usize, atom_db: &AtomDB) -> Vec<CLiteral> {
        self.sets[si]
            .wls
            .iter()
            .filter(|wl| wl.literal.polarity() && atom_db.is_false(wl.literal))
            .map(|wl| wl.literal)
            .collect()
    }
}
