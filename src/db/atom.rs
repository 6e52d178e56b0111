/*!
The atom database.

Holds, per atom:
- The current value, if any.
- The previous value, for phase saving.
- The decision level, trail position, and [source](AssignmentSource) of the current assignment.
- An activity score, on a max-heap of unvalued atoms.

The trail position of an atom is the monotonic *time* of its assignment — times strictly increase
along the trail, and the aggregate propagator orders explanation culprits by them.
*/

use crate::{
    generic::heap::IndexHeap,
    misc::log::targets::{self},
    structures::{
        atom::{ATOM_MAX, Atom},
        consequence::AssignmentSource,
        literal::CLiteral,
    },
    types::err::{self},
};

use super::LevelIndex;

/// The result of attempting to value an atom.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ValuationStatus {
    /// The atom had no value, and now has the given value.
    Set,

    /// The atom already had the given value.
    Same,

    /// The atom has the opposite value.
    Conflict,
}

/// The valuation, and per-atom assignment details.
pub struct AtomDB {
    /// The value of each atom, if any.
    values: Vec<Option<bool>>,

    /// The last value each atom held, for phase saving.
    previous: Vec<bool>,

    /// The level at which each atom was valued — stale unless the atom has a value.
    levels: Vec<LevelIndex>,

    /// The trail position at which each atom was valued — stale unless the atom has a value.
    positions: Vec<usize>,

    /// The source of each atom's value — stale unless the atom has a value.
    sources: Vec<AssignmentSource>,

    /// Unvalued atoms, ordered by activity.
    activity: IndexHeap,

    /// The amount to bump activity by.
    bump: f64,

    /// The factor to scale the bump by after each conflict.
    decay_factor: f64,
}

impl AtomDB {
    /// A fresh database, with bump and decay taken from the given parameters.
    pub fn new(bump: f64, decay_factor: f64) -> Self {
        AtomDB {
            values: Vec::default(),
            previous: Vec::default(),
            levels: Vec::default(),
            positions: Vec::default(),
            sources: Vec::default(),
            activity: IndexHeap::default(),
            bump,
            decay_factor,
        }
    }

    /// Expands the database with a fresh atom.
    pub fn fresh_atom(&mut self) -> Result<Atom, err::ErrorKind> {
        let atom = self.values.len() as Atom;
        if atom == ATOM_MAX {
            return Err(err::ErrorKind::AtomsExhausted);
        }

        self.values.push(None);
        self.previous.push(false);
        self.levels.push(0);
        self.positions.push(0);
        self.sources.push(AssignmentSource::None);

        self.activity.grow_to(atom as usize + 1);
        self.activity.activate(atom as usize);

        Ok(atom)
    }

    /// A count of atoms in the database.
    pub fn atom_count(&self) -> usize {
        self.values.len()
    }

    /// The value of the atom, if any.
    pub fn value_of(&self, atom: Atom) -> Option<bool> {
        self.values[atom as usize]
    }

    /// The value of the literal, if its atom has a value.
    pub fn value_of_literal(&self, literal: CLiteral) -> Option<bool> {
        self.values[literal.atom() as usize].map(|value| value == literal.polarity())
    }

    /// True if the literal holds on the current valuation.
    pub fn is_true(&self, literal: CLiteral) -> bool {
        self.value_of_literal(literal) == Some(true)
    }

    /// True if the literal conflicts with the current valuation.
    pub fn is_false(&self, literal: CLiteral) -> bool {
        self.value_of_literal(literal) == Some(false)
    }

    /// True if the atom of the literal has no value.
    pub fn is_unknown(&self, literal: CLiteral) -> bool {
        self.value_of_literal(literal).is_none()
    }

    /// Attempts to value the atom of the literal per the polarity of the literal.
    pub fn set_value(
        &mut self,
        literal: CLiteral,
        level: LevelIndex,
        position: usize,
        source: AssignmentSource,
    ) -> ValuationStatus {
        let atom = literal.atom() as usize;
        match self.values[atom] {
            None => {
                self.values[atom] = Some(literal.polarity());
                self.levels[atom] = level;
                self.positions[atom] = position;
                self.sources[atom] = source;
                ValuationStatus::Set
            }

            Some(value) if value == literal.polarity() => ValuationStatus::Same,

            Some(_) => ValuationStatus::Conflict,
        }
    }

    /// Clears the value of the atom, noting the value for phase saving and returning the atom to
    /// the activity heap.
    pub fn drop_value(&mut self, atom: Atom) {
        if let Some(value) = self.values[atom as usize] {
            log::trace!(target: targets::VALUATION, "Cleared value of {atom}.");
            self.previous[atom as usize] = value;
            self.values[atom as usize] = None;
            self.sources[atom as usize] = AssignmentSource::None;
            self.activity.activate(atom as usize);
        }
    }

    /// The level at which the atom was assigned, if it has a value.
    pub fn level_of(&self, atom: Atom) -> Option<LevelIndex> {
        match self.values[atom as usize] {
            Some(_) => Some(self.levels[atom as usize]),
            None => None,
        }
    }

    /// The trail position at which the atom was assigned, if it has a value.
    pub fn position_of(&self, atom: Atom) -> Option<usize> {
        match self.values[atom as usize] {
            Some(_) => Some(self.positions[atom as usize]),
            None => None,
        }
    }

    /// The source of the atom's value.
    pub fn source_of(&self, atom: Atom) -> AssignmentSource {
        self.sources[atom as usize]
    }

    /// The previous value of the atom, for phase saving.
    pub fn previous_value_of(&self, atom: Atom) -> bool {
        self.previous[atom as usize]
    }

    /// Returns the atom to the activity heap.
    pub fn reactivate(&mut self, atom: Atom) {
        self.activity.activate(atom as usize);
    }

    /// Some unvalued atom with maximal activity, if any atom is unvalued.
    pub fn most_active_unvalued(&mut self) -> Option<Atom> {
        while let Some(index) = self.activity.pop_max() {
            if self.values[index].is_none() {
                return Some(index as Atom);
            }
        }
        None
    }

    /// An iterator over atoms without a value.
    pub fn unvalued_atoms(&self) -> impl Iterator<Item = Atom> + '_ {
        self.values
            .iter()
            .enumerate()
            .filter_map(|(atom, value)| match value {
                None => Some(atom as Atom),
                Some(_) => None,
            })
    }

    /// An iterator over every atom-value pair.
    pub fn valuation(&self) -> impl Iterator<Item = (Atom, Option<bool>)> + '_ {
        self.values
            .iter()
            .enumerate()
            .map(|(atom, value)| (atom as Atom, *value))
    }

    /// Bumps the activity of the atom, rescoring every atom if the bump exceeds a threshold.
    pub fn bump_activity(&mut self, atom: Atom) {
        const RESCALE_AT: f64 = 1e100;

        let score = self.activity.score_of(atom as usize) + self.bump;
        if score > RESCALE_AT {
            self.activity.scale_scores(1.0 / RESCALE_AT);
            self.bump /= RESCALE_AT;
            self.activity
                .set_score(atom as usize, self.activity.score_of(atom as usize) + self.bump);
        } else {
            self.activity.set_score(atom as usize, score);
        }
    }

    /// Increases the bump applied on future activity revisions.
    ///
    /// Scaling future bumps up is equivalent to decaying every existing score, without a pass
    /// over the scores.
    pub fn decay_activity(&mut self) {
        self.bump *= self.decay_factor;
    }
}
