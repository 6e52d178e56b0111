/*!
Methods for choosing the value of an atom.

# Overview

A decision assigns a value to some unvalued atom at a fresh level.
The atom is taken from the activity heap — activity approximates the relative degree to which an
atom has been involved in deriving conflicts, and deciding active atoms first tends to identify
whether the search is in an unsatisfiable region quickly.
With some (configurable, by default zero) probability a random unvalued atom is taken instead.

The value follows the atom's previous value when phase saving is enabled, and otherwise leans on
[polarity_lean](crate::config::Config::polarity_lean).

# Residuals

A residual watching the chosen atom for the `becomes decidable` event pre-empts the decision:
the atom is returned to the heap and the caller is told to fire the residual before deciding.

No particular heuristic is load-bearing — any scheme which eventually decides every unvalued
atom preserves completeness.
*/

use rand::Rng;

use crate::{
    context::GenericContext,
    structures::{atom::Atom, literal::CLiteral},
};

/// Possible 'Ok' results from choosing a truth value to assign an atom.
pub enum DecisionOk {
    /// Some truth value was chosen for some atom.
    Literal(CLiteral),

    /// The chosen atom carries a lazy grounding residual, to be fired before any decision.
    Residual(Atom),

    /// Every atom has a value — the valuation is total.
    Exhausted,
}

impl<R: rand::Rng + std::default::Default> GenericContext<R> {
    /// Chooses an atom and value to decide on, if some atom lacks a value.
    pub fn make_decision(&mut self) -> DecisionOk {
        let chosen_atom = match self.atom_without_value() {
            Some(atom) => atom,
            None => return DecisionOk::Exhausted,
        };

        if self.residuals.watches_decidable(chosen_atom) {
            // The atom keeps its place on the heap, as no decision is made.
            self.atom_db.reactivate(chosen_atom);
            return DecisionOk::Residual(chosen_atom);
        }

        self.counters.total_decisions += 1;

        let value = match self.config.phase_saving {
            true => self.atom_db.previous_value_of(chosen_atom),
            false => self.rng.random_bool(self.config.polarity_lean),
        };

        let decision = CLiteral::new(chosen_atom, value);
        log::trace!("Decision {decision}.");
        DecisionOk::Literal(decision)
    }

    /// Returns an atom without a value, by most activity or — with configured probability — at
    /// random.
    fn atom_without_value(&mut self) -> Option<Atom> {
        let count = self.atom_db.atom_count();
        if count > 0
            && self.config.random_decision_bias > 0.0
            && self.rng.random_bool(self.config.random_decision_bias)
        {
            for _ in 0..8 {
                let candidate = self.rng.random_range(0..count) as Atom;
                if self.atom_db.value_of(candidate).is_none() {
                    return Some(candidate);
                }
            }
        }

        match self.atom_db.most_active_unvalued() {
            Some(atom) => Some(atom),
            None => self.atom_db.unvalued_atoms().next(),
        }
    }
}
