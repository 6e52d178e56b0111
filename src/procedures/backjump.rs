/*!
Recovery from a conflict.

A backjump is a 'jump' from some (higher) decision level to some previous (lower) decision level.

Typically, a backjump is made from level *l* to level *l − i* because a conflict was found at
level *l* and analysis produced a clause which asserts some literal at level *l − i*.
All decisions and consequences above the target are undone in reverse order, and each propagator
restores its own state — counters through per-set frames, watch pools through swap logs, and
trail cursors against the remaining trail — through a hook called with the trimmed trail.

Backjumping is linear in the count of undone assignments.
*/

use std::cmp;

use crate::{
    context::GenericContext,
    db::LevelIndex,
    misc::log::targets::{self},
    structures::literal::CLiteral,
    types::err,
};

impl<R: rand::Rng + std::default::Default> GenericContext<R> {
    /// Backjumps to the given target level.
    ///
    /// Safe against a target at or above the current level — nothing happens.
    pub fn backjump(&mut self, target: LevelIndex) {
        log::trace!(target: targets::BACKJUMP, "Backjump from {} to {target}.", self.trail.level());

        let removed = self.trail.clear_assignments_above(target);
        for literal in removed {
            self.atom_db.drop_value(literal.atom());
        }

        self.trail.q_head = cmp::min(self.trail.q_head, self.trail.assignments.len());

        let remaining = self.trail.assignments.len();
        self.aggregates.backtrack(target, remaining);
        self.definitions.backtrack(remaining);
        self.residuals.backtrack(remaining);
    }

    /// The non-chronological backjump level of an unsatisfiable clause: the second-highest
    /// decision level among its literals.
    ///
    /// # Soundness
    /// Sound only for clauses unsatisfiable on the current valuation.
    pub fn non_chronological_backjump_level(
        &self,
        clause: &[CLiteral],
    ) -> Result<LevelIndex, err::ErrorKind> {
        match clause.len() {
            0 => Err(err::ErrorKind::Backjump),

            1 => Ok(0),

            _ => {
                // An ordered record of the top two levels seen: (second_to_top, top).
                let mut top_two: (Option<LevelIndex>, Option<LevelIndex>) = (None, None);

                for literal in clause {
                    let level = match self.atom_db.level_of(literal.atom()) {
                        Some(level) => level,
                        None => {
                            log::error!(target: targets::BACKJUMP, "{literal} was not set.");
                            return Err(err::ErrorKind::Backjump);
                        }
                    };

                    match top_two {
                        (_, None) => top_two.1 = Some(level),

                        (_, Some(top)) if level > top => {
                            top_two.0 = top_two.1;
                            top_two.1 = Some(level);
                        }

                        (None, _) => top_two.0 = Some(level),

                        (Some(second_to_top), _) => {
                            if level > second_to_top {
                                top_two.0 = Some(level)
                            }
                        }
                    }
                }

                match top_two {
                    (Some(second_to_top), Some(_)) => Ok(second_to_top),
                    _ => Ok(0),
                }
            }
        }
    }
}
