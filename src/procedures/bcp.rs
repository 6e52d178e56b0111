/*!
A context method to aid boolean constraint propagation.

# Overview

Propagates an atom having been assigned some value, given as a literal: clauses watching the atom
with the opposite polarity either update a watch, assert their remaining watched literal, or
conflict with the valuation.

Binary clauses are handled first — their watches never move, and the watch itself carries the
candidate consequence, saving a trip to the clause database.

# Complications

Pointers are taken to the watch lists of interest.
A handful of issues are avoided by doing this:
1. A mutable borrow of the watch lists conflicting with an immutable borrow to obtain the value
   of an atom.
2. A mutable borrow of the watch lists conflicting with a mutable borrow of the context to
   record a consequence on the trail.
3. A mutable borrow of a watch list conflicting with the move of a watch during an update.

(1) and (2) could be avoided by a more nuanced borrow checker, as these are separate structures.
This is not the case for (3), as updating a watched literal mutates watch lists.
Still, the *borrowed* list is never mutated: a replacement watch is placed on a literal which
does not conflict with the valuation, while the list under examination belongs to a literal
which does.
*/

use crate::{
    context::GenericContext,
    db::clause::WatchUpdate,
    misc::log::targets::{self},
    structures::{consequence::AssignmentSource, literal::CLiteral},
    types::err::{self},
};

impl<R: rand::Rng + std::default::Default> GenericContext<R> {
    /// Examines the clauses watching `literal`, which has become true on the current valuation.
    ///
    /// # Safety
    /// The binary list is never mutated during the loop, and a moved long watch never lands in
    /// the list being traversed — see the module documentation.
    pub(crate) fn bcp(&mut self, literal: CLiteral) -> Result<(), err::BCPError> {
        // Binary clause block.
        {
            let binary_list = self.watches.binary_watches(literal);

            for watch in unsafe { &*binary_list } {
                match self.atom_db.value_of_literal(watch.other) {
                    None => {
                        match self.record_assignment(watch.other, AssignmentSource::BCP(watch.key))
                        {
                            crate::db::atom::ValuationStatus::Conflict => {
                                return Err(err::BCPError::Conflict(watch.key));
                            }
                            _ => {}
                        }
                    }

                    Some(false) => {
                        log::trace!(target: targets::PROPAGATION, "Conflict of {} and {literal}.", watch.key);
                        return Err(err::BCPError::Conflict(watch.key));
                    }

                    Some(true) => {}
                }
            }
        }

        // Long clause block.
        {
            let long_list = self.watches.long_watches(literal);

            let mut index = 0;
            let mut length = unsafe { &*long_list }.len();

            'long_loop: while index < length {
                let key = unsafe { &*long_list }[index].key;

                let clause = match self.clause_db.get_mut(&key) {
                    Ok(clause) => clause,
                    Err(_) => return Err(err::BCPError::CorruptWatch),
                };

                match clause.update_watch(literal.negate(), &self.atom_db) {
                    WatchUpdate::Moved(fresh) => {
                        self.watches.watch_long(fresh, key);
                        unsafe { &mut *long_list }.swap_remove(index);
                        length -= 1;
                        continue 'long_loop;
                    }

                    WatchUpdate::Satisfied => {
                        index += 1;
                        continue 'long_loop;
                    }

                    WatchUpdate::Asserts(consequence) => {
                        match self.record_assignment(consequence, AssignmentSource::BCP(key)) {
                            crate::db::atom::ValuationStatus::Conflict => {
                                return Err(err::BCPError::Conflict(key));
                            }
                            _ => {}
                        }
                        index += 1;
                        continue 'long_loop;
                    }

                    WatchUpdate::Conflict => {
                        log::trace!(target: targets::PROPAGATION, "Conflict of {key} and {literal}.");
                        return Err(err::BCPError::Conflict(key));
                    }
                }
            }
        }

        Ok(())
    }
}
