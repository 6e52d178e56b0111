/*!
The clause database.

Non-unit clauses are stored here, distinguished by whether the clause was part of the original
formula or an addition — learned clauses, completion clauses, loop formulas, blocking clauses, and
clauses supplied by lazy grounding all land in the addition store.

Unit clauses are not stored: the literal is recorded on the trail at the root level, and a
[ClauseKey::Unit] key carries the literal wherever a key is required.

# Watched literals

A stored clause keeps its two watched literals at indices 0 and 1.
On storage the watches are placed on the two strongest literals — unvalued literals ahead of
falsified ones, and falsified literals in descending order of level — so that a clause stored
during search watches its asserting literal and a literal of the conflicting level.
*/

use crate::{
    db::{ClauseKey, FormulaIndex, atom::AtomDB, watches::ClauseWatches},
    misc::log::targets::{self},
    structures::{
        clause::{CClause, ClauseSource},
        literal::CLiteral,
    },
    types::err::{self},
};

/// A stored clause.
pub struct DbClause {
    /// The key under which the clause is stored.
    key: ClauseKey,

    /// The literals of the clause, with watched literals at indices 0 and 1.
    literals: CClause,

    /// The origin of the clause.
    source: ClauseSource,
}

/// The result of revising the watches of a clause after a watched literal was falsified.
pub enum WatchUpdate {
    /// The watch moved to the returned (non-conflicting) literal.
    Moved(CLiteral),

    /// The other watched literal witnesses the clause is satisfied.
    Satisfied,

    /// Every unwatched literal conflicts with the valuation — the clause asserts the returned
    /// literal.
    Asserts(CLiteral),

    /// Every literal conflicts with the valuation.
    Conflict,
}

impl DbClause {
    /// The literals of the clause.
    pub fn literals(&self) -> &[CLiteral] {
        &self.literals
    }

    /// The key under which the clause is stored.
    pub fn key(&self) -> ClauseKey {
        self.key
    }

    /// The origin of the clause.
    pub fn source(&self) -> ClauseSource {
        self.source
    }

    /// The length of the clause.
    pub fn size(&self) -> usize {
        self.literals.len()
    }

    /// Revises the watches of the clause given `falsified`, a watched literal, now conflicts
    /// with the valuation.
    ///
    /// # Soundness
    /// Requires `falsified` is one of the first two literals of the clause.
    pub fn update_watch(&mut self, falsified: CLiteral, atom_db: &AtomDB) -> WatchUpdate {
        let watch_slot = match self.literals[0] == falsified {
            true => 0,
            false => 1,
        };

        for index in 2..self.literals.len() {
            let candidate = self.literals[index];
            if !atom_db.is_false(candidate) {
                self.literals.swap(watch_slot, index);
                return WatchUpdate::Moved(candidate);
            }
        }

        let other = self.literals[1 - watch_slot];
        match atom_db.value_of_literal(other) {
            Some(true) => WatchUpdate::Satisfied,
            None => WatchUpdate::Asserts(other),
            Some(false) => WatchUpdate::Conflict,
        }
    }
}

/// The clause stores of a context.
#[derive(Default)]
pub struct ClauseDB {
    /// Clauses of the original formula.
    originals: Vec<DbClause>,

    /// Clauses added after parsing, by learning or theory synthesis.
    additions: Vec<DbClause>,
}

impl ClauseDB {
    /// Stores a clause, placing and registering watches.
    ///
    /// Unit clauses are not stored — the unit key is returned and recording the assignment is
    /// left to the caller.
    ///
    /// # Soundness
    /// Requires a non-empty clause with distinct atoms.
    pub fn store(
        &mut self,
        clause: CClause,
        source: ClauseSource,
        atom_db: &AtomDB,
        watches: &mut ClauseWatches,
    ) -> Result<ClauseKey, err::ErrorKind> {
        match clause.len() {
            0 => Err(err::ErrorKind::Build(err::BuildError::Unsatisfiable)),

            1 => Ok(ClauseKey::Unit(clause[0])),

            2 => {
                let key = match source {
                    ClauseSource::Original => {
                        ClauseKey::Original(self.originals.len() as FormulaIndex)
                    }
                    _ => ClauseKey::Addition(self.additions.len() as FormulaIndex),
                };

                watches.watch_binary(clause[0], clause[1], key);
                watches.watch_binary(clause[1], clause[0], key);

                let stored = DbClause {
                    key,
                    literals: clause,
                    source,
                };
                log::trace!(target: targets::CLAUSE_DB, "Stored binary {key}.");

                match key {
                    ClauseKey::Original(_) => self.originals.push(stored),
                    _ => self.additions.push(stored),
                }
                Ok(key)
            }

            _ => {
                let mut clause = clause;
                Self::place_watch_candidates(&mut clause, atom_db);

                let key = match source {
                    ClauseSource::Original => {
                        ClauseKey::Original(self.originals.len() as FormulaIndex)
                    }
                    _ => ClauseKey::Addition(self.additions.len() as FormulaIndex),
                };

                watches.watch_long(clause[0], key);
                watches.watch_long(clause[1], key);

                let stored = DbClause {
                    key,
                    literals: clause,
                    source,
                };
                log::trace!(target: targets::CLAUSE_DB, "Stored {key}.");

                match key {
                    ClauseKey::Original(_) => self.originals.push(stored),
                    _ => self.additions.push(stored),
                }
                Ok(key)
            }
        }
    }

    /// Moves the two strongest watch candidates to the first two indices of the clause.
    ///
    /// An unvalued or satisfied literal is preferred to a falsified literal, and falsified
    /// literals are ranked by descending level.
    fn place_watch_candidates(clause: &mut CClause, atom_db: &AtomDB) {
        let rank = |literal: CLiteral| -> u64 {
            match atom_db.value_of_literal(literal) {
                None | Some(true) => u64::MAX,
                Some(false) => match atom_db.level_of(literal.atom()) {
                    Some(level) => level as u64,
                    None => 0,
                },
            }
        };

        for slot in 0..2 {
            let mut best = slot;
            for index in slot + 1..clause.len() {
                if rank(clause[index]) > rank(clause[best]) {
                    best = index;
                }
            }
            clause.swap(slot, best);
        }
    }

    /// The clause stored under `key`, if any.
    pub fn get(&self, key: &ClauseKey) -> Result<&DbClause, err::ErrorKind> {
        let found = match key {
            ClauseKey::Unit(_) => None,
            ClauseKey::Original(index) => self.originals.get(*index as usize),
            ClauseKey::Addition(index) => self.additions.get(*index as usize),
        };
        found.ok_or_else(|| super::missing_clause_error(key))
    }

    /// The clause stored under `key`, mutably, if any.
    pub fn get_mut(&mut self, key: &ClauseKey) -> Result<&mut DbClause, err::ErrorKind> {
        let found = match key {
            ClauseKey::Unit(_) => None,
            ClauseKey::Original(index) => self.originals.get_mut(*index as usize),
            ClauseKey::Addition(index) => self.additions.get_mut(*index as usize),
        };
        found.ok_or_else(|| super::missing_clause_error(key))
    }

    /// A count of addition clauses.
    pub fn addition_count(&self) -> usize {
        self.additions.len()
    }

    /// An iterator over every stored (non-unit) clause.
    pub fn all_nonunit_clauses(&self) -> impl Iterator<Item = &DbClause> + '_ {
        self.originals.iter().chain(self.additions.iter())
    }
}
