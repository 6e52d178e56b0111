/*!
Watch lists tying clauses to literals.

# Theory

A core part of a solve is [boolean constraint propagation](crate::procedures::bcp) (BCP): the
observation that some literal in a clause must be true as every other literal in the clause
conflicts with the current valuation.

Two watched literals per clause suffice to notice every such observation: so long as a clause
watches two literals which do not conflict with the valuation, the clause neither asserts a
literal nor conflicts.
Only when a watched literal comes to conflict with the valuation does the clause need attention —
either another watch can be found, or the clause asserts its remaining watched literal, or the
clause is unsatisfiable on the valuation.

# Implementation

A clause watching literal *w* registers itself in the list indexed by *¬w*, so the list to visit
when a literal becomes true is the list indexed by that literal.

Watching clauses are distinguished by length:
- A binary clause records the *other* literal of the clause in its watch, saving a trip to the
  clause database, and binary watches are never moved.
- A long clause records only its key, and its watches move during BCP — see
  [update_watch](crate::db::clause::DbClause::update_watch).

A unit clause never watches any literal.
*/

use crate::{db::ClauseKey, structures::literal::CLiteral};

/// A binary clause together with the *other* literal in the clause.
#[derive(Clone, Copy)]
pub struct BinaryWatch {
    /// The literal the clause asserts if the watched literal conflicts with the valuation.
    pub other: CLiteral,

    /// The key of the watching clause.
    pub key: ClauseKey,
}

/// A long clause watch.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct LongWatch {
    /// The key of the watching clause.
    pub key: ClauseKey,
}

/// The watchers of a single literal.
#[derive(Default)]
pub struct WatchList {
    /// Watches from binary clauses.
    pub binary: Vec<BinaryWatch>,

    /// Watches from long clauses.
    pub long: Vec<LongWatch>,
}

/// A collection of [WatchList]s, indexed by literal.
#[derive(Default)]
pub struct ClauseWatches {
    /// A mapping of literals to watch lists, implicitly given by literal indices.
    lists: Vec<WatchList>,
}

impl ClauseWatches {
    /// Extends the collection to cover every literal over atoms below `atom_count`.
    pub fn grow_to(&mut self, atom_count: usize) {
        let required = 2 * atom_count;
        if self.lists.len() < required {
            self.lists.resize_with(required, WatchList::default);
        }
    }

    /// Notes the clause behind `key` watches `watched`, a literal of a binary clause whose other
    /// literal is `other`.
    pub fn watch_binary(&mut self, watched: CLiteral, other: CLiteral, key: ClauseKey) {
        self.lists[watched.negate().index()]
            .binary
            .push(BinaryWatch { other, key });
    }

    /// Notes the clause behind `key` watches `watched`.
    pub fn watch_long(&mut self, watched: CLiteral, key: ClauseKey) {
        self.lists[watched.negate().index()]
            .long
            .push(LongWatch { key });
    }

    /// The binary watches to visit given `literal` has become true.
    ///
    /// A pointer is returned to simplify [BCP](crate::procedures::bcp): the list is not mutated
    /// while binary propagation works through it, though the valuation and trail are.
    pub fn binary_watches(&self, literal: CLiteral) -> *const Vec<BinaryWatch> {
        &self.lists[literal.index()].binary
    }

    /// The long watches to visit given `literal` has become true.
    ///
    /// A mutable pointer is returned to allow watches of *other* literals to move while the list
    /// is worked through — a replacement watch is never placed on a literal conflicting with the
    /// valuation, and so never lands in the returned list.
    pub fn long_watches(&mut self, literal: CLiteral) -> *mut Vec<LongWatch> {
        &mut self.lists[literal.index()].long
    }
}
