/*!
The trail of assignments.

All assignments made, in order, with each assignment distinguished by the level at which it was
made.

Level zero contains proven literals, and each level greater than zero begins with a decision.
The trail defines a total order on assignments: the *position* of an assignment is its index in
the log, and positions are used as the monotonic time by which the aggregate propagator orders the
culprits of an explanation.

The queue head marks the first assignment whose boolean consequences have not been examined —
clause propagation consumes the trail from the queue head, while each theory propagator keeps its
own cursor into the same log.
*/

use crate::structures::literal::CLiteral;

use super::LevelIndex;

/// A structure to hold the trail.
#[derive(Default)]
pub struct Trail {
    /// Each assignment made, recorded as a literal, in order from first to last.
    pub assignments: Vec<CLiteral>,

    /// Indices to the initial assignment of each level.
    pub level_indices: Vec<usize>,

    /// The index of the first assignment whose consequences have not been examined.
    pub q_head: usize,
}

impl Trail {
    /// Writes an assignment to the top level.
    pub fn write_literal(&mut self, literal: CLiteral) {
        self.assignments.push(literal);
    }

    /// The position the next assignment will receive.
    pub fn next_position(&self) -> usize {
        self.assignments.len()
    }

    /// The current level.
    pub fn level(&self) -> LevelIndex {
        self.level_indices.len() as LevelIndex
    }

    /// Opens a fresh level, whose first assignment is to be a decision.
    pub fn push_fresh_level(&mut self) {
        self.level_indices.push(self.assignments.len());
    }

    /// True if some decision is active.
    pub fn decision_is_made(&self) -> bool {
        !self.level_indices.is_empty()
    }

    /// The assignments made at the (current) top level, in order of assignment.
    pub fn top_level_assignments(&self) -> &[CLiteral] {
        if let Some(&level_start) = self.level_indices.last() {
            &self.assignments[level_start..]
        } else {
            &[]
        }
    }

    /// The first assignment of each level — the decisions, in order.
    pub fn decisions(&self) -> impl Iterator<Item = CLiteral> + '_ {
        self.level_indices
            .iter()
            .map(|&start| self.assignments[start])
    }

    /// Removes levels above the given level index, if they exist, returning the removed
    /// assignments.
    ///
    /// # Soundness
    /// Does not clear the *valuation* of the removed assignments.
    pub fn clear_assignments_above(&mut self, level: LevelIndex) -> Vec<CLiteral> {
        // level_indices stores with zero-indexing, so all assignments made after level `level`
        // are cleared by splitting at the initial assignment of level `level + 1`.
        if let Some(&level_start) = self.level_indices.get(level as usize) {
            self.level_indices.truncate(level as usize);
            self.assignments.split_off(level_start)
        } else {
            Vec::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::structures::literal::CLiteral;

    #[test]
    fn levels() {
        let mut trail = Trail::default();
        trail.write_literal(CLiteral::new(0, true));
        assert_eq!(trail.level(), 0);

        trail.push_fresh_level();
        trail.write_literal(CLiteral::new(1, true));
        trail.write_literal(CLiteral::new(2, false));
        assert_eq!(trail.level(), 1);
        assert_eq!(trail.top_level_assignments().len(), 2);

        let removed = trail.clear_assignments_above(0);
        assert_eq!(removed.len(), 2);
        assert_eq!(trail.level(), 0);
        assert_eq!(trail.assignments.len(), 1);
    }
}
