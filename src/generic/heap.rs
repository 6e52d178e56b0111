/*!
A max-heap over a fixed range of indices, with scores kept for indices off the heap.

The backing score vector stays constant in length while indices move on and off the heap, so the
structure also acts as a store of scores for elements which may later be (re)activated.

Used to choose an unvalued atom with the greatest activity when a decision is required.

```rust
# use stoat_sat::generic::heap::IndexHeap;
let mut heap = IndexHeap::default();
heap.grow_to(3);

heap.set_score(0, 1.0);
heap.set_score(2, 3.0);

heap.activate(0);
heap.activate(1);
heap.activate(2);

assert_eq!(heap.pop_max(), Some(2));
assert_eq!(heap.pop_max(), Some(0));
assert_eq!(heap.pop_max(), Some(1));
assert_eq!(heap.pop_max(), None);
```
*/

/// A max-heap of indices, ordered by f64 scores.
#[derive(Default)]
pub struct IndexHeap {
    /// The score of each index, on the heap or not.
    scores: Vec<f64>,

    /// Indices currently on the heap, in heap order.
    heap: Vec<usize>,

    /// The position of each index within `heap`, if present.
    positions: Vec<Option<usize>>,
}

impl IndexHeap {
    /// Extends the range of usable indices to include `limit - 1`.
    pub fn grow_to(&mut self, limit: usize) {
        if self.scores.len() < limit {
            self.scores.resize(limit, 0.0);
            self.positions.resize(limit, None);
        }
    }

    /// The score of `index`.
    pub fn score_of(&self, index: usize) -> f64 {
        self.scores[index]
    }

    /// Revises the score of `index`, restoring heap order if the index is on the heap.
    pub fn set_score(&mut self, index: usize, score: f64) {
        let increased = score >= self.scores[index];
        self.scores[index] = score;
        if let Some(position) = self.positions[index] {
            match increased {
                true => self.sift_up(position),
                false => self.sift_down(position),
            }
        }
    }

    /// Multiplies every score by `factor`.
    ///
    /// The heap order is preserved, as scores are non-negative and scaling is uniform.
    pub fn scale_scores(&mut self, factor: f64) {
        for score in &mut self.scores {
            *score *= factor;
        }
    }

    /// Places `index` on the heap, if it is not already present.
    pub fn activate(&mut self, index: usize) {
        if self.positions[index].is_none() {
            let position = self.heap.len();
            self.heap.push(index);
            self.positions[index] = Some(position);
            self.sift_up(position);
        }
    }

    /// Removes and returns the index with the greatest score, if the heap is non-empty.
    pub fn pop_max(&mut self) -> Option<usize> {
        let max = *self.heap.first()?;
        let last = self.heap.len() - 1;
        self.heap.swap(0, last);
        self.positions[self.heap[0]] = Some(0);
        self.heap.pop();
        self.positions[max] = None;
        if !self.heap.is_empty() {
            self.sift_down(0);
        }
        Some(max)
    }

    /// True if `index` is on the heap.
    pub fn active(&self, index: usize) -> bool {
        self.positions[index].is_some()
    }

    fn sift_up(&mut self, mut position: usize) {
        while position > 0 {
            let parent = (position - 1) / 2;
            if self.scores[self.heap[position]] <= self.scores[self.heap[parent]] {
                break;
            }
            self.swap_positions(position, parent);
            position = parent;
        }
    }

    fn sift_down(&mut self, mut position: usize) {
        loop {
            let left = 2 * position + 1;
            if left >= self.heap.len() {
                break;
            }
            let right = left + 1;
            let mut largest = position;
            if self.scores[self.heap[left]] > self.scores[self.heap[largest]] {
                largest = left;
            }
            if right < self.heap.len() && self.scores[self.heap[right]] > self.scores[self.heap[largest]] {
                largest = right;
            }
            if largest == position {
                break;
            }
            self.swap_positions(position, largest);
            position = largest;
        }
    }

    fn swap_positions(&mut self, a: usize, b: usize) {
        self.heap.swap(a, b);
        self.positions[self.heap[a]] = Some(a);
        self.positions[self.heap[b]] = Some(b);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pop_order() {
        let mut heap = IndexHeap::default();
        heap.grow_to(5);
        for (index, score) in [(0, 1.0), (1, 5.0), (2, 3.0), (3, 0.5), (4, 4.0)] {
            heap.set_score(index, score);
            heap.activate(index);
        }

        assert_eq!(heap.pop_max(), Some(1));
        assert_eq!(heap.pop_max(), Some(4));
        assert_eq!(heap.pop_max(), Some(2));
        assert_eq!(heap.pop_max(), Some(0));
        assert_eq!(heap.pop_max(), Some(3));
        assert_eq!(heap.pop_max(), None);
    }

    #[test]
    fn reactivation() {
        let mut heap = IndexHeap::default();
        heap.grow_to(3);
        heap.set_score(1, 2.0);
        heap.activate(1);
        assert_eq!(heap.pop_max(), Some(1));

        heap.set_score(1, 0.1);
        heap.set_score(0, 1.0);
        heap.activate(0);
        heap.activate(1);
        assert_eq!(heap.pop_max(), Some(0));
        assert_eq!(heap.pop_max(), Some(1));
    }

    #[test]
    fn score_revision_reorders() {
        let mut heap = IndexHeap::default();
        heap.grow_to(2);
        heap.set_score(0, 1.0);
        heap.set_score(1, 2.0);
        heap.activate(0);
        heap.activate(1);

        heap.set_score(0, 3.0);
        assert_eq!(heap.pop_max(), Some(0));
    }
}
