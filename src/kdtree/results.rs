use std::collections::BinaryHeap;

use crate::r#type::Coord;

/// One accepted search candidate: the item's original insertion index and
/// its squared Euclidean distance from the query vector.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Neighbor<N: Coord> {
    /// Original insertion index of the item.
    pub index: u32,
    /// Squared distance between the item and the query vector.
    pub dist: N,
}

impl<N: Coord> Eq for Neighbor<N> {}

impl<N: Coord> Ord for Neighbor<N> {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        // We don't allow NaN. This should only panic on NaN
        self.dist.partial_cmp(&other.dist).unwrap()
    }
}

impl<N: Coord> PartialOrd for Neighbor<N> {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

/// Sink for candidates accepted during a traversal.
///
/// `accept` folds one candidate in and returns the pruning bound the search
/// should continue with.
pub(crate) trait Collect<N: Coord> {
    fn accept(&mut self, neighbor: Neighbor<N>, ball_size: N) -> N;
}

/// Bounded max-heap over candidate distances, for k-nearest collection.
///
/// Below capacity every candidate is kept. At capacity a strictly closer
/// candidate replaces the current worst (pop-max, then push), so the heap
/// always holds the `k` smallest distances seen and its maximum is a live
/// pruning bound.
#[derive(Debug)]
pub(crate) struct NeighborHeap<N: Coord> {
    heap: BinaryHeap<Neighbor<N>>,
    capacity: usize,
}

impl<N: Coord> NeighborHeap<N> {
    pub(crate) fn new(capacity: usize) -> Self {
        debug_assert!(capacity > 0);
        Self {
            heap: BinaryHeap::with_capacity(capacity),
            capacity,
        }
    }

    pub(crate) fn into_vec(self) -> Vec<Neighbor<N>> {
        self.heap.into_vec()
    }
}

impl<N: Coord> Collect<N> for NeighborHeap<N> {
    fn accept(&mut self, neighbor: Neighbor<N>, ball_size: N) -> N {
        if self.heap.len() < self.capacity {
            self.heap.push(neighbor);
        } else if self.heap.peek().is_some_and(|worst| neighbor.dist < worst.dist) {
            self.heap.pop();
            self.heap.push(neighbor);
        }

        if self.heap.len() == self.capacity {
            self.heap.peek().map_or(ball_size, |worst| worst.dist)
        } else {
            ball_size
        }
    }
}

/// Fixed-radius collection: an unbounded list, the ball never shrinks.
impl<N: Coord> Collect<N> for Vec<Neighbor<N>> {
    fn accept(&mut self, neighbor: Neighbor<N>, ball_size: N) -> N {
        self.push(neighbor);
        ball_size
    }
}
