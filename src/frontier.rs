//! The minimum-priority frontier that drives the search order.

use grid_util::point::Point;
use num_traits::Zero;
use std::cmp::Ordering;
use std::collections::BinaryHeap;

/// One pending `(point, priority)` pair. A point may appear in the frontier
/// more than once; stale entries are filtered by the visited guard at
/// expansion time, so entries are never deduplicated here.
#[derive(Clone, Copy, Debug)]
pub struct FrontierEntry<C> {
    pub point: Point,
    pub priority: C,
    seq: u64,
}

impl<C: PartialEq> Eq for FrontierEntry<C> {}

impl<C: PartialEq> PartialEq for FrontierEntry<C> {
    fn eq(&self, other: &Self) -> bool {
        self.priority.eq(&other.priority) && self.seq == other.seq
    }
}

impl<C: Ord> PartialOrd for FrontierEntry<C> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<C: Ord> Ord for FrontierEntry<C> {
    fn cmp(&self, other: &Self) -> Ordering {
        // Orders per priority, reversed so the max-heap yields the minimum.
        // Equal priorities fall back to insertion order, oldest first.
        match other.priority.cmp(&self.priority) {
            Ordering::Equal => other.seq.cmp(&self.seq),
            s => s,
        }
    }
}

/// A min-priority queue of [FrontierEntry] values. Ties are broken FIFO by an
/// insertion sequence number, which keeps expansion order deterministic.
#[derive(Clone, Debug)]
pub struct Frontier<C> {
    heap: BinaryHeap<FrontierEntry<C>>,
    seq: u64,
}

impl<C: Zero + Ord + Copy> Frontier<C> {
    pub fn new() -> Frontier<C> {
        Frontier {
            heap: BinaryHeap::new(),
            seq: 0,
        }
    }

    /// Enqueues the origin of a run at zero priority.
    pub fn seed(&mut self, point: Point) {
        self.insert(point, C::zero());
    }

    pub fn insert(&mut self, point: Point, priority: C) {
        let seq = self.seq;
        self.seq += 1;
        self.heap.push(FrontierEntry {
            point,
            priority,
            seq,
        });
    }

    /// Removes and returns the lowest-priority entry.
    pub fn extract_min(&mut self) -> Option<(Point, C)> {
        self.heap.pop().map(|entry| (entry.point, entry.priority))
    }

    pub fn clear(&mut self) {
        self.heap.clear();
        self.seq = 0;
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    /// Non-destructive view of the pending entries, in no particular order.
    /// Renderers use this to highlight frontier cells.
    pub fn entries(&self) -> impl Iterator<Item = (Point, C)> + '_ {
        self.heap.iter().map(|entry| (entry.point, entry.priority))
    }
}

impl<C: Zero + Ord + Copy> Default for Frontier<C> {
    fn default() -> Frontier<C> {
        Frontier::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_in_priority_order() {
        let mut frontier: Frontier<i32> = Frontier::new();
        frontier.insert(Point::new(0, 0), 3);
        frontier.insert(Point::new(1, 0), 1);
        frontier.insert(Point::new(2, 0), 2);
        assert_eq!(frontier.extract_min(), Some((Point::new(1, 0), 1)));
        assert_eq!(frontier.extract_min(), Some((Point::new(2, 0), 2)));
        assert_eq!(frontier.extract_min(), Some((Point::new(0, 0), 3)));
        assert_eq!(frontier.extract_min(), None);
    }

    /// Equal priorities must come out in insertion order.
    #[test]
    fn breaks_ties_fifo() {
        let mut frontier: Frontier<i32> = Frontier::new();
        frontier.insert(Point::new(0, 0), 5);
        frontier.insert(Point::new(1, 1), 5);
        frontier.insert(Point::new(2, 2), 5);
        assert_eq!(frontier.extract_min(), Some((Point::new(0, 0), 5)));
        assert_eq!(frontier.extract_min(), Some((Point::new(1, 1), 5)));
        assert_eq!(frontier.extract_min(), Some((Point::new(2, 2), 5)));
    }

    /// The same point may be queued several times as independent entries.
    #[test]
    fn keeps_duplicate_points() {
        let mut frontier: Frontier<i32> = Frontier::new();
        let p = Point::new(4, 2);
        frontier.insert(p, 7);
        frontier.insert(p, 1);
        frontier.insert(p, 7);
        assert_eq!(frontier.len(), 3);
        assert_eq!(frontier.extract_min(), Some((p, 1)));
        assert_eq!(frontier.extract_min(), Some((p, 7)));
        assert_eq!(frontier.extract_min(), Some((p, 7)));
    }

    #[test]
    fn seed_is_zero_priority() {
        let mut frontier: Frontier<i32> = Frontier::new();
        frontier.insert(Point::new(1, 0), 1);
        frontier.seed(Point::new(0, 0));
        assert_eq!(frontier.extract_min(), Some((Point::new(0, 0), 0)));
    }

    #[test]
    fn enumeration_does_not_consume() {
        let mut frontier: Frontier<i32> = Frontier::new();
        frontier.insert(Point::new(0, 0), 2);
        frontier.insert(Point::new(1, 0), 1);
        let mut seen: Vec<(Point, i32)> = frontier.entries().collect();
        seen.sort_by_key(|(_, priority)| *priority);
        assert_eq!(seen, vec![(Point::new(1, 0), 1), (Point::new(0, 0), 2)]);
        assert_eq!(frontier.len(), 2);
        assert_eq!(frontier.extract_min(), Some((Point::new(1, 0), 1)));
    }

    #[test]
    fn clear_empties() {
        let mut frontier: Frontier<i32> = Frontier::new();
        frontier.insert(Point::new(0, 0), 1);
        frontier.insert(Point::new(1, 0), 2);
        frontier.clear();
        assert!(frontier.is_empty());
        assert_eq!(frontier.extract_min(), None);
    }
}
