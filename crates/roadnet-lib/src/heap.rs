use std::collections::HashMap;
use std::hash::Hash;

/// Binary min-heap with decrease-key, used as the frontier for shortest-path
/// search.
///
/// An auxiliary item-to-slot map is kept in lockstep with every swap so
/// membership tests and `decrease_key` stay O(1)/O(log n). Priorities are
/// `f64` and ordered with `total_cmp`.
#[derive(Debug, Clone, Default)]
pub struct PriorityFrontier<T> {
    entries: Vec<(T, f64)>,
    positions: HashMap<T, usize>,
}

impl<T> PriorityFrontier<T>
where
    T: Eq + Hash + Clone,
{
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            positions: HashMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, item: &T) -> bool {
        self.positions.contains_key(item)
    }

    /// Insert an item, or lower its priority if it is already queued. An
    /// insert with a priority no lower than the current one is ignored.
    pub fn insert(&mut self, item: T, priority: f64) {
        if let Some(&slot) = self.positions.get(&item) {
            if priority < self.entries[slot].1 {
                self.entries[slot].1 = priority;
                self.sift_up(slot);
            }
            return;
        }
        let slot = self.entries.len();
        self.positions.insert(item.clone(), slot);
        self.entries.push((item, priority));
        self.sift_up(slot);
    }

    /// Lower an item's priority. No-op if the item is absent or the new
    /// priority is not strictly lower.
    pub fn decrease_key(&mut self, item: &T, priority: f64) {
        if let Some(&slot) = self.positions.get(item) {
            if priority < self.entries[slot].1 {
                self.entries[slot].1 = priority;
                self.sift_up(slot);
            }
        }
    }

    pub fn peek(&self) -> Option<(&T, f64)> {
        self.entries.first().map(|(item, priority)| (item, *priority))
    }

    /// Remove and return the lowest-priority item. Callers guard emptiness
    /// with `while let`/`if let`.
    pub fn pop(&mut self) -> Option<(T, f64)> {
        if self.entries.is_empty() {
            return None;
        }
        let last = self.entries.len() - 1;
        self.entries.swap(0, last);
        let (item, priority) = self.entries.remove(last);
        self.positions.remove(&item);
        if !self.entries.is_empty() {
            self.positions.insert(self.entries[0].0.clone(), 0);
            self.sift_down(0);
        }
        Some((item, priority))
    }

    /// Remove an arbitrary item, wherever it sits in the heap.
    pub fn remove(&mut self, item: &T) -> bool {
        let Some(slot) = self.positions.remove(item) else {
            return false;
        };
        let last = self.entries.len() - 1;
        if slot == last {
            self.entries.remove(last);
            return true;
        }
        self.entries.swap(slot, last);
        self.entries.remove(last);
        self.positions.insert(self.entries[slot].0.clone(), slot);
        // The swapped-in entry may violate either direction.
        self.sift_up(slot);
        self.sift_down(slot);
        true
    }

    fn swap_slots(&mut self, a: usize, b: usize) {
        self.entries.swap(a, b);
        self.positions.insert(self.entries[a].0.clone(), a);
        self.positions.insert(self.entries[b].0.clone(), b);
    }

    fn sift_up(&mut self, mut slot: usize) {
        while slot > 0 {
            let parent = (slot - 1) / 2;
            if self.entries[slot].1.total_cmp(&self.entries[parent].1).is_lt() {
                self.swap_slots(slot, parent);
                slot = parent;
            } else {
                break;
            }
        }
    }

    fn sift_down(&mut self, mut slot: usize) {
        loop {
            let mut smallest = slot;
            for child in [2 * slot + 1, 2 * slot + 2] {
                if child < self.entries.len()
                    && self.entries[child]
                        .1
                        .total_cmp(&self.entries[smallest].1)
                        .is_lt()
                {
                    smallest = child;
                }
            }
            if smallest == slot {
                break;
            }
            self.swap_slots(slot, smallest);
            slot = smallest;
        }
    }
}
