use std::collections::HashMap;
use std::hash::Hash;

use crate::model::{JunctionId, RouteMetric, RouteResult};

/// Composite key for memoized route queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RouteKey {
    pub source: JunctionId,
    pub destination: JunctionId,
    pub metric: RouteMetric,
}

/// Bounded route memo used by the orchestrator.
pub type RouteCache = LruCache<RouteKey, RouteResult>;

/// Bounded cache with least-recently-used eviction.
///
/// Recency order lives in a doubly linked list threaded through an index
/// arena (freed slots are reused), paired with a key-to-slot map so get, put,
/// and eviction are all O(1). Hit and miss counters feed the hit-rate stat.
#[derive(Debug, Clone)]
pub struct LruCache<K, V> {
    capacity: usize,
    slots: Vec<Slot<K, V>>,
    free: Vec<usize>,
    map: HashMap<K, usize>,
    /// Most recently used.
    head: Option<usize>,
    /// Least recently used.
    tail: Option<usize>,
    hits: u64,
    misses: u64,
}

#[derive(Debug, Clone)]
struct Slot<K, V> {
    key: K,
    value: V,
    prev: Option<usize>,
    next: Option<usize>,
}

impl<K, V> LruCache<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    /// Create a cache holding at most `capacity` entries. Capacity must be at
    /// least 1.
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "LRU cache capacity must be at least 1");
        Self {
            capacity,
            slots: Vec::with_capacity(capacity),
            free: Vec::new(),
            map: HashMap::with_capacity(capacity),
            head: None,
            tail: None,
            hits: 0,
            misses: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn hits(&self) -> u64 {
        self.hits
    }

    pub fn misses(&self) -> u64 {
        self.misses
    }

    /// Hit rate as a percentage; 0 before any access.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64 * 100.0
        }
    }

    /// Fetch a value, promoting the entry to most recently used on a hit.
    pub fn get(&mut self, key: &K) -> Option<V> {
        match self.map.get(key).copied() {
            Some(slot) => {
                self.hits += 1;
                self.promote(slot);
                Some(self.slots[slot].value.clone())
            }
            None => {
                self.misses += 1;
                None
            }
        }
    }

    /// Insert or update a value, promoting it to most recently used. At
    /// capacity, the least-recently-used entry is evicted first.
    pub fn put(&mut self, key: K, value: V) {
        if let Some(slot) = self.map.get(&key).copied() {
            self.slots[slot].value = value;
            self.promote(slot);
            return;
        }
        if self.map.len() == self.capacity {
            self.evict_lru();
        }
        let slot = match self.free.pop() {
            Some(reused) => {
                self.slots[reused] = Slot {
                    key: key.clone(),
                    value,
                    prev: None,
                    next: None,
                };
                reused
            }
            None => {
                self.slots.push(Slot {
                    key: key.clone(),
                    value,
                    prev: None,
                    next: None,
                });
                self.slots.len() - 1
            }
        };
        self.map.insert(key, slot);
        self.attach_front(slot);
    }

    /// Drop every entry and reset the hit/miss counters.
    pub fn clear(&mut self) {
        self.slots.clear();
        self.free.clear();
        self.map.clear();
        self.head = None;
        self.tail = None;
        self.hits = 0;
        self.misses = 0;
    }

    fn promote(&mut self, slot: usize) {
        if self.head == Some(slot) {
            return;
        }
        self.detach(slot);
        self.attach_front(slot);
    }

    fn evict_lru(&mut self) {
        if let Some(slot) = self.tail {
            self.detach(slot);
            self.map.remove(&self.slots[slot].key);
            self.free.push(slot);
        }
    }

    fn detach(&mut self, slot: usize) {
        let (prev, next) = (self.slots[slot].prev, self.slots[slot].next);
        match prev {
            Some(p) => self.slots[p].next = next,
            None => self.head = next,
        }
        match next {
            Some(n) => self.slots[n].prev = prev,
            None => self.tail = prev,
        }
        self.slots[slot].prev = None;
        self.slots[slot].next = None;
    }

    fn attach_front(&mut self, slot: usize) {
        self.slots[slot].prev = None;
        self.slots[slot].next = self.head;
        if let Some(old_head) = self.head {
            self.slots[old_head].prev = Some(slot);
        }
        self.head = Some(slot);
        if self.tail.is_none() {
            self.tail = Some(slot);
        }
    }
}
