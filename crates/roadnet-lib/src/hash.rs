/// Buckets allocated for an empty index.
const INITIAL_BUCKETS: usize = 16;

/// Load factor above which the bucket array doubles.
const MAX_LOAD_FACTOR: f64 = 0.75;

/// Deterministic bucket hash for index keys.
///
/// The bucket assignment for a key must be a pure function of the key and the
/// bucket count, so rehashing to a doubled table re-derives every slot from
/// the same hash value.
pub trait IndexKey {
    fn index_hash(&self) -> u64;
}

impl IndexKey for i64 {
    fn index_hash(&self) -> u64 {
        *self as u64
    }
}

impl IndexKey for String {
    fn index_hash(&self) -> u64 {
        self.as_str().index_hash()
    }
}

impl IndexKey for &str {
    fn index_hash(&self) -> u64 {
        // djb2 polynomial hash.
        self.bytes()
            .fold(5381u64, |hash, byte| hash.wrapping_mul(33).wrapping_add(byte as u64))
    }
}

/// Chained hash table with amortized O(1) insert, lookup, and removal.
///
/// Primary store for junctions and roads keyed by id. Crossing the load
/// factor doubles the bucket count and rehashes every element in one
/// stop-the-world pass.
#[derive(Debug, Clone)]
pub struct HashIndex<K, V> {
    buckets: Vec<Vec<(K, V)>>,
    len: usize,
    rehashes: usize,
}

/// Health counters for a [`HashIndex`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HashIndexMetrics {
    pub elements: usize,
    pub buckets: usize,
    pub load_factor: f64,
    pub longest_chain: usize,
    pub avg_chain_length: f64,
    /// Entries sharing a bucket with at least one other entry, summed per
    /// bucket as chain length beyond 1.
    pub collisions: usize,
    pub rehashes: usize,
}

impl<K, V> Default for HashIndex<K, V>
where
    K: IndexKey + Eq + Clone,
    V: Clone,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> HashIndex<K, V>
where
    K: IndexKey + Eq + Clone,
    V: Clone,
{
    pub fn new() -> Self {
        Self {
            buckets: vec![Vec::new(); INITIAL_BUCKETS],
            len: 0,
            rehashes: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    fn bucket_of(&self, key: &K) -> usize {
        (key.index_hash() % self.buckets.len() as u64) as usize
    }

    /// Insert a key, overwriting the value if the key already exists.
    pub fn insert(&mut self, key: K, value: V) {
        if let Some(existing) = self.get_mut(&key) {
            *existing = value;
            return;
        }
        if (self.len + 1) as f64 / self.buckets.len() as f64 > MAX_LOAD_FACTOR {
            self.rehash();
        }
        let bucket = self.bucket_of(&key);
        self.buckets[bucket].push((key, value));
        self.len += 1;
    }

    pub fn get(&self, key: &K) -> Option<&V> {
        let bucket = self.bucket_of(key);
        self.buckets[bucket]
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v)
    }

    /// Stable in-place handle to a stored value, so callers can mutate
    /// without a fetch-modify-reinsert round trip.
    pub fn get_mut(&mut self, key: &K) -> Option<&mut V> {
        let bucket = self.bucket_of(key);
        self.buckets[bucket]
            .iter_mut()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v)
    }

    pub fn contains(&self, key: &K) -> bool {
        self.get(key).is_some()
    }

    pub fn remove(&mut self, key: &K) -> Option<V> {
        let bucket = self.bucket_of(key);
        let chain = &mut self.buckets[bucket];
        let pos = chain.iter().position(|(k, _)| k == key)?;
        let (_, value) = chain.swap_remove(pos);
        self.len -= 1;
        Some(value)
    }

    pub fn clear(&mut self) {
        for bucket in &mut self.buckets {
            bucket.clear();
        }
        self.len = 0;
    }

    /// Visit every entry. Iteration order is unspecified.
    pub fn for_each<F>(&self, mut f: F)
    where
        F: FnMut(&K, &V),
    {
        for bucket in &self.buckets {
            for (key, value) in bucket {
                f(key, value);
            }
        }
    }

    /// Export all entries for an external persistence layer. Order is
    /// unspecified.
    pub fn entries(&self) -> Vec<(K, V)> {
        let mut out = Vec::with_capacity(self.len);
        self.for_each(|k, v| out.push((k.clone(), v.clone())));
        out
    }

    /// Rebuild an index from exported entries.
    pub fn from_entries<I>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
    {
        let mut index = Self::new();
        for (key, value) in entries {
            index.insert(key, value);
        }
        index
    }

    pub fn metrics(&self) -> HashIndexMetrics {
        let longest_chain = self.buckets.iter().map(Vec::len).max().unwrap_or(0);
        let collisions = self
            .buckets
            .iter()
            .map(|b| b.len().saturating_sub(1))
            .sum();
        HashIndexMetrics {
            elements: self.len,
            buckets: self.buckets.len(),
            load_factor: self.len as f64 / self.buckets.len() as f64,
            longest_chain,
            avg_chain_length: self.len as f64 / self.buckets.len() as f64,
            collisions,
            rehashes: self.rehashes,
        }
    }

    fn rehash(&mut self) {
        let new_size = self.buckets.len() * 2;
        let old_buckets = std::mem::replace(&mut self.buckets, vec![Vec::new(); new_size]);
        for (key, value) in old_buckets.into_iter().flatten() {
            let bucket = (key.index_hash() % new_size as u64) as usize;
            self.buckets[bucket].push((key, value));
        }
        self.rehashes += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_get_remove() {
        let mut index: HashIndex<i64, &str> = HashIndex::new();
        index.insert(1, "one");
        index.insert(2, "two");
        assert_eq!(index.get(&1), Some(&"one"));
        assert_eq!(index.len(), 2);
        assert_eq!(index.remove(&1), Some("one"));
        assert_eq!(index.get(&1), None);
        assert_eq!(index.remove(&1), None);
        assert_eq!(index.len(), 1);
    }

    #[test]
    fn overwrite_keeps_single_entry() {
        let mut index: HashIndex<String, i64> = HashIndex::new();
        index.insert("junction".to_string(), 1);
        index.insert("junction".to_string(), 2);
        assert_eq!(index.len(), 1);
        assert_eq!(index.get(&"junction".to_string()), Some(&2));
    }

    #[test]
    fn everything_survives_rehash() {
        let mut index: HashIndex<i64, i64> = HashIndex::new();
        // 500 inserts from 16 initial buckets forces several doublings.
        for i in 0..500 {
            index.insert(i, i * 3);
        }
        let metrics = index.metrics();
        assert!(metrics.rehashes >= 1);
        assert!(metrics.buckets > INITIAL_BUCKETS);
        assert!(metrics.load_factor <= MAX_LOAD_FACTOR);
        for i in 0..500 {
            assert_eq!(index.get(&i), Some(&(i * 3)), "lost key {i}");
        }
    }

    #[test]
    fn latest_value_wins_across_rehashes() {
        let mut index: HashIndex<i64, i64> = HashIndex::new();
        for round in 0..3 {
            for i in 0..100 {
                index.insert(i, i + round * 1000);
            }
        }
        assert_eq!(index.len(), 100);
        for i in 0..100 {
            assert_eq!(index.get(&i), Some(&(i + 2000)));
        }
    }

    #[test]
    fn string_hash_is_deterministic() {
        assert_eq!("Main St".index_hash(), "Main St".index_hash());
        assert_ne!("Main St".index_hash(), "Main Rd".index_hash());
        assert_eq!("Main St".to_string().index_hash(), "Main St".index_hash());
    }

    #[test]
    fn get_mut_updates_in_place() {
        let mut index: HashIndex<i64, Vec<i64>> = HashIndex::new();
        index.insert(7, vec![1]);
        if let Some(list) = index.get_mut(&7) {
            list.push(2);
        }
        assert_eq!(index.get(&7), Some(&vec![1, 2]));
    }

    #[test]
    fn metrics_track_chains() {
        let mut index: HashIndex<i64, ()> = HashIndex::new();
        // Same bucket (mod 16) three times over.
        for key in [0, 16, 32] {
            index.insert(key, ());
        }
        let metrics = index.metrics();
        assert_eq!(metrics.elements, 3);
        assert_eq!(metrics.longest_chain, 3);
        assert_eq!(metrics.collisions, 2);
    }

    #[test]
    fn clear_empties_but_keeps_buckets() {
        let mut index: HashIndex<i64, i64> = HashIndex::new();
        for i in 0..50 {
            index.insert(i, i);
        }
        index.clear();
        assert!(index.is_empty());
        assert_eq!(index.get(&10), None);
        index.insert(10, 10);
        assert_eq!(index.get(&10), Some(&10));
    }
}
