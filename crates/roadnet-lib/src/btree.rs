use std::cmp::Ordering;

/// Default minimum degree (`t`) for new indexes. Nodes hold between `t - 1`
/// and `2t - 1` keys, except the root which may hold fewer.
const DEFAULT_MIN_DEGREE: usize = 3;

/// Sorted multiway index (B-tree) over an ordered key.
///
/// Backs the name and city indexes of the network. Point lookups, range
/// queries, and removals are all `O(log n)`; an in-order traversal yields
/// keys in ascending order. Inserting an existing key overwrites its value,
/// so the index never holds duplicates.
#[derive(Debug, Clone)]
pub struct OrderedIndex<K, V> {
    root: Node<K, V>,
    min_degree: usize,
    len: usize,
}

#[derive(Debug, Clone)]
struct Node<K, V> {
    keys: Vec<K>,
    values: Vec<V>,
    /// Empty for leaves; otherwise always `keys.len() + 1` entries.
    children: Vec<Node<K, V>>,
}

impl<K, V> Default for Node<K, V> {
    fn default() -> Self {
        Self {
            keys: Vec::new(),
            values: Vec::new(),
            children: Vec::new(),
        }
    }
}

impl<K, V> Default for OrderedIndex<K, V>
where
    K: Ord + Clone,
    V: Clone,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> OrderedIndex<K, V>
where
    K: Ord + Clone,
    V: Clone,
{
    pub fn new() -> Self {
        Self::with_min_degree(DEFAULT_MIN_DEGREE)
    }

    /// Create an index with a custom minimum degree. `min_degree` must be at
    /// least 2 for the split and merge arithmetic to hold.
    pub fn with_min_degree(min_degree: usize) -> Self {
        assert!(min_degree >= 2, "B-tree minimum degree must be >= 2");
        Self {
            root: Node::default(),
            min_degree,
            len: 0,
        }
    }

    /// Number of distinct keys stored.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Insert a key, overwriting the value if the key already exists.
    pub fn insert(&mut self, key: K, value: V) {
        let max_keys = 2 * self.min_degree - 1;
        if self.root.keys.len() == max_keys {
            // Full root: grow the tree by one level before descending.
            let old_root = std::mem::take(&mut self.root);
            self.root.children.push(old_root);
            self.root.split_child(0, self.min_degree);
        }
        if self.root.insert_non_full(key, value, self.min_degree) {
            self.len += 1;
        }
    }

    /// Point lookup. A missing key is a defined not-found result, never an
    /// error.
    pub fn search(&self, key: &K) -> Option<&V> {
        let mut node = &self.root;
        loop {
            match node.keys.binary_search(key) {
                Ok(idx) => return Some(&node.values[idx]),
                Err(idx) => {
                    if node.is_leaf() {
                        return None;
                    }
                    node = &node.children[idx];
                }
            }
        }
    }

    /// Mutable point lookup, so callers can update a value in place instead
    /// of re-inserting it.
    pub fn search_mut(&mut self, key: &K) -> Option<&mut V> {
        let mut node = &mut self.root;
        loop {
            match node.keys.binary_search(key) {
                Ok(idx) => return Some(&mut node.values[idx]),
                Err(idx) => {
                    if node.children.is_empty() {
                        return None;
                    }
                    node = &mut node.children[idx];
                }
            }
        }
    }

    pub fn contains(&self, key: &K) -> bool {
        self.search(key).is_some()
    }

    /// Remove a key, rebalancing by borrowing from a sibling or merging so
    /// every non-root node keeps at least `t - 1` keys and all leaves stay at
    /// the same depth.
    pub fn remove(&mut self, key: &K) -> Option<V> {
        let removed = self.root.remove(key, self.min_degree);
        if removed.is_some() {
            self.len -= 1;
        }
        if self.root.keys.is_empty() && !self.root.is_leaf() {
            // The root emptied out; promote its sole child and shrink the
            // tree by one level.
            let child = self.root.children.remove(0);
            self.root = child;
        }
        removed
    }

    /// All entries with `min <= key <= max`, in ascending key order.
    pub fn range(&self, min: &K, max: &K) -> Vec<(K, V)> {
        let mut out = Vec::new();
        if min <= max {
            self.root.collect_range(min, max, &mut out);
        }
        out
    }

    /// Visit every entry in ascending key order.
    pub fn for_each<F>(&self, mut f: F)
    where
        F: FnMut(&K, &V),
    {
        self.root.traverse(&mut f);
    }

    /// Export the full contents as an ordered sequence, for an external
    /// persistence layer to encode however it likes.
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
}

impl<V: Clone> OrderedIndex<String, V> {
    /// All entries whose key starts with `prefix`, in ascending key order.
    ///
    /// Runs as a range query against `[prefix, prefix + char::MAX]` rather
    /// than a full scan.
    pub fn prefix_search(&self, prefix: &str) -> Vec<(String, V)> {
        if prefix.is_empty() {
            return self.entries();
        }
        let min = prefix.to_string();
        let max = format!("{prefix}{}", char::MAX);
        self.range(&min, &max)
    }
}

impl<K, V> Node<K, V>
where
    K: Ord + Clone,
    V: Clone,
{
    fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// Split the full child at `idx`, promoting its median key into `self`.
    /// `self` must not be full.
    fn split_child(&mut self, idx: usize, t: usize) {
        let child = &mut self.children[idx];
        let right_keys = child.keys.split_off(t);
        let right_values = child.values.split_off(t);
        let right_children = if child.is_leaf() {
            Vec::new()
        } else {
            child.children.split_off(t)
        };
        let median_key = child.keys.remove(t - 1);
        let median_value = child.values.remove(t - 1);

        let right = Node {
            keys: right_keys,
            values: right_values,
            children: right_children,
        };
        self.keys.insert(idx, median_key);
        self.values.insert(idx, median_value);
        self.children.insert(idx + 1, right);
    }

    /// Insert into a node known to be non-full. Returns `true` when a new key
    /// was added, `false` on overwrite.
    fn insert_non_full(&mut self, key: K, value: V, t: usize) -> bool {
        match self.keys.binary_search(&key) {
            Ok(idx) => {
                self.values[idx] = value;
                false
            }
            Err(mut idx) => {
                if self.is_leaf() {
                    self.keys.insert(idx, key);
                    self.values.insert(idx, value);
                    return true;
                }
                if self.children[idx].keys.len() == 2 * t - 1 {
                    self.split_child(idx, t);
                    // The promoted median may be the key being inserted, or
                    // shift the descent one child to the right.
                    match key.cmp(&self.keys[idx]) {
                        Ordering::Equal => {
                            self.values[idx] = value;
                            return false;
                        }
                        Ordering::Greater => idx += 1,
                        Ordering::Less => {}
                    }
                }
                self.children[idx].insert_non_full(key, value, t)
            }
        }
    }

    fn remove(&mut self, key: &K, t: usize) -> Option<V> {
        match self.keys.binary_search(key) {
            Ok(idx) => {
                if self.is_leaf() {
                    self.keys.remove(idx);
                    Some(self.values.remove(idx))
                } else {
                    self.remove_at_internal(idx, t)
                }
            }
            Err(idx) => {
                if self.is_leaf() {
                    return None;
                }
                let idx = self.ensure_child_can_lose(idx, t);
                self.children[idx].remove(key, t)
            }
        }
    }

    /// Remove the key held at `self.keys[idx]` of an internal node, replacing
    /// it with its in-order predecessor or successor, or merging when both
    /// adjacent children are minimal.
    fn remove_at_internal(&mut self, idx: usize, t: usize) -> Option<V> {
        if self.children[idx].keys.len() >= t {
            let (pred_key, pred_value) = self.children[idx].max_entry();
            let _ = self.children[idx].remove(&pred_key, t);
            self.keys[idx] = pred_key;
            Some(std::mem::replace(&mut self.values[idx], pred_value))
        } else if self.children[idx + 1].keys.len() >= t {
            let (succ_key, succ_value) = self.children[idx + 1].min_entry();
            let _ = self.children[idx + 1].remove(&succ_key, t);
            self.keys[idx] = succ_key;
            Some(std::mem::replace(&mut self.values[idx], succ_value))
        } else {
            let key = self.keys[idx].clone();
            self.merge_children(idx);
            self.children[idx].remove(&key, t)
        }
    }

    /// Make sure the child we are about to descend into holds at least `t`
    /// keys, borrowing from a sibling or merging. Returns the (possibly
    /// shifted) child index to descend into.
    fn ensure_child_can_lose(&mut self, idx: usize, t: usize) -> usize {
        if self.children[idx].keys.len() >= t {
            return idx;
        }
        if idx > 0 && self.children[idx - 1].keys.len() >= t {
            self.borrow_from_prev(idx);
            idx
        } else if idx + 1 < self.children.len() && self.children[idx + 1].keys.len() >= t {
            self.borrow_from_next(idx);
            idx
        } else if idx + 1 < self.children.len() {
            self.merge_children(idx);
            idx
        } else {
            self.merge_children(idx - 1);
            idx - 1
        }
    }

    /// Rotate one entry through the parent from the left sibling.
    fn borrow_from_prev(&mut self, idx: usize) {
        let (left_half, right_half) = self.children.split_at_mut(idx);
        let left = &mut left_half[idx - 1];
        let child = &mut right_half[0];

        let borrowed_key = left.keys.remove(left.keys.len() - 1);
        let borrowed_value = left.values.remove(left.values.len() - 1);
        child
            .keys
            .insert(0, std::mem::replace(&mut self.keys[idx - 1], borrowed_key));
        child.values.insert(
            0,
            std::mem::replace(&mut self.values[idx - 1], borrowed_value),
        );
        if !left.is_leaf() {
            let subtree = left.children.remove(left.children.len() - 1);
            child.children.insert(0, subtree);
        }
    }

    /// Rotate one entry through the parent from the right sibling.
    fn borrow_from_next(&mut self, idx: usize) {
        let (left_half, right_half) = self.children.split_at_mut(idx + 1);
        let child = &mut left_half[idx];
        let right = &mut right_half[0];

        let borrowed_key = right.keys.remove(0);
        let borrowed_value = right.values.remove(0);
        child
            .keys
            .push(std::mem::replace(&mut self.keys[idx], borrowed_key));
        child
            .values
            .push(std::mem::replace(&mut self.values[idx], borrowed_value));
        if !right.is_leaf() {
            let subtree = right.children.remove(0);
            child.children.push(subtree);
        }
    }

    /// Fold the separator key at `idx` and the child at `idx + 1` into the
    /// child at `idx`.
    fn merge_children(&mut self, idx: usize) {
        let right = self.children.remove(idx + 1);
        let sep_key = self.keys.remove(idx);
        let sep_value = self.values.remove(idx);

        let child = &mut self.children[idx];
        child.keys.push(sep_key);
        child.values.push(sep_value);
        child.keys.extend(right.keys);
        child.values.extend(right.values);
        child.children.extend(right.children);
    }

    /// Clone the largest entry in this subtree.
    fn max_entry(&self) -> (K, V) {
        let mut node = self;
        while !node.is_leaf() {
            node = &node.children[node.children.len() - 1];
        }
        let last = node.keys.len() - 1;
        (node.keys[last].clone(), node.values[last].clone())
    }

    /// Clone the smallest entry in this subtree.
    fn min_entry(&self) -> (K, V) {
        let mut node = self;
        while !node.is_leaf() {
            node = &node.children[0];
        }
        (node.keys[0].clone(), node.values[0].clone())
    }

    fn collect_range(&self, min: &K, max: &K, out: &mut Vec<(K, V)>) {
        let start = self.keys.partition_point(|k| k < min);
        if !self.is_leaf() {
            self.children[start].collect_range(min, max, out);
        }
        for idx in start..self.keys.len() {
            if self.keys[idx] > *max {
                return;
            }
            out.push((self.keys[idx].clone(), self.values[idx].clone()));
            if !self.is_leaf() {
                self.children[idx + 1].collect_range(min, max, out);
            }
        }
    }

    fn traverse<F>(&self, f: &mut F)
    where
        F: FnMut(&K, &V),
    {
        for idx in 0..self.keys.len() {
            if !self.is_leaf() {
                self.children[idx].traverse(f);
            }
            f(&self.keys[idx], &self.values[idx]);
        }
        if !self.is_leaf() {
            self.children[self.keys.len()].traverse(f);
        }
    }
}
