//! # Symbol Table
//!
//! Chained bucket hash map used for label resolution. Each bucket is a
//! short vector of entries; when the load factor passes 0.75 the bucket
//! count doubles and every entry is rehashed. Keys compare by content
//! (`Eq`), so two separately allocated label names find the same entry.

use std::borrow::Borrow;
use std::hash::{BuildHasher, Hash};

use rustc_hash::FxBuildHasher;

const MAX_LOAD_FACTOR: f64 = 0.75;
const DEFAULT_BUCKETS: usize = 16;

#[derive(Debug, Clone)]
pub struct SymbolTable<K, V, S = FxBuildHasher> {
    buckets: Vec<Vec<(K, V)>>,
    entries: usize,
    hasher: S,
}

impl<K: Hash + Eq, V> SymbolTable<K, V, FxBuildHasher> {
    pub fn new() -> Self {
        Self::with_buckets(DEFAULT_BUCKETS)
    }

    pub fn with_buckets(buckets: usize) -> Self {
        Self::with_buckets_and_hasher(buckets, FxBuildHasher::default())
    }
}

impl<K: Hash + Eq, V> Default for SymbolTable<K, V, FxBuildHasher> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Hash + Eq, V, S: BuildHasher> SymbolTable<K, V, S> {
    /// Creates a table with `buckets` initial buckets (at least one) and a
    /// caller-supplied hash function.
    pub fn with_buckets_and_hasher(buckets: usize, hasher: S) -> Self {
        let count = buckets.max(1);
        Self {
            buckets: (0..count).map(|_| Vec::new()).collect(),
            entries: 0,
            hasher,
        }
    }

    /// Inserts `key`, returning the previous value if the key was present.
    pub fn insert(&mut self, key: K, value: V) -> Option<V> {
        let index = self.bucket_of(&key);
        if let Some(slot) = self.buckets[index].iter_mut().find(|(k, _)| *k == key) {
            return Some(std::mem::replace(&mut slot.1, value));
        }

        self.buckets[index].push((key, value));
        self.entries += 1;

        if self.load_factor() > MAX_LOAD_FACTOR {
            self.resize(self.buckets.len() * 2);
        }
        None
    }

    pub fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let index = self.bucket_of(key);
        self.buckets[index]
            .iter()
            .find(|(k, _)| k.borrow() == key)
            .map(|(_, v)| v)
    }

    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.get(key).is_some()
    }

    pub fn remove<Q>(&mut self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let index = self.bucket_of(key);
        let bucket = &mut self.buckets[index];
        let pos = bucket.iter().position(|(k, _)| k.borrow() == key)?;
        self.entries -= 1;
        Some(bucket.swap_remove(pos).1)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries == 0
    }

    #[inline]
    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    pub fn load_factor(&self) -> f64 {
        self.entries as f64 / self.buckets.len() as f64
    }

    pub fn iter(&self) -> impl Iterator<Item = (&K, &V)> {
        self.buckets
            .iter()
            .flat_map(|bucket| bucket.iter().map(|(k, v)| (k, v)))
    }

    fn resize(&mut self, new_count: usize) {
        let old = std::mem::replace(
            &mut self.buckets,
            (0..new_count).map(|_| Vec::new()).collect(),
        );
        for (key, value) in old.into_iter().flatten() {
            let index = self.bucket_of(&key);
            self.buckets[index].push((key, value));
        }
    }

    #[inline]
    fn bucket_of<Q: Hash + ?Sized>(&self, key: &Q) -> usize {
        (self.hasher.hash_one(key) % self.buckets.len() as u64) as usize
    }
}
