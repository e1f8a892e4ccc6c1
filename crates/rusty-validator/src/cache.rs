// File: src/cache.rs
// Purpose: Copy-on-write caches for compiled records and tags

use std::any::TypeId;
use std::borrow::Borrow;
use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Arc, Mutex, PoisonError};

use arc_swap::ArcSwap;

use crate::struct_level::StructHook;
use crate::tag::{Chain, Tag};

/// Read-optimized map: lookups are one atomic load, inserts clone and
/// republish the whole snapshot under a lock
pub(crate) struct CowCache<K, V> {
    snapshot: ArcSwap<HashMap<K, V>>,
    write: Mutex<()>,
}

impl<K: Eq + Hash + Clone, V: Clone> CowCache<K, V> {
    pub fn new() -> Self {
        Self { snapshot: ArcSwap::from_pointee(HashMap::new()), write: Mutex::new(()) }
    }

    pub fn get<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.snapshot.load().get(key).cloned()
    }

    /// Returns the cached value for `key`, building and publishing it on a miss
    ///
    /// Racing builders are serialized, so every caller observes the same value.
    pub fn get_or_insert_with(&self, key: K, build: impl FnOnce() -> V) -> V {
        if let Some(value) = self.get(&key) {
            return value;
        }

        let _guard = self.write.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(value) = self.get(&key) {
            return value;
        }

        let value = build();
        let mut next: HashMap<K, V> = HashMap::clone(&self.snapshot.load());
        next.insert(key, value.clone());
        self.snapshot.store(Arc::new(next));
        value
    }

    pub fn clear(&self) {
        let _guard = self.write.lock().unwrap_or_else(PoisonError::into_inner);
        self.snapshot.store(Arc::new(HashMap::new()));
    }

    pub fn len(&self) -> usize {
        self.snapshot.load().len()
    }
}

/// Record types keyed by type identity
pub(crate) type StructCache = CowCache<TypeId, Arc<CompiledStruct>>;

/// Tag strings used with `var`
pub(crate) type TagCache = CowCache<String, Arc<Chain>>;

/// Cached metadata for one record type
pub struct CompiledStruct {
    pub(crate) name: &'static str,
    pub(crate) fields: Vec<CompiledField>,
    pub(crate) hook: Option<StructHook>,
}

impl CompiledStruct {
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn fields(&self) -> &[CompiledField] {
        &self.fields
    }

    pub fn has_struct_level(&self) -> bool {
        self.hook.is_some()
    }

    pub fn field(&self, name: &str) -> Option<&CompiledField> {
        self.fields.iter().find(|f| f.name == name)
    }
}

/// Cached metadata for one record field
pub struct CompiledField {
    pub(crate) name: &'static str,
    pub(crate) alt_name: String,
    pub(crate) index: usize,
    pub(crate) chain: Chain,
    pub(crate) indirect: bool,
}

impl CompiledField {
    /// Field identifier
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Display name from the tag name hook, or the identifier
    pub fn alt_name(&self) -> &str {
        &self.alt_name
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn chain(&self) -> Option<&Tag> {
        self.chain.as_deref()
    }

    pub fn is_indirect(&self) -> bool {
        self.indirect
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;

    #[test]
    fn test_get_or_insert_builds_once() {
        let cache: CowCache<String, Arc<u32>> = CowCache::new();
        let first = cache.get_or_insert_with("a".to_string(), || Arc::new(1));
        let second = cache.get_or_insert_with("a".to_string(), || Arc::new(2));
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get("a").as_deref(), Some(&1));
    }

    #[test]
    fn test_concurrent_inserts_share_one_value() {
        let cache: Arc<CowCache<u8, Arc<usize>>> = Arc::new(CowCache::new());
        let builds = Arc::new(AtomicUsize::new(0));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let cache = Arc::clone(&cache);
                let builds = Arc::clone(&builds);
                thread::spawn(move || {
                    cache.get_or_insert_with(7, || Arc::new(builds.fetch_add(1, Ordering::SeqCst)))
                })
            })
            .collect();

        let values: Vec<Arc<usize>> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert_eq!(builds.load(Ordering::SeqCst), 1);
        assert!(values.windows(2).all(|w| Arc::ptr_eq(&w[0], &w[1])));
    }

    #[test]
    fn test_clear() {
        let cache: CowCache<u8, u8> = CowCache::new();
        cache.get_or_insert_with(1, || 1);
        cache.clear();
        assert_eq!(cache.len(), 0);
        assert_eq!(cache.get(&1), None);
    }
}
