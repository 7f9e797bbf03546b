use std::{collections::HashMap, sync::Arc, sync::Mutex};

/// Default capacity, matching `mmap_reader_cache_size` in spec §6.
pub const DEFAULT_CAPACITY: usize = 3;

struct Slot<V> {
    value: Arc<V>,
    evictable: bool,
}

struct Inner<V> {
    slots: HashMap<u32, Slot<V>>,
    /// Access order, least-recently-used first. Small by construction
    /// (capacity defaults to 3), so a linear scan to reposition a key on
    /// access is cheap and keeps the implementation simple.
    order: Vec<u32>,
    capacity: usize,
    n_evicted: usize,
}

/// A capacity-bounded cache mapping `file_key -> Arc<V>`, where `V` is
/// typically a read-only memory map of a sealed segment.
///
/// Eviction never frees a mapping held by an in-flight reader: the cache
/// only ever drops *its own* `Arc` strong reference from the slot. If a
/// caller is still holding a clone from an earlier [Cache::find] or
/// [Cache::add], the underlying value stays alive until that clone is also
/// dropped.
pub struct Cache<V> {
    inner: Mutex<Inner<V>>,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Stats {
    pub len: usize,
    pub n_evicted: usize,
}

impl<V> Cache<V> {
    pub fn new(capacity: usize) -> Cache<V> {
        Cache {
            inner: Mutex::new(Inner {
                slots: HashMap::new(),
                order: Vec::new(),
                capacity,
                n_evicted: 0,
            }),
        }
    }

    /// Insert `value` under `key`. Replaces any existing slot.
    pub fn add(&self, key: u32, value: Arc<V>, evictable: bool) {
        let mut inner = self.inner.lock().unwrap();
        inner.order.retain(|k| *k != key);
        inner.order.push(key);
        inner.slots.insert(key, Slot { value, evictable });
    }

    /// Look up `key`, promoting it to most-recently-used on hit.
    pub fn find(&self, key: u32) -> Option<Arc<V>> {
        let mut inner = self.inner.lock().unwrap();
        let found = inner.slots.get(&key).map(|s| Arc::clone(&s.value));
        if found.is_some() {
            inner.order.retain(|k| *k != key);
            inner.order.push(key);
        }
        found
    }

    /// Toggle the evictable flag on `key`. Returns false if `key` is not in
    /// the cache.
    pub fn set_evictable(&self, key: u32, evictable: bool) -> bool {
        let mut inner = self.inner.lock().unwrap();
        match inner.slots.get_mut(&key) {
            Some(slot) => {
                slot.evictable = evictable;
                true
            }
            None => false,
        }
    }

    /// Evict least-recently-used evictable slots until the cache is at or
    /// below capacity. Never touches a non-evictable slot (the active
    /// writer's mapping), even if that means staying above capacity.
    pub fn perform_eviction(&self) {
        let mut inner = self.inner.lock().unwrap();
        let capacity = inner.capacity;
        let mut i = 0;
        while inner.slots.len() > capacity && i < inner.order.len() {
            let key = inner.order[i];
            let evictable = inner.slots.get(&key).map(|s| s.evictable).unwrap_or(false);
            if evictable {
                inner.slots.remove(&key);
                inner.order.remove(i);
                inner.n_evicted += 1;
                // don't advance i: the vector shifted left under us
            } else {
                i += 1;
            }
        }
    }

    pub fn len(&self) -> usize {
        self.inner.lock().unwrap().slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> Stats {
        let inner = self.inner.lock().unwrap();
        Stats { len: inner.slots.len(), n_evicted: inner.n_evicted }
    }
}
