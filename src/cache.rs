//! Keyed single-flight cache.
//!
//! Concurrent callers asking for the same key share one computation: the
//! first caller runs it, the others block on the same cell and receive the
//! same `Arc`. Failures are cached too, since inputs are immutable per key.

use std::hash::Hash;
use std::sync::{Arc, OnceLock};

use dashmap::DashMap;

use crate::error::Result;

type Cell<V> = Arc<OnceLock<Result<Arc<V>>>>;

pub struct SingleFlight<K, V> {
    cells: DashMap<K, Cell<V>>,
}

impl<K, V> Default for SingleFlight<K, V>
where
    K: Eq + Hash,
{
    fn default() -> Self {
        Self {
            cells: DashMap::new(),
        }
    }
}

impl<K, V> SingleFlight<K, V>
where
    K: Eq + Hash + Clone,
{
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_or_compute<F>(&self, key: K, compute: F) -> Result<Arc<V>>
    where
        F: FnOnce() -> Result<V>,
    {
        // clone the cell out so the shard lock is not held while computing
        let cell: Cell<V> = Arc::clone(&self.cells.entry(key).or_default());
        cell.get_or_init(|| compute().map(Arc::new)).clone()
    }

    pub fn peek(&self, key: &K) -> Option<Result<Arc<V>>> {
        let cell = self.cells.get(key).map(|c| Arc::clone(c.value()))?;
        cell.get().cloned()
    }

    pub fn invalidate(&self, key: &K) -> bool {
        self.cells.remove(key).is_some()
    }

    pub fn retain(&self, mut keep: impl FnMut(&K) -> bool) {
        self.cells.retain(|k, _| keep(k));
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EngineError;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn computes_once_per_key() {
        let cache: SingleFlight<&str, u32> = SingleFlight::new();
        let calls = AtomicUsize::new(0);
        for _ in 0..3 {
            let v = cache
                .get_or_compute("a", || {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok(7)
                })
                .unwrap();
            assert_eq!(*v, 7);
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn errors_are_shared_until_invalidated() {
        let cache: SingleFlight<u8, u32> = SingleFlight::new();
        let err = cache
            .get_or_compute(1, || Err(EngineError::EmptyStructure("x".into())))
            .unwrap_err();
        assert_eq!(err, EngineError::EmptyStructure("x".into()));
        assert!(cache.peek(&1).unwrap().is_err());
        assert!(cache.invalidate(&1));
        assert_eq!(*cache.get_or_compute(1, || Ok(3)).unwrap(), 3);
    }
}
