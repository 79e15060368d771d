use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::error::{ProcessingError, Result};

type Slot<V> = Arc<Mutex<Option<Arc<V>>>>;

/// Memoization cache where concurrent requests for the same key share one computation.
///
/// The outer lock is only held long enough to find or create the key's slot; the
/// slot's own lock serializes the computation, so callers for other keys are never
/// blocked by a slow load. Failed computations leave the slot empty.
pub struct SingleFlightCache<K, V> {
    slots: Mutex<HashMap<K, Slot<V>>>,
}

impl<K, V> SingleFlightCache<K, V>
where
    K: Eq + Hash + Clone,
{
    pub fn new() -> Self {
        Self {
            slots: Mutex::new(HashMap::new()),
        }
    }

    pub fn get_or_try_insert_with<F>(&self, key: &K, compute: F) -> Result<Arc<V>>
    where
        F: FnOnce() -> Result<V>,
    {
        let slot = {
            let mut slots = lock(&self.slots)?;
            slots.entry(key.clone()).or_default().clone()
        };

        let mut value = lock(&slot)?;
        if let Some(existing) = value.as_ref() {
            return Ok(existing.clone());
        }

        let computed = Arc::new(compute()?);
        *value = Some(computed.clone());
        Ok(computed)
    }

    pub fn get(&self, key: &K) -> Option<Arc<V>> {
        let slot = lock(&self.slots).ok()?.get(key).cloned()?;
        let value = lock(&slot).ok()?;
        value.clone()
    }

    /// Drop every entry whose key matches `predicate`. Returns how many were removed.
    pub fn invalidate_where<P>(&self, predicate: P) -> Result<usize>
    where
        P: Fn(&K) -> bool,
    {
        let mut slots = lock(&self.slots)?;
        let before = slots.len();
        slots.retain(|key, _| !predicate(key));
        Ok(before - slots.len())
    }

    pub fn clear(&self) -> Result<()> {
        lock(&self.slots)?.clear();
        Ok(())
    }

    pub fn len(&self) -> usize {
        lock(&self.slots).map(|slots| slots.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<K, V> Default for SingleFlightCache<K, V>
where
    K: Eq + Hash + Clone,
{
    fn default() -> Self {
        Self::new()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> Result<MutexGuard<'_, T>> {
    mutex
        .lock()
        .map_err(|_| ProcessingError::Compute("cache lock poisoned".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;
    use std::time::Duration;

    #[test]
    fn test_concurrent_callers_share_one_computation() {
        let cache: Arc<SingleFlightCache<String, usize>> = Arc::new(SingleFlightCache::new());
        let calls = Arc::new(AtomicUsize::new(0));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let cache = cache.clone();
                let calls = calls.clone();
                thread::spawn(move || {
                    cache
                        .get_or_try_insert_with(&"source".to_string(), || {
                            calls.fetch_add(1, Ordering::SeqCst);
                            thread::sleep(Duration::from_millis(20));
                            Ok(42)
                        })
                        .unwrap()
                })
            })
            .collect();

        for handle in handles {
            assert_eq!(*handle.join().unwrap(), 42);
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_failures_are_not_cached() {
        let cache: SingleFlightCache<u32, u32> = SingleFlightCache::new();

        let first = cache.get_or_try_insert_with(&1, || {
            Err(ProcessingError::Compute("boom".to_string()))
        });
        assert!(first.is_err());
        assert!(cache.get(&1).is_none());

        let second = cache.get_or_try_insert_with(&1, || Ok(7)).unwrap();
        assert_eq!(*second, 7);
    }

    #[test]
    fn test_invalidate_where() {
        let cache: SingleFlightCache<u32, u32> = SingleFlightCache::new();
        for key in 0..4 {
            cache.get_or_try_insert_with(&key, || Ok(key * 10)).unwrap();
        }

        let removed = cache.invalidate_where(|k| k % 2 == 0).unwrap();
        assert_eq!(removed, 2);
        assert_eq!(cache.len(), 2);
        assert!(cache.get(&0).is_none());
        assert_eq!(cache.get(&1).map(|v| *v), Some(10));
    }
}
