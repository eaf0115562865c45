//! Bounded cache that coalesces concurrent requests for the same key.
//!
//! Work in flight is tracked as shared futures in an unbounded pending map, so
//! a caller asking for a key that is already being computed awaits the same
//! future instead of starting the work again. Successful results move into an
//! LRU bounded by `capacity`; failures are dropped so the next request
//! retries.
use futures::future::{BoxFuture, FutureExt, Shared};
use lru::LruCache;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::future::Future;
use std::hash::Hasher;
use std::num::NonZeroUsize;
use twox_hash::XxHash64;

type SharedResult<V, E> = Shared<BoxFuture<'static, Result<V, E>>>;

struct Entries<V, E> {
    ready: LruCache<u64, V>,
    pending: HashMap<u64, SharedResult<V, E>>,
}

pub struct CoalescingCache<V, E>
where
    V: Clone,
    E: Clone,
{
    entries: Mutex<Entries<V, E>>,
}

/// 64-bit cache key over the parts. Each part is length-prefixed so
/// different splits of the same bytes hash differently.
#[must_use]
pub fn cache_key(parts: &[&[u8]]) -> u64 {
    let mut hasher = XxHash64::with_seed(0);
    for part in parts {
        hasher.write_usize(part.len());
        hasher.write(part);
    }
    hasher.finish()
}

impl<V, E> CoalescingCache<V, E>
where
    V: Clone + Send + Sync + 'static,
    E: Clone + Send + Sync + 'static,
{
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: Mutex::new(Entries {
                ready: LruCache::new(capacity),
                pending: HashMap::new(),
            }),
        }
    }

    /// Return the cached or in-flight value for `key`, or start `make` and
    /// share its result with every concurrent caller.
    ///
    /// # Errors
    ///
    /// Returns the error produced by the shared computation.
    pub async fn get_or_try_insert_with<F, Fut>(&self, key: u64, make: F) -> Result<V, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>> + Send + 'static,
    {
        let shared = {
            let mut entries = self.entries.lock();
            if let Some(value) = entries.ready.get(&key) {
                log::debug!("cache hit for {key:016x}");
                return Ok(value.clone());
            }
            if let Some(existing) = entries.pending.get(&key) {
                log::debug!("joining in-flight computation for {key:016x}");
                existing.clone()
            } else {
                let fut = make().boxed().shared();
                entries.pending.insert(key, fut.clone());
                fut
            }
        };

        let result = shared.clone().await;
        let mut entries = self.entries.lock();
        // Only the first waiter to get here finds its own future pending.
        if entries
            .pending
            .get(&key)
            .is_some_and(|current| current.ptr_eq(&shared))
        {
            entries.pending.remove(&key);
            if let Ok(value) = &result {
                entries.ready.put(key, value.clone());
            }
        }
        result
    }

    /// Whether `key` is cached or being computed.
    #[must_use]
    pub fn contains(&self, key: u64) -> bool {
        let entries = self.entries.lock();
        entries.ready.contains(&key) || entries.pending.contains_key(&key)
    }

    /// Number of completed values held.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.lock().ready.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.lock().ready.is_empty()
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.entries.lock().ready.cap().get()
    }

    pub fn clear(&self) {
        let mut entries = self.entries.lock();
        entries.ready.clear();
        entries.pending.clear();
    }
}
