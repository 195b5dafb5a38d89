use lru::LruCache;
use std::hash::Hash;
use std::num::NonZeroUsize;

/// The pending feed replays hashes across reconnects; this keeps a replayed
/// hash from being raced twice within the TTL window.
pub struct DedupeCache<K> {
    ttl_ms: u64,
    cache: LruCache<K, u64>,
}

impl<K> DedupeCache<K>
where
    K: Hash + Eq,
{
    pub fn new(capacity: usize, ttl_ms: u64) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            ttl_ms,
            cache: LruCache::new(capacity),
        }
    }

    /// Returns true the first time a key is seen inside its TTL window.
    pub fn check_and_update(&mut self, key: K, now_ms: u64) -> bool {
        if let Some(expires_at) = self.cache.get_mut(&key) {
            if now_ms <= *expires_at {
                *expires_at = now_ms.saturating_add(self.ttl_ms);
                return false;
            }
        }

        let expires_at = now_ms.saturating_add(self.ttl_ms);
        self.cache.put(key, expires_at);
        true
    }
}
