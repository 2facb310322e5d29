use std::future::Future;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

/// A single cached value together with the instant it was stored.
///
/// Reads within `ttl` of the last store are hits. Handlers run on a
/// multi-threaded runtime, so the slot sits behind an async `RwLock`.
pub struct TimedCache<T> {
    ttl: Duration,
    slot: RwLock<Option<(Instant, T)>>,
}

impl<T: Clone> TimedCache<T> {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            slot: RwLock::new(None),
        }
    }

    pub async fn get(&self) -> Option<T> {
        let slot = self.slot.read().await;
        match slot.as_ref() {
            Some((stored_at, value)) if stored_at.elapsed() < self.ttl => Some(value.clone()),
            _ => None,
        }
    }

    pub async fn set(&self, value: T) {
        *self.slot.write().await = Some((Instant::now(), value));
    }

    pub async fn invalidate(&self) {
        *self.slot.write().await = None;
    }

    /// Return the cached value, or compute, store and return a fresh one.
    ///
    /// The write lock is held while refreshing so concurrent misses compute once.
    pub async fn get_or_refresh<F, Fut, E>(&self, refresh: F) -> Result<T, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        if let Some(hit) = self.get().await {
            return Ok(hit);
        }

        let mut slot = self.slot.write().await;
        if let Some((stored_at, value)) = slot.as_ref() {
            if stored_at.elapsed() < self.ttl {
                return Ok(value.clone());
            }
        }

        tracing::debug!("cache miss; refreshing");
        let fresh = refresh().await?;
        *slot = Some((Instant::now(), fresh.clone()));
        Ok(fresh)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn returns_stored_value_within_ttl() {
        let cache = TimedCache::new(Duration::from_secs(60));
        assert_eq!(cache.get().await, None::<u32>);
        cache.set(7).await;
        assert_eq!(cache.get().await, Some(7));
    }

    #[tokio::test]
    async fn zero_ttl_never_hits() {
        let cache = TimedCache::new(Duration::ZERO);
        cache.set(1).await;
        assert_eq!(cache.get().await, None);
    }

    #[tokio::test]
    async fn refresh_runs_once_until_invalidated() {
        let cache = TimedCache::new(Duration::from_secs(60));
        let calls = AtomicUsize::new(0);

        for _ in 0..3 {
            let value: Result<usize, ()> = cache
                .get_or_refresh(|| async { Ok(calls.fetch_add(1, Ordering::SeqCst) + 1) })
                .await;
            assert_eq!(value, Ok(1));
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        cache.invalidate().await;
        let value: Result<usize, ()> = cache
            .get_or_refresh(|| async { Ok(calls.fetch_add(1, Ordering::SeqCst) + 1) })
            .await;
        assert_eq!(value, Ok(2));
    }

    #[tokio::test]
    async fn refresh_errors_leave_slot_empty() {
        let cache: TimedCache<u32> = TimedCache::new(Duration::from_secs(60));
        let result = cache.get_or_refresh(|| async { Err::<u32, &str>("boom") }).await;
        assert_eq!(result, Err("boom"));
        assert_eq!(cache.get().await, None);
    }
}
