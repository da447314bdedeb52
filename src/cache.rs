//! Persistent TTL cache for collaborator responses
//!
//! Entries are postcard-encoded with an absolute expiry and stored in a fjall
//! keyspace. Cache failures never fail a run: [`fetch_through`] logs them and
//! falls back to the live call.

use anyhow::{Result, anyhow};
use fjall::Keyspace;
use rand::RngExt;
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use std::fmt::Debug;
use std::future::Future;
use std::path::Path;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tokio::task;

#[derive(Serialize, Deserialize)]
struct StoredEntry<T> {
    value: T,
    expires_at: u64, // Unix timestamp (seconds)
}

pub struct PersistentCache {
    _db: fjall::Database,
    store: Keyspace,
}

fn get_from_store(store: Keyspace, key: Vec<u8>) -> anyhow::Result<Option<Vec<u8>>> {
    Ok(store.get(key)?.map(|v| v.to_vec()))
}

impl PersistentCache {
    /// Open (or create) the cache database at `path`
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let db = fjall::Database::builder(&path).open()?;
        let items = db.keyspace("responses", fjall::KeyspaceCreateOptions::default)?;
        Ok(PersistentCache {
            _db: db,
            store: items,
        })
    }

    /// Stores a serializable value with a time-to-live (TTL).
    #[tracing::instrument(name = "put_cache", level = "debug", skip(self))]
    pub async fn put<T: Serialize + Send + Debug + 'static>(
        &self,
        key: &str,
        value: T,
        ttl: Duration,
    ) -> Result<()> {
        let store = self.store.clone();
        let key = key.as_bytes().to_vec();
        let expires_at = SystemTime::now()
            .checked_add(ttl)
            .ok_or(anyhow!("TTL overflow"))?
            .duration_since(UNIX_EPOCH)?
            .as_secs();
        let entry = StoredEntry { value, expires_at };
        let bytes = postcard::to_stdvec(&entry)?;

        task::spawn_blocking(move || store.insert(key, bytes)).await??;
        Ok(())
    }

    /// Retrieves a value if it exists and has not expired.
    /// Returns `None` for cache misses or expired entries.
    #[tracing::instrument(name = "query_cache", level = "debug", skip(self))]
    pub async fn get<T: DeserializeOwned + Send + 'static>(&self, key: &str) -> Result<Option<T>> {
        let store = self.store.clone();
        let key_bytes = key.as_bytes().to_vec();

        let maybe_bytes: Option<Vec<u8>> =
            task::spawn_blocking(move || get_from_store(store, key_bytes)).await??;

        let Some(bytes) = maybe_bytes else {
            tracing::debug!("Key not found");
            return Ok(None);
        };

        let entry: StoredEntry<T> = postcard::from_bytes(&bytes)?;
        let now = SystemTime::now().duration_since(UNIX_EPOCH)?.as_secs();

        if now < entry.expires_at {
            tracing::debug!("Key found and still fresh");
            Ok(Some(entry.value))
        } else {
            tracing::debug!("Key found but expired");
            self.remove(key).await?;
            Ok(None)
        }
    }

    /// Manually removes a key from the cache.
    pub async fn remove(&self, key: &str) -> Result<()> {
        let key = key.as_bytes().to_vec();
        let store = self.store.clone();
        task::spawn_blocking(move || store.remove(key)).await??;
        Ok(())
    }
}

/// Spread expiries by ±10% so entries written together do not expire together
#[must_use]
pub fn jittered(ttl: Duration) -> Duration {
    let jitter: f32 = rand::rng().random_range(0.9..1.1);
    ttl.mul_f32(jitter)
}

/// Serve `key` from the cache when fresh, otherwise run `fetch` and store its result.
/// A `None` cache simply runs `fetch`.
pub async fn fetch_through<T, F, Fut>(
    cache: Option<&PersistentCache>,
    key: &str,
    ttl: Duration,
    fetch: F,
) -> crate::Result<T>
where
    T: Serialize + DeserializeOwned + Clone + Debug + Send + 'static,
    F: FnOnce() -> Fut,
    Fut: Future<Output = crate::Result<T>>,
{
    if let Some(cache) = cache {
        match cache.get::<T>(key).await {
            Ok(Some(hit)) => return Ok(hit),
            Ok(None) => {}
            Err(e) => tracing::warn!("Cache read for {} failed: {:#}", key, e),
        }
    }

    let value = fetch().await?;

    if let Some(cache) = cache {
        if let Err(e) = cache.put(key, value.clone(), jittered(ttl)).await {
            tracing::warn!("Cache write for {} failed: {:#}", key, e);
        }
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SkiScoutError;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn test_put_get_and_expiry() {
        let dir = tempfile::tempdir().unwrap();
        let cache = PersistentCache::open(dir.path()).unwrap();

        cache
            .put("fresh", "Heavenly".to_string(), Duration::from_secs(600))
            .await
            .unwrap();
        let hit: Option<String> = cache.get("fresh").await.unwrap();
        assert_eq!(hit.as_deref(), Some("Heavenly"));

        cache
            .put("stale", 42u32, Duration::from_secs(0))
            .await
            .unwrap();
        let miss: Option<u32> = cache.get("stale").await.unwrap();
        assert_eq!(miss, None);

        let absent: Option<u32> = cache.get("absent").await.unwrap();
        assert_eq!(absent, None);
    }

    #[tokio::test]
    async fn test_fetch_through_only_calls_once() {
        let dir = tempfile::tempdir().unwrap();
        let cache = PersistentCache::open(dir.path()).unwrap();
        let calls = AtomicUsize::new(0);

        for _ in 0..3 {
            let value = fetch_through(Some(&cache), "k", Duration::from_secs(600), || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok::<_, SkiScoutError>(vec![1.5f64, 2.5])
            })
            .await
            .unwrap();
            assert_eq!(value, vec![1.5, 2.5]);
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_fetch_through_propagates_fetch_errors() {
        let result: crate::Result<u32> = fetch_through(None, "k", Duration::from_secs(1), || async {
            Err(SkiScoutError::api("down"))
        })
        .await;
        assert!(result.is_err());
    }

    #[test]
    fn test_jitter_bounds() {
        let ttl = Duration::from_secs(1800);
        for _ in 0..20 {
            let j = jittered(ttl);
            assert!(j >= Duration::from_secs(1620) && j <= Duration::from_secs(1980));
        }
    }
}
