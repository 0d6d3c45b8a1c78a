use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use deadpool_redis::Pool as RedisPool;
use redis::AsyncCommands;

use crate::{entities::rate_limit::RateLimitRecord, errors::StoreError};

/// Redis keys expire after a full daily window of inactivity.
const REDIS_RECORD_TTL_SECS: u64 = 24 * 60 * 60;

/// Where rate-limit records live. Callers serialize access per key.
#[async_trait]
pub trait RateLimitStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<RateLimitRecord>, StoreError>;
    async fn set(&self, key: &str, record: RateLimitRecord) -> Result<(), StoreError>;

    /// Removes records whose latest activity is at or before `cutoff`.
    /// Returns how many were dropped.
    async fn prune(&self, cutoff: DateTime<Utc>) -> Result<usize, StoreError>;
}

#[async_trait]
impl<S: RateLimitStore + ?Sized> RateLimitStore for Box<S> {
    async fn get(&self, key: &str) -> Result<Option<RateLimitRecord>, StoreError> {
        (**self).get(key).await
    }

    async fn set(&self, key: &str, record: RateLimitRecord) -> Result<(), StoreError> {
        (**self).set(key, record).await
    }

    async fn prune(&self, cutoff: DateTime<Utc>) -> Result<usize, StoreError> {
        (**self).prune(cutoff).await
    }
}

/// Process-local store. Limits are only enforced within this instance.
#[derive(Default)]
pub struct InMemoryRateLimitStore {
    records: DashMap<String, RateLimitRecord>,
}

impl InMemoryRateLimitStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[async_trait]
impl RateLimitStore for InMemoryRateLimitStore {
    async fn get(&self, key: &str) -> Result<Option<RateLimitRecord>, StoreError> {
        Ok(self.records.get(key).map(|entry| entry.value().clone()))
    }

    async fn set(&self, key: &str, record: RateLimitRecord) -> Result<(), StoreError> {
        self.records.insert(key.to_string(), record);
        Ok(())
    }

    async fn prune(&self, cutoff: DateTime<Utc>) -> Result<usize, StoreError> {
        let before = self.records.len();
        self.records.retain(|_, record| {
            record.last_submission.is_some_and(|last| last > cutoff)
        });
        Ok(before.saturating_sub(self.records.len()))
    }
}

/// Shared store for deployments running more than one instance.
#[derive(Clone)]
pub struct RedisRateLimitStore {
    pool: RedisPool,
    prefix: String,
}

impl RedisRateLimitStore {
    pub fn new(pool: RedisPool) -> Self {
        RedisRateLimitStore {
            pool,
            prefix: "rl:submission".to_string(),
        }
    }

    fn redis_key(&self, key: &str) -> String {
        format!("{}:{}", self.prefix, key)
    }
}

#[async_trait]
impl RateLimitStore for RedisRateLimitStore {
    async fn get(&self, key: &str) -> Result<Option<RateLimitRecord>, StoreError> {
        let mut conn = self.pool.get().await
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;

        let raw: Option<String> = conn.get(self.redis_key(key)).await
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;

        raw.map(|json| {
            serde_json::from_str(&json).map_err(|e| StoreError::Corrupted(e.to_string()))
        })
        .transpose()
    }

    async fn set(&self, key: &str, record: RateLimitRecord) -> Result<(), StoreError> {
        let json = serde_json::to_string(&record)
            .map_err(|e| StoreError::Corrupted(e.to_string()))?;

        let mut conn = self.pool.get().await
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;

        conn.set_ex::<_, _, ()>(self.redis_key(key), json, REDIS_RECORD_TTL_SECS).await
            .map_err(|e| StoreError::Unavailable(e.to_string()))
    }

    async fn prune(&self, _cutoff: DateTime<Utc>) -> Result<usize, StoreError> {
        // Expiry is handled by the key TTL.
        Ok(0)
    }
}
