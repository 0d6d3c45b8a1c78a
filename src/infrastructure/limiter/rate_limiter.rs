use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::{
    entities::rate_limit::{RateDecision, RateLimitStatus, SubmissionIdentity},
    errors::StoreError,
    limiter::store::RateLimitStore,
    settings::RateLimitPolicy,
};

type Key = String;

/// Cooldown, hourly and daily caps per submission identity.
///
/// Deciding and recording are separate steps so that a failed delivery does
/// not consume quota. Hold the guard from [`RateLimiter::lock`] across both
/// steps to keep concurrent submissions from the same identity from racing
/// past a cap.
pub struct RateLimiter<S>
where
    S: RateLimitStore,
{
    store: S,
    policy: RateLimitPolicy,
    locks: DashMap<Key, Arc<Mutex<()>>>,
}

impl<S> RateLimiter<S>
where
    S: RateLimitStore,
{
    pub fn new(store: S, policy: RateLimitPolicy) -> Self {
        RateLimiter {
            store,
            policy,
            locks: DashMap::new(),
        }
    }

    pub fn policy(&self) -> &RateLimitPolicy {
        &self.policy
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Serializes work for one identity until the guard is dropped.
    pub async fn lock(&self, identity: &SubmissionIdentity) -> OwnedMutexGuard<()> {
        let key = identity.key();
        let mutex = match self.locks.get(&key) {
            Some(existing) => existing.clone(),
            None => self
                .locks
                .entry(key)
                .or_insert_with(|| Arc::new(Mutex::new(())))
                .clone(),
        };
        mutex.lock_owned().await
    }

    pub async fn check(
        &self,
        identity: &SubmissionIdentity,
        now: DateTime<Utc>,
    ) -> Result<RateDecision, StoreError> {
        let decision = match self.store.get(&identity.key()).await? {
            Some(record) => record.evaluate(now, &self.policy),
            None => RateDecision::Allowed,
        };
        Ok(decision)
    }

    /// Call only after a confirmed delivery.
    pub async fn record(
        &self,
        identity: &SubmissionIdentity,
        now: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        let key = identity.key();
        let mut record = self.store.get(&key).await?.unwrap_or_default();
        record.record(now, &self.policy);
        self.store.set(&key, record).await
    }

    pub async fn status(
        &self,
        identity: &SubmissionIdentity,
        now: DateTime<Utc>,
    ) -> Result<RateLimitStatus, StoreError> {
        let record = self.store.get(&identity.key()).await?.unwrap_or_default();
        Ok(record.status(now, &self.policy))
    }

    /// Forgets identities with no activity inside the daily window and
    /// releases their locks.
    pub async fn prune(&self, now: DateTime<Utc>) -> Result<usize, StoreError> {
        let window = Duration::hours(24).max(self.policy.cooldown);
        let cutoff = now.checked_sub_signed(window).unwrap_or(DateTime::<Utc>::MIN_UTC);
        let removed = self.store.prune(cutoff).await?;

        // A lock only referenced by the map has no waiter or holder.
        self.locks.retain(|_, mutex| Arc::strong_count(mutex) > 1);

        Ok(removed)
    }
}
