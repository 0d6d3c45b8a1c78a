use std::collections::VecDeque;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::settings::{IdentityStrategy, RateLimitPolicy};

const ANONYMOUS: &str = "anonymous";
const UNKNOWN_ORIGIN: &str = "unknown";

/// Scope of a rate-limit record: who submitted, through which form.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SubmissionIdentity {
    subject: String,
    form: String,
}

impl SubmissionIdentity {
    pub fn new(subject: &str, form: &str) -> Self {
        let normalized = subject.trim().to_lowercase();
        SubmissionIdentity {
            subject: urlencoding::encode(&normalized).into_owned(),
            form: form.to_string(),
        }
    }

    /// Derives the identity for a submission according to `strategy`.
    pub fn derive(
        strategy: IdentityStrategy,
        sender_email: Option<&str>,
        origin: Option<&str>,
        form: &str,
    ) -> Self {
        let email = sender_email
            .map(str::trim)
            .filter(|e| !e.is_empty())
            .unwrap_or(ANONYMOUS);
        let origin = origin
            .map(str::trim)
            .filter(|o| !o.is_empty())
            .unwrap_or(UNKNOWN_ORIGIN);

        match strategy {
            IdentityStrategy::Email => Self::new(email, form),
            IdentityStrategy::ClientIp => Self::new(origin, form),
            IdentityStrategy::EmailAndIp => Self::new(&format!("{email}|{origin}"), form),
        }
    }

    pub fn key(&self) -> String {
        format!("{}:{}", self.subject, self.form)
    }
}

/// Per-identity submission history.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct RateLimitRecord {
    pub last_submission: Option<DateTime<Utc>>,
    pub hourly: VecDeque<DateTime<Utc>>,
    pub daily: VecDeque<DateTime<Utc>>,
}

fn hour() -> Duration {
    Duration::hours(1)
}

fn day() -> Duration {
    Duration::hours(24)
}

fn within(window: &VecDeque<DateTime<Utc>>, cutoff: DateTime<Utc>) -> impl Iterator<Item = &DateTime<Utc>> + Clone {
    window.iter().filter(move |t| **t > cutoff)
}

/// Whole seconds, rounded up, never below one.
fn ceil_secs(d: Duration) -> u64 {
    let ms = d.num_milliseconds().max(0) as u64;
    ms.div_ceil(1000).max(1)
}

impl RateLimitRecord {
    /// Decides whether a submission at `now` is allowed. Never mutates.
    pub fn evaluate(&self, now: DateTime<Utc>, policy: &RateLimitPolicy) -> RateDecision {
        if let Some(last) = self.last_submission {
            let elapsed = now - last;
            if elapsed < policy.cooldown {
                return RateDecision::Denied(RateLimitDenial {
                    reason: DenialReason::Cooldown,
                    retry_after_secs: ceil_secs(policy.cooldown - elapsed),
                });
            }
        }

        let mut recent_hour = within(&self.hourly, now - hour());
        let hourly_count = recent_hour.clone().count();
        if hourly_count >= policy.max_per_hour as usize {
            let oldest = recent_hour.next().copied().unwrap_or(now);
            return RateDecision::Denied(RateLimitDenial {
                reason: DenialReason::HourlyCap { max: policy.max_per_hour },
                retry_after_secs: ceil_secs(oldest + hour() - now),
            });
        }

        let mut recent_day = within(&self.daily, now - day());
        let daily_count = recent_day.clone().count();
        if daily_count >= policy.max_per_day as usize {
            let oldest = recent_day.next().copied().unwrap_or(now);
            return RateDecision::Denied(RateLimitDenial {
                reason: DenialReason::DailyCap { max: policy.max_per_day },
                retry_after_secs: ceil_secs(oldest + day() - now),
            });
        }

        RateDecision::Allowed
    }

    /// Records an accepted submission and prunes both windows.
    pub fn record(&mut self, now: DateTime<Utc>, policy: &RateLimitPolicy) {
        // Keep the sequences non-decreasing even if the clock steps back.
        let at = match self.daily.back() {
            Some(last) if *last > now => *last,
            _ => now,
        };

        self.last_submission = Some(at);
        self.hourly.push_back(at);
        self.daily.push_back(at);
        self.prune(at);

        let cap = policy.max_per_day.max(1) as usize;
        while self.daily.len() > cap {
            self.daily.pop_front();
        }
        while self.hourly.len() > cap {
            self.hourly.pop_front();
        }
    }

    /// Drops timestamps that have left their windows.
    pub fn prune(&mut self, now: DateTime<Utc>) {
        let hour_cutoff = now - hour();
        while self.hourly.front().is_some_and(|t| *t <= hour_cutoff) {
            self.hourly.pop_front();
        }
        let day_cutoff = now - day();
        while self.daily.front().is_some_and(|t| *t <= day_cutoff) {
            self.daily.pop_front();
        }
    }

    pub fn status(&self, now: DateTime<Utc>, policy: &RateLimitPolicy) -> RateLimitStatus {
        let cooldown_remaining = self
            .last_submission
            .map(|last| (policy.cooldown - (now - last)).num_milliseconds().max(0) as u64)
            .unwrap_or(0);
        let hourly = within(&self.hourly, now - hour()).count() as u32;
        let daily = within(&self.daily, now - day()).count() as u32;

        RateLimitStatus {
            hourly_remaining: policy.max_per_hour.saturating_sub(hourly),
            daily_remaining: policy.max_per_day.saturating_sub(daily),
            cooldown_remaining,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenialReason {
    Cooldown,
    HourlyCap { max: u32 },
    DailyCap { max: u32 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitDenial {
    pub reason: DenialReason,
    pub retry_after_secs: u64,
}

impl RateLimitDenial {
    /// Message shown to the submitter.
    pub fn message(&self) -> String {
        match self.reason {
            DenialReason::Cooldown => format!(
                "Please wait {} seconds before submitting another form.",
                self.retry_after_secs
            ),
            DenialReason::HourlyCap { max } => format!(
                "You've reached the maximum submissions per hour ({}). Please try again later.",
                max
            ),
            DenialReason::DailyCap { max } => format!(
                "You've reached the maximum submissions per day ({}). Please try again tomorrow.",
                max
            ),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateDecision {
    Allowed,
    Denied(RateLimitDenial),
}

impl RateDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, RateDecision::Allowed)
    }
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RateLimitStatus {
    pub hourly_remaining: u32,
    pub daily_remaining: u32,
    /// Milliseconds left in the cooldown.
    pub cooldown_remaining: u64,
}
