use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use std::time::Duration;

pub static START_TIME: Lazy<DateTime<Utc>> = Lazy::new(Utc::now);

/// How long a computed health response is served from cache.
pub const HEALTH_CACHE_SECS: i64 = 5;

pub const PRUNE_INTERVAL: Duration = Duration::from_secs(10 * 60);

/// Identity form key used by `/api/sendEmail` when the client sends no `formType`.
pub const GENERAL_FORM: &str = "general";
