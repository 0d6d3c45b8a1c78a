use parking_lot::RwLock;

mod domain;
mod interfaces;
mod infrastructure;
pub mod errors;
pub mod settings;
pub mod constants;
pub mod graceful_shutdown;
pub mod background_task;

pub use domain::{entities, use_cases};
pub use interfaces::{handlers, routes};
pub use infrastructure::{limiter, mail, utils};

use errors::AppError;
use handlers::system::HealthResponse;
use limiter::{
    rate_limiter::RateLimiter,
    store::{InMemoryRateLimitStore, RateLimitStore, RedisRateLimitStore},
};
use mail::{build_transport, transport::Transport};
use settings::AppConfig;
use use_cases::dispatch::DispatchOrchestrator;

pub type AppDispatcher = DispatchOrchestrator<Box<dyn Transport>, Box<dyn RateLimitStore>>;

pub struct AppState {
    pub dispatcher: AppDispatcher,
    pub config: AppConfig,
    pub health_cache: RwLock<Option<(i64, HealthResponse)>>,
}

impl AppState {
    pub fn new(config: &AppConfig) -> Result<Self, AppError> {
        let transport = build_transport(config)?;

        let store: Box<dyn RateLimitStore> = match config.redis_url.as_deref() {
            Some(url) => {
                let pool = deadpool_redis::Config::from_url(url)
                    .create_pool(Some(deadpool_redis::Runtime::Tokio1))
                    .map_err(|e| AppError::InternalError(format!("Redis pool creation error: {}", e)))?;
                tracing::info!("Rate limits stored in Redis");
                Box::new(RedisRateLimitStore::new(pool))
            }
            None => {
                tracing::info!("Rate limits stored in process memory");
                Box::new(InMemoryRateLimitStore::new())
            }
        };

        Ok(AppState::with_parts(config, transport, store))
    }

    /// Assembles state from an already-built transport and store.
    pub fn with_parts(
        config: &AppConfig,
        transport: Box<dyn Transport>,
        store: Box<dyn RateLimitStore>,
    ) -> Self {
        let rate_limiter = RateLimiter::new(store, config.rate_limit_policy());
        let dispatcher = DispatchOrchestrator::new(
            transport,
            rate_limiter,
            config.recipients(),
            config.rate_limit_identity,
        );

        AppState {
            dispatcher,
            config: config.clone(),
            health_cache: RwLock::new(None),
        }
    }
}
