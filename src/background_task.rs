use actix_web::web;
use chrono::Utc;
use tokio::time::interval;

use crate::{constants::PRUNE_INTERVAL, AppState};

/// Periodically forgets rate-limit identities that have gone quiet, so the
/// in-memory store does not grow for the life of the process.
pub async fn start_prune_task(state: web::Data<AppState>) {
    let mut interval = interval(PRUNE_INTERVAL);

    loop {
        interval.tick().await;

        match state.dispatcher.rate_limiter.prune(Utc::now()).await {
            Ok(0) => tracing::debug!("No idle rate-limit identities to prune"),
            Ok(count) => tracing::info!("Pruned {} idle rate-limit identities", count),
            Err(e) => tracing::error!("Rate-limit prune failed: {}", e),
        }
    }
}
