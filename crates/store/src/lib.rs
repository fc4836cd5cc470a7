//! Persistence for finished analyses: Redis when configured and reachable,
//! otherwise an in-process log. The choice is made once at startup.

#![warn(clippy::unwrap_used)]

pub mod memory;
pub mod redis_store;

pub use memory::MemorySaleStore;
pub use redis_store::RedisSaleStore;

use attribution_core::config::StoreConfig;
use attribution_core::SaleStore;
use std::sync::Arc;
use tracing::{info, warn};

/// Resolve the store backend from configuration.
pub async fn resolve_store(config: &StoreConfig) -> Arc<dyn SaleStore> {
    if let Some(url) = config.redis_url.as_deref().filter(|u| !u.trim().is_empty()) {
        match RedisSaleStore::connect(url, config).await {
            Ok(store) => return Arc::new(store),
            Err(e) => {
                warn!(error = %e, "Redis unavailable, falling back to in-memory sale log");
            }
        }
    } else {
        info!("No durable store configured, using in-memory sale log");
    }
    Arc::new(MemorySaleStore::new())
}
