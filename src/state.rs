use sea_orm::DatabaseConnection;
use std::sync::Arc;

use crate::ai::AiClient;
use crate::cache::TimedCache;
use crate::config::AppConfig;
use crate::ingestion::AdapterRegistry;
use crate::protection::Protector;
use crate::routes::dashboard::DashboardMetrics;

/// Shared application state, cloned into every handler.
#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub registry: AdapterRegistry,
    pub ai: AiClient,
    pub protector: Arc<Protector>,
    pub dashboard_cache: Arc<TimedCache<DashboardMetrics>>,
}

impl AppState {
    pub fn new(config: &AppConfig, db: DatabaseConnection) -> Result<Self, reqwest::Error> {
        Ok(Self {
            db,
            registry: AdapterRegistry::with_defaults(config.ingestion_delay),
            ai: AiClient::new(config.ai.clone(), config.ai_deployment.clone())?,
            protector: Arc::new(Protector::with_iterations(
                config.protection_secret.clone(),
                config.protection_iterations,
            )),
            dashboard_cache: Arc::new(TimedCache::new(config.market_cache_ttl)),
        })
    }

    /// Drop cached dashboard figures after a write.
    pub async fn invalidate_dashboard(&self) {
        self.dashboard_cache.invalidate().await;
    }
}
