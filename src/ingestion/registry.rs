use futures::future::join_all;
use std::sync::Arc;
use std::time::Duration;
use tracing::Instrument;

use super::conferences::ConferenceAdapter;
use super::market_intel::MarketIntelAdapter;
use super::{DataSourceAdapter, IngestionBatch, SourceInfo, SourceKind};

#[derive(Clone)]
pub struct AdapterRegistry {
    adapters: Vec<Arc<dyn DataSourceAdapter>>,
}

impl AdapterRegistry {
    pub fn new(adapters: Vec<Arc<dyn DataSourceAdapter>>) -> Self {
        Self { adapters }
    }

    /// Every built-in conference and market-intel adapter.
    pub fn with_defaults(delay: Duration) -> Self {
        let mut adapters: Vec<Arc<dyn DataSourceAdapter>> = Vec::new();
        for a in ConferenceAdapter::all(delay) {
            adapters.push(Arc::new(a));
        }
        for a in MarketIntelAdapter::all(delay) {
            adapters.push(Arc::new(a));
        }
        Self::new(adapters)
    }

    pub fn get(&self, id: &str) -> Option<Arc<dyn DataSourceAdapter>> {
        self.adapters.iter().find(|a| a.id() == id).cloned()
    }

    pub fn list(&self) -> Vec<SourceInfo> {
        self.adapters.iter().map(|a| a.info()).collect()
    }

    pub fn of_kind(&self, kind: SourceKind) -> Vec<Arc<dyn DataSourceAdapter>> {
        self.adapters.iter().filter(|a| a.kind() == kind).cloned().collect()
    }

    /// Fetch from every adapter of `kind` concurrently, in registration order.
    pub async fn fetch_kind(&self, kind: SourceKind) -> Vec<IngestionBatch> {
        let adapters = self.of_kind(kind);
        let fetches = adapters.iter().map(|a| {
            let span = tracing::info_span!("fetch_source", source = a.id());
            a.fetch().instrument(span)
        });
        join_all(fetches).await
    }

    pub async fn fetch_all(&self) -> Vec<IngestionBatch> {
        let fetches = self.adapters.iter().map(|a| a.fetch());
        join_all(fetches).await
    }
}
