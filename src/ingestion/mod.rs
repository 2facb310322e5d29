//! Simulated data-source adapters and the pipeline that stores what they return.
//!
//! Adapters stand in for conference showcases and market-intelligence feeds.
//! They return canned records after an artificial delay; nothing is parsed
//! and nothing is retried.

pub mod conferences;
pub mod market_intel;
pub mod persist;
pub mod registry;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

pub use persist::{persist_batch, PersistOutcome};
pub use registry::AdapterRegistry;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "kebab-case")]
pub enum SourceKind {
    Conference,
    MarketIntel,
}

/// One startup / funding signal as reported by a source.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct IngestionRecord {
    pub company_name: String,
    pub description: Option<String>,
    pub category: Option<String>,
    /// Stage exactly as the source phrases it, e.g. "Series A"
    pub stage_text: String,
    /// Amount exactly as the source phrases it, e.g. "$12.5M"
    pub amount_text: Option<String>,
    pub amount_usd: Option<i64>,
    pub announced_on: Option<NaiveDate>,
    pub lead_investor: Option<String>,
    pub source_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct IngestionBatch {
    pub source_id: String,
    pub source_name: String,
    pub kind: SourceKind,
    pub fetched_at: DateTime<Utc>,
    /// Always true: every adapter serves simulated data
    pub simulated: bool,
    pub records: Vec<IngestionRecord>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SourceInfo {
    pub id: String,
    pub name: String,
    pub kind: SourceKind,
    pub description: String,
}

#[async_trait]
pub trait DataSourceAdapter: Send + Sync + 'static {
    fn id(&self) -> &'static str;
    fn name(&self) -> &'static str;
    fn kind(&self) -> SourceKind;
    fn description(&self) -> &'static str;

    async fn fetch(&self) -> IngestionBatch;

    fn info(&self) -> SourceInfo {
        SourceInfo {
            id: self.id().to_string(),
            name: self.name().to_string(),
            kind: self.kind(),
            description: self.description().to_string(),
        }
    }
}

pub(crate) fn batch(adapter: &dyn DataSourceAdapter, records: Vec<IngestionRecord>) -> IngestionBatch {
    IngestionBatch {
        source_id: adapter.id().to_string(),
        source_name: adapter.name().to_string(),
        kind: adapter.kind(),
        fetched_at: Utc::now(),
        simulated: true,
        records,
    }
}
