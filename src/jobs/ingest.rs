use sea_orm::DatabaseConnection;

use crate::ingestion::{persist_batch, AdapterRegistry, PersistOutcome};

/// Fetch every registered source concurrently and persist the results.
///
/// A failing source is logged and left out of the returned outcomes so that one
/// bad batch does not hold back the rest.
pub async fn run_ingestion(db: &DatabaseConnection, registry: &AdapterRegistry) -> Vec<PersistOutcome> {
    let batches = registry.fetch_all().await;
    let mut outcomes = Vec::with_capacity(batches.len());

    for batch in &batches {
        match persist_batch(db, batch).await {
            Ok(outcome) => outcomes.push(outcome),
            Err(e) => tracing::error!(source = %batch.source_id, "persisting batch failed: {}", e),
        }
    }

    let inserted: usize = outcomes.iter().map(|o| o.rounds_inserted).sum();
    tracing::info!(sources = outcomes.len(), inserted, "ingestion run finished");
    outcomes
}
