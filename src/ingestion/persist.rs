use sea_orm::{ConnectionTrait, DbErr};
use serde::Serialize;
use utoipa::ToSchema;

use super::IngestionBatch;
use crate::funding::normalize_stage;
use crate::store::{self, NewCompany, NewRound};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, ToSchema)]
pub struct PersistOutcome {
    pub source_id: String,
    pub companies_created: usize,
    pub rounds_inserted: usize,
    /// Rounds whose source URL was already stored
    pub rounds_skipped: usize,
}

/// Store a batch: companies are matched by name, rounds are de-duplicated by source URL.
pub async fn persist_batch<C: ConnectionTrait>(db: &C, batch: &IngestionBatch) -> Result<PersistOutcome, DbErr> {
    let mut outcome = PersistOutcome {
        source_id: batch.source_id.clone(),
        ..Default::default()
    };

    for record in &batch.records {
        if let Some(url) = &record.source_url {
            if store::round_exists_for_url(db, url).await? {
                tracing::debug!("Skipping duplicate (already inserted?) source_url entry: {}", url);
                outcome.rounds_skipped += 1;
                continue;
            }
        }

        let (company, created) = store::find_or_create_company(
            db,
            NewCompany {
                name: record.company_name.clone(),
                category: record.category.clone(),
                description: record.description.clone(),
                ..Default::default()
            },
        )
        .await?;
        if created {
            outcome.companies_created += 1;
        }

        let inserted = store::insert_round(
            db,
            NewRound {
                company_id: company.id,
                stage: normalize_stage(&record.stage_text).as_str().to_string(),
                amount_usd: record.amount_usd,
                announced_on: record.announced_on,
                lead_investor: record.lead_investor.clone(),
                investors: None,
                source: Some(batch.source_name.clone()),
                source_url: record.source_url.clone(),
            },
        )
        .await;

        match inserted {
            Ok(_) => outcome.rounds_inserted += 1,
            Err(e) => {
                let msg = e.to_string().to_lowercase();
                if msg.contains("unique") || msg.contains("duplicate") {
                    tracing::warn!("Skipping duplicate round for {}: {}", record.company_name, e);
                    outcome.rounds_skipped += 1;
                } else {
                    return Err(e);
                }
            }
        }
    }

    tracing::info!(
        source = %outcome.source_id,
        inserted = outcome.rounds_inserted,
        skipped = outcome.rounds_skipped,
        companies = outcome.companies_created,
        "persisted ingestion batch"
    );
    Ok(outcome)
}
