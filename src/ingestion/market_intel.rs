use async_trait::async_trait;
use chrono::{Duration as ChronoDuration, Utc};
use rand::Rng;
use std::time::Duration;

use super::{batch, DataSourceAdapter, IngestionBatch, IngestionRecord, SourceKind};

/// Largest relative change applied to a canned amount.
pub const MAX_JITTER: f64 = 0.10;

struct Deal {
    company: &'static str,
    summary: &'static str,
    category: &'static str,
    stage: &'static str,
    base_amount: i64,
    lead: &'static str,
    days_ago: i64,
    slug: &'static str,
}

const CRUNCHBASE: &[Deal] = &[
    Deal { company: "Keystone Identity", summary: "Passwordless authentication platform", category: "identity", stage: "Series A", base_amount: 24_000_000, lead: "Northgate Capital", days_ago: 12, slug: "keystone-identity-series-a" },
    Deal { company: "Sentinel Mesh", summary: "Managed detection and response for mid-market SOC teams", category: "security-operations", stage: "Series B", base_amount: 45_000_000, lead: "Granite Growth", days_ago: 34, slug: "sentinel-mesh-series-b" },
    Deal { company: "Cipherwell", summary: "Data security posture management", category: "data-security", stage: "Seed", base_amount: 7_000_000, lead: "Harbor Ventures", days_ago: 61, slug: "cipherwell-seed" },
];

const PITCHBOOK: &[Deal] = &[
    Deal { company: "Stratus Shield", summary: "Agentless CNAPP", category: "cloud-security", stage: "Series B", base_amount: 60_000_000, lead: "Summit Ridge", days_ago: 20, slug: "stratus-shield-series-b" },
    Deal { company: "Ironclad Edge", summary: "SASE and zero trust network access", category: "network-security", stage: "Series C", base_amount: 110_000_000, lead: "Atlas Crossover", days_ago: 140, slug: "ironclad-edge-series-c" },
];

const CB_INSIGHTS: &[Deal] = &[
    Deal { company: "Tidewatch", summary: "Attack surface management", category: "threat-intel", stage: "Series A", base_amount: 19_000_000, lead: "Bluewater Partners", days_ago: 45, slug: "tidewatch-series-a" },
    Deal { company: "Auditrail", summary: "GRC automation for regulated industries", category: "governance-risk", stage: "Seed", base_amount: 5_500_000, lead: "Foundry Seed", days_ago: 200, slug: "auditrail-seed" },
];

/// A market-intelligence feed returning recent funding deals with jittered amounts.
pub struct MarketIntelAdapter {
    id: &'static str,
    name: &'static str,
    description: &'static str,
    deals: &'static [Deal],
    delay: Duration,
}

impl MarketIntelAdapter {
    pub fn all(delay: Duration) -> Vec<MarketIntelAdapter> {
        vec![
            MarketIntelAdapter { id: "crunchbase", name: "Crunchbase", description: "Funding rounds from the Crunchbase feed", deals: CRUNCHBASE, delay },
            MarketIntelAdapter { id: "pitchbook", name: "PitchBook", description: "Venture deals from PitchBook", deals: PITCHBOOK, delay },
            MarketIntelAdapter { id: "cb-insights", name: "CB Insights", description: "Cybersecurity deal tracker from CB Insights", deals: CB_INSIGHTS, delay },
        ]
    }
}

/// Scale `base` by a random factor in `[1 - MAX_JITTER, 1 + MAX_JITTER]`.
pub fn jitter<R: Rng + ?Sized>(rng: &mut R, base: i64) -> i64 {
    let factor = 1.0 + rng.gen_range(-MAX_JITTER..=MAX_JITTER);
    (base as f64 * factor).round() as i64
}

fn format_millions(amount: i64) -> String {
    format!("${:.1}M", amount as f64 / 1_000_000.0)
}

#[async_trait]
impl DataSourceAdapter for MarketIntelAdapter {
    fn id(&self) -> &'static str {
        self.id
    }

    fn name(&self) -> &'static str {
        self.name
    }

    fn kind(&self) -> SourceKind {
        SourceKind::MarketIntel
    }

    fn description(&self) -> &'static str {
        self.description
    }

    async fn fetch(&self) -> IngestionBatch {
        tracing::debug!(source = self.id, "fetching market intel deals");
        tokio::time::sleep(self.delay).await;

        let today = Utc::now().date_naive();
        // ThreadRng is not Send, so it must not live across an await.
        let records = {
            let mut rng = rand::thread_rng();
            self.deals
                .iter()
                .map(|d| {
                    let amount = jitter(&mut rng, d.base_amount);
                    IngestionRecord {
                        company_name: d.company.to_string(),
                        description: Some(d.summary.to_string()),
                        category: Some(d.category.to_string()),
                        stage_text: d.stage.to_string(),
                        amount_text: Some(format_millions(amount)),
                        amount_usd: Some(amount),
                        announced_on: Some(today - ChronoDuration::days(d.days_ago)),
                        lead_investor: Some(d.lead.to_string()),
                        source_url: Some(format!("https://{}.example/deals/{}", self.id, d.slug)),
                    }
                })
                .collect()
        };
        batch(self, records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn jitter_stays_within_bounds() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..1_000 {
            let v = jitter(&mut rng, 10_000_000);
            assert!((9_000_000..=11_000_000).contains(&v), "{} out of range", v);
        }
    }

    #[tokio::test]
    async fn deals_are_recent_and_perturbed_within_bounds() {
        let adapters = MarketIntelAdapter::all(Duration::ZERO);
        let crunchbase = adapters.iter().find(|a| a.id() == "crunchbase").unwrap();
        let batch = crunchbase.fetch().await;

        assert_eq!(batch.kind, SourceKind::MarketIntel);
        assert_eq!(batch.records.len(), CRUNCHBASE.len());
        for (record, deal) in batch.records.iter().zip(CRUNCHBASE) {
            let amount = record.amount_usd.unwrap() as f64;
            let base = deal.base_amount as f64;
            assert!((amount - base).abs() <= base * MAX_JITTER + 1.0);
            assert!(record.announced_on.unwrap() <= Utc::now().date_naive());
        }
    }

    #[test]
    fn formats_amount_text_in_millions() {
        assert_eq!(format_millions(24_350_000), "$24.4M");
    }
}
