use async_trait::async_trait;
use chrono::NaiveDate;
use std::time::Duration;

use super::{batch, DataSourceAdapter, IngestionBatch, IngestionRecord, SourceKind};
use crate::funding::parse_amount;

struct Showcase {
    company: &'static str,
    pitch: &'static str,
    stage: &'static str,
    amount: Option<&'static str>,
    lead: Option<&'static str>,
    date: (i32, u32, u32),
    slug: &'static str,
}

const RSA_SANDBOX: &[Showcase] = &[
    Showcase { company: "Keystone Identity", pitch: "Passwordless authentication and SSO for the hybrid workforce", stage: "Seed", amount: Some("$6.5M"), lead: Some("Harbor Ventures"), date: (2025, 4, 28), slug: "keystone-identity" },
    Showcase { company: "Stratus Shield", pitch: "Agentless CNAPP for Kubernetes and container workloads", stage: "Series A", amount: Some("$22M"), lead: Some("Northgate Capital"), date: (2025, 4, 28), slug: "stratus-shield" },
    Showcase { company: "Lattice Guard", pitch: "Software supply chain security and SAST for AI-generated code", stage: "Seed", amount: Some("$4M"), lead: None, date: (2025, 4, 28), slug: "lattice-guard" },
];

const BLACK_HAT: &[Showcase] = &[
    Showcase { company: "Tidewatch", pitch: "Attack surface management with continuous exposure validation", stage: "Series A", amount: Some("$18M"), lead: Some("Bluewater Partners"), date: (2025, 8, 6), slug: "tidewatch" },
    Showcase { company: "Vaultline", pitch: "DLP and encryption for SaaS data at rest", stage: "Pre-Seed", amount: Some("$1.8M"), lead: None, date: (2025, 8, 6), slug: "vaultline" },
];

const DEF_CON: &[Showcase] = &[
    Showcase { company: "Packet Lantern", pitch: "Network detection and microsegmentation for OT environments", stage: "Seed", amount: Some("$3.2M"), lead: Some("Foundry Seed"), date: (2025, 8, 9), slug: "packet-lantern" },
    Showcase { company: "Honeycomb Labs", pitch: "Deception-based detection and incident response for the SOC", stage: "Seed", amount: None, lead: None, date: (2025, 8, 9), slug: "honeycomb-labs" },
];

const BSIDES: &[Showcase] = &[
    Showcase { company: "Ledgerproof", pitch: "Continuous compliance and third-party risk automation", stage: "Pre-Seed", amount: Some("$900K"), lead: None, date: (2025, 5, 17), slug: "ledgerproof" },
    Showcase { company: "Endpoint Atlas", pitch: "Lightweight EDR for unmanaged devices", stage: "Angel", amount: Some("$650K"), lead: None, date: (2025, 5, 17), slug: "endpoint-atlas" },
];

/// A startup showcase from a security conference.
pub struct ConferenceAdapter {
    id: &'static str,
    name: &'static str,
    description: &'static str,
    showcase: &'static [Showcase],
    delay: Duration,
}

impl ConferenceAdapter {
    pub fn all(delay: Duration) -> Vec<ConferenceAdapter> {
        vec![
            ConferenceAdapter { id: "rsa-conference", name: "RSA Conference Innovation Sandbox", description: "Finalists of the RSAC Innovation Sandbox contest", showcase: RSA_SANDBOX, delay },
            ConferenceAdapter { id: "black-hat", name: "Black Hat Startup Spotlight", description: "Startups presenting at the Black Hat USA Startup Spotlight", showcase: BLACK_HAT, delay },
            ConferenceAdapter { id: "def-con", name: "DEF CON Demo Labs", description: "Companies behind DEF CON Demo Labs tools", showcase: DEF_CON, delay },
            ConferenceAdapter { id: "bsides", name: "BSides Startup Alley", description: "Early-stage startups from regional BSides events", showcase: BSIDES, delay },
        ]
    }

    fn record(&self, s: &Showcase) -> IngestionRecord {
        let (y, m, d) = s.date;
        IngestionRecord {
            company_name: s.company.to_string(),
            description: Some(s.pitch.to_string()),
            category: None,
            stage_text: s.stage.to_string(),
            amount_text: s.amount.map(str::to_string),
            amount_usd: s.amount.and_then(parse_amount),
            announced_on: NaiveDate::from_ymd_opt(y, m, d),
            lead_investor: s.lead.map(str::to_string),
            source_url: Some(format!("https://{}.example/showcase/{}/{}", self.id, y, s.slug)),
        }
    }
}

#[async_trait]
impl DataSourceAdapter for ConferenceAdapter {
    fn id(&self) -> &'static str {
        self.id
    }

    fn name(&self) -> &'static str {
        self.name
    }

    fn kind(&self) -> SourceKind {
        SourceKind::Conference
    }

    fn description(&self) -> &'static str {
        self.description
    }

    async fn fetch(&self) -> IngestionBatch {
        tracing::debug!(source = self.id, "fetching conference showcase");
        tokio::time::sleep(self.delay).await;
        let records = self.showcase.iter().map(|s| self.record(s)).collect();
        batch(self, records)
    }
}
