//! Fixture data for local development and demos.

use chrono::{NaiveDate, Utc};
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, Set, TransactionTrait};
use serde::Serialize;

use crate::entities::{acquisition, portfolio_company, team_member, PortfolioCompany};
use crate::store::{self, NewCompany, NewRound};

struct SeedCompany {
    name: &'static str,
    category: &'static str,
    description: &'static str,
    headquarters: &'static str,
    founded_year: i32,
    website: &'static str,
    employee_count: i32,
    rounds: &'static [SeedRound],
    team: &'static [(&'static str, &'static str)],
}

struct SeedRound {
    stage: &'static str,
    amount_usd: i64,
    announced_on: (i32, u32, u32),
    lead_investor: &'static str,
    investors: &'static str,
}

const COMPANIES: &[SeedCompany] = &[
    SeedCompany {
        name: "Keystone Identity",
        category: "identity",
        description: "Passwordless authentication and identity governance for mid-market enterprises.",
        headquarters: "Austin, TX",
        founded_year: 2019,
        website: "https://keystone-identity.example",
        employee_count: 140,
        rounds: &[
            SeedRound {
                stage: "seed",
                amount_usd: 4_500_000,
                announced_on: (2020, 3, 12),
                lead_investor: "Ridgeline Ventures",
                investors: "Ridgeline Ventures, Northbeam Capital",
            },
            SeedRound {
                stage: "series-a",
                amount_usd: 18_000_000,
                announced_on: (2022, 6, 2),
                lead_investor: "Harbor Point Partners",
                investors: "Harbor Point Partners, Ridgeline Ventures",
            },
        ],
        team: &[("Dana Whitfield", "CEO"), ("Arjun Mehta", "CTO")],
    },
    SeedCompany {
        name: "Cinder Cloud Security",
        category: "cloud-security",
        description: "Agentless cloud posture management and workload protection across AWS, Azure and GCP.",
        headquarters: "Tel Aviv, Israel",
        founded_year: 2018,
        website: "https://cindercloud.example",
        employee_count: 310,
        rounds: &[
            SeedRound {
                stage: "series-b",
                amount_usd: 55_000_000,
                announced_on: (2021, 9, 20),
                lead_investor: "Northbeam Capital",
                investors: "Northbeam Capital, Atlas Growth",
            },
            SeedRound {
                stage: "series-c",
                amount_usd: 120_000_000,
                announced_on: (2023, 4, 18),
                lead_investor: "Atlas Growth",
                investors: "Atlas Growth, Harbor Point Partners",
            },
        ],
        team: &[("Noa Levi", "CEO"), ("Eitan Barak", "VP Engineering")],
    },
    SeedCompany {
        name: "Sentinel Grid",
        category: "endpoint",
        description: "Endpoint detection and response for operational technology networks.",
        headquarters: "Arlington, VA",
        founded_year: 2020,
        website: "https://sentinelgrid.example",
        employee_count: 75,
        rounds: &[SeedRound {
            stage: "series-a",
            amount_usd: 22_000_000,
            announced_on: (2023, 11, 7),
            lead_investor: "Ridgeline Ventures",
            investors: "Ridgeline Ventures",
        }],
        team: &[("Marcus Hale", "CEO")],
    },
    SeedCompany {
        name: "Quill Data Guard",
        category: "data-security",
        description: "Data loss prevention and sensitive data discovery for SaaS applications.",
        headquarters: "London, UK",
        founded_year: 2021,
        website: "https://quilldataguard.example",
        employee_count: 42,
        rounds: &[SeedRound {
            stage: "seed",
            amount_usd: 6_000_000,
            announced_on: (2022, 2, 14),
            lead_investor: "Harbor Point Partners",
            investors: "Harbor Point Partners, Brightwater Angels",
        }],
        team: &[("Priya Nair", "CEO"), ("Tom Ellison", "Head of Product")],
    },
    SeedCompany {
        name: "Tidewatch Networks",
        category: "network-security",
        description: "Zero trust network access and managed firewall for distributed teams.",
        headquarters: "Denver, CO",
        founded_year: 2016,
        website: "https://tidewatch.example",
        employee_count: 220,
        rounds: &[SeedRound {
            stage: "series-b",
            amount_usd: 40_000_000,
            announced_on: (2019, 10, 1),
            lead_investor: "Atlas Growth",
            investors: "Atlas Growth",
        }],
        team: &[("Grace Okafor", "CEO")],
    },
];

/// Acquirer, target company, amount and announcement date.
const ACQUISITION: (&str, &str, i64, (i32, u32, u32)) =
    ("Cinder Cloud Security", "Tidewatch Networks", 180_000_000, (2024, 5, 21));

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct SeedOutcome {
    pub companies_created: usize,
    pub companies_skipped: usize,
    pub rounds_inserted: usize,
}

fn date((y, m, d): (i32, u32, u32)) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(y, m, d)
}

/// Insert the fixture companies and everything hanging off them.
///
/// Companies that already exist by name are left alone, together with their
/// rounds and team, so running this twice changes nothing.
pub async fn seed_database(db: &DatabaseConnection) -> Result<SeedOutcome, DbErr> {
    let txn = db.begin().await?;
    let mut outcome = SeedOutcome::default();
    let now = Utc::now();

    for seed in COMPANIES {
        if store::find_company_by_name(&txn, seed.name).await?.is_some() {
            outcome.companies_skipped += 1;
            continue;
        }

        let company = store::insert_company(
            &txn,
            NewCompany {
                name: seed.name.to_string(),
                category: Some(seed.category.to_string()),
                description: Some(seed.description.to_string()),
                headquarters: Some(seed.headquarters.to_string()),
                founded_year: Some(seed.founded_year),
                website: Some(seed.website.to_string()),
                employee_count: Some(seed.employee_count),
            },
        )
        .await?;
        outcome.companies_created += 1;

        for round in seed.rounds {
            store::insert_round(
                &txn,
                NewRound {
                    company_id: company.id,
                    stage: round.stage.to_string(),
                    amount_usd: Some(round.amount_usd),
                    announced_on: date(round.announced_on),
                    lead_investor: Some(round.lead_investor.to_string()),
                    investors: Some(round.investors.to_string()),
                    source: Some("seed".to_string()),
                    source_url: None,
                },
            )
            .await?;
            outcome.rounds_inserted += 1;

            for investor in round.investors.split(',').map(str::trim) {
                // An investor returning for a later round keeps its first link
                let linked = PortfolioCompany::find()
                    .filter(portfolio_company::Column::InvestorName.eq(investor))
                    .filter(portfolio_company::Column::CompanyId.eq(company.id))
                    .one(&txn)
                    .await?
                    .is_some();
                if linked {
                    continue;
                }
                portfolio_company::ActiveModel {
                    investor_name: Set(investor.to_string()),
                    company_id: Set(company.id),
                    invested_on: Set(date(round.announced_on)),
                    created_at: Set(now),
                    ..Default::default()
                }
                .insert(&txn)
                .await?;
            }
        }

        for (name, title) in seed.team {
            team_member::ActiveModel {
                company_id: Set(company.id),
                name: Set(name.to_string()),
                title: Set(title.to_string()),
                linkedin_url: Set(None),
                created_at: Set(now),
                ..Default::default()
            }
            .insert(&txn)
            .await?;
        }
    }

    let (acquirer, target, amount, announced) = ACQUISITION;
    if outcome.companies_created > 0 {
        if let Some(target) = store::find_company_by_name(&txn, target).await? {
            acquisition::ActiveModel {
                acquirer_name: Set(acquirer.to_string()),
                target_company_id: Set(target.id),
                amount_usd: Set(Some(amount)),
                announced_on: Set(date(announced)),
                created_at: Set(now),
                ..Default::default()
            }
            .insert(&txn)
            .await?;
        }
    }

    txn.commit().await?;
    tracing::info!(
        created = outcome.companies_created,
        skipped = outcome.companies_skipped,
        rounds = outcome.rounds_inserted,
        "seed finished"
    );
    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connect_database;
    use crate::entities::{Acquisition, Company};
    use sea_orm::PaginatorTrait;

    #[tokio::test]
    async fn seeding_is_idempotent() {
        let db = connect_database("sqlite::memory:").await.unwrap();

        let first = seed_database(&db).await.unwrap();
        assert_eq!(first.companies_created, COMPANIES.len());
        assert_eq!(first.rounds_inserted, 7);

        let second = seed_database(&db).await.unwrap();
        assert_eq!(second.companies_created, 0);
        assert_eq!(second.companies_skipped, COMPANIES.len());

        assert_eq!(Company::find().count(&db).await.unwrap(), COMPANIES.len() as u64);
        assert_eq!(Acquisition::find().count(&db).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn company_totals_match_seeded_rounds() {
        let db = connect_database("sqlite::memory:").await.unwrap();
        seed_database(&db).await.unwrap();

        let keystone = store::find_company_by_name(&db, "Keystone Identity").await.unwrap().unwrap();
        assert_eq!(keystone.total_funding_usd, Some(22_500_000));
        assert_eq!(keystone.category, "identity");
    }
}
