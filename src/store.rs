//! Database helpers shared by the HTTP handlers, the ingestion pipeline and the seed job.

use chrono::{NaiveDate, Utc};
use sea_orm::sea_query::{Expr, Func, SimpleExpr};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter, Set,
};

use crate::entities::{company, funding_round, Company, FundingRound};
use crate::funding::{classify_category, Category};

/// Prefix of the error returned when a round would push a company total past `i64::MAX`.
pub const TOTAL_OUT_OF_RANGE: &str = "funding total out of range";

/// Fields needed to create a company; the category is classified when not given.
#[derive(Debug, Clone, Default)]
pub struct NewCompany {
    pub name: String,
    pub category: Option<String>,
    pub description: Option<String>,
    pub headquarters: Option<String>,
    pub founded_year: Option<i32>,
    pub website: Option<String>,
    pub employee_count: Option<i32>,
}

#[derive(Debug, Clone)]
pub struct NewRound {
    pub company_id: i32,
    pub stage: String,
    pub amount_usd: Option<i64>,
    pub announced_on: Option<NaiveDate>,
    pub lead_investor: Option<String>,
    pub investors: Option<String>,
    pub source: Option<String>,
    pub source_url: Option<String>,
}

pub fn resolve_category(name: &str, description: Option<&str>, given: Option<&str>) -> String {
    match given.map(str::trim).filter(|c| !c.is_empty()) {
        Some(slug) => Category::from_slug(slug)
            .map(|c| c.as_str().to_string())
            .unwrap_or_else(|| slug.to_lowercase()),
        None => classify_category(name, description).as_str().to_string(),
    }
}

pub async fn insert_company<C: ConnectionTrait>(db: &C, new: NewCompany) -> Result<company::Model, DbErr> {
    let category = resolve_category(&new.name, new.description.as_deref(), new.category.as_deref());
    let now = Utc::now();
    let am = company::ActiveModel {
        name: Set(new.name.trim().to_string()),
        category: Set(category),
        description: Set(new.description),
        headquarters: Set(new.headquarters),
        founded_year: Set(new.founded_year),
        website: Set(new.website),
        employee_count: Set(new.employee_count),
        total_funding_usd: Set(None),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };
    am.insert(db).await
}

pub async fn find_company_by_name<C: ConnectionTrait>(db: &C, name: &str) -> Result<Option<company::Model>, DbErr> {
    Company::find()
        .filter(company::Column::Name.eq(name.trim()))
        .one(db)
        .await
}

/// Returns the company and whether it was created by this call.
pub async fn find_or_create_company<C: ConnectionTrait>(db: &C, new: NewCompany) -> Result<(company::Model, bool), DbErr> {
    if let Some(existing) = find_company_by_name(db, &new.name).await? {
        return Ok((existing, false));
    }
    Ok((insert_company(db, new).await?, true))
}

pub async fn round_exists_for_url<C: ConnectionTrait>(db: &C, url: &str) -> Result<bool, DbErr> {
    Ok(FundingRound::find()
        .filter(funding_round::Column::SourceUrl.eq(url))
        .one(db)
        .await?
        .is_some())
}

/// Insert a round and add its amount to the company's running total.
///
/// The total is bumped with a single `UPDATE ... SET total = COALESCE(total, 0) + amount`
/// so concurrent inserts for one company never lose an increment.
pub async fn insert_round<C: ConnectionTrait>(db: &C, new: NewRound) -> Result<funding_round::Model, DbErr> {
    let company = Company::find_by_id(new.company_id)
        .one(db)
        .await?
        .ok_or_else(|| DbErr::RecordNotFound(format!("company {}", new.company_id)))?;

    if let Some(amount) = new.amount_usd {
        if company.total_funding_usd.unwrap_or(0).checked_add(amount).is_none() {
            return Err(DbErr::Custom(format!("{} for company {}", TOTAL_OUT_OF_RANGE, company.id)));
        }
    }

    let round = funding_round::ActiveModel {
        company_id: Set(new.company_id),
        stage: Set(new.stage),
        amount_usd: Set(new.amount_usd),
        announced_on: Set(new.announced_on),
        lead_investor: Set(new.lead_investor),
        investors: Set(new.investors),
        source: Set(new.source),
        source_url: Set(new.source_url),
        created_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(db)
    .await?;

    if let Some(amount) = round.amount_usd {
        let current: [SimpleExpr; 2] = [
            Expr::col(company::Column::TotalFundingUsd).into(),
            Expr::val(0i64).into(),
        ];
        Company::update_many()
            .col_expr(company::Column::TotalFundingUsd, Expr::expr(Func::coalesce(current)).add(amount))
            .col_expr(company::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(company::Column::Id.eq(round.company_id))
            .exec(db)
            .await?;
    }

    Ok(round)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connect_database;

    fn round(company_id: i32, amount_usd: Option<i64>) -> NewRound {
        NewRound {
            company_id,
            stage: "growth".to_string(),
            amount_usd,
            announced_on: None,
            lead_investor: None,
            investors: None,
            source: Some("manual".to_string()),
            source_url: None,
        }
    }

    async fn company_named(db: &sea_orm::DatabaseConnection, name: &str) -> company::Model {
        insert_company(
            db,
            NewCompany {
                name: name.to_string(),
                ..Default::default()
            },
        )
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn totals_accumulate_across_rounds() {
        let db = connect_database("sqlite::memory:").await.unwrap();
        let company = company_named(&db, "Ledgerline").await;

        insert_round(&db, round(company.id, Some(3_000_000))).await.unwrap();
        insert_round(&db, round(company.id, None)).await.unwrap();
        insert_round(&db, round(company.id, Some(7_000_000))).await.unwrap();

        let reloaded = Company::find_by_id(company.id).one(&db).await.unwrap().unwrap();
        assert_eq!(reloaded.total_funding_usd, Some(10_000_000));
    }

    #[tokio::test]
    async fn total_overflow_is_rejected_without_storing_the_round() {
        let db = connect_database("sqlite::memory:").await.unwrap();
        let company = company_named(&db, "Overreach Labs").await;

        insert_round(&db, round(company.id, Some(5_000_000_000_000_000_000))).await.unwrap();
        let err = insert_round(&db, round(company.id, Some(5_000_000_000_000_000_000)))
            .await
            .unwrap_err();
        assert!(err.to_string().contains(TOTAL_OUT_OF_RANGE));

        let rounds = FundingRound::find()
            .filter(funding_round::Column::CompanyId.eq(company.id))
            .all(&db)
            .await
            .unwrap();
        assert_eq!(rounds.len(), 1);
        let reloaded = Company::find_by_id(company.id).one(&db).await.unwrap().unwrap();
        assert_eq!(reloaded.total_funding_usd, Some(5_000_000_000_000_000_000));
    }

    #[tokio::test]
    async fn concurrent_rounds_keep_every_increment() {
        let db = connect_database("sqlite::memory:").await.unwrap();
        let company = company_named(&db, "Parallax Security").await;

        let inserts = (0..8).map(|_| insert_round(&db, round(company.id, Some(1_000_000))));
        for result in futures::future::join_all(inserts).await {
            result.unwrap();
        }

        let reloaded = Company::find_by_id(company.id).one(&db).await.unwrap().unwrap();
        assert_eq!(reloaded.total_funding_usd, Some(8_000_000));
    }

    #[test]
    fn resolve_category_prefers_given_slug() {
        assert_eq!(resolve_category("Anything", None, Some("endpoint")), "endpoint");
        assert_eq!(resolve_category("Anything", None, Some("  Quantum ")), "quantum");
        assert_eq!(
            resolve_category("Vaultline", Some("DLP and encryption for SaaS data"), None),
            "data-security"
        );
        assert_eq!(resolve_category("Plain", None, Some("")), "other");
    }
}
