use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, QueryOrder, TransactionTrait};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::entities::{funding_round, Company, FundingRound};
use crate::error::AppError;
use crate::funding::{normalize_stage, parse_amount, summarize, FundingPoint, FundingStage, FundingSummary};
use crate::response::{created, ok, ApiResponse, ApiResult};
use crate::routes::companies::parse_date;
use crate::state::AppState;
use crate::store::{self, NewCompany, NewRound};

/// Largest single round accepted from a manual entry (one trillion USD).
pub const MAX_ROUND_USD: i64 = 1_000_000_000_000;

#[derive(Debug, Serialize, ToSchema)]
pub struct FundingRoundDto {
    pub id: i32,
    pub company_id: i32,
    /// Canonical stage slug, e.g. "series-a"
    pub stage: String,
    pub early_stage: bool,
    pub amount_usd: Option<i64>,
    pub announced_on: Option<NaiveDate>,
    pub lead_investor: Option<String>,
    pub investors: Vec<String>,
    pub source: Option<String>,
    pub source_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<funding_round::Model> for FundingRoundDto {
    fn from(m: funding_round::Model) -> Self {
        let investors = m
            .investors
            .as_deref()
            .map(|s| {
                s.split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();
        Self {
            id: m.id,
            company_id: m.company_id,
            early_stage: normalize_stage(&m.stage).is_early_stage(),
            stage: m.stage,
            amount_usd: m.amount_usd,
            announced_on: m.announced_on,
            lead_investor: m.lead_investor,
            investors,
            source: m.source,
            source_url: m.source_url,
            created_at: m.created_at,
        }
    }
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct FundingQuery {
    company_id: Option<i32>,
    /// Stage in any phrasing ("Series A", "series-a")
    stage: Option<String>,
    /// Calendar year of the announcement
    year: Option<i32>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateFundingRequest {
    /// Existing company; either this or `company_name` is required
    pub company_id: Option<i32>,
    /// Company to attach the round to, created when it does not exist
    pub company_name: Option<String>,
    pub stage: String,
    pub amount_usd: Option<i64>,
    /// Free-text amount such as "$12.5M", parsed when `amount_usd` is absent
    pub amount_text: Option<String>,
    /// YYYY-MM-DD
    pub announced_on: Option<String>,
    pub lead_investor: Option<String>,
    #[serde(default)]
    pub investors: Vec<String>,
    pub source: Option<String>,
    pub source_url: Option<String>,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct SummaryQuery {
    /// Number of companies in the ranking (default 10, max 100)
    top: Option<usize>,
}

/// List funding rounds
#[utoipa::path(
    get,
    path = "/api/funding",
    params(FundingQuery),
    responses(
        (status = 200, description = "Funding rounds, newest first", body = Vec<FundingRoundDto>),
        (status = 422, description = "Invalid year")
    ),
    tag = "funding"
)]
pub async fn list_funding(
    State(state): State<AppState>,
    Query(query): Query<FundingQuery>,
) -> ApiResult<Vec<FundingRoundDto>> {
    let mut select = FundingRound::find();
    if let Some(company_id) = query.company_id {
        select = select.filter(funding_round::Column::CompanyId.eq(company_id));
    }
    if let Some(stage) = query.stage.as_deref().filter(|s| !s.is_empty()) {
        select = select.filter(funding_round::Column::Stage.eq(normalize_stage(stage).as_str()));
    }
    if let Some(year) = query.year {
        let (start, end) = match (NaiveDate::from_ymd_opt(year, 1, 1), NaiveDate::from_ymd_opt(year, 12, 31)) {
            (Some(s), Some(e)) => (s, e),
            _ => return Err(AppError::UnprocessableEntity(format!("year {} is out of range", year))),
        };
        select = select.filter(funding_round::Column::AnnouncedOn.between(start, end));
    }

    let rounds = select
        .order_by_desc(funding_round::Column::AnnouncedOn)
        .order_by_desc(funding_round::Column::Id)
        .all(&state.db)
        .await?;
    ok(rounds.into_iter().map(FundingRoundDto::from).collect())
}

/// Manually record a funding round
#[utoipa::path(
    post,
    path = "/api/funding",
    request_body = CreateFundingRequest,
    responses(
        (status = 201, description = "Round recorded", body = FundingRoundDto),
        (status = 400, description = "No company given"),
        (status = 404, description = "company_id does not exist"),
        (status = 409, description = "source_url already recorded"),
        (status = 422, description = "Invalid amount or date")
    ),
    tag = "funding"
)]
#[tracing::instrument(skip_all)]
pub async fn create_funding(
    State(state): State<AppState>,
    Json(req): Json<CreateFundingRequest>,
) -> Result<(StatusCode, Json<ApiResponse<FundingRoundDto>>), AppError> {
    let amount = match (req.amount_usd, req.amount_text.as_deref()) {
        (Some(a), _) => Some(a),
        (None, Some(text)) => Some(parse_amount(text).ok_or_else(|| {
            AppError::UnprocessableEntity(format!("could not read an amount from {:?}", text))
        })?),
        (None, None) => None,
    };
    if amount.is_some_and(|a| a < 0) {
        return Err(AppError::UnprocessableEntity("amount cannot be negative".to_string()));
    }
    if amount.is_some_and(|a| a > MAX_ROUND_USD) {
        return Err(AppError::UnprocessableEntity(format!(
            "amount cannot exceed {} USD",
            MAX_ROUND_USD
        )));
    }
    let announced_on = parse_date("announced_on", req.announced_on.as_deref())?;

    // A company created for this entry must not outlive a rejected round
    let txn = state.db.begin().await?;
    let company = match (req.company_id, req.company_name.as_deref().map(str::trim)) {
        (Some(id), _) => Company::find_by_id(id)
            .one(&txn)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("company {}", id)))?,
        (None, Some(name)) if !name.is_empty() => {
            let (company, was_created) = store::find_or_create_company(
                &txn,
                NewCompany {
                    name: name.to_string(),
                    ..Default::default()
                },
            )
            .await?;
            if was_created {
                tracing::info!(company = %company.name, "created company for manual funding entry");
            }
            company
        }
        _ => return Err(AppError::InvalidRequest("company_id or company_name is required".to_string())),
    };

    let stage = normalize_stage(&req.stage);
    if stage == FundingStage::Unknown {
        tracing::debug!(stage = %req.stage, "unrecognised stage; storing as unknown");
    }

    let investors = req
        .investors
        .iter()
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(", ");

    let round = store::insert_round(
        &txn,
        NewRound {
            company_id: company.id,
            stage: stage.as_str().to_string(),
            amount_usd: amount,
            announced_on,
            lead_investor: req.lead_investor,
            investors: if investors.is_empty() { None } else { Some(investors) },
            source: req.source.or_else(|| Some("manual".to_string())),
            source_url: req.source_url,
        },
    )
    .await?;
    txn.commit().await?;
    tracing::info!(round = round.id, company = company.id, stage = %stage, "funding round recorded");
    state.invalidate_dashboard().await;

    created(FundingRoundDto::from(round))
}

/// Load every round joined with its company, ready for aggregation.
pub(crate) async fn load_points(state: &AppState) -> Result<Vec<FundingPoint>, AppError> {
    let rounds = FundingRound::find().all(&state.db).await?;
    let companies = Company::find().all(&state.db).await?;
    Ok(FundingPoint::from_rows(&rounds, &companies))
}

/// Aggregate funding statistics
#[utoipa::path(
    get,
    path = "/api/funding/summary",
    params(SummaryQuery),
    responses(
        (status = 200, description = "Totals, averages and medians overall and by category, stage and year", body = FundingSummary)
    ),
    tag = "funding"
)]
pub async fn funding_summary(
    State(state): State<AppState>,
    Query(query): Query<SummaryQuery>,
) -> ApiResult<FundingSummary> {
    let points = load_points(&state).await?;
    let top = query.top.unwrap_or(10).clamp(1, 100);
    ok(summarize(&points, top))
}
