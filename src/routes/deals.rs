//! Acquisitions and investor portfolio links.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::entities::{acquisition, portfolio_company, Acquisition, PortfolioCompany};
use crate::error::AppError;
use crate::response::{created, ok, ApiResponse, ApiResult};
use crate::routes::companies::{load_company, parse_date};
use crate::state::AppState;

#[derive(Debug, Serialize, ToSchema)]
pub struct AcquisitionDto {
    pub id: i32,
    pub acquirer_name: String,
    pub target_company_id: i32,
    pub amount_usd: Option<i64>,
    pub announced_on: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
}

impl From<acquisition::Model> for AcquisitionDto {
    fn from(m: acquisition::Model) -> Self {
        Self {
            id: m.id,
            acquirer_name: m.acquirer_name,
            target_company_id: m.target_company_id,
            amount_usd: m.amount_usd,
            announced_on: m.announced_on,
            created_at: m.created_at,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PortfolioEntryDto {
    pub id: i32,
    pub investor_name: String,
    pub company_id: i32,
    pub invested_on: Option<NaiveDate>,
}

impl From<portfolio_company::Model> for PortfolioEntryDto {
    fn from(m: portfolio_company::Model) -> Self {
        Self {
            id: m.id,
            investor_name: m.investor_name,
            company_id: m.company_id,
            invested_on: m.invested_on,
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateAcquisitionRequest {
    pub acquirer_name: String,
    pub target_company_id: i32,
    pub amount_usd: Option<i64>,
    /// YYYY-MM-DD
    pub announced_on: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreatePortfolioRequest {
    pub investor_name: String,
    pub company_id: i32,
    /// YYYY-MM-DD
    pub invested_on: Option<String>,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PortfolioQuery {
    /// Only links for this investor (exact name)
    investor: Option<String>,
}

/// Record an acquisition
#[utoipa::path(
    post,
    path = "/api/acquisitions",
    request_body = CreateAcquisitionRequest,
    responses(
        (status = 201, description = "Acquisition recorded", body = AcquisitionDto),
        (status = 400, description = "Missing acquirer"),
        (status = 404, description = "Target company does not exist")
    ),
    tag = "deals"
)]
pub async fn create_acquisition(
    State(state): State<AppState>,
    Json(req): Json<CreateAcquisitionRequest>,
) -> Result<(StatusCode, Json<ApiResponse<AcquisitionDto>>), AppError> {
    if req.acquirer_name.trim().is_empty() {
        return Err(AppError::InvalidRequest("acquirer_name is required".to_string()));
    }
    if req.amount_usd.is_some_and(|a| a < 0) {
        return Err(AppError::UnprocessableEntity("amount cannot be negative".to_string()));
    }
    let announced_on = parse_date("announced_on", req.announced_on.as_deref())?;
    load_company(&state, req.target_company_id).await?;

    let model = acquisition::ActiveModel {
        acquirer_name: Set(req.acquirer_name.trim().to_string()),
        target_company_id: Set(req.target_company_id),
        amount_usd: Set(req.amount_usd),
        announced_on: Set(announced_on),
        created_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(&state.db)
    .await?;
    state.invalidate_dashboard().await;

    created(AcquisitionDto::from(model))
}

/// List acquisitions, newest first
#[utoipa::path(
    get,
    path = "/api/acquisitions",
    responses((status = 200, description = "Acquisitions", body = Vec<AcquisitionDto>)),
    tag = "deals"
)]
pub async fn list_acquisitions(State(state): State<AppState>) -> ApiResult<Vec<AcquisitionDto>> {
    let rows = Acquisition::find()
        .order_by_desc(acquisition::Column::AnnouncedOn)
        .order_by_desc(acquisition::Column::Id)
        .all(&state.db)
        .await?;
    ok(rows.into_iter().map(AcquisitionDto::from).collect())
}

/// Add a company to an investor's portfolio
#[utoipa::path(
    post,
    path = "/api/portfolio",
    request_body = CreatePortfolioRequest,
    responses(
        (status = 201, description = "Portfolio link created", body = PortfolioEntryDto),
        (status = 404, description = "Company does not exist"),
        (status = 409, description = "Link already exists")
    ),
    tag = "deals"
)]
pub async fn create_portfolio_entry(
    State(state): State<AppState>,
    Json(req): Json<CreatePortfolioRequest>,
) -> Result<(StatusCode, Json<ApiResponse<PortfolioEntryDto>>), AppError> {
    let investor = req.investor_name.trim();
    if investor.is_empty() {
        return Err(AppError::InvalidRequest("investor_name is required".to_string()));
    }
    let invested_on = parse_date("invested_on", req.invested_on.as_deref())?;
    load_company(&state, req.company_id).await?;

    let model = portfolio_company::ActiveModel {
        investor_name: Set(investor.to_string()),
        company_id: Set(req.company_id),
        invested_on: Set(invested_on),
        created_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(&state.db)
    .await?;

    created(PortfolioEntryDto::from(model))
}

/// List portfolio links
#[utoipa::path(
    get,
    path = "/api/portfolio",
    params(PortfolioQuery),
    responses((status = 200, description = "Portfolio links", body = Vec<PortfolioEntryDto>)),
    tag = "deals"
)]
pub async fn list_portfolio(
    State(state): State<AppState>,
    Query(query): Query<PortfolioQuery>,
) -> ApiResult<Vec<PortfolioEntryDto>> {
    let mut select = PortfolioCompany::find();
    if let Some(investor) = query.investor.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        select = select.filter(portfolio_company::Column::InvestorName.eq(investor));
    }
    let rows = select
        .order_by_asc(portfolio_company::Column::InvestorName)
        .order_by_asc(portfolio_company::Column::CompanyId)
        .all(&state.db)
        .await?;
    ok(rows.into_iter().map(PortfolioEntryDto::from).collect())
}
