use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Datelike, NaiveDate, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, ModelTrait, QueryFilter, QueryOrder, QuerySelect, Set,
    TransactionTrait,
};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::entities::{acquisition, company, funding_round, portfolio_company, team_member};
use crate::entities::{Acquisition, Company, FundingRound, PortfolioCompany, TeamMember};
use crate::error::AppError;
use crate::response::{created, ok, ApiResponse, ApiResult};
use crate::routes::funding::FundingRoundDto;
use crate::routes::deals::AcquisitionDto;
use crate::state::AppState;
use crate::store::{self, NewCompany};

const MAX_PAGE: u64 = 500;

#[derive(Debug, Serialize, ToSchema)]
pub struct CompanyDto {
    pub id: i32,
    pub name: String,
    /// Cybersecurity category slug, e.g. "identity"
    pub category: String,
    pub description: Option<String>,
    pub headquarters: Option<String>,
    pub founded_year: Option<i32>,
    pub website: Option<String>,
    pub employee_count: Option<i32>,
    /// Sum of disclosed rounds, in USD
    pub total_funding_usd: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<company::Model> for CompanyDto {
    fn from(m: company::Model) -> Self {
        Self {
            id: m.id,
            name: m.name,
            category: m.category,
            description: m.description,
            headquarters: m.headquarters,
            founded_year: m.founded_year,
            website: m.website,
            employee_count: m.employee_count,
            total_funding_usd: m.total_funding_usd,
            created_at: m.created_at,
            updated_at: m.updated_at,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TeamMemberDto {
    pub id: i32,
    pub company_id: i32,
    pub name: String,
    pub title: String,
    pub linkedin_url: Option<String>,
}

impl From<team_member::Model> for TeamMemberDto {
    fn from(m: team_member::Model) -> Self {
        Self {
            id: m.id,
            company_id: m.company_id,
            name: m.name,
            title: m.title,
            linkedin_url: m.linkedin_url,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CompanyDetail {
    pub company: CompanyDto,
    pub funding_rounds: Vec<FundingRoundDto>,
    pub team: Vec<TeamMemberDto>,
    pub acquisitions: Vec<AcquisitionDto>,
    /// Investors that list this company in their portfolio
    pub investors: Vec<String>,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct CompanyQuery {
    /// Only companies in this category
    category: Option<String>,
    /// Substring match on the company name
    search: Option<String>,
    /// Page size (default 100, max 500)
    limit: Option<u64>,
    offset: Option<u64>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateCompanyRequest {
    pub name: String,
    /// Category slug; classified from name and description when omitted
    pub category: Option<String>,
    pub description: Option<String>,
    pub headquarters: Option<String>,
    pub founded_year: Option<i32>,
    pub website: Option<String>,
    pub employee_count: Option<i32>,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct UpdateCompanyRequest {
    pub name: Option<String>,
    pub category: Option<String>,
    pub description: Option<String>,
    pub headquarters: Option<String>,
    pub founded_year: Option<i32>,
    pub website: Option<String>,
    pub employee_count: Option<i32>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateTeamMemberRequest {
    pub company_id: i32,
    pub name: String,
    pub title: String,
    pub linkedin_url: Option<String>,
}

fn validate_founded_year(year: Option<i32>) -> Result<(), AppError> {
    if let Some(y) = year {
        let this_year = Utc::now().year();
        if !(1900..=this_year + 1).contains(&y) {
            return Err(AppError::UnprocessableEntity(format!("founded_year {} is out of range", y)));
        }
    }
    Ok(())
}

fn validate_employee_count(count: Option<i32>) -> Result<(), AppError> {
    match count {
        Some(n) if n < 0 => Err(AppError::UnprocessableEntity("employee_count cannot be negative".to_string())),
        _ => Ok(()),
    }
}

pub(crate) async fn load_company(state: &AppState, id: i32) -> Result<company::Model, AppError> {
    Company::find_by_id(id)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("company {}", id)))
}

/// List companies
#[utoipa::path(
    get,
    path = "/api/companies",
    params(CompanyQuery),
    responses(
        (status = 200, description = "Companies ordered by name, in the success envelope", body = Vec<CompanyDto>)
    ),
    tag = "companies"
)]
pub async fn list_companies(
    State(state): State<AppState>,
    Query(query): Query<CompanyQuery>,
) -> ApiResult<Vec<CompanyDto>> {
    let mut select = Company::find();
    if let Some(category) = query.category.as_deref().filter(|c| !c.is_empty()) {
        select = select.filter(company::Column::Category.eq(category));
    }
    if let Some(search) = query.search.as_deref().filter(|s| !s.is_empty()) {
        select = select.filter(company::Column::Name.contains(search));
    }

    let companies = select
        .order_by_asc(company::Column::Name)
        .limit(query.limit.unwrap_or(100).min(MAX_PAGE))
        .offset(query.offset.unwrap_or(0))
        .all(&state.db)
        .await?;

    ok(companies.into_iter().map(CompanyDto::from).collect())
}

/// Create a company
#[utoipa::path(
    post,
    path = "/api/companies",
    request_body = CreateCompanyRequest,
    responses(
        (status = 201, description = "Company created", body = CompanyDto),
        (status = 400, description = "Missing name"),
        (status = 409, description = "A company with this name already exists"),
        (status = 422, description = "Field out of range")
    ),
    tag = "companies"
)]
#[tracing::instrument(skip_all, fields(name = %req.name))]
pub async fn create_company(
    State(state): State<AppState>,
    Json(req): Json<CreateCompanyRequest>,
) -> Result<(StatusCode, Json<ApiResponse<CompanyDto>>), AppError> {
    if req.name.trim().is_empty() {
        return Err(AppError::InvalidRequest("name is required".to_string()));
    }
    validate_founded_year(req.founded_year)?;
    validate_employee_count(req.employee_count)?;

    let model = store::insert_company(
        &state.db,
        NewCompany {
            name: req.name,
            category: req.category,
            description: req.description,
            headquarters: req.headquarters,
            founded_year: req.founded_year,
            website: req.website,
            employee_count: req.employee_count,
        },
    )
    .await?;
    tracing::info!(id = model.id, category = %model.category, "company created");
    state.invalidate_dashboard().await;

    created(CompanyDto::from(model))
}

/// Company with its funding rounds, team and acquisitions
#[utoipa::path(
    get,
    path = "/api/companies/{id}",
    params(("id" = i32, Path, description = "Company id")),
    responses(
        (status = 200, description = "Company detail", body = CompanyDetail),
        (status = 404, description = "No such company")
    ),
    tag = "companies"
)]
pub async fn get_company(State(state): State<AppState>, Path(id): Path<i32>) -> ApiResult<CompanyDetail> {
    let company = load_company(&state, id).await?;

    let rounds = company
        .find_related(FundingRound)
        .order_by_asc(funding_round::Column::AnnouncedOn)
        .all(&state.db)
        .await?;
    let team = company.find_related(TeamMember).all(&state.db).await?;
    let acquisitions = company.find_related(Acquisition).all(&state.db).await?;
    let investors = company
        .find_related(PortfolioCompany)
        .order_by_asc(portfolio_company::Column::InvestorName)
        .all(&state.db)
        .await?;

    ok(CompanyDetail {
        company: CompanyDto::from(company),
        funding_rounds: rounds.into_iter().map(FundingRoundDto::from).collect(),
        team: team.into_iter().map(TeamMemberDto::from).collect(),
        acquisitions: acquisitions.into_iter().map(AcquisitionDto::from).collect(),
        investors: investors.into_iter().map(|p| p.investor_name).collect(),
    })
}

/// Update a company; omitted fields are left unchanged
#[utoipa::path(
    put,
    path = "/api/companies/{id}",
    params(("id" = i32, Path, description = "Company id")),
    request_body = UpdateCompanyRequest,
    responses(
        (status = 200, description = "Updated company", body = CompanyDto),
        (status = 404, description = "No such company"),
        (status = 409, description = "Name already taken")
    ),
    tag = "companies"
)]
pub async fn update_company(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(req): Json<UpdateCompanyRequest>,
) -> ApiResult<CompanyDto> {
    validate_founded_year(req.founded_year)?;
    validate_employee_count(req.employee_count)?;
    let existing = load_company(&state, id).await?;

    let name = existing.name.clone();
    let description = req.description.clone().or_else(|| existing.description.clone());
    let mut am: company::ActiveModel = existing.into();

    if let Some(new_name) = req.name {
        let new_name = new_name.trim().to_string();
        if new_name.is_empty() {
            return Err(AppError::InvalidRequest("name cannot be empty".to_string()));
        }
        am.name = Set(new_name);
    }
    if let Some(category) = req.category {
        am.category = Set(store::resolve_category(&name, description.as_deref(), Some(&category)));
    }
    if req.description.is_some() {
        am.description = Set(req.description);
    }
    if req.headquarters.is_some() {
        am.headquarters = Set(req.headquarters);
    }
    if req.founded_year.is_some() {
        am.founded_year = Set(req.founded_year);
    }
    if req.website.is_some() {
        am.website = Set(req.website);
    }
    if req.employee_count.is_some() {
        am.employee_count = Set(req.employee_count);
    }
    am.updated_at = Set(Utc::now());

    let updated = am.update(&state.db).await?;
    state.invalidate_dashboard().await;
    ok(CompanyDto::from(updated))
}

/// Delete a company together with its rounds, team, acquisitions and portfolio links
#[utoipa::path(
    delete,
    path = "/api/companies/{id}",
    params(("id" = i32, Path, description = "Company id")),
    responses(
        (status = 200, description = "Deleted"),
        (status = 404, description = "No such company")
    ),
    tag = "companies"
)]
pub async fn delete_company(State(state): State<AppState>, Path(id): Path<i32>) -> ApiResult<serde_json::Value> {
    let txn = state.db.begin().await?;

    FundingRound::delete_many()
        .filter(funding_round::Column::CompanyId.eq(id))
        .exec(&txn)
        .await?;
    TeamMember::delete_many()
        .filter(team_member::Column::CompanyId.eq(id))
        .exec(&txn)
        .await?;
    Acquisition::delete_many()
        .filter(acquisition::Column::TargetCompanyId.eq(id))
        .exec(&txn)
        .await?;
    PortfolioCompany::delete_many()
        .filter(portfolio_company::Column::CompanyId.eq(id))
        .exec(&txn)
        .await?;
    let result = Company::delete_by_id(id).exec(&txn).await?;

    if result.rows_affected == 0 {
        txn.rollback().await?;
        return Err(AppError::NotFound(format!("company {}", id)));
    }
    txn.commit().await?;
    tracing::info!(id, "company deleted");
    state.invalidate_dashboard().await;

    ok(serde_json::json!({ "deleted": id }))
}

/// Team members of a company
#[utoipa::path(
    get,
    path = "/api/companies/{id}/team",
    params(("id" = i32, Path, description = "Company id")),
    responses(
        (status = 200, description = "Team members", body = Vec<TeamMemberDto>),
        (status = 404, description = "No such company")
    ),
    tag = "companies"
)]
pub async fn list_team(State(state): State<AppState>, Path(id): Path<i32>) -> ApiResult<Vec<TeamMemberDto>> {
    let company = load_company(&state, id).await?;
    let team = company
        .find_related(TeamMember)
        .order_by_asc(team_member::Column::Name)
        .all(&state.db)
        .await?;
    ok(team.into_iter().map(TeamMemberDto::from).collect())
}

/// Add a team member
#[utoipa::path(
    post,
    path = "/api/team-members",
    request_body = CreateTeamMemberRequest,
    responses(
        (status = 201, description = "Team member added", body = TeamMemberDto),
        (status = 400, description = "Missing name or title"),
        (status = 404, description = "No such company")
    ),
    tag = "companies"
)]
pub async fn create_team_member(
    State(state): State<AppState>,
    Json(req): Json<CreateTeamMemberRequest>,
) -> Result<(StatusCode, Json<ApiResponse<TeamMemberDto>>), AppError> {
    if req.name.trim().is_empty() || req.title.trim().is_empty() {
        return Err(AppError::InvalidRequest("name and title are required".to_string()));
    }
    load_company(&state, req.company_id).await?;

    let member = team_member::ActiveModel {
        company_id: Set(req.company_id),
        name: Set(req.name.trim().to_string()),
        title: Set(req.title.trim().to_string()),
        linkedin_url: Set(req.linkedin_url),
        created_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(&state.db)
    .await?;

    created(TeamMemberDto::from(member))
}

/// Parse an optional `YYYY-MM-DD` date field.
pub(crate) fn parse_date(field: &str, raw: Option<&str>) -> Result<Option<NaiveDate>, AppError> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        None => Ok(None),
        Some(s) => NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .map(Some)
            .map_err(|_| AppError::UnprocessableEntity(format!("{} must be YYYY-MM-DD, got {:?}", field, s))),
    }
}
