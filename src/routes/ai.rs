//! Generative-AI agents and data-backed analyses.

use axum::{extract::State, Json};
use sea_orm::{ColumnTrait, EntityTrait, ModelTrait, QueryFilter, QueryOrder};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use utoipa::ToSchema;

use crate::ai::{extract_json, Agent, Completion};
use crate::entities::{company, funding_round, Company, FundingRound};
use crate::error::AppError;
use crate::funding::{summarize, Category, FundingPoint};
use crate::response::{ok, ApiResult};
use crate::routes::companies::{load_company, CompanyDto};
use crate::routes::funding::{load_points, FundingRoundDto};
use crate::state::AppState;

#[derive(Debug, Deserialize, ToSchema)]
pub struct AgentRequest {
    /// market-analyst, threat-intel, investment-advisor or due-diligence
    pub agent: String,
    pub prompt: String,
    /// Extra JSON handed to the model verbatim
    pub context: Option<Value>,
    /// Ask for a single JSON object and return it parsed in `structured`
    #[serde(default)]
    pub structured: bool,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AgentResponse {
    pub agent: Agent,
    pub answer: Completion,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub structured: Option<Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "kebab-case")]
pub enum AnalysisType {
    FundingTrends,
    CompetitiveLandscape,
    CompanyProfile,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct AnalysisRequest {
    #[serde(rename = "type")]
    pub analysis_type: String,
    /// Required for company-profile
    pub company_id: Option<i32>,
    /// Required for competitive-landscape, optional filter for funding-trends
    pub category: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AnalysisResponse {
    #[serde(rename = "type")]
    pub analysis_type: AnalysisType,
    /// Figures the narrative is based on
    pub data: Value,
    pub narrative: Completion,
}

const STRUCTURED_SUFFIX: &str = "\n\nRespond with a single JSON object and nothing else.";

fn parse_analysis_type(raw: &str) -> Result<AnalysisType, AppError> {
    match raw.trim().to_lowercase().as_str() {
        "funding-trends" => Ok(AnalysisType::FundingTrends),
        "competitive-landscape" => Ok(AnalysisType::CompetitiveLandscape),
        "company-profile" => Ok(AnalysisType::CompanyProfile),
        other => Err(AppError::InvalidRequest(format!(
            "unknown analysis type {:?}; expected funding-trends, competitive-landscape or company-profile",
            other
        ))),
    }
}

fn with_context(prompt: &str, context: &Value) -> Result<String, AppError> {
    Ok(format!("{}\n\nData (JSON):\n{}", prompt, serde_json::to_string_pretty(context)?))
}

/// Available agents
#[utoipa::path(
    get,
    path = "/api/ai-agents",
    responses((status = 200, description = "Agent identifiers", body = Vec<Agent>)),
    tag = "ai"
)]
pub async fn list_agents() -> ApiResult<Vec<Agent>> {
    ok(Agent::ALL.to_vec())
}

/// Ask an agent
#[utoipa::path(
    post,
    path = "/api/ai-agents",
    request_body = AgentRequest,
    responses(
        (status = 200, description = "Agent answer", body = AgentResponse),
        (status = 400, description = "Unknown agent or empty prompt"),
        (status = 502, description = "Model endpoint failed")
    ),
    tag = "ai"
)]
#[tracing::instrument(skip_all, fields(agent = %req.agent))]
pub async fn ask_agent(State(state): State<AppState>, Json(req): Json<AgentRequest>) -> ApiResult<AgentResponse> {
    let agent = Agent::parse(&req.agent)
        .ok_or_else(|| AppError::InvalidRequest(format!("unknown agent {:?}", req.agent)))?;
    if req.prompt.trim().is_empty() {
        return Err(AppError::InvalidRequest("prompt is required".to_string()));
    }

    let mut prompt = match &req.context {
        Some(context) => with_context(&req.prompt, context)?,
        None => req.prompt.clone(),
    };
    if req.structured {
        prompt.push_str(STRUCTURED_SUFFIX);
    }
    let answer = state.ai.complete(agent.system_prompt(), &prompt).await?;

    let structured = if req.structured {
        let parsed = extract_json(&answer.text);
        if parsed.is_none() {
            tracing::warn!(agent = agent.slug(), "structured answer requested but no JSON object found");
        }
        parsed
    } else {
        None
    };
    ok(AgentResponse { agent, answer, structured })
}

/// Run a data-backed analysis
#[utoipa::path(
    post,
    path = "/api/analysis",
    request_body = AnalysisRequest,
    responses(
        (status = 200, description = "Analysis with the underlying figures", body = AnalysisResponse),
        (status = 400, description = "Unknown type or missing parameter"),
        (status = 404, description = "Company not found")
    ),
    tag = "ai"
)]
#[tracing::instrument(skip_all, fields(analysis = %req.analysis_type))]
pub async fn run_analysis(State(state): State<AppState>, Json(req): Json<AnalysisRequest>) -> ApiResult<AnalysisResponse> {
    let analysis_type = parse_analysis_type(&req.analysis_type)?;
    let category = req
        .category
        .as_deref()
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .map(|c| Category::from_slug(c).map(|c| c.as_str().to_string()).unwrap_or_else(|| c.to_lowercase()));

    let (agent, prompt, data) = match analysis_type {
        AnalysisType::FundingTrends => {
            let points: Vec<FundingPoint> = load_points(&state)
                .await?
                .into_iter()
                .filter(|p| category.as_ref().map_or(true, |c| &p.category == c))
                .collect();
            let summary = summarize(&points, 10);
            (
                Agent::MarketAnalyst,
                format!(
                    "Describe the funding trends in {} cybersecurity startups. Highlight year-over-year change and the most active stages.",
                    category.as_deref().unwrap_or("all")
                ),
                serde_json::to_value(summary)?,
            )
        }
        AnalysisType::CompetitiveLandscape => {
            let category = category
                .ok_or_else(|| AppError::InvalidRequest("category is required for competitive-landscape".to_string()))?;
            let companies = Company::find()
                .filter(company::Column::Category.eq(category.as_str()))
                .order_by_desc(company::Column::TotalFundingUsd)
                .all(&state.db)
                .await?;
            let companies: Vec<CompanyDto> = companies.into_iter().map(CompanyDto::from).collect();
            (
                Agent::InvestmentAdvisor,
                format!(
                    "Assess the competitive landscape of the {} category: leaders, crowding and white space.",
                    category
                ),
                json!({ "category": category, "companies": companies }),
            )
        }
        AnalysisType::CompanyProfile => {
            let id = req
                .company_id
                .ok_or_else(|| AppError::InvalidRequest("company_id is required for company-profile".to_string()))?;
            let company = load_company(&state, id).await?;
            let rounds = company
                .find_related(FundingRound)
                .order_by_asc(funding_round::Column::AnnouncedOn)
                .all(&state.db)
                .await?;
            let rounds: Vec<FundingRoundDto> = rounds.into_iter().map(FundingRoundDto::from).collect();
            let name = company.name.clone();
            (
                Agent::DueDiligence,
                format!("Write a due-diligence profile of {}.", name),
                json!({ "company": CompanyDto::from(company), "funding_rounds": rounds }),
            )
        }
    };

    let narrative = state
        .ai
        .complete(agent.system_prompt(), &with_context(&prompt, &data)?)
        .await?;

    ok(AnalysisResponse {
        analysis_type,
        data,
        narrative,
    })
}
