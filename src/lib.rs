use axum::{
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Router,
};
use migration::{Migrator, MigratorTrait};
use sea_orm::{ConnectOptions, Database, DatabaseConnection, DbErr};
// Conditionally import SwaggerUi only when needed (not test)
#[cfg(not(test))]
use utoipa_swagger_ui::SwaggerUi;
// Conditionally import CORS only when needed (not test)
#[cfg(not(test))]
use tower_http::cors::{Any, CorsLayer};
use utoipa::OpenApi;
// Conditionally import Governor only when needed (not test)
#[cfg(not(test))]
use tower_governor::{governor::GovernorConfigBuilder, key_extractor::SmartIpKeyExtractor, GovernorLayer};
#[cfg(not(test))]
use std::sync::Arc;

pub mod ai;
pub mod cache;
pub mod config;
pub mod entities;
pub mod error;
pub mod funding;
pub mod ingestion;
pub mod jobs;
pub mod protection;
pub mod response;
pub mod routes;
pub mod state;
pub mod store;

pub use config::AppConfig;
pub use state::AppState;

use routes::{ai as ai_routes, companies, dashboard, data_protection, data_sources, deals, funding as funding_routes};

/// Health check endpoint
#[utoipa::path(
    get,
    path = "/health",
    responses((status = 200, description = "Service is healthy")),
    tag = "health"
)]
async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "Service is healthy")
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health_check,
        companies::list_companies,
        companies::create_company,
        companies::get_company,
        companies::update_company,
        companies::delete_company,
        companies::list_team,
        companies::create_team_member,
        funding_routes::list_funding,
        funding_routes::create_funding,
        funding_routes::funding_summary,
        deals::list_acquisitions,
        deals::create_acquisition,
        deals::list_portfolio,
        deals::create_portfolio_entry,
        dashboard::dashboard,
        data_sources::list_sources,
        data_sources::source_action,
        data_sources::ingest_conferences,
        data_sources::ingest_market_intel,
        data_sources::ingest_source,
        ai_routes::list_agents,
        ai_routes::ask_agent,
        ai_routes::run_analysis,
        data_protection::protect,
        data_protection::audit_log,
    ),
    components(
        schemas(
            companies::CompanyDto,
            companies::CompanyDetail,
            companies::TeamMemberDto,
            companies::CreateCompanyRequest,
            companies::UpdateCompanyRequest,
            companies::CreateTeamMemberRequest,
            funding_routes::FundingRoundDto,
            funding_routes::CreateFundingRequest,
            funding::FundingSummary,
            funding::FundingStats,
            funding::aggregate::CompanyTotal,
            funding::Category,
            funding::FundingStage,
            deals::AcquisitionDto,
            deals::PortfolioEntryDto,
            deals::CreateAcquisitionRequest,
            deals::CreatePortfolioRequest,
            dashboard::DashboardMetrics,
            dashboard::CategoryShare,
            data_sources::DataSourceActionRequest,
            data_sources::DataSourceActionResponse,
            data_sources::IngestResponse,
            ingestion::SourceInfo,
            ingestion::SourceKind,
            ingestion::IngestionBatch,
            ingestion::IngestionRecord,
            ingestion::PersistOutcome,
            ai::Agent,
            ai::Completion,
            ai_routes::AgentRequest,
            ai_routes::AgentResponse,
            ai_routes::AnalysisType,
            ai_routes::AnalysisRequest,
            ai_routes::AnalysisResponse,
            data_protection::ProtectionRequest,
            data_protection::ProtectionResult,
            protection::AuditEntry,
            protection::AuditAction,
            protection::Role,
            protection::Sensitivity,
        )
    ),
    tags(
        (name = "health", description = "Service liveness"),
        (name = "companies", description = "Company directory and team members"),
        (name = "funding", description = "Funding rounds and aggregates"),
        (name = "deals", description = "Acquisitions and investor portfolios"),
        (name = "dashboard", description = "Market overview metrics"),
        (name = "data-sources", description = "Registered source adapters"),
        (name = "data-ingestion", description = "Fetching and storing source data"),
        (name = "ai", description = "AI agents and analyses"),
        (name = "data-protection", description = "Classification, encryption, masking and audit")
    )
)]
pub struct ApiDoc;

/// Every route with state applied, without rate limiting, docs or CORS.
pub fn api_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/api/companies", get(companies::list_companies).post(companies::create_company))
        .route(
            "/api/companies/{id}",
            get(companies::get_company)
                .put(companies::update_company)
                .delete(companies::delete_company),
        )
        .route("/api/companies/{id}/team", get(companies::list_team))
        .route("/api/team-members", post(companies::create_team_member))
        .route("/api/funding", get(funding_routes::list_funding).post(funding_routes::create_funding))
        .route("/api/funding/summary", get(funding_routes::funding_summary))
        .route("/api/acquisitions", get(deals::list_acquisitions).post(deals::create_acquisition))
        .route("/api/portfolio", get(deals::list_portfolio).post(deals::create_portfolio_entry))
        .route("/api/dashboard", get(dashboard::dashboard))
        .route("/api/data-sources", get(data_sources::list_sources).post(data_sources::source_action))
        .route("/api/data-ingestion/conferences", get(data_sources::ingest_conferences))
        .route("/api/data-ingestion/market-intel", get(data_sources::ingest_market_intel))
        .route("/api/data-ingestion/{source}", post(data_sources::ingest_source))
        .route("/api/ai-agents", get(ai_routes::list_agents).post(ai_routes::ask_agent))
        .route("/api/analysis", post(ai_routes::run_analysis))
        .route("/api/data-protection", post(data_protection::protect))
        .route("/api/data-protection/audit", get(data_protection::audit_log))
        .with_state(state)
}

pub fn create_app(state: AppState) -> Router {
    // Build our API documentation (needed regardless for ApiDoc::openapi())
    let api_doc = ApiDoc::openapi();
    let api_routes = api_router(state);

    // --- Conditionally apply layers and Swagger UI only when NOT running tests ---
    #[cfg(not(test))]
    let (docs_router, rate_limited_api_routes) = {
        let docs_router = SwaggerUi::new("/docs").url("/api-doc/openapi.json", api_doc);

        // 20 requests burst per client IP, one token back every 500ms
        let governor_conf = GovernorConfigBuilder::default()
            .key_extractor(SmartIpKeyExtractor)
            .per_millisecond(500)
            .burst_size(20)
            .finish()
            .map(Arc::new);

        let rate_limited_api_routes = match governor_conf {
            Some(config) => api_routes.layer(GovernorLayer { config }),
            None => {
                tracing::warn!("invalid rate limit settings; serving without rate limiting");
                api_routes
            }
        };

        (Router::new().merge(docs_router), rate_limited_api_routes)
    };

    // For test builds, use the original api_routes and an empty router for docs
    #[cfg(test)]
    let (docs_router, rate_limited_api_routes) = {
        let _ = api_doc;
        (Router::new(), api_routes)
    };

    #[allow(unused_mut)]
    let mut app = Router::new().merge(rate_limited_api_routes).merge(docs_router);

    // --- Apply CORS to the whole app (both API and docs) if needed ---
    #[cfg(not(test))]
    {
        app = app.layer(CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any));
    }

    app
}

/// Whether the URL names a SQLite database that vanishes with the process.
pub fn is_in_memory(url: &str) -> bool {
    url.starts_with("sqlite") && (url.contains(":memory:") || url.contains("mode=memory"))
}

/// Connect and bring the schema up to date.
pub async fn connect_database(url: &str) -> Result<DatabaseConnection, DbErr> {
    let mut options = ConnectOptions::new(url.to_owned());
    if is_in_memory(url) {
        // Every pooled connection would otherwise see its own empty database
        options.max_connections(1).min_connections(1);
    }
    options.sqlx_logging(false);

    let db = Database::connect(options).await?;
    Migrator::up(&db, None).await?;
    tracing::info!("database ready");
    Ok(db)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;

    #[tokio::test]
    async fn health_check_responds() {
        let db = connect_database("sqlite::memory:").await.unwrap();
        let state = AppState::new(&AppConfig::for_tests(), db).unwrap();
        let app = create_app(state);

        let response = app
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[test]
    fn in_memory_urls_are_recognised() {
        assert!(is_in_memory("sqlite::memory:"));
        assert!(is_in_memory("sqlite://csintel.db?mode=memory"));
        assert!(!is_in_memory("sqlite://csintel.db?mode=rwc"));
        assert!(!is_in_memory("postgres://localhost/csintel"));
    }

    #[test]
    fn openapi_lists_every_route() {
        let doc = ApiDoc::openapi();
        for path in [
            "/health",
            "/api/companies/{id}",
            "/api/funding/summary",
            "/api/data-ingestion/{source}",
            "/api/data-protection/audit",
        ] {
            assert!(doc.paths.paths.contains_key(path), "missing {}", path);
        }
    }
}
