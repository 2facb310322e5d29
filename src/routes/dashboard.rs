use axum::extract::State;
use chrono::{DateTime, Duration, NaiveDate, Utc};
use sea_orm::{EntityTrait, PaginatorTrait};
use serde::Serialize;
use utoipa::ToSchema;

use crate::entities::{Acquisition, Company, FundingRound};
use crate::error::AppError;
use crate::funding::aggregate::{self, GroupKey};
use crate::funding::{normalize_stage, FundingPoint};
use crate::response::{ok, ApiResult};
use crate::state::AppState;

const RECENT_DAYS: i64 = 90;
const TOP_CATEGORIES: usize = 5;

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct CategoryShare {
    pub category: String,
    pub rounds: usize,
    pub total: i64,
}

/// Headline figures for the dashboard landing page.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct DashboardMetrics {
    pub company_count: u64,
    pub round_count: usize,
    pub acquisition_count: u64,
    pub total_raised: i64,
    pub average_round: Option<f64>,
    pub median_round: Option<f64>,
    pub rounds_last_90_days: usize,
    /// Fraction of rounds at pre-seed, seed or series A
    pub early_stage_share: Option<f64>,
    pub top_categories: Vec<CategoryShare>,
    pub generated_at: DateTime<Utc>,
}

pub fn compute_metrics(
    points: &[FundingPoint],
    recent_dates: &[Option<NaiveDate>],
    company_count: u64,
    acquisition_count: u64,
    today: NaiveDate,
) -> DashboardMetrics {
    let cutoff = today - Duration::days(RECENT_DAYS);
    let rounds_last_90_days = recent_dates
        .iter()
        .filter(|d| d.is_some_and(|d| d >= cutoff && d <= today))
        .count();

    let early = points.iter().filter(|p| normalize_stage(&p.stage).is_early_stage()).count();
    let early_stage_share = if points.is_empty() {
        None
    } else {
        Some(early as f64 / points.len() as f64)
    };

    let mut top_categories: Vec<CategoryShare> = aggregate::group_by(points, GroupKey::Category)
        .into_iter()
        .map(|(category, stats)| CategoryShare {
            category,
            rounds: stats.count,
            total: stats.total,
        })
        .collect();
    top_categories.sort_by(|a, b| b.total.cmp(&a.total).then_with(|| a.category.cmp(&b.category)));
    top_categories.truncate(TOP_CATEGORIES);

    DashboardMetrics {
        company_count,
        round_count: points.len(),
        acquisition_count,
        total_raised: aggregate::total(points),
        average_round: aggregate::average(points),
        median_round: aggregate::median(points),
        rounds_last_90_days,
        early_stage_share,
        top_categories,
        generated_at: Utc::now(),
    }
}

async fn load_metrics(state: &AppState) -> Result<DashboardMetrics, AppError> {
    let rounds = FundingRound::find().all(&state.db).await?;
    let companies = Company::find().all(&state.db).await?;
    let acquisition_count = Acquisition::find().count(&state.db).await?;

    let points = FundingPoint::from_rows(&rounds, &companies);
    let dates: Vec<Option<NaiveDate>> = rounds.iter().map(|r| r.announced_on).collect();
    Ok(compute_metrics(
        &points,
        &dates,
        companies.len() as u64,
        acquisition_count,
        Utc::now().date_naive(),
    ))
}

/// Dashboard headline metrics
#[utoipa::path(
    get,
    path = "/api/dashboard",
    responses(
        (status = 200, description = "Headline metrics, served from a short-lived cache", body = DashboardMetrics)
    ),
    tag = "dashboard"
)]
pub async fn dashboard(State(state): State<AppState>) -> ApiResult<DashboardMetrics> {
    let metrics = state
        .dashboard_cache
        .get_or_refresh(|| load_metrics(&state))
        .await?;
    ok(metrics)
}
