use chrono::Datelike;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use utoipa::ToSchema;

use crate::entities::{company, funding_round};

/// One funding round flattened with the fields aggregations group on.
#[derive(Debug, Clone, PartialEq)]
pub struct FundingPoint {
    pub company_id: i32,
    pub company_name: String,
    pub category: String,
    pub stage: String,
    pub amount: Option<i64>,
    pub year: Option<i32>,
}

impl FundingPoint {
    /// Join rounds with their companies. Rounds whose company is missing are kept under "unknown".
    pub fn from_rows(rounds: &[funding_round::Model], companies: &[company::Model]) -> Vec<FundingPoint> {
        let by_id: HashMap<i32, &company::Model> = companies.iter().map(|c| (c.id, c)).collect();
        rounds
            .iter()
            .map(|r| {
                let company = by_id.get(&r.company_id);
                FundingPoint {
                    company_id: r.company_id,
                    company_name: company.map(|c| c.name.clone()).unwrap_or_else(|| "unknown".to_string()),
                    category: company.map(|c| c.category.clone()).unwrap_or_else(|| "unknown".to_string()),
                    stage: r.stage.clone(),
                    amount: r.amount_usd,
                    year: r.announced_on.map(|d| d.year()),
                }
            })
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupKey {
    Category,
    Stage,
    Year,
}

impl GroupKey {
    fn key_of(&self, point: &FundingPoint) -> String {
        match self {
            GroupKey::Category => point.category.clone(),
            GroupKey::Stage => point.stage.clone(),
            GroupKey::Year => point
                .year
                .map(|y| y.to_string())
                .unwrap_or_else(|| "undated".to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct FundingStats {
    /// Number of rounds, including rounds with an undisclosed amount
    pub count: usize,
    /// Number of rounds with a disclosed amount
    pub disclosed: usize,
    /// Sum of disclosed amounts in USD
    pub total: i64,
    pub average: Option<f64>,
    pub median: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct CompanyTotal {
    pub company_id: i32,
    pub company_name: String,
    pub category: String,
    pub total: i64,
    pub rounds: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct FundingSummary {
    pub overall: FundingStats,
    pub by_category: BTreeMap<String, FundingStats>,
    pub by_stage: BTreeMap<String, FundingStats>,
    pub by_year: BTreeMap<String, FundingStats>,
    pub top_companies: Vec<CompanyTotal>,
}

fn amounts(points: &[FundingPoint]) -> impl Iterator<Item = i64> + '_ {
    points.iter().filter_map(|p| p.amount)
}

/// Sums are taken in `i128` and saturated back, so a handful of huge rounds cannot overflow.
fn saturate(sum: i128) -> i64 {
    i64::try_from(sum).unwrap_or(if sum < 0 { i64::MIN } else { i64::MAX })
}

pub fn total(points: &[FundingPoint]) -> i64 {
    saturate(amounts(points).map(i128::from).sum())
}

pub fn average(points: &[FundingPoint]) -> Option<f64> {
    let (sum, count) = amounts(points).fold((0i128, 0usize), |(s, c), a| (s + i128::from(a), c + 1));
    if count == 0 {
        None
    } else {
        Some(sum as f64 / count as f64)
    }
}

pub fn median(points: &[FundingPoint]) -> Option<f64> {
    let mut values: Vec<i64> = amounts(points).collect();
    if values.is_empty() {
        return None;
    }
    values.sort_unstable();
    let mid = values.len() / 2;
    if values.len() % 2 == 0 {
        Some((values[mid - 1] as f64 + values[mid] as f64) / 2.0)
    } else {
        Some(values[mid] as f64)
    }
}

pub fn stats(points: &[FundingPoint]) -> FundingStats {
    FundingStats {
        count: points.len(),
        disclosed: amounts(points).count(),
        total: total(points),
        average: average(points),
        median: median(points),
    }
}

pub fn group_by(points: &[FundingPoint], key: GroupKey) -> BTreeMap<String, FundingStats> {
    let mut groups: BTreeMap<String, Vec<FundingPoint>> = BTreeMap::new();
    for point in points {
        groups.entry(key.key_of(point)).or_default().push(point.clone());
    }
    groups.into_iter().map(|(k, members)| (k, stats(&members))).collect()
}

/// Companies ranked by disclosed total raised, highest first; ties broken by name.
pub fn top_companies(points: &[FundingPoint], limit: usize) -> Vec<CompanyTotal> {
    let mut by_company: HashMap<i32, (CompanyTotal, i128)> = HashMap::new();
    for p in points {
        let (entry, sum) = by_company.entry(p.company_id).or_insert_with(|| {
            let company = CompanyTotal {
                company_id: p.company_id,
                company_name: p.company_name.clone(),
                category: p.category.clone(),
                total: 0,
                rounds: 0,
            };
            (company, 0)
        });
        *sum += i128::from(p.amount.unwrap_or(0));
        entry.rounds += 1;
    }

    let mut ranked: Vec<CompanyTotal> = by_company
        .into_values()
        .map(|(mut company, sum)| {
            company.total = saturate(sum);
            company
        })
        .collect();
    ranked.sort_by(|a, b| b.total.cmp(&a.total).then_with(|| a.company_name.cmp(&b.company_name)));
    ranked.truncate(limit);
    ranked
}

pub fn summarize(points: &[FundingPoint], top: usize) -> FundingSummary {
    FundingSummary {
        overall: stats(points),
        by_category: group_by(points, GroupKey::Category),
        by_stage: group_by(points, GroupKey::Stage),
        by_year: group_by(points, GroupKey::Year),
        top_companies: top_companies(points, top),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point(company_id: i32, category: &str, stage: &str, amount: Option<i64>, year: Option<i32>) -> FundingPoint {
        FundingPoint {
            company_id,
            company_name: format!("company-{}", company_id),
            category: category.to_string(),
            stage: stage.to_string(),
            amount,
            year,
        }
    }

    fn fixture() -> Vec<FundingPoint> {
        vec![
            point(1, "identity", "seed", Some(4_000_000), Some(2023)),
            point(1, "identity", "series-a", Some(20_000_000), Some(2024)),
            point(2, "cloud-security", "seed", Some(6_000_000), Some(2024)),
            point(3, "cloud-security", "series-b", None, Some(2024)),
            point(4, "endpoint", "series-a", Some(10_000_000), None),
        ]
    }

    #[test]
    fn average_equals_sum_over_count() {
        let points = fixture();
        let sum = total(&points);
        assert_eq!(sum, 40_000_000);
        assert_eq!(average(&points), Some(sum as f64 / 4.0));
    }

    #[test]
    fn median_of_even_count_is_mean_of_middle_values() {
        // disclosed amounts sorted: 4M, 6M, 10M, 20M
        assert_eq!(median(&fixture()), Some(8_000_000.0));
    }

    #[test]
    fn median_of_odd_count_is_middle_value() {
        let points = vec![
            point(1, "x", "seed", Some(3), None),
            point(2, "x", "seed", Some(1), None),
            point(3, "x", "seed", Some(2), None),
        ];
        assert_eq!(median(&points), Some(2.0));
    }

    #[test]
    fn empty_or_all_null_yields_none() {
        assert_eq!(average(&[]), None);
        assert_eq!(median(&[]), None);
        let undisclosed = vec![point(1, "x", "seed", None, None)];
        assert_eq!(average(&undisclosed), None);
        assert_eq!(total(&undisclosed), 0);
        assert_eq!(stats(&undisclosed).count, 1);
        assert_eq!(stats(&undisclosed).disclosed, 0);
    }

    #[test]
    fn group_by_category_counts_all_rounds_but_averages_disclosed() {
        let groups = group_by(&fixture(), GroupKey::Category);
        let cloud = &groups["cloud-security"];
        assert_eq!(cloud.count, 2);
        assert_eq!(cloud.disclosed, 1);
        assert_eq!(cloud.total, 6_000_000);
        assert_eq!(cloud.average, Some(6_000_000.0));
        assert_eq!(groups.len(), 3);
    }

    #[test]
    fn group_by_year_buckets_undated_rounds() {
        let groups = group_by(&fixture(), GroupKey::Year);
        assert_eq!(groups["2024"].count, 3);
        assert_eq!(groups["undated"].total, 10_000_000);
    }

    #[test]
    fn top_companies_ranks_by_total() {
        let top = top_companies(&fixture(), 2);
        assert_eq!(top.len(), 2);
        assert_eq!(top[0].company_id, 1);
        assert_eq!(top[0].total, 24_000_000);
        assert_eq!(top[0].rounds, 2);
        assert_eq!(top[1].company_id, 4);
    }

    #[test]
    fn summarize_combines_all_breakdowns() {
        let summary = summarize(&fixture(), 10);
        assert_eq!(summary.overall.count, 5);
        assert_eq!(summary.by_stage["seed"].count, 2);
        assert_eq!(summary.top_companies.len(), 4);
    }

    #[test]
    fn huge_amounts_saturate_instead_of_overflowing() {
        let points = vec![
            point(1, "identity", "growth", Some(5_000_000_000_000_000_000), Some(2024)),
            point(2, "identity", "growth", Some(5_000_000_000_000_000_000), Some(2024)),
            point(2, "identity", "debt", Some(5_000_000_000_000_000_000), Some(2024)),
        ];
        assert_eq!(total(&points), i64::MAX);
        assert_eq!(average(&points), Some(5e18));
        let summary = summarize(&points, 5);
        assert_eq!(summary.by_category["identity"].total, i64::MAX);
        assert_eq!(summary.top_companies[0].company_id, 2);
        assert_eq!(summary.top_companies[0].total, i64::MAX);
        assert_eq!(summary.top_companies[1].total, 5_000_000_000_000_000_000);
    }
}
