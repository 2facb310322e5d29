//! Funding intelligence: classification of raw funding signals and
//! aggregation over stored rounds.

pub mod aggregate;
pub mod classify;

pub use aggregate::{summarize, FundingPoint, FundingStats, FundingSummary, GroupKey};
pub use classify::{classify_category, normalize_stage, parse_amount, Category, FundingStage};
