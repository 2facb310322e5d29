pub mod ai;
pub mod companies;
pub mod dashboard;
pub mod data_protection;
pub mod data_sources;
pub mod deals;
pub mod funding;
