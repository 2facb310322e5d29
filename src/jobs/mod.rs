pub mod ingest;
pub mod seed;

pub use ingest::run_ingestion;
pub use seed::{seed_database, SeedOutcome};
