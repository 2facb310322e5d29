pub use sea_orm_migration::prelude::*;

mod m20250601_090000_create_companies_table;
mod m20250601_090500_create_funding_rounds_table;
mod m20250601_091000_create_people_and_deals_tables;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250601_090000_create_companies_table::Migration),
            Box::new(m20250601_090500_create_funding_rounds_table::Migration),
            Box::new(m20250601_091000_create_people_and_deals_tables::Migration),
        ]
    }
}
