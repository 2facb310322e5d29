use sea_orm_migration::prelude::*;

use super::m20250601_090000_create_companies_table::Company;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(FundingRound::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(FundingRound::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(FundingRound::CompanyId).integer().not_null())
                    .col(ColumnDef::new(FundingRound::Stage).string().not_null())
                    .col(ColumnDef::new(FundingRound::AmountUsd).big_integer().null())
                    .col(ColumnDef::new(FundingRound::AnnouncedOn).date().null())
                    .col(ColumnDef::new(FundingRound::LeadInvestor).string().null())
                    .col(ColumnDef::new(FundingRound::Investors).text().null())
                    .col(ColumnDef::new(FundingRound::Source).string().null())
                    // NULLs never collide, so manual entries without a URL are unaffected
                    .col(ColumnDef::new(FundingRound::SourceUrl).string().null().unique_key())
                    .col(
                        ColumnDef::new(FundingRound::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-funding_rounds-company_id")
                            .from(FundingRound::Table, FundingRound::CompanyId)
                            .to(Company::Table, Company::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-funding_rounds-company_id")
                    .table(FundingRound::Table)
                    .col(FundingRound::CompanyId)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(FundingRound::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum FundingRound {
    #[sea_orm(iden = "funding_rounds")]
    Table,
    Id,
    CompanyId,
    Stage,
    AmountUsd,
    AnnouncedOn,
    LeadInvestor,
    Investors,
    Source,
    SourceUrl,
    CreatedAt,
}
