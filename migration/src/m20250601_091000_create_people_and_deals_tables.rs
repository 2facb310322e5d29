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
                    .table(TeamMember::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(TeamMember::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(TeamMember::CompanyId).integer().not_null())
                    .col(ColumnDef::new(TeamMember::Name).string().not_null())
                    .col(ColumnDef::new(TeamMember::Title).string().not_null())
                    .col(ColumnDef::new(TeamMember::LinkedinUrl).string().null())
                    .col(
                        ColumnDef::new(TeamMember::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-team_members-company_id")
                            .from(TeamMember::Table, TeamMember::CompanyId)
                            .to(Company::Table, Company::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Acquisition::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Acquisition::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Acquisition::AcquirerName).string().not_null())
                    .col(ColumnDef::new(Acquisition::TargetCompanyId).integer().not_null())
                    .col(ColumnDef::new(Acquisition::AmountUsd).big_integer().null())
                    .col(ColumnDef::new(Acquisition::AnnouncedOn).date().null())
                    .col(
                        ColumnDef::new(Acquisition::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-acquisitions-target_company_id")
                            .from(Acquisition::Table, Acquisition::TargetCompanyId)
                            .to(Company::Table, Company::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(PortfolioCompany::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(PortfolioCompany::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(PortfolioCompany::InvestorName).string().not_null())
                    .col(ColumnDef::new(PortfolioCompany::CompanyId).integer().not_null())
                    .col(ColumnDef::new(PortfolioCompany::InvestedOn).date().null())
                    .col(
                        ColumnDef::new(PortfolioCompany::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-portfolio_companies-company_id")
                            .from(PortfolioCompany::Table, PortfolioCompany::CompanyId)
                            .to(Company::Table, Company::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-portfolio_companies-investor-company")
                    .table(PortfolioCompany::Table)
                    .col(PortfolioCompany::InvestorName)
                    .col(PortfolioCompany::CompanyId)
                    .unique()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(PortfolioCompany::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Acquisition::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(TeamMember::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum TeamMember {
    #[sea_orm(iden = "team_members")]
    Table,
    Id,
    CompanyId,
    Name,
    Title,
    LinkedinUrl,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Acquisition {
    #[sea_orm(iden = "acquisitions")]
    Table,
    Id,
    AcquirerName,
    TargetCompanyId,
    AmountUsd,
    AnnouncedOn,
    CreatedAt,
}

#[derive(DeriveIden)]
enum PortfolioCompany {
    #[sea_orm(iden = "portfolio_companies")]
    Table,
    Id,
    InvestorName,
    CompanyId,
    InvestedOn,
    CreatedAt,
}
