use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Company::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Company::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Company::Name).string().not_null().unique_key())
                    .col(ColumnDef::new(Company::Category).string().not_null())
                    .col(ColumnDef::new(Company::Description).text().null())
                    .col(ColumnDef::new(Company::Headquarters).string().null())
                    .col(ColumnDef::new(Company::FoundedYear).integer().null())
                    .col(ColumnDef::new(Company::Website).string().null())
                    .col(ColumnDef::new(Company::EmployeeCount).integer().null())
                    .col(ColumnDef::new(Company::TotalFundingUsd).big_integer().null()) // whole dollars
                    .col(
                        ColumnDef::new(Company::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Company::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-companies-category")
                    .table(Company::Table)
                    .col(Company::Category)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Company::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum Company {
    #[sea_orm(iden = "companies")]
    Table,
    Id,
    Name,
    Category,
    Description,
    Headquarters,
    FoundedYear,
    Website,
    EmployeeCount,
    TotalFundingUsd,
    CreatedAt,
    UpdatedAt,
}
