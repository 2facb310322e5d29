use sea_orm::entity::prelude::*;
use chrono::{DateTime, Utc};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "companies")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = true)]
    pub id: i32,
    #[sea_orm(unique)]
    pub name: String,
    pub category: String, // canonical slug, see funding::classify::Category
    #[sea_orm(column_type = "Text", nullable)]
    pub description: Option<String>,
    pub headquarters: Option<String>,
    pub founded_year: Option<i32>,
    pub website: Option<String>,
    pub employee_count: Option<i32>,
    pub total_funding_usd: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::funding_round::Entity")]
    FundingRound,
    #[sea_orm(has_many = "super::team_member::Entity")]
    TeamMember,
    #[sea_orm(has_many = "super::acquisition::Entity")]
    Acquisition,
    #[sea_orm(has_many = "super::portfolio_company::Entity")]
    PortfolioCompany,
}

impl Related<super::funding_round::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::FundingRound.def()
    }
}

impl Related<super::team_member::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::TeamMember.def()
    }
}

impl Related<super::acquisition::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Acquisition.def()
    }
}

impl Related<super::portfolio_company::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PortfolioCompany.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
