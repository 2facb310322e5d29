use sea_orm::entity::prelude::*;
use chrono::{DateTime, NaiveDate, Utc};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "funding_rounds")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = true)]
    pub id: i32,
    pub company_id: i32,
    pub stage: String,
    pub amount_usd: Option<i64>, // whole dollars, NULL when undisclosed
    pub announced_on: Option<NaiveDate>,
    pub lead_investor: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub investors: Option<String>, // comma separated
    pub source: Option<String>,
    #[sea_orm(unique)]
    pub source_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::company::Entity",
        from = "Column::CompanyId",
        to = "super::company::Column::Id",
        on_delete = "Cascade"
    )]
    Company,
}

impl Related<super::company::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Company.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
