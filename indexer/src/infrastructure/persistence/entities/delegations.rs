//! SeaORM Entity for the delegations table

use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "delegations")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    #[sea_orm(unique)]
    pub upstream_id: i64,
    #[sea_orm(column_type = "Text")]
    pub delegator: String,
    #[sea_orm(column_type = "Text")]
    pub delegate: String,
    /// Unix seconds
    pub timestamp: i64,
    #[sea_orm(column_type = "Decimal(Some((30, 6)))")]
    pub amount: Decimal,
    pub level: i64,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
