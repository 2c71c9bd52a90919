use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Financial record of a completed purchase
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "orders")]
#[serde(rename_all = "camelCase")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub user_id: i32,
    /// Public order number, e.g. `ORD-1A2B3C4D5E6F`
    #[sea_orm(unique)]
    pub order_id: String,
    #[sea_orm(column_type = "Decimal(Some((10, 2)))")]
    pub total_amount: Decimal,
    #[sea_orm(column_type = "Decimal(Some((10, 2)))")]
    pub discount: Decimal,
    /// Always `total_amount - discount`
    #[sea_orm(column_type = "Decimal(Some((10, 2)))")]
    pub final_amount: Decimal,
    /// Payment provider reference
    pub tra_id: String,
    #[sea_orm(column_name = "type")]
    #[serde(rename = "type")]
    pub kind: OrderKind,
    pub coupon_code: Option<String>,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(10))")]
#[serde(rename_all = "lowercase")]
pub enum OrderKind {
    #[sea_orm(string_value = "book")]
    Book,
    #[sea_orm(string_value = "plan")]
    Plan,
}
