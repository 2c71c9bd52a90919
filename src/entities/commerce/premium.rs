use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// A user's subscription to a plan
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "premiums")]
#[serde(rename_all = "camelCase")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub user_id: i32,
    pub plan_id: i32,
    pub order_id: String,
    pub status: bool,
    pub purchased_at: DateTimeUtc,
    pub expire_on: DateTimeUtc,
    pub tr_id: String,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

impl Model {
    /// Active and not yet expired at `now`.
    pub fn is_active_at(&self, now: DateTimeUtc) -> bool {
        self.status && self.expire_on > now
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::plan::Entity",
        from = "Column::PlanId",
        to = "super::plan::Column::Id"
    )]
    Plan,
}

impl Related<super::plan::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Plan.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
