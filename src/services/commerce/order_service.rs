use crate::{
    entities::{
        library,
        order::{self, OrderKind},
        transaction,
    },
    errors::ServiceError,
};
use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, Set,
};
use serde::Serialize;
use std::{collections::HashMap, sync::Arc};
use tracing::instrument;
use uuid::Uuid;

/// Amounts and references for a new order row.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub user_id: i32,
    pub order_id: String,
    pub total_amount: Decimal,
    pub discount: Decimal,
    pub final_amount: Decimal,
    pub tra_id: String,
    pub kind: OrderKind,
    pub coupon_code: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderHistory {
    #[serde(flatten)]
    pub order: order::Model,
    pub items: Vec<library::Model>,
}

#[derive(Clone)]
pub struct OrderService {
    db: Arc<DatabaseConnection>,
}

impl OrderService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// The user's orders, newest first, each with the books it granted.
    #[instrument(skip(self))]
    pub async fn list(&self, user_id: i32) -> Result<Vec<OrderHistory>, ServiceError> {
        let orders = order::Entity::find()
            .filter(order::Column::UserId.eq(user_id))
            .order_by_desc(order::Column::Id)
            .all(&*self.db)
            .await?;
        let entries = library::Entity::find()
            .filter(library::Column::UserId.eq(user_id))
            .order_by_asc(library::Column::Id)
            .all(&*self.db)
            .await?;

        let mut by_order: HashMap<String, Vec<library::Model>> = HashMap::new();
        for entry in entries {
            by_order.entry(entry.order_id.clone()).or_default().push(entry);
        }

        Ok(orders
            .into_iter()
            .map(|order| OrderHistory {
                items: by_order.remove(&order.order_id).unwrap_or_default(),
                order,
            })
            .collect())
    }

    #[instrument(skip(self))]
    pub async fn transactions(&self, user_id: i32) -> Result<Vec<transaction::Model>, ServiceError> {
        Ok(transaction::Entity::find()
            .filter(transaction::Column::UserId.eq(user_id))
            .order_by_desc(transaction::Column::Id)
            .all(&*self.db)
            .await?)
    }
}

/// Mints a public order reference such as `ORD-3F2A9C01B7D4`.
pub fn mint_order_id() -> String {
    let hex = Uuid::new_v4().simple().to_string().to_uppercase();
    format!("ORD-{}", &hex[..12])
}

pub async fn record_order<C: ConnectionTrait>(conn: &C, new: NewOrder) -> Result<order::Model, ServiceError> {
    let now = Utc::now();
    order::ActiveModel {
        user_id: Set(new.user_id),
        order_id: Set(new.order_id),
        total_amount: Set(new.total_amount),
        discount: Set(new.discount),
        final_amount: Set(new.final_amount),
        tra_id: Set(new.tra_id),
        kind: Set(new.kind),
        coupon_code: Set(new.coupon_code),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(conn)
    .await
    .map_err(|e| ServiceError::on_unique_violation(e, ServiceError::Conflict("Order already exists".into())))
}

pub async fn record_transaction<C: ConnectionTrait>(
    conn: &C,
    user_id: i32,
    amount: Decimal,
    title: String,
    order_id: &str,
) -> Result<transaction::Model, ServiceError> {
    Ok(transaction::ActiveModel {
        user_id: Set(user_id),
        amount: Set(amount),
        title: Set(title),
        order_id: Set(order_id.to_string()),
        created_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(conn)
    .await?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn order_ids_are_prefixed_and_unique() {
        let a = mint_order_id();
        let b = mint_order_id();
        assert!(a.starts_with("ORD-"));
        assert_eq!(a.len(), 16);
        assert!(a[4..].chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_lowercase()));
        assert_ne!(a, b);
    }
}
