use crate::{
    entities::{
        order::{self, OrderKind},
        plan, premium, user,
    },
    errors::ServiceError,
    events::{Event, EventSender},
    services::commerce::{
        coupon_service,
        order_service::{self, NewOrder},
        pricing,
    },
};
use chrono::{DateTime, Duration, Utc};
use metrics::counter;
use rust_decimal::Decimal;
use sea_orm::{
    sea_query::Expr, ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};
use utoipa::ToSchema;
use validator::Validate;

/// Records a subscription paid for outside the store.
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RecordPremiumInput {
    pub plan_id: i32,
    #[validate(length(min = 1, message = "Order id is required"))]
    pub order_id: String,
    pub tr_id: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PurchasePlanInput {
    pub plan_id: i32,
    #[validate(length(min = 1, message = "Transaction id is required"))]
    pub tra_id: String,
    pub coupon: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PremiumView {
    #[serde(flatten)]
    pub premium: premium::Model,
    pub plan: Option<plan::Model>,
    pub active: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionReceipt {
    pub order: order::Model,
    pub premium: premium::Model,
}

/// A past or current subscription as shown to staff.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionHistory {
    #[serde(flatten)]
    pub premium: premium::Model,
    pub plan_title: Option<String>,
    pub plan_price: Option<Decimal>,
}

/// Expiry of a grant bought at `purchased_at` for `plan`.
pub fn expiry_for(plan: &plan::Model, purchased_at: DateTime<Utc>) -> DateTime<Utc> {
    purchased_at + Duration::days(i64::from(plan.duration_days))
}

#[derive(Clone)]
pub struct SubscriptionService {
    db: Arc<DatabaseConnection>,
    event_sender: Arc<EventSender>,
}

impl SubscriptionService {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: Arc<EventSender>) -> Self {
        Self { db, event_sender }
    }

    #[instrument(skip(self, input), fields(plan_id = input.plan_id))]
    pub async fn record(&self, user_id: i32, input: RecordPremiumInput) -> Result<premium::Model, ServiceError> {
        let txn = self.db.begin().await?;
        let plan = find_plan(&txn, input.plan_id).await?;
        lock_user(&txn, user_id).await?;
        ensure_not_subscribed(&txn, user_id, plan.id).await?;

        let premium = grant(
            &txn,
            user_id,
            &plan,
            input.order_id,
            input.tr_id.unwrap_or_default(),
        )
        .await?;
        txn.commit().await?;

        info!(premium_id = premium.id, "subscription recorded");
        Ok(premium)
    }

    /// Sells a plan: coupon, order, premium grant and transaction in one unit.
    #[instrument(skip(self, input), fields(plan_id = input.plan_id, coupon = ?input.coupon))]
    pub async fn purchase(&self, user_id: i32, input: PurchasePlanInput) -> Result<SubscriptionReceipt, ServiceError> {
        let txn = self.db.begin().await?;
        let plan = find_plan(&txn, input.plan_id).await?;
        lock_user(&txn, user_id).await?;
        ensure_not_subscribed(&txn, user_id, plan.id).await?;

        let total = pricing::cart_total([plan.price]);
        let (discount, coupon_code) = match input.coupon.as_deref().map(str::trim).filter(|c| !c.is_empty()) {
            Some(code) => {
                let coupon = coupon_service::redeem(&txn, code).await?;
                (pricing::discount_for(&coupon, total), Some(coupon.coupon))
            }
            None => (Decimal::ZERO, None),
        };
        let final_amount = total - discount;

        let order = order_service::record_order(
            &txn,
            NewOrder {
                user_id,
                order_id: order_service::mint_order_id(),
                total_amount: total,
                discount,
                final_amount,
                tra_id: input.tra_id.clone(),
                kind: OrderKind::Plan,
                coupon_code,
            },
        )
        .await?;

        let premium = grant(&txn, user_id, &plan, order.order_id.clone(), input.tra_id).await?;
        order_service::record_transaction(
            &txn,
            user_id,
            final_amount,
            format!("Subscription: {}", plan.title),
            &order.order_id,
        )
        .await?;
        txn.commit().await?;

        counter!("bookstore_subscriptions_total", 1);
        self.event_sender
            .send_or_log(Event::SubscriptionStarted {
                order_id: order.order_id.clone(),
                user_id,
                plan_id: plan.id,
                expire_on: premium.expire_on,
            })
            .await;

        info!(order_id = %order.order_id, %final_amount, "subscription purchased");
        Ok(SubscriptionReceipt { order, premium })
    }

    #[instrument(skip(self))]
    pub async fn list(&self, user_id: i32) -> Result<Vec<PremiumView>, ServiceError> {
        let now = Utc::now();
        let rows = premium::Entity::find()
            .filter(premium::Column::UserId.eq(user_id))
            .order_by_desc(premium::Column::Id)
            .find_also_related(plan::Entity)
            .all(&*self.db)
            .await?;
        Ok(rows
            .into_iter()
            .map(|(premium, plan)| PremiumView {
                active: premium.is_active_at(now),
                premium,
                plan,
            })
            .collect())
    }

    /// Ends the user's active grants for a plan.
    #[instrument(skip(self))]
    pub async fn cancel(&self, user_id: i32, plan_id: i32) -> Result<(), ServiceError> {
        let result = premium::Entity::update_many()
            .col_expr(premium::Column::Status, Expr::value(false))
            .col_expr(premium::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(premium::Column::UserId.eq(user_id))
            .filter(premium::Column::PlanId.eq(plan_id))
            .filter(premium::Column::Status.eq(true))
            .exec(&*self.db)
            .await?;
        if result.rows_affected == 0 {
            return Err(ServiceError::NotFound("Subscription not found".into()));
        }
        info!(plan_id, "subscription cancelled");
        Ok(())
    }

    pub async fn history(&self, user_id: i32) -> Result<Vec<SubscriptionHistory>, ServiceError> {
        let rows = premium::Entity::find()
            .filter(premium::Column::UserId.eq(user_id))
            .order_by_desc(premium::Column::Id)
            .find_also_related(plan::Entity)
            .all(&*self.db)
            .await?;
        Ok(rows
            .into_iter()
            .map(|(premium, plan)| SubscriptionHistory {
                premium,
                plan_title: plan.as_ref().map(|p| p.title.clone()),
                plan_price: plan.map(|p| p.price),
            })
            .collect())
    }
}

/// Whether the user holds any active, unexpired grant.
pub async fn is_premium<C: ConnectionTrait>(conn: &C, user_id: i32) -> Result<bool, ServiceError> {
    let active = premium::Entity::find()
        .filter(premium::Column::UserId.eq(user_id))
        .filter(premium::Column::Status.eq(true))
        .filter(premium::Column::ExpireOn.gt(Utc::now()))
        .count(conn)
        .await?;
    Ok(active > 0)
}

async fn find_plan<C: ConnectionTrait>(conn: &C, plan_id: i32) -> Result<plan::Model, ServiceError> {
    plan::Entity::find_by_id(plan_id)
        .one(conn)
        .await?
        .ok_or_else(|| ServiceError::NotFound("Plan not found".into()))
}

/// Takes the user's row lock so concurrent purchases for the same user run
/// their duplicate check one after another. SQLite serializes writers and
/// drops the clause.
async fn lock_user<C: ConnectionTrait>(conn: &C, user_id: i32) -> Result<(), ServiceError> {
    user::Entity::find_by_id(user_id)
        .lock_exclusive()
        .one(conn)
        .await?
        .map(|_| ())
        .ok_or_else(|| ServiceError::NotFound("User not found".into()))
}

async fn ensure_not_subscribed<C: ConnectionTrait>(conn: &C, user_id: i32, plan_id: i32) -> Result<(), ServiceError> {
    let active = premium::Entity::find()
        .filter(premium::Column::UserId.eq(user_id))
        .filter(premium::Column::PlanId.eq(plan_id))
        .filter(premium::Column::Status.eq(true))
        .filter(premium::Column::ExpireOn.gt(Utc::now()))
        .count(conn)
        .await?;
    if active > 0 {
        return Err(ServiceError::BadRequest(
            "Premium subscription already exists for the user".into(),
        ));
    }
    Ok(())
}

async fn grant<C: ConnectionTrait>(
    conn: &C,
    user_id: i32,
    plan: &plan::Model,
    order_id: String,
    tr_id: String,
) -> Result<premium::Model, ServiceError> {
    let now = Utc::now();
    Ok(premium::ActiveModel {
        user_id: Set(user_id),
        plan_id: Set(plan.id),
        order_id: Set(order_id),
        status: Set(true),
        purchased_at: Set(now),
        expire_on: Set(expiry_for(plan, now)),
        tr_id: Set(tr_id),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(conn)
    .await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;
    use serde_json::json;

    #[test]
    fn expiry_adds_plan_duration() {
        let bought = Utc.with_ymd_and_hms(2024, 1, 30, 12, 0, 0).unwrap();
        let plan = plan::Model {
            id: 1,
            image: "/uploads/gold.png".into(),
            title: "Gold".into(),
            benefits: json!(["All premium books"]),
            duration: "1 Month".into(),
            duration_days: 30,
            price: dec!(9.99),
            price_in_month: dec!(9.99),
            price_in_years: dec!(99),
            save_percent: 10,
            created_at: bought,
            updated_at: bought,
        };
        assert_eq!(
            expiry_for(&plan, bought),
            Utc.with_ymd_and_hms(2024, 2, 29, 12, 0, 0).unwrap()
        );
    }
}
