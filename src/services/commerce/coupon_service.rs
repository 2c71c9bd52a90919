use crate::{
    entities::coupon::{self, CouponKind},
    errors::ServiceError,
};
use chrono::Utc;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use sea_orm::{
    sea_query::Expr, ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection,
    EntityTrait, QueryFilter, QueryOrder, Set,
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{info, instrument};
use utoipa::ToSchema;
use validator::Validate;

const INVALID_COUPON: &str = "Invalid Coupon";

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CouponInput {
    #[validate(length(min = 1, message = "Coupon code is required"))]
    pub coupon: String,
    #[serde(rename = "type")]
    pub kind: CouponKind,
    #[validate(custom = "crate::services::validation::non_negative")]
    #[schema(value_type = f64)]
    pub value: Decimal,
    #[validate(range(min = 1, message = "Quantity must be greater than 0"))]
    pub qty: i32,
    pub description: Option<String>,
}

impl CouponInput {
    fn check_value(&self) -> Result<(), ServiceError> {
        if self.kind == CouponKind::Percent && self.value > dec!(100) {
            return Err(ServiceError::invalid_field(
                "value",
                "Percent value must be between 0 and 100",
            ));
        }
        Ok(())
    }
}

/// Coupon administration and redemption
#[derive(Clone)]
pub struct CouponService {
    db: Arc<DatabaseConnection>,
}

impl CouponService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    #[instrument(skip(self))]
    pub async fn list(&self) -> Result<Vec<coupon::Model>, ServiceError> {
        Ok(coupon::Entity::find()
            .order_by_desc(coupon::Column::Id)
            .all(&*self.db)
            .await?)
    }

    #[instrument(skip(self, input), fields(code = %input.coupon))]
    pub async fn create(&self, input: CouponInput) -> Result<coupon::Model, ServiceError> {
        input.check_value()?;
        let code = input.coupon.trim().to_string();
        self.ensure_code_free(&code, None).await?;

        let now = Utc::now();
        let model = coupon::ActiveModel {
            coupon: Set(code),
            kind: Set(input.kind),
            value: Set(input.value),
            qty: Set(input.qty),
            description: Set(input.description),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&*self.db)
        .await
        .map_err(|e| {
            ServiceError::on_unique_violation(
                e,
                ServiceError::BadRequest("Coupon code already exists".into()),
            )
        })?;

        info!(coupon_id = model.id, "coupon created");
        Ok(model)
    }

    #[instrument(skip(self, input))]
    pub async fn update(&self, id: i32, input: CouponInput) -> Result<coupon::Model, ServiceError> {
        input.check_value()?;
        let existing = self.find(id).await?;
        let code = input.coupon.trim().to_string();
        self.ensure_code_free(&code, Some(id)).await?;

        let mut model: coupon::ActiveModel = existing.into();
        model.coupon = Set(code);
        model.kind = Set(input.kind);
        model.value = Set(input.value);
        model.qty = Set(input.qty);
        model.description = Set(input.description);
        model.updated_at = Set(Utc::now());
        Ok(model.update(&*self.db).await?)
    }

    #[instrument(skip(self))]
    pub async fn delete(&self, id: i32) -> Result<(), ServiceError> {
        let result = coupon::Entity::delete_by_id(id).exec(&*self.db).await?;
        if result.rows_affected == 0 {
            return Err(ServiceError::NotFound("Coupon not found".into()));
        }
        Ok(())
    }

    /// Looks up a redeemable coupon without consuming it.
    #[instrument(skip(self))]
    pub async fn check(&self, code: &str) -> Result<coupon::Model, ServiceError> {
        find_redeemable(&*self.db, code).await
    }

    async fn find(&self, id: i32) -> Result<coupon::Model, ServiceError> {
        coupon::Entity::find_by_id(id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Coupon not found".into()))
    }

    async fn ensure_code_free(&self, code: &str, except: Option<i32>) -> Result<(), ServiceError> {
        let mut query = coupon::Entity::find().filter(coupon::Column::Coupon.eq(code));
        if let Some(id) = except {
            query = query.filter(coupon::Column::Id.ne(id));
        }
        if query.one(&*self.db).await?.is_some() {
            return Err(ServiceError::BadRequest("Coupon code already exists".into()));
        }
        Ok(())
    }
}

async fn find_redeemable<C: ConnectionTrait>(
    conn: &C,
    code: &str,
) -> Result<coupon::Model, ServiceError> {
    coupon::Entity::find()
        .filter(coupon::Column::Coupon.eq(code.trim()))
        .filter(coupon::Column::Qty.gt(0))
        .one(conn)
        .await?
        .ok_or_else(|| ServiceError::BadRequest(INVALID_COUPON.into()))
}

/// Consumes one use of `code` on `conn`.
///
/// The decrement is conditional on uses remaining, so two redemptions racing
/// for the last use cannot both succeed.
pub async fn redeem<C: ConnectionTrait>(conn: &C, code: &str) -> Result<coupon::Model, ServiceError> {
    let coupon = find_redeemable(conn, code).await?;

    let result = coupon::Entity::update_many()
        .col_expr(coupon::Column::Qty, Expr::col(coupon::Column::Qty).sub(1))
        .col_expr(coupon::Column::UpdatedAt, Expr::value(Utc::now()))
        .filter(coupon::Column::Id.eq(coupon.id))
        .filter(coupon::Column::Qty.gt(0))
        .exec(conn)
        .await?;

    if result.rows_affected == 0 {
        return Err(ServiceError::BadRequest(INVALID_COUPON.into()));
    }
    Ok(coupon)
}
