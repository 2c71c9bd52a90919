use crate::{entities::plan, errors::ServiceError};
use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait, QueryOrder, Set};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{info, instrument};
use utoipa::ToSchema;
use validator::Validate;

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PlanInput {
    #[validate(length(min = 1, message = "Image URL is required"))]
    pub image: String,
    #[validate(length(min = 1, message = "Title is required"))]
    pub title: String,
    #[validate(custom = "crate::services::validation::benefits")]
    pub benefits: Vec<String>,
    /// Display label such as "1 Month"
    #[validate(length(min = 1, message = "Duration is required"))]
    pub duration: String,
    #[validate(range(min = 1, message = "Duration days must be at least 1"))]
    pub duration_days: i32,
    #[validate(custom = "crate::services::validation::price")]
    #[schema(value_type = f64)]
    pub price: Decimal,
    #[validate(custom = "crate::services::validation::price")]
    #[schema(value_type = Option<f64>)]
    pub price_in_month: Option<Decimal>,
    #[validate(custom = "crate::services::validation::price")]
    #[schema(value_type = Option<f64>)]
    pub price_in_years: Option<Decimal>,
    #[serde(default)]
    #[validate(range(min = 0, max = 100, message = "Save percent must be between 0 and 100"))]
    pub save_percent: i32,
}

/// Subscription plans offered in the store
#[derive(Clone)]
pub struct PlanService {
    db: Arc<DatabaseConnection>,
}

impl PlanService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    #[instrument(skip(self))]
    pub async fn list(&self) -> Result<Vec<plan::Model>, ServiceError> {
        Ok(plan::Entity::find()
            .order_by_asc(plan::Column::Id)
            .all(&*self.db)
            .await?)
    }

    #[instrument(skip(self))]
    pub async fn get(&self, id: i32) -> Result<plan::Model, ServiceError> {
        plan::Entity::find_by_id(id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Plan not found".into()))
    }

    #[instrument(skip(self, input), fields(title = %input.title))]
    pub async fn create(&self, input: PlanInput) -> Result<plan::Model, ServiceError> {
        let now = Utc::now();
        let mut model = plan::ActiveModel {
            created_at: Set(now),
            ..Default::default()
        };
        apply_input(&mut model, input);
        model.updated_at = Set(now);
        let plan = model.insert(&*self.db).await?;

        info!(plan_id = plan.id, "plan created");
        Ok(plan)
    }

    #[instrument(skip(self, input))]
    pub async fn update(&self, id: i32, input: PlanInput) -> Result<plan::Model, ServiceError> {
        let existing = self.get(id).await?;
        let mut model: plan::ActiveModel = existing.into();
        apply_input(&mut model, input);
        model.updated_at = Set(Utc::now());
        Ok(model.update(&*self.db).await?)
    }

    #[instrument(skip(self))]
    pub async fn delete(&self, id: i32) -> Result<(), ServiceError> {
        let result = plan::Entity::delete_by_id(id).exec(&*self.db).await?;
        if result.rows_affected == 0 {
            return Err(ServiceError::NotFound("Plan not found".into()));
        }
        Ok(())
    }
}

fn apply_input(model: &mut plan::ActiveModel, input: PlanInput) {
    model.image = Set(input.image);
    model.title = Set(input.title);
    model.benefits = Set(input.benefits.into());
    model.duration = Set(input.duration);
    model.duration_days = Set(input.duration_days);
    model.price = Set(input.price.round_dp(2));
    model.price_in_month = Set(input.price_in_month.unwrap_or(Decimal::ZERO).round_dp(2));
    model.price_in_years = Set(input.price_in_years.unwrap_or(Decimal::ZERO).round_dp(2));
    model.save_percent = Set(input.save_percent);
}
