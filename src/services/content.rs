//! Storefront content managed by staff: banners and FAQs.

use crate::{
    entities::{banner, faq},
    errors::ServiceError,
};
use chrono::Utc;
use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait, QueryOrder, Set};
use serde::Deserialize;
use std::sync::Arc;
use tracing::instrument;
use utoipa::ToSchema;
use validator::Validate;

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BannerInput {
    #[validate(length(min = 1, message = "Image is required"))]
    pub image: String,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FaqInput {
    #[validate(length(min = 1, message = "Question is required"))]
    pub question: String,
    #[validate(length(min = 1, message = "Answer is required"))]
    pub answer: String,
}

#[derive(Clone)]
pub struct ContentService {
    db: Arc<DatabaseConnection>,
}

impl ContentService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    #[instrument(skip(self))]
    pub async fn banners(&self) -> Result<Vec<banner::Model>, ServiceError> {
        Ok(banner::Entity::find()
            .order_by_desc(banner::Column::Id)
            .all(&*self.db)
            .await?)
    }

    #[instrument(skip(self, input))]
    pub async fn create_banner(&self, input: BannerInput) -> Result<banner::Model, ServiceError> {
        let now = Utc::now();
        Ok(banner::ActiveModel {
            image: Set(input.image),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&*self.db)
        .await?)
    }

    #[instrument(skip(self))]
    pub async fn delete_banner(&self, id: i32) -> Result<(), ServiceError> {
        let result = banner::Entity::delete_by_id(id).exec(&*self.db).await?;
        if result.rows_affected == 0 {
            return Err(ServiceError::NotFound("Banner not found".into()));
        }
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn faqs(&self) -> Result<Vec<faq::Model>, ServiceError> {
        Ok(faq::Entity::find()
            .order_by_asc(faq::Column::Id)
            .all(&*self.db)
            .await?)
    }

    #[instrument(skip(self, input))]
    pub async fn create_faq(&self, input: FaqInput) -> Result<faq::Model, ServiceError> {
        let now = Utc::now();
        Ok(faq::ActiveModel {
            question: Set(input.question),
            answer: Set(input.answer),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&*self.db)
        .await?)
    }

    #[instrument(skip(self, input))]
    pub async fn update_faq(&self, id: i32, input: FaqInput) -> Result<faq::Model, ServiceError> {
        let existing = faq::Entity::find_by_id(id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound("FAQ not found".into()))?;
        let mut model: faq::ActiveModel = existing.into();
        model.question = Set(input.question);
        model.answer = Set(input.answer);
        model.updated_at = Set(Utc::now());
        Ok(model.update(&*self.db).await?)
    }

    #[instrument(skip(self))]
    pub async fn delete_faq(&self, id: i32) -> Result<(), ServiceError> {
        let result = faq::Entity::delete_by_id(id).exec(&*self.db).await?;
        if result.rows_affected == 0 {
            return Err(ServiceError::NotFound("FAQ not found".into()));
        }
        Ok(())
    }
}
