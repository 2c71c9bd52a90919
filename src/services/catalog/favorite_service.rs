use crate::{
    entities::{book, favorite},
    errors::ServiceError,
    services::catalog::{rating_service, views::BookView},
};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::instrument;
use utoipa::ToSchema;
use validator::Validate;

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FavoriteInput {
    pub book_id: i32,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FavoriteItem {
    #[serde(flatten)]
    pub favorite: favorite::Model,
    pub book: BookView,
}

#[derive(Clone)]
pub struct FavoriteService {
    db: Arc<DatabaseConnection>,
}

impl FavoriteService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    #[instrument(skip(self))]
    pub async fn add(&self, user_id: i32, book_id: i32) -> Result<favorite::Model, ServiceError> {
        book::Entity::find_by_id(book_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Book not found".into()))?;

        let existing = favorite::Entity::find()
            .filter(favorite::Column::UserId.eq(user_id))
            .filter(favorite::Column::BookId.eq(book_id))
            .one(&*self.db)
            .await?;
        if existing.is_some() {
            return Err(already_favorite());
        }

        let now = Utc::now();
        favorite::ActiveModel {
            user_id: Set(user_id),
            book_id: Set(book_id),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&*self.db)
        .await
        .map_err(|e| ServiceError::on_unique_violation(e, already_favorite()))
    }

    #[instrument(skip(self))]
    pub async fn list(&self, user_id: i32) -> Result<Vec<FavoriteItem>, ServiceError> {
        let rows = favorite::Entity::find()
            .filter(favorite::Column::UserId.eq(user_id))
            .order_by_desc(favorite::Column::Id)
            .find_also_related(book::Entity)
            .all(&*self.db)
            .await?;
        let ids: Vec<i32> = rows
            .iter()
            .filter_map(|(_, b)| b.as_ref().map(|b| b.id))
            .collect();
        let ratings = rating_service::summaries(&*self.db, &ids).await?;

        Ok(rows
            .into_iter()
            .filter_map(|(favorite, book)| {
                let book = book?;
                let rating = ratings.get(&book.id).copied().unwrap_or_default();
                Some(FavoriteItem {
                    favorite,
                    book: BookView::public(book, rating),
                })
            })
            .collect())
    }

    #[instrument(skip(self))]
    pub async fn remove(&self, user_id: i32, book_id: i32) -> Result<(), ServiceError> {
        let result = favorite::Entity::delete_many()
            .filter(favorite::Column::UserId.eq(user_id))
            .filter(favorite::Column::BookId.eq(book_id))
            .exec(&*self.db)
            .await?;
        if result.rows_affected == 0 {
            return Err(ServiceError::NotFound("Favorite not found".into()));
        }
        Ok(())
    }
}

fn already_favorite() -> ServiceError {
    ServiceError::BadRequest("Book is already in favorites".into())
}
