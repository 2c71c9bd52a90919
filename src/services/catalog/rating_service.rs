use crate::{
    auth::AuthUser,
    entities::{book, rating},
    errors::ServiceError,
    services::catalog::views::RatingSummary,
};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, Set,
};
use serde::Deserialize;
use std::{collections::HashMap, sync::Arc};
use tracing::{info, instrument};
use utoipa::ToSchema;
use validator::Validate;

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RatingInput {
    pub book_id: i32,
    #[validate(range(min = 1, max = 5, message = "Rate must be between 1 and 5"))]
    pub rate: i32,
    pub review: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RatingUpdate {
    #[validate(range(min = 1, max = 5, message = "Rate must be between 1 and 5"))]
    pub rate: i32,
    pub review: Option<String>,
}

/// Book ratings written by readers
#[derive(Clone)]
pub struct RatingService {
    db: Arc<DatabaseConnection>,
}

impl RatingService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Rates a book once per user; the author name comes from the token.
    #[instrument(skip(self, user, input), fields(user_id = user.id, book_id = input.book_id))]
    pub async fn create(&self, user: &AuthUser, input: RatingInput) -> Result<rating::Model, ServiceError> {
        book::Entity::find_by_id(input.book_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Book not found".into()))?;

        let existing = rating::Entity::find()
            .filter(rating::Column::BookId.eq(input.book_id))
            .filter(rating::Column::UserId.eq(user.id))
            .one(&*self.db)
            .await?;
        if existing.is_some() {
            return Err(ServiceError::BadRequest(
                "You have already rated this book".into(),
            ));
        }

        let now = Utc::now();
        let model = rating::ActiveModel {
            book_id: Set(input.book_id),
            user_id: Set(user.id),
            user_name: Set(user.name.clone()),
            rate: Set(input.rate),
            review: Set(input.review),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&*self.db)
        .await?;

        info!(rating_id = model.id, "rating created");
        Ok(model)
    }

    #[instrument(skip(self, user, input), fields(user_id = user.id))]
    pub async fn update(
        &self,
        user: &AuthUser,
        id: i32,
        input: RatingUpdate,
    ) -> Result<rating::Model, ServiceError> {
        let existing = self.owned_by(user, id).await?;
        let mut model: rating::ActiveModel = existing.into();
        model.rate = Set(input.rate);
        model.review = Set(input.review);
        model.updated_at = Set(Utc::now());
        Ok(model.update(&*self.db).await?)
    }

    #[instrument(skip(self, user), fields(user_id = user.id))]
    pub async fn delete(&self, user: &AuthUser, id: i32) -> Result<(), ServiceError> {
        self.owned_by(user, id).await?;
        rating::Entity::delete_by_id(id).exec(&*self.db).await?;
        Ok(())
    }

    async fn owned_by(&self, user: &AuthUser, id: i32) -> Result<rating::Model, ServiceError> {
        let existing = rating::Entity::find_by_id(id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Rating not found".into()))?;
        if existing.user_id != user.id {
            return Err(ServiceError::Forbidden(
                "You can only modify your own rating".into(),
            ));
        }
        Ok(existing)
    }
}

/// Ratings of one book, newest first.
pub async fn for_book<C: ConnectionTrait>(conn: &C, book_id: i32) -> Result<Vec<rating::Model>, ServiceError> {
    Ok(rating::Entity::find()
        .filter(rating::Column::BookId.eq(book_id))
        .order_by_desc(rating::Column::Id)
        .all(conn)
        .await?)
}

/// Rating aggregates keyed by book id. Books without ratings are absent.
pub async fn summaries<C: ConnectionTrait>(
    conn: &C,
    book_ids: &[i32],
) -> Result<HashMap<i32, RatingSummary>, ServiceError> {
    if book_ids.is_empty() {
        return Ok(HashMap::new());
    }
    let ratings = rating::Entity::find()
        .filter(rating::Column::BookId.is_in(book_ids.iter().copied()))
        .all(conn)
        .await?;

    let mut rates: HashMap<i32, Vec<i32>> = HashMap::new();
    for r in ratings {
        rates.entry(r.book_id).or_default().push(r.rate);
    }
    Ok(rates
        .into_iter()
        .map(|(id, rs)| (id, RatingSummary::from_rates(rs)))
        .collect())
}
