use crate::{
    entities::{
        book,
        library::{self, LibrarySource},
        premium,
    },
    errors::ServiceError,
    services::catalog::{
        rating_service,
        views::BookView,
    },
};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, Set,
};
use serde::{Deserialize, Serialize};
use std::{collections::HashSet, sync::Arc};
use tracing::{info, instrument};
use utoipa::ToSchema;
use validator::Validate;

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LibraryInput {
    pub book_id: i32,
    #[validate(length(min = 1, message = "Order id is required"))]
    pub order_id: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LibraryItem {
    #[serde(flatten)]
    pub entry: library::Model,
    pub book: BookView,
}

/// Everything a user may read: owned books plus books unlocked by an active plan.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LibraryListing {
    pub books: Vec<LibraryItem>,
    pub subscription_books: Vec<BookView>,
}

#[derive(Clone)]
pub struct LibraryService {
    db: Arc<DatabaseConnection>,
}

impl LibraryService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Grants a book against an externally settled order.
    #[instrument(skip(self, input), fields(book_id = input.book_id))]
    pub async fn add(&self, user_id: i32, input: LibraryInput) -> Result<library::Model, ServiceError> {
        let book = book::Entity::find_by_id(input.book_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Book not found".into()))?;

        let already = library::Entity::find()
            .filter(library::Column::UserId.eq(user_id))
            .filter(library::Column::BookId.eq(book.id))
            .one(&*self.db)
            .await?;
        if already.is_some() {
            return Err(already_in_library());
        }

        let entry = library::ActiveModel {
            user_id: Set(user_id),
            book_id: Set(book.id),
            order_id: Set(input.order_id),
            source: Set(LibrarySource::Purchase),
            amount: Set(book.sell_price),
            created_at: Set(Utc::now()),
            ..Default::default()
        }
        .insert(&*self.db)
        .await
        .map_err(|e| ServiceError::on_unique_violation(e, already_in_library()))?;

        info!(library_id = entry.id, "book added to library");
        Ok(entry)
    }

    #[instrument(skip(self))]
    pub async fn list(&self, user_id: i32) -> Result<LibraryListing, ServiceError> {
        let rows = library::Entity::find()
            .filter(library::Column::UserId.eq(user_id))
            .order_by_desc(library::Column::Id)
            .find_also_related(book::Entity)
            .all(&*self.db)
            .await?;

        let plan_ids = active_plan_ids(&*self.db, user_id).await?;
        let subscription_books = if plan_ids.is_empty() {
            Vec::new()
        } else {
            book::Entity::find()
                .filter(book::Column::IsPremium.eq(true))
                .filter(book::Column::SubscriptionId.is_in(plan_ids.iter().copied()))
                .order_by_desc(book::Column::Id)
                .all(&*self.db)
                .await?
        };

        let mut ids: Vec<i32> = rows
            .iter()
            .filter_map(|(_, b)| b.as_ref().map(|b| b.id))
            .collect();
        ids.extend(subscription_books.iter().map(|b| b.id));
        let ratings = rating_service::summaries(&*self.db, &ids).await?;

        let books = rows
            .into_iter()
            .filter_map(|(entry, book)| {
                let book = book?;
                let rating = ratings.get(&book.id).copied().unwrap_or_default();
                Some(LibraryItem {
                    entry,
                    book: BookView::owned(book, rating),
                })
            })
            .collect();
        let subscription_books = subscription_books
            .into_iter()
            .map(|b| {
                let rating = ratings.get(&b.id).copied().unwrap_or_default();
                BookView::owned(b, rating)
            })
            .collect();

        Ok(LibraryListing {
            books,
            subscription_books,
        })
    }

    #[instrument(skip(self))]
    pub async fn remove(&self, user_id: i32, book_id: i32) -> Result<(), ServiceError> {
        let result = library::Entity::delete_many()
            .filter(library::Column::UserId.eq(user_id))
            .filter(library::Column::BookId.eq(book_id))
            .exec(&*self.db)
            .await?;
        if result.rows_affected == 0 {
            return Err(ServiceError::NotFound("Book not found in library".into()));
        }
        Ok(())
    }
}

fn already_in_library() -> ServiceError {
    ServiceError::BadRequest("Book is already in the library".into())
}

/// Plans the user currently holds an active, unexpired premium grant for.
pub async fn active_plan_ids<C: ConnectionTrait>(
    conn: &C,
    user_id: i32,
) -> Result<HashSet<i32>, ServiceError> {
    let now = Utc::now();
    Ok(premium::Entity::find()
        .filter(premium::Column::UserId.eq(user_id))
        .filter(premium::Column::Status.eq(true))
        .filter(premium::Column::ExpireOn.gt(now))
        .all(conn)
        .await?
        .into_iter()
        .map(|p| p.plan_id)
        .collect())
}

/// Ids among `books` the user owns or has unlocked through a plan.
pub async fn readable_book_ids<C: ConnectionTrait>(
    conn: &C,
    user_id: i32,
    books: &[book::Model],
) -> Result<HashSet<i32>, ServiceError> {
    if books.is_empty() {
        return Ok(HashSet::new());
    }

    let ids: Vec<i32> = books.iter().map(|b| b.id).collect();
    let mut readable = owned_book_ids(conn, user_id, &ids).await?;

    if books.iter().any(|b| b.is_premium) {
        let plans = active_plan_ids(conn, user_id).await?;
        readable.extend(
            books
                .iter()
                .filter(|b| b.is_premium)
                .filter(|b| b.subscription_id.is_some_and(|plan| plans.contains(&plan)))
                .map(|b| b.id),
        );
    }
    Ok(readable)
}

/// Books among `book_ids` that the user already owns.
pub async fn owned_book_ids<C: ConnectionTrait>(
    conn: &C,
    user_id: i32,
    book_ids: &[i32],
) -> Result<HashSet<i32>, ServiceError> {
    if book_ids.is_empty() {
        return Ok(HashSet::new());
    }
    Ok(library::Entity::find()
        .filter(library::Column::UserId.eq(user_id))
        .filter(library::Column::BookId.is_in(book_ids.iter().copied()))
        .all(conn)
        .await?
        .into_iter()
        .map(|entry| entry.book_id)
        .collect())
}
