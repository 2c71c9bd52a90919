use crate::{
    auth::AuthUser,
    entities::{author, book, cart, favorite, plan, rating},
    errors::ServiceError,
    events::{Event, EventSender},
    services::{
        catalog::{
            rating_service,
            views::{BookView, RatingSummary},
        },
        commerce::library_service,
        notifications,
    },
};
use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, QuerySelect, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::{collections::HashMap, sync::Arc};
use tracing::{info, instrument};
use utoipa::ToSchema;
use validator::Validate;

/// How many same-author books the detail view suggests
const SIMILAR_BOOKS_LIMIT: u64 = 10;

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BookInput {
    #[validate(length(min = 1, message = "Name is required"))]
    pub name: String,
    #[validate(required(message = "Author is required"))]
    pub author_id: Option<i32>,
    #[serde(default)]
    pub image: Vec<String>,
    #[serde(default)]
    pub sample: Vec<String>,
    #[serde(default)]
    pub pdf: Vec<String>,
    #[serde(default)]
    pub tag: Vec<String>,
    #[validate(length(min = 1, message = "Description is required"))]
    pub description: String,
    #[validate(custom = "crate::services::validation::price")]
    #[schema(value_type = f64)]
    pub price: Decimal,
    /// Defaults to `price`
    #[validate(custom = "crate::services::validation::price")]
    #[schema(value_type = Option<f64>)]
    pub sell_price: Option<Decimal>,
    #[serde(default)]
    pub is_trending: bool,
    #[serde(default)]
    pub is_recommended: bool,
    #[serde(default)]
    pub is_premium: bool,
    pub subscription_id: Option<i32>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Storefront {
    pub books: Vec<BookView>,
    pub trending: Vec<BookView>,
    pub recommended: Vec<BookView>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookDetail {
    pub book: BookView,
    pub author: Option<author::Model>,
    pub user_rating: Option<rating::Model>,
    pub over_all_rating: f64,
    pub total_rating: u64,
    pub ratings: Vec<rating::Model>,
    pub similar_books: Vec<BookView>,
}

#[derive(Clone)]
pub struct BookService {
    db: Arc<DatabaseConnection>,
    event_sender: Arc<EventSender>,
}

impl BookService {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: Arc<EventSender>) -> Self {
        Self { db, event_sender }
    }

    /// All books, newest first.
    #[instrument(skip(self))]
    pub async fn list(&self, viewer: Option<i32>) -> Result<Vec<BookView>, ServiceError> {
        let books = book::Entity::find()
            .order_by_desc(book::Column::Id)
            .all(&*self.db)
            .await?;
        self.decorate(books, viewer).await
    }

    /// Full catalog plus the trending and recommended shelves.
    #[instrument(skip(self))]
    pub async fn storefront(&self, viewer: Option<i32>) -> Result<Storefront, ServiceError> {
        let books = self.list(viewer).await?;
        let trending = books.iter().filter(|v| v.book.is_trending).cloned().collect();
        let recommended = books
            .iter()
            .filter(|v| v.book.is_recommended)
            .cloned()
            .collect();
        Ok(Storefront {
            books,
            trending,
            recommended,
        })
    }

    #[instrument(skip(self, viewer))]
    pub async fn detail(&self, id: i32, viewer: Option<&AuthUser>) -> Result<BookDetail, ServiceError> {
        let book = find_book(&*self.db, id).await?;
        let author = author::Entity::find_by_id(book.author_id)
            .one(&*self.db)
            .await?;
        let ratings = rating_service::for_book(&*self.db, id).await?;
        let summary = RatingSummary::from_rates(ratings.iter().map(|r| r.rate));
        let user_rating = viewer.and_then(|u| ratings.iter().find(|r| r.user_id == u.id).cloned());

        let similar = book::Entity::find()
            .filter(book::Column::AuthorId.eq(book.author_id))
            .filter(book::Column::Id.ne(book.id))
            .order_by_desc(book::Column::Id)
            .limit(SIMILAR_BOOKS_LIMIT)
            .all(&*self.db)
            .await?;
        let similar_books = self.decorate(similar, viewer.map(|u| u.id)).await?;

        let readable = match viewer {
            Some(user) => library_service::readable_book_ids(&*self.db, user.id, std::slice::from_ref(&book))
                .await?
                .contains(&book.id),
            None => false,
        };

        Ok(BookDetail {
            book: BookView::new(book, summary, readable),
            author,
            user_rating,
            over_all_rating: summary.average,
            total_rating: summary.total,
            ratings,
            similar_books,
        })
    }

    /// Publishes a book, records its notification and announces it.
    #[instrument(skip(self, input), fields(name = %input.name))]
    pub async fn create(&self, input: BookInput) -> Result<book::Model, ServiceError> {
        let txn = self.db.begin().await?;
        let author_id = check_references(&txn, &input).await?;

        let now = Utc::now();
        let mut model = book::ActiveModel {
            created_at: Set(now),
            ..Default::default()
        };
        apply_input(&mut model, author_id, input);
        model.updated_at = Set(now);
        let book = model.insert(&txn).await?;

        notifications::record_book_published(&txn, book.id, &book.name).await?;
        txn.commit().await?;

        self.event_sender
            .send_or_log(Event::BookPublished {
                book_id: book.id,
                title: book.name.clone(),
            })
            .await;

        info!(book_id = book.id, "book created");
        Ok(book)
    }

    #[instrument(skip(self, input))]
    pub async fn update(&self, id: i32, input: BookInput) -> Result<book::Model, ServiceError> {
        let existing = find_book(&*self.db, id).await?;
        let author_id = check_references(&*self.db, &input).await?;

        let mut model: book::ActiveModel = existing.into();
        apply_input(&mut model, author_id, input);
        model.updated_at = Set(Utc::now());
        Ok(model.update(&*self.db).await?)
    }

    /// Removes a book with its ratings, favorites and pending cart lines.
    /// Library entries and orders are kept as purchase history.
    #[instrument(skip(self))]
    pub async fn delete(&self, id: i32) -> Result<(), ServiceError> {
        let txn = self.db.begin().await?;
        let result = book::Entity::delete_by_id(id).exec(&txn).await?;
        if result.rows_affected == 0 {
            return Err(ServiceError::NotFound("Book not found".into()));
        }
        rating::Entity::delete_many()
            .filter(rating::Column::BookId.eq(id))
            .exec(&txn)
            .await?;
        favorite::Entity::delete_many()
            .filter(favorite::Column::BookId.eq(id))
            .exec(&txn)
            .await?;
        cart::Entity::delete_many()
            .filter(cart::Column::BookId.eq(id))
            .exec(&txn)
            .await?;
        txn.commit().await?;

        info!(book_id = id, "book deleted");
        Ok(())
    }

    async fn decorate(&self, books: Vec<book::Model>, viewer: Option<i32>) -> Result<Vec<BookView>, ServiceError> {
        let ids: Vec<i32> = books.iter().map(|b| b.id).collect();
        let ratings: HashMap<i32, RatingSummary> = rating_service::summaries(&*self.db, &ids).await?;
        let readable = match viewer {
            Some(user_id) => library_service::readable_book_ids(&*self.db, user_id, &books).await?,
            None => Default::default(),
        };
        Ok(books
            .into_iter()
            .map(|b| {
                let rating = ratings.get(&b.id).copied().unwrap_or_default();
                let can_read = readable.contains(&b.id);
                BookView::new(b, rating, can_read)
            })
            .collect())
    }
}

pub async fn find_book<C: ConnectionTrait>(conn: &C, id: i32) -> Result<book::Model, ServiceError> {
    book::Entity::find_by_id(id)
        .one(conn)
        .await?
        .ok_or_else(|| ServiceError::NotFound("Book not found".into()))
}

async fn check_references<C: ConnectionTrait>(conn: &C, input: &BookInput) -> Result<i32, ServiceError> {
    let author_id = input
        .author_id
        .ok_or_else(|| ServiceError::invalid_field("authorId", "Author is required"))?;
    author::Entity::find_by_id(author_id)
        .one(conn)
        .await?
        .ok_or_else(|| ServiceError::NotFound("Author not found".into()))?;

    if let Some(plan_id) = input.subscription_id {
        plan::Entity::find_by_id(plan_id)
            .one(conn)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Plan not found".into()))?;
    }
    Ok(author_id)
}

fn apply_input(model: &mut book::ActiveModel, author_id: i32, input: BookInput) {
    let sell_price = input.sell_price.unwrap_or(input.price);
    model.name = Set(input.name);
    model.author_id = Set(author_id);
    model.image = Set(input.image.into());
    model.sample = Set(input.sample.into());
    model.pdf = Set(input.pdf.into());
    model.tag = Set(input.tag.into());
    model.description = Set(input.description);
    model.price = Set(input.price.round_dp(2));
    model.sell_price = Set(sell_price.round_dp(2));
    model.is_trending = Set(input.is_trending);
    model.is_recommended = Set(input.is_recommended);
    model.is_premium = Set(input.is_premium);
    model.subscription_id = Set(input.subscription_id);
}
