use crate::{
    entities::{book, cart},
    errors::ServiceError,
    services::catalog::{rating_service, views::BookView},
};
use chrono::Utc;
use sea_orm::{
    sea_query::Expr, ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, Set,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};
use utoipa::ToSchema;
use validator::Validate;

fn default_qty() -> i32 {
    1
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AddToCartInput {
    pub book_id: i32,
    #[serde(default = "default_qty")]
    #[validate(range(min = 1, message = "Quantity must be greater than 0"))]
    pub qty: i32,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCartInput {
    #[validate(range(min = 1, message = "Quantity must be greater than 0"))]
    pub qty: i32,
}

/// Cart line with its book; the pdf stays hidden until purchase.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLine {
    #[serde(flatten)]
    pub line: cart::Model,
    pub book: BookView,
    pub average_rating: f64,
}

/// Pending cart lines, one per (user, book).
#[derive(Clone)]
pub struct CartService {
    db: Arc<DatabaseConnection>,
}

impl CartService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Adds a book to the cart, merging the quantity into an existing line.
    #[instrument(skip(self, input), fields(book_id = input.book_id, qty = input.qty))]
    pub async fn add_item(&self, user_id: i32, input: AddToCartInput) -> Result<cart::Model, ServiceError> {
        book::Entity::find_by_id(input.book_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Book not found".into()))?;

        if let Some(line) = self.find_line(user_id, input.book_id).await? {
            return self.bump(line, input.qty).await;
        }

        let now = Utc::now();
        let inserted = cart::ActiveModel {
            user_id: Set(user_id),
            book_id: Set(input.book_id),
            qty: Set(input.qty),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&*self.db)
        .await;

        match inserted {
            Ok(line) => {
                info!(cart_id = line.id, "book added to cart");
                Ok(line)
            }
            // A concurrent add created the line first; merge into it instead.
            Err(e) if ServiceError::is_unique_violation(&e) => {
                let line = self
                    .find_line(user_id, input.book_id)
                    .await?
                    .ok_or_else(|| ServiceError::Conflict("Cart changed concurrently".into()))?;
                self.bump(line, input.qty).await
            }
            Err(e) => Err(e.into()),
        }
    }

    #[instrument(skip(self))]
    pub async fn list(&self, user_id: i32) -> Result<Vec<CartLine>, ServiceError> {
        let rows = cart::Entity::find()
            .filter(cart::Column::UserId.eq(user_id))
            .order_by_desc(cart::Column::Id)
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
            .filter_map(|(line, book)| {
                let book = book?;
                let rating = ratings.get(&book.id).copied().unwrap_or_default();
                Some(CartLine {
                    line,
                    average_rating: rating.average,
                    book: BookView::public(book, rating),
                })
            })
            .collect())
    }

    #[instrument(skip(self))]
    pub async fn update_qty(&self, user_id: i32, id: i32, qty: i32) -> Result<cart::Model, ServiceError> {
        let line = self.owned_line(user_id, id).await?;
        let mut model: cart::ActiveModel = line.into();
        model.qty = Set(qty);
        model.updated_at = Set(Utc::now());
        Ok(model.update(&*self.db).await?)
    }

    #[instrument(skip(self))]
    pub async fn remove(&self, user_id: i32, id: i32) -> Result<(), ServiceError> {
        let result = cart::Entity::delete_many()
            .filter(cart::Column::Id.eq(id))
            .filter(cart::Column::UserId.eq(user_id))
            .exec(&*self.db)
            .await?;
        if result.rows_affected == 0 {
            return Err(ServiceError::NotFound("Cart item not found".into()));
        }
        Ok(())
    }

    async fn find_line(&self, user_id: i32, book_id: i32) -> Result<Option<cart::Model>, ServiceError> {
        Ok(cart::Entity::find()
            .filter(cart::Column::UserId.eq(user_id))
            .filter(cart::Column::BookId.eq(book_id))
            .one(&*self.db)
            .await?)
    }

    async fn owned_line(&self, user_id: i32, id: i32) -> Result<cart::Model, ServiceError> {
        cart::Entity::find_by_id(id)
            .filter(cart::Column::UserId.eq(user_id))
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Cart item not found".into()))
    }

    async fn bump(&self, line: cart::Model, qty: i32) -> Result<cart::Model, ServiceError> {
        cart::Entity::update_many()
            .col_expr(cart::Column::Qty, Expr::col(cart::Column::Qty).add(qty))
            .col_expr(cart::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(cart::Column::Id.eq(line.id))
            .exec(&*self.db)
            .await?;
        cart::Entity::find_by_id(line.id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Cart item not found".into()))
    }
}
