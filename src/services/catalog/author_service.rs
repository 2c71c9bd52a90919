use crate::{
    entities::{author, book, library, rating},
    errors::ServiceError,
    services::catalog::{rating_service, views::BookView},
};
use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set,
};
use serde::{Deserialize, Serialize};
use std::{collections::HashMap, sync::Arc};
use tracing::{info, instrument};
use utoipa::ToSchema;
use validator::Validate;

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AuthorInput {
    #[validate(length(min = 1, message = "Name is required"))]
    pub name: String,
    /// Opening balance; only honoured on create
    #[validate(custom = "crate::services::validation::royalty")]
    #[schema(value_type = Option<f64>)]
    pub royalty: Option<Decimal>,
    #[validate(custom = "crate::services::validation::royalty_percent")]
    #[schema(value_type = f64)]
    pub percent: Decimal,
}

/// Author row with sales figures derived from library entries.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthorSummary {
    #[serde(flatten)]
    pub author: author::Model,
    pub total_books: u64,
    pub total_sale: u64,
    pub sales_amount: Decimal,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthorDetail {
    #[serde(flatten)]
    pub author: author::Model,
    pub books: Vec<BookView>,
    pub ratings: Vec<rating::Model>,
}

#[derive(Clone)]
pub struct AuthorService {
    db: Arc<DatabaseConnection>,
}

impl AuthorService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    #[instrument(skip(self))]
    pub async fn list(&self) -> Result<Vec<AuthorSummary>, ServiceError> {
        let authors = author::Entity::find()
            .order_by_desc(author::Column::Id)
            .all(&*self.db)
            .await?;
        let books = book::Entity::find().all(&*self.db).await?;
        let author_of: HashMap<i32, i32> = books.iter().map(|b| (b.id, b.author_id)).collect();

        let mut book_counts: HashMap<i32, u64> = HashMap::new();
        for b in &books {
            *book_counts.entry(b.author_id).or_default() += 1;
        }

        let mut sales: HashMap<i32, (u64, Decimal)> = HashMap::new();
        if !author_of.is_empty() {
            let entries = library::Entity::find()
                .filter(library::Column::BookId.is_in(author_of.keys().copied()))
                .all(&*self.db)
                .await?;
            for entry in entries {
                if let Some(author_id) = author_of.get(&entry.book_id) {
                    let slot = sales.entry(*author_id).or_insert((0, Decimal::ZERO));
                    slot.0 += 1;
                    slot.1 += entry.amount;
                }
            }
        }

        Ok(authors
            .into_iter()
            .map(|a| {
                let (total_sale, sales_amount) = sales.get(&a.id).copied().unwrap_or((0, Decimal::ZERO));
                AuthorSummary {
                    total_books: book_counts.get(&a.id).copied().unwrap_or(0),
                    total_sale,
                    sales_amount: sales_amount.round_dp(2),
                    author: a,
                }
            })
            .collect())
    }

    /// Author with their books and every rating those books received.
    #[instrument(skip(self))]
    pub async fn detail(&self, id: i32) -> Result<AuthorDetail, ServiceError> {
        let author = self.find(id).await?;
        let books = book::Entity::find()
            .filter(book::Column::AuthorId.eq(id))
            .order_by_desc(book::Column::Id)
            .all(&*self.db)
            .await?;
        let ids: Vec<i32> = books.iter().map(|b| b.id).collect();

        let ratings = if ids.is_empty() {
            Vec::new()
        } else {
            rating::Entity::find()
                .filter(rating::Column::BookId.is_in(ids.iter().copied()))
                .order_by_desc(rating::Column::Id)
                .all(&*self.db)
                .await?
        };
        let summaries = rating_service::summaries(&*self.db, &ids).await?;
        let books = books
            .into_iter()
            .map(|b| {
                let summary = summaries.get(&b.id).copied().unwrap_or_default();
                BookView::public(b, summary)
            })
            .collect();

        Ok(AuthorDetail {
            author,
            books,
            ratings,
        })
    }

    #[instrument(skip(self, input), fields(name = %input.name))]
    pub async fn create(&self, input: AuthorInput) -> Result<author::Model, ServiceError> {
        let now = Utc::now();
        let model = author::ActiveModel {
            name: Set(input.name),
            royalty: Set(input.royalty.unwrap_or(Decimal::ZERO).round_dp(2)),
            percent: Set(input.percent.round_dp(2)),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&*self.db)
        .await?;

        info!(author_id = model.id, "author created");
        Ok(model)
    }

    /// Renames or re-rates an author. Accrued royalty only moves through checkout.
    #[instrument(skip(self, input))]
    pub async fn update(&self, id: i32, input: AuthorInput) -> Result<author::Model, ServiceError> {
        let existing = self.find(id).await?;
        let mut model: author::ActiveModel = existing.into();
        model.name = Set(input.name);
        model.percent = Set(input.percent.round_dp(2));
        model.updated_at = Set(Utc::now());
        Ok(model.update(&*self.db).await?)
    }

    #[instrument(skip(self))]
    pub async fn delete(&self, id: i32) -> Result<(), ServiceError> {
        self.find(id).await?;
        let books = book::Entity::find()
            .filter(book::Column::AuthorId.eq(id))
            .count(&*self.db)
            .await?;
        if books > 0 {
            return Err(ServiceError::BadRequest(
                "Author still has books in the catalog".into(),
            ));
        }
        author::Entity::delete_by_id(id).exec(&*self.db).await?;
        Ok(())
    }

    async fn find(&self, id: i32) -> Result<author::Model, ServiceError> {
        author::Entity::find_by_id(id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Author not found".into()))
    }
}
