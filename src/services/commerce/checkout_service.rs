use crate::{
    entities::{
        author, book, cart,
        library::{self, LibrarySource},
        order::{self, OrderKind},
    },
    errors::ServiceError,
    events::{Event, EventSender},
    services::commerce::{
        coupon_service, library_service,
        order_service::{self, NewOrder},
        pricing,
    },
};
use chrono::Utc;
use metrics::counter;
use rust_decimal::Decimal;
use sea_orm::{
    sea_query::Expr, ActiveModelTrait, ColumnTrait, DatabaseConnection, DatabaseTransaction,
    EntityTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::{
    collections::{BTreeMap, HashMap},
    sync::Arc,
};
use tracing::{info, instrument, warn};
use utoipa::ToSchema;
use validator::Validate;

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutInput {
    /// Payment reference from the payment provider
    #[validate(length(min = 1, message = "Transaction id is required"))]
    pub tra_id: String,
    pub coupon: Option<String>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RoyaltyAccrual {
    pub author_id: i32,
    #[schema(value_type = String)]
    pub amount: Decimal,
}

/// Outcome of a successful checkout.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutReceipt {
    pub order: order::Model,
    pub items: Vec<library::Model>,
    pub royalties: Vec<RoyaltyAccrual>,
    /// Cart books dropped because the user already owns them
    pub skipped_book_ids: Vec<i32>,
}

/// Turns a user's cart into an order, library grants and royalty accruals.
///
/// Every write happens in one database transaction. The cart lines read at
/// the start are the ones deleted at the end; if another checkout consumed
/// them in between, the whole purchase rolls back with a conflict.
#[derive(Clone)]
pub struct CheckoutService {
    db: Arc<DatabaseConnection>,
    event_sender: Arc<EventSender>,
}

impl CheckoutService {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: Arc<EventSender>) -> Self {
        Self { db, event_sender }
    }

    #[instrument(skip(self, input), fields(coupon = ?input.coupon))]
    pub async fn checkout(&self, user_id: i32, input: CheckoutInput) -> Result<CheckoutReceipt, ServiceError> {
        let txn = self.db.begin().await?;

        let lines = cart::Entity::find()
            .filter(cart::Column::UserId.eq(user_id))
            .order_by_asc(cart::Column::Id)
            .find_also_related(book::Entity)
            .all(&txn)
            .await?;
        if lines.is_empty() {
            return Err(ServiceError::BadRequest("Cart is empty".into()));
        }
        let line_ids: Vec<i32> = lines.iter().map(|(line, _)| line.id).collect();

        let book_ids: Vec<i32> = lines
            .iter()
            .filter_map(|(_, b)| b.as_ref().map(|b| b.id))
            .collect();
        let owned = library_service::owned_book_ids(&txn, user_id, &book_ids).await?;
        let skipped_book_ids: Vec<i32> = book_ids.iter().copied().filter(|id| owned.contains(id)).collect();
        let books: Vec<book::Model> = lines
            .into_iter()
            .filter_map(|(_, b)| b)
            .filter(|b| !owned.contains(&b.id))
            .collect();

        if books.is_empty() {
            // Nothing left to buy; still clear the stale lines.
            clear_lines(&txn, user_id, &line_ids).await?;
            txn.commit().await?;
            return Err(ServiceError::BadRequest(
                "All books in the cart are already in your library".into(),
            ));
        }

        let prices: Vec<Decimal> = books.iter().map(|b| b.sell_price).collect();
        let total = pricing::cart_total(prices.iter().copied());
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
                tra_id: input.tra_id,
                kind: OrderKind::Book,
                coupon_code,
            },
        )
        .await?;

        let nets = pricing::allocate_discount(&prices, total, final_amount);
        let items = grant_books(&txn, user_id, &order.order_id, &books, &nets).await?;
        let royalties = accrue_royalties(&txn, &books, &nets).await?;

        order_service::record_transaction(
            &txn,
            user_id,
            final_amount,
            format!("Book purchase: {} book(s)", items.len()),
            &order.order_id,
        )
        .await?;

        clear_lines(&txn, user_id, &line_ids).await?;
        txn.commit().await?;

        counter!("bookstore_checkouts_total", 1);
        self.event_sender
            .send_or_log(Event::OrderPlaced {
                order_id: order.order_id.clone(),
                user_id,
                final_amount,
                books: items.len(),
            })
            .await;

        info!(
            order_id = %order.order_id,
            %total,
            %discount,
            %final_amount,
            books = items.len(),
            "checkout completed"
        );
        Ok(CheckoutReceipt {
            order,
            items,
            royalties,
            skipped_book_ids,
        })
    }
}

async fn grant_books(
    txn: &DatabaseTransaction,
    user_id: i32,
    order_id: &str,
    books: &[book::Model],
    nets: &[Decimal],
) -> Result<Vec<library::Model>, ServiceError> {
    let now = Utc::now();
    let mut items = Vec::with_capacity(books.len());
    for (book, net) in books.iter().zip(nets) {
        let entry = library::ActiveModel {
            user_id: Set(user_id),
            book_id: Set(book.id),
            order_id: Set(order_id.to_string()),
            source: Set(LibrarySource::Purchase),
            amount: Set(*net),
            created_at: Set(now),
            ..Default::default()
        }
        .insert(txn)
        .await
        .map_err(|e| {
            ServiceError::on_unique_violation(
                e,
                ServiceError::Conflict("Book is already in the library".into()),
            )
        })?;
        items.push(entry);
    }
    Ok(items)
}

/// Adds each author's share of the net line amounts to their royalty.
async fn accrue_royalties(
    txn: &DatabaseTransaction,
    books: &[book::Model],
    nets: &[Decimal],
) -> Result<Vec<RoyaltyAccrual>, ServiceError> {
    let author_ids: Vec<i32> = books.iter().map(|b| b.author_id).collect();
    let authors: HashMap<i32, author::Model> = author::Entity::find()
        .filter(author::Column::Id.is_in(author_ids))
        .all(txn)
        .await?
        .into_iter()
        .map(|a| (a.id, a))
        .collect();

    let mut shares: BTreeMap<i32, Decimal> = BTreeMap::new();
    for (book, net) in books.iter().zip(nets) {
        match authors.get(&book.author_id) {
            Some(author) => {
                *shares.entry(author.id).or_insert(Decimal::ZERO) += pricing::royalty_share(*net, author.percent);
            }
            None => warn!(book_id = book.id, author_id = book.author_id, "book has no author; royalty skipped"),
        }
    }

    let mut accruals = Vec::with_capacity(shares.len());
    for (author_id, amount) in shares {
        if amount > Decimal::ZERO {
            author::Entity::update_many()
                .col_expr(author::Column::Royalty, Expr::col(author::Column::Royalty).add(amount))
                .col_expr(author::Column::UpdatedAt, Expr::value(Utc::now()))
                .filter(author::Column::Id.eq(author_id))
                .exec(txn)
                .await?;
        }
        accruals.push(RoyaltyAccrual { author_id, amount });
    }
    Ok(accruals)
}

/// Deletes exactly the lines read at the start of checkout.
async fn clear_lines(txn: &DatabaseTransaction, user_id: i32, line_ids: &[i32]) -> Result<(), ServiceError> {
    let removed = cart::Entity::delete_many()
        .filter(cart::Column::UserId.eq(user_id))
        .filter(cart::Column::Id.is_in(line_ids.iter().copied()))
        .exec(txn)
        .await?;
    if removed.rows_affected != line_ids.len() as u64 {
        return Err(ServiceError::Conflict("Cart changed during checkout".into()));
    }
    Ok(())
}
