use crate::{entities::notification, errors::ServiceError};
use async_trait::async_trait;
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryOrder, QuerySelect,
    Set,
};
use std::sync::Arc;
use tracing::{info, instrument};

/// Number of notifications returned by the feed
pub const FEED_LIMIT: u64 = 50;

/// Push-delivery seam for reader-facing announcements.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn book_published(&self, book_id: i32, title: &str) -> Result<(), ServiceError>;
}

/// Notifier that only writes a log line.
#[derive(Debug, Default, Clone)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn book_published(&self, book_id: i32, title: &str) -> Result<(), ServiceError> {
        info!(book_id, title, "new book notification");
        Ok(())
    }
}

#[derive(Clone)]
pub struct NotificationService {
    db: Arc<DatabaseConnection>,
}

impl NotificationService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Latest notifications, newest first.
    #[instrument(skip(self))]
    pub async fn latest(&self) -> Result<Vec<notification::Model>, ServiceError> {
        Ok(notification::Entity::find()
            .order_by_desc(notification::Column::Id)
            .limit(FEED_LIMIT)
            .all(&*self.db)
            .await?)
    }
}

/// Stores the in-app notification for a newly published book.
pub async fn record_book_published<C: ConnectionTrait>(
    conn: &C,
    book_id: i32,
    title: &str,
) -> Result<notification::Model, ServiceError> {
    Ok(notification::ActiveModel {
        book_id: Set(book_id),
        title: Set(format!("New book published: {}", title)),
        created_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(conn)
    .await?)
}
