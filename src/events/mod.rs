use crate::services::notifications::Notifier;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{error, info, warn};

/// Buffer size of the in-process event channel
pub const EVENT_CHANNEL_CAPACITY: usize = 1024;

/// Handle used by services to publish domain events
#[derive(Clone, Debug)]
pub struct EventSender {
    sender: mpsc::Sender<Event>,
}

impl EventSender {
    pub fn new(sender: mpsc::Sender<Event>) -> Self {
        Self { sender }
    }

    /// Sends an event asynchronously
    pub async fn send(&self, event: Event) -> Result<(), String> {
        self.sender
            .send(event)
            .await
            .map_err(|e| format!("Failed to send event: {}", e))
    }

    /// Sends an event, logging instead of failing when nobody listens.
    pub async fn send_or_log(&self, event: Event) {
        if let Err(e) = self.send(event).await {
            warn!("{}", e);
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    OrderPlaced {
        order_id: String,
        user_id: i32,
        final_amount: Decimal,
        books: usize,
    },
    SubscriptionStarted {
        order_id: String,
        user_id: i32,
        plan_id: i32,
        expire_on: DateTime<Utc>,
    },
    BookPublished {
        book_id: i32,
        title: String,
    },
}

/// Drains the event channel until every sender is dropped.
pub async fn process_events(mut rx: mpsc::Receiver<Event>, notifier: Arc<dyn Notifier>) {
    info!("Starting event processing loop");

    while let Some(event) = rx.recv().await {
        match event {
            Event::OrderPlaced {
                order_id,
                user_id,
                final_amount,
                books,
            } => {
                info!(%order_id, user_id, %final_amount, books, "order placed");
            }
            Event::SubscriptionStarted {
                order_id,
                user_id,
                plan_id,
                expire_on,
            } => {
                info!(%order_id, user_id, plan_id, %expire_on, "subscription started");
            }
            Event::BookPublished { book_id, title } => {
                if let Err(e) = notifier.book_published(book_id, &title).await {
                    error!(book_id, "Failed to deliver book notification: {}", e);
                }
            }
        }
    }

    info!("Event processing loop stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::notifications::LogNotifier;

    #[tokio::test]
    async fn send_fails_once_the_receiver_is_gone() {
        let (tx, rx) = mpsc::channel(1);
        let sender = EventSender::new(tx);
        drop(rx);
        let result = sender
            .send(Event::BookPublished {
                book_id: 1,
                title: "Dune".into(),
            })
            .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn processor_stops_when_senders_drop() {
        let (tx, rx) = mpsc::channel(4);
        let sender = EventSender::new(tx);
        sender
            .send(Event::BookPublished {
                book_id: 1,
                title: "Dune".into(),
            })
            .await
            .unwrap();
        drop(sender);
        process_events(rx, Arc::new(LogNotifier)).await;
    }
}
