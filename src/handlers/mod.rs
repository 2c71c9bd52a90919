pub mod catalog;
pub mod commerce;
pub mod common;
pub mod content;
pub mod health;
pub mod notifications;
pub mod staff;
pub mod uploads;
pub mod users;

use crate::{
    auth::AuthService,
    events::EventSender,
    services::{
        accounts::AccountService,
        catalog::{AuthorService, BookService, FavoriteService, RatingService},
        commerce::{
            CartService, CheckoutService, CouponService, LibraryService, OrderService, PlanService,
            SubscriptionService,
        },
        content::ContentService,
        notifications::NotificationService,
        staff::StaffService,
        storage::FileStore,
    },
};
use sea_orm::DatabaseConnection;
use std::sync::Arc;

// Re-export AppState so handler modules can import it as crate::handlers::AppState
pub use crate::AppState;

/// Services layer that encapsulates business logic used by HTTP handlers
#[derive(Clone)]
pub struct AppServices {
    pub accounts: Arc<AccountService>,
    pub staff: Arc<StaffService>,
    pub content: Arc<ContentService>,
    pub notifications: Arc<NotificationService>,
    pub books: Arc<BookService>,
    pub authors: Arc<AuthorService>,
    pub ratings: Arc<RatingService>,
    pub favorites: Arc<FavoriteService>,
    pub cart: Arc<CartService>,
    pub checkout: Arc<CheckoutService>,
    pub coupons: Arc<CouponService>,
    pub plans: Arc<PlanService>,
    pub library: Arc<LibraryService>,
    pub orders: Arc<OrderService>,
    pub subscriptions: Arc<SubscriptionService>,
    pub storage: Arc<dyn FileStore>,
}

impl AppServices {
    pub fn new(
        db: Arc<DatabaseConnection>,
        event_sender: Arc<EventSender>,
        auth: Arc<AuthService>,
        storage: Arc<dyn FileStore>,
    ) -> Self {
        Self {
            accounts: Arc::new(AccountService::new(db.clone(), auth.clone())),
            staff: Arc::new(StaffService::new(db.clone(), auth)),
            content: Arc::new(ContentService::new(db.clone())),
            notifications: Arc::new(NotificationService::new(db.clone())),
            books: Arc::new(BookService::new(db.clone(), event_sender.clone())),
            authors: Arc::new(AuthorService::new(db.clone())),
            ratings: Arc::new(RatingService::new(db.clone())),
            favorites: Arc::new(FavoriteService::new(db.clone())),
            cart: Arc::new(CartService::new(db.clone())),
            checkout: Arc::new(CheckoutService::new(db.clone(), event_sender.clone())),
            coupons: Arc::new(CouponService::new(db.clone())),
            plans: Arc::new(PlanService::new(db.clone())),
            library: Arc::new(LibraryService::new(db.clone())),
            orders: Arc::new(OrderService::new(db.clone())),
            subscriptions: Arc::new(SubscriptionService::new(db, event_sender)),
            storage,
        }
    }
}
