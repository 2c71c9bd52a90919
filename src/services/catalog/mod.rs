pub mod author_service;
pub mod book_service;
pub mod favorite_service;
pub mod rating_service;
pub mod views;

pub use author_service::AuthorService;
pub use book_service::BookService;
pub use favorite_service::FavoriteService;
pub use rating_service::RatingService;
