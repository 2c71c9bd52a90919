pub mod authors;
pub mod books;
pub mod favorites;
pub mod ratings;

pub use authors::authors_routes;
pub use books::books_routes;
pub use favorites::favorites_routes;
pub use ratings::ratings_routes;
