pub mod author;
pub mod book;
pub mod favorite;
pub mod notification;
pub mod rating;
